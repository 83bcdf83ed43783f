use serde::{Deserialize, Serialize};

/// External, kebab-case item identifier, e.g. `soul-stone-2`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ItemId(pub String);

/// Internal, underscore-case item key, e.g. `soul_stone_2`.
///
/// Bijective with [`ItemId`]: `-` <-> `_`. Recipe tables, inventories and
/// craft counts are all keyed by `ItemKey` so the closure walk and the MILP
/// builder never have to re-derive the mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKey(pub String);

impl ItemId {
    pub fn new(s: impl Into<String>) -> Self {
        ItemId(s.into())
    }

    pub fn to_key(&self) -> ItemKey {
        ItemKey(self.0.replace('-', "_"))
    }
}

impl ItemKey {
    pub fn new(s: impl Into<String>) -> Self {
        ItemKey(s.into())
    }

    pub fn to_id(&self) -> ItemId {
        ItemId(self.0.replace('_', "-"))
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D>(deserializer: D) -> Result<ItemId, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(ItemId(s))
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        ItemKey(s.to_string())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId(s.to_string())
    }
}
