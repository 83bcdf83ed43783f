use super::ItemKey;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A craftable item's recipe: ingredients (by internal key) and their
/// per-craft multiplicities, plus the flat XP and base-GE cost of one craft.
///
/// Items absent from the [`RecipeTable`] are terminal: they can only come
/// from inventory or mission drops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub ingredients: BTreeMap<ItemKey, u32>,
    pub xp: f64,
    pub cost: f64,
}

/// The static recipe DAG. Construction is expected to assert acyclicity;
/// a cycle here is a data error, not a planner-time condition.
#[derive(Debug, Clone, Default)]
pub struct RecipeTable {
    recipes: BTreeMap<ItemKey, Recipe>,
}

impl RecipeTable {
    pub fn new(recipes: BTreeMap<ItemKey, Recipe>) -> Self {
        let table = RecipeTable { recipes };
        table.assert_acyclic();
        table
    }

    pub fn get(&self, item: &ItemKey) -> Option<&Recipe> {
        self.recipes.get(item)
    }

    pub fn is_craftable(&self, item: &ItemKey) -> bool {
        self.recipes.contains_key(item)
    }

    pub fn craftable_items(&self) -> impl Iterator<Item = &ItemKey> {
        self.recipes.keys()
    }

    fn assert_acyclic(&self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: BTreeMap<&ItemKey, Mark> = BTreeMap::new();

        fn visit<'a>(
            item: &'a ItemKey,
            recipes: &'a BTreeMap<ItemKey, Recipe>,
            marks: &mut BTreeMap<&'a ItemKey, Mark>,
        ) {
            match marks.get(item) {
                Some(Mark::Done) => return,
                Some(Mark::Visiting) => panic!("recipe graph cycle detected at {item}"),
                None => {}
            }
            marks.insert(item, Mark::Visiting);
            if let Some(recipe) = recipes.get(item) {
                for ingredient in recipe.ingredients.keys() {
                    visit(ingredient, recipes, marks);
                }
            }
            marks.insert(item, Mark::Done);
        }

        for item in self.recipes.keys() {
            visit(item, &self.recipes, &mut marks);
        }
    }
}

fn recipe(ingredients: &[(&str, u32)], cost: f64, xp: f64) -> Recipe {
    Recipe {
        ingredients: ingredients
            .iter()
            .map(|(k, q)| (ItemKey::new(*k), *q))
            .collect(),
        cost,
        xp,
    }
}

lazy_static! {
    /// Compiled-in recipe DAG, in the same spirit as [`super::SHIP_MISSIONS`]:
    /// a cheap, versioned-with-the-binary static table rather than something
    /// fetched at runtime (spec §9.1). The actual per-item ingredient lists
    /// and costs are game content outside the distilled spec's scope, so
    /// this table is a representative seed over the item families the spec
    /// itself names (`puzzle-cube-*`, `soul-stone-*`); callers that have the
    /// real game data supply their own [`RecipeTable`] via
    /// `PlanOptions::recipes` instead of relying on this default.
    pub static ref DEFAULT_RECIPE_TABLE: RecipeTable = {
        let mut recipes = BTreeMap::new();
        recipes.insert(
            ItemKey::new("puzzle_cube_2"),
            recipe(&[("puzzle_cube_1", 4)], 2_500.0, 50.0),
        );
        recipes.insert(
            ItemKey::new("puzzle_cube_3"),
            recipe(&[("puzzle_cube_2", 4)], 12_000.0, 220.0),
        );
        recipes.insert(
            ItemKey::new("soul_stone_2"),
            recipe(&[("soul_stone_1", 5)], 4_000.0, 80.0),
        );
        recipes.insert(
            ItemKey::new("soul_stone_3"),
            recipe(&[("soul_stone_2", 5), ("puzzle_cube_1", 2)], 22_000.0, 400.0),
        );
        RecipeTable::new(recipes)
    };
}
