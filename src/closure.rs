use crate::models::{ItemKey, RecipeTable};
use std::collections::{BTreeMap, BTreeSet};

/// Depth guard against malformed/cyclic recipe data (spec §4.1, §9 open
/// question: "treat as a guard", not a gameplay rule).
pub const CLOSURE_DEPTH_LIMIT: usize = 60;

/// The set of item keys reachable by transitive ingredient expansion from
/// `target`, including the target itself.
pub fn compute_closure(recipes: &RecipeTable, target: &ItemKey) -> BTreeSet<ItemKey> {
    let mut closure = BTreeSet::new();
    let mut stack = vec![(target.clone(), 0usize)];
    while let Some((item, depth)) = stack.pop() {
        if !closure.insert(item.clone()) {
            continue;
        }
        if depth >= CLOSURE_DEPTH_LIMIT {
            continue;
        }
        if let Some(recipe) = recipes.get(&item) {
            for ingredient in recipe.ingredients.keys() {
                stack.push((ingredient.clone(), depth + 1));
            }
        }
    }
    closure
}

/// Cumulative ingredient demand if every level of the closure were crafted
/// (never farmed) to deliver `quantity` of `target`, ceil'd to an integer
/// per item. Used as each craftable item's MILP upper bound.
pub fn craft_upper_bounds(
    recipes: &RecipeTable,
    target: &ItemKey,
    quantity: u32,
) -> BTreeMap<ItemKey, u32> {
    let mut demand: BTreeMap<ItemKey, f64> = BTreeMap::new();
    let mut stack = vec![(target.clone(), quantity as f64, 0usize)];
    while let Some((item, qty, depth)) = stack.pop() {
        *demand.entry(item.clone()).or_insert(0.0) += qty;
        if depth >= CLOSURE_DEPTH_LIMIT {
            continue;
        }
        if let Some(recipe) = recipes.get(&item) {
            for (ingredient, mult) in &recipe.ingredients {
                stack.push((ingredient.clone(), qty * (*mult as f64), depth + 1));
            }
        }
    }
    demand
        .into_iter()
        .map(|(item, qty)| (item, qty.ceil() as u32))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::Recipe;

    fn table() -> RecipeTable {
        let mut recipes = BTreeMap::new();
        recipes.insert(
            ItemKey::new("gear_1"),
            Recipe {
                ingredients: BTreeMap::from([(ItemKey::new("screw_1"), 3)]),
                xp: 5.0,
                cost: 100.0,
            },
        );
        recipes.insert(
            ItemKey::new("screw_1"),
            Recipe {
                ingredients: BTreeMap::from([(ItemKey::new("ore_1"), 2)]),
                xp: 1.0,
                cost: 10.0,
            },
        );
        RecipeTable::new(recipes)
    }

    #[test]
    fn test_closure_includes_terminal_ingredients() {
        let closure = compute_closure(&table(), &ItemKey::new("gear_1"));
        assert!(closure.contains(&ItemKey::new("gear_1")));
        assert!(closure.contains(&ItemKey::new("screw_1")));
        assert!(closure.contains(&ItemKey::new("ore_1")));
    }

    #[test]
    fn test_craft_upper_bounds_multiplies_through() {
        let bounds = craft_upper_bounds(&table(), &ItemKey::new("gear_1"), 2);
        assert_eq!(bounds[&ItemKey::new("gear_1")], 2);
        assert_eq!(bounds[&ItemKey::new("screw_1")], 6);
        assert_eq!(bounds[&ItemKey::new("ore_1")], 12);
    }
}
