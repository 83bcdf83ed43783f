/// The stepwise craft-discount function (spec §4.3): the unit cost of the
/// `n`th (0-indexed) craft of an item with base cost `base`.
///
/// Nonincreasing in `n`; constant at `floor(base * 0.1)` from `n = 300` on.
pub fn discount_step(base: f64, n: u32) -> f64 {
    let ratio = (n as f64 / 300.0).min(1.0);
    (base * (1.0 - 0.9 * ratio.powf(0.2))).floor()
}

/// Sum of `discount_step(base, start + j)` for `j` in `0..count`: the GE
/// cost of crafting `count` additional copies starting from lifetime craft
/// count `start`.
pub fn batch_cost(base: f64, start: u32, count: u32) -> f64 {
    (0..count).map(|j| discount_step(base, start + j)).sum()
}
