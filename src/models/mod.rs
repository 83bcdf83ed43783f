mod item;
mod loot;
mod mission;
mod plan_result;
mod profile;
mod recipe;
mod ship;

pub use item::*;
pub use loot::*;
pub use mission::*;
pub use plan_result::*;
pub use profile::*;
pub use recipe::*;
pub use ship::*;
