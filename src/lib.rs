pub mod closure;
pub mod config;
pub mod cost;
pub mod error;
pub mod fallback;
pub mod horizon;
pub mod loot_cache;
pub mod milp;
pub mod mission_actions;
pub mod models;
pub mod objective;
pub mod planner;
pub mod progress;
pub mod replan;
pub mod ship_model;
