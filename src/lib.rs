pub mod config;
pub mod currents;
pub mod error;
pub mod evaluator;
pub mod leadfield;
pub mod montage;
pub mod reports;
pub mod search;
// cmd and console are binary modules (declared in main.rs).
