pub mod actions;
pub mod ai;
pub mod bank;
pub mod battler;
pub mod calculators;
pub mod effects;
pub mod engine;
pub mod handlers;
pub mod logic;
pub mod moves;
pub mod presentation;
pub mod rng;
pub mod state;

#[cfg(test)]
mod tests;
