pub mod alias;
pub mod classifier;
pub mod condition;
pub mod config;
pub mod params;
pub mod pipeline;
pub mod preset;
