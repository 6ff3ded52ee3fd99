//! Killmove Filter — rule-driven selection of paired animations.
//!
//! A [`FilterPipeline`](core::pipeline::FilterPipeline) evaluates an ordered
//! list of classifiers against an attacker/victim pair, unions the tags they
//! require and ban, expands each candidate's tags through a one-level alias
//! table, and picks uniformly among the candidates that satisfy the result.
//! Pipelines load from and save to RON filter files.

pub mod core;
pub mod schema;
