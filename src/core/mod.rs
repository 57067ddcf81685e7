// src/core/mod.rs - Grouping, reconciliation and the batch orchestrator

pub mod grouping;
pub mod orchestrator;
pub mod reconcile;
pub mod snapshot;
pub mod types;
