// src/lib.rs - Library root for judgebench

pub mod cli;
pub mod core;
pub mod evaluator;
pub mod infra;
pub mod provider;
pub mod store;
