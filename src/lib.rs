//! aptscout library
//!
//! Enriches apartment listings with nearby grocery stores and commute times,
//! caching every intermediate result on disk. The modules are exposed for use
//! in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod maps;
