//! services/api/src/lib.rs
//!
//! The LifeGuard API service: configuration, port adapters and the web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
