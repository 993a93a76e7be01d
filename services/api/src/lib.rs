//! services/api/src/lib.rs
//!
//! The HTTP service around the study tracker engine: configuration, error
//! mapping, storage and recommendation adapters, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
