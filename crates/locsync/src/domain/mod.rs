//! Core domain types shared across the application layers.

pub mod errors;
pub mod model;
