//! Utility functions and helpers

pub mod sanitize;
