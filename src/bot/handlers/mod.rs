//! Discord interaction handlers

/// Autocomplete handlers for coin ids and task titles
pub mod autocomplete;
