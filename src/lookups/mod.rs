//! Direct single-source lookups by identifier.

pub mod dtos;
pub mod handlers;
