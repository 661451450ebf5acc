//! Persistence for symbolicated traces and request counters.

pub mod results;
pub mod transactions;

pub use results::ResultStore;
