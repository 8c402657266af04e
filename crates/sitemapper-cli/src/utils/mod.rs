//! Shared CLI utilities

pub mod logging;

pub use logging::initialize_logging;
