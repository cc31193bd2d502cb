//! Structured logging for the PagePilot backend.
//!
//! Console output for operators, NDJSON file output for log shipping.

pub mod logger;

pub use logger::init_logger;
