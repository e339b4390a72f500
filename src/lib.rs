//! Billing API test client
//!
//! Runs a fixed, dependent sequence of requests against the customer and
//! invoice endpoints of a billing API and reports pass/fail for each step.

pub mod api;
pub mod common;
pub mod fixtures;
pub mod presenter;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{ApiError, Config, Error, Result, StepError};
pub use testing::{run_suite, RunResult, RunState, Step, ValidationOutcome};
