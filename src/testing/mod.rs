//! Billing API test run
//!
//! Eight dependent steps executed one at a time: customers are created and
//! read back, an invoice is issued for that customer, the customer is updated,
//! and finally an invoice for an unknown customer must be rejected.

mod context;
mod runner;
pub mod steps;

pub use context::{RunContext, RunResult, RunState, Step, ValidationOutcome};
pub use runner::{run_suite, Runner};
