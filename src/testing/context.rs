//! Run state threaded between steps

use std::fmt;

use serde_json::Value;

use crate::api::ResourceId;
use crate::common::StepError;

/// The steps of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CreateCustomer,
    GetCustomer,
    ListCustomers,
    CreateInvoice,
    GetInvoice,
    ListInvoicesForCustomer,
    UpdateCustomer,
    CreateInvoiceInvalidCustomer,
}

impl Step {
    /// Fixed execution order
    pub const ALL: [Step; 8] = [
        Step::CreateCustomer,
        Step::GetCustomer,
        Step::ListCustomers,
        Step::CreateInvoice,
        Step::GetInvoice,
        Step::ListInvoicesForCustomer,
        Step::UpdateCustomer,
        Step::CreateInvoiceInvalidCustomer,
    ];

    /// 1-based position in [`Step::ALL`]
    pub fn number(self) -> usize {
        Step::ALL
            .iter()
            .position(|s| *s == self)
            .map_or(0, |i| i + 1)
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::CreateCustomer => "create-customer",
            Step::GetCustomer => "get-customer",
            Step::ListCustomers => "list-customers",
            Step::CreateInvoice => "create-invoice",
            Step::GetInvoice => "get-invoice",
            Step::ListInvoicesForCustomer => "list-invoices-for-customer",
            Step::UpdateCustomer => "update-customer",
            Step::CreateInvoiceInvalidCustomer => "create-invoice-invalid-customer",
        }
    }

    /// Human-readable title for section headers
    pub fn title(self) -> &'static str {
        match self {
            Step::CreateCustomer => "Create Customer",
            Step::GetCustomer => "Get Customer",
            Step::ListCustomers => "List All Customers",
            Step::CreateInvoice => "Create Invoice",
            Step::GetInvoice => "Get Invoice",
            Step::ListInvoicesForCustomer => "List Invoices for Customer",
            Step::UpdateCustomer => "Update Customer",
            Step::CreateInvoiceInvalidCustomer => {
                "Create Invoice for Unknown Customer (Must Fail)"
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifiers produced by earlier steps
///
/// Written only by the runner after the producing step succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    customer_id: Option<ResourceId>,
    invoice_id: Option<ResourceId>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer_id(&self) -> Option<&ResourceId> {
        self.customer_id.as_ref()
    }

    pub fn invoice_id(&self) -> Option<&ResourceId> {
        self.invoice_id.as_ref()
    }

    /// Customer id, or an error if create-customer has not succeeded
    pub fn require_customer(&self) -> Result<&ResourceId, StepError> {
        self.customer_id
            .as_ref()
            .ok_or(StepError::MissingContext { what: "customer id" })
    }

    /// Invoice id, or an error if create-invoice has not succeeded
    pub fn require_invoice(&self) -> Result<&ResourceId, StepError> {
        self.invoice_id
            .as_ref()
            .ok_or(StepError::MissingContext { what: "invoice id" })
    }

    pub(crate) fn set_customer(&mut self, id: ResourceId) {
        self.customer_id = Some(id);
    }

    pub(crate) fn set_invoice(&mut self, id: ResourceId) {
        self.invoice_id = Some(id);
    }
}

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Aborted,
    Completed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Aborted | RunState::Completed)
    }
}

/// What the API did with the invoice for an unknown customer
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Rejected with a non-2xx status (expected)
    Rejected { status: u16, body: Value },
    /// Accepted the invoice (anomaly)
    Accepted { body: Value },
    /// No response at all, so the validation could not be observed
    Unreachable { message: String },
}

impl ValidationOutcome {
    /// The API rejected the invoice, as it should
    pub fn is_expected(&self) -> bool {
        matches!(self, ValidationOutcome::Rejected { .. })
    }
}

/// Aggregate outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Every step passed: the run completed and the API rejected the
    /// invoice for the unknown customer
    ///
    /// False after an anomaly or an unobserved validation even though the
    /// run completed; [`RunResult::exit_code`] follows `state`, not this flag.
    pub all_passed: bool,
    pub state: RunState,
    pub customer_id: Option<ResourceId>,
    pub invoice_id: Option<ResourceId>,
    /// Step that aborted the run
    pub failed_step: Option<Step>,
    pub steps_run: usize,
    pub steps_total: usize,
    /// Observation from the negative test, when it ran
    pub validation: Option<ValidationOutcome>,
}

impl RunResult {
    /// Process exit code: 0 when completed, 1 when aborted
    ///
    /// The negative test's observation never changes this.
    pub fn exit_code(&self) -> i32 {
        if self.state == RunState::Completed {
            0
        } else {
            1
        }
    }
}
