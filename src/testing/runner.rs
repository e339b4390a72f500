//! Run orchestration
//!
//! Drives the steps in their fixed order, records produced identifiers in the
//! [`RunContext`], stops at the first failing step and turns the outcome into
//! an exit code.

use std::io::Write;

use colored::Colorize;

use crate::api::BillingApi;
use crate::common::StepError;
use crate::presenter::Presenter;

use super::context::{RunContext, RunResult, RunState, Step, ValidationOutcome};
use super::steps;

/// Sequential runner over a billing API
pub struct Runner<'a, A: BillingApi + ?Sized, W: Write> {
    api: &'a A,
    presenter: &'a mut Presenter<W>,
    ctx: RunContext,
    state: RunState,
    steps_run: usize,
    validation: Option<ValidationOutcome>,
}

impl<'a, A: BillingApi + ?Sized, W: Write> Runner<'a, A, W> {
    pub fn new(api: &'a A, presenter: &'a mut Presenter<W>) -> Self {
        Self {
            api,
            presenter,
            ctx: RunContext::new(),
            state: RunState::Idle,
            steps_run: 0,
            validation: None,
        }
    }

    fn transition(&mut self, next: RunState) {
        debug_assert!(!self.state.is_terminal(), "run already finished");
        tracing::debug!(from = ?self.state, to = ?next, "run state");
        self.state = next;
    }

    /// Execute every step, stopping at the first unexpected failure
    pub async fn run(mut self) -> RunResult {
        self.transition(RunState::Running);

        let mut failed_step = None;
        for step in Step::ALL {
            self.steps_run += 1;
            let heading = self.heading(step);
            self.presenter.section(&heading);

            if let Err(e) = self.execute(step).await {
                tracing::warn!(step = %step, error = %e, "step failed");
                self.presenter.failure(&failure_message(step), &e);
                failed_step = Some(step);
                break;
            }
        }

        let next = if failed_step.is_some() {
            RunState::Aborted
        } else {
            RunState::Completed
        };
        self.transition(next);

        let all_passed = self.state == RunState::Completed
            && self
                .validation
                .as_ref()
                .is_some_and(ValidationOutcome::is_expected);
        RunResult {
            all_passed,
            state: self.state,
            customer_id: self.ctx.customer_id().cloned(),
            invoice_id: self.ctx.invoice_id().cloned(),
            failed_step,
            steps_run: self.steps_run,
            steps_total: Step::ALL.len(),
            validation: self.validation,
        }
    }

    /// Run one step and record what it produced
    async fn execute(&mut self, step: Step) -> Result<(), StepError> {
        let api = self.api;
        let ctx = &self.ctx;
        let presenter = &mut *self.presenter;

        match step {
            Step::CreateCustomer => {
                let id = steps::create_customer(api, presenter).await?;
                self.ctx.set_customer(id);
            }
            Step::GetCustomer => {
                steps::get_customer(api, ctx, presenter).await?;
            }
            Step::ListCustomers => {
                steps::list_customers(api, presenter).await?;
            }
            Step::CreateInvoice => {
                let created = steps::create_invoice(api, ctx, presenter).await?;
                self.ctx.set_invoice(created.id);
            }
            Step::GetInvoice => {
                steps::get_invoice(api, ctx, presenter).await?;
            }
            Step::ListInvoicesForCustomer => {
                steps::list_invoices_for_customer(api, ctx, presenter).await?;
            }
            Step::UpdateCustomer => {
                steps::update_customer(api, ctx, presenter).await?;
            }
            Step::CreateInvoiceInvalidCustomer => {
                let outcome = steps::create_invoice_invalid_customer(api, presenter).await;
                self.validation = Some(outcome);
            }
        }
        Ok(())
    }

    fn heading(&self, step: Step) -> String {
        let base = format!("STEP {}: {}", step.number(), step.title());
        let id = match step {
            Step::GetCustomer | Step::UpdateCustomer => self.ctx.customer_id(),
            Step::GetInvoice => self.ctx.invoice_id(),
            Step::CreateInvoice | Step::ListInvoicesForCustomer => {
                return match self.ctx.customer_id() {
                    Some(id) => format!("{base} (customer {id})"),
                    None => base,
                };
            }
            _ => None,
        };
        match id {
            Some(id) => format!("{base} (ID: {id})"),
            None => base,
        }
    }
}

fn failure_message(step: Step) -> String {
    let action = match step {
        Step::CreateCustomer => "create customer",
        Step::GetCustomer => "get customer",
        Step::ListCustomers => "list customers",
        Step::CreateInvoice => "create invoice",
        Step::GetInvoice => "get invoice",
        Step::ListInvoicesForCustomer => "list invoices for customer",
        Step::UpdateCustomer => "update customer",
        Step::CreateInvoiceInvalidCustomer => "observe customer validation",
    };
    format!("Failed to {action}")
}

/// Run the whole suite: banner, steps, summary
pub async fn run_suite<A, W>(api: &A, presenter: &mut Presenter<W>) -> RunResult
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let base_url = api.base_url().to_string();

    presenter.banner(&["BILLING API TEST CLIENT", "Customer and invoice endpoints"]);
    presenter.line(&format!("\nAPI Base URL: {base_url}").cyan().to_string());
    presenter.line(
        &format!("Date: {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
            .cyan()
            .to_string(),
    );

    let result = Runner::new(api, presenter).run().await;

    if result.state == RunState::Completed {
        render_summary(presenter, &result);
    } else {
        presenter.section("TEST RUN FAILED");
        if let Some(step) = result.failed_step {
            presenter.line(
                &format!("✗ Step {} ({}) failed; remaining steps skipped", step.number(), step)
                    .red()
                    .bold()
                    .to_string(),
            );
        }
        presenter.line(&format!("Make sure the backend is running at: {base_url}"));
    }

    presenter.banner(&["END OF TESTS"]);
    result
}

fn render_summary<W: Write>(presenter: &mut Presenter<W>, result: &RunResult) {
    presenter.section("TEST SUMMARY");
    if result.all_passed {
        presenter.line(&"✓ All tests completed successfully".green().bold().to_string());
    } else {
        presenter.warning("All steps ran, but the business validation check did not pass");
    }

    if let Some(id) = &result.customer_id {
        presenter.line(&format!("✓ Customer created with ID: {id}").green().to_string());
    }
    if let Some(id) = &result.invoice_id {
        presenter.line(&format!("✓ Invoice created with ID: {id}").green().to_string());
    }

    match &result.validation {
        Some(ValidationOutcome::Rejected { status, .. }) => presenter.line(
            &format!("✓ Business validation works as expected (HTTP {status})")
                .green()
                .to_string(),
        ),
        Some(ValidationOutcome::Accepted { .. }) => presenter.warning(
            "Business validation ANOMALY: invoice for an unknown customer was accepted",
        ),
        Some(ValidationOutcome::Unreachable { .. }) => {
            presenter.warning("Business validation not observed: no response from the API")
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, ResourceId};
    use crate::common::ApiError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request
    struct ScriptedApi {
        responses: Mutex<VecDeque<Result<Value, ApiError>>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<Result<Value, ApiError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BillingApi for ScriptedApi {
        fn base_url(&self) -> &str {
            "http://scripted"
        }

        async fn send(&self, request: &ApiRequest) -> Result<Value, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left")
        }
    }

    fn customer_record(id: u64) -> Value {
        let mut record = serde_json::to_value(crate::fixtures::CustomerFixture::initial()).unwrap();
        record["id"] = json!(id);
        record
    }

    fn updated_record(id: u64) -> Value {
        let mut record = serde_json::to_value(crate::fixtures::CustomerFixture::updated()).unwrap();
        record["id"] = json!(id);
        record
    }

    fn invoice_record(id: u64, customer: u64) -> Value {
        json!({
            "id": id,
            "clienteId": customer,
            "numeroFactura": "FACT-0001",
            "subtotal": 6140000,
            "impuestos": 1166600,
            "descuentos": 274000,
            "total": 7032600
        })
    }

    fn happy_path(last: Result<Value, ApiError>) -> Vec<Result<Value, ApiError>> {
        vec![
            Ok(customer_record(41)),
            Ok(customer_record(41)),
            Ok(json!([customer_record(41)])),
            Ok(invoice_record(7, 41)),
            Ok(invoice_record(7, 41)),
            Ok(json!([invoice_record(7, 41)])),
            Ok(updated_record(41)),
            last,
        ]
    }

    fn rejected() -> Result<Value, ApiError> {
        Err(ApiError::Response {
            status: 400,
            body: json!({"message": "Cliente no existe"}),
        })
    }

    async fn run(api: &ScriptedApi) -> (RunResult, String) {
        colored::control::set_override(false);
        let mut presenter = Presenter::new(Vec::new());
        let result = run_suite(api, &mut presenter).await;
        let out = String::from_utf8(presenter.into_inner()).unwrap();
        (result, out)
    }

    #[tokio::test]
    async fn test_ids_threaded_between_steps() {
        let api = ScriptedApi::new(happy_path(rejected()));
        let (result, _) = run(&api).await;

        assert_eq!(result.state, RunState::Completed);
        assert_eq!(result.customer_id, Some(ResourceId::Number(41)));
        assert_eq!(result.invoice_id, Some(ResourceId::Number(7)));

        let customer = ResourceId::Number(41);
        let requests = api.requests();
        assert_eq!(requests.len(), 8);
        assert_eq!(requests[1], ApiRequest::GetCustomer(customer.clone()));
        assert_eq!(requests[2], ApiRequest::ListCustomers);
        match &requests[3] {
            ApiRequest::CreateInvoice(invoice) => assert_eq!(invoice.customer_id, customer),
            other => panic!("unexpected request {other:?}"),
        }
        assert_eq!(requests[4], ApiRequest::GetInvoice(ResourceId::Number(7)));
        assert_eq!(
            requests[5],
            ApiRequest::ListInvoicesForCustomer(customer.clone())
        );
        match &requests[6] {
            ApiRequest::UpdateCustomer { id, .. } => assert_eq!(id, &customer),
            other => panic!("unexpected request {other:?}"),
        }
        match &requests[7] {
            ApiRequest::CreateInvoice(invoice) => {
                assert_eq!(invoice.customer_id, ResourceId::Number(99999))
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_expected_rejection_completes() {
        let api = ScriptedApi::new(happy_path(rejected()));
        let (result, out) = run(&api).await;

        assert!(result.all_passed);
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.steps_run, 8);
        assert!(matches!(
            result.validation,
            Some(ValidationOutcome::Rejected { status: 400, .. })
        ));
        assert!(out.contains("TEST SUMMARY"));
        assert!(out.contains("Business validation works as expected (HTTP 400)"));
        assert!(!out.contains("ANOMALY"));
    }

    #[tokio::test]
    async fn test_accepted_invalid_invoice_is_not_fatal() {
        let api = ScriptedApi::new(happy_path(Ok(invoice_record(8, 99999))));
        let (result, out) = run(&api).await;

        assert_eq!(result.state, RunState::Completed);
        assert_eq!(result.exit_code(), 0);
        assert!(!result.all_passed);
        assert!(matches!(
            result.validation,
            Some(ValidationOutcome::Accepted { .. })
        ));
        assert!(out.contains("ANOMALY: expected the request to fail but it succeeded"));
        assert!(out.contains("TEST SUMMARY"));
        assert!(!out.contains("All tests completed successfully"));
        assert!(!out.contains("TEST RUN FAILED"));
        assert!(out.contains("⚠ Business validation ANOMALY"));
    }

    #[tokio::test]
    async fn test_unreachable_negative_step_is_not_fatal() {
        let api = ScriptedApi::new(happy_path(Err(ApiError::transport("connection reset"))));
        let (result, out) = run(&api).await;

        assert_eq!(result.exit_code(), 0);
        assert!(!result.all_passed);
        assert!(matches!(
            result.validation,
            Some(ValidationOutcome::Unreachable { .. })
        ));
        assert!(out.contains("Inconclusive"));
    }

    #[tokio::test]
    async fn test_first_failure_aborts() {
        let api = ScriptedApi::new(vec![Err(ApiError::transport("connection refused"))]);
        let (result, out) = run(&api).await;

        assert_eq!(result.state, RunState::Aborted);
        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.failed_step, Some(Step::CreateCustomer));
        assert_eq!(result.steps_run, 1);
        assert_eq!(result.customer_id, None);
        assert_eq!(api.requests().len(), 1);
        assert!(out.contains("Failed to create customer"));
        assert!(out.contains("Error: connection refused"));
        assert!(out.contains("Make sure the backend is running at: http://scripted"));
        assert!(!out.contains("STEP 2"));
    }

    #[tokio::test]
    async fn test_create_customer_without_id_aborts() {
        let api = ScriptedApi::new(vec![Ok(json!({"nombre": "sin id"}))]);
        let (result, out) = run(&api).await;

        assert_eq!(result.exit_code(), 1);
        assert_eq!(result.failed_step, Some(Step::CreateCustomer));
        assert!(out.contains("response has no usable 'id'"));
    }

    #[tokio::test]
    async fn test_invoice_missing_summary_aborts() {
        let api = ScriptedApi::new(vec![
            Ok(customer_record(1)),
            Ok(customer_record(1)),
            Ok(json!([])),
            Ok(json!({"id": 5, "numeroFactura": "F-5"})),
        ]);
        let (result, _) = run(&api).await;

        assert_eq!(result.failed_step, Some(Step::CreateInvoice));
        assert_eq!(result.invoice_id, None);
        assert_eq!(result.customer_id, Some(ResourceId::Number(1)));
        assert_eq!(api.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_update_not_reflected_aborts() {
        let mut responses = happy_path(rejected());
        responses[6] = Ok(customer_record(41));
        let api = ScriptedApi::new(responses);
        let (result, out) = run(&api).await;

        assert_eq!(result.failed_step, Some(Step::UpdateCustomer));
        assert_eq!(result.exit_code(), 1);
        assert_eq!(api.requests().len(), 7);
        assert!(out.contains("updated record does not reflect: nombre, email, telefono, direccion"));
    }

    #[tokio::test]
    async fn test_error_status_at_any_step_aborts() {
        for (index, step) in Step::ALL[..7].iter().copied().enumerate() {
            let n = index + 1;
            let mut responses = happy_path(rejected());
            responses.truncate(index);
            responses.push(Err(ApiError::Response {
                status: 500,
                body: json!({"message": "Internal Server Error"}),
            }));
            let api = ScriptedApi::new(responses);
            let (result, out) = run(&api).await;

            assert_eq!(result.state, RunState::Aborted, "step {n}");
            assert_eq!(result.failed_step, Some(step), "step {n}");
            assert_eq!(result.steps_run, n, "step {n}");
            assert_eq!(api.requests().len(), n, "step {n}");
            assert_eq!(result.exit_code(), 1, "step {n}");
            assert!(!result.all_passed, "step {n}");
            assert_eq!(result.validation, None, "step {n}");
            assert!(out.contains("Status: 500"), "step {n}");
            assert!(!out.contains(&format!("STEP {}:", n + 1)), "step {n}");
        }
    }

    #[test]
    fn test_runner_state_starts_idle() {
        let api = ScriptedApi::new(Vec::new());
        let mut presenter = Presenter::new(Vec::new());
        let runner = Runner::new(&api, &mut presenter);

        assert_eq!(runner.state, RunState::Idle);
        assert_eq!(runner.ctx, RunContext::new());
    }
}
