//! Step implementations
//!
//! Each step makes exactly one API call and checks the response against its
//! own success predicate. Steps read identifiers from the [`RunContext`] but
//! never write to it; the runner records what they return.

use std::io::Write;

use serde_json::Value;

use crate::api::{ApiRequest, BillingApi, ResourceId};
use crate::common::{ApiError, StepError};
use crate::fixtures::{CustomerFixture, InvoiceFixture, InvoiceSummary};
use crate::presenter::Presenter;

use super::context::{RunContext, ValidationOutcome};

/// Result of a successful create-invoice step
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedInvoice {
    pub id: ResourceId,
    pub summary: InvoiceSummary,
}

/// Announce and send a single request
async fn call<A, W>(
    api: &A,
    presenter: &mut Presenter<W>,
    request: ApiRequest,
    note: &str,
) -> Result<Value, ApiError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    presenter.info(&format!("Sending request {}{}...", request.describe(), note));
    api.send(&request).await
}

fn require_object(body: Value, what: &str) -> Result<Value, StepError> {
    if body.is_object() {
        Ok(body)
    } else {
        Err(StepError::unexpected(format!("expected a {what} record"), &body))
    }
}

fn require_array(body: Value, what: &str) -> Result<Vec<Value>, StepError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(StepError::unexpected(
            format!("expected a list of {what}"),
            &other,
        )),
    }
}

/// Step 1: `POST /clientes`, yields the new customer's id
pub async fn create_customer<A, W>(
    api: &A,
    presenter: &mut Presenter<W>,
) -> Result<ResourceId, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let request = ApiRequest::CreateCustomer(CustomerFixture::initial());
    let body = call(api, presenter, request, "").await?;

    let id = ResourceId::from_record(&body)
        .ok_or_else(|| StepError::unexpected("response has no usable 'id'", &body))?;

    presenter.success("Customer created successfully", Some(&body));
    Ok(id)
}

/// Step 2: `GET /clientes/{id}`
pub async fn get_customer<A, W>(
    api: &A,
    ctx: &RunContext,
    presenter: &mut Presenter<W>,
) -> Result<Value, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let id = ctx.require_customer()?;
    let body = call(api, presenter, ApiRequest::GetCustomer(id.clone()), "").await?;
    let record = require_object(body, "customer")?;

    presenter.success("Customer retrieved successfully", Some(&record));
    Ok(record)
}

/// Step 3: `GET /clientes`, any length is fine
pub async fn list_customers<A, W>(
    api: &A,
    presenter: &mut Presenter<W>,
) -> Result<Vec<Value>, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let body = call(api, presenter, ApiRequest::ListCustomers, "").await?;
    let customers = require_array(body, "customers")?;

    presenter.success(
        &format!("Found {} customers", customers.len()),
        Some(&Value::Array(customers.clone())),
    );
    Ok(customers)
}

/// Step 4: `POST /facturas` for the run's customer
///
/// The response must carry an id and every summary field; the values are
/// shown, not checked.
pub async fn create_invoice<A, W>(
    api: &A,
    ctx: &RunContext,
    presenter: &mut Presenter<W>,
) -> Result<CreatedInvoice, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let customer_id = ctx.require_customer()?;
    let request = ApiRequest::CreateInvoice(InvoiceFixture::sample(customer_id.clone()));
    let body = call(api, presenter, request, "").await?;

    let id = ResourceId::from_record(&body)
        .ok_or_else(|| StepError::unexpected("response has no usable 'id'", &body))?;
    let summary = InvoiceSummary::from_record(&body)?;

    presenter.success("Invoice created successfully", Some(&body));
    presenter.invoice_summary(&summary);
    Ok(CreatedInvoice { id, summary })
}

/// Step 5: `GET /facturas/{id}`
pub async fn get_invoice<A, W>(
    api: &A,
    ctx: &RunContext,
    presenter: &mut Presenter<W>,
) -> Result<Value, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let id = ctx.require_invoice()?;
    let body = call(api, presenter, ApiRequest::GetInvoice(id.clone()), "").await?;
    let record = require_object(body, "invoice")?;

    presenter.success("Invoice retrieved successfully", Some(&record));
    Ok(record)
}

/// Step 6: `GET /facturas?clienteId={id}`
pub async fn list_invoices_for_customer<A, W>(
    api: &A,
    ctx: &RunContext,
    presenter: &mut Presenter<W>,
) -> Result<Vec<Value>, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let customer_id = ctx.require_customer()?;
    let request = ApiRequest::ListInvoicesForCustomer(customer_id.clone());
    let body = call(api, presenter, request, "").await?;
    let invoices = require_array(body, "invoices")?;

    presenter.success(
        &format!("Found {} invoices for the customer", invoices.len()),
        Some(&Value::Array(invoices.clone())),
    );
    Ok(invoices)
}

/// Step 7: `PUT /clientes/{id}` with the updated fixture
///
/// The returned record must reflect every field that was sent. Sending the
/// same fixture again yields the same record.
pub async fn update_customer<A, W>(
    api: &A,
    ctx: &RunContext,
    presenter: &mut Presenter<W>,
) -> Result<Value, StepError>
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let id = ctx.require_customer()?;
    let customer = CustomerFixture::updated();
    let request = ApiRequest::UpdateCustomer {
        id: id.clone(),
        customer: customer.clone(),
    };
    let body = call(api, presenter, request, "").await?;
    let record = require_object(body, "customer")?;

    let mismatches = customer.mismatches(&record);
    if !mismatches.is_empty() {
        return Err(StepError::unexpected(
            format!("updated record does not reflect: {}", mismatches.join(", ")),
            &record,
        ));
    }

    presenter.success("Customer updated successfully", Some(&record));
    Ok(record)
}

/// Step 8: `POST /facturas` for a customer that does not exist
///
/// Passing means the API said no. The outcome is reported but never fails
/// the run.
pub async fn create_invoice_invalid_customer<A, W>(
    api: &A,
    presenter: &mut Presenter<W>,
) -> ValidationOutcome
where
    A: BillingApi + ?Sized,
    W: Write,
{
    let request = ApiRequest::CreateInvoice(InvoiceFixture::for_missing_customer());

    match call(api, presenter, request, " (unknown customer)").await {
        Err(ApiError::Response { status, body }) => {
            presenter.success(
                "Validation works: an invoice cannot be created without a valid customer",
                Some(&body),
            );
            ValidationOutcome::Rejected { status, body }
        }
        Ok(body) => {
            presenter.warning("ANOMALY: expected the request to fail but it succeeded");
            presenter.line(&format!("Response: {body}"));
            ValidationOutcome::Accepted { body }
        }
        Err(ApiError::Transport { message }) => {
            presenter.warning(&format!(
                "Inconclusive: no response, so the customer validation was not observed ({message})"
            ));
            ValidationOutcome::Unreachable { message }
        }
    }
}
