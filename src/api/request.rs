//! Billing API request model
//!
//! Every call the harness makes is one [`ApiRequest`]; the HTTP client maps it
//! to a method, a URL and an optional JSON body.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::fixtures::{CustomerFixture, InvoiceFixture};

/// Identifier assigned by the billing API
///
/// The API may hand out numeric or string ids; whichever shape came back is
/// the shape sent on later requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl ResourceId {
    /// Extract a usable identifier from the `id` field of a response record
    pub fn from_record(record: &serde_json::Value) -> Option<Self> {
        let id: ResourceId = serde_json::from_value(record.get("id")?.clone()).ok()?;
        match &id {
            ResourceId::Text(text) if text.trim().is_empty() => None,
            _ => Some(id),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{n}"),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

/// HTTP method used by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against the billing API
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    // === Customers ===
    /// `POST /clientes`
    CreateCustomer(CustomerFixture),
    /// `GET /clientes/{id}`
    GetCustomer(ResourceId),
    /// `GET /clientes`
    ListCustomers,
    /// `PUT /clientes/{id}`
    UpdateCustomer {
        id: ResourceId,
        customer: CustomerFixture,
    },

    // === Invoices ===
    /// `POST /facturas`
    CreateInvoice(InvoiceFixture),
    /// `GET /facturas/{id}`
    GetInvoice(ResourceId),
    /// `GET /facturas?clienteId={id}`
    ListInvoicesForCustomer(ResourceId),
}

impl ApiRequest {
    pub fn method(&self) -> Method {
        match self {
            ApiRequest::CreateCustomer(_) | ApiRequest::CreateInvoice(_) => Method::Post,
            ApiRequest::UpdateCustomer { .. } => Method::Put,
            ApiRequest::GetCustomer(_)
            | ApiRequest::ListCustomers
            | ApiRequest::GetInvoice(_)
            | ApiRequest::ListInvoicesForCustomer(_) => Method::Get,
        }
    }

    /// Path segments below the base URL, ids unescaped
    fn segments(&self) -> Vec<String> {
        match self {
            ApiRequest::CreateCustomer(_) | ApiRequest::ListCustomers => vec!["clientes".into()],
            ApiRequest::GetCustomer(id) | ApiRequest::UpdateCustomer { id, .. } => {
                vec!["clientes".into(), id.to_string()]
            }
            ApiRequest::CreateInvoice(_) | ApiRequest::ListInvoicesForCustomer(_) => {
                vec!["facturas".into()]
            }
            ApiRequest::GetInvoice(id) => vec!["facturas".into(), id.to_string()],
        }
    }

    /// Query parameter, unescaped
    fn query(&self) -> Option<(&'static str, String)> {
        match self {
            ApiRequest::ListInvoicesForCustomer(id) => Some(("clienteId", id.to_string())),
            _ => None,
        }
    }

    /// Full URL of this request under `base`
    ///
    /// Ids are percent-encoded as a single path segment or query value, so a
    /// string id can never change the endpoint or add parameters.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        // http(s) URLs always have a path to extend
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(self.segments());
        }
        if let Some((key, value)) = self.query() {
            url.query_pairs_mut().append_pair(key, &value);
        }
        url
    }

    /// Readable path with the ids as they are, for notices and logs
    pub fn path(&self) -> String {
        let path = format!("/{}", self.segments().join("/"));
        match self.query() {
            Some((key, value)) => format!("{path}?{key}={value}"),
            None => path,
        }
    }

    /// JSON body, for requests that carry one
    pub fn body(&self) -> Option<serde_json::Value> {
        let body = match self {
            ApiRequest::CreateCustomer(customer)
            | ApiRequest::UpdateCustomer { customer, .. } => serde_json::to_value(customer),
            ApiRequest::CreateInvoice(invoice) => serde_json::to_value(invoice),
            _ => return None,
        };
        // Fixtures are plain structs of strings, numbers and bools
        body.ok()
    }

    /// Short `METHOD /path` form for notices and logs
    pub fn describe(&self) -> String {
        format!("{} {}", self.method(), self.path())
    }
}
