//! Request fixtures and response summaries
//!
//! Field names on the wire follow the billing API (Spanish, camelCase); the
//! Rust side uses English names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ResourceId;
use crate::common::StepError;

/// Customer id that the API is expected not to know about
pub const MISSING_CUSTOMER_ID: u64 = 99999;

/// Customer payload for create and update calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerFixture {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nit")]
    pub tax_id: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "activo")]
    pub active: bool,
}

impl CustomerFixture {
    /// Customer created by the first step
    pub fn initial() -> Self {
        Self {
            name: "Empresa de Prueba S.A.S.".to_string(),
            tax_id: "900123456-7".to_string(),
            email: "contacto@empresaprueba.com".to_string(),
            phone: "3001234567".to_string(),
            address: "Calle 100 #15-20, Bogotá".to_string(),
            active: true,
        }
    }

    /// Same customer with new contact details, sent by the update step
    pub fn updated() -> Self {
        Self {
            name: "Empresa de Prueba S.A.S. - Actualizada".to_string(),
            tax_id: "900123456-7".to_string(),
            email: "nuevo@empresaprueba.com".to_string(),
            phone: "3109876543".to_string(),
            address: "Carrera 7 #32-40, Bogotá".to_string(),
            active: true,
        }
    }

    /// Wire names of fields whose value `record` does not reflect
    ///
    /// A field missing from the record counts as a mismatch.
    pub fn mismatches(&self, record: &Value) -> Vec<&'static str> {
        let expected = [
            ("nombre", Value::from(self.name.as_str())),
            ("nit", Value::from(self.tax_id.as_str())),
            ("email", Value::from(self.email.as_str())),
            ("telefono", Value::from(self.phone.as_str())),
            ("direccion", Value::from(self.address.as_str())),
            ("activo", Value::from(self.active)),
        ];

        expected
            .into_iter()
            .filter(|(field, value)| record.get(*field) != Some(value))
            .map(|(field, _)| field)
            .collect()
    }
}

/// One invoice line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    #[serde(rename = "precioUnitario")]
    pub unit_price: u64,
    #[serde(rename = "porcentajeImpuesto")]
    pub tax_percent: u32,
    #[serde(rename = "porcentajeDescuento")]
    pub discount_percent: u32,
}

impl LineItem {
    fn new(description: &str, quantity: u32, unit_price: u64, tax: u32, discount: u32) -> Self {
        Self {
            description: description.to_string(),
            quantity,
            unit_price,
            tax_percent: tax,
            discount_percent: discount,
        }
    }
}

/// Invoice payload for `POST /facturas`
///
/// Sent as-is; totals are computed by the service, never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFixture {
    #[serde(rename = "clienteId")]
    pub customer_id: ResourceId,
    pub items: Vec<LineItem>,
}

impl InvoiceFixture {
    /// Three-line invoice for the customer created earlier in the run
    pub fn sample(customer_id: ResourceId) -> Self {
        Self {
            customer_id,
            items: vec![
                LineItem::new("Laptop Dell Inspiron 15", 2, 2_500_000, 19, 5),
                LineItem::new("Mouse Inalámbrico Logitech", 3, 80_000, 19, 10),
                LineItem::new("Teclado Mecánico RGB", 2, 350_000, 19, 0),
            ],
        }
    }

    /// Invoice addressed to [`MISSING_CUSTOMER_ID`]; the API must reject it
    pub fn for_missing_customer() -> Self {
        Self {
            customer_id: ResourceId::Number(MISSING_CUSTOMER_ID),
            items: vec![LineItem::new("Producto Test", 1, 100_000, 19, 0)],
        }
    }
}

/// Computed fields the API must return for a created invoice
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceSummary {
    pub number: Value,
    pub subtotal: Value,
    pub taxes: Value,
    pub discounts: Value,
    pub total: Value,
}

impl InvoiceSummary {
    /// Extract the summary fields from an invoice record
    ///
    /// The billing service's snake_case names are accepted alongside the
    /// documented ones.
    pub fn from_record(record: &Value) -> Result<Self, StepError> {
        Ok(Self {
            number: summary_field(record, &["numeroFactura", "numero"])?,
            subtotal: summary_field(record, &["subtotal", "subtotal_general"])?,
            taxes: summary_field(record, &["impuestos", "total_impuestos"])?,
            discounts: summary_field(record, &["descuentos", "total_descuentos"])?,
            total: summary_field(record, &["total", "total_final"])?,
        })
    }
}

/// First non-null value among `names`, reported under the first name if absent
fn summary_field(record: &Value, names: &[&str]) -> Result<Value, StepError> {
    names
        .iter()
        .filter_map(|name| record.get(*name))
        .find(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| StepError::unexpected(format!("missing field '{}'", names[0]), record))
}
