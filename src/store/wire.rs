//! Field-name mapping between canonical records and the hosted record
//! service. The service suffixes custom fields with `_c`, capitalizes its
//! built-in `Id`/`Name` fields and may expand lookup fields into
//! `{ "Id": .., "Name": .. }` objects.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::StoreError;
use crate::model::{
    Client, ClientPatch, ClientStatus, Fee, FeeCategory, FeePatch, FeeStatus, NewClient, NewFee,
    NewPayment, Payment, PaymentMethod, PaymentPatch, RecordKind,
};

pub const CLIENT_TABLE: &str = "client_c";
pub const FEE_TABLE: &str = "fee_c";
pub const PAYMENT_TABLE: &str = "payment_c";

pub fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Client => CLIENT_TABLE,
        RecordKind::Fee => FEE_TABLE,
        RecordKind::Payment => PAYMENT_TABLE,
    }
}

/// Response envelope returned by every service call
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Classify the answer to `action` on `kind`. `id` is the record the call
    /// addressed, if any; a refusal for an addressed record that the service
    /// reports as missing becomes [`StoreError::NotFound`].
    pub fn into_data(
        self,
        kind: RecordKind,
        action: &str,
        id: Option<u32>,
    ) -> Result<Option<T>, StoreError> {
        if self.success {
            return Ok(self.data);
        }
        let message = self
            .message
            .unwrap_or_else(|| format!("{action} {kind} failed"));
        match id {
            Some(id) if message.to_lowercase().contains("not found") => {
                Err(StoreError::NotFound { kind, id })
            }
            _ => Err(StoreError::Rejected(message)),
        }
    }
}

/// Lookup field: a bare id or an expanded `{Id, Name}` reference
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lookup {
    Id(u32),
    Ref {
        #[serde(rename = "Id")]
        id: u32,
    },
}

impl Lookup {
    fn id(&self) -> u32 {
        match self {
            Lookup::Id(id) | Lookup::Ref { id } => *id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireClient {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(default)]
    email_c: Option<String>,
    #[serde(default)]
    phone_c: Option<String>,
    #[serde(default)]
    status_c: Option<ClientStatus>,
    #[serde(default)]
    total_due_c: Option<Decimal>,
    #[serde(default)]
    total_paid_c: Option<Decimal>,
}

impl From<WireClient> for Client {
    fn from(w: WireClient) -> Self {
        Client {
            id: w.id,
            name: w.name,
            email: w.email_c.unwrap_or_default(),
            phone: w.phone_c.filter(|p| !p.is_empty()),
            status: w.status_c.unwrap_or_default(),
            total_due: w.total_due_c.unwrap_or_default(),
            total_paid: w.total_paid_c.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireFee {
    #[serde(rename = "Id")]
    id: u32,
    client_id_c: Lookup,
    #[serde(default)]
    description_c: Option<String>,
    #[serde(default)]
    note_c: Option<String>,
    amount_c: Decimal,
    due_date_c: NaiveDate,
    #[serde(default)]
    category_c: Option<FeeCategory>,
    #[serde(default)]
    is_recurring_c: Option<bool>,
    #[serde(default)]
    status_c: Option<FeeStatus>,
}

impl From<WireFee> for Fee {
    fn from(w: WireFee) -> Self {
        Fee {
            id: w.id,
            client_id: w.client_id_c.id(),
            description: w.description_c.unwrap_or_default(),
            note: w.note_c.unwrap_or_default(),
            amount: w.amount_c,
            due_date: w.due_date_c,
            category: w.category_c.unwrap_or_default(),
            is_recurring: w.is_recurring_c.unwrap_or(false),
            status: w.status_c.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WirePayment {
    #[serde(rename = "Id")]
    id: u32,
    fee_id_c: Lookup,
    amount_c: Decimal,
    payment_date_c: NaiveDate,
    #[serde(default)]
    method_c: Option<PaymentMethod>,
    #[serde(default)]
    reference_c: Option<String>,
}

impl From<WirePayment> for Payment {
    fn from(w: WirePayment) -> Self {
        Payment {
            id: w.id,
            fee_id: w.fee_id_c.id(),
            amount: w.amount_c,
            payment_date: w.payment_date_c,
            method: w.method_c.unwrap_or_default(),
            reference: w.reference_c.unwrap_or_default(),
        }
    }
}

/// Currency fields travel as JSON numbers
fn money(amount: Decimal) -> Value {
    amount.to_f64().map(Value::from).unwrap_or(Value::Null)
}

fn date(d: NaiveDate) -> Value {
    Value::String(d.format("%Y-%m-%d").to_string())
}

pub fn new_client_fields(fields: &NewClient) -> Value {
    json!({
        "Name": fields.name,
        "email_c": fields.email,
        "phone_c": fields.phone.clone().unwrap_or_default(),
        "status_c": ClientStatus::Active,
        "total_due_c": 0,
        "total_paid_c": 0,
    })
}

pub fn client_patch_fields(patch: &ClientPatch) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(name) = &patch.name {
        out.insert("Name".into(), json!(name));
    }
    if let Some(email) = &patch.email {
        out.insert("email_c".into(), json!(email));
    }
    if let Some(phone) = &patch.phone {
        out.insert("phone_c".into(), json!(phone));
    }
    if let Some(status) = patch.status {
        out.insert("status_c".into(), json!(status));
    }
    if let Some(total_due) = patch.total_due {
        out.insert("total_due_c".into(), money(total_due));
    }
    if let Some(total_paid) = patch.total_paid {
        out.insert("total_paid_c".into(), money(total_paid));
    }
    out
}

pub fn new_fee_fields(fields: &NewFee) -> Value {
    json!({
        "Name": fields.description,
        "client_id_c": fields.client_id,
        "description_c": fields.description,
        "note_c": fields.note,
        "amount_c": money(fields.amount),
        "due_date_c": date(fields.due_date),
        "category_c": fields.category,
        "is_recurring_c": fields.is_recurring,
        "status_c": FeeStatus::Pending,
    })
}

pub fn fee_patch_fields(patch: &FeePatch) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(client_id) = patch.client_id {
        out.insert("client_id_c".into(), json!(client_id));
    }
    if let Some(description) = &patch.description {
        out.insert("description_c".into(), json!(description));
    }
    if let Some(note) = &patch.note {
        out.insert("note_c".into(), json!(note));
    }
    if let Some(amount) = patch.amount {
        out.insert("amount_c".into(), money(amount));
    }
    if let Some(due_date) = patch.due_date {
        out.insert("due_date_c".into(), date(due_date));
    }
    if let Some(category) = &patch.category {
        out.insert("category_c".into(), json!(category));
    }
    if let Some(is_recurring) = patch.is_recurring {
        out.insert("is_recurring_c".into(), json!(is_recurring));
    }
    if let Some(status) = patch.status {
        out.insert("status_c".into(), json!(status));
    }
    out
}

pub fn new_payment_fields(fields: &NewPayment) -> Value {
    json!({
        "fee_id_c": fields.fee_id,
        "amount_c": money(fields.amount),
        "payment_date_c": date(fields.payment_date),
        "method_c": fields.method,
        "reference_c": fields.reference,
    })
}

pub fn payment_patch_fields(patch: &PaymentPatch) -> Map<String, Value> {
    let mut out = Map::new();
    if let Some(fee_id) = patch.fee_id {
        out.insert("fee_id_c".into(), json!(fee_id));
    }
    if let Some(amount) = patch.amount {
        out.insert("amount_c".into(), money(amount));
    }
    if let Some(payment_date) = patch.payment_date {
        out.insert("payment_date_c".into(), date(payment_date));
    }
    if let Some(method) = patch.method {
        out.insert("method_c".into(), json!(method));
    }
    if let Some(reference) = &patch.reference {
        out.insert("reference_c".into(), json!(reference));
    }
    out
}
