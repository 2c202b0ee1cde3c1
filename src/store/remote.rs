use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};
use ureq::Agent;

use super::wire::{self, Envelope, WireClient, WireFee, WirePayment};
use super::{RecordStore, Result, StoreError};
use crate::model::{
    Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch, NewClient,
    NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch, RecordKind,
};

/// Record store backed by the hosted record service.
///
/// Every call is a JSON `POST {base_url}/tables/{table}/{action}`. The
/// service answers with `{ success, message, data }`; `success: false` is
/// logged and surfaced as [`StoreError::NotFound`] for a missing record or
/// [`StoreError::Rejected`] otherwise.
pub struct RemoteStore {
    agent: Agent,
    base_url: String,
    api_key: Option<String>,
}

fn where_eq(field: &str, value: Value) -> Value {
    json!({ "FieldName": field, "Operator": "EqualTo", "Values": [value] })
}

fn with_id(id: u32, mut fields: Map<String, Value>) -> Value {
    fields.insert("Id".into(), json!(id));
    json!({ "records": [Value::Object(fields)] })
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn call<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        action: &str,
        id: Option<u32>,
        body: Value,
    ) -> Result<Option<T>> {
        let url = format!("{}/tables/{}/{}", self.base_url, wire::table(kind), action);
        debug!(%url, "record service request");

        let mut request = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let mut response = request
            .send(body.to_string())
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            if status.is_success() {
                StoreError::Corrupt(format!("{action} {kind}: {e}"))
            } else {
                StoreError::Transport(format!("HTTP {status} from {url}"))
            }
        })?;

        envelope.into_data(kind, action, id).inspect_err(|e| match e {
            StoreError::NotFound { id, .. } => {
                debug!(%kind, action, id, "record service has no such record")
            }
            _ => warn!(%kind, action, error = %e, "record service rejected request"),
        })
    }

    fn fetch<W: DeserializeOwned>(&self, kind: RecordKind, conditions: Vec<Value>) -> Result<Vec<W>> {
        let rows: Option<Vec<W>> =
            self.call(kind, "fetch", None, json!({ "where": conditions }))?;
        Ok(rows.unwrap_or_default())
    }

    fn get<W: DeserializeOwned>(&self, kind: RecordKind, id: u32) -> Result<W> {
        self.call(kind, "get", Some(id), json!({ "id": id }))?
            .ok_or(StoreError::NotFound { kind, id })
    }

    fn create<W: DeserializeOwned>(&self, kind: RecordKind, fields: Value) -> Result<W> {
        self.call(kind, "create", None, json!({ "records": [fields] }))?
            .ok_or_else(|| StoreError::Rejected(format!("create {kind} returned no record")))
    }

    fn update<W: DeserializeOwned>(
        &self,
        kind: RecordKind,
        id: u32,
        fields: Map<String, Value>,
    ) -> Result<W> {
        self.call(kind, "update", Some(id), with_id(id, fields))?
            .ok_or(StoreError::NotFound { kind, id })
    }

    fn delete(&self, kind: RecordKind, id: u32) -> Result<()> {
        let _: Option<Value> =
            self.call(kind, "delete", Some(id), json!({ "RecordIds": [id] }))?;
        Ok(())
    }
}

impl RecordStore for RemoteStore {
    fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>> {
        let mut conditions = Vec::new();
        if let Some(status) = filter.status {
            conditions.push(where_eq("status_c", json!(status)));
        }
        let rows: Vec<WireClient> = self.fetch(RecordKind::Client, conditions)?;
        Ok(rows
            .into_iter()
            .map(Client::from)
            .filter(|c| filter.matches(c))
            .collect())
    }

    fn get_client(&self, id: ClientId) -> Result<Client> {
        self.get::<WireClient>(RecordKind::Client, id).map(Client::from)
    }

    fn create_client(&self, fields: NewClient) -> Result<Client> {
        self.create::<WireClient>(RecordKind::Client, wire::new_client_fields(&fields))
            .map(Client::from)
    }

    fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client> {
        self.update::<WireClient>(RecordKind::Client, id, wire::client_patch_fields(&patch))
            .map(Client::from)
    }

    fn delete_client(&self, id: ClientId) -> Result<Client> {
        let client = self.get_client(id)?;
        self.delete(RecordKind::Client, id)?;
        Ok(client)
    }

    fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>> {
        let mut conditions = Vec::new();
        if let Some(client_id) = filter.client_id {
            conditions.push(where_eq("client_id_c", json!(client_id)));
        }
        if let Some(status) = filter.status {
            conditions.push(where_eq("status_c", json!(status)));
        }
        let rows: Vec<WireFee> = self.fetch(RecordKind::Fee, conditions)?;
        Ok(rows
            .into_iter()
            .map(Fee::from)
            .filter(|f| filter.matches(f))
            .collect())
    }

    fn get_fee(&self, id: FeeId) -> Result<Fee> {
        self.get::<WireFee>(RecordKind::Fee, id).map(Fee::from)
    }

    fn create_fee(&self, fields: NewFee) -> Result<Fee> {
        self.create::<WireFee>(RecordKind::Fee, wire::new_fee_fields(&fields))
            .map(Fee::from)
    }

    fn update_fee(&self, id: FeeId, patch: FeePatch) -> Result<Fee> {
        self.update::<WireFee>(RecordKind::Fee, id, wire::fee_patch_fields(&patch))
            .map(Fee::from)
    }

    fn delete_fee(&self, id: FeeId) -> Result<Fee> {
        let fee = self.get_fee(id)?;
        self.delete(RecordKind::Fee, id)?;
        Ok(fee)
    }

    fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        let mut conditions = Vec::new();
        if let Some(fee_id) = filter.fee_id {
            conditions.push(where_eq("fee_id_c", json!(fee_id)));
        }
        let rows: Vec<WirePayment> = self.fetch(RecordKind::Payment, conditions)?;
        Ok(rows
            .into_iter()
            .map(Payment::from)
            .filter(|p| filter.matches(p))
            .collect())
    }

    fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.get::<WirePayment>(RecordKind::Payment, id)
            .map(Payment::from)
    }

    fn create_payment(&self, fields: NewPayment) -> Result<Payment> {
        self.create::<WirePayment>(RecordKind::Payment, wire::new_payment_fields(&fields))
            .map(Payment::from)
    }

    fn update_payment(&self, id: PaymentId, patch: PaymentPatch) -> Result<Payment> {
        self.update::<WirePayment>(RecordKind::Payment, id, wire::payment_patch_fields(&patch))
            .map(Payment::from)
    }

    fn delete_payment(&self, id: PaymentId) -> Result<Payment> {
        let payment = self.get_payment(id)?;
        self.delete(RecordKind::Payment, id)?;
        Ok(payment)
    }
}
