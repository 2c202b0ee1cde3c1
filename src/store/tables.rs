use serde::{Deserialize, Serialize};

use super::{Result, StoreError};
use crate::model::{
    Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch, NewClient,
    NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch, Record,
};

/// In-process record tables shared by the memory and file adapters.
///
/// Ids are never reused: a new id is one past both the highest id ever
/// handed out and the highest id currently in the table.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct Tables {
    #[serde(default)]
    pub last_ids: LastIds,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub fees: Vec<Fee>,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// Highest id handed out per table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LastIds {
    #[serde(default)]
    pub client: u32,
    #[serde(default)]
    pub fee: u32,
    #[serde(default)]
    pub payment: u32,
}

fn next_id<R: Record>(rows: &[R], last: &mut u32) -> u32 {
    let id = rows.iter().map(Record::id).max().unwrap_or(0).max(*last) + 1;
    *last = id;
    id
}

fn find<R: Record>(rows: &[R], id: u32) -> Result<&R> {
    rows.iter().find(|r| r.id() == id).ok_or(StoreError::NotFound {
        kind: R::KIND,
        id,
    })
}

fn find_mut<R: Record>(rows: &mut [R], id: u32) -> Result<&mut R> {
    rows.iter_mut()
        .find(|r| r.id() == id)
        .ok_or(StoreError::NotFound { kind: R::KIND, id })
}

fn remove<R: Record>(rows: &mut Vec<R>, id: u32) -> Result<R> {
    let index = rows
        .iter()
        .position(|r| r.id() == id)
        .ok_or(StoreError::NotFound { kind: R::KIND, id })?;
    Ok(rows.remove(index))
}

impl Tables {
    pub fn list_clients(&self, filter: &ClientFilter) -> Vec<Client> {
        self.clients
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect()
    }

    pub fn get_client(&self, id: ClientId) -> Result<Client> {
        find(&self.clients, id).cloned()
    }

    pub fn insert_client(&mut self, fields: NewClient) -> Client {
        let client = fields.into_client(next_id(&self.clients, &mut self.last_ids.client));
        self.clients.push(client.clone());
        client
    }

    pub fn update_client(&mut self, id: ClientId, patch: &ClientPatch) -> Result<Client> {
        let client = find_mut(&mut self.clients, id)?;
        client.apply(patch);
        Ok(client.clone())
    }

    pub fn remove_client(&mut self, id: ClientId) -> Result<Client> {
        remove(&mut self.clients, id)
    }

    pub fn list_fees(&self, filter: &FeeFilter) -> Vec<Fee> {
        self.fees
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect()
    }

    pub fn get_fee(&self, id: FeeId) -> Result<Fee> {
        find(&self.fees, id).cloned()
    }

    pub fn insert_fee(&mut self, fields: NewFee) -> Fee {
        let fee = fields.into_fee(next_id(&self.fees, &mut self.last_ids.fee));
        self.fees.push(fee.clone());
        fee
    }

    pub fn update_fee(&mut self, id: FeeId, patch: &FeePatch) -> Result<Fee> {
        let fee = find_mut(&mut self.fees, id)?;
        fee.apply(patch);
        Ok(fee.clone())
    }

    pub fn remove_fee(&mut self, id: FeeId) -> Result<Fee> {
        remove(&mut self.fees, id)
    }

    pub fn list_payments(&self, filter: &PaymentFilter) -> Vec<Payment> {
        self.payments
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    pub fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        find(&self.payments, id).cloned()
    }

    pub fn insert_payment(&mut self, fields: NewPayment) -> Payment {
        let payment = fields.into_payment(next_id(&self.payments, &mut self.last_ids.payment));
        self.payments.push(payment.clone());
        payment
    }

    pub fn update_payment(&mut self, id: PaymentId, patch: &PaymentPatch) -> Result<Payment> {
        let payment = find_mut(&mut self.payments, id)?;
        payment.apply(patch);
        Ok(payment.clone())
    }

    pub fn remove_payment(&mut self, id: PaymentId) -> Result<Payment> {
        remove(&mut self.payments, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordKind;

    fn client(name: &str) -> NewClient {
        NewClient {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
        }
    }

    #[test]
    fn deleted_ids_are_never_handed_out_again() {
        let mut tables = Tables::default();
        assert_eq!(tables.insert_client(client("Acme")).id, 1);
        assert_eq!(tables.insert_client(client("Globex")).id, 2);

        tables.remove_client(2).unwrap();
        assert_eq!(tables.insert_client(client("Initech")).id, 3);

        tables.remove_client(3).unwrap();
        assert_eq!(tables.insert_client(client("Umbrella")).id, 4);
        assert_eq!(tables.last_ids.client, 4);
    }

    #[test]
    fn rows_written_without_counters_still_get_fresh_ids() {
        let mut tables: Tables = toml::from_str(
            r#"
[[clients]]
id = 7
name = "Acme"
"#,
        )
        .unwrap();
        assert_eq!(tables.last_ids, LastIds::default());
        assert_eq!(tables.insert_client(client("Globex")).id, 8);
    }

    #[test]
    fn missing_rows_report_kind_and_id() {
        let mut tables = Tables::default();
        match tables.update_fee(9, &FeePatch::default()) {
            Err(StoreError::NotFound { kind, id }) => {
                assert_eq!(kind, RecordKind::Fee);
                assert_eq!(id, 9);
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
