use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

use super::{RecordStore, Result, StoreError, Tables};
use crate::model::{
    Client, ClientFilter, ClientId, ClientPatch, Fee, FeeFilter, FeeId, FeePatch, NewClient,
    NewFee, NewPayment, Payment, PaymentFilter, PaymentId, PaymentPatch,
};

/// Record store persisted as a single TOML file.
///
/// Every call reads the file, applies one change and writes it back, so each
/// call is atomic for its record the same way a remote store call is.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Load records (empty tables if the file does not exist yet)
    pub fn load(&self) -> Result<Tables> {
        if !self.path.exists() {
            return Ok(Tables::default());
        }
        let content = fs::read_to_string(&self.path)?;
        toml::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    pub fn save(&self, tables: &Tables) -> Result<()> {
        let content =
            toml::to_string_pretty(tables).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> Result<T>) -> Result<T> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        f(&self.load()?)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut tables = self.load()?;
        let value = f(&mut tables)?;
        self.save(&tables)?;
        debug!(path = %self.path.display(), "saved records");
        Ok(value)
    }
}

impl RecordStore for FileStore {
    fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>> {
        self.read(|t| Ok(t.list_clients(filter)))
    }

    fn get_client(&self, id: ClientId) -> Result<Client> {
        self.read(|t| t.get_client(id))
    }

    fn create_client(&self, fields: NewClient) -> Result<Client> {
        self.write(|t| Ok(t.insert_client(fields)))
    }

    fn update_client(&self, id: ClientId, patch: ClientPatch) -> Result<Client> {
        self.write(|t| t.update_client(id, &patch))
    }

    fn delete_client(&self, id: ClientId) -> Result<Client> {
        self.write(|t| t.remove_client(id))
    }

    fn list_fees(&self, filter: &FeeFilter) -> Result<Vec<Fee>> {
        self.read(|t| Ok(t.list_fees(filter)))
    }

    fn get_fee(&self, id: FeeId) -> Result<Fee> {
        self.read(|t| t.get_fee(id))
    }

    fn create_fee(&self, fields: NewFee) -> Result<Fee> {
        self.write(|t| Ok(t.insert_fee(fields)))
    }

    fn update_fee(&self, id: FeeId, patch: FeePatch) -> Result<Fee> {
        self.write(|t| t.update_fee(id, &patch))
    }

    fn delete_fee(&self, id: FeeId) -> Result<Fee> {
        self.write(|t| t.remove_fee(id))
    }

    fn list_payments(&self, filter: &PaymentFilter) -> Result<Vec<Payment>> {
        self.read(|t| Ok(t.list_payments(filter)))
    }

    fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.read(|t| t.get_payment(id))
    }

    fn create_payment(&self, fields: NewPayment) -> Result<Payment> {
        self.write(|t| Ok(t.insert_payment(fields)))
    }

    fn update_payment(&self, id: PaymentId, patch: PaymentPatch) -> Result<Payment> {
        self.write(|t| t.update_payment(id, &patch))
    }

    fn delete_payment(&self, id: PaymentId) -> Result<Payment> {
        self.write(|t| t.remove_payment(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn records_survive_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.toml");

        let store = FileStore::new(&path);
        let client = store
            .create_client(NewClient {
                name: "Acme".to_string(),
                email: "billing@acme.test".to_string(),
                phone: None,
            })
            .unwrap();
        store
            .create_fee(NewFee {
                client_id: client.id,
                description: "Setup".to_string(),
                note: String::new(),
                amount: Decimal::new(12050, 2),
                due_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                category: "Setup".into(),
                is_recurring: false,
            })
            .unwrap();

        let reopened = FileStore::new(&path);
        let fees = reopened.list_fees(&FeeFilter::for_client(client.id)).unwrap();
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].amount, Decimal::new(12050, 2));
        assert_eq!(reopened.get_client(client.id).unwrap().name, "Acme");
    }

    #[test]
    fn deleted_ids_stay_retired_across_reopening() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("records.toml");
        let acme = NewClient {
            name: "Acme".to_string(),
            ..NewClient::default()
        };

        let store = FileStore::new(&path);
        store.create_client(acme.clone()).unwrap();
        let second = store.create_client(acme.clone()).unwrap();
        store.delete_client(second.id).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.create_client(acme).unwrap().id, second.id + 1);
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("none.toml"));
        assert!(store.list_clients(&ClientFilter::default()).unwrap().is_empty());
    }
}
