use serde::{Deserialize, Serialize};

use crate::ledger::PaymentPolicy;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LedgerSettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    /// Refuse payments against fees already stored as paid
    #[serde(default)]
    pub reject_payments_on_paid_fees: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            reject_payments_on_paid_fees: false,
        }
    }
}

impl LedgerSettings {
    pub fn payment_policy(&self) -> PaymentPolicy {
        PaymentPolicy {
            reject_payments_on_paid_fees: self.reject_payments_on_paid_fees,
        }
    }
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    File,
    Remote,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,
    /// Record file for the file backend, relative to the config directory
    #[serde(default = "default_data_file")]
    pub data_file: String,
    #[serde(default)]
    pub remote: Option<RemoteSettings>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            data_file: default_data_file(),
            remote: None,
        }
    }
}

fn default_data_file() -> String {
    "records.toml".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}
