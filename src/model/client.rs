use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{contains_folded, ClientId};
use crate::error::LedgerError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: ClientStatus,
    /// Sum of pending and overdue fee amounts, maintained by reconciliation
    #[serde(default)]
    pub total_due: Decimal,
    /// Sum of paid fee amounts, maintained by reconciliation
    #[serde(default)]
    pub total_paid: Decimal,
}

impl Client {
    pub fn apply(&mut self, patch: &ClientPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(total_due) = patch.total_due {
            self.total_due = total_due;
        }
        if let Some(total_paid) = patch.total_paid {
            self.total_paid = total_paid;
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientStatus::Active => write!(f, "active"),
            ClientStatus::Inactive => write!(f, "inactive"),
        }
    }
}

impl FromStr for ClientStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            _ => Err(LedgerError::InvalidValue {
                field: "client status",
                value: s.to_string(),
            }),
        }
    }
}

/// Fields supplied when creating a client. New clients start active with
/// zero totals.
#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewClient {
    pub fn into_client(self, id: ClientId) -> Client {
        Client {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            status: ClientStatus::Active,
            total_due: Decimal::ZERO,
            total_paid: Decimal::ZERO,
        }
    }
}

/// Partial update of a client; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<ClientStatus>,
    pub total_due: Option<Decimal>,
    pub total_paid: Option<Decimal>,
}

impl ClientPatch {
    /// Replace both derived totals at once
    pub fn totals(total_due: Decimal, total_paid: Decimal) -> Self {
        Self {
            total_due: Some(total_due),
            total_paid: Some(total_paid),
            ..Self::default()
        }
    }

    /// Drop the derived totals so only authored fields remain
    pub fn without_totals(mut self) -> Self {
        self.total_due = None;
        self.total_paid = None;
        self
    }

    pub fn touches_totals(&self) -> bool {
        self.total_due.is_some() || self.total_paid.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientFilter {
    pub status: Option<ClientStatus>,
    /// Case-insensitive substring of the name or email
    pub search: Option<String>,
}

impl ClientFilter {
    pub fn matches(&self, client: &Client) -> bool {
        self.status.map_or(true, |s| client.status == s)
            && self.search.as_deref().map_or(true, |term| {
                contains_folded(&client.name, term) || contains_folded(&client.email, term)
            })
    }
}
