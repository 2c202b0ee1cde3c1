use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{contains_folded, fold_label, ClientId, FeeId};
use crate::error::LedgerError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Fee {
    pub id: FeeId,
    pub client_id: ClientId,
    pub description: String,
    #[serde(default)]
    pub note: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub category: FeeCategory,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub status: FeeStatus,
}

impl Fee {
    pub fn apply(&mut self, patch: &FeePatch) {
        if let Some(client_id) = patch.client_id {
            self.client_id = client_id;
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(note) = &patch.note {
            self.note = note.clone();
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(is_recurring) = patch.is_recurring {
            self.is_recurring = is_recurring;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Stored lifecycle status of a fee. `Overdue` is normally derived at read
/// time from a `Pending` fee whose due date has passed.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    #[default]
    Pending,
    Overdue,
    Paid,
}

impl FeeStatus {
    /// Pending and overdue fees count towards a client's total due
    pub fn is_outstanding(self) -> bool {
        matches!(self, FeeStatus::Pending | FeeStatus::Overdue)
    }
}

impl fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeStatus::Pending => write!(f, "pending"),
            FeeStatus::Overdue => write!(f, "overdue"),
            FeeStatus::Paid => write!(f, "paid"),
        }
    }
}

impl FromStr for FeeStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(FeeStatus::Pending),
            "overdue" => Ok(FeeStatus::Overdue),
            "paid" => Ok(FeeStatus::Paid),
            _ => Err(LedgerError::InvalidValue {
                field: "fee status",
                value: s.to_string(),
            }),
        }
    }
}

/// Fee category label. The well-known labels come from the fee form; any
/// other label is kept verbatim.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum FeeCategory {
    #[default]
    Consulting,
    License,
    Setup,
    Training,
    Maintenance,
    Design,
    Other(String),
}

impl FeeCategory {
    pub fn as_str(&self) -> &str {
        match self {
            FeeCategory::Consulting => "Consulting",
            FeeCategory::License => "License",
            FeeCategory::Setup => "Setup",
            FeeCategory::Training => "Training",
            FeeCategory::Maintenance => "Maintenance",
            FeeCategory::Design => "Design",
            FeeCategory::Other(label) => label,
        }
    }
}

impl From<String> for FeeCategory {
    fn from(label: String) -> Self {
        match fold_label(&label).as_str() {
            "consulting" => FeeCategory::Consulting,
            "license" => FeeCategory::License,
            "setup" => FeeCategory::Setup,
            "training" => FeeCategory::Training,
            "maintenance" => FeeCategory::Maintenance,
            "design" => FeeCategory::Design,
            _ => FeeCategory::Other(label.trim().to_string()),
        }
    }
}

impl From<&str> for FeeCategory {
    fn from(label: &str) -> Self {
        FeeCategory::from(label.to_string())
    }
}

impl From<FeeCategory> for String {
    fn from(category: FeeCategory) -> Self {
        match category {
            FeeCategory::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for FeeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields supplied when creating a fee. There is no status field: every fee
/// is created `pending`.
#[derive(Debug, Clone)]
pub struct NewFee {
    pub client_id: ClientId,
    pub description: String,
    pub note: String,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub category: FeeCategory,
    pub is_recurring: bool,
}

impl NewFee {
    pub fn into_fee(self, id: FeeId) -> Fee {
        Fee {
            id,
            client_id: self.client_id,
            description: self.description,
            note: self.note,
            amount: self.amount,
            due_date: self.due_date,
            category: self.category,
            is_recurring: self.is_recurring,
            status: FeeStatus::Pending,
        }
    }
}

/// Partial update of a fee; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeePatch {
    pub client_id: Option<ClientId>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub category: Option<FeeCategory>,
    pub is_recurring: Option<bool>,
    pub status: Option<FeeStatus>,
}

impl FeePatch {
    pub fn status(status: FeeStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeeFilter {
    pub client_id: Option<ClientId>,
    pub status: Option<FeeStatus>,
    /// Case-insensitive substring of the description, note or category
    pub search: Option<String>,
}

impl FeeFilter {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, fee: &Fee) -> bool {
        self.client_id.map_or(true, |id| fee.client_id == id)
            && self.status.map_or(true, |s| fee.status == s)
            && self.search.as_deref().map_or(true, |term| {
                contains_folded(&fee.description, term)
                    || contains_folded(&fee.note, term)
                    || contains_folded(fee.category.as_str(), term)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_fold_case_and_keep_unknowns() {
        assert_eq!(FeeCategory::from("training"), FeeCategory::Training);
        assert_eq!(FeeCategory::from(" Design "), FeeCategory::Design);
        assert_eq!(
            FeeCategory::from("Retainer"),
            FeeCategory::Other("Retainer".to_string())
        );
        assert_eq!(String::from(FeeCategory::License), "License");
    }

    #[test]
    fn status_parses_lowercase_names() {
        assert_eq!("Overdue".parse::<FeeStatus>().unwrap(), FeeStatus::Overdue);
        assert!("settled".parse::<FeeStatus>().is_err());
        assert!(FeeStatus::Overdue.is_outstanding());
        assert!(!FeeStatus::Paid.is_outstanding());
    }

    #[test]
    fn new_fee_starts_pending() {
        let fee = NewFee {
            client_id: 3,
            description: "Kickoff".to_string(),
            note: String::new(),
            amount: Decimal::from(10),
            due_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            category: FeeCategory::Setup,
            is_recurring: false,
        }
        .into_fee(9);
        assert_eq!(fee.id, 9);
        assert_eq!(fee.status, FeeStatus::Pending);
    }

    #[test]
    fn search_matches_description_and_category() {
        let fee = NewFee {
            client_id: 1,
            description: "Quarterly Audit".to_string(),
            note: String::new(),
            amount: Decimal::from(10),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            category: FeeCategory::Training,
            is_recurring: false,
        }
        .into_fee(1);
        let search = |term: &str| FeeFilter {
            search: Some(term.to_string()),
            ..FeeFilter::default()
        };

        assert!(search("audit").matches(&fee));
        assert!(search("TRAIN").matches(&fee));
        assert!(!search("license").matches(&fee));
        assert!(!FeeFilter {
            client_id: Some(2),
            ..search("audit")
        }
        .matches(&fee));
    }
}
