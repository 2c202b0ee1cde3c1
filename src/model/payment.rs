use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{fold_label, FeeId, PaymentId};
use crate::error::LedgerError;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub fee_id: FeeId,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[serde(default)]
    pub method: PaymentMethod,
    #[serde(default)]
    pub reference: String,
}

impl Payment {
    pub fn apply(&mut self, patch: &PaymentPatch) {
        if let Some(fee_id) = patch.fee_id {
            self.fee_id = fee_id;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(payment_date) = patch.payment_date {
            self.payment_date = payment_date;
        }
        if let Some(method) = patch.method {
            self.method = method;
        }
        if let Some(reference) = &patch.reference {
            self.reference = reference.clone();
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Credit Card")]
    CreditCard,
    Check,
    Cash,
    PayPal,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::Check => "Check",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::Other => "Other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match fold_label(s).as_str() {
            "banktransfer" | "bank" | "transfer" => Ok(PaymentMethod::BankTransfer),
            "creditcard" | "card" => Ok(PaymentMethod::CreditCard),
            "check" | "cheque" => Ok(PaymentMethod::Check),
            "cash" => Ok(PaymentMethod::Cash),
            "paypal" => Ok(PaymentMethod::PayPal),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(LedgerError::InvalidValue {
                field: "payment method",
                value: s.to_string(),
            }),
        }
    }
}

/// Fields supplied when recording a payment
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub fee_id: FeeId,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub reference: String,
}

impl NewPayment {
    pub fn into_payment(self, id: PaymentId) -> Payment {
        Payment {
            id,
            fee_id: self.fee_id,
            amount: self.amount,
            payment_date: self.payment_date,
            method: self.method,
            reference: self.reference,
        }
    }
}

/// Partial update of a payment; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentPatch {
    pub fee_id: Option<FeeId>,
    pub amount: Option<Decimal>,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    pub fee_id: Option<FeeId>,
}

impl PaymentFilter {
    pub fn for_fee(fee_id: FeeId) -> Self {
        Self {
            fee_id: Some(fee_id),
        }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.fee_id.map_or(true, |id| payment.fee_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_accepts_display_and_cli_spellings() {
        assert_eq!(
            "Bank Transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(
            "credit-card".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::CreditCard
        );
        assert_eq!("paypal".parse::<PaymentMethod>().unwrap(), PaymentMethod::PayPal);
        assert!("barter".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn method_serializes_with_spaces() {
        let json = serde_json::to_string(&PaymentMethod::CreditCard).unwrap();
        assert_eq!(json, "\"Credit Card\"");
    }
}
