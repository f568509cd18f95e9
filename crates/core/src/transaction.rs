use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Income,
    Expense,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Income => write!(f, "Income"),
            TransactionType::Expense => write!(f, "Expense"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown transaction type: '{0}'")]
pub struct ParseTypeError(pub String);

impl FromStr for TransactionType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(ParseTypeError(s.to_string())),
        }
    }
}

/// One canonical financial event.
///
/// `amount` is always the unsigned magnitude; direction lives in
/// `transaction_type`. `None` on the classification fields means
/// "not yet categorized", which is distinct from an empty label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: Money,
    #[serde(rename = "Type")]
    pub transaction_type: TransactionType,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Subcategory")]
    pub subcategory: Option<String>,
    #[serde(rename = "Vendor")]
    pub vendor: Option<String>,
    #[serde(rename = "Payment Method")]
    pub payment_method: Option<String>,
    #[serde(rename = "Notes")]
    pub notes: Option<String>,
}

impl Transaction {
    /// Manual single-record constructor. A negative `amount` is stored as
    /// its magnitude.
    pub fn new(
        date: NaiveDate,
        description: &str,
        amount: Money,
        transaction_type: TransactionType,
    ) -> Self {
        Transaction {
            date,
            description: description.to_string(),
            amount: amount.abs(),
            transaction_type,
            category: None,
            subcategory: None,
            vendor: None,
            payment_method: None,
            notes: None,
        }
    }

    pub fn with_category(mut self, category: &str, subcategory: Option<&str>) -> Self {
        self.category = Some(category.to_string());
        self.subcategory = subcategory.map(str::to_string);
        self
    }

    pub fn with_vendor(mut self, vendor: &str) -> Self {
        self.vendor = Some(vendor.to_string());
        self
    }

    pub fn with_payment_method(mut self, payment_method: &str) -> Self {
        self.payment_method = Some(payment_method.to_string());
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn is_categorized(&self) -> bool {
        self.category.is_some()
    }
}

/// A transaction as handed over by the ingestion layer, before any
/// parsing. Only `date` and `description` are mandatory; the amount may
/// arrive as a single signed `amount` or as a bank-statement
/// `debit`/`credit` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: String,
    pub description: String,
    pub amount: Option<String>,
    pub transaction_type: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub vendor: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl RawTransaction {
    pub fn new(date: &str, description: &str, amount: &str) -> Self {
        RawTransaction {
            date: date.to_string(),
            description: description.to_string(),
            amount: Some(amount.to_string()),
            ..Default::default()
        }
    }

    pub fn bank_statement(date: &str, description: &str, debit: &str, credit: &str) -> Self {
        RawTransaction {
            date: date.to_string(),
            description: description.to_string(),
            debit: Some(debit.to_string()),
            credit: Some(credit.to_string()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, transaction_type: &str) -> Self {
        self.transaction_type = Some(transaction_type.to_string());
        self
    }
}

impl From<&Transaction> for RawTransaction {
    fn from(tx: &Transaction) -> Self {
        RawTransaction {
            date: tx.date.format("%Y-%m-%d").to_string(),
            description: tx.description.clone(),
            amount: Some(tx.amount.amount().to_string()),
            transaction_type: Some(tx.transaction_type.to_string()),
            debit: None,
            credit: None,
            category: tx.category.clone(),
            subcategory: tx.subcategory.clone(),
            vendor: tx.vendor.clone(),
            payment_method: tx.payment_method.clone(),
            notes: tx.notes.clone(),
        }
    }
}
