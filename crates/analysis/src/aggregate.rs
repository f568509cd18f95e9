//! Summary tables over canonical transactions.
//!
//! Every function validates amounts as it goes: a negative magnitude or a
//! total that overflows is reported as [`AggregateError::InvalidAmount`]
//! instead of being folded into the result.

use cashflow_core::{schema, DateRange, Money, Transaction, TransactionType, YearMonth};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Transaction {index} has invalid amount {amount}: {reason}")]
    InvalidAmount {
        index: usize,
        amount: Money,
        reason: &'static str,
    },
    #[error("Unknown grouping key: '{0}'")]
    UnknownGroupingKey(String),
}

/// The dimension a summary table is grouped by (always paired with type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupingKey {
    Type,
    Category,
    Subcategory,
    Vendor,
    PaymentMethod,
    Month,
}

impl GroupingKey {
    /// Column name the key is exported under.
    pub fn column(self) -> &'static str {
        match self {
            GroupingKey::Type => schema::TYPE,
            GroupingKey::Category => schema::CATEGORY,
            GroupingKey::Subcategory => schema::SUBCATEGORY,
            GroupingKey::Vendor => schema::VENDOR,
            GroupingKey::PaymentMethod => schema::PAYMENT_METHOD,
            GroupingKey::Month => schema::MONTH,
        }
    }

    fn label(self, tx: &Transaction) -> String {
        match self {
            GroupingKey::Type => tx.transaction_type.to_string(),
            GroupingKey::Category => tx
                .category
                .clone()
                .unwrap_or_else(|| schema::UNCATEGORIZED.to_string()),
            GroupingKey::Subcategory => format!(
                "{} / {}",
                tx.category.as_deref().unwrap_or(schema::UNCATEGORIZED),
                tx.subcategory.as_deref().unwrap_or(schema::UNSPECIFIED)
            ),
            GroupingKey::Vendor => tx
                .vendor
                .clone()
                .unwrap_or_else(|| schema::UNKNOWN.to_string()),
            GroupingKey::PaymentMethod => tx
                .payment_method
                .clone()
                .unwrap_or_else(|| schema::UNKNOWN.to_string()),
            GroupingKey::Month => YearMonth::from_date(tx.date).to_string(),
        }
    }
}

impl fmt::Display for GroupingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupingKey::Type => "type",
            GroupingKey::Category => "category",
            GroupingKey::Subcategory => "subcategory",
            GroupingKey::Vendor => "vendor",
            GroupingKey::PaymentMethod => "payment-method",
            GroupingKey::Month => "month",
        };
        write!(f, "{name}")
    }
}

impl FromStr for GroupingKey {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "type" => Ok(GroupingKey::Type),
            "category" => Ok(GroupingKey::Category),
            "subcategory" => Ok(GroupingKey::Subcategory),
            "vendor" | "producer" => Ok(GroupingKey::Vendor),
            "payment-method" => Ok(GroupingKey::PaymentMethod),
            "month" => Ok(GroupingKey::Month),
            _ => Err(AggregateError::UnknownGroupingKey(s.to_string())),
        }
    }
}

/// One aggregated `(key, type) → amount` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub grouping: GroupingKey,
    pub key: String,
    pub transaction_type: TransactionType,
    pub amount: Money,
}

/// Serialized as `{<key column>: key, "Type": .., "Amount": ..}` so the
/// export layer can bind e.g. `Category/Type/Amount` or `Month/Type/Amount`.
impl Serialize for SummaryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(self.grouping.column(), &self.key)?;
        map.serialize_entry(schema::TYPE, &self.transaction_type)?;
        map.serialize_entry(schema::AMOUNT, &self.amount)?;
        map.end()
    }
}

/// A summary table. Rows are sorted by key, then type; for
/// [`GroupingKey::Month`] that order is chronological.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub grouping: GroupingKey,
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Amount for `key` and `transaction_type`, zero when absent.
    pub fn amount(&self, key: &str, transaction_type: TransactionType) -> Money {
        self.rows
            .iter()
            .find(|r| r.key == key && r.transaction_type == transaction_type)
            .map(|r| r.amount)
            .unwrap_or_else(Money::zero)
    }

    /// `key → amount` for one transaction type.
    pub fn amounts_for(&self, transaction_type: TransactionType) -> BTreeMap<String, Money> {
        self.rows
            .iter()
            .filter(|r| r.transaction_type == transaction_type)
            .map(|r| (r.key.clone(), r.amount))
            .collect()
    }

    /// Distinct keys in row order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for row in &self.rows {
            if keys.last() != Some(&row.key.as_str()) {
                keys.push(row.key.as_str());
            }
        }
        keys
    }
}

/// Income/expense totals. Missing types read as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeTotals(BTreeMap<TransactionType, Money>);

impl TypeTotals {
    pub fn get(&self, transaction_type: TransactionType) -> Money {
        self.0.get(&transaction_type).copied().unwrap_or_else(Money::zero)
    }

    pub fn income(&self) -> Money {
        self.get(TransactionType::Income)
    }

    pub fn expense(&self) -> Money {
        self.get(TransactionType::Expense)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TransactionType, &Money)> {
        self.0.iter()
    }
}

fn validated_amount(index: usize, tx: &Transaction) -> Result<Money, AggregateError> {
    if tx.amount.is_negative() {
        return Err(AggregateError::InvalidAmount {
            index,
            amount: tx.amount,
            reason: "amounts must be non-negative magnitudes",
        });
    }
    Ok(tx.amount)
}

fn accumulate(slot: &mut Money, index: usize, amount: Money) -> Result<(), AggregateError> {
    *slot = slot
        .checked_add(amount)
        .ok_or(AggregateError::InvalidAmount {
            index,
            amount,
            reason: "total overflowed",
        })?;
    Ok(())
}

pub fn aggregate_by_type(transactions: &[Transaction]) -> Result<TypeTotals, AggregateError> {
    let mut totals = BTreeMap::new();
    for (index, tx) in transactions.iter().enumerate() {
        let amount = validated_amount(index, tx)?;
        let slot = totals.entry(tx.transaction_type).or_insert_with(Money::zero);
        accumulate(slot, index, amount)?;
    }
    Ok(TypeTotals(totals))
}

pub fn aggregate(
    transactions: &[Transaction],
    grouping: GroupingKey,
) -> Result<Summary, AggregateError> {
    let mut groups: BTreeMap<(String, TransactionType), Money> = BTreeMap::new();
    for (index, tx) in transactions.iter().enumerate() {
        let amount = validated_amount(index, tx)?;
        let slot = groups
            .entry((grouping.label(tx), tx.transaction_type))
            .or_insert_with(Money::zero);
        accumulate(slot, index, amount)?;
    }

    let rows = groups
        .into_iter()
        .map(|((key, transaction_type), amount)| SummaryRow {
            grouping,
            key,
            transaction_type,
            amount,
        })
        .collect();

    Ok(Summary { grouping, rows })
}

/// Unset categories group under `Uncategorized`.
pub fn aggregate_by_category(transactions: &[Transaction]) -> Result<Summary, AggregateError> {
    aggregate(transactions, GroupingKey::Category)
}

/// Unset subcategories group under `<Category> / Unspecified`.
pub fn aggregate_by_subcategory(transactions: &[Transaction]) -> Result<Summary, AggregateError> {
    aggregate(transactions, GroupingKey::Subcategory)
}

/// Unset vendors group under `Unknown`.
pub fn aggregate_by_vendor(transactions: &[Transaction]) -> Result<Summary, AggregateError> {
    aggregate(transactions, GroupingKey::Vendor)
}

pub fn aggregate_by_payment_method(
    transactions: &[Transaction],
) -> Result<Summary, AggregateError> {
    aggregate(transactions, GroupingKey::PaymentMethod)
}

/// Keys are `YYYY-MM`; rows come out in chronological order.
pub fn aggregate_by_month(transactions: &[Transaction]) -> Result<Summary, AggregateError> {
    aggregate(transactions, GroupingKey::Month)
}

pub fn filter_range(transactions: &[Transaction], range: DateRange) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| range.contains(tx.date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(y: i32, m: u32, d: u32, cents: i64) -> Transaction {
        Transaction::new(
            date(y, m, d),
            "expense",
            Money::from_cents(cents),
            TransactionType::Expense,
        )
    }

    fn income(y: i32, m: u32, d: u32, cents: i64) -> Transaction {
        Transaction::new(date(y, m, d), "income", Money::from_cents(cents), TransactionType::Income)
    }

    // ── by type ───────────────────────────────────────────────────────────────

    #[test]
    fn by_type_partitions_every_transaction() {
        let txs = vec![
            income(2025, 4, 1, 350_000),
            expense(2025, 4, 2, 120_000),
            expense(2025, 4, 5, 8_950),
            income(2025, 4, 30, 75_000),
        ];
        let totals = aggregate_by_type(&txs).unwrap();
        assert_eq!(totals.income(), Money::from_cents(425_000));
        assert_eq!(totals.expense(), Money::from_cents(128_950));
        let all: Money = txs.iter().map(|t| t.amount).sum();
        assert_eq!(totals.income() + totals.expense(), all);
    }

    #[test]
    fn by_type_missing_type_reads_zero() {
        let totals = aggregate_by_type(&[expense(2025, 4, 2, 500)]).unwrap();
        assert!(totals.income().is_zero());
        assert_eq!(totals.iter().count(), 1);
    }

    #[test]
    fn by_type_serializes_as_map() {
        let totals = aggregate_by_type(&[income(2025, 4, 1, 100)]).unwrap();
        let json = serde_json::to_value(&totals).unwrap();
        assert_eq!(json["Income"], "1.00");
        assert!(json.get("Expense").is_none());
    }

    // ── by category / vendor ──────────────────────────────────────────────────

    #[test]
    fn by_category_splits_on_type_and_buckets_unset() {
        let txs = vec![
            expense(2025, 4, 1, 1_000).with_category("Food", None),
            expense(2025, 4, 2, 2_000).with_category("Food", None),
            income(2025, 4, 3, 500).with_category("Food", None),
            expense(2025, 4, 4, 700),
        ];
        let summary = aggregate_by_category(&txs).unwrap();
        assert_eq!(summary.rows.len(), 3);
        assert_eq!(summary.amount("Food", TransactionType::Expense), Money::from_cents(3_000));
        assert_eq!(summary.amount("Food", TransactionType::Income), Money::from_cents(500));
        assert_eq!(
            summary.amount("Uncategorized", TransactionType::Expense),
            Money::from_cents(700)
        );
        assert!(summary.amount("Travel", TransactionType::Expense).is_zero());
    }

    #[test]
    fn by_vendor_buckets_unknown() {
        let txs = vec![
            expense(2025, 4, 1, 1_000).with_vendor("Amazon"),
            expense(2025, 4, 2, 250),
            expense(2025, 4, 3, 250),
        ];
        let summary = aggregate_by_vendor(&txs).unwrap();
        assert_eq!(summary.keys(), vec!["Amazon", "Unknown"]);
        assert_eq!(summary.amount("Unknown", TransactionType::Expense), Money::from_cents(500));
    }

    #[test]
    fn by_subcategory_and_payment_method() {
        let txs = vec![
            expense(2025, 4, 1, 1_000)
                .with_category("Food", Some("Groceries"))
                .with_payment_method("Card"),
            expense(2025, 4, 2, 400).with_category("Food", None),
            expense(2025, 4, 3, 100),
        ];
        let subs = aggregate_by_subcategory(&txs).unwrap();
        assert_eq!(
            subs.keys(),
            vec!["Food / Groceries", "Food / Unspecified", "Uncategorized / Unspecified"]
        );
        let methods = aggregate_by_payment_method(&txs).unwrap();
        assert_eq!(methods.amount("Card", TransactionType::Expense), Money::from_cents(1_000));
        assert_eq!(methods.amount("Unknown", TransactionType::Expense), Money::from_cents(500));
    }

    #[test]
    fn summary_row_serializes_with_key_column() {
        let summary =
            aggregate_by_category(&[expense(2025, 4, 1, 1_000).with_category("Food", None)])
                .unwrap();
        let json = serde_json::to_value(&summary.rows[0]).unwrap();
        assert_eq!(json["Category"], "Food");
        assert_eq!(json["Type"], "Expense");
        assert_eq!(json["Amount"], "10.00");
    }

    // ── by month ──────────────────────────────────────────────────────────────

    #[test]
    fn by_month_orders_chronologically() {
        let txs = vec![expense(2025, 5, 3, 20_000), expense(2025, 4, 1, 10_000)];
        let summary = aggregate_by_month(&txs).unwrap();
        let months: Vec<&str> = summary.rows.iter().map(|r| r.key.as_str()).collect();
        let amounts: Vec<Money> = summary.rows.iter().map(|r| r.amount).collect();
        assert_eq!(months, vec!["2025-04", "2025-05"]);
        assert_eq!(amounts, vec![Money::from_cents(10_000), Money::from_cents(20_000)]);
    }

    #[test]
    fn by_month_crosses_year_boundary() {
        let txs = vec![
            income(2025, 1, 15, 100),
            expense(2024, 12, 31, 100),
            expense(2024, 2, 1, 100),
        ];
        let summary = aggregate_by_month(&txs).unwrap();
        assert_eq!(summary.keys(), vec!["2024-02", "2024-12", "2025-01"]);
        let json = serde_json::to_value(&summary.rows[0]).unwrap();
        assert_eq!(json["Month"], "2024-02");
    }

    // ── invalid data and boundaries ───────────────────────────────────────────

    #[test]
    fn negative_magnitude_fails_fast() {
        let mut bad = expense(2025, 4, 1, 100);
        bad.amount = Money::from_cents(-100);
        let txs = vec![expense(2025, 4, 1, 100), bad];
        let err = aggregate_by_category(&txs).unwrap_err();
        assert!(matches!(err, AggregateError::InvalidAmount { index: 1, .. }));
        assert!(aggregate_by_type(&txs).is_err());
        assert!(aggregate_by_month(&txs).is_err());
    }

    #[test]
    fn empty_input_gives_empty_summaries() {
        assert!(aggregate_by_type(&[]).unwrap().is_empty());
        for key in [
            GroupingKey::Type,
            GroupingKey::Category,
            GroupingKey::Subcategory,
            GroupingKey::Vendor,
            GroupingKey::PaymentMethod,
            GroupingKey::Month,
        ] {
            assert!(aggregate(&[], key).unwrap().is_empty());
        }
    }

    #[test]
    fn grouping_key_parse() {
        assert_eq!("month".parse::<GroupingKey>().unwrap(), GroupingKey::Month);
        assert_eq!("Payment_Method".parse::<GroupingKey>().unwrap(), GroupingKey::PaymentMethod);
        assert_eq!(
            GroupingKey::PaymentMethod.to_string().parse::<GroupingKey>().unwrap(),
            GroupingKey::PaymentMethod
        );
        assert!(matches!(
            "weekday".parse::<GroupingKey>(),
            Err(AggregateError::UnknownGroupingKey(k)) if k == "weekday"
        ));
    }

    #[test]
    fn filter_range_is_inclusive() {
        let txs = vec![
            expense(2025, 3, 31, 1),
            expense(2025, 4, 1, 2),
            expense(2025, 4, 30, 3),
            expense(2025, 5, 1, 4),
        ];
        let april = filter_range(&txs, YearMonth::new(2025, 4).unwrap().range());
        assert_eq!(april.len(), 2);
        assert_eq!(april[0].amount, Money::from_cents(2));
    }
}
