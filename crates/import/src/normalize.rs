use cashflow_core::{Money, RawTransaction, Transaction, TransactionType};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// What to do with a record that cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Fail the whole batch on the first bad record.
    #[default]
    Strict,
    /// Skip bad records, logging and reporting each one.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Record {index}: malformed date '{value}'")]
    MalformedDate { index: usize, value: String },
    #[error("Record {index}: malformed amount '{value}' ({reason})")]
    MalformedAmount {
        index: usize,
        value: String,
        reason: &'static str,
    },
    #[error("Record {index}: unknown transaction type '{value}'")]
    UnknownType { index: usize, value: String },
}

impl NormalizeError {
    pub fn index(&self) -> usize {
        match self {
            NormalizeError::MalformedDate { index, .. }
            | NormalizeError::MalformedAmount { index, .. }
            | NormalizeError::UnknownType { index, .. } => *index,
        }
    }
}

/// Output of a normalization run. `rejected` is only ever non-empty in
/// lenient mode; `transactions` keeps input order.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<NormalizeError>,
}

pub fn normalize(
    records: &[RawTransaction],
    mode: NormalizeMode,
) -> Result<Normalized, NormalizeError> {
    let mut out = Normalized {
        transactions: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
    };

    for (index, raw) in records.iter().enumerate() {
        match normalize_record(index, raw) {
            Ok(tx) => out.transactions.push(tx),
            Err(e) if mode == NormalizeMode::Lenient => {
                tracing::warn!(index, description = %raw.description, "skipping record: {e}");
                out.rejected.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}

/// Normalizes a single record; `index` is only used for error reporting.
pub fn normalize_record(index: usize, raw: &RawTransaction) -> Result<Transaction, NormalizeError> {
    let date = parse_date(&raw.date).ok_or_else(|| NormalizeError::MalformedDate {
        index,
        value: raw.date.clone(),
    })?;

    let explicit_type = match clean(&raw.transaction_type) {
        Some(t) => Some(
            TransactionType::from_str(&t)
                .map_err(|_| NormalizeError::UnknownType { index, value: t.clone() })?,
        ),
        None => None,
    };

    let (transaction_type, amount) = resolve_amount(index, raw, explicit_type)?;

    Ok(Transaction {
        date,
        description: raw.description.trim().to_string(),
        amount: Money::from_decimal(amount),
        transaction_type,
        category: clean(&raw.category),
        subcategory: clean(&raw.subcategory),
        vendor: clean(&raw.vendor),
        payment_method: clean(&raw.payment_method),
        notes: clean(&raw.notes),
    })
}

fn resolve_amount(
    index: usize,
    raw: &RawTransaction,
    explicit_type: Option<TransactionType>,
) -> Result<(TransactionType, Decimal), NormalizeError> {
    let debit = populated_column(index, &raw.debit)?;
    let credit = populated_column(index, &raw.credit)?;

    let from_columns = match (debit, credit) {
        (Some(_), Some(_)) => {
            return Err(NormalizeError::MalformedAmount {
                index,
                value: format!(
                    "debit={} credit={}",
                    raw.debit.as_deref().unwrap_or_default(),
                    raw.credit.as_deref().unwrap_or_default()
                ),
                reason: "both debit and credit are populated",
            })
        }
        (Some(d), None) => Some((TransactionType::Expense, d)),
        (None, Some(c)) => Some((TransactionType::Income, c)),
        (None, None) => None,
    };

    if let Some((column_type, magnitude)) = from_columns {
        if explicit_type.is_some_and(|t| t != column_type) {
            return Err(NormalizeError::MalformedAmount {
                index,
                value: magnitude.to_string(),
                reason: "type conflicts with debit/credit column",
            });
        }
        return Ok((column_type, magnitude));
    }

    let value = clean(&raw.amount).ok_or(NormalizeError::MalformedAmount {
        index,
        value: String::new(),
        reason: "missing amount",
    })?;
    let amount = parse_amount(&value).ok_or_else(|| NormalizeError::MalformedAmount {
        index,
        value: value.clone(),
        reason: "not a number",
    })?;

    match explicit_type {
        None if amount.is_sign_negative() && !amount.is_zero() => {
            Ok((TransactionType::Expense, amount.abs()))
        }
        None => Ok((TransactionType::Income, amount)),
        Some(TransactionType::Expense) => Ok((TransactionType::Expense, amount.abs())),
        Some(TransactionType::Income) if amount.is_sign_negative() && !amount.is_zero() => {
            Err(NormalizeError::MalformedAmount {
                index,
                value,
                reason: "negative amount on an income record",
            })
        }
        Some(TransactionType::Income) => Ok((TransactionType::Income, amount.abs())),
    }
}

/// A debit/credit cell counts as populated when it is non-blank and non-zero.
fn populated_column(
    index: usize,
    field: &Option<String>,
) -> Result<Option<Decimal>, NormalizeError> {
    let Some(value) = clean(field) else {
        return Ok(None);
    };
    let amount = parse_amount(&value).ok_or_else(|| NormalizeError::MalformedAmount {
        index,
        value: value.clone(),
        reason: "not a number",
    })?;
    Ok((!amount.is_zero()).then(|| amount.abs()))
}

fn clean(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in &[
        "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

pub(crate) fn parse_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let s = s.replace([',', '$', ' '], "");
    let dec = Decimal::from_str(&s).ok()?;
    Some(if negative { -dec } else { dec })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain() {
        assert_eq!(parse_amount("123.45"), Decimal::from_str("123.45").ok());
    }

    #[test]
    fn parse_amount_currency_and_commas() {
        assert_eq!(parse_amount("$1,234.56"), Decimal::from_str("1234.56").ok());
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)"), Decimal::from_str("-75.25").ok());
    }

    #[test]
    fn parse_amount_invalid() {
        assert!(parse_amount("twelve").is_none());
        assert!(parse_amount("").is_none());
        assert!(parse_amount("NaN").is_none());
    }

    // ── parse_date ────────────────────────────────────────────────────────────

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2025-04-01"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date("04/15/2025"), Some(date(2025, 4, 15)));
        assert_eq!(parse_date("2025-04-01 00:00:00"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date("2025-04-01T13:45:00"), Some(date(2025, 4, 1)));
    }

    #[test]
    fn parse_date_rejects_garbage_and_impossible_dates() {
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2025-02-30").is_none());
    }

    // ── type and amount resolution ────────────────────────────────────────────

    #[test]
    fn negative_amount_infers_expense_magnitude() {
        let raw = RawTransaction::new("2025-04-05", "KROGER GROCERY", "-89.50");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.amount, Money::from_cents(8950));
    }

    #[test]
    fn positive_and_zero_amounts_infer_income() {
        let raw = RawTransaction::new("2025-04-01", "PAYCHECK", "3500");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Income);
        let raw = RawTransaction::new("2025-04-01", "ADJUSTMENT", "0.00");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Income);
        assert!(tx.amount.is_zero());
    }

    #[test]
    fn explicit_expense_keeps_type_and_stores_magnitude() {
        let raw = RawTransaction::new("2025-04-02", "RENT", "-1200").with_type("expense");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.amount, Money::from_cents(120_000));

        let raw = RawTransaction::new("2025-04-02", "RENT", "1200").with_type("Expense");
        assert_eq!(normalize_record(0, &raw).unwrap().amount, Money::from_cents(120_000));
    }

    #[test]
    fn negative_income_is_rejected() {
        let raw = RawTransaction::new("2025-04-02", "REFUND", "-20").with_type("Income");
        assert!(matches!(
            normalize_record(3, &raw),
            Err(NormalizeError::MalformedAmount { index: 3, .. })
        ));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let raw = RawTransaction::new("2025-04-02", "MOVE", "20").with_type("Transfer");
        assert!(matches!(normalize_record(0, &raw), Err(NormalizeError::UnknownType { .. })));
    }

    #[test]
    fn debit_column_is_expense() {
        let raw =
            RawTransaction::bank_statement("2025-04-02", "PAYMENT - APARTMENT RENT", "1200.00", "");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.amount, Money::from_cents(120_000));
    }

    #[test]
    fn credit_column_is_income() {
        let raw =
            RawTransaction::bank_statement("2025-04-01", "DEPOSIT - EMPLOYER INC", "", "3500.00");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Income);
        assert_eq!(tx.amount, Money::from_cents(350_000));
    }

    #[test]
    fn zero_column_counts_as_unpopulated() {
        let raw = RawTransaction::bank_statement("2025-04-01", "DEPOSIT", "0.00", "750.00");
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Income);
    }

    #[test]
    fn both_columns_populated_is_rejected() {
        let raw = RawTransaction::bank_statement("2025-04-01", "ODD", "10", "20");
        assert!(matches!(normalize_record(0, &raw), Err(NormalizeError::MalformedAmount { .. })));
    }

    #[test]
    fn empty_columns_fall_back_to_amount() {
        let mut raw = RawTransaction::bank_statement("2025-04-01", "FEE", "", "");
        raw.amount = Some("-3.00".to_string());
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.transaction_type, TransactionType::Expense);
        assert_eq!(tx.amount, Money::from_cents(300));

        let raw = RawTransaction::bank_statement("2025-04-01", "NOTHING", "", "");
        assert!(matches!(normalize_record(0, &raw), Err(NormalizeError::MalformedAmount { .. })));
    }

    #[test]
    fn explicit_type_conflicting_with_column_is_rejected() {
        let raw =
            RawTransaction::bank_statement("2025-04-01", "DEPOSIT", "", "50").with_type("Expense");
        assert!(normalize_record(0, &raw).is_err());
    }

    #[test]
    fn blank_optional_fields_stay_unset() {
        let mut raw = RawTransaction::new("2025-04-01", "  Coffee  ", "-4.50");
        raw.category = Some("   ".to_string());
        raw.notes = Some(String::new());
        raw.payment_method = Some(" Card ".to_string());
        let tx = normalize_record(0, &raw).unwrap();
        assert_eq!(tx.description, "Coffee");
        assert!(tx.category.is_none());
        assert!(tx.subcategory.is_none());
        assert!(tx.vendor.is_none());
        assert!(tx.notes.is_none());
        assert_eq!(tx.payment_method.as_deref(), Some("Card"));
    }

    // ── batch modes ───────────────────────────────────────────────────────────

    fn mixed_batch() -> Vec<RawTransaction> {
        vec![
            RawTransaction::new("2025-04-01", "PAYCHECK", "3500"),
            RawTransaction::new("not a date", "BROKEN", "10"),
            RawTransaction::new("2025-04-03", "BROKEN AMOUNT", "ten dollars"),
            RawTransaction::new("2025-04-04", "COFFEE", "-4.50"),
        ]
    }

    #[test]
    fn strict_mode_fails_on_first_bad_record() {
        let err = normalize(&mixed_batch(), NormalizeMode::Strict).unwrap_err();
        assert!(matches!(err, NormalizeError::MalformedDate { index: 1, .. }));
    }

    #[test]
    fn lenient_mode_skips_and_reports() {
        let out = normalize(&mixed_batch(), NormalizeMode::Lenient).unwrap();
        assert_eq!(out.transactions.len(), 2);
        assert_eq!(out.transactions[0].description, "PAYCHECK");
        assert_eq!(out.transactions[1].description, "COFFEE");
        let indices: Vec<usize> = out.rejected.iter().map(NormalizeError::index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(matches!(out.rejected[1], NormalizeError::MalformedAmount { .. }));
    }

    #[test]
    fn clean_batch_keeps_length_and_order() {
        let raws = vec![
            RawTransaction::new("2025-04-01", "A", "1"),
            RawTransaction::new("2025-03-01", "B", "-2"),
            RawTransaction::new("2025-05-01", "C", "3"),
        ];
        let out = normalize(&raws, NormalizeMode::Strict).unwrap();
        let descs: Vec<&str> = out.transactions.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descs, vec!["A", "B", "C"]);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn empty_input_is_empty_output() {
        let out = normalize(&[], NormalizeMode::Strict).unwrap();
        assert!(out.transactions.is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut raws = vec![
            RawTransaction::new("04/15/2025", "Grocery", "(89.50)"),
            RawTransaction::bank_statement("2025-04-01", "DEPOSIT", "", "3,500.00"),
            RawTransaction::new("2025-04-20", "Refund", "12.10").with_type("income"),
        ];
        raws[0].vendor = Some("Kroger".to_string());
        raws[0].payment_method = Some("Card".to_string());

        let first = normalize(&raws, NormalizeMode::Strict).unwrap().transactions;
        let again: Vec<RawTransaction> = first.iter().map(RawTransaction::from).collect();
        let second = normalize(&again, NormalizeMode::Strict).unwrap().transactions;
        assert_eq!(first, second);
    }

    #[test]
    fn input_is_not_mutated() {
        let raws = vec![RawTransaction::new(" 2025-04-01 ", " X ", "-1")];
        let before = raws.clone();
        normalize(&raws, NormalizeMode::Strict).unwrap();
        assert_eq!(raws, before);
    }
}
