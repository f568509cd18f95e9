use cashflow_core::{Money, Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::aggregate::Summary;

/// Income minus expense. `expense` is a non-negative magnitude; a signed
/// expense is used as given, never flipped. Clamps instead of overflowing.
pub fn net_cashflow(income: Money, expense: Money) -> Money {
    income.saturating_sub(expense)
}

/// Percentage of income not consumed by regular expenses.
///
/// Returns `0.0` when `income` is zero or negative.
pub fn savings_rate(income: Money, regular_expense: Money) -> f64 {
    if income.is_zero() || income.is_negative() {
        return 0.0;
    }
    income.saturating_sub(regular_expense).percent_of(income)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Spending,
    Saving,
    Investing,
}

/// Category → allocation bucket. Categories not listed are Spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationBuckets {
    buckets: BTreeMap<String, Bucket>,
}

impl Default for AllocationBuckets {
    fn default() -> Self {
        AllocationBuckets::new()
            .with("Savings", Bucket::Saving)
            .with("Investments", Bucket::Investing)
    }
}

impl AllocationBuckets {
    /// No routing at all: every category is Spending.
    pub fn new() -> Self {
        AllocationBuckets {
            buckets: BTreeMap::new(),
        }
    }

    pub fn with(mut self, category: &str, bucket: Bucket) -> Self {
        self.buckets.insert(category.to_string(), bucket);
        self
    }

    pub fn from_lists(saving: &[String], investing: &[String]) -> Self {
        let mut buckets = AllocationBuckets::new();
        for category in saving {
            buckets = buckets.with(category, Bucket::Saving);
        }
        for category in investing {
            buckets = buckets.with(category, Bucket::Investing);
        }
        buckets
    }

    pub fn bucket_for(&self, category: Option<&str>) -> Bucket {
        category
            .and_then(|c| self.buckets.get(c))
            .copied()
            .unwrap_or(Bucket::Spending)
    }
}

/// Expense magnitudes per bucket. Sums clamp at the largest representable
/// amount rather than overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketTotals {
    pub spending: Money,
    pub saving: Money,
    pub investing: Money,
}

impl BucketTotals {
    pub fn from_transactions(transactions: &[Transaction], buckets: &AllocationBuckets) -> Self {
        let mut totals = BucketTotals::default();
        for tx in transactions.iter().filter(|t| t.is_expense()) {
            let slot = match buckets.bucket_for(tx.category.as_deref()) {
                Bucket::Spending => &mut totals.spending,
                Bucket::Saving => &mut totals.saving,
                Bucket::Investing => &mut totals.investing,
            };
            *slot = slot.saturating_add(tx.amount);
        }
        totals
    }

    pub fn total(&self) -> Money {
        self.spending
            .saturating_add(self.saving)
            .saturating_add(self.investing)
    }
}

/// Percentage of total expense per bucket. All zero when there is no expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashAllocation {
    pub spending: f64,
    pub saving: f64,
    pub investing: f64,
}

impl From<BucketTotals> for CashAllocation {
    fn from(totals: BucketTotals) -> Self {
        let total = totals.total();
        CashAllocation {
            spending: totals.spending.percent_of(total),
            saving: totals.saving.percent_of(total),
            investing: totals.investing.percent_of(total),
        }
    }
}

pub fn cash_allocation(
    transactions: &[Transaction],
    buckets: &AllocationBuckets,
) -> CashAllocation {
    BucketTotals::from_transactions(transactions, buckets).into()
}

/// Actual spending against budget for one category.
///
/// `budget`, `percent_used` and `difference` are `None` when the category
/// has no budget (or a zero budget).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetComparisonRow {
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Actual")]
    pub actual: Money,
    #[serde(rename = "Budget")]
    pub budget: Option<Money>,
    #[serde(rename = "Percent Used")]
    pub percent_used: Option<f64>,
    #[serde(rename = "Difference")]
    pub difference: Option<Money>,
}

impl BudgetComparisonRow {
    pub fn is_over_budget(&self) -> bool {
        self.difference.is_some_and(Money::is_negative)
    }
}

/// One row per category in either map, sorted by category name.
pub fn budget_comparison(
    actual_by_category: &BTreeMap<String, Money>,
    budget_by_category: &BTreeMap<String, Money>,
) -> Vec<BudgetComparisonRow> {
    let mut categories: Vec<&String> = actual_by_category
        .keys()
        .chain(budget_by_category.keys())
        .collect();
    categories.sort();
    categories.dedup();

    categories
        .into_iter()
        .map(|category| {
            let actual = actual_by_category
                .get(category)
                .copied()
                .unwrap_or_else(Money::zero);
            let budget = budget_by_category
                .get(category)
                .copied()
                .filter(|b| !b.is_zero());
            BudgetComparisonRow {
                category: category.clone(),
                actual,
                budget,
                percent_used: budget.map(|b| actual.percent_of(b)),
                difference: budget.map(|b| b.saturating_sub(actual)),
            }
        })
        .collect()
}

/// Percentage change per type between the first and last month of a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GrowthRates {
    pub income: f64,
    pub expense: f64,
}

/// Growth across the most recent `months` months of a monthly summary.
///
/// A type reads `0.0` when the window has fewer than two months or its
/// first month total is zero.
pub fn monthly_growth_rate(monthly: &Summary, months: usize) -> GrowthRates {
    let keys = monthly.keys();
    let window = &keys[keys.len().saturating_sub(months)..];
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return GrowthRates::default();
    };
    if window.len() < 2 {
        return GrowthRates::default();
    }

    let growth = |transaction_type| {
        let start = monthly.amount(first, transaction_type);
        if start.is_zero() || start.is_negative() {
            return 0.0;
        }
        monthly.amount(last, transaction_type).percent_of(start) - 100.0
    };

    GrowthRates {
        income: growth(TransactionType::Income),
        expense: growth(TransactionType::Expense),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_by_month;
    use chrono::NaiveDate;

    fn expense(category: &str, cents: i64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            category,
            Money::from_cents(cents),
            TransactionType::Expense,
        )
        .with_category(category, None)
    }

    fn money(s: &str) -> Money {
        Money::from_decimal(s.parse().unwrap())
    }

    fn monthly(y: i32, m: u32, cents: i64, transaction_type: TransactionType) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(y, m, 10).unwrap(),
            "monthly",
            Money::from_cents(cents),
            transaction_type,
        )
    }

    // ── net cashflow / savings rate ───────────────────────────────────────────

    #[test]
    fn net_cashflow_subtracts_magnitude() {
        assert_eq!(
            net_cashflow(Money::from_cents(350_000), Money::from_cents(120_000)),
            Money::from_cents(230_000)
        );
        assert_eq!(
            net_cashflow(Money::from_cents(100), Money::from_cents(300)),
            Money::from_cents(-200)
        );
    }

    #[test]
    fn savings_rate_matches_reference() {
        let rate = savings_rate(Money::from_cents(350_000), Money::from_cents(120_000));
        assert!((rate - 65.714).abs() < 65.714 * 1e-3, "rate was {rate}");
    }

    #[test]
    fn savings_rate_zero_income_is_zero() {
        assert_eq!(savings_rate(Money::zero(), Money::zero()), 0.0);
        assert_eq!(savings_rate(Money::zero(), Money::from_cents(500)), 0.0);
        assert_eq!(savings_rate(Money::from_cents(-100), Money::zero()), 0.0);
    }

    #[test]
    fn savings_rate_with_tiny_income_does_not_panic() {
        let rate = savings_rate(Money::from_cents(1), money("1000000000000000000000000000"));
        assert!(rate.is_finite());
        assert!(rate < 0.0);
    }

    #[test]
    fn savings_rate_can_go_negative() {
        let rate = savings_rate(Money::from_cents(1_000), Money::from_cents(1_500));
        assert_eq!(rate, -50.0);
    }

    // ── cash allocation ───────────────────────────────────────────────────────

    #[test]
    fn allocation_splits_by_bucket() {
        let txs = vec![
            expense("Food", 10_000),
            expense("Savings", 5_000),
            expense("Investments", 5_000),
        ];
        let allocation = cash_allocation(&txs, &AllocationBuckets::default());
        assert_eq!(
            allocation,
            CashAllocation {
                spending: 50.0,
                saving: 25.0,
                investing: 25.0
            }
        );
    }

    #[test]
    fn allocation_ignores_income_and_routes_uncategorized_to_spending() {
        let mut txs = vec![expense("Savings", 3_000)];
        txs.push(Transaction::new(
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            "unlabelled",
            Money::from_cents(1_000),
            TransactionType::Expense,
        ));
        txs.push(monthly(2025, 4, 99_999, TransactionType::Income).with_category("Savings", None));
        let allocation = cash_allocation(&txs, &AllocationBuckets::default());
        assert_eq!(allocation.saving, 75.0);
        assert_eq!(allocation.spending, 25.0);
        assert_eq!(allocation.spending + allocation.saving + allocation.investing, 100.0);
    }

    #[test]
    fn allocation_with_no_expense_is_zero() {
        assert_eq!(cash_allocation(&[], &AllocationBuckets::default()), CashAllocation::default());
    }

    #[test]
    fn custom_buckets() {
        let buckets =
            AllocationBuckets::from_lists(&["Emergency".to_string()], &["Crypto".to_string()]);
        assert_eq!(buckets.bucket_for(Some("Emergency")), Bucket::Saving);
        assert_eq!(buckets.bucket_for(Some("Crypto")), Bucket::Investing);
        assert_eq!(buckets.bucket_for(Some("Savings")), Bucket::Spending);
        assert_eq!(buckets.bucket_for(None), Bucket::Spending);
    }

    #[test]
    fn allocation_with_extreme_amounts_does_not_panic() {
        let huge = money("50000000000000000000000000000");
        let mut txs = vec![expense("Food", 1), expense("Savings", 1)];
        for category in ["Food", "Food", "Investments"] {
            let mut tx = expense(category, 0);
            tx.amount = huge;
            txs.push(tx);
        }
        let allocation = cash_allocation(&txs, &AllocationBuckets::default());
        for share in [allocation.spending, allocation.saving, allocation.investing] {
            assert!(share.is_finite());
        }
        assert!(allocation.spending > allocation.investing);
    }

    // ── budget comparison ─────────────────────────────────────────────────────

    #[test]
    fn budget_comparison_covers_union() {
        let actual = BTreeMap::from([
            ("Food".to_string(), Money::from_cents(30_000)),
            ("Gifts".to_string(), Money::from_cents(2_500)),
        ]);
        let budget = BTreeMap::from([
            ("Food".to_string(), Money::from_cents(40_000)),
            ("Housing".to_string(), Money::from_cents(100_000)),
        ]);
        let rows = budget_comparison(&actual, &budget);
        let names: Vec<&str> = rows.iter().map(|r| r.category.as_str()).collect();
        assert_eq!(names, vec!["Food", "Gifts", "Housing"]);

        assert_eq!(rows[0].percent_used, Some(75.0));
        assert_eq!(rows[0].difference, Some(Money::from_cents(10_000)));
        assert!(!rows[0].is_over_budget());

        assert_eq!(rows[1].budget, None);
        assert_eq!(rows[1].percent_used, None);

        assert!(rows[2].actual.is_zero());
        assert_eq!(rows[2].percent_used, Some(0.0));
    }

    #[test]
    fn zero_budget_has_no_percentage() {
        let actual = BTreeMap::from([("Income".to_string(), Money::from_cents(100))]);
        let budget = BTreeMap::from([("Income".to_string(), Money::zero())]);
        let rows = budget_comparison(&actual, &budget);
        assert_eq!(rows[0].budget, None);
        assert_eq!(rows[0].percent_used, None);
    }

    #[test]
    fn extreme_overspend_reports_a_percentage() {
        let actual = BTreeMap::from([("Food".to_string(), money("1000000000000000000000000000"))]);
        let budget = BTreeMap::from([("Food".to_string(), Money::from_cents(1))]);
        let rows = budget_comparison(&actual, &budget);
        let used = rows[0].percent_used.unwrap();
        assert!(used.is_finite() && used > 1e30);
        assert!(rows[0].is_over_budget());
    }

    #[test]
    fn over_budget_row() {
        let actual = BTreeMap::from([("Food".to_string(), Money::from_cents(50_000))]);
        let budget = BTreeMap::from([("Food".to_string(), Money::from_cents(40_000))]);
        let rows = budget_comparison(&actual, &budget);
        assert!(rows[0].is_over_budget());
        assert_eq!(rows[0].percent_used, Some(125.0));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["Difference"], "-100.00");
    }

    // ── growth ────────────────────────────────────────────────────────────────

    #[test]
    fn growth_over_recent_window() {
        let txs = vec![
            monthly(2025, 1, 100_000, TransactionType::Income),
            monthly(2025, 2, 200_000, TransactionType::Income),
            monthly(2025, 2, 50_000, TransactionType::Expense),
            monthly(2025, 3, 300_000, TransactionType::Income),
            monthly(2025, 4, 300_000, TransactionType::Income),
            monthly(2025, 4, 75_000, TransactionType::Expense),
        ];
        let summary = aggregate_by_month(&txs).unwrap();
        let growth = monthly_growth_rate(&summary, 3);
        assert_eq!(growth.income, 50.0);
        assert_eq!(growth.expense, 50.0);

        let all = monthly_growth_rate(&summary, 12);
        assert_eq!(all.income, 200.0);
        assert_eq!(all.expense, 0.0);
    }

    #[test]
    fn growth_needs_two_months() {
        let summary =
            aggregate_by_month(&[monthly(2025, 1, 100, TransactionType::Income)]).unwrap();
        assert_eq!(monthly_growth_rate(&summary, 3), GrowthRates::default());
        let empty = aggregate_by_month(&[]).unwrap();
        assert_eq!(monthly_growth_rate(&empty, 3), GrowthRates::default());
        assert_eq!(monthly_growth_rate(&empty, 0), GrowthRates::default());
    }
}
