use cashflow_core::{budgets_by_category, CategoryDefinition, Money, Transaction, TransactionType};
use serde::Serialize;

use crate::aggregate::{
    aggregate_by_category, aggregate_by_month, aggregate_by_payment_method,
    aggregate_by_subcategory, aggregate_by_type, aggregate_by_vendor, AggregateError, Summary,
    TypeTotals,
};
use crate::metrics::{
    budget_comparison, net_cashflow, savings_rate, AllocationBuckets, BucketTotals,
    BudgetComparisonRow, CashAllocation, GrowthRates,
};

/// Months considered by the growth figures.
pub const GROWTH_WINDOW_MONTHS: usize = 3;

/// Every summary table and derived metric for one batch of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub transaction_count: usize,
    pub uncategorized_count: usize,
    pub totals: TypeTotals,
    pub net_cashflow: Money,
    /// Income against Spending-bucket expense only.
    pub savings_rate: f64,
    pub allocation: CashAllocation,
    pub by_category: Summary,
    pub by_subcategory: Summary,
    pub by_vendor: Summary,
    pub by_payment_method: Summary,
    pub by_month: Summary,
    pub budget: Vec<BudgetComparisonRow>,
    pub growth: GrowthRates,
}

impl Report {
    pub fn build(
        transactions: &[Transaction],
        categories: &[CategoryDefinition],
        buckets: &AllocationBuckets,
    ) -> Result<Self, AggregateError> {
        let totals = aggregate_by_type(transactions)?;
        let by_category = aggregate_by_category(transactions)?;
        let by_month = aggregate_by_month(transactions)?;
        let bucket_totals = BucketTotals::from_transactions(transactions, buckets);

        let budget = budget_comparison(
            &by_category.amounts_for(TransactionType::Expense),
            &budgets_by_category(categories),
        );
        let growth = crate::metrics::monthly_growth_rate(&by_month, GROWTH_WINDOW_MONTHS);

        let report = Report {
            transaction_count: transactions.len(),
            uncategorized_count: transactions.iter().filter(|t| !t.is_categorized()).count(),
            net_cashflow: net_cashflow(totals.income(), totals.expense()),
            savings_rate: savings_rate(totals.income(), bucket_totals.spending),
            allocation: CashAllocation::from(bucket_totals),
            by_subcategory: aggregate_by_subcategory(transactions)?,
            by_vendor: aggregate_by_vendor(transactions)?,
            by_payment_method: aggregate_by_payment_method(transactions)?,
            totals,
            by_category,
            by_month,
            budget,
            growth,
        };

        tracing::debug!(
            transactions = report.transaction_count,
            uncategorized = report.uncategorized_count,
            months = report.by_month.keys().len(),
            "report built"
        );

        Ok(report)
    }

    pub fn over_budget(&self) -> impl Iterator<Item = &BudgetComparisonRow> {
        self.budget.iter().filter(|r| r.is_over_budget())
    }
}
