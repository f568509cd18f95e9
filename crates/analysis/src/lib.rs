pub mod aggregate;
pub mod metrics;
pub mod report;

pub use aggregate::{
    aggregate, aggregate_by_category, aggregate_by_month, aggregate_by_payment_method,
    aggregate_by_subcategory, aggregate_by_type, aggregate_by_vendor, filter_range,
    AggregateError, GroupingKey, Summary, SummaryRow, TypeTotals,
};
pub use metrics::{
    budget_comparison, cash_allocation, monthly_growth_rate, net_cashflow, savings_rate,
    AllocationBuckets, Bucket, BucketTotals, BudgetComparisonRow, CashAllocation, GrowthRates,
};
pub use report::{Report, GROWTH_WINDOW_MONTHS};
