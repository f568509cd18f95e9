//! Column names shared with the export layer. Serde field names on
//! [`crate::Transaction`] and the summary rows use these same strings.

pub const DATE: &str = "Date";
pub const DESCRIPTION: &str = "Description";
pub const AMOUNT: &str = "Amount";
pub const TYPE: &str = "Type";
pub const CATEGORY: &str = "Category";
pub const SUBCATEGORY: &str = "Subcategory";
pub const VENDOR: &str = "Vendor";
pub const PAYMENT_METHOD: &str = "Payment Method";
pub const NOTES: &str = "Notes";

pub const TRANSACTION_COLUMNS: [&str; 9] = [
    DATE,
    DESCRIPTION,
    AMOUNT,
    TYPE,
    CATEGORY,
    SUBCATEGORY,
    VENDOR,
    PAYMENT_METHOD,
    NOTES,
];

pub const MAIN_CATEGORY: &str = "Main Category";
pub const CATEGORY_DESCRIPTION: &str = "Description";
pub const BUDGET: &str = "Budget Amount";

pub const CATEGORY_COLUMNS: [&str; 4] = [MAIN_CATEGORY, SUBCATEGORY, CATEGORY_DESCRIPTION, BUDGET];

pub const MONTH: &str = "Month";

/// Bucket for transactions whose category was never assigned.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Bucket for unset vendor or payment method.
pub const UNKNOWN: &str = "Unknown";
/// Bucket for unset subcategory.
pub const UNSPECIFIED: &str = "Unspecified";
