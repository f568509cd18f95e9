pub mod category;
pub mod money;
pub mod period;
pub mod schema;
pub mod transaction;

pub use category::{
    budgets_by_category, categories_from_toml, default_categories, CategoryDefinition,
    CategoryError, DEFAULT_CATEGORIES,
};
pub use money::Money;
pub use period::{DateRange, ParseMonthError, YearMonth};
pub use transaction::{ParseTypeError, RawTransaction, Transaction, TransactionType};
