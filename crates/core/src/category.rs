use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::money::Money;

/// A main category of the taxonomy, with its budget for the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    #[serde(rename = "Main Category", alias = "name")]
    pub name: String,
    #[serde(rename = "Subcategory", alias = "subcategories", default)]
    pub subcategories: Vec<String>,
    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,
    #[serde(rename = "Budget Amount", alias = "budget", default)]
    pub budget: Option<Money>,
}

impl CategoryDefinition {
    pub fn new(
        name: &str,
        subcategories: &[&str],
        description: &str,
        budget: Option<Money>,
    ) -> Self {
        CategoryDefinition {
            name: name.to_string(),
            subcategories: subcategories.iter().map(|s| s.to_string()).collect(),
            description: description.to_string(),
            budget: budget.filter(|b| !b.is_zero()),
        }
    }

    /// A zero budget means "no budget set".
    pub fn has_budget(&self) -> bool {
        self.budget.is_some_and(|b| !b.is_zero())
    }
}

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Failed to parse categories: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Duplicate category: {0}")]
    Duplicate(String),
    #[error("Negative budget for category {0}")]
    NegativeBudget(String),
}

#[derive(Deserialize)]
struct CategoryFile {
    #[serde(default, rename = "budget")]
    categories: Vec<CategoryDefinition>,
}

/// Parses `[[budget]]` tables:
///
/// ```toml
/// [[budget]]
/// name = "Food"
/// subcategories = ["Groceries", "Restaurants"]
/// description = "Food and dining"
/// budget = "400"
/// ```
pub fn categories_from_toml(toml_content: &str) -> Result<Vec<CategoryDefinition>, CategoryError> {
    let file: CategoryFile = toml::from_str(toml_content)?;
    validate_categories(file.categories)
}

pub fn validate_categories(
    categories: Vec<CategoryDefinition>,
) -> Result<Vec<CategoryDefinition>, CategoryError> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(categories.len());
    for mut def in categories {
        if !seen.insert(def.name.clone()) {
            return Err(CategoryError::Duplicate(def.name));
        }
        if def.budget.is_some_and(Money::is_negative) {
            return Err(CategoryError::NegativeBudget(def.name));
        }
        def.budget = def.budget.filter(|b| !b.is_zero());
        out.push(def);
    }
    Ok(out)
}

/// Category name → budget, for categories that have one.
pub fn budgets_by_category(categories: &[CategoryDefinition]) -> BTreeMap<String, Money> {
    categories
        .iter()
        .filter_map(|c| c.budget.filter(|b| !b.is_zero()).map(|b| (c.name.clone(), b)))
        .collect()
}

pub const DEFAULT_CATEGORIES: &[(&str, &[&str], &str, i64)] = &[
    (
        "Income",
        &["Salary", "Freelance", "Investments", "Gifts", "Other Income"],
        "All income sources",
        0,
    ),
    (
        "Housing",
        &["Rent/Mortgage", "Utilities", "Maintenance", "Insurance"],
        "Housing-related expenses",
        1000,
    ),
    (
        "Transportation",
        &["Gas", "Public Transit", "Car Payment", "Car Insurance", "Maintenance"],
        "Transportation-related expenses",
        500,
    ),
    ("Food", &["Groceries", "Restaurants", "Takeout"], "Food and dining expenses", 400),
    (
        "Entertainment",
        &["Movies", "Games", "Events", "Subscriptions"],
        "Entertainment and leisure",
        200,
    ),
    ("Shopping", &["Clothing", "Electronics", "Home Goods"], "Shopping for goods", 300),
    (
        "Personal",
        &["Healthcare", "Education", "Gym", "Personal Care"],
        "Personal care and development",
        200,
    ),
    ("Savings", &["Emergency Fund", "Goals"], "Money set aside for savings", 300),
    (
        "Investments",
        &["Stocks", "Bonds", "Real Estate", "Cryptocurrency"],
        "Investment activities",
        200,
    ),
    ("Debt", &["Credit Card", "Student Loans", "Personal Loans"], "Debt payments", 500),
    ("Miscellaneous", &["Other"], "Miscellaneous expenses", 100),
];

pub fn default_categories() -> Vec<CategoryDefinition> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, subs, description, budget)| {
            CategoryDefinition::new(
                name,
                subs,
                description,
                Some(Money::from_decimal(Decimal::from(*budget))),
            )
        })
        .collect()
}
