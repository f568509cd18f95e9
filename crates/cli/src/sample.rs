use cashflow_core::{Money, Transaction, TransactionType};
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_COUNT: usize = 50;

/// Days before `today` that generated dates may fall on.
const WINDOW_DAYS: i64 = 90;

/// Share of generated transactions that are income.
const INCOME_PROBABILITY: f64 = 0.2;

struct Profile {
    category: &'static str,
    subcategories: &'static [&'static str],
    vendors: &'static [&'static str],
    descriptions: &'static [&'static str],
    /// Whole-currency bounds, inclusive.
    range: (i64, i64),
}

const INCOME: Profile = Profile {
    category: "Income",
    subcategories: &["Salary", "Freelance", "Investments"],
    vendors: &["Employer", "Client", "Dividend"],
    descriptions: &["Monthly Salary", "Client Payment", "Dividend Payment"],
    range: (1000, 5000),
};

const EXPENSES: &[Profile] = &[
    Profile {
        category: "Housing",
        subcategories: &["Rent/Mortgage", "Utilities"],
        vendors: &["Landlord", "Electric Company", "Water Company"],
        descriptions: &["Monthly Rent", "Electricity Bill", "Water Bill"],
        range: (800, 2000),
    },
    Profile {
        category: "Transportation",
        subcategories: &["Gas", "Public Transit"],
        vendors: &["Gas Station", "Transit Authority", "Uber"],
        descriptions: &["Gas Refill", "Monthly Transit Pass", "Uber Ride"],
        range: (20, 200),
    },
    Profile {
        category: "Food",
        subcategories: &["Groceries", "Restaurants"],
        vendors: &["Grocery Store", "Restaurant", "Cafe"],
        descriptions: &["Grocery Shopping", "Dinner Out", "Lunch"],
        range: (10, 150),
    },
    Profile {
        category: "Entertainment",
        subcategories: &["Movies", "Subscriptions"],
        vendors: &["Cinema", "Netflix", "Spotify"],
        descriptions: &["Movie Tickets", "Netflix Subscription", "Spotify Premium"],
        range: (10, 50),
    },
    Profile {
        category: "Shopping",
        subcategories: &["Clothing", "Electronics"],
        vendors: &["Amazon", "Walmart", "Target"],
        descriptions: &["Online Purchase", "Clothing", "Electronics"],
        range: (20, 500),
    },
    Profile {
        category: "Savings",
        subcategories: &["Emergency Fund"],
        vendors: &["Bank"],
        descriptions: &["Transfer to Savings"],
        range: (100, 1000),
    },
    Profile {
        category: "Investments",
        subcategories: &["Stocks"],
        vendors: &["Brokerage"],
        descriptions: &["Stock Purchase"],
        range: (100, 2000),
    },
];

const PAYMENT_METHODS: &[&str] = &["Credit Card", "Debit Card", "Cash", "Bank Transfer"];

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Fully labelled demo transactions dated within the last 90 days,
/// oldest first.
pub fn generate<R: Rng + ?Sized>(
    count: usize,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<Transaction> {
    let mut transactions: Vec<Transaction> = (0..count)
        .map(|_| {
            let (profile, transaction_type) = if rng.gen_bool(INCOME_PROBABILITY) {
                (&INCOME, TransactionType::Income)
            } else {
                let profile = EXPENSES.choose(rng).unwrap_or(&EXPENSES[0]);
                (profile, TransactionType::Expense)
            };

            let (low, high) = profile.range;
            let amount = Money::from_cents(rng.gen_range(low * 100..=high * 100));
            let date = today - Duration::days(rng.gen_range(0..WINDOW_DAYS));

            Transaction::new(date, pick(rng, profile.descriptions), amount, transaction_type)
                .with_category(profile.category, Some(pick(rng, profile.subcategories)))
                .with_vendor(pick(rng, profile.vendors))
                .with_payment_method(pick(rng, PAYMENT_METHODS))
        })
        .collect();

    transactions.sort_by_key(|t| t.date);
    tracing::debug!(count = transactions.len(), "generated sample transactions");
    transactions
}
