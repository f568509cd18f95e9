use crate::rules::{CategoryRule, MatchType, RuleError, RuleSet, VendorRule};

/// Built-in keyword table, in match order. `gas bill` under Housing must
/// stay ahead of `gas` under Transportation.
pub const DEFAULT_CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Housing",
        &[
            "rent", "mortgage", "home", "apartment", "electricity", "water", "gas bill",
            "internet", "maintenance",
        ],
    ),
    (
        "Transportation",
        &[
            "gas", "fuel", "bus", "train", "subway", "uber", "lyft", "taxi", "car payment",
            "insurance", "repair", "maintenance",
        ],
    ),
    (
        "Food",
        &[
            "grocery", "restaurant", "cafe", "coffee", "takeout", "doordash", "ubereats",
            "grubhub", "dining",
        ],
    ),
    (
        "Entertainment",
        &[
            "movie", "theater", "concert", "subscription", "netflix", "spotify", "amazon prime",
            "hulu", "disney", "ticket",
        ],
    ),
    (
        "Shopping",
        &[
            "amazon", "walmart", "target", "clothing", "shoes", "electronics", "furniture",
            "home goods", "appliance",
        ],
    ),
    (
        "Personal",
        &[
            "doctor", "medical", "pharmacy", "gym", "fitness", "education", "tuition", "books",
            "haircut", "salon", "spa",
        ],
    ),
    ("Savings", &["transfer to savings", "emergency fund", "savings goal"]),
    (
        "Investments",
        &[
            "investment", "stock", "etf", "mutual fund", "bond", "real estate", "crypto",
            "bitcoin", "ethereum",
        ],
    ),
    ("Debt", &["credit card payment", "loan payment", "student loan", "debt"]),
    (
        "Income",
        &[
            "salary", "paycheck", "deposit", "dividend", "interest", "refund",
            "payment received", "client payment",
        ],
    ),
];

/// Built-in vendor patterns (case-insensitive regexes), in match order.
pub const DEFAULT_VENDOR_PATTERNS: &[(&str, &str)] = &[
    (r"amazon", "Amazon"),
    (r"netflix", "Netflix"),
    (r"spotify", "Spotify"),
    (r"uber(eats)?", "Uber"),
    (r"lyft", "Lyft"),
    (r"doordash", "DoorDash"),
    (r"grubhub", "GrubHub"),
    (r"walmart", "Walmart"),
    (r"target", "Target"),
    (r"starbucks", "Starbucks"),
    (r"mcdonald'?s", "McDonalds"),
    (r"deposit", "Bank Deposit"),
    (r"transfer", "Bank Transfer"),
    (r"withdrawal", "ATM Withdrawal"),
    (r"payroll|direct deposit|salary", "Employer"),
    (r"insurance", "Insurance Company"),
    (r"mortgage|rent", "Housing Provider"),
    (r"electric|gas|water|utility", "Utility Company"),
    (r"phone|mobile|wireless", "Phone Provider"),
    (r"internet|cable|wifi", "Internet Provider"),
];

pub fn default_category_rules() -> Vec<CategoryRule> {
    DEFAULT_CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| CategoryRule::new(category, keywords))
        .collect()
}

pub fn default_vendor_rules() -> Vec<VendorRule> {
    DEFAULT_VENDOR_PATTERNS
        .iter()
        .map(|(pattern, vendor)| VendorRule::new(vendor, pattern, MatchType::Regex))
        .collect()
}

impl RuleSet {
    pub fn default_rules() -> Result<Self, RuleError> {
        RuleSet::new(default_category_rules(), default_vendor_rules())
    }
}
