use cashflow_core::Transaction;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Keyword rule for one category (optionally narrowed to a subcategory).
/// Keywords are matched case-insensitively as substrings of the description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    #[serde(alias = "name")]
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: &str, keywords: &[&str]) -> Self {
        CategoryRule {
            category: category.to_string(),
            subcategory: None,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn with_subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRule {
    #[serde(alias = "name")]
    pub vendor: String,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    /// Category implied by this vendor. Checked before keyword rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl VendorRule {
    pub fn new(vendor: &str, pattern: &str, match_type: MatchType) -> Self {
        VendorRule {
            vendor: vendor.to_string(),
            pattern: pattern.to_string(),
            match_type,
            category: None,
        }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Category '{0}' has no keywords")]
    EmptyKeywords(String),
    #[error("Blank pattern in rule for '{0}'")]
    BlankPattern(String),
    #[error("Invalid regex for vendor '{vendor}': {source}")]
    InvalidRegex {
        vendor: String,
        #[source]
        source: regex::Error,
    },
    #[error("Failed to parse rules: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorizeOptions {
    /// Re-evaluate transactions that already carry a category or vendor and
    /// overwrite them when a rule matches.
    pub force: bool,
    /// Use the first word of the description when no vendor rule matches.
    pub vendor_fallback: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorizeSummary {
    pub categorized: usize,
    pub uncategorized: usize,
    pub vendors_assigned: usize,
}

/// Keywords stored lower-cased so the hot loop does one `to_lowercase` per
/// description.
#[derive(Debug)]
struct CompiledCategoryRule {
    rule: CategoryRule,
    keywords: Vec<String>,
}

/// Internal pairing of a vendor rule with its precompiled matcher.
#[derive(Debug)]
struct CompiledVendorRule {
    rule: VendorRule,
    needle: String,
    compiled_regex: Option<Regex>,
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default, rename = "category")]
    categories: Vec<CategoryRule>,
    #[serde(default, rename = "vendor")]
    vendors: Vec<VendorRule>,
}

/// An ordered, validated rule set. Earlier rules win: the first matching
/// vendor rule assigns the vendor, then a vendor rule carrying a category
/// for that vendor name, or else the first category rule with a matching
/// keyword, assigns the category.
#[derive(Debug)]
pub struct RuleSet {
    categories: Vec<CompiledCategoryRule>,
    vendors: Vec<CompiledVendorRule>,
}

impl RuleSet {
    pub fn new(categories: Vec<CategoryRule>, vendors: Vec<VendorRule>) -> Result<Self, RuleError> {
        let categories = categories
            .into_iter()
            .map(|rule| {
                if rule.keywords.is_empty() {
                    return Err(RuleError::EmptyKeywords(rule.category));
                }
                if rule.keywords.iter().any(|k| k.trim().is_empty()) {
                    return Err(RuleError::BlankPattern(rule.category));
                }
                let keywords = rule.keywords.iter().map(|k| k.to_lowercase()).collect();
                Ok(CompiledCategoryRule { rule, keywords })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let vendors = vendors
            .into_iter()
            .map(|rule| {
                if rule.pattern.trim().is_empty() {
                    return Err(RuleError::BlankPattern(rule.vendor));
                }
                let compiled_regex = if rule.match_type == MatchType::Regex {
                    let re = RegexBuilder::new(&rule.pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| RuleError::InvalidRegex {
                            vendor: rule.vendor.clone(),
                            source,
                        })?;
                    Some(re)
                } else {
                    None
                };
                let needle = rule.pattern.to_lowercase();
                Ok(CompiledVendorRule { rule, needle, compiled_regex })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { categories, vendors })
    }

    /// Parses `[[category]]` and `[[vendor]]` tables, keeping file order.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::new(file.categories, file.vendors)
    }

    pub fn empty() -> Self {
        Self {
            categories: Vec::new(),
            vendors: Vec::new(),
        }
    }

    pub fn category_rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.categories.iter().map(|c| &c.rule)
    }

    pub fn vendor_rules(&self) -> impl Iterator<Item = &VendorRule> {
        self.vendors.iter().map(|v| &v.rule)
    }

    pub fn find_category(&self, description: &str) -> Option<&CategoryRule> {
        let text = description.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|c| &c.rule)
    }

    pub fn find_vendor(&self, description: &str) -> Option<&VendorRule> {
        let text = description.to_lowercase();
        self.vendors
            .iter()
            .find(|v| match v.rule.match_type {
                MatchType::Contains => text.contains(v.needle.as_str()),
                MatchType::Exact => text.trim() == v.needle.trim(),
                MatchType::Regex => v
                    .compiled_regex
                    .as_ref()
                    .is_some_and(|re| re.is_match(description)),
            })
            .map(|v| &v.rule)
    }

    /// Category mapped to a known vendor name (case-insensitive), first
    /// matching vendor rule wins.
    pub fn category_for_vendor(&self, vendor: &str) -> Option<&str> {
        let vendor = vendor.trim();
        self.vendors
            .iter()
            .filter(|v| v.rule.vendor.eq_ignore_ascii_case(vendor))
            .find_map(|v| v.rule.category.as_deref())
    }

    /// Vendor mapping first, then description keywords.
    fn match_category(&self, tx: &Transaction) -> Option<(&str, Option<&str>)> {
        if let Some(category) = tx.vendor.as_deref().and_then(|v| self.category_for_vendor(v)) {
            return Some((category, None));
        }
        self.find_category(&tx.description)
            .map(|rule| (rule.category.as_str(), rule.subcategory.as_deref()))
    }

    /// Fills gaps on one transaction. Returns `(category_assigned, vendor_assigned)`.
    ///
    /// Without `force` an existing category, subcategory or vendor is kept.
    /// With `force` a matching rule replaces category and vendor, and the
    /// subcategory follows the matched rule.
    pub fn apply(&self, tx: &mut Transaction, options: CategorizeOptions) -> (bool, bool) {
        let mut vendor_assigned = false;
        if options.force || tx.vendor.is_none() {
            let vendor = self
                .find_vendor(&tx.description)
                .map(|r| r.vendor.clone())
                .or_else(|| {
                    if options.vendor_fallback && tx.vendor.is_none() {
                        first_word(&tx.description)
                    } else {
                        None
                    }
                });
            if let Some(vendor) = vendor {
                tx.vendor = Some(vendor);
                vendor_assigned = true;
            }
        }

        let mut category_assigned = false;
        if options.force || tx.category.is_none() {
            if let Some((category, subcategory)) = self.match_category(tx) {
                let category = category.to_string();
                let subcategory = subcategory.map(str::to_string);
                tx.category = Some(category);
                if options.force || tx.subcategory.is_none() {
                    tx.subcategory = subcategory;
                }
                category_assigned = true;
            }
        }

        (category_assigned, vendor_assigned)
    }

    /// Returns categorized copies of `transactions` in input order; the
    /// input is left untouched.
    pub fn categorize(
        &self,
        transactions: &[Transaction],
        options: CategorizeOptions,
    ) -> (Vec<Transaction>, CategorizeSummary) {
        let mut summary = CategorizeSummary::default();
        let out = transactions
            .iter()
            .cloned()
            .map(|mut tx| {
                let (category_assigned, vendor_assigned) = self.apply(&mut tx, options);
                summary.categorized += usize::from(category_assigned);
                summary.vendors_assigned += usize::from(vendor_assigned);
                summary.uncategorized += usize::from(tx.category.is_none());
                tx
            })
            .collect();

        tracing::debug!(
            categorized = summary.categorized,
            uncategorized = summary.uncategorized,
            vendors = summary.vendors_assigned,
            "categorization pass complete"
        );

        (out, summary)
    }
}

fn first_word(description: &str) -> Option<String> {
    description.split_whitespace().next().map(str::to_string)
}
