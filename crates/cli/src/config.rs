use anyhow::{Context, Result};
use cashflow_analysis::AllocationBuckets;
use cashflow_core::category::validate_categories;
use cashflow_core::{default_categories, CategoryDefinition};
use cashflow_import::{
    default_category_rules, default_vendor_rules, CategoryRule, RuleSet, VendorRule,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// On-disk shape of `cashflow.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    strict: bool,
    vendor_fallback: bool,
    category: Vec<CategoryRule>,
    vendor: Vec<VendorRule>,
    budget: Vec<CategoryDefinition>,
    allocation: Option<AllocationSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AllocationSection {
    saving: Vec<String>,
    investing: Vec<String>,
}

#[derive(Debug)]
pub struct Config {
    pub strict: bool,
    pub vendor_fallback: bool,
    pub rules: RuleSet,
    pub categories: Vec<CategoryDefinition>,
    pub buckets: AllocationBuckets,
    /// File the settings came from; `None` means built-in defaults.
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn defaults() -> Result<Self> {
        Self::from_toml("")
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("invalid configuration")?;

        let category_rules = if file.category.is_empty() {
            default_category_rules()
        } else {
            file.category
        };
        let vendor_rules = if file.vendor.is_empty() {
            default_vendor_rules()
        } else {
            file.vendor
        };
        let rules = RuleSet::new(category_rules, vendor_rules).context("invalid rule set")?;

        let categories = if file.budget.is_empty() {
            default_categories()
        } else {
            validate_categories(file.budget).context("invalid budget table")?
        };

        let buckets = match file.allocation {
            Some(section) => AllocationBuckets::from_lists(&section.saving, &section.investing),
            None => AllocationBuckets::default(),
        };

        Ok(Config {
            strict: file.strict,
            vendor_fallback: file.vendor_fallback,
            rules,
            categories,
            buckets,
            source: None,
        })
    }

    /// `explicit` must exist when given. Otherwise the user config file is
    /// used if present, then the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => user_config_path().filter(|p| p.is_file()),
        };

        let Some(path) = path else {
            tracing::debug!("no config file, using built-in defaults");
            return Self::defaults();
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config =
            Self::from_toml(&content).with_context(|| format!("in {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        config.source = Some(path);
        Ok(config)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "cashflow", "cashflow")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
