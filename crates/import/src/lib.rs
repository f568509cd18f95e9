pub mod csv;
pub mod defaults;
pub mod normalize;
pub mod rules;

pub use csv::{detect_delimiter, CsvColumnMapping, CsvError, CsvImportProfile};
pub use defaults::{default_category_rules, default_vendor_rules};
pub use normalize::{normalize, normalize_record, NormalizeError, NormalizeMode, Normalized};
pub use rules::{
    CategorizeOptions, CategorizeSummary, CategoryRule, MatchType, RuleError, RuleSet, VendorRule,
};

pub mod ingest {
    use crate::csv::{CsvError, CsvImportProfile};
    use crate::normalize::{normalize, NormalizeError, NormalizeMode, Normalized};
    use crate::rules::{CategorizeOptions, CategorizeSummary, RuleSet};
    use cashflow_core::RawTransaction;

    pub fn import_csv_with_profile<R: std::io::Read>(
        data: R,
        profile: &CsvImportProfile,
    ) -> Result<Vec<RawTransaction>, CsvError> {
        crate::csv::import_csv(data, profile)
    }

    /// Normalize then categorize in one pass. Lenient rejections are kept in
    /// the returned [`Normalized`].
    pub fn prepare(
        records: &[RawTransaction],
        mode: NormalizeMode,
        rules: &RuleSet,
        options: CategorizeOptions,
    ) -> Result<(Normalized, CategorizeSummary), NormalizeError> {
        let normalized = normalize(records, mode)?;
        let (transactions, summary) = rules.categorize(&normalized.transactions, options);
        Ok((
            Normalized {
                transactions,
                rejected: normalized.rejected,
            },
            summary,
        ))
    }

}
