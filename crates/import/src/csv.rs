use cashflow_core::RawTransaction;
use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

/// Zero-based column positions. Unset columns are resolved from the header
/// row when the profile has one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvColumnMapping {
    pub date_column: Option<usize>,
    pub description_column: Option<usize>,
    pub amount_column: Option<usize>,
    pub type_column: Option<usize>,
    pub debit_column: Option<usize>,
    pub credit_column: Option<usize>,
    pub category_column: Option<usize>,
    pub subcategory_column: Option<usize>,
    pub vendor_column: Option<usize>,
    pub payment_method_column: Option<usize>,
    pub notes_column: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvImportProfile {
    pub name: String,
    pub mapping: CsvColumnMapping,
    pub has_header: bool,
    pub delimiter: String,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            name: "Unnamed Profile".to_string(),
            mapping: CsvColumnMapping::default(),
            has_header: true,
            delimiter: ",".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

impl CsvColumnMapping {
    /// Fills unset columns by matching header names case-insensitively.
    pub fn resolve_headers(&mut self, headers: &csv::StringRecord) {
        for (idx, header) in headers.iter().enumerate() {
            let slot = match header.trim().to_lowercase().as_str() {
                "date" | "transaction date" => &mut self.date_column,
                "description" | "details" => &mut self.description_column,
                "amount" => &mut self.amount_column,
                "type" | "transaction type" => &mut self.type_column,
                "debit" | "withdrawal" => &mut self.debit_column,
                "credit" | "deposit" => &mut self.credit_column,
                "category" | "main category" => &mut self.category_column,
                "subcategory" => &mut self.subcategory_column,
                "vendor" | "producer" | "producer/vendor" | "payee" => &mut self.vendor_column,
                "payment method" | "payment_method" => &mut self.payment_method_column,
                "notes" | "note" => &mut self.notes_column,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(idx);
            }
        }
    }

    fn validate(&self) -> Result<(), CsvError> {
        if self.date_column.is_none() {
            return Err(CsvError::MissingColumn("date".to_string()));
        }
        if self.description_column.is_none() {
            return Err(CsvError::MissingColumn("description".to_string()));
        }
        let has_pair = self.debit_column.is_some() && self.credit_column.is_some();
        if self.amount_column.is_none() && !has_pair {
            return Err(CsvError::MissingColumn("amount (or debit and credit)".to_string()));
        }
        Ok(())
    }
}

pub struct CsvImporter;

impl CsvImporter {
    /// Reads every data row as a [`RawTransaction`] without interpreting
    /// dates or amounts; that is the normalizer's job.
    pub fn parse_profile<R: Read>(
        reader: &mut csv::Reader<R>,
        profile: &CsvImportProfile,
    ) -> Result<Vec<RawTransaction>, CsvError> {
        let mut mapping = profile.mapping.clone();
        if profile.has_header {
            mapping.resolve_headers(reader.headers()?);
        }
        mapping.validate()?;

        let mut transactions = Vec::new();

        for result in reader.records() {
            let record = result?;

            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let field = |col: Option<usize>| -> Option<String> {
                col.and_then(|c| record.get(c))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };

            transactions.push(RawTransaction {
                date: field(mapping.date_column).unwrap_or_default(),
                description: field(mapping.description_column).unwrap_or_default(),
                amount: field(mapping.amount_column),
                transaction_type: field(mapping.type_column),
                debit: field(mapping.debit_column),
                credit: field(mapping.credit_column),
                category: field(mapping.category_column),
                subcategory: field(mapping.subcategory_column),
                vendor: field(mapping.vendor_column),
                payment_method: field(mapping.payment_method_column),
                notes: field(mapping.notes_column),
            });
        }

        tracing::debug!(profile = %profile.name, rows = transactions.len(), "csv rows read");

        Ok(transactions)
    }
}

/// Picks the most frequent of `,` `;` tab `|` in `sample`, defaulting to comma.
pub fn detect_delimiter(sample: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .map(|d| (d, sample.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

pub fn parse<R: Read>(
    reader: &mut csv::Reader<R>,
    profile: &CsvImportProfile,
) -> Result<Vec<RawTransaction>, CsvError> {
    CsvImporter::parse_profile(reader, profile)
}

pub fn import_csv<R: Read>(
    data: R,
    profile: &CsvImportProfile,
) -> Result<Vec<RawTransaction>, CsvError> {
    let delimiter = profile
        .delimiter
        .as_bytes()
        .first()
        .copied()
        .unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(profile.has_header)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    parse(&mut reader, profile)
}
