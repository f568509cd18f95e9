use anyhow::{Context, Result};
use cashflow_analysis::{
    aggregate, filter_range, GroupingKey, Report, Summary, GROWTH_WINDOW_MONTHS,
};
use cashflow_core::{DateRange, Money, Transaction, TransactionType};
use cashflow_import::ingest::{import_csv_with_profile, prepare};
use cashflow_import::{
    detect_delimiter, CategorizeOptions, CsvImportProfile, NormalizeMode, Normalized,
};
use clap::ValueEnum;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reads, normalizes and categorizes one CSV file.
pub fn load(input: &Path, config: &Config, strict: bool, force: bool) -> Result<Normalized> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    if content.trim().is_empty() {
        tracing::info!(file = %input.display(), "empty input");
        return Ok(Normalized::default());
    }

    let first_line = content.lines().next().unwrap_or_default();
    let profile = CsvImportProfile {
        name: input.display().to_string(),
        delimiter: char::from(detect_delimiter(first_line)).to_string(),
        ..Default::default()
    };
    let records = import_csv_with_profile(content.as_bytes(), &profile)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let mode = if strict || config.strict {
        NormalizeMode::Strict
    } else {
        NormalizeMode::Lenient
    };
    let options = CategorizeOptions {
        force,
        vendor_fallback: config.vendor_fallback,
    };
    let (normalized, summary) = prepare(&records, mode, &config.rules, options)
        .with_context(|| format!("invalid record in {}", input.display()))?;

    if !normalized.rejected.is_empty() {
        tracing::warn!(
            rejected = normalized.rejected.len(),
            file = %input.display(),
            "some records were skipped"
        );
    }
    tracing::info!(
        records = records.len(),
        categorized = summary.categorized,
        uncategorized = summary.uncategorized,
        "loaded transactions"
    );

    Ok(normalized)
}

pub fn report(
    input: &Path,
    config: &Config,
    strict: bool,
    range: Option<DateRange>,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let normalized = load(input, config, strict, false)?;
    let transactions = match range {
        Some(range) => filter_range(&normalized.transactions, range),
        None => normalized.transactions,
    };

    let report = Report::build(&transactions, &config.categories, &config.buckets)?;

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_report_text(&report, range, normalized.rejected.len(), out)?,
    }
    Ok(())
}

pub fn categorize(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    force: bool,
    out: &mut impl Write,
) -> Result<()> {
    let normalized = load(input, config, config.strict, force)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_transactions_csv(&normalized.transactions, file)?;
            let uncategorized = normalized
                .transactions
                .iter()
                .filter(|t| !t.is_categorized())
                .count();
            writeln!(
                out,
                "Wrote {} transactions to {} ({} uncategorized)",
                normalized.transactions.len(),
                path.display(),
                uncategorized
            )?;
        }
        None => write_transactions_csv(&normalized.transactions, &mut *out)?,
    }
    Ok(())
}

pub fn summary(
    input: &Path,
    config: &Config,
    group_by: GroupingKey,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let normalized = load(input, config, config.strict, false)?;
    let summary = aggregate(&normalized.transactions, group_by)?;

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &summary.rows)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_summary_text(&summary, out)?,
    }
    Ok(())
}

pub fn write_sample(
    transactions: &[Transaction],
    output: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_transactions_csv(transactions, file)?;
            writeln!(
                out,
                "Wrote {} sample transactions to {}",
                transactions.len(),
                path.display()
            )?;
        }
        None => write_transactions_csv(transactions, &mut *out)?,
    }
    Ok(())
}

/// Writes transactions with the standard column headers.
pub fn write_transactions_csv<W: Write>(transactions: &[Transaction], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for tx in transactions {
        csv.serialize(tx)?;
    }
    csv.flush()?;
    Ok(())
}

// ── text rendering ────────────────────────────────────────────────────────────

fn write_summary_text(summary: &Summary, out: &mut impl Write) -> Result<()> {
    if summary.is_empty() {
        writeln!(out, "No transactions.")?;
        return Ok(());
    }
    let width = summary
        .rows
        .iter()
        .map(|r| r.key.len())
        .max()
        .unwrap_or(0)
        .max(summary.grouping.column().len());

    writeln!(out, "{:<width$}  {:<8}  {:>12}", summary.grouping.column(), "Type", "Amount")?;
    for row in &summary.rows {
        writeln!(
            out,
            "{:<width$}  {:<8}  {:>12}",
            row.key,
            row.transaction_type.to_string(),
            row.amount.to_string()
        )?;
    }
    Ok(())
}

fn write_report_text(
    report: &Report,
    range: Option<DateRange>,
    rejected: usize,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(range) = range {
        writeln!(out, "Period: {range}")?;
    }
    writeln!(
        out,
        "Transactions: {} ({} uncategorized)",
        report.transaction_count, report.uncategorized_count
    )?;
    if rejected > 0 {
        writeln!(out, "Skipped records: {rejected}")?;
    }
    writeln!(out)?;
    writeln!(out, "Income:        {:>12}", report.totals.income().to_string())?;
    writeln!(out, "Expenses:      {:>12}", report.totals.expense().to_string())?;
    writeln!(out, "Net cashflow:  {:>12}", report.net_cashflow.to_string())?;
    writeln!(out, "Savings rate:  {:>11.1}%", report.savings_rate)?;

    writeln!(out)?;
    writeln!(out, "Cash allocation")?;
    writeln!(out, "  Spending   {:>6.1}%", report.allocation.spending)?;
    writeln!(out, "  Saving     {:>6.1}%", report.allocation.saving)?;
    writeln!(out, "  Investing  {:>6.1}%", report.allocation.investing)?;

    let expenses = report.by_category.amounts_for(TransactionType::Expense);
    if !expenses.is_empty() {
        writeln!(out)?;
        writeln!(out, "Expenses by category")?;
        let mut rows: Vec<(&String, &Money)> = expenses.iter().collect();
        rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (category, amount) in rows {
            writeln!(out, "  {:<20} {:>12}", category, amount.to_string())?;
        }
    }

    if !report.by_month.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<9} {:>12} {:>12} {:>12}", "Month", "Income", "Expenses", "Net")?;
        for month in report.by_month.keys() {
            let income = report.by_month.amount(month, TransactionType::Income);
            let expense = report.by_month.amount(month, TransactionType::Expense);
            writeln!(
                out,
                "{:<9} {:>12} {:>12} {:>12}",
                month,
                income.to_string(),
                expense.to_string(),
                income.saturating_sub(expense).to_string()
            )?;
        }
        writeln!(
            out,
            "Growth over last {} months: income {:+.1}%, expenses {:+.1}%",
            GROWTH_WINDOW_MONTHS, report.growth.income, report.growth.expense
        )?;
    }

    if !report.budget.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<20} {:>12} {:>12} {:>8}", "Budget", "Actual", "Budgeted", "Used")?;
        for row in &report.budget {
            let budget = row.budget.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string());
            let used = row
                .percent_used
                .map(|p| format!("{p:.1}%"))
                .unwrap_or_else(|| "-".to_string());
            let flag = if row.is_over_budget() { "  over" } else { "" };
            writeln!(
                out,
                "{:<20} {:>12} {:>12} {:>8}{}",
                row.category,
                row.actual.to_string(),
                budget,
                used,
                flag
            )?;
        }
    }
    Ok(())
}
