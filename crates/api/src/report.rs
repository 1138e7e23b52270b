// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report rendering: display labels, summary rows and CSV export.

use std::collections::HashMap;

use donation_domain::{DonationTransaction, SummaryRow, format_date};
use donation_persistence::{Persistence, PersistenceError};
use thiserror::Error;

/// Column headers of the transaction export, in order.
pub const EXPORT_HEADERS: &[&str] = &[
    "receipt_number",
    "donated_on",
    "status",
    "branch",
    "volunteer",
    "program",
    "payment_method",
    "donor_name",
    "donor_phone",
    "amount",
    "rate",
    "allocation",
    "validated_at",
    "rejection_reason",
    "notes",
];

/// Errors raised while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The CSV writer failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV buffer could not be flushed.
    #[error("CSV buffer flush failed: {0}")]
    Flush(String),

    /// The rendered CSV was not valid UTF-8.
    #[error("CSV output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Display labels for the identifiers a transaction carries.
///
/// Labels are resolved once per report instead of per row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportLabels {
    branches: HashMap<i64, String>,
    volunteers: HashMap<i64, String>,
    programs: HashMap<i64, String>,
    payment_methods: HashMap<i64, String>,
}

impl ReportLabels {
    /// Loads every label from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if a listing query fails.
    pub fn load(persistence: &mut Persistence) -> Result<Self, PersistenceError> {
        let branches: HashMap<i64, String> = persistence
            .list_branches()?
            .into_iter()
            .filter_map(|b| b.branch_id.map(|id| (id, b.code)))
            .collect();
        let volunteers: HashMap<i64, String> = persistence
            .list_volunteers(None, None)?
            .into_iter()
            .filter_map(|v| v.volunteer_id.map(|id| (id, v.name)))
            .collect();
        let programs: HashMap<i64, String> = persistence
            .list_programs()?
            .into_iter()
            .filter_map(|p| p.program_id.map(|id| (id, p.code)))
            .collect();
        let payment_methods: HashMap<i64, String> = persistence
            .list_payment_methods()?
            .into_iter()
            .filter_map(|m| m.payment_method_id.map(|id| (id, m.name)))
            .collect();

        Ok(Self {
            branches,
            volunteers,
            programs,
            payment_methods,
        })
    }

    fn label(map: &HashMap<i64, String>, id: i64) -> String {
        map.get(&id).cloned().unwrap_or_else(|| format!("#{id}"))
    }

    /// Branch code.
    #[must_use]
    pub fn branch(&self, id: i64) -> String {
        Self::label(&self.branches, id)
    }

    /// Volunteer name.
    #[must_use]
    pub fn volunteer(&self, id: i64) -> String {
        Self::label(&self.volunteers, id)
    }

    /// Program code.
    #[must_use]
    pub fn program(&self, id: i64) -> String {
        Self::label(&self.programs, id)
    }

    /// Payment method name.
    #[must_use]
    pub fn payment_method(&self, id: i64) -> String {
        Self::label(&self.payment_methods, id)
    }
}

/// Projects transactions onto the rows the summary aggregates.
#[must_use]
pub fn summary_rows(transactions: &[DonationTransaction], labels: &ReportLabels) -> Vec<SummaryRow> {
    transactions
        .iter()
        .map(|t| SummaryRow {
            status: t.status,
            program: (t.program_id, labels.program(t.program_id)),
            branch: (t.branch_id, labels.branch(t.branch_id)),
            payment_method: (t.payment_method_id, labels.payment_method(t.payment_method_id)),
            amount: t.amount.value(),
            allocation: t.allocation,
        })
        .collect()
}

/// Renders transactions as CSV with a header row.
///
/// # Errors
///
/// Returns an error if the CSV writer fails.
pub fn write_transactions_csv(
    transactions: &[DonationTransaction],
    labels: &ReportLabels,
) -> Result<String, ReportError> {
    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for t in transactions {
        writer.write_record([
            t.receipt_number.clone(),
            format_date(t.donated_on),
            t.status.to_string(),
            labels.branch(t.branch_id),
            labels.volunteer(t.volunteer_id),
            labels.program(t.program_id),
            labels.payment_method(t.payment_method_id),
            t.donor_name.clone(),
            t.donor_phone.clone().unwrap_or_default(),
            t.amount.to_string(),
            t.rate.to_string(),
            t.allocation.to_string(),
            t.validated_at.clone().unwrap_or_default(),
            t.rejection_reason.clone().unwrap_or_default(),
            t.notes.clone().unwrap_or_default(),
        ])?;
    }

    let bytes: Vec<u8> = writer
        .into_inner()
        .map_err(|e| ReportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
