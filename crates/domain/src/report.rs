// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Aggregation of transactions into dashboard summaries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::status::TransactionStatus;

/// One transaction as seen by the report aggregator.
///
/// Labels are resolved by the caller so aggregation stays pure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Validation status.
    pub status: TransactionStatus,
    /// Program identifier and name.
    pub program: (i64, String),
    /// Branch identifier and name.
    pub branch: (i64, String),
    /// Payment method identifier and name.
    pub payment_method: (i64, String),
    /// Donated amount.
    pub amount: Decimal,
    /// Derived allocation.
    pub allocation: Decimal,
}

/// Totals for one group of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBucket {
    /// Group key: an entity id, or the status string.
    pub key: String,
    /// Human-readable label.
    pub label: String,
    /// Number of transactions.
    pub count: u64,
    /// Sum of amounts.
    pub total_amount: Decimal,
    /// Sum of allocations.
    pub total_allocation: Decimal,
}

impl SummaryBucket {
    fn new(key: String, label: String) -> Self {
        Self {
            key,
            label,
            count: 0,
            total_amount: Decimal::ZERO,
            total_allocation: Decimal::ZERO,
        }
    }

    fn add(&mut self, row: &SummaryRow) -> Result<(), DomainError> {
        self.total_amount = checked_sum(self.total_amount, row.amount, &self.label)?;
        self.total_allocation = checked_sum(self.total_allocation, row.allocation, &self.label)?;
        self.count += 1;
        Ok(())
    }
}

/// Aggregated view of a set of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Number of transactions.
    pub count: u64,
    /// Sum of all amounts.
    pub total_amount: Decimal,
    /// Sum of all allocations.
    pub total_allocation: Decimal,
    /// Totals per status, in `pending`, `valid`, `rejected` order.
    pub by_status: Vec<SummaryBucket>,
    /// Totals per program, ordered by program id.
    pub by_program: Vec<SummaryBucket>,
    /// Totals per branch, ordered by branch id.
    pub by_branch: Vec<SummaryBucket>,
    /// Totals per payment method, ordered by payment method id.
    pub by_payment_method: Vec<SummaryBucket>,
}

/// Aggregates transaction rows into a summary.
///
/// Every status appears in `by_status` even when its count is zero, so the
/// dashboard can render a stable set of tiles.
///
/// # Errors
///
/// Returns `ArithmeticOverflow` if a total leaves `Decimal` range.
pub fn summarize(rows: &[SummaryRow]) -> Result<TransactionSummary, DomainError> {
    let mut by_status: BTreeMap<TransactionStatus, SummaryBucket> = [
        TransactionStatus::Pending,
        TransactionStatus::Valid,
        TransactionStatus::Rejected,
    ]
    .into_iter()
    .map(|s| {
        (
            s,
            SummaryBucket::new(s.as_str().to_string(), s.as_str().to_string()),
        )
    })
    .collect();
    let mut by_program: BTreeMap<i64, SummaryBucket> = BTreeMap::new();
    let mut by_branch: BTreeMap<i64, SummaryBucket> = BTreeMap::new();
    let mut by_payment_method: BTreeMap<i64, SummaryBucket> = BTreeMap::new();

    let mut total_amount: Decimal = Decimal::ZERO;
    let mut total_allocation: Decimal = Decimal::ZERO;

    for row in rows {
        total_amount = checked_sum(total_amount, row.amount, "total")?;
        total_allocation = checked_sum(total_allocation, row.allocation, "total")?;

        by_status
            .entry(row.status)
            .or_insert_with(|| {
                SummaryBucket::new(row.status.to_string(), row.status.to_string())
            })
            .add(row)?;
        bucket_for(&mut by_program, &row.program).add(row)?;
        bucket_for(&mut by_branch, &row.branch).add(row)?;
        bucket_for(&mut by_payment_method, &row.payment_method).add(row)?;
    }

    Ok(TransactionSummary {
        count: rows.len() as u64,
        total_amount,
        total_allocation,
        by_status: by_status.into_values().collect(),
        by_program: by_program.into_values().collect(),
        by_branch: by_branch.into_values().collect(),
        by_payment_method: by_payment_method.into_values().collect(),
    })
}

fn checked_sum(total: Decimal, value: Decimal, group: &str) -> Result<Decimal, DomainError> {
    total
        .checked_add(value)
        .ok_or_else(|| DomainError::ArithmeticOverflow(format!("{group} summary")))
}

fn bucket_for<'a>(
    buckets: &'a mut BTreeMap<i64, SummaryBucket>,
    (id, label): &(i64, String),
) -> &'a mut SummaryBucket {
    buckets
        .entry(*id)
        .or_insert_with(|| SummaryBucket::new(id.to_string(), label.clone()))
}
