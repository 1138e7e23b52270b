// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation transaction queries.
//!
//! Every read goes through [`filtered_transactions!`], which applies the
//! caller's [`VisibilityScope`] before any other criterion. A volunteer
//! therefore cannot reach another volunteer's rows by id, by filter, or by
//! report.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{
    Amount, DonationTransaction, Rate, TransactionStatus, VisibilityScope, format_date, parse_date,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::data_models::TransactionFilter;
use crate::diesel_schema::donation_transactions;
use crate::error::PersistenceError;

/// Prefix shared by every receipt number.
pub const RECEIPT_PREFIX: &str = "TRX";

/// Highest receipt sequence issued in one year.
///
/// Sequences are zero-padded to six digits, so the text maximum stays the
/// numeric maximum only up to this value.
pub const RECEIPT_SEQUENCE_MAX: u32 = 999_999;

/// Builds a boxed `donation_transactions` query restricted by a filter.
///
/// Limit and offset are left to the caller so that counts ignore paging.
macro_rules! filtered_transactions {
    ($filter:expr) => {{
        let filter: &TransactionFilter = $filter;
        let mut query = donation_transactions::table.into_boxed();

        query = match filter.scope {
            VisibilityScope::All => query,
            VisibilityScope::Branch(id) => query.filter(donation_transactions::branch_id.eq(id)),
            VisibilityScope::Volunteer(id) => {
                query.filter(donation_transactions::volunteer_id.eq(id))
            }
        };

        if let Some(status) = filter.status {
            query = query.filter(donation_transactions::status.eq(status.as_str()));
        }
        if let Some(id) = filter.program_id {
            query = query.filter(donation_transactions::program_id.eq(id));
        }
        if let Some(id) = filter.branch_id {
            query = query.filter(donation_transactions::branch_id.eq(id));
        }
        if let Some(id) = filter.volunteer_id {
            query = query.filter(donation_transactions::volunteer_id.eq(id));
        }
        if let Some(id) = filter.payment_method_id {
            query = query.filter(donation_transactions::payment_method_id.eq(id));
        }
        // ISO dates order lexicographically
        if let Some(from) = filter.date_from {
            query = query.filter(donation_transactions::donated_on.ge(format_date(from)));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(donation_transactions::donated_on.le(format_date(to)));
        }

        query
    }};
}

/// Diesel Queryable struct for transaction rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = donation_transactions)]
struct TransactionRow {
    transaction_id: i64,
    receipt_number: String,
    volunteer_id: i64,
    branch_id: i64,
    program_id: i64,
    payment_method_id: i64,
    donor_name: String,
    donor_phone: Option<String>,
    amount: String,
    rate: String,
    allocation: String,
    donated_on: String,
    status: String,
    notes: Option<String>,
    recorded_by: i64,
    validated_by: Option<i64>,
    validated_at: Option<String>,
    rejection_reason: Option<String>,
    created_at: String,
}

impl TransactionRow {
    fn into_domain(self) -> Result<DonationTransaction, PersistenceError> {
        let allocation: Decimal = Decimal::from_str(&self.allocation).map_err(|e| {
            PersistenceError::CorruptValue(format!(
                "allocation '{}' of transaction {}: {e}",
                self.allocation, self.transaction_id
            ))
        })?;

        Ok(DonationTransaction {
            transaction_id: Some(self.transaction_id),
            receipt_number: self.receipt_number,
            volunteer_id: self.volunteer_id,
            branch_id: self.branch_id,
            program_id: self.program_id,
            payment_method_id: self.payment_method_id,
            donor_name: self.donor_name,
            donor_phone: self.donor_phone,
            amount: Amount::parse(&self.amount)?,
            rate: Rate::parse(&self.rate)?,
            allocation,
            donated_on: parse_date(&self.donated_on)?,
            status: TransactionStatus::from_str(&self.status)?,
            notes: self.notes,
            recorded_by: self.recorded_by,
            validated_by: self.validated_by,
            validated_at: self.validated_at,
            rejection_reason: self.rejection_reason,
            created_at: Some(self.created_at),
        })
    }
}

backend_fn! {
/// Retrieves a transaction by ID within a visibility scope.
///
/// A transaction outside the scope is reported as absent.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn get_transaction(
    conn: &mut _,
    transaction_id: i64,
    scope: VisibilityScope,
) -> Result<Option<DonationTransaction>, PersistenceError> {
    debug!(transaction_id, %scope, "Looking up transaction");

    let filter: TransactionFilter = TransactionFilter::scoped(scope);
    let result: Result<TransactionRow, diesel::result::Error> = filtered_transactions!(&filter)
        .filter(donation_transactions::transaction_id.eq(transaction_id))
        .select(TransactionRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into_domain()?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists transactions matching a filter, newest donation first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored value is corrupt.
pub fn list_transactions(
    conn: &mut _,
    filter: &TransactionFilter,
) -> Result<Vec<DonationTransaction>, PersistenceError> {
    debug!(scope = %filter.scope, "Listing transactions");

    let mut query = filtered_transactions!(filter)
        .select(TransactionRow::as_select())
        .order((
            donation_transactions::donated_on.desc(),
            donation_transactions::transaction_id.desc(),
        ));

    if let Some(limit) = filter.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = filter.offset {
        query = query.offset(offset);
    }

    let rows: Vec<TransactionRow> = query.load(conn)?;
    rows.into_iter().map(TransactionRow::into_domain).collect()
}
}

backend_fn! {
/// Counts transactions matching a filter, ignoring limit and offset.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_transactions(
    conn: &mut _,
    filter: &TransactionFilter,
) -> Result<i64, PersistenceError> {
    let count = filtered_transactions!(filter).count().get_result::<i64>(conn)?;
    Ok(count)
}
}

backend_fn! {
/// Allocates the next receipt number for a year.
///
/// Receipt numbers look like `TRX-2026-000042`. The sequence restarts every
/// year and continues from the highest number already stored.
///
/// # Errors
///
/// Returns `UniqueViolation` once the year has used
/// [`RECEIPT_SEQUENCE_MAX`], or an error if the query fails or the stored
/// maximum is malformed.
pub fn next_receipt_number(conn: &mut _, year: i32) -> Result<String, PersistenceError> {
    let prefix: String = format!("{RECEIPT_PREFIX}-{year}-");

    let highest: Option<String> = donation_transactions::table
        .filter(donation_transactions::receipt_number.like(format!("{prefix}%")))
        .select(diesel::dsl::max(donation_transactions::receipt_number))
        .first(conn)?;

    let next: u32 = match highest {
        Some(receipt) => {
            let sequence: u32 = receipt
                .strip_prefix(&prefix)
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(|| {
                    PersistenceError::CorruptValue(format!("receipt number '{receipt}'"))
                })?;
            if sequence >= RECEIPT_SEQUENCE_MAX {
                return Err(PersistenceError::UniqueViolation(format!(
                    "receipt numbers for {year} are exhausted at {receipt}"
                )));
            }
            sequence + 1
        }
        None => 1,
    };

    Ok(format!("{prefix}{next:06}"))
}
}
