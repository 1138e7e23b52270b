// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation transaction mutations.
//!
//! Edits, decisions and deletes all carry a `status = 'pending'` guard in
//! their `WHERE` clause, so a decided transaction is never rewritten even if
//! two validators race.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{DonationTransaction, TransactionStatus, format_date};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::donation_transactions;
use crate::error::PersistenceError;

/// Status value stored for undecided transactions.
const PENDING: &str = "pending";

/// Maps "no pending row touched" to a not-found error.
fn expect_pending_row(rows_affected: usize, transaction_id: i64) -> Result<(), PersistenceError> {
    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Pending transaction with ID {transaction_id} not found"
        )));
    }
    Ok(())
}

backend_fn! {
/// Inserts a new transaction and returns its ID.
///
/// # Errors
///
/// Returns `UniqueViolation` for a duplicate receipt number,
/// `ForeignKeyViolation` for a dangling reference, or a database error.
pub fn insert_transaction(
    conn: &mut _,
    transaction: &DonationTransaction,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(donation_transactions::table)
        .values((
            donation_transactions::receipt_number.eq(&transaction.receipt_number),
            donation_transactions::volunteer_id.eq(transaction.volunteer_id),
            donation_transactions::branch_id.eq(transaction.branch_id),
            donation_transactions::program_id.eq(transaction.program_id),
            donation_transactions::payment_method_id.eq(transaction.payment_method_id),
            donation_transactions::donor_name.eq(&transaction.donor_name),
            donation_transactions::donor_phone.eq(transaction.donor_phone.as_deref()),
            donation_transactions::amount.eq(transaction.amount.to_string()),
            donation_transactions::rate.eq(transaction.rate.to_string()),
            donation_transactions::allocation.eq(transaction.allocation.to_string()),
            donation_transactions::donated_on.eq(format_date(transaction.donated_on)),
            donation_transactions::status.eq(transaction.status.as_str()),
            donation_transactions::notes.eq(transaction.notes.as_deref()),
            donation_transactions::recorded_by.eq(transaction.recorded_by),
        ))
        .execute(conn)?;

    let transaction_id: i64 = conn.get_last_insert_rowid()?;
    info!(
        transaction_id,
        receipt_number = %transaction.receipt_number,
        volunteer_id = transaction.volunteer_id,
        amount = %transaction.amount,
        "Recorded donation transaction"
    );
    Ok(transaction_id)
}
}

backend_fn! {
/// Rewrites the editable fields of a pending transaction.
///
/// # Errors
///
/// Returns `NotFound` if no pending transaction has this ID, or a database
/// error.
pub fn update_transaction(
    conn: &mut _,
    transaction_id: i64,
    transaction: &DonationTransaction,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(donation_transactions::table)
        .filter(donation_transactions::transaction_id.eq(transaction_id))
        .filter(donation_transactions::status.eq(PENDING))
        .set((
            donation_transactions::program_id.eq(transaction.program_id),
            donation_transactions::payment_method_id.eq(transaction.payment_method_id),
            donation_transactions::donor_name.eq(&transaction.donor_name),
            donation_transactions::donor_phone.eq(transaction.donor_phone.as_deref()),
            donation_transactions::amount.eq(transaction.amount.to_string()),
            donation_transactions::rate.eq(transaction.rate.to_string()),
            donation_transactions::allocation.eq(transaction.allocation.to_string()),
            donation_transactions::donated_on.eq(format_date(transaction.donated_on)),
            donation_transactions::notes.eq(transaction.notes.as_deref()),
            donation_transactions::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    expect_pending_row(rows_affected, transaction_id)?;
    info!(transaction_id, "Updated donation transaction");
    Ok(())
}
}

backend_fn! {
/// Records a validator's decision on a pending transaction.
///
/// # Errors
///
/// Returns `NotFound` if no pending transaction has this ID, or a database
/// error.
pub fn set_transaction_status(
    conn: &mut _,
    transaction_id: i64,
    status: TransactionStatus,
    validated_by: i64,
    rejection_reason: Option<&str>,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(donation_transactions::table)
        .filter(donation_transactions::transaction_id.eq(transaction_id))
        .filter(donation_transactions::status.eq(PENDING))
        .set((
            donation_transactions::status.eq(status.as_str()),
            donation_transactions::validated_by.eq(Some(validated_by)),
            donation_transactions::validated_at.eq(sql::<Nullable<Text>>("CURRENT_TIMESTAMP")),
            donation_transactions::rejection_reason.eq(rejection_reason),
            donation_transactions::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    expect_pending_row(rows_affected, transaction_id)?;
    info!(transaction_id, %status, validated_by, "Decided donation transaction");
    Ok(())
}
}

backend_fn! {
/// Deletes a pending transaction.
///
/// # Errors
///
/// Returns `NotFound` if no pending transaction has this ID, or a database
/// error.
pub fn delete_transaction(conn: &mut _, transaction_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(donation_transactions::table)
        .filter(donation_transactions::transaction_id.eq(transaction_id))
        .filter(donation_transactions::status.eq(PENDING))
        .execute(conn)?;

    expect_pending_row(rows_affected, transaction_id)?;
    info!(transaction_id, "Deleted donation transaction");
    Ok(())
}
}
