// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation program and payment method mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{DonationProgram, PaymentMethod};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{donation_programs, payment_methods};
use crate::error::PersistenceError;
use crate::mutations::organisation::expect_one_row;

backend_fn! {
/// Inserts a donation program and returns its ID.
///
/// # Errors
///
/// Returns `UniqueViolation` if the code is taken, or a database error.
pub fn insert_program(conn: &mut _, program: &DonationProgram) -> Result<i64, PersistenceError> {
    diesel::insert_into(donation_programs::table)
        .values((
            donation_programs::code.eq(&program.code),
            donation_programs::name.eq(&program.name),
            donation_programs::description.eq(program.description.as_deref()),
            donation_programs::rate.eq(program.rate.to_string()),
            donation_programs::is_active.eq(i32::from(program.is_active)),
        ))
        .execute(conn)?;

    let program_id: i64 = conn.get_last_insert_rowid()?;
    info!(program_id, code = %program.code, rate = %program.rate, "Created donation program");
    Ok(program_id)
}
}

backend_fn! {
/// Updates a donation program.
///
/// Changing the rate here does not touch recorded transactions; that is
/// the job of rate propagation.
///
/// # Errors
///
/// Returns `NotFound` if the program does not exist, or a database error.
pub fn update_program(
    conn: &mut _,
    program_id: i64,
    program: &DonationProgram,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(donation_programs::table)
        .filter(donation_programs::program_id.eq(program_id))
        .set((
            donation_programs::code.eq(&program.code),
            donation_programs::name.eq(&program.name),
            donation_programs::description.eq(program.description.as_deref()),
            donation_programs::rate.eq(program.rate.to_string()),
            donation_programs::is_active.eq(i32::from(program.is_active)),
        ))
        .execute(conn)?;

    expect_one_row(rows_affected, "Program", program_id)?;
    info!(program_id, rate = %program.rate, "Updated donation program");
    Ok(())
}
}

backend_fn! {
/// Deletes a donation program.
///
/// # Errors
///
/// Returns `NotFound` if the program does not exist, or a database error.
pub fn delete_program(conn: &mut _, program_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(donation_programs::table)
        .filter(donation_programs::program_id.eq(program_id))
        .execute(conn)?;

    expect_one_row(rows_affected, "Program", program_id)?;
    info!(program_id, "Deleted donation program");
    Ok(())
}
}

backend_fn! {
/// Inserts a payment method and returns its ID.
///
/// # Errors
///
/// Returns `UniqueViolation` if the name is taken, or a database error.
pub fn insert_payment_method(
    conn: &mut _,
    method: &PaymentMethod,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(payment_methods::table)
        .values((
            payment_methods::name.eq(&method.name),
            payment_methods::account_number.eq(method.account_number.as_deref()),
            payment_methods::is_active.eq(i32::from(method.is_active)),
        ))
        .execute(conn)?;

    let payment_method_id: i64 = conn.get_last_insert_rowid()?;
    info!(payment_method_id, name = %method.name, "Created payment method");
    Ok(payment_method_id)
}
}

backend_fn! {
/// Updates a payment method.
///
/// # Errors
///
/// Returns `NotFound` if the payment method does not exist, or a database error.
pub fn update_payment_method(
    conn: &mut _,
    payment_method_id: i64,
    method: &PaymentMethod,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(payment_methods::table)
        .filter(payment_methods::payment_method_id.eq(payment_method_id))
        .set((
            payment_methods::name.eq(&method.name),
            payment_methods::account_number.eq(method.account_number.as_deref()),
            payment_methods::is_active.eq(i32::from(method.is_active)),
        ))
        .execute(conn)?;

    expect_one_row(rows_affected, "Payment method", payment_method_id)?;
    info!(payment_method_id, "Updated payment method");
    Ok(())
}
}

backend_fn! {
/// Deletes a payment method.
///
/// # Errors
///
/// Returns `NotFound` if the payment method does not exist, or a database error.
pub fn delete_payment_method(conn: &mut _, payment_method_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(payment_methods::table)
        .filter(payment_methods::payment_method_id.eq(payment_method_id))
        .execute(conn)?;

    expect_one_row(rows_affected, "Payment method", payment_method_id)?;
    info!(payment_method_id, "Deleted payment method");
    Ok(())
}
}
