// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Donation program and payment method queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{DonationProgram, PaymentMethod, Rate};
use tracing::debug;

use crate::diesel_schema::{donation_programs, donation_transactions, payment_methods};
use crate::error::PersistenceError;

/// Diesel Queryable struct for program rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = donation_programs)]
struct ProgramRow {
    program_id: i64,
    code: String,
    name: String,
    description: Option<String>,
    rate: String,
    is_active: i32,
}

impl ProgramRow {
    fn into_domain(self) -> Result<DonationProgram, PersistenceError> {
        Ok(DonationProgram {
            program_id: Some(self.program_id),
            code: self.code,
            name: self.name,
            description: self.description,
            rate: Rate::parse(&self.rate)?,
            is_active: self.is_active != 0,
        })
    }
}

/// Diesel Queryable struct for payment method rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = payment_methods)]
struct PaymentMethodRow {
    payment_method_id: i64,
    name: String,
    account_number: Option<String>,
    is_active: i32,
}

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(row: PaymentMethodRow) -> Self {
        Self {
            payment_method_id: Some(row.payment_method_id),
            name: row.name,
            account_number: row.account_number,
            is_active: row.is_active != 0,
        }
    }
}

backend_fn! {
/// Retrieves a donation program by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored rate is corrupt.
/// Returns `Ok(None)` if the program is not found.
pub fn get_program(
    conn: &mut _,
    program_id: i64,
) -> Result<Option<DonationProgram>, PersistenceError> {
    let result: Result<ProgramRow, diesel::result::Error> = donation_programs::table
        .filter(donation_programs::program_id.eq(program_id))
        .select(ProgramRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(row.into_domain()?)),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists donation programs ordered by code.
///
/// # Errors
///
/// Returns an error if the query fails or a stored rate is corrupt.
pub fn list_programs(conn: &mut _) -> Result<Vec<DonationProgram>, PersistenceError> {
    debug!("Listing donation programs");

    let rows: Vec<ProgramRow> = donation_programs::table
        .select(ProgramRow::as_select())
        .order(donation_programs::code.asc())
        .load(conn)?;

    rows.into_iter().map(ProgramRow::into_domain).collect()
}
}

backend_fn! {
/// Checks whether a program code is taken.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn program_code_exists(
    conn: &mut _,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<bool, PersistenceError> {
    let mut query = donation_programs::table
        .filter(donation_programs::code.eq(code))
        .into_boxed();

    if let Some(id) = exclude_id {
        query = query.filter(donation_programs::program_id.ne(id));
    }

    let count = query.count().get_result::<i64>(conn)?;
    Ok(count > 0)
}
}

backend_fn! {
/// Counts the transactions recorded against a program.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_program_transactions(conn: &mut _, program_id: i64) -> Result<i64, PersistenceError> {
    let count: i64 = donation_transactions::table
        .filter(donation_transactions::program_id.eq(program_id))
        .count()
        .get_result(conn)?;
    Ok(count)
}
}

backend_fn! {
/// Retrieves a payment method by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the payment method is not found.
pub fn get_payment_method(
    conn: &mut _,
    payment_method_id: i64,
) -> Result<Option<PaymentMethod>, PersistenceError> {
    let result: Result<PaymentMethodRow, diesel::result::Error> = payment_methods::table
        .filter(payment_methods::payment_method_id.eq(payment_method_id))
        .select(PaymentMethodRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(PaymentMethod::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists payment methods ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_payment_methods(conn: &mut _) -> Result<Vec<PaymentMethod>, PersistenceError> {
    let rows: Vec<PaymentMethodRow> = payment_methods::table
        .select(PaymentMethodRow::as_select())
        .order(payment_methods::name.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(PaymentMethod::from).collect())
}
}

backend_fn! {
/// Checks whether a payment method name is taken.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn payment_method_name_exists(
    conn: &mut _,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, PersistenceError> {
    let mut query = payment_methods::table
        .filter(payment_methods::name.eq(name))
        .into_boxed();

    if let Some(id) = exclude_id {
        query = query.filter(payment_methods::payment_method_id.ne(id));
    }

    let count = query.count().get_result::<i64>(conn)?;
    Ok(count > 0)
}
}

backend_fn! {
/// Counts the transactions paid with a payment method.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_payment_method_transactions(
    conn: &mut _,
    payment_method_id: i64,
) -> Result<i64, PersistenceError> {
    let count: i64 = donation_transactions::table
        .filter(donation_transactions::payment_method_id.eq(payment_method_id))
        .count()
        .get_result(conn)?;
    Ok(count)
}
}
