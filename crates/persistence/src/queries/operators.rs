// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator and session queries.
//!
//! Operators are the login accounts of the dashboard. An operator's role and
//! its optional branch or volunteer binding decide what the operator sees.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::debug;

use crate::data_models::{OperatorData, SessionData};
use crate::diesel_schema::{donation_transactions, operators, sessions};
use crate::error::PersistenceError;

#[derive(Queryable, Selectable)]
#[diesel(table_name = operators)]
struct OperatorRow {
    operator_id: i64,
    login_name: String,
    display_name: String,
    password_hash: String,
    role: String,
    branch_id: Option<i64>,
    volunteer_id: Option<i64>,
    is_disabled: i32,
    created_at: String,
    disabled_at: Option<String>,
    last_login_at: Option<String>,
}

impl From<OperatorRow> for OperatorData {
    fn from(row: OperatorRow) -> Self {
        Self {
            operator_id: row.operator_id,
            login_name: row.login_name,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role: row.role,
            branch_id: row.branch_id,
            volunteer_id: row.volunteer_id,
            is_disabled: row.is_disabled != 0,
            created_at: row.created_at,
            disabled_at: row.disabled_at,
            last_login_at: row.last_login_at,
        }
    }
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = sessions)]
struct SessionRow {
    session_id: i64,
    session_token: String,
    operator_id: i64,
    created_at: String,
    last_activity_at: String,
    expires_at: String,
}

impl From<SessionRow> for SessionData {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            session_token: row.session_token,
            operator_id: row.operator_id,
            created_at: row.created_at,
            last_activity_at: row.last_activity_at,
            expires_at: row.expires_at,
        }
    }
}

backend_fn! {
/// Finds the operator a login form refers to.
///
/// Login names are stored uppercase, so `admin` and `ADMIN` find the same
/// operator.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_operator_by_login(
    conn: &mut _,
    login_name: &str,
) -> Result<Option<OperatorData>, PersistenceError> {
    let login_key: String = login_name.to_uppercase();
    debug!(login_name = %login_key, "Operator lookup by login");

    let row: Option<OperatorRow> = operators::table
        .filter(operators::login_name.eq(&login_key))
        .select(OperatorRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(OperatorData::from))
}
}

backend_fn! {
/// Loads one operator.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_operator_by_id(
    conn: &mut _,
    operator_id: i64,
) -> Result<Option<OperatorData>, PersistenceError> {
    debug!(operator_id, "Operator lookup by id");

    let row: Option<OperatorRow> = operators::table
        .find(operator_id)
        .select(OperatorRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(OperatorData::from))
}
}

backend_fn! {
/// Resolves a bearer token to its session row, expired or not.
///
/// Expiry is judged by the caller.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_session_by_token(
    conn: &mut _,
    session_token: &str,
) -> Result<Option<SessionData>, PersistenceError> {
    let row: Option<SessionRow> = sessions::table
        .filter(sessions::session_token.eq(session_token))
        .select(SessionRow::as_select())
        .first(conn)
        .optional()?;

    Ok(row.map(SessionData::from))
}
}

backend_fn! {
/// Whether any donation names this operator as recorder or validator.
///
/// Such operators stay in the table so the donation history keeps its
/// authors; they are disabled instead of deleted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn is_operator_referenced(conn: &mut _, operator_id: i64) -> Result<bool, PersistenceError> {
    let donations: i64 = donation_transactions::table
        .filter(
            donation_transactions::recorded_by
                .eq(operator_id)
                .or(donation_transactions::validated_by.eq(operator_id)),
        )
        .count()
        .get_result(conn)?;

    debug!(operator_id, donations, "Operator donation references");
    Ok(donations > 0)
}
}

backend_fn! {
/// Every operator, ordered by login name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_operators(conn: &mut _) -> Result<Vec<OperatorData>, PersistenceError> {
    let rows: Vec<OperatorRow> = operators::table
        .select(OperatorRow::as_select())
        .order_by(operators::login_name.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(OperatorData::from).collect())
}
}

backend_fn! {
/// Number of operators of any role. Zero means the first admin has not
/// been created yet.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_operators(conn: &mut _) -> Result<i64, PersistenceError> {
    let total: i64 = operators::table.count().get_result(conn)?;
    Ok(total)
}
}

backend_fn! {
/// Number of admins that can still log in.
///
/// The last one of these must not be disabled or deleted.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_active_admin_operators(conn: &mut _) -> Result<i64, PersistenceError> {
    let admins: i64 = operators::table
        .filter(operators::role.eq("Admin"))
        .filter(operators::is_disabled.eq(0))
        .count()
        .get_result(conn)?;

    debug!(admins, "Active admins counted");
    Ok(admins)
}
}

/// Checks a login password against its bcrypt hash.
///
/// # Errors
///
/// Returns an error if the stored hash is not a valid bcrypt hash.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}
