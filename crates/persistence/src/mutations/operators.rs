// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator and session mutations.
//!
//! Passwords are hashed with bcrypt before they reach the database and login
//! names are stored uppercase so that lookups are case-insensitive.
//! Session timestamps are written by the database (`CURRENT_TIMESTAMP`, UTC)
//! so they compare directly against the stored `expires_at` text.

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};
use diesel::{MysqlConnection, SqliteConnection};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::NewOperator;
use crate::diesel_schema::{operators, sessions};
use crate::error::PersistenceError;

fn hash_password(password: &str) -> Result<String, PersistenceError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

backend_fn! {
/// Inserts a dashboard login.
///
/// Branch staff carry a `branch_id`, volunteers a `volunteer_id`; the
/// database rejects bindings to rows that do not exist.
///
/// # Errors
///
/// Returns an error if the password cannot be hashed, the login name is
/// taken, or a bound branch or volunteer does not exist.
pub fn create_operator(conn: &mut _, operator: &NewOperator<'_>) -> Result<i64, PersistenceError> {
    let login_key: String = operator.login_name.to_uppercase();
    let password_hash: String = hash_password(operator.password)?;

    diesel::insert_into(operators::table)
        .values((
            operators::login_name.eq(&login_key),
            operators::display_name.eq(operator.display_name),
            operators::password_hash.eq(&password_hash),
            operators::role.eq(operator.role),
            operators::branch_id.eq(operator.branch_id),
            operators::volunteer_id.eq(operator.volunteer_id),
        ))
        .execute(conn)?;

    let operator_id: i64 = conn.get_last_insert_rowid()?;

    info!(
        operator_id,
        login_name = %login_key,
        role = operator.role,
        branch_id = ?operator.branch_id,
        volunteer_id = ?operator.volunteer_id,
        "Operator account created"
    );
    Ok(operator_id)
}
}

backend_fn! {
/// Stamps `last_login_at` after a successful login.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_last_login(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    diesel::update(operators::table.find(operator_id))
        .set(operators::last_login_at.eq(sql::<Nullable<Text>>("CURRENT_TIMESTAMP")))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Blocks an operator from logging in. Its donations stay attributed to it.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn disable_operator(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    diesel::update(operators::table.find(operator_id))
        .set((
            operators::is_disabled.eq(1),
            operators::disabled_at.eq(sql::<Nullable<Text>>("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    info!(operator_id, "Operator disabled");
    Ok(())
}
}

backend_fn! {
/// Lets a disabled operator log in again.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn enable_operator(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    diesel::update(operators::table.find(operator_id))
        .set((
            operators::is_disabled.eq(0),
            operators::disabled_at.eq(None::<String>),
        ))
        .execute(conn)?;

    info!(operator_id, "Operator enabled");
    Ok(())
}
}

backend_fn! {
/// Removes an operator that never recorded or decided a donation.
///
/// Its sessions go with it through the foreign key cascade. Callers check
/// `is_operator_referenced` first.
///
/// # Errors
///
/// Returns `OperatorNotFound` if no row was deleted, or a database error.
pub fn delete_operator(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(operators::table.find(operator_id)).execute(conn)?;

    if deleted == 0 {
        return Err(PersistenceError::OperatorNotFound(format!(
            "Operator with ID {operator_id} not found"
        )));
    }

    info!(operator_id, "Operator deleted");
    Ok(())
}
}

backend_fn! {
/// Stores a freshly issued bearer token.
///
/// `expires_at` uses the `YYYY-MM-DD HH:MM:SS` UTC form.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_session(
    conn: &mut _,
    session_token: &str,
    operator_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::operator_id.eq(operator_id),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.get_last_insert_rowid()?;

    debug!(session_id, operator_id, expires_at, "Session issued");
    Ok(session_id)
}
}

backend_fn! {
/// Marks a session as used by the current request.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_session_activity(conn: &mut _, session_id: i64) -> Result<(), PersistenceError> {
    diesel::update(sessions::table.find(session_id))
        .set(sessions::last_activity_at.eq(sql::<Text>("CURRENT_TIMESTAMP")))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Logs a token out. Unknown tokens are ignored.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_session(conn: &mut _, session_token: &str) -> Result<(), PersistenceError> {
    let removed: usize = diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    debug!(removed, "Session closed");
    Ok(())
}
}

backend_fn! {
/// Purges sessions whose `expires_at` has passed.
///
/// Runs at server start and before every login.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_expired_sessions(conn: &mut _) -> Result<usize, PersistenceError> {
    let purged: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(sql::<Text>("CURRENT_TIMESTAMP")))
        .execute(conn)?;

    debug!(purged, "Expired sessions removed");
    Ok(purged)
}
}

backend_fn! {
/// Replaces an operator's password hash.
///
/// Existing sessions are left alone; callers close them with
/// `delete_sessions_for_operator`.
///
/// # Errors
///
/// Returns an error if the password cannot be hashed or the update fails.
pub fn update_password(
    conn: &mut _,
    operator_id: i64,
    new_password: &str,
) -> Result<(), PersistenceError> {
    let password_hash: String = hash_password(new_password)?;

    diesel::update(operators::table.find(operator_id))
        .set(operators::password_hash.eq(&password_hash))
        .execute(conn)?;

    info!(operator_id, "Operator password replaced");
    Ok(())
}
}

backend_fn! {
/// Logs an operator out everywhere, e.g. after a password change or reset.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_sessions_for_operator(
    conn: &mut _,
    operator_id: i64,
) -> Result<usize, PersistenceError> {
    let closed: usize = diesel::delete(sessions::table)
        .filter(sessions::operator_id.eq(operator_id))
        .execute(conn)?;

    info!(operator_id, closed, "Operator sessions closed");
    Ok(closed)
}
}
