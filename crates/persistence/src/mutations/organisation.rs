// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Branch, team and volunteer mutations.
//!
//! Delete functions here remove the row unconditionally; the dependency
//! checks that guard them live in the `Persistence` adapter.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{Branch, Team, Volunteer};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{branches, teams, volunteers};
use crate::error::PersistenceError;

/// Maps "no row touched" to a not-found error.
pub(crate) fn expect_one_row(
    rows_affected: usize,
    entity: &str,
    id: i64,
) -> Result<(), PersistenceError> {
    if rows_affected == 0 {
        return Err(PersistenceError::NotFound(format!(
            "{entity} with ID {id} not found"
        )));
    }
    Ok(())
}

backend_fn! {
/// Inserts a branch and returns its ID.
///
/// # Errors
///
/// Returns `UniqueViolation` if the code is taken, or a database error.
pub fn insert_branch(conn: &mut _, branch: &Branch) -> Result<i64, PersistenceError> {
    diesel::insert_into(branches::table)
        .values((
            branches::code.eq(&branch.code),
            branches::name.eq(&branch.name),
            branches::address.eq(branch.address.as_deref()),
        ))
        .execute(conn)?;

    let branch_id: i64 = conn.get_last_insert_rowid()?;
    info!(branch_id, code = %branch.code, "Created branch");
    Ok(branch_id)
}
}

backend_fn! {
/// Updates a branch's code, name and address.
///
/// # Errors
///
/// Returns `NotFound` if the branch does not exist, or a database error.
pub fn update_branch(conn: &mut _, branch_id: i64, branch: &Branch) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(branches::table)
        .filter(branches::branch_id.eq(branch_id))
        .set((
            branches::code.eq(&branch.code),
            branches::name.eq(&branch.name),
            branches::address.eq(branch.address.as_deref()),
        ))
        .execute(conn)?;

    expect_one_row(rows_affected, "Branch", branch_id)?;
    info!(branch_id, "Updated branch");
    Ok(())
}
}

backend_fn! {
/// Deletes a branch.
///
/// # Errors
///
/// Returns `NotFound` if the branch does not exist, or a database error.
pub fn delete_branch(conn: &mut _, branch_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(branches::table)
        .filter(branches::branch_id.eq(branch_id))
        .execute(conn)?;

    expect_one_row(rows_affected, "Branch", branch_id)?;
    info!(branch_id, "Deleted branch");
    Ok(())
}
}

backend_fn! {
/// Inserts a team and returns its ID.
///
/// # Errors
///
/// Returns `UniqueViolation` if the name is taken in the branch,
/// `ForeignKeyViolation` if the branch does not exist, or a database error.
pub fn insert_team(conn: &mut _, team: &Team) -> Result<i64, PersistenceError> {
    diesel::insert_into(teams::table)
        .values((
            teams::branch_id.eq(team.branch_id),
            teams::name.eq(&team.name),
        ))
        .execute(conn)?;

    let team_id: i64 = conn.get_last_insert_rowid()?;
    info!(team_id, branch_id = team.branch_id, "Created team");
    Ok(team_id)
}
}

backend_fn! {
/// Renames a team.
///
/// Teams never change branch; volunteers would silently follow otherwise.
///
/// # Errors
///
/// Returns `NotFound` if the team does not exist, or a database error.
pub fn update_team(conn: &mut _, team_id: i64, name: &str) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(teams::table)
        .filter(teams::team_id.eq(team_id))
        .set(teams::name.eq(name))
        .execute(conn)?;

    expect_one_row(rows_affected, "Team", team_id)?;
    info!(team_id, "Updated team");
    Ok(())
}
}

backend_fn! {
/// Deletes a team.
///
/// # Errors
///
/// Returns `NotFound` if the team does not exist, or a database error.
pub fn delete_team(conn: &mut _, team_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(teams::table)
        .filter(teams::team_id.eq(team_id))
        .execute(conn)?;

    expect_one_row(rows_affected, "Team", team_id)?;
    info!(team_id, "Deleted team");
    Ok(())
}
}

backend_fn! {
/// Inserts a volunteer and returns its ID.
///
/// # Errors
///
/// Returns `ForeignKeyViolation` if the team or branch does not exist, or a
/// database error.
pub fn insert_volunteer(conn: &mut _, volunteer: &Volunteer) -> Result<i64, PersistenceError> {
    diesel::insert_into(volunteers::table)
        .values((
            volunteers::team_id.eq(volunteer.team_id),
            volunteers::branch_id.eq(volunteer.branch_id),
            volunteers::name.eq(&volunteer.name),
            volunteers::phone.eq(volunteer.phone.as_deref()),
            volunteers::email.eq(volunteer.email.as_deref()),
            volunteers::is_active.eq(i32::from(volunteer.is_active)),
        ))
        .execute(conn)?;

    let volunteer_id: i64 = conn.get_last_insert_rowid()?;
    info!(volunteer_id, team_id = volunteer.team_id, "Created volunteer");
    Ok(volunteer_id)
}
}

backend_fn! {
/// Updates a volunteer, including its team and branch.
///
/// Transactions already recorded keep the branch they were recorded in.
///
/// # Errors
///
/// Returns `NotFound` if the volunteer does not exist, or a database error.
pub fn update_volunteer(
    conn: &mut _,
    volunteer_id: i64,
    volunteer: &Volunteer,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(volunteers::table)
        .filter(volunteers::volunteer_id.eq(volunteer_id))
        .set((
            volunteers::team_id.eq(volunteer.team_id),
            volunteers::branch_id.eq(volunteer.branch_id),
            volunteers::name.eq(&volunteer.name),
            volunteers::phone.eq(volunteer.phone.as_deref()),
            volunteers::email.eq(volunteer.email.as_deref()),
            volunteers::is_active.eq(i32::from(volunteer.is_active)),
        ))
        .execute(conn)?;

    expect_one_row(rows_affected, "Volunteer", volunteer_id)?;
    info!(volunteer_id, "Updated volunteer");
    Ok(())
}
}

backend_fn! {
/// Activates or deactivates a volunteer.
///
/// # Errors
///
/// Returns `NotFound` if the volunteer does not exist, or a database error.
pub fn set_volunteer_active(
    conn: &mut _,
    volunteer_id: i64,
    is_active: bool,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(volunteers::table)
        .filter(volunteers::volunteer_id.eq(volunteer_id))
        .set(volunteers::is_active.eq(i32::from(is_active)))
        .execute(conn)?;

    expect_one_row(rows_affected, "Volunteer", volunteer_id)?;
    info!(volunteer_id, is_active, "Changed volunteer activity");
    Ok(())
}
}

backend_fn! {
/// Deletes a volunteer.
///
/// # Errors
///
/// Returns `NotFound` if the volunteer does not exist, or a database error.
pub fn delete_volunteer(conn: &mut _, volunteer_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(volunteers::table)
        .filter(volunteers::volunteer_id.eq(volunteer_id))
        .execute(conn)?;

    expect_one_row(rows_affected, "Volunteer", volunteer_id)?;
    info!(volunteer_id, "Deleted volunteer");
    Ok(())
}
}
