// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Branch, team and volunteer queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use donation_domain::{Branch, Team, Volunteer};
use tracing::debug;

use crate::diesel_schema::{branches, donation_transactions, operators, teams, volunteers};
use crate::error::PersistenceError;

/// Diesel Queryable struct for branch rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = branches)]
struct BranchRow {
    branch_id: i64,
    code: String,
    name: String,
    address: Option<String>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            branch_id: Some(row.branch_id),
            code: row.code,
            name: row.name,
            address: row.address,
        }
    }
}

/// Diesel Queryable struct for team rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = teams)]
struct TeamRow {
    team_id: i64,
    branch_id: i64,
    name: String,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Self {
            team_id: Some(row.team_id),
            branch_id: row.branch_id,
            name: row.name,
        }
    }
}

/// Diesel Queryable struct for volunteer rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = volunteers)]
struct VolunteerRow {
    volunteer_id: i64,
    team_id: i64,
    branch_id: i64,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    is_active: i32,
}

impl From<VolunteerRow> for Volunteer {
    fn from(row: VolunteerRow) -> Self {
        Self {
            volunteer_id: Some(row.volunteer_id),
            team_id: row.team_id,
            branch_id: row.branch_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            is_active: row.is_active != 0,
        }
    }
}

backend_fn! {
/// Retrieves a branch by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the branch is not found.
pub fn get_branch(conn: &mut _, branch_id: i64) -> Result<Option<Branch>, PersistenceError> {
    let result: Result<BranchRow, diesel::result::Error> = branches::table
        .filter(branches::branch_id.eq(branch_id))
        .select(BranchRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(Branch::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists all branches ordered by code.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_branches(conn: &mut _) -> Result<Vec<Branch>, PersistenceError> {
    debug!("Listing branches");

    let rows: Vec<BranchRow> = branches::table
        .select(BranchRow::as_select())
        .order(branches::code.asc())
        .load(conn)?;

    Ok(rows.into_iter().map(Branch::from).collect())
}
}

backend_fn! {
/// Checks whether a branch code is taken.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `code` - The normalized branch code
/// * `exclude_id` - A branch to ignore, used when renaming
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn branch_code_exists(
    conn: &mut _,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<bool, PersistenceError> {
    let mut query = branches::table
        .filter(branches::code.eq(code))
        .into_boxed();

    if let Some(id) = exclude_id {
        query = query.filter(branches::branch_id.ne(id));
    }

    let count = query.count().get_result::<i64>(conn)?;
    Ok(count > 0)
}
}

backend_fn! {
/// Counts the rows that keep a branch from being deleted.
///
/// Teams, transactions and operators bound to the branch all count.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_branch_dependents(conn: &mut _, branch_id: i64) -> Result<i64, PersistenceError> {
    let team_count: i64 = teams::table
        .filter(teams::branch_id.eq(branch_id))
        .count()
        .get_result(conn)?;
    let transaction_count: i64 = donation_transactions::table
        .filter(donation_transactions::branch_id.eq(branch_id))
        .count()
        .get_result(conn)?;
    let operator_count: i64 = operators::table
        .filter(operators::branch_id.eq(branch_id))
        .count()
        .get_result(conn)?;

    Ok(team_count + transaction_count + operator_count)
}
}

backend_fn! {
/// Retrieves a team by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the team is not found.
pub fn get_team(conn: &mut _, team_id: i64) -> Result<Option<Team>, PersistenceError> {
    let result: Result<TeamRow, diesel::result::Error> = teams::table
        .filter(teams::team_id.eq(team_id))
        .select(TeamRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(Team::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists teams, optionally restricted to one branch.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_teams(conn: &mut _, branch_id: Option<i64>) -> Result<Vec<Team>, PersistenceError> {
    let mut query = teams::table
        .select(TeamRow::as_select())
        .order((teams::branch_id.asc(), teams::name.asc()))
        .into_boxed();

    if let Some(id) = branch_id {
        query = query.filter(teams::branch_id.eq(id));
    }

    let rows: Vec<TeamRow> = query.load(conn)?;
    Ok(rows.into_iter().map(Team::from).collect())
}
}

backend_fn! {
/// Checks whether a team name is taken inside a branch.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn team_name_exists(
    conn: &mut _,
    branch_id: i64,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, PersistenceError> {
    let mut query = teams::table
        .filter(teams::branch_id.eq(branch_id))
        .filter(teams::name.eq(name))
        .into_boxed();

    if let Some(id) = exclude_id {
        query = query.filter(teams::team_id.ne(id));
    }

    let count = query.count().get_result::<i64>(conn)?;
    Ok(count > 0)
}
}

backend_fn! {
/// Counts the volunteers assigned to a team.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_team_volunteers(conn: &mut _, team_id: i64) -> Result<i64, PersistenceError> {
    let count: i64 = volunteers::table
        .filter(volunteers::team_id.eq(team_id))
        .count()
        .get_result(conn)?;
    Ok(count)
}
}

backend_fn! {
/// Retrieves a volunteer by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the volunteer is not found.
pub fn get_volunteer(
    conn: &mut _,
    volunteer_id: i64,
) -> Result<Option<Volunteer>, PersistenceError> {
    let result: Result<VolunteerRow, diesel::result::Error> = volunteers::table
        .filter(volunteers::volunteer_id.eq(volunteer_id))
        .select(VolunteerRow::as_select())
        .first(conn);

    match result {
        Ok(row) => Ok(Some(Volunteer::from(row))),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists volunteers ordered by name, optionally by branch and team.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_volunteers(
    conn: &mut _,
    branch_id: Option<i64>,
    team_id: Option<i64>,
) -> Result<Vec<Volunteer>, PersistenceError> {
    let mut query = volunteers::table
        .select(VolunteerRow::as_select())
        .order((volunteers::name.asc(), volunteers::volunteer_id.asc()))
        .into_boxed();

    if let Some(id) = branch_id {
        query = query.filter(volunteers::branch_id.eq(id));
    }
    if let Some(id) = team_id {
        query = query.filter(volunteers::team_id.eq(id));
    }

    let rows: Vec<VolunteerRow> = query.load(conn)?;
    Ok(rows.into_iter().map(Volunteer::from).collect())
}
}

backend_fn! {
/// Counts the rows that keep a volunteer from being deleted.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_volunteer_dependents(
    conn: &mut _,
    volunteer_id: i64,
) -> Result<i64, PersistenceError> {
    let transaction_count: i64 = donation_transactions::table
        .filter(donation_transactions::volunteer_id.eq(volunteer_id))
        .count()
        .get_result(conn)?;
    let operator_count: i64 = operators::table
        .filter(operators::volunteer_id.eq(volunteer_id))
        .count()
        .get_result(conn)?;
    Ok(transaction_count + operator_count)
}
}
