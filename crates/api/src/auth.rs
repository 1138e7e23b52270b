// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization for donation tracking operators.
//!
//! Operators are the login accounts of the system. Each carries one role and,
//! for branch staff and volunteers, a binding to the branch or volunteer
//! record whose data it may touch.

use donation_domain::VisibilityScope;
use donation_persistence::{OperatorData, Persistence, PersistenceError, SessionData};
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, info, warn};

pub use crate::error::AuthError;

/// Operator roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Full authority: operators, master data, rate propagation.
    Admin,
    /// Decides pending transactions and sees every transaction.
    Validator,
    /// Works inside one branch: its teams, volunteers and transactions.
    BranchStaff,
    /// A field volunteer who records and sees only their own donations.
    Volunteer,
}

impl Role {
    /// Returns the stored name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Validator => "Validator",
            Self::BranchStaff => "BranchStaff",
            Self::Volunteer => "Volunteer",
        }
    }

    /// Parses a stored role name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Admin" => Some(Self::Admin),
            "Validator" => Some(Self::Validator),
            "BranchStaff" => Some(Self::BranchStaff),
            "Volunteer" => Some(Self::Volunteer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated operator with its role and bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The operator's database identifier.
    pub operator_id: i64,
    /// The operator's login name.
    pub login_name: String,
    /// The role assigned to this operator.
    pub role: Role,
    /// The branch a `BranchStaff` operator works in.
    pub branch_id: Option<i64>,
    /// The volunteer record a `Volunteer` operator logs in as.
    pub volunteer_id: Option<i64>,
}

impl AuthenticatedActor {
    /// Creates an actor without bindings.
    #[must_use]
    pub const fn new(operator_id: i64, login_name: String, role: Role) -> Self {
        Self {
            operator_id,
            login_name,
            role,
            branch_id: None,
            volunteer_id: None,
        }
    }

    /// Builds the actor for a stored operator.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the stored role is unknown.
    pub fn from_operator(operator: &OperatorData) -> Result<Self, AuthError> {
        let role: Role =
            Role::parse(&operator.role).ok_or_else(|| AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {}", operator.role),
            })?;

        Ok(Self {
            operator_id: operator.operator_id,
            login_name: operator.login_name.clone(),
            role,
            branch_id: operator.branch_id,
            volunteer_id: operator.volunteer_id,
        })
    }
}

/// Resolves which transactions an actor may see.
///
/// # Errors
///
/// Returns `AuthenticationFailed` when a branch staff or volunteer account
/// has lost its binding.
pub fn resolve_scope(actor: &AuthenticatedActor) -> Result<VisibilityScope, AuthError> {
    match actor.role {
        Role::Admin | Role::Validator => Ok(VisibilityScope::All),
        Role::BranchStaff => actor.branch_id.map(VisibilityScope::Branch).ok_or_else(|| {
            AuthError::AuthenticationFailed {
                reason: format!("Operator {} is not bound to a branch", actor.login_name),
            }
        }),
        Role::Volunteer => actor
            .volunteer_id
            .map(VisibilityScope::Volunteer)
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: format!("Operator {} is not bound to a volunteer", actor.login_name),
            }),
    }
}

fn unauthorized(action: &str, required_role: &str) -> AuthError {
    AuthError::Unauthorized {
        action: String::from(action),
        required_role: String::from(required_role),
    }
}

/// Authorization service for checking role-based permissions.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Only admins manage operator accounts.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for every other role.
    pub fn authorize_manage_operators(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            _ => Err(unauthorized("manage_operators", "Admin")),
        }
    }

    /// Checks if an actor may create, edit or delete branches, programs and
    /// payment methods.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the actor is an admin.
    pub fn authorize_manage_master_data(
        actor: &AuthenticatedActor,
        action: &str,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            _ => Err(unauthorized(action, "Admin")),
        }
    }

    /// Checks if an actor may manage the teams and volunteers of a branch.
    ///
    /// Admins may touch any branch; branch staff only their own.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for validators, volunteers and branch staff of
    /// another branch.
    pub fn authorize_manage_branch_members(
        actor: &AuthenticatedActor,
        branch_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::BranchStaff if actor.branch_id == Some(branch_id) => Ok(()),
            Role::BranchStaff => Err(unauthorized(action, "BranchStaff of this branch")),
            Role::Validator | Role::Volunteer => Err(unauthorized(action, "Admin or BranchStaff")),
        }
    }

    /// Checks if an actor may record a donation collected by a volunteer.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for validators, branch staff outside the
    /// volunteer's branch, and volunteers recording for someone else.
    pub fn authorize_record_transaction(
        actor: &AuthenticatedActor,
        volunteer_id: i64,
        branch_id: i64,
    ) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::BranchStaff if actor.branch_id == Some(branch_id) => Ok(()),
            Role::Volunteer if actor.volunteer_id == Some(volunteer_id) => Ok(()),
            Role::BranchStaff => Err(unauthorized(
                "record_transaction",
                "BranchStaff of the volunteer's branch",
            )),
            Role::Volunteer => Err(unauthorized("record_transaction", "the same Volunteer")),
            Role::Validator => Err(unauthorized(
                "record_transaction",
                "Admin, BranchStaff or Volunteer",
            )),
        }
    }

    /// Checks if an actor may edit or delete a pending transaction.
    ///
    /// The operator who recorded it may always amend it while pending.
    /// Admins may amend any, branch staff those of their branch.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` otherwise.
    pub fn authorize_amend_transaction(
        actor: &AuthenticatedActor,
        recorded_by: i64,
        branch_id: i64,
        action: &str,
    ) -> Result<(), AuthError> {
        if actor.operator_id == recorded_by {
            return Ok(());
        }
        match actor.role {
            Role::Admin => Ok(()),
            Role::BranchStaff if actor.branch_id == Some(branch_id) => Ok(()),
            _ => Err(unauthorized(action, "Admin, BranchStaff or the recorder")),
        }
    }

    /// Checks if an actor may decide pending transactions.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the actor is an admin or validator.
    pub fn authorize_validate_transaction(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin | Role::Validator => Ok(()),
            _ => Err(unauthorized("validate_transaction", "Admin or Validator")),
        }
    }

    /// Checks if an actor may read summary reports and exports.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for volunteers.
    pub fn authorize_view_reports(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin | Role::Validator | Role::BranchStaff => Ok(()),
            Role::Volunteer => Err(unauthorized(
                "view_reports",
                "Admin, Validator or BranchStaff",
            )),
        }
    }

    /// Only admins may run rate propagation.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for every other role.
    pub fn authorize_propagate_rates(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            _ => Err(unauthorized("propagate_rates", "Admin")),
        }
    }
}

/// Authentication service for session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Session lifetime.
    const DEFAULT_SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Verifies credentials and opens a session.
    ///
    /// Unknown logins and wrong passwords produce the same message.
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `operator_data`)
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for bad credentials, disabled
    /// operators, or database failures.
    pub fn login(
        persistence: &mut Persistence,
        login_name: &str,
        password: &str,
    ) -> Result<(String, AuthenticatedActor, OperatorData), AuthError> {
        let operator: OperatorData = persistence
            .get_operator_by_login(login_name)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                warn!(login_name, "Login attempt for unknown operator");
                Self::invalid_credentials()
            })?;

        let password_valid: bool = persistence
            .verify_password(password, &operator.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_valid {
            warn!(login_name = %operator.login_name, "Login attempt with wrong password");
            return Err(Self::invalid_credentials());
        }

        if operator.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_operator(&operator)?;
        resolve_scope(&actor)?;

        let purged: usize = persistence
            .delete_expired_sessions()
            .map_err(Self::map_persistence_error)?;
        debug!(purged, "Purged expired sessions before login");

        let session_token: String = Self::generate_session_token();
        let expires_at: String =
            Self::format_timestamp(OffsetDateTime::now_utc() + Self::DEFAULT_SESSION_EXPIRATION)?;

        persistence
            .create_session(&session_token, operator.operator_id, &expires_at)
            .map_err(Self::map_persistence_error)?;
        persistence
            .update_last_login(operator.operator_id)
            .map_err(Self::map_persistence_error)?;

        info!(
            operator_id = operator.operator_id,
            login_name = %operator.login_name,
            role = %actor.role,
            "Operator logged in"
        );

        Ok((session_token, actor, operator))
    }

    /// Validates a session token and refreshes its activity timestamp.
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_actor`, `operator_data`)
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the session is unknown or expired,
    /// or the operator is gone or disabled.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<(AuthenticatedActor, OperatorData), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = Self::parse_timestamp(&session.expires_at)?;
        if OffsetDateTime::now_utc() > expires_at {
            debug!(session_id = session.session_id, "Rejecting expired session");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let operator: OperatorData = persistence
            .get_operator_by_id(session.operator_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Operator not found"),
            })?;

        if operator.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator is disabled"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_operator(&operator)?;

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        Ok((actor, operator))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be deleted.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })?;

        Ok(())
    }

    /// Generates an opaque 256-bit bearer token.
    fn generate_session_token() -> String {
        format!(
            "{:032x}{:032x}",
            rand::random::<u128>(),
            rand::random::<u128>()
        )
    }

    /// Session timestamps share the `CURRENT_TIMESTAMP` layout so that
    /// expiry can also be compared in SQL.
    fn format_timestamp(value: OffsetDateTime) -> Result<String, AuthError> {
        value
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to format expiration time: {e}"),
            })
    }

    fn parse_timestamp(value: &str) -> Result<OffsetDateTime, AuthError> {
        PrimitiveDateTime::parse(
            value,
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        )
            .map(PrimitiveDateTime::assume_utc)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })
    }

    fn invalid_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid login name or password"),
        }
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::AuthenticationFailed {
            reason: format!("Database error: {err}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_stored_name() {
        for role in [
            Role::Admin,
            Role::Validator,
            Role::BranchStaff,
            Role::Volunteer,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("Treasurer"), None);
    }

    #[test]
    fn test_session_timestamps_use_sql_layout() {
        let formatted: String =
            AuthenticationService::format_timestamp(time::macros::datetime!(2026-03-01 08:05:09 UTC))
                .unwrap();
        assert_eq!(formatted, "2026-03-01 08:05:09");

        let parsed: OffsetDateTime = AuthenticationService::parse_timestamp(&formatted).unwrap();
        assert_eq!(parsed, time::macros::datetime!(2026-03-01 08:05:09 UTC));
    }

    #[test]
    fn test_session_tokens_are_unique_hex() {
        let a: String = AuthenticationService::generate_session_token();
        let b: String = AuthenticationService::generate_session_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
