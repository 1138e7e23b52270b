// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use donation_domain::DomainError;
use donation_persistence::PersistenceError;

use crate::password_policy::PasswordPolicyError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain and persistence errors and represent the
/// API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// The request clashes with existing data.
    Conflict {
        /// The type of resource involved.
        resource_type: String,
        /// A human-readable description of the clash.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} conflict: {message}")
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidCode(msg) => ApiError::InvalidInput {
            field: String::from("code"),
            message: msg,
        },
        DomainError::InvalidName(msg) => ApiError::InvalidInput {
            field: String::from("name"),
            message: msg,
        },
        DomainError::InvalidPhone(msg) => ApiError::InvalidInput {
            field: String::from("phone"),
            message: msg,
        },
        DomainError::InvalidEmail(msg) => ApiError::InvalidInput {
            field: String::from("email"),
            message: msg,
        },
        DomainError::InvalidAmount(msg) => ApiError::InvalidInput {
            field: String::from("amount"),
            message: msg,
        },
        DomainError::InvalidRate(msg) => ApiError::InvalidInput {
            field: String::from("rate"),
            message: msg,
        },
        DomainError::InvalidStatus(value) => ApiError::InvalidInput {
            field: String::from("status"),
            message: format!("Invalid status '{value}'. Must be one of: pending, valid, rejected"),
        },
        DomainError::DateParseError { date_string, error } => ApiError::InvalidInput {
            field: String::from("date"),
            message: format!("Failed to parse date '{date_string}': {error}"),
        },
        DomainError::InvalidDateRange { from, to } => ApiError::InvalidInput {
            field: String::from("date_from"),
            message: format!("Date range start {from} is after end {to}"),
        },
        DomainError::InvalidStatusTransition { from, to } => ApiError::DomainRuleViolation {
            rule: String::from("status_transition"),
            message: format!("Cannot change transaction status from {from} to {to}"),
        },
        DomainError::TransactionAlreadyDecided {
            transaction_id,
            status,
        } => ApiError::DomainRuleViolation {
            rule: String::from("transaction_decided"),
            message: format!("Transaction {transaction_id} is already {status}"),
        },
        DomainError::MissingRejectionReason => ApiError::InvalidInput {
            field: String::from("reason"),
            message: String::from("A rejection requires a reason"),
        },
        DomainError::ArithmeticOverflow(what) => ApiError::Internal {
            message: format!("Arithmetic overflow computing {what}"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Constraint failures become conflicts; anything unexpected is internal.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::NotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Record"),
            message: msg,
        },
        PersistenceError::OperatorNotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Operator"),
            message: msg,
        },
        PersistenceError::UniqueViolation(msg) => ApiError::Conflict {
            resource_type: String::from("Record"),
            message: format!("Duplicate value: {msg}"),
        },
        PersistenceError::ForeignKeyViolation(msg) => ApiError::Conflict {
            resource_type: String::from("Record"),
            message: format!("Related record missing or still referenced: {msg}"),
        },
        PersistenceError::Referenced {
            entity,
            id,
            dependents,
        } => ApiError::Conflict {
            resource_type: String::from(entity),
            message: format!("{entity} {id} is still referenced by {dependents}"),
        },
        other => ApiError::Internal {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donation_domain::TransactionStatus;

    #[test]
    fn test_decided_transaction_is_a_rule_violation() {
        let err: ApiError = translate_domain_error(DomainError::TransactionAlreadyDecided {
            transaction_id: 7,
            status: TransactionStatus::Valid,
        });
        assert_eq!(
            err,
            ApiError::DomainRuleViolation {
                rule: String::from("transaction_decided"),
                message: String::from("Transaction 7 is already valid"),
            }
        );
    }

    #[test]
    fn test_referenced_delete_is_a_conflict() {
        let err: ApiError = translate_persistence_error(PersistenceError::Referenced {
            entity: "Branch",
            id: 3,
            dependents: "teams",
        });
        assert!(matches!(
            err,
            ApiError::Conflict { ref resource_type, .. } if resource_type == "Branch"
        ));
    }

    #[test]
    fn test_unexpected_database_error_is_internal() {
        let err: ApiError =
            translate_persistence_error(PersistenceError::DatabaseError(String::from("boom")));
        assert!(matches!(err, ApiError::Internal { .. }));
    }

    #[test]
    fn test_unauthorized_auth_error_keeps_details() {
        let err: ApiError = ApiError::from(AuthError::Unauthorized {
            action: String::from("propagate_rates"),
            required_role: String::from("Admin"),
        });
        assert_eq!(
            err.to_string(),
            "Unauthorized: 'propagate_rates' requires Admin role"
        );
    }
}
