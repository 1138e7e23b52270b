// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use donation_domain::{TransactionStatus, VisibilityScope};
use serde::{Deserialize, Serialize};
use time::Date;

/// Operator (login account) as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorData {
    pub operator_id: i64,
    pub login_name: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub branch_id: Option<i64>,
    pub volunteer_id: Option<i64>,
    pub is_disabled: bool,
    pub created_at: String,
    pub disabled_at: Option<String>,
    pub last_login_at: Option<String>,
}

/// Fields needed to create an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOperator<'a> {
    pub login_name: &'a str,
    pub display_name: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub branch_id: Option<i64>,
    pub volunteer_id: Option<i64>,
}

/// Session as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub operator_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    pub expires_at: String,
}

/// Criteria for reading donation transactions.
///
/// `scope` is mandatory so no read path can forget the visibility rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    pub scope: VisibilityScope,
    pub status: Option<TransactionStatus>,
    pub program_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub volunteer_id: Option<i64>,
    pub payment_method_id: Option<i64>,
    /// Inclusive lower bound on `donated_on`.
    pub date_from: Option<Date>,
    /// Inclusive upper bound on `donated_on`.
    pub date_to: Option<Date>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionFilter {
    /// An unrestricted filter within the given scope.
    #[must_use]
    pub const fn scoped(scope: VisibilityScope) -> Self {
        Self {
            scope,
            status: None,
            program_id: None,
            branch_id: None,
            volunteer_id: None,
            payment_method_id: None,
            date_from: None,
            date_to: None,
            limit: None,
            offset: None,
        }
    }
}

/// Options for the rate propagation batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RatePropagationOptions {
    /// Restrict to a single program.
    pub program_id: Option<i64>,
    /// Leave validated and rejected transactions untouched.
    pub pending_only: bool,
    /// Count what would change without writing.
    pub dry_run: bool,
}

/// Outcome of a rate propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatePropagationReport {
    pub programs_scanned: u64,
    pub transactions_examined: u64,
    pub transactions_updated: u64,
    pub dry_run: bool,
}
