// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::status::TransactionStatus;

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A code (branch or program) is empty or malformed.
    InvalidCode(String),
    /// A name is empty or too long.
    InvalidName(String),
    /// A phone number is malformed.
    InvalidPhone(String),
    /// An email address is malformed.
    InvalidEmail(String),
    /// A donation amount is zero, negative, or too precise.
    InvalidAmount(String),
    /// An allocation rate is outside `[0, 100]` or too precise.
    InvalidRate(String),
    /// A status string is not one of `pending`, `valid`, `rejected`.
    InvalidStatus(String),
    /// A date string could not be parsed.
    DateParseError {
        /// The invalid date string.
        date_string: String,
        /// The parsing error message.
        error: String,
    },
    /// A date range has its start after its end.
    InvalidDateRange {
        /// Range start.
        from: time::Date,
        /// Range end.
        to: time::Date,
    },
    /// The requested status change is not permitted.
    InvalidStatusTransition {
        /// Current status.
        from: TransactionStatus,
        /// Requested status.
        to: TransactionStatus,
    },
    /// A decided transaction cannot be modified.
    TransactionAlreadyDecided {
        /// The transaction identifier.
        transaction_id: i64,
        /// Its current status.
        status: TransactionStatus,
    },
    /// Rejecting a transaction requires a reason.
    MissingRejectionReason,
    /// A money computation left the representable range.
    ArithmeticOverflow(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCode(msg) => write!(f, "Invalid code: {msg}"),
            Self::InvalidName(msg) => write!(f, "Invalid name: {msg}"),
            Self::InvalidPhone(msg) => write!(f, "Invalid phone: {msg}"),
            Self::InvalidEmail(msg) => write!(f, "Invalid email: {msg}"),
            Self::InvalidAmount(msg) => write!(f, "Invalid amount: {msg}"),
            Self::InvalidRate(msg) => write!(f, "Invalid rate: {msg}"),
            Self::InvalidStatus(value) => write!(
                f,
                "Invalid status '{value}'. Must be one of: pending, valid, rejected"
            ),
            Self::DateParseError { date_string, error } => {
                write!(f, "Failed to parse date '{date_string}': {error}")
            }
            Self::InvalidDateRange { from, to } => {
                write!(f, "Date range start {from} is after end {to}")
            }
            Self::InvalidStatusTransition { from, to } => {
                write!(f, "Cannot change transaction status from {from} to {to}")
            }
            Self::TransactionAlreadyDecided {
                transaction_id,
                status,
            } => write!(
                f,
                "Transaction {transaction_id} is already {status} and cannot be modified"
            ),
            Self::MissingRejectionReason => {
                write!(f, "A rejection reason is required when rejecting a transaction")
            }
            Self::ArithmeticOverflow(what) => write!(f, "Arithmetic overflow computing {what}"),
        }
    }
}

impl std::error::Error for DomainError {}
