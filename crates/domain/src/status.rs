// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;

/// Validation status of a donation transaction.
///
/// Transactions are recorded as `Pending` and decided once by a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded, awaiting validation.
    #[default]
    Pending,
    /// Confirmed by a validator.
    Valid,
    /// Rejected by a validator.
    Rejected,
}

impl TransactionStatus {
    /// Converts this status to its stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether a validator has already decided this transaction.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        matches!(self, Self::Valid | Self::Rejected)
    }

    /// Checks whether a status change is permitted.
    ///
    /// Only `Pending -> Valid` and `Pending -> Rejected` are allowed.
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Valid) | (Self::Pending, Self::Rejected)
        )
    }
}

impl FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "valid" => Ok(Self::Valid),
            "rejected" => Ok(Self::Rejected),
            _ => Err(DomainError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
