// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Row-level visibility of donation transactions.

use serde::{Deserialize, Serialize};

/// Which transactions an operator may see.
///
/// The scope is resolved once per request from the operator's role and is
/// applied as a filter to every transaction read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VisibilityScope {
    /// Every transaction.
    All,
    /// Transactions recorded in one branch.
    Branch(i64),
    /// Transactions collected by one volunteer.
    Volunteer(i64),
}

impl VisibilityScope {
    /// Checks whether a transaction with the given owner is visible.
    #[must_use]
    pub const fn permits(&self, volunteer_id: i64, branch_id: i64) -> bool {
        match self {
            Self::All => true,
            Self::Branch(id) => *id == branch_id,
            Self::Volunteer(id) => *id == volunteer_id,
        }
    }

    /// Checks whether the whole branch is inside this scope.
    #[must_use]
    pub const fn covers_branch(&self, branch_id: i64) -> bool {
        match self {
            Self::All => true,
            Self::Branch(id) => *id == branch_id,
            Self::Volunteer(_) => false,
        }
    }
}

impl std::fmt::Display for VisibilityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Branch(id) => write!(f, "branch:{id}"),
            Self::Volunteer(id) => write!(f, "volunteer:{id}"),
        }
    }
}
