// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain types and rules for donation tracking.
//!
//! This crate owns the vocabulary shared by every other layer: organisational
//! structure (branches, teams, volunteers), donation programs with their
//! allocation rates, payment methods, and donation transactions. It performs
//! no I/O.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod error;
mod money;
mod report;
mod status;
mod types;
mod validation;
mod visibility;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use money::{Amount, MAX_AMOUNT, Rate};
pub use report::{SummaryBucket, SummaryRow, TransactionSummary, summarize};
pub use status::TransactionStatus;
pub use types::{
    Branch, DonationProgram, DonationTransaction, PaymentMethod, Team, TransactionDraft, Volunteer,
};
pub use validation::{
    format_date, normalize_code, parse_date, validate_code, validate_email, validate_name,
    validate_phone, validate_rejection_reason,
};
pub use visibility::VisibilityScope;
