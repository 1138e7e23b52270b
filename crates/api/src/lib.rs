// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary layer for the donation tracking backend.
//!
//! This crate turns authenticated requests into domain operations and
//! storage calls. It owns:
//!
//! - operator roles, sessions and the authorization matrix ([`auth`])
//! - request and response shapes ([`request_response`])
//! - translation of domain and storage errors into API errors ([`error`])
//! - the handler functions the HTTP server calls ([`handlers`])
//!
//! Handlers are synchronous and take `&mut Persistence`; the server is
//! responsible for serializing access to the connection.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

pub mod auth;
mod capabilities;
pub mod error;
pub mod handlers;
mod password_policy;
pub mod report;
pub mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use capabilities::{
    compute_global_capabilities, compute_operator_capabilities, compute_transaction_capabilities,
};
pub use error::{ApiError, AuthError, translate_domain_error, translate_persistence_error};
pub use handlers::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, change_password, check_bootstrap_status, create_branch,
    create_first_admin, create_operator, create_payment_method, create_program, create_team,
    create_volunteer, delete_branch, delete_operator, delete_payment_method, delete_program,
    delete_team, delete_transaction, delete_volunteer, disable_operator, enable_operator,
    export_transactions_csv, get_branch, get_payment_method, get_program, get_team,
    get_transaction, get_volunteer, list_branches, list_operators, list_payment_methods,
    list_programs, list_teams, list_transactions, list_volunteers, login, logout,
    propagate_rates, provision_admin, record_transaction, reset_password, run_rate_propagation,
    set_volunteer_active, transaction_summary, update_branch, update_payment_method,
    update_program, update_team, update_transaction, update_volunteer, validate_transaction,
    whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::*;
