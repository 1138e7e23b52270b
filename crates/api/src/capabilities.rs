// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities tell the dashboard what to offer. They are advisory only and
//! do not replace the authorization checks in the handlers.

use donation_domain::DonationTransaction;
use donation_persistence::{OperatorData, Persistence};

use crate::auth::{AuthenticatedActor, AuthorizationService, Role};
use crate::error::ApiError;
use crate::request_response::{
    Capability, GlobalCapabilities, OperatorCapabilities, TransactionCapabilities,
};

/// Computes global capabilities for an authenticated operator.
///
/// Disabled operators get nothing.
#[must_use]
pub const fn compute_global_capabilities(
    actor: &AuthenticatedActor,
    operator: &OperatorData,
) -> GlobalCapabilities {
    if operator.is_disabled {
        return GlobalCapabilities {
            can_manage_operators: Capability::Denied,
            can_manage_master_data: Capability::Denied,
            can_manage_volunteers: Capability::Denied,
            can_record_transactions: Capability::Denied,
            can_validate_transactions: Capability::Denied,
            can_view_reports: Capability::Denied,
            can_propagate_rates: Capability::Denied,
        };
    }

    let is_admin: bool = matches!(actor.role, Role::Admin);
    GlobalCapabilities {
        can_manage_operators: Capability::from_bool(is_admin),
        can_manage_master_data: Capability::from_bool(is_admin),
        can_manage_volunteers: Capability::from_bool(matches!(
            actor.role,
            Role::Admin | Role::BranchStaff
        )),
        can_record_transactions: Capability::from_bool(!matches!(actor.role, Role::Validator)),
        can_validate_transactions: Capability::from_bool(matches!(
            actor.role,
            Role::Admin | Role::Validator
        )),
        can_view_reports: Capability::from_bool(!matches!(actor.role, Role::Volunteer)),
        can_propagate_rates: Capability::from_bool(is_admin),
    }
}

/// Computes what the actor may do to another operator account.
///
/// The last active admin can be neither disabled nor deleted, and nobody
/// deletes their own account.
///
/// # Errors
///
/// Returns an error if counting admins fails.
pub fn compute_operator_capabilities(
    actor: &AuthenticatedActor,
    actor_operator: &OperatorData,
    target_operator: &OperatorData,
    persistence: &mut Persistence,
) -> Result<OperatorCapabilities, ApiError> {
    if actor_operator.is_disabled || actor.role != Role::Admin {
        return Ok(OperatorCapabilities {
            can_disable: Capability::Denied,
            can_delete: Capability::Denied,
        });
    }

    let is_last_active_admin: bool =
        if target_operator.role == Role::Admin.as_str() && !target_operator.is_disabled {
            persistence.count_active_admin_operators()? <= 1
        } else {
            false
        };
    let is_self: bool = target_operator.operator_id == actor.operator_id;

    Ok(OperatorCapabilities {
        can_disable: Capability::from_bool(!is_last_active_admin && !target_operator.is_disabled),
        can_delete: Capability::from_bool(!is_last_active_admin && !is_self),
    })
}

/// Computes what the actor may do with a visible transaction.
///
/// Decided transactions are read-only for everyone.
#[must_use]
pub fn compute_transaction_capabilities(
    actor: &AuthenticatedActor,
    transaction: &DonationTransaction,
) -> TransactionCapabilities {
    let pending: bool = !transaction.status.is_decided();
    let can_amend: bool = pending
        && AuthorizationService::authorize_amend_transaction(
            actor,
            transaction.recorded_by,
            transaction.branch_id,
            "amend_transaction",
        )
        .is_ok();
    let can_validate: bool =
        pending && AuthorizationService::authorize_validate_transaction(actor).is_ok();

    TransactionCapabilities {
        can_edit: Capability::from_bool(can_amend),
        can_validate: Capability::from_bool(can_validate),
        can_delete: Capability::from_bool(can_amend),
    }
}
