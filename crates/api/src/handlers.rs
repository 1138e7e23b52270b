// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler authorizes first, then validates, then touches storage.
//! Reads outside the caller's visibility scope answer "not found"; writes
//! outside it answer "unauthorized".

use std::str::FromStr;

use donation_domain::{
    Amount, Branch, DomainError, DonationProgram, DonationTransaction, PaymentMethod, Rate, Team,
    TransactionDraft, TransactionStatus, TransactionSummary, VisibilityScope, Volunteer,
    format_date, parse_date, summarize, validate_name, validate_phone,
};
use donation_persistence::{
    NewOperator, OperatorData, Persistence, RatePropagationOptions, RatePropagationReport,
    SessionData, TransactionFilter,
};
use time::Date;
use tracing::info;

use crate::auth::{
    AuthenticatedActor, AuthenticationService, AuthorizationService, Role, resolve_scope,
};
use crate::capabilities::{
    compute_global_capabilities, compute_operator_capabilities, compute_transaction_capabilities,
};
use crate::error::ApiError;
use crate::password_policy::PasswordPolicy;
use crate::report::{ReportLabels, summary_rows, write_transactions_csv};
use crate::request_response::{
    BootstrapStatusResponse, BranchInfo, BranchRequest, ChangePasswordRequest,
    ChangePasswordResponse, CreateFirstAdminRequest, CreateFirstAdminResponse,
    CreateOperatorRequest, CreateOperatorResponse, CreateTeamRequest, CreateVolunteerRequest,
    DeleteTransactionResponse, ListBranchesResponse, ListOperatorsResponse,
    ListPaymentMethodsResponse, ListProgramsResponse, ListTeamsResponse, ListTransactionsResponse,
    ListVolunteersResponse, LoginRequest, LoginResponse, OperatorInfo, OperatorStatusResponse,
    PaymentMethodInfo, PaymentMethodRequest, ProgramInfo, ProgramRequest, PropagateRatesRequest,
    PropagateRatesResponse, RecordTransactionRequest, ResetPasswordRequest, ResetPasswordResponse,
    TeamInfo, TeamQuery, TransactionDetailResponse, TransactionInfo, TransactionQuery,
    TransactionSummaryResponse, UpdateTeamRequest, UpdateTransactionRequest,
    UpdateVolunteerRequest, ValidateTransactionRequest, VolunteerInfo, VolunteerQuery,
    WhoAmIResponse,
};

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: i64 = 500;

// ========================================================================
// Shared helpers
// ========================================================================

fn persisted_id(id: Option<i64>, resource_type: &str) -> Result<i64, ApiError> {
    id.ok_or_else(|| ApiError::Internal {
        message: format!("{resource_type} loaded from storage has no identifier"),
    })
}

fn not_found(resource_type: &str, id: i64) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from(resource_type),
        message: format!("{resource_type} with ID {id} not found"),
    }
}

fn conflict(resource_type: &str, message: String) -> ApiError {
    ApiError::Conflict {
        resource_type: String::from(resource_type),
        message,
    }
}

fn invalid_input(field: &str, message: &str) -> ApiError {
    ApiError::InvalidInput {
        field: String::from(field),
        message: String::from(message),
    }
}

fn load_branch(persistence: &mut Persistence, branch_id: i64) -> Result<Branch, ApiError> {
    persistence
        .get_branch(branch_id)?
        .ok_or_else(|| not_found("Branch", branch_id))
}

fn load_team(persistence: &mut Persistence, team_id: i64) -> Result<Team, ApiError> {
    persistence
        .get_team(team_id)?
        .ok_or_else(|| not_found("Team", team_id))
}

fn load_volunteer(persistence: &mut Persistence, volunteer_id: i64) -> Result<Volunteer, ApiError> {
    persistence
        .get_volunteer(volunteer_id)?
        .ok_or_else(|| not_found("Volunteer", volunteer_id))
}

fn load_program(
    persistence: &mut Persistence,
    program_id: i64,
) -> Result<DonationProgram, ApiError> {
    persistence
        .get_program(program_id)?
        .ok_or_else(|| not_found("Program", program_id))
}

fn load_payment_method(
    persistence: &mut Persistence,
    payment_method_id: i64,
) -> Result<PaymentMethod, ApiError> {
    persistence
        .get_payment_method(payment_method_id)?
        .ok_or_else(|| not_found("PaymentMethod", payment_method_id))
}

fn load_operator(persistence: &mut Persistence, operator_id: i64) -> Result<OperatorData, ApiError> {
    persistence
        .get_operator_by_id(operator_id)?
        .ok_or_else(|| not_found("Operator", operator_id))
}

fn load_transaction(
    persistence: &mut Persistence,
    transaction_id: i64,
    scope: VisibilityScope,
) -> Result<DonationTransaction, ApiError> {
    persistence
        .get_transaction(transaction_id, scope)?
        .ok_or_else(|| not_found("Transaction", transaction_id))
}

fn branch_info(branch: Branch) -> Result<BranchInfo, ApiError> {
    Ok(BranchInfo {
        branch_id: persisted_id(branch.branch_id, "Branch")?,
        code: branch.code,
        name: branch.name,
        address: branch.address,
    })
}

fn team_info(team: Team) -> Result<TeamInfo, ApiError> {
    Ok(TeamInfo {
        team_id: persisted_id(team.team_id, "Team")?,
        branch_id: team.branch_id,
        name: team.name,
    })
}

fn volunteer_info(volunteer: Volunteer) -> Result<VolunteerInfo, ApiError> {
    Ok(VolunteerInfo {
        volunteer_id: persisted_id(volunteer.volunteer_id, "Volunteer")?,
        team_id: volunteer.team_id,
        branch_id: volunteer.branch_id,
        name: volunteer.name,
        phone: volunteer.phone,
        email: volunteer.email,
        is_active: volunteer.is_active,
    })
}

fn program_info(program: DonationProgram) -> Result<ProgramInfo, ApiError> {
    Ok(ProgramInfo {
        program_id: persisted_id(program.program_id, "Program")?,
        code: program.code,
        name: program.name,
        description: program.description,
        rate: program.rate.value(),
        is_active: program.is_active,
    })
}

fn payment_method_info(method: PaymentMethod) -> Result<PaymentMethodInfo, ApiError> {
    Ok(PaymentMethodInfo {
        payment_method_id: persisted_id(method.payment_method_id, "PaymentMethod")?,
        name: method.name,
        account_number: method.account_number,
        is_active: method.is_active,
    })
}

fn transaction_info(transaction: DonationTransaction) -> Result<TransactionInfo, ApiError> {
    Ok(TransactionInfo {
        transaction_id: persisted_id(transaction.transaction_id, "Transaction")?,
        receipt_number: transaction.receipt_number,
        volunteer_id: transaction.volunteer_id,
        branch_id: transaction.branch_id,
        program_id: transaction.program_id,
        payment_method_id: transaction.payment_method_id,
        donor_name: transaction.donor_name,
        donor_phone: transaction.donor_phone,
        amount: transaction.amount.value(),
        rate: transaction.rate.value(),
        allocation: transaction.allocation,
        donated_on: format_date(transaction.donated_on),
        status: transaction.status,
        notes: transaction.notes,
        recorded_by: transaction.recorded_by,
        validated_by: transaction.validated_by,
        validated_at: transaction.validated_at,
        rejection_reason: transaction.rejection_reason,
        created_at: transaction.created_at,
    })
}

fn transaction_detail(
    actor: &AuthenticatedActor,
    transaction: DonationTransaction,
) -> Result<TransactionDetailResponse, ApiError> {
    let capabilities = compute_transaction_capabilities(actor, &transaction);
    Ok(TransactionDetailResponse {
        transaction: transaction_info(transaction)?,
        capabilities,
    })
}

fn collect_infos<T, I>(
    items: Vec<T>,
    convert: fn(T) -> Result<I, ApiError>,
) -> Result<Vec<I>, ApiError> {
    items.into_iter().map(convert).collect()
}

fn optional_date(value: Option<&str>) -> Result<Option<Date>, DomainError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_date)
        .transpose()
}

/// Translates listing filters into a storage filter pinned to the caller's
/// scope. Paging is left unset.
fn build_filter(
    actor: &AuthenticatedActor,
    query: &TransactionQuery,
) -> Result<TransactionFilter, ApiError> {
    let mut filter: TransactionFilter = TransactionFilter::scoped(resolve_scope(actor)?);
    filter.status = query
        .status
        .as_deref()
        .map(TransactionStatus::from_str)
        .transpose()?;
    filter.program_id = query.program_id;
    filter.branch_id = query.branch_id;
    filter.volunteer_id = query.volunteer_id;
    filter.payment_method_id = query.payment_method_id;
    filter.date_from = optional_date(query.date_from.as_deref())?;
    filter.date_to = optional_date(query.date_to.as_deref())?;

    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
        && from > to
    {
        return Err(DomainError::InvalidDateRange { from, to }.into());
    }

    Ok(filter)
}

fn ensure_operator_is_not_last_admin(
    persistence: &mut Persistence,
    target: &OperatorData,
) -> Result<(), ApiError> {
    if target.role == Role::Admin.as_str() && !target.is_disabled {
        let active_admin_count: i64 = persistence.count_active_admin_operators()?;
        if active_admin_count <= 1 {
            return Err(ApiError::DomainRuleViolation {
                rule: String::from("last_active_admin"),
                message: String::from("Operation would leave the system without an active admin"),
            });
        }
    }
    Ok(())
}

fn trimmed_login(login_name: &str) -> Result<&str, ApiError> {
    let trimmed: &str = login_name.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("login_name", "Login name cannot be empty"));
    }
    Ok(trimmed)
}

fn trimmed_display_name(display_name: &str) -> Result<&str, ApiError> {
    let trimmed: &str = display_name.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("display_name", "Display name cannot be empty"));
    }
    Ok(trimmed)
}

// ========================================================================
// Authentication
// ========================================================================

/// Logs an operator in and opens a session.
///
/// # Errors
///
/// Returns `AuthenticationFailed` for bad credentials or a disabled account.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, operator): (String, AuthenticatedActor, OperatorData) =
        AuthenticationService::login(persistence, &request.login_name, &request.password)?;

    let session: SessionData = persistence
        .get_session_by_token(&session_token)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Session vanished right after login"),
        })?;

    Ok(LoginResponse {
        session_token,
        operator_id: operator.operator_id,
        login_name: operator.login_name,
        display_name: operator.display_name,
        role: actor.role.to_string(),
        expires_at: session.expires_at,
    })
}

/// Ends a session.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Describes the calling operator.
///
/// # Errors
///
/// Returns an error if the operator has lost its scope binding.
pub fn whoami(
    actor: &AuthenticatedActor,
    operator: &OperatorData,
) -> Result<WhoAmIResponse, ApiError> {
    Ok(WhoAmIResponse {
        operator_id: operator.operator_id,
        login_name: operator.login_name.clone(),
        display_name: operator.display_name.clone(),
        role: actor.role.to_string(),
        branch_id: actor.branch_id,
        volunteer_id: actor.volunteer_id,
        scope: resolve_scope(actor)?,
        is_disabled: operator.is_disabled,
        capabilities: compute_global_capabilities(actor, operator),
    })
}

/// Reports whether the system still waits for its first admin.
///
/// # Errors
///
/// Returns an error if operators cannot be counted.
pub fn check_bootstrap_status(
    persistence: &mut Persistence,
) -> Result<BootstrapStatusResponse, ApiError> {
    let operator_count: i64 = persistence.count_operators()?;
    Ok(BootstrapStatusResponse {
        is_bootstrap_mode: operator_count == 0,
    })
}

/// Creates the first admin while no operator exists.
///
/// # Errors
///
/// Returns `DomainRuleViolation` once any operator exists, or a password
/// policy violation.
pub fn create_first_admin(
    persistence: &mut Persistence,
    request: &CreateFirstAdminRequest,
) -> Result<CreateFirstAdminResponse, ApiError> {
    if persistence.count_operators()? > 0 {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("bootstrap_complete"),
            message: String::from("Operators already exist; log in as an admin instead"),
        });
    }

    let operator_id: i64 = provision_admin(
        persistence,
        &request.login_name,
        &request.display_name,
        &request.password,
        &request.password_confirmation,
    )?;
    let operator: OperatorData = load_operator(persistence, operator_id)?;

    Ok(CreateFirstAdminResponse {
        operator_id,
        login_name: operator.login_name,
        display_name: operator.display_name,
        message: String::from("First admin created"),
    })
}

/// Creates an admin account without an authenticated caller.
///
/// Used by bootstrap and by the command line. The password policy still
/// applies.
///
/// # Errors
///
/// Returns `Conflict` if the login is taken, or a validation error.
pub fn provision_admin(
    persistence: &mut Persistence,
    login_name: &str,
    display_name: &str,
    password: &str,
    password_confirmation: &str,
) -> Result<i64, ApiError> {
    let login_name: &str = trimmed_login(login_name)?;
    let display_name: &str = trimmed_display_name(display_name)?;

    if persistence.get_operator_by_login(login_name)?.is_some() {
        return Err(conflict(
            "Operator",
            format!("Login name '{login_name}' is already in use"),
        ));
    }

    PasswordPolicy::default().validate(password, password_confirmation, login_name, display_name)?;

    let operator_id: i64 = persistence.create_operator(&NewOperator {
        login_name,
        display_name,
        password,
        role: Role::Admin.as_str(),
        branch_id: None,
        volunteer_id: None,
    })?;

    info!(operator_id, login_name, "Admin operator provisioned");
    Ok(operator_id)
}

// ========================================================================
// Operators
// ========================================================================

/// Creates an operator account.
///
/// Branch staff must be bound to an existing branch and volunteer accounts
/// to an existing volunteer. Admins and validators carry no binding.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `InvalidInput` for an unknown role
/// or missing binding, `Conflict` for a taken login, or a password policy
/// violation.
pub fn create_operator(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &CreateOperatorRequest,
) -> Result<CreateOperatorResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    let role: Role = Role::parse(request.role.trim()).ok_or_else(|| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!(
            "Invalid role '{}'. Must be one of: Admin, Validator, BranchStaff, Volunteer",
            request.role
        ),
    })?;

    let (branch_id, volunteer_id): (Option<i64>, Option<i64>) = match role {
        Role::Admin | Role::Validator => (None, None),
        Role::BranchStaff => {
            let branch_id: i64 = request
                .branch_id
                .ok_or_else(|| invalid_input("branch_id", "Branch staff need a branch"))?;
            load_branch(persistence, branch_id)?;
            (Some(branch_id), None)
        }
        Role::Volunteer => {
            let volunteer_id: i64 = request
                .volunteer_id
                .ok_or_else(|| invalid_input("volunteer_id", "Volunteer accounts need a volunteer"))?;
            load_volunteer(persistence, volunteer_id)?;
            (None, Some(volunteer_id))
        }
    };

    let login_name: &str = trimmed_login(&request.login_name)?;
    let display_name: &str = trimmed_display_name(&request.display_name)?;

    if persistence.get_operator_by_login(login_name)?.is_some() {
        return Err(conflict(
            "Operator",
            format!("Login name '{login_name}' is already in use"),
        ));
    }

    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        login_name,
        display_name,
    )?;

    let operator_id: i64 = persistence.create_operator(&NewOperator {
        login_name,
        display_name,
        password: &request.password,
        role: role.as_str(),
        branch_id,
        volunteer_id,
    })?;
    let operator: OperatorData = load_operator(persistence, operator_id)?;

    info!(
        operator_id,
        created_by = actor.operator_id,
        role = %role,
        "Operator created"
    );

    Ok(CreateOperatorResponse {
        operator_id,
        login_name: operator.login_name,
        display_name: operator.display_name,
        role: operator.role,
    })
}

/// Lists all operators with what the caller may do to each.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins.
pub fn list_operators(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    actor_operator: &OperatorData,
) -> Result<ListOperatorsResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    let operators: Vec<OperatorData> = persistence.list_operators()?;
    let mut infos: Vec<OperatorInfo> = Vec::with_capacity(operators.len());
    for operator in operators {
        let capabilities =
            compute_operator_capabilities(actor, actor_operator, &operator, persistence)?;
        infos.push(OperatorInfo {
            operator_id: operator.operator_id,
            login_name: operator.login_name,
            display_name: operator.display_name,
            role: operator.role,
            branch_id: operator.branch_id,
            volunteer_id: operator.volunteer_id,
            is_disabled: operator.is_disabled,
            created_at: operator.created_at,
            last_login_at: operator.last_login_at,
            capabilities,
        });
    }

    Ok(ListOperatorsResponse { operators: infos })
}

/// Disables an operator and ends its sessions.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `ResourceNotFound` for an unknown
/// operator, or `DomainRuleViolation` for the last active admin.
pub fn disable_operator(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator_id: i64,
) -> Result<OperatorStatusResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    ensure_operator_is_not_last_admin(persistence, &target)?;

    persistence.disable_operator(operator_id)?;
    let ended: usize = persistence.delete_sessions_for_operator(operator_id)?;

    info!(
        operator_id,
        disabled_by = actor.operator_id,
        sessions_ended = ended,
        "Operator disabled"
    );

    Ok(OperatorStatusResponse {
        operator_id,
        message: format!("Operator {} disabled", target.login_name),
    })
}

/// Re-enables a disabled operator.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins or `ResourceNotFound`.
pub fn enable_operator(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator_id: i64,
) -> Result<OperatorStatusResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    persistence.enable_operator(operator_id)?;

    info!(operator_id, enabled_by = actor.operator_id, "Operator enabled");

    Ok(OperatorStatusResponse {
        operator_id,
        message: format!("Operator {} enabled", target.login_name),
    })
}

/// Deletes an operator that never recorded or decided a transaction.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `DomainRuleViolation` for the
/// caller's own account or the last active admin, or `Conflict` when the
/// operator is referenced by transactions.
pub fn delete_operator(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator_id: i64,
) -> Result<OperatorStatusResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    if operator_id == actor.operator_id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("self_delete"),
            message: String::from("Operators cannot delete their own account"),
        });
    }

    let target: OperatorData = load_operator(persistence, operator_id)?;
    ensure_operator_is_not_last_admin(persistence, &target)?;

    persistence.delete_sessions_for_operator(operator_id)?;
    persistence.delete_operator(operator_id)?;

    info!(operator_id, deleted_by = actor.operator_id, "Operator deleted");

    Ok(OperatorStatusResponse {
        operator_id,
        message: format!("Operator {} deleted", target.login_name),
    })
}

/// Changes the caller's own password and ends all of its sessions.
///
/// # Errors
///
/// Returns `AuthenticationFailed` if the current password is wrong, or a
/// password policy violation.
pub fn change_password(
    persistence: &mut Persistence,
    operator: &OperatorData,
    request: &ChangePasswordRequest,
) -> Result<ChangePasswordResponse, ApiError> {
    if !persistence.verify_password(&request.current_password, &operator.password_hash)? {
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &operator.login_name,
        &operator.display_name,
    )?;

    persistence.update_password(operator.operator_id, &request.new_password)?;
    persistence.delete_sessions_for_operator(operator.operator_id)?;

    info!(operator_id = operator.operator_id, "Operator changed password");

    Ok(ChangePasswordResponse {
        message: String::from("Password changed; please log in again"),
    })
}

/// Sets a new password for another operator and ends its sessions.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `ResourceNotFound`, or a password
/// policy violation.
pub fn reset_password(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator_id: i64,
    request: &ResetPasswordRequest,
) -> Result<ResetPasswordResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor)?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &target.login_name,
        &target.display_name,
    )?;

    persistence.update_password(operator_id, &request.new_password)?;
    persistence.delete_sessions_for_operator(operator_id)?;

    info!(operator_id, reset_by = actor.operator_id, "Operator password reset");

    Ok(ResetPasswordResponse {
        operator_id,
        message: format!("Password reset for {}", target.login_name),
    })
}

// ========================================================================
// Branches
// ========================================================================

/// Creates a branch.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins, `InvalidInput`, or `Conflict` for
/// a duplicate code.
pub fn create_branch(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &BranchRequest,
) -> Result<BranchInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "create_branch")?;

    let branch: Branch = Branch::new(&request.code, &request.name, request.address.as_deref())?;
    if persistence.branch_code_exists(&branch.code, None)? {
        return Err(conflict(
            "Branch",
            format!("Branch code '{}' is already in use", branch.code),
        ));
    }

    let branch_id: i64 = persistence.create_branch(&branch)?;
    info!(branch_id, code = %branch.code, "Branch created");
    branch_info(load_branch(persistence, branch_id)?)
}

/// Lists all branches. Branches are reference data visible to every
/// operator.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_branches(persistence: &mut Persistence) -> Result<ListBranchesResponse, ApiError> {
    Ok(ListBranchesResponse {
        branches: collect_infos(persistence.list_branches()?, branch_info)?,
    })
}

/// Fetches one branch.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown branch.
pub fn get_branch(persistence: &mut Persistence, branch_id: i64) -> Result<BranchInfo, ApiError> {
    branch_info(load_branch(persistence, branch_id)?)
}

/// Replaces a branch's details.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, `InvalidInput`, or `Conflict`.
pub fn update_branch(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    branch_id: i64,
    request: &BranchRequest,
) -> Result<BranchInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "update_branch")?;
    load_branch(persistence, branch_id)?;

    let branch: Branch = Branch::new(&request.code, &request.name, request.address.as_deref())?;
    if persistence.branch_code_exists(&branch.code, Some(branch_id))? {
        return Err(conflict(
            "Branch",
            format!("Branch code '{}' is already in use", branch.code),
        ));
    }

    persistence.update_branch(branch_id, &branch)?;
    branch_info(load_branch(persistence, branch_id)?)
}

/// Deletes a branch that has no teams, volunteers, transactions or staff.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `Conflict`.
pub fn delete_branch(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    branch_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "delete_branch")?;
    load_branch(persistence, branch_id)?;
    persistence.delete_branch(branch_id)?;
    info!(branch_id, "Branch deleted");
    Ok(())
}

// ========================================================================
// Teams
// ========================================================================

fn team_visible(
    persistence: &mut Persistence,
    scope: VisibilityScope,
    team: &Team,
) -> Result<bool, ApiError> {
    match scope {
        VisibilityScope::All => Ok(true),
        VisibilityScope::Branch(branch_id) => Ok(team.branch_id == branch_id),
        VisibilityScope::Volunteer(volunteer_id) => {
            let own_team: Option<i64> = persistence
                .get_volunteer(volunteer_id)?
                .map(|volunteer| volunteer.team_id);
            Ok(own_team.is_some() && own_team == team.team_id)
        }
    }
}

/// Creates a team inside a branch.
///
/// # Errors
///
/// Returns `Unauthorized` outside the caller's branch, `ResourceNotFound`,
/// `InvalidInput`, or `Conflict` for a duplicate name in the branch.
pub fn create_team(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &CreateTeamRequest,
) -> Result<TeamInfo, ApiError> {
    AuthorizationService::authorize_manage_branch_members(actor, request.branch_id, "create_team")?;
    load_branch(persistence, request.branch_id)?;

    let team: Team = Team::new(request.branch_id, &request.name)?;
    if persistence.team_name_exists(team.branch_id, &team.name, None)? {
        return Err(conflict(
            "Team",
            format!("Team '{}' already exists in this branch", team.name),
        ));
    }

    let team_id: i64 = persistence.create_team(&team)?;
    info!(team_id, branch_id = team.branch_id, "Team created");
    team_info(load_team(persistence, team_id)?)
}

/// Lists the teams the caller may see.
///
/// Branch staff only ever see their own branch; volunteers only their own
/// team.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_teams(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: TeamQuery,
) -> Result<ListTeamsResponse, ApiError> {
    let teams: Vec<Team> = match resolve_scope(actor)? {
        VisibilityScope::All => persistence.list_teams(query.branch_id)?,
        VisibilityScope::Branch(branch_id) => {
            if query.branch_id.is_some_and(|requested| requested != branch_id) {
                Vec::new()
            } else {
                persistence.list_teams(Some(branch_id))?
            }
        }
        VisibilityScope::Volunteer(volunteer_id) => match persistence.get_volunteer(volunteer_id)? {
            Some(volunteer) => persistence
                .list_teams(Some(volunteer.branch_id))?
                .into_iter()
                .filter(|team| team.team_id == Some(volunteer.team_id))
                .filter(|team| query.branch_id.is_none_or(|b| b == team.branch_id))
                .collect(),
            None => Vec::new(),
        },
    };

    Ok(ListTeamsResponse {
        teams: collect_infos(teams, team_info)?,
    })
}

/// Fetches one visible team.
///
/// # Errors
///
/// Returns `ResourceNotFound` for unknown or out-of-scope teams.
pub fn get_team(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    team_id: i64,
) -> Result<TeamInfo, ApiError> {
    let scope: VisibilityScope = resolve_scope(actor)?;
    let team: Team = load_team(persistence, team_id)?;
    if !team_visible(persistence, scope, &team)? {
        return Err(not_found("Team", team_id));
    }
    team_info(team)
}

/// Renames a team.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, `InvalidInput`, or `Conflict`.
pub fn update_team(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    team_id: i64,
    request: &UpdateTeamRequest,
) -> Result<TeamInfo, ApiError> {
    let existing: Team = load_team(persistence, team_id)?;
    AuthorizationService::authorize_manage_branch_members(actor, existing.branch_id, "update_team")?;

    let renamed: Team = Team::new(existing.branch_id, &request.name)?;
    if persistence.team_name_exists(renamed.branch_id, &renamed.name, Some(team_id))? {
        return Err(conflict(
            "Team",
            format!("Team '{}' already exists in this branch", renamed.name),
        ));
    }

    persistence.update_team(team_id, &renamed.name)?;
    team_info(load_team(persistence, team_id)?)
}

/// Deletes a team without volunteers.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `Conflict`.
pub fn delete_team(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    team_id: i64,
) -> Result<(), ApiError> {
    let existing: Team = load_team(persistence, team_id)?;
    AuthorizationService::authorize_manage_branch_members(actor, existing.branch_id, "delete_team")?;
    persistence.delete_team(team_id)?;
    info!(team_id, "Team deleted");
    Ok(())
}

// ========================================================================
// Volunteers
// ========================================================================

/// Registers a volunteer in a team. The branch follows the team.
///
/// # Errors
///
/// Returns `Unauthorized` outside the caller's branch, `ResourceNotFound`
/// for an unknown team, or `InvalidInput`.
pub fn create_volunteer(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &CreateVolunteerRequest,
) -> Result<VolunteerInfo, ApiError> {
    let team: Team = load_team(persistence, request.team_id)?;
    AuthorizationService::authorize_manage_branch_members(actor, team.branch_id, "create_volunteer")?;

    let volunteer: Volunteer = Volunteer::new(
        request.team_id,
        team.branch_id,
        &request.name,
        request.phone.as_deref(),
        request.email.as_deref(),
    )?;
    let volunteer_id: i64 = persistence.create_volunteer(&volunteer)?;

    info!(
        volunteer_id,
        team_id = request.team_id,
        branch_id = team.branch_id,
        "Volunteer registered"
    );
    volunteer_info(load_volunteer(persistence, volunteer_id)?)
}

/// Lists the volunteers the caller may see.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_volunteers(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: VolunteerQuery,
) -> Result<ListVolunteersResponse, ApiError> {
    let volunteers: Vec<Volunteer> = match resolve_scope(actor)? {
        VisibilityScope::All => persistence.list_volunteers(query.branch_id, query.team_id)?,
        VisibilityScope::Branch(branch_id) => {
            if query.branch_id.is_some_and(|requested| requested != branch_id) {
                Vec::new()
            } else {
                persistence.list_volunteers(Some(branch_id), query.team_id)?
            }
        }
        VisibilityScope::Volunteer(volunteer_id) => persistence
            .get_volunteer(volunteer_id)?
            .into_iter()
            .filter(|v| query.branch_id.is_none_or(|b| b == v.branch_id))
            .filter(|v| query.team_id.is_none_or(|t| t == v.team_id))
            .collect(),
    };

    Ok(ListVolunteersResponse {
        volunteers: collect_infos(volunteers, volunteer_info)?,
    })
}

/// Fetches one visible volunteer.
///
/// # Errors
///
/// Returns `ResourceNotFound` for unknown or out-of-scope volunteers.
pub fn get_volunteer(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    volunteer_id: i64,
) -> Result<VolunteerInfo, ApiError> {
    let scope: VisibilityScope = resolve_scope(actor)?;
    let volunteer: Volunteer = load_volunteer(persistence, volunteer_id)?;
    if !scope.permits(volunteer_id, volunteer.branch_id) {
        return Err(not_found("Volunteer", volunteer_id));
    }
    volunteer_info(volunteer)
}

/// Replaces a volunteer's details. Moving to another team moves the
/// volunteer to that team's branch; branch staff need authority over both.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `InvalidInput`.
pub fn update_volunteer(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    volunteer_id: i64,
    request: &UpdateVolunteerRequest,
) -> Result<VolunteerInfo, ApiError> {
    let existing: Volunteer = load_volunteer(persistence, volunteer_id)?;
    AuthorizationService::authorize_manage_branch_members(
        actor,
        existing.branch_id,
        "update_volunteer",
    )?;

    let team: Team = load_team(persistence, request.team_id)?;
    if team.branch_id != existing.branch_id {
        AuthorizationService::authorize_manage_branch_members(
            actor,
            team.branch_id,
            "move_volunteer",
        )?;
    }

    let mut volunteer: Volunteer = Volunteer::new(
        request.team_id,
        team.branch_id,
        &request.name,
        request.phone.as_deref(),
        request.email.as_deref(),
    )?;
    volunteer.is_active = request.is_active;

    persistence.update_volunteer(volunteer_id, &volunteer)?;
    volunteer_info(load_volunteer(persistence, volunteer_id)?)
}

/// Activates or deactivates a volunteer. Inactive volunteers keep their
/// history but cannot collect new donations.
///
/// # Errors
///
/// Returns `Unauthorized` or `ResourceNotFound`.
pub fn set_volunteer_active(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    volunteer_id: i64,
    is_active: bool,
) -> Result<VolunteerInfo, ApiError> {
    let existing: Volunteer = load_volunteer(persistence, volunteer_id)?;
    AuthorizationService::authorize_manage_branch_members(
        actor,
        existing.branch_id,
        if is_active {
            "activate_volunteer"
        } else {
            "deactivate_volunteer"
        },
    )?;

    persistence.set_volunteer_active(volunteer_id, is_active)?;
    info!(volunteer_id, is_active, "Volunteer activity changed");
    volunteer_info(load_volunteer(persistence, volunteer_id)?)
}

/// Deletes a volunteer with no transactions or operator account.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `Conflict`.
pub fn delete_volunteer(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    volunteer_id: i64,
) -> Result<(), ApiError> {
    let existing: Volunteer = load_volunteer(persistence, volunteer_id)?;
    AuthorizationService::authorize_manage_branch_members(
        actor,
        existing.branch_id,
        "delete_volunteer",
    )?;
    persistence.delete_volunteer(volunteer_id)?;
    info!(volunteer_id, "Volunteer deleted");
    Ok(())
}

// ========================================================================
// Programs
// ========================================================================

/// Creates a donation program.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput`, or `Conflict` for a duplicate
/// code.
pub fn create_program(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &ProgramRequest,
) -> Result<ProgramInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "create_program")?;

    let rate: Rate = Rate::new(request.rate)?;
    let mut program: DonationProgram = DonationProgram::new(
        &request.code,
        &request.name,
        request.description.as_deref(),
        rate,
    )?;
    program.is_active = request.is_active.unwrap_or(true);

    if persistence.program_code_exists(&program.code, None)? {
        return Err(conflict(
            "Program",
            format!("Program code '{}' is already in use", program.code),
        ));
    }

    let program_id: i64 = persistence.create_program(&program)?;
    info!(program_id, code = %program.code, rate = %rate, "Program created");
    program_info(load_program(persistence, program_id)?)
}

/// Lists all programs. Programs are reference data visible to every
/// operator.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_programs(persistence: &mut Persistence) -> Result<ListProgramsResponse, ApiError> {
    Ok(ListProgramsResponse {
        programs: collect_infos(persistence.list_programs()?, program_info)?,
    })
}

/// Fetches one program.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown program.
pub fn get_program(persistence: &mut Persistence, program_id: i64) -> Result<ProgramInfo, ApiError> {
    program_info(load_program(persistence, program_id)?)
}

/// Replaces a program's details.
///
/// A new rate applies to transactions recorded from now on. Existing
/// transactions keep their rate until rates are propagated.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, `InvalidInput`, or `Conflict`.
pub fn update_program(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    program_id: i64,
    request: &ProgramRequest,
) -> Result<ProgramInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "update_program")?;
    let existing: DonationProgram = load_program(persistence, program_id)?;

    let rate: Rate = Rate::new(request.rate)?;
    let mut program: DonationProgram = DonationProgram::new(
        &request.code,
        &request.name,
        request.description.as_deref(),
        rate,
    )?;
    program.is_active = request.is_active.unwrap_or(existing.is_active);

    if persistence.program_code_exists(&program.code, Some(program_id))? {
        return Err(conflict(
            "Program",
            format!("Program code '{}' is already in use", program.code),
        ));
    }

    persistence.update_program(program_id, &program)?;
    if existing.rate != rate {
        info!(
            program_id,
            old_rate = %existing.rate,
            new_rate = %rate,
            "Program rate changed; recorded transactions keep their rate until propagation"
        );
    }
    program_info(load_program(persistence, program_id)?)
}

/// Deletes a program no transaction uses.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `Conflict`.
pub fn delete_program(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    program_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "delete_program")?;
    load_program(persistence, program_id)?;
    persistence.delete_program(program_id)?;
    info!(program_id, "Program deleted");
    Ok(())
}

// ========================================================================
// Payment methods
// ========================================================================

/// Creates a payment method.
///
/// # Errors
///
/// Returns `Unauthorized`, `InvalidInput`, or `Conflict` for a duplicate
/// name.
pub fn create_payment_method(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &PaymentMethodRequest,
) -> Result<PaymentMethodInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "create_payment_method")?;

    let mut method: PaymentMethod =
        PaymentMethod::new(&request.name, request.account_number.as_deref())?;
    method.is_active = request.is_active.unwrap_or(true);

    if persistence.payment_method_name_exists(&method.name, None)? {
        return Err(conflict(
            "PaymentMethod",
            format!("Payment method '{}' already exists", method.name),
        ));
    }

    let payment_method_id: i64 = persistence.create_payment_method(&method)?;
    info!(payment_method_id, name = %method.name, "Payment method created");
    payment_method_info(load_payment_method(persistence, payment_method_id)?)
}

/// Lists all payment methods.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_payment_methods(
    persistence: &mut Persistence,
) -> Result<ListPaymentMethodsResponse, ApiError> {
    Ok(ListPaymentMethodsResponse {
        payment_methods: collect_infos(persistence.list_payment_methods()?, payment_method_info)?,
    })
}

/// Fetches one payment method.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown payment method.
pub fn get_payment_method(
    persistence: &mut Persistence,
    payment_method_id: i64,
) -> Result<PaymentMethodInfo, ApiError> {
    payment_method_info(load_payment_method(persistence, payment_method_id)?)
}

/// Replaces a payment method's details.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, `InvalidInput`, or `Conflict`.
pub fn update_payment_method(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    payment_method_id: i64,
    request: &PaymentMethodRequest,
) -> Result<PaymentMethodInfo, ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "update_payment_method")?;
    let existing: PaymentMethod = load_payment_method(persistence, payment_method_id)?;

    let mut method: PaymentMethod =
        PaymentMethod::new(&request.name, request.account_number.as_deref())?;
    method.is_active = request.is_active.unwrap_or(existing.is_active);

    if persistence.payment_method_name_exists(&method.name, Some(payment_method_id))? {
        return Err(conflict(
            "PaymentMethod",
            format!("Payment method '{}' already exists", method.name),
        ));
    }

    persistence.update_payment_method(payment_method_id, &method)?;
    payment_method_info(load_payment_method(persistence, payment_method_id)?)
}

/// Deletes a payment method no transaction uses.
///
/// # Errors
///
/// Returns `Unauthorized`, `ResourceNotFound`, or `Conflict`.
pub fn delete_payment_method(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    payment_method_id: i64,
) -> Result<(), ApiError> {
    AuthorizationService::authorize_manage_master_data(actor, "delete_payment_method")?;
    load_payment_method(persistence, payment_method_id)?;
    persistence.delete_payment_method(payment_method_id)?;
    info!(payment_method_id, "Payment method deleted");
    Ok(())
}

// ========================================================================
// Transactions
// ========================================================================

fn require_active_program(program: &DonationProgram) -> Result<(), ApiError> {
    if program.is_active {
        Ok(())
    } else {
        Err(ApiError::DomainRuleViolation {
            rule: String::from("inactive_program"),
            message: format!("Program {} no longer accepts donations", program.code),
        })
    }
}

fn require_active_payment_method(method: &PaymentMethod) -> Result<(), ApiError> {
    if method.is_active {
        Ok(())
    } else {
        Err(ApiError::DomainRuleViolation {
            rule: String::from("inactive_payment_method"),
            message: format!("Payment method {} is no longer accepted", method.name),
        })
    }
}

/// Records a new pending donation.
///
/// Volunteers may omit `volunteer_id` and always record for themselves.
/// The branch is the volunteer's branch and the rate is the program's
/// current rate. The receipt number sequence follows the donation year.
///
/// # Errors
///
/// Returns `Unauthorized` when the caller may not record for the volunteer,
/// `ResourceNotFound` for unknown references, `DomainRuleViolation` for an
/// inactive volunteer, program or payment method, or `InvalidInput`.
pub fn record_transaction(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: &RecordTransactionRequest,
) -> Result<TransactionDetailResponse, ApiError> {
    let volunteer_id: i64 = match (request.volunteer_id, actor.role) {
        (Some(volunteer_id), _) => volunteer_id,
        (None, Role::Volunteer) => actor
            .volunteer_id
            .ok_or_else(|| invalid_input("volunteer_id", "Operator is not bound to a volunteer"))?,
        (None, _) => {
            return Err(invalid_input(
                "volunteer_id",
                "The collecting volunteer is required",
            ));
        }
    };

    let volunteer: Volunteer = load_volunteer(persistence, volunteer_id)?;
    AuthorizationService::authorize_record_transaction(actor, volunteer_id, volunteer.branch_id)?;

    if !volunteer.is_active {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("inactive_volunteer"),
            message: format!("Volunteer {} is inactive", volunteer.name),
        });
    }

    let program: DonationProgram = load_program(persistence, request.program_id)?;
    require_active_program(&program)?;
    let method: PaymentMethod = load_payment_method(persistence, request.payment_method_id)?;
    require_active_payment_method(&method)?;

    let amount: Amount = Amount::new(request.amount)?;
    let donated_on: Date = parse_date(&request.donated_on)?;
    let receipt_number: String = persistence.next_receipt_number(donated_on.year())?;

    let draft: TransactionDraft = TransactionDraft {
        receipt_number,
        volunteer_id,
        branch_id: volunteer.branch_id,
        program_id: request.program_id,
        payment_method_id: request.payment_method_id,
        donor_name: request.donor_name.clone(),
        donor_phone: request.donor_phone.clone(),
        amount,
        donated_on,
        notes: request.notes.clone(),
    };
    let transaction: DonationTransaction =
        DonationTransaction::record(draft, program.rate, actor.operator_id)?;
    let transaction_id: i64 = persistence.insert_transaction(&transaction)?;

    info!(
        transaction_id,
        receipt_number = %transaction.receipt_number,
        volunteer_id,
        recorded_by = actor.operator_id,
        amount = %amount,
        "Transaction recorded"
    );

    let stored: DonationTransaction =
        load_transaction(persistence, transaction_id, VisibilityScope::All)?;
    transaction_detail(actor, stored)
}

/// Fetches one transaction inside the caller's scope.
///
/// # Errors
///
/// Returns `ResourceNotFound` for unknown or out-of-scope transactions.
pub fn get_transaction(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    transaction_id: i64,
) -> Result<TransactionDetailResponse, ApiError> {
    let scope: VisibilityScope = resolve_scope(actor)?;
    let transaction: DonationTransaction = load_transaction(persistence, transaction_id, scope)?;
    transaction_detail(actor, transaction)
}

/// Lists one page of the caller's visible transactions, newest first.
///
/// # Errors
///
/// Returns `InvalidInput` for bad filters or paging.
pub fn list_transactions(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: &TransactionQuery,
) -> Result<ListTransactionsResponse, ApiError> {
    let mut filter: TransactionFilter = build_filter(actor, query)?;

    let limit: i64 = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::InvalidInput {
            field: String::from("limit"),
            message: format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
        });
    }
    let offset: i64 = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(invalid_input("offset", "Offset cannot be negative"));
    }

    let total: i64 = persistence.count_transactions(&filter)?;
    filter.limit = Some(limit);
    filter.offset = Some(offset);
    let transactions: Vec<DonationTransaction> = persistence.list_transactions(&filter)?;

    Ok(ListTransactionsResponse {
        transactions: collect_infos(transactions, transaction_info)?,
        total,
        limit,
        offset,
    })
}

/// Amends a pending transaction.
///
/// The allocation is recomputed from the new amount and the program's
/// current rate. Program or payment method changes must point at active
/// entries.
///
/// # Errors
///
/// Returns `ResourceNotFound` outside the caller's scope, `Unauthorized`
/// when the caller may not amend it, `DomainRuleViolation` once decided, or
/// `InvalidInput`.
pub fn update_transaction(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    transaction_id: i64,
    request: &UpdateTransactionRequest,
) -> Result<TransactionDetailResponse, ApiError> {
    let scope: VisibilityScope = resolve_scope(actor)?;
    let mut transaction: DonationTransaction =
        load_transaction(persistence, transaction_id, scope)?;
    AuthorizationService::authorize_amend_transaction(
        actor,
        transaction.recorded_by,
        transaction.branch_id,
        "update_transaction",
    )?;
    transaction.ensure_editable()?;

    let program: DonationProgram = load_program(persistence, request.program_id)?;
    if request.program_id != transaction.program_id {
        require_active_program(&program)?;
    }
    let method: PaymentMethod = load_payment_method(persistence, request.payment_method_id)?;
    if request.payment_method_id != transaction.payment_method_id {
        require_active_payment_method(&method)?;
    }

    validate_name(&request.donor_name)?;
    let donor_phone: Option<String> = request
        .donor_phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from);
    if let Some(phone) = donor_phone.as_deref() {
        validate_phone(phone)?;
    }

    transaction.program_id = request.program_id;
    transaction.payment_method_id = request.payment_method_id;
    transaction.donor_name = request.donor_name.trim().to_string();
    transaction.donor_phone = donor_phone;
    transaction.donated_on = parse_date(&request.donated_on)?;
    transaction.notes = request
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);
    transaction.reprice(Amount::new(request.amount)?, program.rate)?;

    persistence.update_transaction(transaction_id, &transaction)?;
    info!(transaction_id, amended_by = actor.operator_id, "Transaction amended");

    let stored: DonationTransaction = load_transaction(persistence, transaction_id, scope)?;
    transaction_detail(actor, stored)
}

/// Decides a pending transaction as valid or rejected.
///
/// # Errors
///
/// Returns `Unauthorized` unless the caller is an admin or validator,
/// `ResourceNotFound`, `DomainRuleViolation` once decided, or
/// `InvalidInput` for an unknown status or a rejection without reason.
pub fn validate_transaction(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    transaction_id: i64,
    request: &ValidateTransactionRequest,
) -> Result<TransactionDetailResponse, ApiError> {
    AuthorizationService::authorize_validate_transaction(actor)?;

    let scope: VisibilityScope = resolve_scope(actor)?;
    let mut transaction: DonationTransaction =
        load_transaction(persistence, transaction_id, scope)?;
    let target: TransactionStatus = TransactionStatus::from_str(&request.status)?;
    transaction.decide(target, request.reason.as_deref(), actor.operator_id)?;

    persistence.set_transaction_status(
        transaction_id,
        transaction.status,
        actor.operator_id,
        transaction.rejection_reason.as_deref(),
    )?;

    info!(
        transaction_id,
        status = %transaction.status,
        validated_by = actor.operator_id,
        "Transaction decided"
    );

    let stored: DonationTransaction = load_transaction(persistence, transaction_id, scope)?;
    transaction_detail(actor, stored)
}

/// Deletes a pending transaction.
///
/// # Errors
///
/// Returns `ResourceNotFound` outside the caller's scope, `Unauthorized`,
/// or `DomainRuleViolation` once decided.
pub fn delete_transaction(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    transaction_id: i64,
) -> Result<DeleteTransactionResponse, ApiError> {
    let scope: VisibilityScope = resolve_scope(actor)?;
    let transaction: DonationTransaction = load_transaction(persistence, transaction_id, scope)?;
    AuthorizationService::authorize_amend_transaction(
        actor,
        transaction.recorded_by,
        transaction.branch_id,
        "delete_transaction",
    )?;
    transaction.ensure_editable()?;

    persistence.delete_transaction(transaction_id)?;
    info!(
        transaction_id,
        receipt_number = %transaction.receipt_number,
        deleted_by = actor.operator_id,
        "Transaction deleted"
    );

    Ok(DeleteTransactionResponse {
        transaction_id,
        message: format!("Transaction {} deleted", transaction.receipt_number),
        receipt_number: transaction.receipt_number,
    })
}

// ========================================================================
// Reports
// ========================================================================

fn report_transactions(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: &TransactionQuery,
) -> Result<(VisibilityScope, Vec<DonationTransaction>), ApiError> {
    AuthorizationService::authorize_view_reports(actor)?;
    let filter: TransactionFilter = build_filter(actor, query)?;
    let transactions: Vec<DonationTransaction> = persistence.list_transactions(&filter)?;
    Ok((filter.scope, transactions))
}

/// Totals and breakdowns over every visible transaction matching the
/// filters. Paging is ignored.
///
/// # Errors
///
/// Returns `Unauthorized` for volunteers or `InvalidInput` for bad filters.
pub fn transaction_summary(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: &TransactionQuery,
) -> Result<TransactionSummaryResponse, ApiError> {
    let (scope, transactions) = report_transactions(persistence, actor, query)?;
    let labels: ReportLabels = ReportLabels::load(persistence)?;
    let summary: TransactionSummary = summarize(&summary_rows(&transactions, &labels))?;

    Ok(TransactionSummaryResponse { scope, summary })
}

/// Renders every visible transaction matching the filters as CSV.
///
/// # Errors
///
/// Returns `Unauthorized` for volunteers, `InvalidInput` for bad filters,
/// or `Internal` if rendering fails.
pub fn export_transactions_csv(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    query: &TransactionQuery,
) -> Result<String, ApiError> {
    let (_, transactions) = report_transactions(persistence, actor, query)?;
    let labels: ReportLabels = ReportLabels::load(persistence)?;
    let csv: String =
        write_transactions_csv(&transactions, &labels).map_err(|e| ApiError::Internal {
            message: format!("Failed to render export: {e}"),
        })?;

    info!(
        operator_id = actor.operator_id,
        rows = transactions.len(),
        "Transactions exported"
    );
    Ok(csv)
}

// ========================================================================
// Rate propagation
// ========================================================================

/// Rewrites recorded transactions to their program's current rate.
///
/// # Errors
///
/// Returns `Unauthorized` for non-admins or `ResourceNotFound` for an
/// unknown program.
pub fn propagate_rates(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    request: PropagateRatesRequest,
) -> Result<PropagateRatesResponse, ApiError> {
    AuthorizationService::authorize_propagate_rates(actor)?;
    run_rate_propagation(persistence, request)
}

/// Runs rate propagation without an authenticated caller, for the command
/// line.
///
/// # Errors
///
/// Returns `ResourceNotFound` for an unknown program, or a storage error.
pub fn run_rate_propagation(
    persistence: &mut Persistence,
    request: PropagateRatesRequest,
) -> Result<PropagateRatesResponse, ApiError> {
    if let Some(program_id) = request.program_id {
        load_program(persistence, program_id)?;
    }

    let report: RatePropagationReport = persistence.propagate_rates(RatePropagationOptions {
        program_id: request.program_id,
        pending_only: request.pending_only,
        dry_run: request.dry_run,
    })?;

    let verb: &str = if report.dry_run {
        "would be updated"
    } else {
        "updated"
    };
    let message: String = format!(
        "{} of {} transactions across {} programs {verb}",
        report.transactions_updated, report.transactions_examined, report.programs_scanned
    );

    Ok(PropagateRatesResponse {
        programs_scanned: report.programs_scanned,
        transactions_examined: report.transactions_examined,
        transactions_updated: report.transactions_updated,
        dry_run: report.dry_run,
        message,
    })
}
