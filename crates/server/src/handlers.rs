// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! HTTP route handlers.
//!
//! Each handler extracts its inputs, locks persistence for the duration of
//! one API call, and maps the result onto JSON. Mutations that dashboards
//! care about are announced on the live event stream after the lock is
//! released.

use axum::{
    Json,
    extract::{Path, Query, State as AxumState},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use donation_api::{
    BootstrapStatusResponse, BranchInfo, BranchRequest, ChangePasswordRequest,
    ChangePasswordResponse, CreateFirstAdminRequest, CreateFirstAdminResponse,
    CreateOperatorRequest, CreateOperatorResponse, CreateTeamRequest, CreateVolunteerRequest,
    DeleteTransactionResponse, ListBranchesResponse, ListOperatorsResponse,
    ListPaymentMethodsResponse, ListProgramsResponse, ListTeamsResponse,
    ListTransactionsResponse, ListVolunteersResponse, LoginRequest, LoginResponse,
    OperatorStatusResponse, PaymentMethodInfo, PaymentMethodRequest, ProgramInfo,
    ProgramRequest, PropagateRatesRequest, PropagateRatesResponse, RecordTransactionRequest,
    ResetPasswordRequest, ResetPasswordResponse, TeamInfo, TeamQuery, TransactionDetailResponse,
    TransactionQuery, TransactionSummaryResponse, UpdateTeamRequest, UpdateTransactionRequest,
    UpdateVolunteerRequest, ValidateTransactionRequest, VolunteerInfo, VolunteerQuery,
    WhoAmIResponse,
};
use tracing::info;

use crate::{
    AppState, HttpError,
    live::LiveEvent,
    session::{SessionOperator, bearer_token},
};

// ========================================================================
// Authentication and bootstrap
// ========================================================================

/// Handler for POST `/auth/login`.
pub async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(login_name = %req.login_name, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse = donation_api::login(&mut persistence, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/auth/logout`.
///
/// Deletes the session named by the bearer token.
pub async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    headers: HeaderMap,
) -> Result<StatusCode, HttpError> {
    info!(operator_id = actor.operator_id, "Handling logout request");

    let token: &str = bearer_token(&headers)?;
    let mut persistence = app_state.persistence.lock().await;
    donation_api::logout(&mut persistence, token)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/auth/me`.
pub async fn handle_whoami(
    SessionOperator(actor, operator): SessionOperator,
) -> Result<Json<WhoAmIResponse>, HttpError> {
    Ok(Json(donation_api::whoami(&actor, &operator)?))
}

/// Handler for POST `/auth/change-password`.
pub async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, operator): SessionOperator,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, HttpError> {
    info!(operator_id = actor.operator_id, "Handling change_password request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ChangePasswordResponse =
        donation_api::change_password(&mut persistence, &operator, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/auth/bootstrap/status`.
pub async fn handle_bootstrap_status(
    AxumState(app_state): AxumState<AppState>,
) -> Result<Json<BootstrapStatusResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: BootstrapStatusResponse = donation_api::check_bootstrap_status(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/auth/bootstrap/first-admin`.
///
/// Only succeeds while no operator exists.
pub async fn handle_create_first_admin(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<CreateFirstAdminRequest>,
) -> Result<Json<CreateFirstAdminResponse>, HttpError> {
    info!(login_name = %req.login_name, "Handling create_first_admin request");

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateFirstAdminResponse =
        donation_api::create_first_admin(&mut persistence, &req)?;
    drop(persistence);

    Ok(Json(response))
}

// ========================================================================
// Operators
// ========================================================================

/// Handler for GET `/operators`.
pub async fn handle_list_operators(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, operator): SessionOperator,
) -> Result<Json<ListOperatorsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListOperatorsResponse =
        donation_api::list_operators(&mut persistence, &actor, &operator)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/operators`.
pub async fn handle_create_operator(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<CreateOperatorRequest>,
) -> Result<Json<CreateOperatorResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        login_name = %req.login_name,
        role = %req.role,
        "Handling create_operator request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateOperatorResponse =
        donation_api::create_operator(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/operators/{operator_id}`.
pub async fn handle_delete_operator(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(operator_id): Path<i64>,
) -> Result<Json<OperatorStatusResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        target_operator_id = operator_id,
        "Handling delete_operator request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: OperatorStatusResponse =
        donation_api::delete_operator(&mut persistence, &actor, operator_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/operators/{operator_id}/disable`.
pub async fn handle_disable_operator(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(operator_id): Path<i64>,
) -> Result<Json<OperatorStatusResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        target_operator_id = operator_id,
        "Handling disable_operator request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: OperatorStatusResponse =
        donation_api::disable_operator(&mut persistence, &actor, operator_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/operators/{operator_id}/enable`.
pub async fn handle_enable_operator(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(operator_id): Path<i64>,
) -> Result<Json<OperatorStatusResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        target_operator_id = operator_id,
        "Handling enable_operator request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: OperatorStatusResponse =
        donation_api::enable_operator(&mut persistence, &actor, operator_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/operators/{operator_id}/reset-password`.
pub async fn handle_reset_password(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(operator_id): Path<i64>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        target_operator_id = operator_id,
        "Handling reset_password request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ResetPasswordResponse =
        donation_api::reset_password(&mut persistence, &actor, operator_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

// ========================================================================
// Branches, teams, volunteers
// ========================================================================

/// Handler for GET `/branches`.
pub async fn handle_list_branches(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
) -> Result<Json<ListBranchesResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListBranchesResponse = donation_api::list_branches(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/branches`.
pub async fn handle_create_branch(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<BranchRequest>,
) -> Result<Json<BranchInfo>, HttpError> {
    info!(operator_id = actor.operator_id, code = %req.code, "Handling create_branch request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BranchInfo = donation_api::create_branch(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/branches/{branch_id}`.
pub async fn handle_get_branch(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
    Path(branch_id): Path<i64>,
) -> Result<Json<BranchInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: BranchInfo = donation_api::get_branch(&mut persistence, branch_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/branches/{branch_id}`.
pub async fn handle_update_branch(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(branch_id): Path<i64>,
    Json(req): Json<BranchRequest>,
) -> Result<Json<BranchInfo>, HttpError> {
    info!(operator_id = actor.operator_id, branch_id, "Handling update_branch request");

    let mut persistence = app_state.persistence.lock().await;
    let response: BranchInfo =
        donation_api::update_branch(&mut persistence, &actor, branch_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/branches/{branch_id}`.
pub async fn handle_delete_branch(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(branch_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(operator_id = actor.operator_id, branch_id, "Handling delete_branch request");

    let mut persistence = app_state.persistence.lock().await;
    donation_api::delete_branch(&mut persistence, &actor, branch_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/teams`.
pub async fn handle_list_teams(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<TeamQuery>,
) -> Result<Json<ListTeamsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListTeamsResponse = donation_api::list_teams(&mut persistence, &actor, query)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/teams`.
pub async fn handle_create_team(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<CreateTeamRequest>,
) -> Result<Json<TeamInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        branch_id = req.branch_id,
        "Handling create_team request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: TeamInfo = donation_api::create_team(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/teams/{team_id}`.
pub async fn handle_get_team(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(team_id): Path<i64>,
) -> Result<Json<TeamInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TeamInfo = donation_api::get_team(&mut persistence, &actor, team_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/teams/{team_id}`.
pub async fn handle_update_team(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(team_id): Path<i64>,
    Json(req): Json<UpdateTeamRequest>,
) -> Result<Json<TeamInfo>, HttpError> {
    info!(operator_id = actor.operator_id, team_id, "Handling update_team request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TeamInfo = donation_api::update_team(&mut persistence, &actor, team_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/teams/{team_id}`.
pub async fn handle_delete_team(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(team_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(operator_id = actor.operator_id, team_id, "Handling delete_team request");

    let mut persistence = app_state.persistence.lock().await;
    donation_api::delete_team(&mut persistence, &actor, team_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/volunteers`.
pub async fn handle_list_volunteers(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<VolunteerQuery>,
) -> Result<Json<ListVolunteersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListVolunteersResponse =
        donation_api::list_volunteers(&mut persistence, &actor, query)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/volunteers`.
pub async fn handle_create_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<CreateVolunteerRequest>,
) -> Result<Json<VolunteerInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        team_id = req.team_id,
        "Handling create_volunteer request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: VolunteerInfo = donation_api::create_volunteer(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/volunteers/{volunteer_id}`.
pub async fn handle_get_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(volunteer_id): Path<i64>,
) -> Result<Json<VolunteerInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: VolunteerInfo =
        donation_api::get_volunteer(&mut persistence, &actor, volunteer_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/volunteers/{volunteer_id}`.
pub async fn handle_update_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(volunteer_id): Path<i64>,
    Json(req): Json<UpdateVolunteerRequest>,
) -> Result<Json<VolunteerInfo>, HttpError> {
    info!(operator_id = actor.operator_id, volunteer_id, "Handling update_volunteer request");

    let mut persistence = app_state.persistence.lock().await;
    let response: VolunteerInfo =
        donation_api::update_volunteer(&mut persistence, &actor, volunteer_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/volunteers/{volunteer_id}/activate`.
pub async fn handle_activate_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(volunteer_id): Path<i64>,
) -> Result<Json<VolunteerInfo>, HttpError> {
    set_volunteer_active(&app_state, &actor, volunteer_id, true).await
}

/// Handler for POST `/volunteers/{volunteer_id}/deactivate`.
pub async fn handle_deactivate_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(volunteer_id): Path<i64>,
) -> Result<Json<VolunteerInfo>, HttpError> {
    set_volunteer_active(&app_state, &actor, volunteer_id, false).await
}

async fn set_volunteer_active(
    app_state: &AppState,
    actor: &donation_api::AuthenticatedActor,
    volunteer_id: i64,
    is_active: bool,
) -> Result<Json<VolunteerInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        volunteer_id,
        is_active,
        "Handling set_volunteer_active request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: VolunteerInfo =
        donation_api::set_volunteer_active(&mut persistence, actor, volunteer_id, is_active)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/volunteers/{volunteer_id}`.
pub async fn handle_delete_volunteer(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(volunteer_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(operator_id = actor.operator_id, volunteer_id, "Handling delete_volunteer request");

    let mut persistence = app_state.persistence.lock().await;
    donation_api::delete_volunteer(&mut persistence, &actor, volunteer_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

// ========================================================================
// Programs and payment methods
// ========================================================================

/// Handler for GET `/programs`.
pub async fn handle_list_programs(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
) -> Result<Json<ListProgramsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListProgramsResponse = donation_api::list_programs(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/programs`.
pub async fn handle_create_program(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<ProgramRequest>,
) -> Result<Json<ProgramInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        code = %req.code,
        rate = %req.rate,
        "Handling create_program request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: ProgramInfo = donation_api::create_program(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/programs/{program_id}`.
pub async fn handle_get_program(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
    Path(program_id): Path<i64>,
) -> Result<Json<ProgramInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ProgramInfo = donation_api::get_program(&mut persistence, program_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/programs/{program_id}`.
///
/// Changing the rate does not touch stored transactions; run rate
/// propagation for that.
pub async fn handle_update_program(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(program_id): Path<i64>,
    Json(req): Json<ProgramRequest>,
) -> Result<Json<ProgramInfo>, HttpError> {
    info!(operator_id = actor.operator_id, program_id, "Handling update_program request");

    let mut persistence = app_state.persistence.lock().await;
    let response: ProgramInfo =
        donation_api::update_program(&mut persistence, &actor, program_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/programs/{program_id}`.
pub async fn handle_delete_program(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(program_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(operator_id = actor.operator_id, program_id, "Handling delete_program request");

    let mut persistence = app_state.persistence.lock().await;
    donation_api::delete_program(&mut persistence, &actor, program_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/payment-methods`.
pub async fn handle_list_payment_methods(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
) -> Result<Json<ListPaymentMethodsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListPaymentMethodsResponse =
        donation_api::list_payment_methods(&mut persistence)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/payment-methods`.
pub async fn handle_create_payment_method(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<PaymentMethodRequest>,
) -> Result<Json<PaymentMethodInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        name = %req.name,
        "Handling create_payment_method request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: PaymentMethodInfo =
        donation_api::create_payment_method(&mut persistence, &actor, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/payment-methods/{payment_method_id}`.
pub async fn handle_get_payment_method(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(_actor, _operator): SessionOperator,
    Path(payment_method_id): Path<i64>,
) -> Result<Json<PaymentMethodInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: PaymentMethodInfo =
        donation_api::get_payment_method(&mut persistence, payment_method_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/payment-methods/{payment_method_id}`.
pub async fn handle_update_payment_method(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(payment_method_id): Path<i64>,
    Json(req): Json<PaymentMethodRequest>,
) -> Result<Json<PaymentMethodInfo>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        payment_method_id,
        "Handling update_payment_method request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: PaymentMethodInfo =
        donation_api::update_payment_method(&mut persistence, &actor, payment_method_id, &req)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for DELETE `/payment-methods/{payment_method_id}`.
pub async fn handle_delete_payment_method(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(payment_method_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    info!(
        operator_id = actor.operator_id,
        payment_method_id,
        "Handling delete_payment_method request"
    );

    let mut persistence = app_state.persistence.lock().await;
    donation_api::delete_payment_method(&mut persistence, &actor, payment_method_id)?;
    drop(persistence);

    Ok(StatusCode::NO_CONTENT)
}

// ========================================================================
// Transactions
// ========================================================================

/// Handler for GET `/transactions`.
///
/// Filters come from the query string and only narrow the caller's scope.
pub async fn handle_list_transactions(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<ListTransactionsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListTransactionsResponse =
        donation_api::list_transactions(&mut persistence, &actor, &query)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/transactions`.
pub async fn handle_record_transaction(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<RecordTransactionRequest>,
) -> Result<Json<TransactionDetailResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        volunteer_id = ?req.volunteer_id,
        program_id = req.program_id,
        "Handling record_transaction request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: TransactionDetailResponse =
        donation_api::record_transaction(&mut persistence, &actor, &req)?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::TransactionRecorded {
        transaction_id: response.transaction.transaction_id,
        receipt_number: response.transaction.receipt_number.clone(),
        branch_id: response.transaction.branch_id,
    });

    Ok(Json(response))
}

/// Handler for GET `/transactions/{transaction_id}`.
pub async fn handle_get_transaction(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionDetailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TransactionDetailResponse =
        donation_api::get_transaction(&mut persistence, &actor, transaction_id)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for PUT `/transactions/{transaction_id}`.
pub async fn handle_update_transaction(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(transaction_id): Path<i64>,
    Json(req): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionDetailResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        transaction_id,
        "Handling update_transaction request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: TransactionDetailResponse =
        donation_api::update_transaction(&mut persistence, &actor, transaction_id, &req)?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::TransactionUpdated {
        transaction_id,
        branch_id: response.transaction.branch_id,
    });

    Ok(Json(response))
}

/// Handler for POST `/transactions/{transaction_id}/validate`.
pub async fn handle_validate_transaction(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(transaction_id): Path<i64>,
    Json(req): Json<ValidateTransactionRequest>,
) -> Result<Json<TransactionDetailResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        transaction_id,
        status = %req.status,
        "Handling validate_transaction request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: TransactionDetailResponse =
        donation_api::validate_transaction(&mut persistence, &actor, transaction_id, &req)?;
    drop(persistence);

    app_state.live.broadcast(&LiveEvent::TransactionValidated {
        transaction_id,
        branch_id: response.transaction.branch_id,
        status: response.transaction.status,
    });

    Ok(Json(response))
}

/// Handler for DELETE `/transactions/{transaction_id}`.
pub async fn handle_delete_transaction(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Path(transaction_id): Path<i64>,
) -> Result<Json<DeleteTransactionResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        transaction_id,
        "Handling delete_transaction request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: DeleteTransactionResponse =
        donation_api::delete_transaction(&mut persistence, &actor, transaction_id)?;
    drop(persistence);

    app_state
        .live
        .broadcast(&LiveEvent::TransactionDeleted { transaction_id });

    Ok(Json(response))
}

// ========================================================================
// Reports and batch
// ========================================================================

/// Handler for GET `/reports/summary`.
pub async fn handle_transaction_summary(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionSummaryResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TransactionSummaryResponse =
        donation_api::transaction_summary(&mut persistence, &actor, &query)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/reports/transactions.csv`.
pub async fn handle_export_transactions(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Query(query): Query<TransactionQuery>,
) -> Result<Response, HttpError> {
    info!(operator_id = actor.operator_id, "Handling export_transactions request");

    let mut persistence = app_state.persistence.lock().await;
    let csv: String = donation_api::export_transactions_csv(&mut persistence, &actor, &query)?;
    drop(persistence);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"transactions.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Handler for POST `/admin/propagate-rates`.
pub async fn handle_propagate_rates(
    AxumState(app_state): AxumState<AppState>,
    SessionOperator(actor, _operator): SessionOperator,
    Json(req): Json<PropagateRatesRequest>,
) -> Result<Json<PropagateRatesResponse>, HttpError> {
    info!(
        operator_id = actor.operator_id,
        program_id = ?req.program_id,
        pending_only = req.pending_only,
        dry_run = req.dry_run,
        "Handling propagate_rates request"
    );

    let mut persistence = app_state.persistence.lock().await;
    let response: PropagateRatesResponse =
        donation_api::propagate_rates(&mut persistence, &actor, req)?;
    drop(persistence);

    if !response.dry_run {
        app_state.live.broadcast(&LiveEvent::RatesPropagated {
            program_id: req.program_id,
            transactions_updated: response.transactions_updated,
        });
    }

    Ok(Json(response))
}
