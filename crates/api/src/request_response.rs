// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Amounts and rates travel as decimal strings; dates as `YYYY-MM-DD`.

use donation_domain::{TransactionStatus, TransactionSummary, VisibilityScope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ========================================================================
// Authentication
// ========================================================================

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    /// The operator login name (case-insensitive).
    pub login_name: String,
    /// The operator password.
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub session_token: String,
    /// The operator's identifier.
    pub operator_id: i64,
    /// The operator's login name.
    pub login_name: String,
    /// The operator's display name.
    pub display_name: String,
    /// The operator's role.
    pub role: String,
    /// When the session expires (UTC, `YYYY-MM-DD HH:MM:SS`).
    pub expires_at: String,
}

/// API response describing the current operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The operator's identifier.
    pub operator_id: i64,
    /// The operator's login name.
    pub login_name: String,
    /// The operator's display name.
    pub display_name: String,
    /// The operator's role.
    pub role: String,
    /// Branch binding for branch staff.
    pub branch_id: Option<i64>,
    /// Volunteer binding for volunteer accounts.
    pub volunteer_id: Option<i64>,
    /// Which transactions this operator sees.
    pub scope: VisibilityScope,
    /// Whether the operator is disabled.
    pub is_disabled: bool,
    /// What the dashboard should offer this operator.
    pub capabilities: GlobalCapabilities,
}

/// API response for the bootstrap check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStatusResponse {
    /// True while no operator exists.
    pub is_bootstrap_mode: bool,
}

/// API request to create the first admin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateFirstAdminRequest {
    /// Login name for the admin.
    pub login_name: String,
    /// Display name for the admin.
    pub display_name: String,
    /// Password for the admin.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
}

/// API response after creating the first admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFirstAdminResponse {
    /// The new operator's identifier.
    pub operator_id: i64,
    /// The stored login name.
    pub login_name: String,
    /// The display name.
    pub display_name: String,
    /// A success message.
    pub message: String,
}

// ========================================================================
// Operators
// ========================================================================

/// API request to create an operator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateOperatorRequest {
    /// Login name.
    pub login_name: String,
    /// Display name.
    pub display_name: String,
    /// Initial password.
    pub password: String,
    /// Password confirmation.
    pub password_confirmation: String,
    /// `Admin`, `Validator`, `BranchStaff` or `Volunteer`.
    pub role: String,
    /// Required for `BranchStaff`.
    #[serde(default)]
    pub branch_id: Option<i64>,
    /// Required for `Volunteer`.
    #[serde(default)]
    pub volunteer_id: Option<i64>,
}

/// API response after creating an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOperatorResponse {
    /// The new operator's identifier.
    pub operator_id: i64,
    /// The stored login name.
    pub login_name: String,
    /// The display name.
    pub display_name: String,
    /// The role.
    pub role: String,
}

/// Operator as listed for admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    /// The operator's identifier.
    pub operator_id: i64,
    /// Login name.
    pub login_name: String,
    /// Display name.
    pub display_name: String,
    /// Role.
    pub role: String,
    /// Branch binding.
    pub branch_id: Option<i64>,
    /// Volunteer binding.
    pub volunteer_id: Option<i64>,
    /// Whether the operator is disabled.
    pub is_disabled: bool,
    /// Creation timestamp.
    pub created_at: String,
    /// Last successful login.
    pub last_login_at: Option<String>,
    /// What may be done to this operator.
    pub capabilities: OperatorCapabilities,
}

/// API response for listing operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOperatorsResponse {
    /// All operators, ordered by login name.
    pub operators: Vec<OperatorInfo>,
}

/// API response for disable, enable and delete of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatusResponse {
    /// The affected operator.
    pub operator_id: i64,
    /// A success message.
    pub message: String,
}

/// API request to change one's own password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequest {
    /// The current password.
    pub current_password: String,
    /// The new password.
    pub new_password: String,
    /// Confirmation of the new password.
    pub new_password_confirmation: String,
}

/// API response after a password change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePasswordResponse {
    /// A success message.
    pub message: String,
}

/// API request for an admin to reset another operator's password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    /// The new password.
    pub new_password: String,
    /// Confirmation of the new password.
    pub new_password_confirmation: String,
}

/// API response after a password reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordResponse {
    /// The affected operator.
    pub operator_id: i64,
    /// A success message.
    pub message: String,
}

// ========================================================================
// Organisation
// ========================================================================

/// API request to create or replace a branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchRequest {
    /// Short unique code; stored uppercase.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
}

/// Branch information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// The branch identifier.
    pub branch_id: i64,
    /// Branch code.
    pub code: String,
    /// Branch name.
    pub name: String,
    /// Postal address.
    pub address: Option<String>,
}

/// API response for listing branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBranchesResponse {
    /// Branches ordered by code.
    pub branches: Vec<BranchInfo>,
}

/// API request to create a team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTeamRequest {
    /// The owning branch.
    pub branch_id: i64,
    /// Team name, unique within the branch.
    pub name: String,
}

/// API request to rename a team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTeamRequest {
    /// New team name.
    pub name: String,
}

/// Optional filters for team listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TeamQuery {
    /// Restrict to one branch.
    pub branch_id: Option<i64>,
}

/// Team information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    /// The team identifier.
    pub team_id: i64,
    /// The owning branch.
    pub branch_id: i64,
    /// Team name.
    pub name: String,
}

/// API response for listing teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTeamsResponse {
    /// Visible teams.
    pub teams: Vec<TeamInfo>,
}

/// API request to create a volunteer.
///
/// The branch is taken from the team.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateVolunteerRequest {
    /// The volunteer's team.
    pub team_id: i64,
    /// Full name.
    pub name: String,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// API request to replace a volunteer's details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateVolunteerRequest {
    /// The volunteer's team; moving teams may move the branch.
    pub team_id: i64,
    /// Full name.
    pub name: String,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the volunteer may still collect donations.
    pub is_active: bool,
}

/// Optional filters for volunteer listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct VolunteerQuery {
    /// Restrict to one branch.
    pub branch_id: Option<i64>,
    /// Restrict to one team.
    pub team_id: Option<i64>,
}

/// Volunteer information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerInfo {
    /// The volunteer identifier.
    pub volunteer_id: i64,
    /// Team membership.
    pub team_id: i64,
    /// Branch, derived from the team.
    pub branch_id: i64,
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Whether the volunteer may still collect donations.
    pub is_active: bool,
}

/// API response for listing volunteers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListVolunteersResponse {
    /// Visible volunteers ordered by name.
    pub volunteers: Vec<VolunteerInfo>,
}

// ========================================================================
// Catalog
// ========================================================================

/// API request to create or replace a donation program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgramRequest {
    /// Short unique code; stored uppercase.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Allocation rate in percent.
    pub rate: Decimal,
    /// Defaults to active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Donation program information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfo {
    /// The program identifier.
    pub program_id: i64,
    /// Program code.
    pub code: String,
    /// Program name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Current allocation rate in percent.
    pub rate: Decimal,
    /// Whether new donations may be recorded against it.
    pub is_active: bool,
}

/// API response for listing programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProgramsResponse {
    /// Programs ordered by code.
    pub programs: Vec<ProgramInfo>,
}

/// API request to create or replace a payment method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentMethodRequest {
    /// Unique display name.
    pub name: String,
    /// Destination account, if any.
    #[serde(default)]
    pub account_number: Option<String>,
    /// Defaults to active.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Payment method information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    /// The payment method identifier.
    pub payment_method_id: i64,
    /// Display name.
    pub name: String,
    /// Destination account.
    pub account_number: Option<String>,
    /// Whether new donations may use it.
    pub is_active: bool,
}

/// API response for listing payment methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPaymentMethodsResponse {
    /// Payment methods ordered by name.
    pub payment_methods: Vec<PaymentMethodInfo>,
}

// ========================================================================
// Transactions
// ========================================================================

/// API request to record a donation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecordTransactionRequest {
    /// The collecting volunteer. Volunteers may omit it.
    #[serde(default)]
    pub volunteer_id: Option<i64>,
    /// The program the donation is for.
    pub program_id: i64,
    /// How the money was paid.
    pub payment_method_id: i64,
    /// Donor name.
    pub donor_name: String,
    /// Donor phone.
    #[serde(default)]
    pub donor_phone: Option<String>,
    /// Donated amount.
    pub amount: Decimal,
    /// Donation date, `YYYY-MM-DD`.
    pub donated_on: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to amend a pending donation.
///
/// The collecting volunteer cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateTransactionRequest {
    /// The program the donation is for.
    pub program_id: i64,
    /// How the money was paid.
    pub payment_method_id: i64,
    /// Donor name.
    pub donor_name: String,
    /// Donor phone.
    #[serde(default)]
    pub donor_phone: Option<String>,
    /// Donated amount.
    pub amount: Decimal,
    /// Donation date, `YYYY-MM-DD`.
    pub donated_on: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// API request to decide a pending donation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ValidateTransactionRequest {
    /// `valid` or `rejected`.
    pub status: String,
    /// Required when rejecting.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Filters for transaction listings, reports and exports.
///
/// Every filter narrows the caller's scope; none can widen it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionQuery {
    /// `pending`, `valid` or `rejected`.
    pub status: Option<String>,
    /// Restrict to one program.
    pub program_id: Option<i64>,
    /// Restrict to one branch.
    pub branch_id: Option<i64>,
    /// Restrict to one volunteer.
    pub volunteer_id: Option<i64>,
    /// Restrict to one payment method.
    pub payment_method_id: Option<i64>,
    /// Inclusive lower date bound, `YYYY-MM-DD`.
    pub date_from: Option<String>,
    /// Inclusive upper date bound, `YYYY-MM-DD`.
    pub date_to: Option<String>,
    /// Page size for listings.
    pub limit: Option<i64>,
    /// Rows to skip for listings.
    pub offset: Option<i64>,
}

/// Donation transaction information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// The transaction identifier.
    pub transaction_id: i64,
    /// Human-facing receipt number.
    pub receipt_number: String,
    /// Collecting volunteer.
    pub volunteer_id: i64,
    /// Branch of the volunteer when recorded.
    pub branch_id: i64,
    /// Program.
    pub program_id: i64,
    /// Payment method.
    pub payment_method_id: i64,
    /// Donor name.
    pub donor_name: String,
    /// Donor phone.
    pub donor_phone: Option<String>,
    /// Donated amount.
    pub amount: Decimal,
    /// Allocation rate applied, in percent.
    pub rate: Decimal,
    /// Allocated share of the amount.
    pub allocation: Decimal,
    /// Donation date.
    pub donated_on: String,
    /// Validation status.
    pub status: TransactionStatus,
    /// Notes.
    pub notes: Option<String>,
    /// Operator who recorded it.
    pub recorded_by: i64,
    /// Operator who decided it.
    pub validated_by: Option<i64>,
    /// When it was decided.
    pub validated_at: Option<String>,
    /// Why it was rejected.
    pub rejection_reason: Option<String>,
    /// When it was recorded.
    pub created_at: Option<String>,
}

/// API response for a single transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetailResponse {
    /// The transaction.
    pub transaction: TransactionInfo,
    /// What the caller may do with it.
    pub capabilities: TransactionCapabilities,
}

/// API response for listing transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListTransactionsResponse {
    /// One page of transactions, newest first.
    pub transactions: Vec<TransactionInfo>,
    /// Matching transactions across all pages.
    pub total: i64,
    /// Page size used.
    pub limit: i64,
    /// Rows skipped.
    pub offset: i64,
}

/// API response after deleting a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTransactionResponse {
    /// The deleted transaction.
    pub transaction_id: i64,
    /// Its receipt number.
    pub receipt_number: String,
    /// A success message.
    pub message: String,
}

// ========================================================================
// Reports and batch
// ========================================================================

/// API response for the summary report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummaryResponse {
    /// The scope the totals were computed in.
    pub scope: VisibilityScope,
    /// Totals and breakdowns.
    pub summary: TransactionSummary,
}

/// API request to run rate propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PropagateRatesRequest {
    /// Restrict to one program.
    #[serde(default)]
    pub program_id: Option<i64>,
    /// Leave decided transactions untouched.
    #[serde(default)]
    pub pending_only: bool,
    /// Count without writing.
    #[serde(default)]
    pub dry_run: bool,
}

/// API response for a rate propagation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagateRatesResponse {
    /// Programs visited.
    pub programs_scanned: u64,
    /// Transactions loaded.
    pub transactions_examined: u64,
    /// Transactions rewritten, or that would be on a dry run.
    pub transactions_updated: u64,
    /// Whether nothing was written.
    pub dry_run: bool,
    /// A summary message.
    pub message: String,
}

// ========================================================================
// Capability Model
// ========================================================================

/// Represents whether a specific action is permitted.
///
/// Serializes to JSON as true/false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied,
}

impl Capability {
    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Creates a capability from a boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::Allowed } else { Self::Denied }
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_allowed())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        bool::deserialize(deserializer).map(Self::from_bool)
    }
}

/// Operator-level capabilities used to gate dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCapabilities {
    /// Create, disable and delete operators.
    pub can_manage_operators: Capability,
    /// Edit branches, programs and payment methods.
    pub can_manage_master_data: Capability,
    /// Edit teams and volunteers (own branch for branch staff).
    pub can_manage_volunteers: Capability,
    /// Record donations.
    pub can_record_transactions: Capability,
    /// Decide pending donations.
    pub can_validate_transactions: Capability,
    /// Read summary reports and exports.
    pub can_view_reports: Capability,
    /// Run rate propagation.
    pub can_propagate_rates: Capability,
}

/// Capabilities on one operator account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCapabilities {
    /// Whether this operator can be disabled.
    pub can_disable: Capability,
    /// Whether this operator can be deleted.
    pub can_delete: Capability,
}

/// Capabilities on one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCapabilities {
    /// Amend while pending.
    pub can_edit: Capability,
    /// Decide while pending.
    pub can_validate: Capability,
    /// Delete while pending.
    pub can_delete: Capability,
}
