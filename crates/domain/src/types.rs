// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use rust_decimal::Decimal;
use time::Date;

use crate::error::DomainError;
use crate::money::{Amount, Rate};
use crate::status::TransactionStatus;
use crate::validation::{
    normalize_code, validate_code, validate_email, validate_name, validate_phone,
    validate_rejection_reason,
};

/// A branch office that owns teams and, through them, volunteers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// The canonical numeric identifier assigned by the database.
    /// `None` indicates the branch has not been persisted yet.
    pub branch_id: Option<i64>,
    /// Short unique code, stored uppercase.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional postal address.
    pub address: Option<String>,
}

impl Branch {
    /// Creates a new unpersisted branch, normalizing and validating its fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the code or name is invalid.
    pub fn new(code: &str, name: &str, address: Option<&str>) -> Result<Self, DomainError> {
        let code: String = normalize_code(code);
        validate_code(&code)?;
        validate_name(name)?;
        Ok(Self {
            branch_id: None,
            code,
            name: name.trim().to_string(),
            address: non_empty(address),
        })
    }
}

/// A team of volunteers inside a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Database identifier, `None` until persisted.
    pub team_id: Option<i64>,
    /// Owning branch.
    pub branch_id: i64,
    /// Team name, unique within its branch.
    pub name: String,
}

impl Team {
    /// Creates a new unpersisted team.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn new(branch_id: i64, name: &str) -> Result<Self, DomainError> {
        validate_name(name)?;
        Ok(Self {
            team_id: None,
            branch_id,
            name: name.trim().to_string(),
        })
    }
}

/// A volunteer who collects donations.
///
/// The branch is always the branch of the volunteer's team; it is stored
/// alongside the team so that scoped queries need no join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volunteer {
    /// Database identifier, `None` until persisted.
    pub volunteer_id: Option<i64>,
    /// Team membership.
    pub team_id: i64,
    /// Branch of the team.
    pub branch_id: i64,
    /// Full name.
    pub name: String,
    /// Optional phone number.
    pub phone: Option<String>,
    /// Optional email address.
    pub email: Option<String>,
    /// Inactive volunteers cannot record new transactions.
    pub is_active: bool,
}

impl Volunteer {
    /// Creates a new active, unpersisted volunteer.
    ///
    /// # Errors
    ///
    /// Returns an error if the name, phone, or email is invalid.
    pub fn new(
        team_id: i64,
        branch_id: i64,
        name: &str,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> Result<Self, DomainError> {
        validate_name(name)?;
        let phone: Option<String> = non_empty(phone);
        let email: Option<String> = non_empty(email);
        if let Some(phone) = phone.as_deref() {
            validate_phone(phone)?;
        }
        if let Some(email) = email.as_deref() {
            validate_email(email)?;
        }
        Ok(Self {
            volunteer_id: None,
            team_id,
            branch_id,
            name: name.trim().to_string(),
            phone,
            email,
            is_active: true,
        })
    }
}

/// A donation program such as a fundraising campaign or a fund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationProgram {
    /// Database identifier, `None` until persisted.
    pub program_id: Option<i64>,
    /// Short unique code, stored uppercase.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Current allocation rate applied to the program's transactions.
    pub rate: Rate,
    /// Inactive programs accept no new transactions.
    pub is_active: bool,
}

impl DonationProgram {
    /// Creates a new active, unpersisted program.
    ///
    /// # Errors
    ///
    /// Returns an error if the code or name is invalid.
    pub fn new(
        code: &str,
        name: &str,
        description: Option<&str>,
        rate: Rate,
    ) -> Result<Self, DomainError> {
        let code: String = normalize_code(code);
        validate_code(&code)?;
        validate_name(name)?;
        Ok(Self {
            program_id: None,
            code,
            name: name.trim().to_string(),
            description: non_empty(description),
            rate,
            is_active: true,
        })
    }
}

/// A way donations are paid (cash, bank transfer, e-wallet...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    /// Database identifier, `None` until persisted.
    pub payment_method_id: Option<i64>,
    /// Display name, unique.
    pub name: String,
    /// Optional destination account number.
    pub account_number: Option<String>,
    /// Inactive methods accept no new transactions.
    pub is_active: bool,
}

impl PaymentMethod {
    /// Creates a new active, unpersisted payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn new(name: &str, account_number: Option<&str>) -> Result<Self, DomainError> {
        validate_name(name)?;
        Ok(Self {
            payment_method_id: None,
            name: name.trim().to_string(),
            account_number: non_empty(account_number),
            is_active: true,
        })
    }
}

/// The caller-supplied part of a new transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    /// Receipt number allocated for the transaction.
    pub receipt_number: String,
    /// Collecting volunteer.
    pub volunteer_id: i64,
    /// Branch of the collecting volunteer.
    pub branch_id: i64,
    /// Program the donation is for.
    pub program_id: i64,
    /// How the donation was paid.
    pub payment_method_id: i64,
    /// Donor display name.
    pub donor_name: String,
    /// Optional donor phone.
    pub donor_phone: Option<String>,
    /// Donated amount.
    pub amount: Amount,
    /// Day the donation was received.
    pub donated_on: Date,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// A single donation collected by a volunteer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationTransaction {
    /// Database identifier, `None` until persisted.
    pub transaction_id: Option<i64>,
    /// Human-facing receipt number, unique.
    pub receipt_number: String,
    /// Collecting volunteer.
    pub volunteer_id: i64,
    /// Branch of the collecting volunteer at recording time.
    pub branch_id: i64,
    /// Program the donation is for.
    pub program_id: i64,
    /// How the donation was paid.
    pub payment_method_id: i64,
    /// Donor display name.
    pub donor_name: String,
    /// Optional donor phone.
    pub donor_phone: Option<String>,
    /// Donated amount.
    pub amount: Amount,
    /// Program rate captured for this transaction.
    pub rate: Rate,
    /// `amount * rate / 100`, always derived.
    pub allocation: Decimal,
    /// Day the donation was received.
    pub donated_on: Date,
    /// Validation status.
    pub status: TransactionStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Operator who recorded the transaction.
    pub recorded_by: i64,
    /// Operator who decided the transaction.
    pub validated_by: Option<i64>,
    /// When the transaction was decided.
    pub validated_at: Option<String>,
    /// Why the transaction was rejected.
    pub rejection_reason: Option<String>,
    /// When the transaction was recorded.
    pub created_at: Option<String>,
}

impl DonationTransaction {
    /// Builds a new pending transaction from a draft, deriving the
    /// allocation from the program's current rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the donor name or phone is invalid, or the
    /// allocation overflows.
    pub fn record(
        draft: TransactionDraft,
        program_rate: Rate,
        recorded_by: i64,
    ) -> Result<Self, DomainError> {
        validate_name(&draft.donor_name)?;
        let donor_phone: Option<String> = non_empty(draft.donor_phone.as_deref());
        if let Some(phone) = donor_phone.as_deref() {
            validate_phone(phone)?;
        }
        Ok(Self {
            transaction_id: None,
            receipt_number: draft.receipt_number,
            volunteer_id: draft.volunteer_id,
            branch_id: draft.branch_id,
            program_id: draft.program_id,
            payment_method_id: draft.payment_method_id,
            donor_name: draft.donor_name.trim().to_string(),
            donor_phone,
            amount: draft.amount,
            rate: program_rate,
            allocation: program_rate.allocation_for(draft.amount)?,
            donated_on: draft.donated_on,
            status: TransactionStatus::Pending,
            notes: non_empty(draft.notes.as_deref()),
            recorded_by,
            validated_by: None,
            validated_at: None,
            rejection_reason: None,
            created_at: None,
        })
    }

    /// Fails if the transaction has already been decided.
    ///
    /// # Errors
    ///
    /// Returns `TransactionAlreadyDecided` for valid or rejected transactions.
    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status.is_decided() {
            return Err(DomainError::TransactionAlreadyDecided {
                transaction_id: self.transaction_id.unwrap_or_default(),
                status: self.status,
            });
        }
        Ok(())
    }

    /// Replaces amount and rate together, keeping the allocation consistent.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the allocation cannot be computed.
    /// The transaction is left unchanged in that case.
    pub fn reprice(&mut self, amount: Amount, rate: Rate) -> Result<(), DomainError> {
        self.allocation = rate.allocation_for(amount)?;
        self.amount = amount;
        self.rate = rate;
        Ok(())
    }

    /// Applies a validator's decision.
    ///
    /// A rejection must carry a reason; an acceptance drops any reason given.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is already decided, the target is
    /// not a decision, or a rejection has no reason.
    pub fn decide(
        &mut self,
        target: TransactionStatus,
        reason: Option<&str>,
        validator_id: i64,
    ) -> Result<(), DomainError> {
        self.ensure_editable()?;
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.rejection_reason = match target {
            TransactionStatus::Rejected => Some(validate_rejection_reason(reason)?),
            _ => None,
        };
        self.status = target;
        self.validated_by = Some(validator_id);
        Ok(())
    }
}

/// Trims an optional string and maps blank values to `None`.
fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
