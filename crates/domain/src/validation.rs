// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::Date;
use time::macros::format_description;

use crate::error::DomainError;

/// Maximum length of codes.
const MAX_CODE_LEN: usize = 16;

/// Maximum length of names.
const MAX_NAME_LEN: usize = 120;

/// Trims and uppercases a code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Validates a normalized branch or program code.
///
/// Codes are 1 to 16 characters of ASCII letters, digits, `-` or `_`.
///
/// # Errors
///
/// Returns `InvalidCode` if the code is empty, too long, or contains other characters.
pub fn validate_code(code: &str) -> Result<(), DomainError> {
    if code.is_empty() {
        return Err(DomainError::InvalidCode(String::from(
            "Code cannot be empty",
        )));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(DomainError::InvalidCode(format!(
            "Code must be at most {MAX_CODE_LEN} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::InvalidCode(format!(
            "Code '{code}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

/// Validates a display name.
///
/// # Errors
///
/// Returns `InvalidName` if the trimmed name is empty or too long.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    let trimmed: &str = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidName(String::from(
            "Name cannot be empty",
        )));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidName(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Validates a phone number.
///
/// An optional leading `+` followed by digits, spaces and dashes, with
/// between 6 and 20 digits in total.
///
/// # Errors
///
/// Returns `InvalidPhone` if the number is malformed.
pub fn validate_phone(phone: &str) -> Result<(), DomainError> {
    let body: &str = phone.trim().strip_prefix('+').unwrap_or_else(|| phone.trim());
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return Err(DomainError::InvalidPhone(format!(
            "'{phone}' may only contain digits, spaces and dashes"
        )));
    }
    let digits: usize = body.chars().filter(char::is_ascii_digit).count();
    if !(6..=20).contains(&digits) {
        return Err(DomainError::InvalidPhone(format!(
            "'{phone}' must contain between 6 and 20 digits"
        )));
    }
    Ok(())
}

/// Validates an email address.
///
/// This is a shape check only: one `@`, a non-empty local part, and a domain
/// containing a dot.
///
/// # Errors
///
/// Returns `InvalidEmail` if the address is malformed.
pub fn validate_email(email: &str) -> Result<(), DomainError> {
    let trimmed: &str = email.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(DomainError::InvalidEmail(format!("'{email}' is missing '@'")));
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || trimmed.contains(char::is_whitespace)
    {
        return Err(DomainError::InvalidEmail(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

/// Validates a rejection reason and returns it trimmed.
///
/// # Errors
///
/// Returns `MissingRejectionReason` if the reason is absent or blank.
pub fn validate_rejection_reason(reason: Option<&str>) -> Result<String, DomainError> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(ToString::to_string)
        .ok_or(DomainError::MissingRejectionReason)
}

/// Parses an ISO 8601 calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns `DateParseError` if the string is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).map_err(|e| {
        DomainError::DateParseError {
            date_string: value.to_string(),
            error: e.to_string(),
        }
    })
}

/// Formats a date as `YYYY-MM-DD`.
#[must_use]
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}
