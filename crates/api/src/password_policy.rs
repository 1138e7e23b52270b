// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password rules for operator accounts.

use thiserror::Error;

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    /// Password is too short.
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    /// Password mixes too few character classes.
    #[error(
        "Password must contain at least {required} of the following: uppercase letter, lowercase letter, digit, symbol (found {found})"
    )]
    InsufficientComplexity { required: usize, found: usize },

    /// Password equals the login or display name.
    #[error("Password must not match {field}")]
    MatchesForbiddenField { field: String },

    /// Password and confirmation do not match.
    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Password policy configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length in characters.
    pub min_length: usize,
    /// Character classes required out of four.
    pub min_complexity: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 10,
            min_complexity: 3,
        }
    }
}

impl PasswordPolicy {
    /// Validates a new password for an operator.
    ///
    /// Name comparisons ignore case.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        login_name: &str,
        display_name: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        if password.chars().count() < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }

        let found: usize = Self::character_classes(password);
        if found < self.min_complexity {
            return Err(PasswordPolicyError::InsufficientComplexity {
                required: self.min_complexity,
                found,
            });
        }

        let lowered: String = password.to_lowercase();
        for (field, value) in [("login_name", login_name), ("display_name", display_name)] {
            if lowered == value.to_lowercase() {
                return Err(PasswordPolicyError::MatchesForbiddenField {
                    field: String::from(field),
                });
            }
        }

        Ok(())
    }

    /// Counts the character classes present: uppercase, lowercase, digit,
    /// and anything else printable.
    fn character_classes(password: &str) -> usize {
        let checks: [fn(&char) -> bool; 4] = [
            char::is_ascii_uppercase,
            char::is_ascii_lowercase,
            char::is_ascii_digit,
            |c: &char| !c.is_alphanumeric() && !c.is_whitespace(),
        ];
        checks
            .iter()
            .filter(|check| password.chars().any(|c| check(&c)))
            .count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn check(password: &str) -> Result<(), PasswordPolicyError> {
        PasswordPolicy::default().validate(password, password, "ana", "Ana Putri")
    }

    #[test]
    fn test_accepts_three_of_four_classes() {
        assert!(check("Zakat2026!x").is_ok());
        assert!(check("donasiku2026").is_err());
        assert!(check("Donasiku2026").is_ok());
        assert!(check("donasi-2026x").is_ok());
    }

    #[test]
    fn test_minimum_length_is_ten() {
        assert!(check("Abcdef12!x").is_ok());
        assert_eq!(
            check("Abcde12!x"),
            Err(PasswordPolicyError::TooShort { min_length: 10 })
        );
    }

    #[test]
    fn test_reports_found_classes() {
        assert_eq!(
            check("onlylowercase"),
            Err(PasswordPolicyError::InsufficientComplexity {
                required: 3,
                found: 1
            })
        );
        assert_eq!(
            check("MixedLetters"),
            Err(PasswordPolicyError::InsufficientComplexity {
                required: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_rejects_names_ignoring_case() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert_eq!(
            policy.validate("Branch-Staff1", "Branch-Staff1", "BRANCH-STAFF1", "Staff"),
            Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("login_name")
            })
        );
        assert_eq!(
            policy.validate("Ana Putri 01", "Ana Putri 01", "ana", "ana putri 01"),
            Err(PasswordPolicyError::MatchesForbiddenField {
                field: String::from("display_name")
            })
        );
    }

    #[test]
    fn test_confirmation_is_checked_first() {
        let policy: PasswordPolicy = PasswordPolicy::default();
        assert_eq!(
            policy.validate("short", "other", "ana", "Ana"),
            Err(PasswordPolicyError::ConfirmationMismatch)
        );
    }

    #[test]
    fn test_character_classes() {
        assert_eq!(PasswordPolicy::character_classes("Aa1!"), 4);
        assert_eq!(PasswordPolicy::character_classes("Aa1"), 3);
        assert_eq!(PasswordPolicy::character_classes("abc!"), 2);
        assert_eq!(PasswordPolicy::character_classes(""), 0);
    }
}
