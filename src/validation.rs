//! Input schemas for user registration and expense creation.
//!
//! Validation is pure: the same input always produces the same accept or
//! reject decision, and no check touches the database. Every violated
//! constraint is collected so the client can report them all at once.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};

use crate::Category;

/// The minimum number of characters in a username.
pub const USERNAME_MIN_LENGTH: usize = 3;
/// The maximum number of characters in a username.
pub const USERNAME_MAX_LENGTH: usize = 40;
/// The minimum number of characters in a password, before hashing.
pub const PASSWORD_MIN_LENGTH: usize = 6;
/// The maximum number of characters in a password, before hashing.
pub const PASSWORD_MAX_LENGTH: usize = 50;
/// The minimum number of characters in an expense concept.
pub const CONCEPT_MIN_LENGTH: usize = 3;
/// The maximum number of characters in an expense concept.
pub const CONCEPT_MAX_LENGTH: usize = 100;

/// A single violated constraint on a field of an input schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// The name of the field that failed validation.
    pub field: &'static str,
    /// A message describing the violated constraint, safe to show to the
    /// client.
    pub message: String,
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{}: {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// The input failed one or more shape or bounds checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("invalid input: {}", describe(.violations))]
pub struct ValidationError {
    /// Every constraint the input violated, in field order.
    pub violations: Vec<Violation>,
}

/// The data needed to register a new user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    /// The desired username. Must be unique across all users.
    pub username: String,
    /// The user's email address. Must be unique across all users.
    pub email: String,
    /// The plaintext password. Only ever stored as a bcrypt hash.
    pub password: String,
}

impl UserInput {
    /// Check the username, email and password against their bounds.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] listing every violated constraint if the
    /// username is not 3-40 characters, the email is not syntactically
    /// valid, or the password is not 6-50 characters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = vec![];

        let username_length = self.username.chars().count();
        if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&username_length) {
            violations.push(Violation {
                field: "username",
                message: format!(
                    "must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
                ),
            });
        }

        if !EmailAddress::is_valid(&self.email) {
            violations.push(Violation {
                field: "email",
                message: "must be a valid email address".to_string(),
            });
        }

        let password_length = self.password.chars().count();
        if !(PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&password_length) {
            violations.push(Violation {
                field: "password",
                message: format!(
                    "must be between {PASSWORD_MIN_LENGTH} and {PASSWORD_MAX_LENGTH} characters"
                ),
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// The data needed to record a new expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInput {
    /// A short description of what the money was spent on.
    pub concept: String,
    /// The amount of money spent. Must be strictly positive.
    pub amount: f64,
    /// The category the expense belongs to, if any.
    #[serde(default)]
    pub category: Option<Category>,
    /// The date of the expense as `YYYY-MM-DD` text. When missing or
    /// unparseable the expense service falls back to today's date.
    #[serde(default)]
    pub date: Option<String>,
}

impl ExpenseInput {
    /// Check the concept and amount against their bounds.
    ///
    /// The category is already constrained by the [Category] type and the
    /// date is handled leniently by the expense service, so neither is
    /// checked here.
    ///
    /// # Errors
    ///
    /// Returns a [ValidationError] listing every violated constraint if the
    /// concept is not 3-100 characters or the amount is not a positive,
    /// finite number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = vec![];

        let concept_length = self.concept.chars().count();
        if !(CONCEPT_MIN_LENGTH..=CONCEPT_MAX_LENGTH).contains(&concept_length) {
            violations.push(Violation {
                field: "concept",
                message: format!(
                    "must be between {CONCEPT_MIN_LENGTH} and {CONCEPT_MAX_LENGTH} characters"
                ),
            });
        }

        if !(self.amount.is_finite() && self.amount > 0.0) {
            violations.push(Violation {
                field: "amount",
                message: "must be a positive number".to_string(),
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }
}


#[cfg(test)]
mod expense_input_tests {
    use crate::{Category, validation::ExpenseInput};

    fn valid_input() -> ExpenseInput {
        ExpenseInput {
            concept: "Groceries".to_string(),
            amount: 42.5,
            category: Some(Category::Comida),
            date: None,
        }
    }

    #[test]
    fn validate_succeeds_on_valid_input() {
        assert_eq!(valid_input().validate(), Ok(()));
    }

    #[test]
    fn validate_fails_on_zero_amount() {
        let input = ExpenseInput {
            amount: 0.0,
            ..valid_input()
        };

        let error = input.validate().unwrap_err();

        assert_eq!(error.violations[0].field, "amount");
    }

    #[test]
    fn validate_fails_on_negative_amount() {
        let input = ExpenseInput {
            amount: -1.0,
            ..valid_input()
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn validate_fails_on_nan_amount() {
        let input = ExpenseInput {
            amount: f64::NAN,
            ..valid_input()
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn validate_fails_on_infinite_amount() {
        let input = ExpenseInput {
            amount: f64::INFINITY,
            ..valid_input()
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn validate_fails_on_short_concept() {
        let input = ExpenseInput {
            concept: "ab".to_string(),
            ..valid_input()
        };

        let error = input.validate().unwrap_err();

        assert_eq!(error.violations[0].field, "concept");
    }

    #[test]
    fn validate_fails_on_long_concept() {
        let input = ExpenseInput {
            concept: "x".repeat(101),
            ..valid_input()
        };

        assert!(input.validate().is_err());
    }

    #[test]
    fn error_message_lists_each_violation() {
        let input = ExpenseInput {
            concept: "ab".to_string(),
            amount: -5.0,
            category: None,
            date: None,
        };

        let message = input.validate().unwrap_err().to_string();

        assert!(message.contains("concept"), "got message: {message}");
        assert!(message.contains("amount"), "got message: {message}");
    }
}
