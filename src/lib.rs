//! Gastos is the data and service core of a personal expense tracker.
//!
//! Users register with a unique username and email address, authenticate
//! against a bcrypt-hashed password, and record monetary expenses tagged
//! with a category and a date. This library validates input, enforces
//! uniqueness and ownership constraints, and persists records to SQLite.
//!
//! The web layer (routing, sessions, HTML rendering) lives outside this
//! crate and calls into the service functions exported here, passing in the
//! database connection it owns.

#![warn(missing_docs)]

mod category;
mod config;
mod database_id;
mod db;
mod expense;
mod logging;
mod password;
mod user;
mod validation;

pub use category::Category;
pub use config::{Config, ConfigError};
pub use database_id::DatabaseID;
pub use db::initialize;
pub use expense::{Expense, ExpenseQuery, count_expenses, create_expense, list_expenses};
pub use logging::init_tracing;
pub use password::PasswordHash;
pub use user::{
    User, UserID, authenticate, count_users, create_user, get_user_by_id, get_user_by_username,
};
pub use validation::{ExpenseInput, UserInput, ValidationError, Violation};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The input failed one or more shape or bounds checks.
    ///
    /// The inner error lists every violated constraint with a message that
    /// is safe to display to the client.
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    /// The username used to register is already taken. The client should try
    /// again with a different username.
    #[error("the username is already taken")]
    UsernameTaken,

    /// The email used to register is already in use. The client should try
    /// again with a different email address.
    #[error("the email is already in use")]
    EmailTaken,

    /// A uniqueness constraint was violated but the offending column could
    /// not be determined from the database error.
    #[error("the username or email is already in use")]
    Duplicate,

    /// The owner ID used to create an expense does not refer to a registered
    /// user.
    #[error("user {0} does not exist")]
    OwnerNotFound(UserID),

    /// A string was used as a category label that is not in the fixed
    /// category list.
    #[error("\"{0}\" is not a valid expense category")]
    UnknownCategory(String),

    /// The user provided an invalid combination of username and password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server
    /// error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error occurs when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("username") =>
            {
                Error::UsernameTaken
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::EmailTaken
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::Duplicate
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
