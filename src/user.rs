//! The user model, its table and the registration and login services.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash, UserInput};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to
/// better compile time errors, and more flexible generics that can have
/// distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's unique username.
    pub username: String,
    /// The user's unique email address.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

impl User {
    /// Check that `candidate` matches the user's stored password.
    ///
    /// # Errors
    ///
    /// Returns an [Error::HashingError] if the stored value is not a valid
    /// bcrypt hash.
    pub fn verify_password(&self, candidate: &str) -> Result<bool, Error> {
        self.password_hash.verify(candidate)
    }
}

/// Create the user table.
///
/// Username and email uniqueness is enforced here, by the store, so that
/// concurrent registrations racing past the service-level checks still
/// cannot produce duplicates.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Validate `input`, hash its password and insert a new user.
///
/// `cost` is the bcrypt cost passed to [PasswordHash::new]; use
/// [PasswordHash::DEFAULT_COST] outside of tests.
///
/// The collision checks and the insert run in a single transaction which is
/// rolled back on any failure, so either exactly one row is created or none
/// is. The checks are advisory only: under concurrent registration the
/// unique indexes on the user table are the real enforcement, and a
/// constraint violation at insert time surfaces as the same
/// [Error::UsernameTaken]/[Error::EmailTaken].
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidInput] if `input` fails validation,
/// - [Error::UsernameTaken] if the username is already registered,
/// - [Error::EmailTaken] if the email address is already registered,
/// - [Error::HashingError] if the password could not be hashed,
/// - [Error::SqlError] if there was an unexpected SQL error.
pub fn create_user(input: UserInput, cost: u32, connection: &Connection) -> Result<User, Error> {
    input.validate()?;
    let password_hash = PasswordHash::new(&input.password, cost)?;

    let tx = connection.unchecked_transaction()?;

    let username_taken: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM user WHERE username = :username)",
        &[(":username", &input.username)],
        |row| row.get(0),
    )?;
    if username_taken {
        return Err(Error::UsernameTaken);
    }

    let email_taken: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM user WHERE email = :email)",
        &[(":email", &input.email)],
        |row| row.get(0),
    )?;
    if email_taken {
        return Err(Error::EmailTaken);
    }

    let user = tx
        .prepare(
            "INSERT INTO user (username, email, password)
             VALUES (?1, ?2, ?3)
             RETURNING id, username, email, password",
        )?
        .query_row(
            (&input.username, &input.email, password_hash.as_ref()),
            map_user_row,
        )?;

    tx.commit()?;

    tracing::info!("registered user {} ({})", user.username, user.id);

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with the given `username`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::NotFound] if no user has the given username,
/// - [Error::SqlError] if there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE username = :username")?
        .query_row(&[(":username", &username)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}

/// Look up the user with `username` and check `password` against their
/// stored hash.
///
/// An unknown username and a wrong password both produce
/// [Error::InvalidCredentials] so that a failed login does not reveal which
/// of the two was wrong.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidCredentials] if the username is unknown or the password
///   does not match,
/// - [Error::SqlError] if there was an error trying to access the store.
pub fn authenticate(username: &str, password: &str, connection: &Connection) -> Result<User, Error> {
    let user = get_user_by_username(username, connection).map_err(|error| match error {
        Error::NotFound => Error::InvalidCredentials,
        error => error,
    })?;

    if user.verify_password(password)? {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

/// Map a database row to a [User].
fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let username = row.get(1)?;
    let raw_email: String = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(raw_id),
        username,
        email: EmailAddress::new_unchecked(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
