//! Database schema bootstrap.

use rusqlite::Connection;

use crate::{Error, expense::create_expense_table, user::create_user_table};

/// Create the application tables if they do not exist and enable foreign
/// key enforcement on `connection`.
///
/// SQLite only enforces foreign keys when the pragma is switched on for the
/// connection, so every connection handed to the services must go through
/// this function first.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if a table could not be
/// created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let tx = connection.unchecked_transaction()?;

    create_user_table(&tx)?;
    create_expense_table(&tx)?;

    tx.commit()?;

    Ok(())
}
