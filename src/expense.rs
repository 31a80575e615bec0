//! The expense model, its table, and the creation and listing services.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Category, DatabaseID, Error, ExpenseInput, UserID, user::get_user_by_id};

/// The format expense dates are supplied in and stored as.
const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A single recorded monetary outlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: DatabaseID,
    /// The date the money was spent.
    pub date: Date,
    /// A short description of what the money was spent on.
    pub concept: String,
    /// The amount of money spent.
    pub amount: f64,
    /// The category the expense belongs to, if any.
    pub category: Option<Category>,
    /// The ID of the user that recorded the expense.
    pub user_id: UserID,
}

/// Create the expense table.
///
/// The foreign key on `user_id` is the storage-level backstop for the owner
/// check in [create_expense]: an expense row can never outlive or precede
/// its owner.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                concept TEXT NOT NULL,
                amount REAL NOT NULL,
                category_id INTEGER,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Work out the date to record for an expense.
///
/// A missing date becomes today's date. A supplied date is parsed as
/// `YYYY-MM-DD`; if it cannot be parsed the expense is dated today and a
/// warning is logged. The caller observes the chosen date on the returned
/// [Expense].
fn resolve_date(raw_date: Option<&str>) -> Date {
    let today = OffsetDateTime::now_utc().date();

    match raw_date {
        None => today,
        Some(text) => match Date::parse(text, DATE_FORMAT) {
            Ok(date) => date,
            Err(error) => {
                tracing::warn!(
                    "could not parse expense date {text:?} ({error}), recording it as {today}"
                );
                today
            }
        },
    }
}

/// Validate `input` and insert a new expense owned by `owner`.
///
/// The owner check and the insert run in a single transaction which is
/// rolled back on any failure, so either exactly one row is created or none
/// is.
///
/// # Errors
///
/// This function will return a:
/// - [Error::InvalidInput] if `input` fails validation,
/// - [Error::OwnerNotFound] if `owner` does not refer to a registered user,
/// - [Error::SqlError] if there was an unexpected SQL error.
pub fn create_expense(
    input: ExpenseInput,
    owner: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    input.validate()?;

    let tx = connection.unchecked_transaction()?;

    get_user_by_id(owner, &tx).map_err(|error| match error {
        Error::NotFound => Error::OwnerNotFound(owner),
        error => error,
    })?;

    let date = resolve_date(input.date.as_deref());

    let expense = tx
        .prepare(
            "INSERT INTO expense (date, concept, amount, category_id, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, date, concept, amount, category_id, user_id",
        )?
        .query_row(
            (
                date,
                &input.concept,
                input.amount,
                input.category.map(Category::id),
                owner.as_i64(),
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            // Code 787 occurs when a FOREIGN KEY constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_)) if sql_error.extended_code == 787 => {
                Error::OwnerNotFound(owner)
            }
            error => error.into(),
        })?;

    tx.commit()?;

    Ok(expense)
}

/// Defines which expenses should be fetched by [list_expenses].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseQuery {
    /// Only include expenses dated on or after this date.
    pub date_from: Option<Date>,
    /// Only include expenses dated on or before this date.
    pub date_to: Option<Date>,
}

/// List the expenses owned by `owner`, optionally restricted to the closed
/// interval `[date_from, date_to]`.
///
/// Both bounds are inclusive and each may be supplied on its own. Results
/// are ordered by date and then by ID so repeated queries over the same
/// data return the same sequence. An owner with no matching expenses
/// produces an empty list, not an error.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    owner: UserID,
    filter: ExpenseQuery,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut query_string_parts =
        vec!["SELECT id, date, concept, amount, category_id, user_id FROM expense".to_string()];
    let mut where_clause_parts = vec!["user_id = ?1".to_string()];
    let mut query_parameters = vec![Value::Integer(owner.as_i64())];

    if let Some(date_from) = filter.date_from {
        where_clause_parts.push(format!("date >= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(date_from.to_string()));
    }

    if let Some(date_to) = filter.date_to {
        where_clause_parts.push(format!("date <= ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Text(date_to.to_string()));
    }

    query_string_parts.push(String::from("WHERE ") + &where_clause_parts.join(" AND "));
    query_string_parts.push("ORDER BY date ASC, id ASC".to_string());

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect()
}

/// Get the total number of expenses in the database.
///
/// # Errors
///
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_expenses(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| {
            row.get::<_, i64>(0).map(|count| count as usize)
        })
        .map_err(|error| error.into())
}

/// Map a database row to an [Expense].
fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let date = row.get(1)?;
    let concept = row.get(2)?;
    let amount = row.get(3)?;
    let category_id: Option<DatabaseID> = row.get(4)?;
    let user_id = UserID::new(row.get(5)?);

    Ok(Expense {
        id,
        date,
        concept,
        amount,
        category: category_id.and_then(Category::from_id),
        user_id,
    })
}

#[cfg(test)]
mod expense_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Category, Error, ExpenseInput, ExpenseQuery, UserID, UserInput,
        expense::{count_expenses, create_expense, list_expenses},
        initialize,
        user::{User, create_user},
    };

    fn init_db_with_user() -> (Connection, User) {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not create tables");

        let user = create_user(
            UserInput {
                username: "ana".to_string(),
                email: "ana@x.com".to_string(),
                password: "secret1".to_string(),
            },
            4,
            &conn,
        )
        .expect("Could not create test user");

        (conn, user)
    }

    fn test_input(date: Option<&str>) -> ExpenseInput {
        ExpenseInput {
            concept: "Groceries".to_string(),
            amount: 42.5,
            category: Some(Category::Comida),
            date: date.map(str::to_string),
        }
    }

    #[test]
    fn create_expense_succeeds() {
        let (conn, user) = init_db_with_user();

        let expense = create_expense(test_input(Some("2024-01-15")), user.id, &conn).unwrap();

        assert!(expense.id > 0);
        assert_eq!(expense.date, date!(2024 - 01 - 15));
        assert_eq!(expense.concept, "Groceries");
        assert_eq!(expense.amount, 42.5);
        assert_eq!(expense.category, Some(Category::Comida));
        assert_eq!(expense.user_id, user.id);
    }

    #[test]
    fn create_expense_defaults_to_today() {
        let (conn, user) = init_db_with_user();

        let expense = create_expense(test_input(None), user.id, &conn).unwrap();

        assert_eq!(expense.date, OffsetDateTime::now_utc().date());
    }

    #[test]
    fn create_expense_falls_back_to_today_on_unparseable_date() {
        let (conn, user) = init_db_with_user();

        let expense = create_expense(test_input(Some("15-01-2024")), user.id, &conn).unwrap();

        assert_eq!(expense.date, OffsetDateTime::now_utc().date());
    }

    #[test]
    fn create_expense_accepts_missing_category() {
        let (conn, user) = init_db_with_user();
        let input = ExpenseInput {
            category: None,
            ..test_input(None)
        };

        let expense = create_expense(input, user.id, &conn).unwrap();

        assert_eq!(expense.category, None);
    }

    #[test]
    fn create_expense_fails_on_non_positive_amount() {
        let (conn, user) = init_db_with_user();
        let input = ExpenseInput {
            amount: 0.0,
            ..test_input(None)
        };

        let result = create_expense(input, user.id, &conn);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(count_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn create_expense_fails_on_unknown_owner() {
        let (conn, user) = init_db_with_user();
        let unknown_owner = UserID::new(user.id.as_i64() + 1);

        let result = create_expense(test_input(None), unknown_owner, &conn);

        assert_eq!(result, Err(Error::OwnerNotFound(unknown_owner)));
        assert_eq!(count_expenses(&conn).unwrap(), 0);
    }

    #[test]
    fn list_expenses_returns_empty_for_no_matches() {
        let (conn, user) = init_db_with_user();

        let expenses = list_expenses(user.id, ExpenseQuery::default(), &conn).unwrap();

        assert_eq!(expenses, vec![]);
    }

    #[test]
    fn list_expenses_filters_by_inclusive_date_range() {
        let (conn, user) = init_db_with_user();

        for day in ["2023-12-31", "2024-01-01", "2024-01-15", "2024-01-31", "2024-02-01"] {
            create_expense(test_input(Some(day)), user.id, &conn).unwrap();
        }

        let filter = ExpenseQuery {
            date_from: Some(date!(2024 - 01 - 01)),
            date_to: Some(date!(2024 - 01 - 31)),
        };
        let expenses = list_expenses(user.id, filter, &conn).unwrap();

        let dates: Vec<_> = expenses.iter().map(|expense| expense.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 15),
                date!(2024 - 01 - 31)
            ]
        );
    }

    #[test]
    fn list_expenses_supports_open_ended_bounds() {
        let (conn, user) = init_db_with_user();

        for day in ["2024-01-01", "2024-02-01", "2024-03-01"] {
            create_expense(test_input(Some(day)), user.id, &conn).unwrap();
        }

        let from_only = ExpenseQuery {
            date_from: Some(date!(2024 - 02 - 01)),
            date_to: None,
        };
        assert_eq!(list_expenses(user.id, from_only, &conn).unwrap().len(), 2);

        let to_only = ExpenseQuery {
            date_from: None,
            date_to: Some(date!(2024 - 01 - 31)),
        };
        assert_eq!(list_expenses(user.id, to_only, &conn).unwrap().len(), 1);
    }

    #[test]
    fn list_expenses_only_returns_owner_expenses() {
        let (conn, owner) = init_db_with_user();
        let other_user = create_user(
            UserInput {
                username: "bob".to_string(),
                email: "bob@x.com".to_string(),
                password: "secret2".to_string(),
            },
            4,
            &conn,
        )
        .unwrap();

        create_expense(test_input(Some("2024-01-01")), owner.id, &conn).unwrap();
        create_expense(test_input(Some("2024-01-02")), other_user.id, &conn).unwrap();

        let expenses = list_expenses(owner.id, ExpenseQuery::default(), &conn).unwrap();

        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].user_id, owner.id);
    }

    #[test]
    fn list_expenses_orders_by_date_then_id() {
        let (conn, user) = init_db_with_user();

        // Inserted out of date order; same-day expenses tie-break on ID.
        let second = create_expense(test_input(Some("2024-01-02")), user.id, &conn).unwrap();
        let first = create_expense(test_input(Some("2024-01-01")), user.id, &conn).unwrap();
        let third = create_expense(test_input(Some("2024-01-02")), user.id, &conn).unwrap();

        let expenses = list_expenses(user.id, ExpenseQuery::default(), &conn).unwrap();

        let ids: Vec<_> = expenses.iter().map(|expense| expense.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn expenses_serialize_with_expected_fields() {
        let (conn, user) = init_db_with_user();
        create_expense(test_input(Some("2024-01-15")), user.id, &conn).unwrap();

        let expenses = list_expenses(user.id, ExpenseQuery::default(), &conn).unwrap();
        let json = serde_json::to_value(&expenses).unwrap();

        let record = &json[0];
        assert_eq!(record["date"], "2024-01-15");
        assert_eq!(record["concept"], "Groceries");
        assert_eq!(record["amount"], 42.5);
        assert_eq!(record["category"], "Comida");
    }
}
