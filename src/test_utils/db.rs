use std::str::FromStr;

use email_address::EmailAddress;
use rusqlite::Connection;

use crate::{
    auth::{PasswordHash, UserID, ValidatedPassword, create_user},
    db::initialize,
};

pub(crate) const TEST_EMAIL: &str = "test@example.com";
pub(crate) const TEST_PASSWORD: &str = "averysafeandsecurepassword";

/// Get an initialized in-memory database.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user with `email` and [TEST_PASSWORD].
///
/// The password is hashed with the minimum cost to keep tests fast.
pub(crate) fn insert_test_user(connection: &Connection, email: &str) -> UserID {
    let email = EmailAddress::from_str(email).expect("Invalid test email");
    let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4)
        .expect("Could not hash test password");

    create_user(email, password_hash, connection)
        .expect("Could not create test user")
        .id
}

/// Get an initialized in-memory database with a single user registered as [TEST_EMAIL].
pub(crate) fn get_test_connection_with_user() -> (Connection, UserID) {
    let connection = get_test_connection();
    let user_id = insert_test_user(&connection, TEST_EMAIL);

    (connection, user_id)
}
