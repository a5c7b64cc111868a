//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    category::CategoryName,
    change_feed::{Change, ChangeEvent, ChangeFeed},
    endpoints,
    timezone::get_local_date,
    transaction::{Transaction, TransactionType, core::create_transaction},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Notifies live views of the new transaction.
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub type_: TransactionType,
    /// The value of the transaction in dollars, always positive.
    pub amount: f64,
    /// The name of the category the transaction belongs to.
    #[serde(default)]
    pub category: String,
    /// The date when the transaction ocurred.
    pub date: Date,
}

/// Turn the positive amount entered by the user into a signed amount.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `amount` is zero, negative or not finite.
fn signed_amount(amount: f64, type_: TransactionType) -> Result<f64, Error> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount(amount));
    }

    Ok(match type_ {
        TransactionType::Income => amount,
        TransactionType::Expense => -amount,
    })
}

/// A route handler for creating a new transaction, redirects to transactions view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let today = match get_local_date(&state.local_timezone) {
        Ok(date) => date,
        Err(error) => return error.into_alert_response(),
    };

    if form.date > today {
        tracing::warn!("Rejected transaction with future date {}", form.date);

        return Error::FutureDate(form.date).into_alert_response();
    }

    let amount = match signed_amount(form.amount, form.type_) {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let category = match CategoryName::new(&form.category) {
        Ok(category) => category,
        Err(error) => return error.into_alert_response(),
    };

    let builder = Transaction::build(amount, form.date, category.as_ref()).type_(form.type_);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let transaction = match create_transaction(builder, user_id, &connection) {
        Ok(transaction) => transaction,
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    };

    state.change_feed.publish(ChangeEvent::Transaction {
        user_id,
        change: Change::Inserted(transaction),
    });

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::UserID,
        change_feed::{Change, ChangeEvent, ChangeFeed, RecordKind},
        endpoints,
        test_utils::{assert_hx_redirect, get_test_connection_with_user, parse_html_fragment},
        transaction::{
            TransactionType,
            core::{count_transactions, get_transaction},
            create_endpoint::{CreateTransactionState, TransactionForm},
            create_transaction_endpoint,
        },
    };

    fn get_state() -> (CreateTransactionState, UserID) {
        let (connection, user_id) = get_test_connection_with_user();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
            change_feed: ChangeFeed::default(),
        };

        (state, user_id)
    }

    fn form(type_: TransactionType, amount: f64, category: &str) -> TransactionForm {
        TransactionForm {
            type_,
            amount,
            category: category.to_owned(),
            date: OffsetDateTime::now_utc().date(),
        }
    }

    #[tokio::test]
    async fn can_create_expense() {
        let (state, user_id) = get_state();
        let mut subscription = state.change_feed.subscribe(&[RecordKind::Transactions]);

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form(TransactionType::Expense, 12.3, "Food")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);

        let transaction = get_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transaction.amount, -12.3);
        assert_eq!(transaction.category, "Food");
        assert_eq!(transaction.type_, TransactionType::Expense);
        assert_eq!(transaction.user_id, user_id);
        assert_eq!(
            subscription.recv().await,
            Ok(ChangeEvent::Transaction {
                user_id,
                change: Change::Inserted(transaction),
            })
        );
    }

    #[tokio::test]
    async fn can_create_income() {
        let (state, user_id) = get_state();

        create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form(TransactionType::Income, 500.0, "Salary")),
        )
        .await;

        let transaction = get_transaction(1, &state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(transaction.amount, 500.0);
        assert_eq!(transaction.type_, TransactionType::Income);
    }

    #[tokio::test]
    async fn rejects_future_date() {
        let (state, user_id) = get_state();
        let tomorrow = OffsetDateTime::now_utc().date() + Duration::days(1);

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(TransactionForm {
                date: tomorrow,
                ..form(TransactionType::Expense, 1.0, "Food")
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Invalid transaction date"), "got {text:?}");
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let (state, user_id) = get_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form(TransactionType::Expense, 0.0, "Food")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(count_transactions(&state.db_connection.lock().unwrap()), Ok(0));
    }

    #[tokio::test]
    async fn rejects_missing_category() {
        let (state, user_id) = get_state();

        let response = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Form(form(TransactionType::Expense, 5.0, " ")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Missing category"), "got {text:?}");
    }
}
