//! Defines the route handler for the page that lists the user's transactions.
use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::UserID,
    dashboard::month_abbrev,
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    transaction::{Transaction, core::get_user_transactions},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Which transactions to show, decided by the sign of the amount.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFilter {
    #[default]
    All,
    Income,
    Expense,
}

impl TransactionFilter {
    fn matches(self, transaction: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Income => transaction.amount > 0.0,
            TransactionFilter::Expense => transaction.amount < 0.0,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TransactionFilter::All => "all",
            TransactionFilter::Income => "income",
            TransactionFilter::Expense => "expense",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TransactionFilter::All => "All",
            TransactionFilter::Income => "Income",
            TransactionFilter::Expense => "Expenses",
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default)]
    pub filter: TransactionFilter,
    #[serde(default)]
    pub search: String,
}

/// Format a date for the transactions table, e.g. "15 jan 2024".
pub fn format_day_label(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

/// Whether `transaction` contains `search` in its category, displayed date or amount.
///
/// `search` must already be lowercase.
fn matches_search(transaction: &Transaction, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }

    let haystacks = [
        transaction.category.to_lowercase(),
        format_day_label(transaction.date),
        transaction.date.to_string(),
        format_currency(transaction.amount),
        format!("{:.2}", transaction.amount.abs()),
    ];

    haystacks.iter().any(|haystack| haystack.contains(search))
}

/// Keep the transactions that match both the filter and the search text.
pub fn filter_transactions(
    transactions: Vec<Transaction>,
    filter: TransactionFilter,
    search: &str,
) -> Vec<Transaction> {
    let search = search.trim().to_lowercase();

    transactions
        .into_iter()
        .filter(|transaction| filter.matches(transaction) && matches_search(transaction, &search))
        .collect()
}

/// Render the current user's transactions, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_user_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?
    };

    let transactions = filter_transactions(transactions, query.filter, &query.search);

    Ok(transactions_view(&transactions, query.filter, &query.search).into_response())
}

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    }
}

fn filter_url(filter: TransactionFilter, search: &str) -> String {
    let mut url = format!("{}?filter={}", endpoints::TRANSACTIONS_VIEW, filter.as_str());

    if !search.is_empty() {
        let query = serde_urlencoded::to_string([("search", search)]).unwrap_or_default();
        url.push('&');
        url.push_str(&query);
    }

    url
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, transaction.id);
    let confirm_message = format!(
        "Are you sure you want to delete the {} transaction from {}? This cannot be undone.",
        format_currency(transaction.amount),
        format_day_label(transaction.date)
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                time datetime=(transaction.date) { (format_day_label(transaction.date)) }
            }
            td class=(TABLE_CELL_STYLE)
            {
                @if transaction.category.is_empty() {
                    span class="text-gray-400 dark:text-gray-500" { "-" }
                } @else {
                    span class=(CATEGORY_BADGE_STYLE) { (transaction.category) }
                }
            }
            td class=(TABLE_CELL_STYLE) { (transaction.type_) }
            td class={ "px-6 py-4 text-right " (amount_class(transaction.amount)) }
            {
                (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    type="button"
                    hx-delete=(delete_url)
                    hx-confirm=(confirm_message)
                    hx-target="closest tr"
                    hx-swap="delete"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

fn filter_links(active: TransactionFilter, search: &str) -> Markup {
    let filters = [
        TransactionFilter::All,
        TransactionFilter::Income,
        TransactionFilter::Expense,
    ];

    html! {
        nav class="flex gap-2" aria-label="Filter transactions"
        {
            @for filter in filters {
                @let style = if filter == active {
                    "px-3 py-1 rounded-full text-sm font-semibold bg-blue-600 text-white"
                } else {
                    "px-3 py-1 rounded-full text-sm font-semibold text-gray-700 bg-gray-100 \
                    hover:bg-gray-200 dark:bg-gray-800 dark:text-gray-300 dark:hover:bg-gray-700"
                };

                a
                    href=(filter_url(filter, search))
                    class=(style)
                    aria-current=[(filter == active).then_some("page")]
                {
                    (filter.label())
                }
            }
        }
    }
}

fn transactions_view(
    transactions: &[Transaction],
    filter: TransactionFilter,
    search: &str,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end gap-4"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "Create Transaction"
                    }
                }

                div class="flex flex-wrap items-center justify-between gap-4"
                {
                    (filter_links(filter, search))

                    form method="get" action=(endpoints::TRANSACTIONS_VIEW) class="flex gap-2"
                    {
                        input type="hidden" name="filter" value=(filter.as_str());

                        input
                            type="search"
                            name="search"
                            id="search"
                            placeholder="Search category, date or amount"
                            value=(search)
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div class="relative overflow-x-auto shadow-md rounded"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class="px-6 py-4 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (transaction_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}


#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints,
        test_utils::{
            assert_valid_html, get_test_connection_with_user, insert_test_user,
            parse_html_document,
        },
        transaction::{Transaction, core::create_transaction},
    };

    use super::{
        TransactionFilter, TransactionsPageState, TransactionsQuery, get_transactions_page,
    };

    fn row_ids(html: &Html) -> Vec<String> {
        html.select(&Selector::parse("tbody tr[data-transaction-id]").unwrap())
            .filter_map(|row| row.value().attr("data-transaction-id"))
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn lists_only_the_users_transactions_newest_first() {
        let (connection, user_id) = get_test_connection_with_user();
        let other_user_id = insert_test_user(&connection, "other@example.com");
        let older = create_transaction(
            Transaction::build(-10.0, date!(2024 - 01 - 01), "Food"),
            user_id,
            &connection,
        )
        .unwrap();
        let newer = create_transaction(
            Transaction::build(250.0, date!(2024 - 02 - 01), "Salary"),
            user_id,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(-99.0, date!(2024 - 03 - 01), "Food"),
            other_user_id,
            &connection,
        )
        .unwrap();
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response =
            get_transactions_page(State(state), Extension(user_id), Query(Default::default()))
                .await
                .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            row_ids(&html),
            vec![newer.id.to_string(), older.id.to_string()]
        );

        let delete_urls = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .filter_map(|button| button.value().attr("hx-delete"))
            .collect::<Vec<_>>();
        assert_eq!(
            delete_urls,
            vec![
                endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, newer.id),
                endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, older.id),
            ]
        );
    }

    #[tokio::test]
    async fn shows_empty_message_when_nothing_matches() {
        let (connection, user_id) = get_test_connection_with_user();
        create_transaction(
            Transaction::build(-10.0, date!(2024 - 01 - 01), "Food"),
            user_id,
            &connection,
        )
        .unwrap();
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            Query(TransactionsQuery {
                filter: TransactionFilter::Income,
                search: String::new(),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert!(row_ids(&html).is_empty());
        let body = html
            .select(&Selector::parse("tbody").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(body.contains("No transactions found"), "got {body:?}");
    }

    #[tokio::test]
    async fn marks_active_filter() {
        let (connection, user_id) = get_test_connection_with_user();
        let state = TransactionsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transactions_page(
            State(state),
            Extension(user_id),
            Query(TransactionsQuery {
                filter: TransactionFilter::Expense,
                search: "rent".to_owned(),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let active = html
            .select(&Selector::parse("nav[aria-label='Filter transactions'] a[aria-current=page]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect::<Vec<_>>();
        assert_eq!(active, vec!["/transactions?filter=expense&search=rent"]);
    }
}
