//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The route handler for displaying the dashboard
//! - The HTML view function for rendering the dashboard UI

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::{Category, get_all_categories},
    dashboard::{
        aggregation::summarize,
        cards::{categories_view, summary_view},
        charts::{charts_script, charts_view, dashboard_charts},
        live::live_updates_script,
    },
    endpoints,
    html::{HeadElement, PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{Transaction, get_user_transactions},
};

/// The state needed for displaying the dashboard page.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the dashboard with the user's totals, top categories and charts.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let today = get_local_date(&state.local_timezone)?;

    let (transactions, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transactions = get_user_transactions(user_id, &connection)
            .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;
        let categories = get_all_categories(&connection)
            .inspect_err(|error| tracing::error!("could not get categories: {error}"))?;

        (transactions, categories)
    };

    Ok(dashboard_view(&transactions, &categories, today).into_response())
}

fn dashboard_view(
    transactions: &[Transaction],
    categories: &[Category],
    today: time::Date,
) -> Markup {
    let summary = summarize(transactions, today);
    let charts = dashboard_charts(&summary);
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                div class="flex justify-between items-baseline mb-6"
                {
                    h1 class="text-2xl font-bold" { "Dashboard" }
                    span
                        id="live-status"
                        class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        "Connecting…"
                    }
                }

                (summary_view(&summary, transactions.len()))
                (charts_view(&charts))
                (categories_view(categories))
            }
        }
    };

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&charts),
        live_updates_script(),
    ];

    base("Dashboard", &scripts, &content)
}
