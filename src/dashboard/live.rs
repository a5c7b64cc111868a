//! Pushes dashboard updates to the browser with server-sent events.
//!
//! Each connection subscribes to the [ChangeFeed] and keeps its own snapshot of
//! the user's transactions and the categories. Changes are applied to the
//! snapshots and the affected parts of the dashboard are re-rendered and sent as
//! named events:
//! - `summary`: the summary cards as an HTML fragment
//! - `charts`: the chart data as JSON
//! - `categories`: the categories card as an HTML fragment

use std::{
    collections::VecDeque,
    convert::Infallible,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, stream};
use maud::PreEscaped;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    category::get_all_categories,
    change_feed::{
        CategorySnapshot, ChangeEvent, ChangeFeed, RecordKind, Subscription, TransactionSnapshot,
    },
    dashboard::{
        aggregation::summarize,
        cards::{CATEGORIES_ID, SUMMARY_ID, categories_view, summary_view},
        charts::{ChartData, EXPENSES_CHART_ID, MONTHLY_CHART_ID},
    },
    endpoints,
    html::HeadElement,
    timezone::get_local_date,
    transaction::get_user_transactions,
};

/// The state needed for streaming live dashboard updates.
#[derive(Debug, Clone)]
pub struct LiveUpdatesState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for LiveUpdatesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Stream updates to the dashboard of the logged in user.
///
/// The current state is sent as soon as the client connects, then again after
/// every change that affects the dashboard. The stream ends when the server
/// shuts down.
pub async fn get_live_updates(
    State(state): State<LiveUpdatesState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Error> {
    let dashboard = LiveDashboard::connect(state, user_id)?;
    let initial_updates = dashboard.full_refresh()?;

    tracing::debug!("user {user_id} connected to live dashboard updates");

    let events = stream::unfold(
        (dashboard, VecDeque::from(initial_updates)),
        |(mut dashboard, mut pending)| async move {
            loop {
                if let Some(update) = pending.pop_front() {
                    match update.into_event() {
                        Some(event) => return Some((Ok(event), (dashboard, pending))),
                        None => continue,
                    }
                }

                pending.extend(dashboard.next_updates().await?);
            }
        },
    );

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// A re-rendered part of the dashboard.
#[derive(Debug, Clone, PartialEq)]
enum LiveUpdate {
    Summary(String),
    Charts(ChartData),
    Categories(String),
}

impl LiveUpdate {
    fn into_event(self) -> Option<Event> {
        match self {
            LiveUpdate::Summary(html) => Some(Event::default().event("summary").data(html)),
            LiveUpdate::Categories(html) => Some(Event::default().event("categories").data(html)),
            LiveUpdate::Charts(data) => Event::default()
                .event("charts")
                .json_data(data)
                .inspect_err(|error| tracing::error!("could not serialize chart data: {error}"))
                .ok(),
        }
    }
}

/// The snapshots behind one live dashboard connection.
struct LiveDashboard {
    user_id: UserID,
    db_connection: Arc<Mutex<Connection>>,
    local_timezone: String,
    subscription: Subscription,
    transactions: TransactionSnapshot,
    categories: CategorySnapshot,
}

impl LiveDashboard {
    /// Subscribe to the change feed and load the snapshots.
    ///
    /// Subscribing first means no change can slip in between loading the
    /// snapshots and listening for changes.
    fn connect(state: LiveUpdatesState, user_id: UserID) -> Result<Self, Error> {
        let subscription = state
            .change_feed
            .subscribe(&[RecordKind::Transactions, RecordKind::Categories]);

        let mut dashboard = Self {
            user_id,
            db_connection: state.db_connection,
            local_timezone: state.local_timezone,
            subscription,
            transactions: TransactionSnapshot::default(),
            categories: CategorySnapshot::default(),
        };
        dashboard.reload()?;

        Ok(dashboard)
    }

    /// Replace the snapshots with the current contents of the database.
    fn reload(&mut self) -> Result<(), Error> {
        let connection = self
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        self.transactions = TransactionSnapshot::new(get_user_transactions(
            self.user_id,
            &connection,
        )?);
        self.categories = CategorySnapshot::new(get_all_categories(&connection)?);

        Ok(())
    }

    /// Wait for the next change that affects this dashboard.
    ///
    /// Returns `None` once the change feed has closed or the dashboard can no
    /// longer be rendered.
    async fn next_updates(&mut self) -> Option<Vec<LiveUpdate>> {
        loop {
            let result = match self.subscription.recv().await {
                Ok(event) => self.apply(event),
                Err(Error::ChangeFeedLagged(_)) => self
                    .reload()
                    .and_then(|_| self.full_refresh())
                    .map(Some),
                Err(Error::ChangeFeedClosed) => {
                    tracing::debug!("change feed closed, ending live updates");
                    return None;
                }
                Err(error) => Err(error),
            };

            match result {
                Ok(Some(updates)) => return Some(updates),
                Ok(None) => continue,
                Err(error) => {
                    tracing::error!("could not update live dashboard: {error}");
                    return None;
                }
            }
        }
    }

    /// Apply `event` to the snapshots.
    ///
    /// Returns `None` if the event does not change this user's dashboard.
    fn apply(&mut self, event: ChangeEvent) -> Result<Option<Vec<LiveUpdate>>, Error> {
        match event {
            ChangeEvent::Transaction { user_id, change } if user_id == self.user_id => {
                self.transactions.apply(change);
                self.summary_updates().map(Some)
            }
            ChangeEvent::Transaction { .. } => Ok(None),
            ChangeEvent::Category(change) => {
                self.categories.apply(change);
                Ok(Some(vec![self.categories_update()]))
            }
        }
    }

    fn full_refresh(&self) -> Result<Vec<LiveUpdate>, Error> {
        let mut updates = self.summary_updates()?;
        updates.push(self.categories_update());

        Ok(updates)
    }

    fn summary_updates(&self) -> Result<Vec<LiveUpdate>, Error> {
        let today = get_local_date(&self.local_timezone)?;
        let transactions = self.transactions.transactions();
        let summary = summarize(transactions, today);

        Ok(vec![
            LiveUpdate::Summary(summary_view(&summary, transactions.len()).into_string()),
            LiveUpdate::Charts(ChartData::from_summary(&summary)),
        ])
    }

    fn categories_update(&self) -> LiveUpdate {
        LiveUpdate::Categories(categories_view(self.categories.categories()).into_string())
    }
}

/// The client side of the live updates, swaps in fragments and updates the charts.
pub(super) fn live_updates_script() -> HeadElement {
    let script = format!(
        r#"document.addEventListener('DOMContentLoaded', function() {{
            const status = document.getElementById('live-status');
            const source = new EventSource('{endpoint}');
            const replaceWith = (id) => (event) => {{
                const element = document.getElementById(id);
                if (element) {{
                    element.outerHTML = event.data;
                }}
            }};

            source.addEventListener('open', () => {{ if (status) status.textContent = 'Live'; }});
            source.addEventListener('error', () => {{ if (status) status.textContent = 'Reconnecting…'; }});
            source.addEventListener('summary', replaceWith('{summary_id}'));
            source.addEventListener('categories', replaceWith('{categories_id}'));
            source.addEventListener('charts', function(event) {{
                const data = JSON.parse(event.data);
                const charts = window.dashboardCharts || {{}};
                const expenses = charts['{expenses_chart_id}'];
                if (expenses) {{
                    expenses.setOption({{ series: [{{ data: data.pie }}] }});
                }}
                const monthly = charts['{monthly_chart_id}'];
                if (monthly) {{
                    monthly.setOption({{
                        xAxis: [{{ data: data.months }}],
                        series: [{{ data: data.income }}, {{ data: data.expense }}]
                    }});
                }}
            }});
            window.addEventListener('beforeunload', () => source.close());
        }});"#,
        endpoint = endpoints::LIVE_UPDATES,
        summary_id = SUMMARY_ID,
        categories_id = CATEGORIES_ID,
        expenses_chart_id = EXPENSES_CHART_ID,
        monthly_chart_id = MONTHLY_CHART_ID,
    );

    HeadElement::ScriptSource(PreEscaped(script))
}
