//! Dashboard module
//!
//! Provides an overview page showing the user's totals, top expense categories
//! and charts, kept up to date with server-sent events.

mod aggregation;
mod cards;
mod charts;
mod handlers;
mod live;

pub use aggregation::{
    DEFAULT_TOP_CATEGORIES, MONTHS_IN_SERIES, MonthlyTotals, Summary, expense_share_percent,
    month_abbrev, month_label, summarize,
};
pub use handlers::get_dashboard_page;
pub use live::get_live_updates;
