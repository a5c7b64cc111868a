//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations from a [Summary]:
//! - **Expenses by Category**: pie chart of the expense breakdown
//! - **Income vs Expenses**: bar chart of the monthly series
//!
//! The initial chart options are generated with `charming` and rendered into the
//! page. Live updates only send the changed data ([ChartData]) as JSON, which the
//! client merges into the existing chart instances.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, Emphasis, EmphasisFocus, JsFunction,
        Tooltip, Trigger,
    },
    series::{Pie, bar},
};
use maud::{Markup, PreEscaped, html};
use serde::Serialize;

use crate::{
    dashboard::{aggregation::Summary, cards::category_display_name},
    html::HeadElement,
};

/// The HTML element ID of the expenses pie chart.
pub(super) const EXPENSES_CHART_ID: &str = "expenses-by-category-chart";
/// The HTML element ID of the monthly income and expenses chart.
pub(super) const MONTHLY_CHART_ID: &str = "monthly-chart";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// The charts shown on the dashboard for `summary`.
pub(super) fn dashboard_charts(summary: &Summary) -> [DashboardChart; 2] {
    [
        DashboardChart {
            id: EXPENSES_CHART_ID,
            options: expenses_by_category_chart(summary).to_string(),
        },
        DashboardChart {
            id: MONTHLY_CHART_ID,
            options: monthly_chart(summary).to_string(),
        },
    ]
}

/// A slice of the expenses pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct PieSlice {
    pub name: String,
    pub value: f64,
}

/// The data behind the dashboard charts, sent to the client on live updates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(super) struct ChartData {
    /// The expense breakdown for the pie chart.
    pub pie: Vec<PieSlice>,
    /// The month labels for the x-axis of the monthly chart.
    pub months: Vec<String>,
    /// Income per month, aligned with `months`.
    pub income: Vec<f64>,
    /// Expenses per month, aligned with `months`.
    pub expense: Vec<f64>,
}

impl ChartData {
    pub(super) fn from_summary(summary: &Summary) -> Self {
        Self {
            pie: summary
                .expense_by_category
                .iter()
                .map(|(label, amount)| PieSlice {
                    name: category_display_name(label).to_owned(),
                    value: *amount,
                })
                .collect(),
            months: summary
                .monthly_series
                .iter()
                .map(|month| month.month_label.clone())
                .collect(),
            income: summary.monthly_series.iter().map(|m| m.income).collect(),
            expense: summary.monthly_series.iter().map(|m| m.expense).collect(),
        }
    }
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for dashboard charts.
///
/// Chart instances are kept in `window.dashboardCharts` keyed by element ID so
/// that live updates can find them.
pub(super) fn charts_script(charts: &[DashboardChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    chart.setOption({});
                    window.dashboardCharts[chartDom.id] = chart;

                    window.addEventListener('resize', chart.resize);

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        chart.setTheme(darkModeMediaQuery.matches ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "window.dashboardCharts = window.dashboardCharts || {{}};\n\
        document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn expenses_by_category_chart(summary: &Summary) -> Chart {
    let data = summary
        .expense_by_category
        .iter()
        .map(|(label, amount)| (*amount, category_display_name(label)))
        .collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Expenses by Category")
                .subtext("All time"),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter()),
        )
        .legend(Legend::new().bottom("1%"))
        .series(
            Pie::new()
                .name("Expenses")
                .radius(vec!["40%", "65%"])
                .data(data),
        )
}

fn monthly_chart(summary: &Summary) -> Chart {
    let labels = summary
        .monthly_series
        .iter()
        .map(|month| month.month_label.clone())
        .collect::<Vec<_>>();
    let income = summary.monthly_series.iter().map(|m| m.income).collect::<Vec<_>>();
    let expense = summary.monthly_series.iter().map(|m| m.expense).collect::<Vec<_>>();

    Chart::new()
        .title(
            Title::new()
                .text("Income vs Expenses")
                .subtext("Last six months")
                .left(20)
                .top("1%"),
        )
        .tooltip(currency_tooltip())
        .legend(Legend::new().left(250).top("1%"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .top(90)
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .axis_label(AxisLabel::new().formatter(currency_formatter())),
        )
        .series(
            bar::Bar::new()
                .name("Income")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(income),
        )
        .series(
            bar::Bar::new()
                .name("Expenses")
                .emphasis(Emphasis::new().focus(EmphasisFocus::Series))
                .data(expense),
        )
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('en-US', {
              style: 'currency',
              currency: 'USD'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
