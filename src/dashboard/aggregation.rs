//! Turns a user's transactions into the totals, category breakdown and monthly
//! series shown on the dashboard.
//!
//! Everything in this module is a pure function of its inputs: the reference
//! date is passed in rather than read from the clock, so the same transactions
//! always produce the same [Summary].

use time::{Date, Month};

use crate::transaction::Transaction;

/// How many months the monthly series covers, ending at the reference month.
pub const MONTHS_IN_SERIES: usize = 6;

/// The number of categories shown in the top categories list by default.
pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Income and expense totals for a single calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotals {
    /// The month and year, e.g. "jan 2024".
    pub month_label: String,
    /// The sum of positive amounts in the month.
    pub income: f64,
    /// The sum of the absolute value of non-positive amounts in the month.
    pub expense: f64,
}

/// The aggregated view of a list of transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Income minus expenses, which is the sum of all amounts.
    pub total_balance: f64,
    /// The sum of all positive amounts.
    pub total_income: f64,
    /// The sum of the absolute value of all negative amounts.
    pub total_expense: f64,
    /// Expense totals per category label, in the order each label was first seen.
    pub expense_by_category: Vec<(String, f64)>,
    /// Income and expenses for the last [MONTHS_IN_SERIES] months, oldest first.
    pub monthly_series: Vec<MonthlyTotals>,
}

impl Summary {
    /// The `n` categories with the largest expenses, largest first.
    ///
    /// Categories with equal expenses keep the order they were first seen in.
    pub fn top_categories(&self, n: usize) -> Vec<(String, f64)> {
        let mut categories = self.expense_by_category.clone();
        // `sort_by` is stable, which keeps ties in first-seen order.
        categories.sort_by(|a, b| b.1.total_cmp(&a.1));
        categories.truncate(n);

        categories
    }
}

/// Aggregate `transactions` into a [Summary].
///
/// The sign of each amount decides whether it counts as income or an expense,
/// the transaction type is ignored. The monthly series always has
/// [MONTHS_IN_SERIES] entries covering the months up to and including the
/// month of `reference_date`. Transactions outside that window still count
/// toward the totals and the category breakdown.
pub fn summarize(transactions: &[Transaction], reference_date: Date) -> Summary {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut expense_by_category: Vec<(String, f64)> = Vec::new();

    let months = series_months(reference_date);
    let mut monthly_series: Vec<MonthlyTotals> = months
        .iter()
        .map(|&month_start| MonthlyTotals {
            month_label: month_label(month_start),
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    for transaction in transactions {
        let amount = transaction.amount;

        if amount > 0.0 {
            total_income += amount;
        } else if amount < 0.0 {
            total_expense += amount.abs();

            match expense_by_category
                .iter_mut()
                .find(|(label, _)| *label == transaction.category)
            {
                Some((_, total)) => *total += amount.abs(),
                None => expense_by_category.push((transaction.category.clone(), amount.abs())),
            }
        }

        if let Some(index) = months.iter().position(|month| {
            month.year() == transaction.date.year() && month.month() == transaction.date.month()
        }) {
            let totals = &mut monthly_series[index];

            if amount > 0.0 {
                totals.income += amount;
            } else {
                totals.expense += amount.abs();
            }
        }
    }

    Summary {
        total_balance: total_income - total_expense,
        total_income,
        total_expense,
        expense_by_category,
        monthly_series,
    }
}

/// The share of `total` that `amount` makes up as a percentage.
///
/// Returns zero when `total` is zero instead of dividing by zero.
pub fn expense_share_percent(amount: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        amount / total * 100.0
    }
}

/// The lowercase three-letter abbreviation for `month`, e.g. "jan".
pub fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "jan",
        Month::February => "feb",
        Month::March => "mar",
        Month::April => "apr",
        Month::May => "may",
        Month::June => "jun",
        Month::July => "jul",
        Month::August => "aug",
        Month::September => "sep",
        Month::October => "oct",
        Month::November => "nov",
        Month::December => "dec",
    }
}

/// The month and year of `date`, e.g. "jan 2024".
pub fn month_label(date: Date) -> String {
    format!("{} {}", month_abbrev(date.month()), date.year())
}

/// The first day of each month in the series window, oldest first.
fn series_months(reference_date: Date) -> Vec<Date> {
    let mut months = Vec::with_capacity(MONTHS_IN_SERIES);
    let mut month_start = reference_date.replace_day(1).unwrap_or(reference_date);

    for _ in 0..MONTHS_IN_SERIES {
        months.push(month_start);

        month_start = month_start
            .previous_day()
            .and_then(|last_day| last_day.replace_day(1).ok())
            .unwrap_or(Date::MIN);
    }

    months.reverse();
    months
}
