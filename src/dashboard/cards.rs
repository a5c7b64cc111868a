//! Card components for the dashboard summary.
//!
//! Provides card-based views showing:
//! - Total balance, income and expenses
//! - The top expense categories with their share of total expenses
//! - The categories available for new transactions
//!
//! Each view is wrapped in an element with a stable ID so that live updates can
//! replace it in place.

use maud::{Markup, html};

use crate::{
    category::{Category, type_label},
    dashboard::aggregation::{DEFAULT_TOP_CATEGORIES, Summary, expense_share_percent},
    endpoints,
    html::{CATEGORY_BADGE_STYLE, LINK_STYLE, currency_rounded_with_tooltip},
};

/// The HTML element ID of the summary section.
pub(super) const SUMMARY_ID: &str = "summary";
/// The HTML element ID of the categories card.
pub(super) const CATEGORIES_ID: &str = "categories";

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md";

/// The name shown for a category label, since transactions may have an empty label.
pub(super) fn category_display_name(label: &str) -> &str {
    if label.is_empty() {
        "Uncategorized"
    } else {
        label
    }
}

/// Renders the summary cards and top categories, or an empty state if the
/// user has not recorded any transactions.
pub(super) fn summary_view(summary: &Summary, transaction_count: usize) -> Markup {
    html! {
        section id=(SUMMARY_ID) class="w-full mx-auto mb-8" {
            @if transaction_count == 0 {
                (empty_state_view())
            } @else {
                (summary_cards(summary))
                (top_categories_view(summary))
            }
        }
    }
}

fn summary_cards(summary: &Summary) -> Markup {
    let balance_style = if summary.total_balance >= 0.0 {
        "text-green-600 dark:text-green-400"
    } else {
        "text-red-600 dark:text-red-400"
    };

    html! {
        div class="grid grid-cols-1 sm:grid-cols-3 gap-4 mb-6" {
            (summary_card("Balance", "balance", balance_style, summary.total_balance))
            (summary_card("Income", "income", "text-green-600 dark:text-green-400", summary.total_income))
            (summary_card("Expenses", "expense", "text-red-600 dark:text-red-400", summary.total_expense))
        }
    }
}

fn summary_card(title: &str, name: &str, amount_style: &str, amount: f64) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary=(name) {
            h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class={ "mt-2 text-3xl font-bold " (amount_style) } {
                (currency_rounded_with_tooltip(amount))
            }
        }
    }
}

/// Renders the largest expense categories as horizontal bars.
fn top_categories_view(summary: &Summary) -> Markup {
    let top_categories = summary.top_categories(DEFAULT_TOP_CATEGORIES);

    html! {
        div class=(CARD_STYLE) {
            div class="flex justify-between items-baseline mb-4" {
                h3 class="text-xl font-semibold" { "Top Categories" }
                span class="text-sm text-gray-600 dark:text-gray-400" { "By expenses" }
            }

            @if top_categories.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" { "No expenses recorded yet." }
            } @else {
                ul class="flex flex-col gap-3" {
                    @for (label, amount) in &top_categories {
                        @let share = expense_share_percent(*amount, summary.total_expense);

                        li data-category=(label) {
                            div class="flex justify-between text-sm mb-1" {
                                span class="font-medium" { (category_display_name(label)) }
                                span {
                                    (currency_rounded_with_tooltip(*amount))
                                    " (" (format!("{share:.0}")) "%)"
                                }
                            }
                            (progress_bar(share))
                        }
                    }
                }
            }
        }
    }
}

/// Renders a horizontal progress bar showing percentage of total expenses.
fn progress_bar(percentage: f64) -> Markup {
    let clamped = percentage.clamp(0.0, 100.0);

    html! {
        div
            class="w-full bg-gray-200 dark:bg-gray-700 rounded-full h-2.5"
            role="progressbar"
            aria-valuenow=(format!("{clamped:.0}"))
            aria-valuemin="0"
            aria-valuemax="100"
        {
            @if clamped > 0.0 {
                div
                    class="bg-blue-600 dark:bg-blue-500 h-2.5 rounded-full transition-all"
                    style=(format!("width: {clamped:.1}%"))
                {}
            }
        }
    }
}

/// Renders the categories that transactions can be recorded under.
pub(super) fn categories_view(categories: &[Category]) -> Markup {
    html! {
        section id=(CATEGORIES_ID) class={ "w-full mx-auto mb-8 " (CARD_STYLE) } {
            div class="flex justify-between items-baseline mb-4" {
                h3 class="text-xl font-semibold" { "Categories" }
                a href=(endpoints::CATEGORIES_VIEW) class=(LINK_STYLE) { "Manage" }
            }

            @if categories.is_empty() {
                p class="text-sm text-gray-600 dark:text-gray-400" {
                    "No categories yet. "
                    a href=(endpoints::NEW_CATEGORY_VIEW) class=(LINK_STYLE) { "Create one" }
                    " to start recording transactions."
                }
            } @else {
                ul class="flex flex-wrap gap-2" {
                    @for category in categories {
                        li class=(CATEGORY_BADGE_STYLE) title=(type_label(category)) {
                            (category.name)
                        }
                    }
                }
            }
        }
    }
}

/// Renders an empty state when the user has no transactions.
fn empty_state_view() -> Markup {
    html! {
        div class={ "text-center max-w-md mx-auto p-8 " (CARD_STYLE) } {
            h3 class="text-xl font-semibold mb-3" { "Get Started" }
            p class="text-gray-700 dark:text-gray-300 mb-6" {
                "Record your first transaction to see where your money goes."
            }
            a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE) {
                "Add a transaction"
            }
        }
    }
}

#[cfg(test)]
mod cards_tests {
    use scraper::{Html, Selector};
    use time::macros::date;

    use crate::{
        auth::UserID,
        category::{Category, CategoryName, CategoryType},
        dashboard::aggregation::summarize,
        endpoints,
        transaction::{Transaction, TransactionType},
    };

    use super::{categories_view, summary_view};

    fn transaction(amount: f64, category: &str) -> Transaction {
        Transaction {
            id: 0,
            amount,
            category: category.to_owned(),
            type_: TransactionType::from_amount(amount),
            date: date!(2024 - 01 - 15),
            user_id: UserID::new(1),
        }
    }

    fn text_of(html: &Html, selector: &str) -> String {
        let selector = Selector::parse(selector).unwrap();
        html.select(&selector)
            .next()
            .unwrap_or_else(|| panic!("could not find {selector:?}"))
            .text()
            .collect::<String>()
    }

    #[test]
    fn shows_totals_with_balance_colour() {
        let transactions = [transaction(-100.0, "Food"), transaction(500.0, "Salary")];
        let summary = summarize(&transactions, date!(2024 - 01 - 31));

        let html = Html::parse_fragment(&summary_view(&summary, transactions.len()).into_string());

        assert!(html.errors.is_empty(), "{:?}", html.errors);
        assert_eq!(text_of(&html, "[data-summary='balance'] p"), "$400");
        assert_eq!(text_of(&html, "[data-summary='income'] p"), "$500");
        assert_eq!(text_of(&html, "[data-summary='expense'] p"), "$100");
        let balance = html
            .select(&Selector::parse("[data-summary='balance'] p").unwrap())
            .next()
            .unwrap();
        assert!(balance.value().attr("class").unwrap().contains("text-green-600"));
    }

    #[test]
    fn negative_balance_is_red() {
        let transactions = [transaction(-100.0, "Food")];
        let summary = summarize(&transactions, date!(2024 - 01 - 31));

        let html = Html::parse_fragment(&summary_view(&summary, transactions.len()).into_string());

        let balance = html
            .select(&Selector::parse("[data-summary='balance'] p").unwrap())
            .next()
            .unwrap();
        assert!(balance.value().attr("class").unwrap().contains("text-red-600"));
        assert_eq!(balance.text().collect::<String>(), "-$100");
    }

    #[test]
    fn top_categories_have_share_of_expenses() {
        let transactions = [
            transaction(-75.0, "Rent"),
            transaction(-25.0, ""),
            transaction(10.0, "Salary"),
        ];
        let summary = summarize(&transactions, date!(2024 - 01 - 31));

        let html = Html::parse_fragment(&summary_view(&summary, transactions.len()).into_string());

        let items = html
            .select(&Selector::parse("li[data-category]").unwrap())
            .map(|item| item.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert!(items[0].contains("Rent") && items[0].contains("(75%)"));
        assert!(items[1].contains("Uncategorized") && items[1].contains("(25%)"));
        let bar = html
            .select(&Selector::parse("li[data-category='Rent'] [role='progressbar'] div").unwrap())
            .next()
            .unwrap();
        assert_eq!(bar.value().attr("style"), Some("width: 75.0%"));
    }

    #[test]
    fn income_only_shows_zero_share_message() {
        let transactions = [transaction(10.0, "Salary")];
        let summary = summarize(&transactions, date!(2024 - 01 - 31));

        let html = Html::parse_fragment(&summary_view(&summary, transactions.len()).into_string());

        assert!(
            html.root_element()
                .text()
                .collect::<String>()
                .contains("No expenses recorded yet.")
        );
    }

    #[test]
    fn empty_state_links_to_new_transaction() {
        let summary = summarize(&[], date!(2024 - 01 - 31));

        let html = Html::parse_fragment(&summary_view(&summary, 0).into_string());

        let link = html
            .select(&Selector::parse("#summary a").unwrap())
            .next()
            .expect("empty state should link to the new transaction page");
        assert_eq!(link.value().attr("href"), Some(endpoints::NEW_TRANSACTION_VIEW));
        assert_eq!(
            html.select(&Selector::parse("[data-summary]").unwrap())
                .count(),
            0
        );
    }

    #[test]
    fn categories_card_lists_names() {
        let categories = [
            Category {
                id: 1,
                name: CategoryName::new_unchecked("Food"),
                type_: Some(CategoryType::Expense),
            },
            Category {
                id: 2,
                name: CategoryName::new_unchecked("Gifts"),
                type_: None,
            },
        ];

        let html = Html::parse_fragment(&categories_view(&categories).into_string());

        let names = html
            .select(&Selector::parse("#categories li").unwrap())
            .map(|item| item.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Food", "Gifts"]);
    }

    #[test]
    fn categories_card_empty_state() {
        let html = Html::parse_fragment(&categories_view(&[]).into_string());

        let link = html
            .select(&Selector::parse("#categories p a").unwrap())
            .next()
            .unwrap();
        assert_eq!(link.value().attr("href"), Some(endpoints::NEW_CATEGORY_VIEW));
    }
}
