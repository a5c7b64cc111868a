//! Categories listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_DELETE_STYLE, CATEGORY_BADGE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
};

/// The state needed for the categories listing page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the categories listing page.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection)
            .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?
    };

    Ok(categories_view(&categories).into_response())
}

/// The label shown for a category's type.
pub fn type_label(category: &Category) -> String {
    category
        .type_
        .map(|type_| type_.to_string())
        .unwrap_or_else(|| "Both".to_owned())
}

fn table_row(category: &Category) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_CATEGORY, category.id);
    let confirm_message = format!(
        "Are you sure you want to delete '{}'? Transactions keep their category label.",
        category.name
    );

    html!(
        tr class=(TABLE_ROW_STYLE) data-category-id=(category.id)
        {
            td class=(TABLE_CELL_STYLE)
            {
                span class=(CATEGORY_BADGE_STYLE) { (category.name) }
            }

            td class=(TABLE_CELL_STYLE) { (type_label(category)) }

            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4"
                {
                    a href=(edit_url) class=(LINK_STYLE) { "Edit" }

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
    )
}

fn categories_view(categories: &[Category]) -> Markup {
    let new_category_route = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(new_category_route) class=(LINK_STYLE) { "Create Category" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (table_row(category))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. "
                                        a href=(new_category_route) class=(LINK_STYLE)
                                        {
                                            "Create your first category"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Categories", &[], &content)
}

#[cfg(test)]
mod categories_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use scraper::{Html, Selector};

    use crate::{
        category::{CategoryName, CategoryType, create_category, get_categories_page},
        endpoints,
        test_utils::{assert_valid_html, get_test_connection, parse_html_document},
    };

    use super::CategoriesPageState;

    fn row_texts(html: &Html) -> Vec<Vec<String>> {
        let row_selector = Selector::parse("tbody tr").unwrap();
        let cell_selector = Selector::parse("td").unwrap();

        html.select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .take(2)
                    .map(|cell| cell.text().collect::<String>().trim().to_owned())
                    .collect()
            })
            .collect()
    }

    #[tokio::test]
    async fn lists_categories_by_name_with_delete_buttons() {
        let connection = get_test_connection();
        let rent = create_category(
            CategoryName::new_unchecked("Rent"),
            Some(CategoryType::Expense),
            &connection,
        )
        .unwrap();
        create_category(
            CategoryName::new_unchecked("Gifts"),
            None,
            &connection,
        )
        .unwrap();
        let state = CategoriesPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_categories_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            row_texts(&html),
            vec![
                vec!["Gifts".to_owned(), "Both".to_owned()],
                vec!["Rent".to_owned(), "Expense".to_owned()],
            ]
        );

        let delete_urls = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .filter_map(|button| button.value().attr("hx-delete"))
            .collect::<Vec<_>>();
        assert_eq!(delete_urls.len(), 2);
        assert!(delete_urls.contains(&endpoints::format_endpoint(
            endpoints::DELETE_CATEGORY,
            rent.id
        )
        .as_str()));
    }

    #[tokio::test]
    async fn shows_empty_state() {
        let state = CategoriesPageState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = get_categories_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        let text = html
            .select(&Selector::parse("tbody").unwrap())
            .next()
            .unwrap()
            .text()
            .collect::<String>();
        assert!(text.contains("No categories created yet."), "got {text:?}");
    }
}
