//! Category creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, CategoryType, create_category,
        form::{FormAction, category_form},
    },
    change_feed::{Change, ChangeEvent, ChangeFeed},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = category_form(
        FormAction::Create(endpoints::POST_CATEGORY),
        "",
        Some(CategoryType::Expense),
        None,
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content)
}

/// Handle category creation form submission.
///
/// Invalid names re-render the form with an error message. On success, the new category
/// is published on the change feed and the client is redirected to the categories page.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let render_error = |message: String| {
        let type_ = CategoryType::parse(form_data.type_.trim());

        category_form(
            FormAction::Create(endpoints::POST_CATEGORY),
            &form_data.name,
            type_,
            Some(&message),
        )
        .into_response()
    };

    let (name, type_) = match form_data.parse() {
        Ok(fields) => fields,
        Err(error) => return render_error(format!("Error: {error}")),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(name, type_, &connection) {
        Ok(category) => {
            tracing::info!("Created category {} ({})", category.name, category.id);
            state
                .change_feed
                .publish(ChangeEvent::Category(Change::Inserted(category)));

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategoryName(_)) => render_error(format!("Error: {error}")),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_category_page_tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        category::get_new_category_page,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button_with_text,
            assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_category_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_CATEGORY, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button_with_text(&form, "Create Category");

        let checked = form
            .select(&Selector::parse("input[name=type][checked]").unwrap())
            .next()
            .expect("no category type selected");
        assert_eq!(checked.value().attr("value"), Some("expense"));
    }
}
