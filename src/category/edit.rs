//! Category editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::{
        CategoryFormData, CategoryId, CategoryType,
        form::{FormAction, category_form},
        get_category, update_category,
    },
    change_feed::{Change, ChangeEvent, ChangeFeed},
    endpoints,
    html::{FORM_CONTAINER_STYLE, base},
    navigation::NavBar,
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for UpdateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<CategoryId>,
    State(state): State<EditCategoryPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    let view = match get_category(category_id, &connection) {
        Ok(category) => edit_category_view(
            &edit_endpoint,
            &update_endpoint,
            category.name.as_ref(),
            category.type_,
            None,
        ),
        Err(Error::NotFound) => edit_category_view(
            &edit_endpoint,
            &update_endpoint,
            "",
            None,
            Some("Category not found"),
        ),
        Err(error) => {
            tracing::error!("Failed to retrieve category {category_id}: {error}");
            edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                "",
                None,
                Some("Failed to load category"),
            )
        }
    };

    Ok(view.into_response())
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<CategoryId>,
    State(state): State<UpdateCategoryState>,
    Form(form_data): Form<CategoryFormData>,
) -> Response {
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);
    let render_error = |message: String| {
        category_form(
            FormAction::Update(&update_endpoint),
            &form_data.name,
            CategoryType::parse(form_data.type_.trim()),
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

    match update_category(category_id, name, type_, &connection) {
        Ok(category) => {
            state
                .change_feed
                .publish(ChangeEvent::Category(Change::Updated(category)));

            (
                HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::DuplicateCategoryName(_)) => render_error(format!("Error: {error}")),
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    name: &str,
    type_: Option<CategoryType>,
    error_message: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = category_form(
        FormAction::Update(update_endpoint),
        name,
        type_,
        error_message,
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &[], &content)
}
