//! The category select on the new transaction form, and the endpoint for adding a
//! category from it without leaving the page.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{Category, CategoryName, CategoryType, create_category, get_all_categories},
    change_feed::{Change, ChangeEvent, ChangeFeed},
    endpoints,
    html::{BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE},
};

/// The ID of the element replaced after adding a category.
pub(super) const CATEGORY_PICKER_ID: &str = "category-picker";

/// Render the category select followed by the control for adding a new category.
///
/// The option whose name equals `selected` is preselected.
pub(super) fn category_picker(
    categories: &[Category],
    selected: Option<&str>,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div id=(CATEGORY_PICKER_ID)
        {
            label for="category" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category"
                id="category"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" { "Select a category" }

                @for category in categories {
                    option
                        value=(category.name)
                        data-type=[category.type_.map(|type_| type_.as_str())]
                        selected[selected == Some(category.name.as_ref())]
                    {
                        (category.name)
                    }
                }
            }

            div class="mt-2 flex gap-2"
            {
                input
                    name="new_category_name"
                    id="new-category-name"
                    type="text"
                    placeholder="New category"
                    aria-label="New category name"
                    class=(FORM_TEXT_INPUT_STYLE);

                // Sits inside the transaction form, so htmx sends the whole form,
                // including the checked transaction type.
                button
                    type="button"
                    hx-post=(endpoints::QUICK_CATEGORY)
                    hx-target={ "#" (CATEGORY_PICKER_ID) }
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Add"
                }
            }

            @if let Some(error_message) = error_message {
                p class="mt-2 text-sm text-red-600 dark:text-red-400" { (error_message) }
            }
        }
    }
}

/// The state needed for adding a category from the new transaction form.
#[derive(Debug, Clone)]
pub struct CategoryPickerState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Notifies live pages about the new category.
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for CategoryPickerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            change_feed: state.change_feed.clone(),
        }
    }
}

/// The fields of the new transaction form used to add a category.
#[derive(Debug, Deserialize)]
pub struct QuickCategoryForm {
    /// The name of the category to add.
    #[serde(default)]
    pub new_category_name: String,
    /// The transaction type currently selected, which becomes the category's type.
    #[serde(rename = "type", default)]
    pub type_: String,
}

/// Create a category from the new transaction form and return the refreshed picker with
/// the new category selected.
///
/// A blank or duplicate name returns the picker with an error message instead.
pub async fn create_quick_category_endpoint(
    State(state): State<CategoryPickerState>,
    Form(form): Form<QuickCategoryForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let render_error = |error: Error| -> Response {
        match get_all_categories(&connection) {
            Ok(categories) => {
                category_picker(&categories, None, Some(&format!("Error: {error}")))
                    .into_response()
            }
            Err(error) => error.into_alert_response(),
        }
    };

    let name = match CategoryName::new(&form.new_category_name) {
        Ok(name) => name,
        Err(error) => return render_error(error),
    };
    let type_ = CategoryType::parse(form.type_.trim());

    let category = match create_category(name, type_, &connection) {
        Ok(category) => category,
        Err(error @ Error::DuplicateCategoryName(_)) => return render_error(error),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!(
        "Created category {} ({}) from the transaction form",
        category.name,
        category.id
    );
    let selected = category.name.to_string();
    state
        .change_feed
        .publish(ChangeEvent::Category(Change::Inserted(category)));

    match get_all_categories(&connection) {
        Ok(categories) => category_picker(&categories, Some(&selected), None).into_response(),
        Err(error) => {
            tracing::error!("Failed to retrieve categories after creating one: {error}");
            error.into_alert_response()
        }
    }
}
