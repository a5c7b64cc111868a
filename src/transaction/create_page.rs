//! Defines the route handler for the page for creating a new transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement, base, dollar_input_styles,
        loading_spinner,
    },
    navigation::NavBar,
    timezone::get_local_date,
    transaction::{TransactionType, category_picker::category_picker},
};

/// Hides the category options that do not match the selected transaction type.
///
/// Categories without a type are shown for both types. The filter runs again whenever
/// htmx swaps in a refreshed category picker.
const FILTER_CATEGORIES_SCRIPT: &str = r#"
function filterCategories() {
    const checked = document.querySelector('input[name="type"]:checked');
    const select = document.getElementById('category');
    if (!checked || !select) {
        return;
    }

    for (const option of select.options) {
        const type = option.dataset.type;
        const visible = !type || type === checked.value;
        option.hidden = !visible;
        option.disabled = !visible;
        if (!visible && option.selected) {
            select.value = '';
        }
    }
}

document.addEventListener('DOMContentLoaded', function() {
    for (const input of document.querySelectorAll('input[name="type"]')) {
        input.addEventListener('change', filterCategories);
    }
    document.body.addEventListener('htmx:afterSwap', filterCategories);
    filterCategories();
});
"#;

fn create_transaction_view(max_date: Date, categories: &[Category]) -> Markup {
    let create_transaction_route = endpoints::TRANSACTIONS_API;
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();
    let type_options = [TransactionType::Expense, TransactionType::Income];

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_transaction_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                fieldset
                {
                    legend class=(FORM_LABEL_STYLE) { "Type" }

                    div class="grid grid-cols-2 gap-3"
                    {
                        @for type_ in type_options {
                            @let id = format!("type-{}", type_.as_str());

                            div class="flex items-center gap-3"
                            {
                                input
                                    id=(id)
                                    type="radio"
                                    name="type"
                                    value=(type_.as_str())
                                    checked[type_ == TransactionType::Expense]
                                    class=(FORM_RADIO_INPUT_STYLE);

                                label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (type_) }
                            }
                        }
                    }
                }

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount"
                    }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                (category_picker(categories, None, None))

                div
                {
                    label
                        for="date"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Date"
                    }

                    input
                        name="date"
                        id="date"
                        type="date"
                        max=(max_date)
                        required
                        value=(max_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Transaction"
                }
            }
        }
    };

    base(
        "Create Transaction",
        &[
            dollar_input_styles(),
            HeadElement::ScriptSource(PreEscaped(FILTER_CATEGORIES_SCRIPT.to_owned())),
        ],
        &content,
    )
}

/// The state needed for create new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection for accessing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a transaction.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new transaction page: {error}")
        })?
    };

    let max_date = get_local_date(&state.local_timezone)?;

    Ok(create_transaction_view(max_date, &categories).into_response())
}
