//! The form shared by the new and edit category pages.

use maud::{Markup, html};

use crate::{
    category::CategoryType,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
    },
};

/// Where the category form is submitted to.
pub(super) enum FormAction<'a> {
    /// POST a new category to the endpoint.
    Create(&'a str),
    /// PUT changes to an existing category at the endpoint.
    Update(&'a str),
}

/// Render the category form.
///
/// `type_` selects the radio button to check, where `None` checks the option for
/// categories that are used for both income and expenses.
pub(super) fn category_form(
    action: FormAction,
    name: &str,
    type_: Option<CategoryType>,
    error_message: Option<&str>,
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        FormAction::Create(endpoint) => (Some(endpoint), None, "Create Category"),
        FormAction::Update(endpoint) => (None, Some(endpoint), "Update Category"),
    };

    let type_options = [
        ("type-expense", "expense", "Expense", Some(CategoryType::Expense)),
        ("type-income", "income", "Income", Some(CategoryType::Income)),
        ("type-none", "", "Both", None),
    ];

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            @if let Some(error_message) = error_message {
                p class="text-red-600 dark:text-red-400" { (error_message) }
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Category Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Groceries"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            fieldset
            {
                legend class=(FORM_LABEL_STYLE) { "Type" }

                div class=(FORM_RADIO_GROUP_STYLE)
                {
                    @for (id, value, label, option_type) in type_options {
                        div class="flex items-center gap-3"
                        {
                            input
                                id=(id)
                                type="radio"
                                name="type"
                                value=(value)
                                checked[option_type == type_]
                                class=(FORM_RADIO_INPUT_STYLE);

                            label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (label) }
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}
