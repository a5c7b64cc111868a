//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element defined in
//! [crate::html::base], either as the target of a failed htmx request
//! (`hx-target-error`) or as an out-of-band swap.

use maud::{Markup, html};

/// A dismissable message shown at the bottom of the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// Explains why an operation failed.
    Error { message: String, details: String },
}

impl Alert {
    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Error { message, details } => (
                "flex items-start gap-3 p-4 mb-4 rounded-lg border \
                text-red-800 bg-red-50 border-red-300 \
                dark:bg-gray-800 dark:text-red-400 dark:border-red-800",
                message,
                details,
            ),
        };

        html! {
            div
                role="alert"
                class=(container_style)
            {
                div class="flex-1"
                {
                    p class="font-semibold" { (message) }

                    @if !details.is_empty() {
                        p class="text-sm mt-1" { (details) }
                    }
                }

                button
                    type="button"
                    aria-label="Dismiss"
                    class="text-sm font-medium underline"
                    onclick="this.closest('[role=alert]').remove(); \
                        document.getElementById('alert-container').classList.add('hidden')"
                {
                    "Dismiss"
                }
            }
        }
    }
}

#[cfg(test)]
mod alert_tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_renders_message_and_details() {
        let alert = Alert::Error {
            message: "Could not delete category".to_owned(),
            details: "The category could not be found.".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        assert!(html.errors.is_empty(), "{:?}", html.errors);
        let paragraphs = html
            .select(&Selector::parse("p").unwrap())
            .map(|p| p.text().collect::<String>())
            .collect::<Vec<_>>();
        assert_eq!(
            paragraphs,
            vec!["Could not delete category", "The category could not be found."]
        );
    }

    #[test]
    fn empty_details_are_omitted() {
        let alert = Alert::Error {
            message: "Something went wrong".to_owned(),
            details: String::new(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let paragraph_count = html.select(&Selector::parse("p").unwrap()).count();
        assert_eq!(paragraph_count, 1);
    }
}
