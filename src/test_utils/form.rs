use scraper::{ElementRef, Html, Selector};

fn select_first<'a>(element: &ElementRef<'a>, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).unwrap();
    element.select(&selector).next()
}

fn trimmed_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        got, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {got:?}"
    );
}

/// Find the required input called `name` and check its type.
#[track_caller]
fn must_get_required_input<'a>(
    form: &ElementRef<'a>,
    name: &str,
    type_: &str,
) -> ElementRef<'a> {
    let input = select_first(form, &format!("input[name=\"{name}\"]"))
        .unwrap_or_else(|| panic!("No input found with name \"{name}\" and type \"{type_}\""));

    let got_type = input.value().attr("type").unwrap_or_default();
    assert_eq!(
        got_type, type_,
        "want input with type \"{type_}\", got {got_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );

    input
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    must_get_required_input(form, name, type_);
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = must_get_required_input(form, name, type_);

    let got_value = input.value().attr("value").unwrap_or_default();
    assert_eq!(
        got_value, value,
        "want input with value \"{value}\", got {got_value:?}"
    );
}

/// Check that the select called `name` has an option for `value` and whether it is selected.
#[track_caller]
pub(crate) fn assert_select_option(
    form: &ElementRef<'_>,
    name: &str,
    value: &str,
    want_selected: bool,
) {
    let select = select_first(form, &format!("select[name=\"{name}\"]"))
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));
    let option = select
        .select(&Selector::parse("option").unwrap())
        .find(|option| option.value().attr("value") == Some(value))
        .unwrap_or_else(|| panic!("No option with value \"{value}\" in select \"{name}\""));

    assert_eq!(
        option.value().attr("selected").is_some(),
        want_selected,
        "option \"{value}\" selected state"
    );
}

#[track_caller]
fn must_get_submit_button<'a>(form: &ElementRef<'a>) -> ElementRef<'a> {
    select_first(form, "button[type=\"submit\"]")
        .expect("want submit button with type=\"submit\"")
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    must_get_submit_button(form);
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let button = must_get_submit_button(form);

    assert_eq!(text, trimmed_text(&button));
}

#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let message = select_first(form, "p").expect("No error message found");

    assert_eq!(want_error_message, trimmed_text(&message));
}
