//! Tag-to-role inference for the DOM fallback snapshot path.
//!
//! `capture::DOM_FALLBACK_JS` performs the actual inference in-page, as a
//! single round trip (§9: in-page scripts are data to the core, not code to
//! translate). This module exists only so that same inference has an
//! independently testable Rust reference, without a caller of its own in
//! production code.
#[cfg(test)]
#[must_use]
fn infer_role(tag: &str, input_type: Option<&str>) -> &'static str {
    match tag.to_lowercase().as_str() {
        "a" => "link",
        "select" => "combobox",
        "input" => match input_type.map(str::to_lowercase).as_deref() {
            Some("checkbox") => "checkbox",
            Some("radio") => "radio",
            _ => "textbox",
        },
        "textarea" => "textbox",
        _ => "button",
    }
}

#[cfg(test)]
mod tests {
    use super::infer_role;

    #[test]
    fn anchor_is_link() {
        assert_eq!(infer_role("a", None), "link");
    }

    #[test]
    fn select_is_combobox() {
        assert_eq!(infer_role("select", None), "combobox");
    }

    #[test]
    fn input_checkbox_and_radio() {
        assert_eq!(infer_role("input", Some("checkbox")), "checkbox");
        assert_eq!(infer_role("input", Some("radio")), "radio");
    }

    #[test]
    fn other_inputs_and_textarea_are_textbox() {
        assert_eq!(infer_role("input", Some("text")), "textbox");
        assert_eq!(infer_role("input", None), "textbox");
        assert_eq!(infer_role("textarea", None), "textbox");
    }

    #[test]
    fn unknown_tag_defaults_to_button() {
        assert_eq!(infer_role("div", None), "button");
        assert_eq!(infer_role("span", None), "button");
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(infer_role("A", None), "link");
        assert_eq!(infer_role("INPUT", Some("CHECKBOX")), "checkbox");
    }
}
