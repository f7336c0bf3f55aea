//! The flat `SnapshotData`/`SnapshotElement` model and its sole
//! user-visible serialization, the compact line.

use std::collections::HashMap;

use serde::Serialize;

/// The fixed set of accessibility roles the snapshot builder extracts.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "textbox",
    "combobox",
    "checkbox",
    "radio",
    "menuitem",
    "tab",
    "switch",
    "slider",
    "spinbutton",
    "searchbox",
];

/// Property keys whose `"true"` value contributes a state token to the
/// compact line, in the fixed emission order.
const STATE_PROPERTY_ORDER: &[&str] = &[
    "focused",
    "checked",
    "selected",
    "expanded",
    "disabled",
    "required",
];

/// A single interactive element as captured by a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotElement {
    /// The ref assigned to this element for this snapshot.
    pub ref_: String,
    /// Accessibility-tree node id, when the AX path supplied one.
    pub ax_node_id: Option<String>,
    /// CSS selector path rooted at `body`.
    pub dom_path: String,
    /// One of [`INTERACTIVE_ROLES`].
    pub role: String,
    /// The accessible name, or the DOM-fallback-derived name.
    pub name: String,
    /// Property projection: at minimum the union of `focused, checked,
    /// selected, expanded, disabled, required, value` where available.
    pub properties: HashMap<String, String>,
}

impl SnapshotElement {
    /// Render the single-line `@eN role "name" [state, ...] value:"..."`
    /// form that is the sole user-visible serialization of an element.
    #[must_use]
    pub fn compact_line(&self) -> String {
        let mut line = format!("{} {}", self.ref_, self.role);

        if !self.name.is_empty() {
            line.push_str(&format!(" \"{}\"", escape(&self.name)));
        }

        let states: Vec<&str> = STATE_PROPERTY_ORDER
            .iter()
            .filter(|k| self.properties.get(**k).map(String::as_str) == Some("true"))
            .copied()
            .collect();
        if !states.is_empty() {
            line.push_str(&format!(" [{}]", states.join(", ")));
        }

        if let Some(value) = self.properties.get("value") {
            if value != &self.name {
                line.push_str(&format!(" value:\"{}\"", escape(value)));
            }
        }

        line
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `{ url, title, viewport }` — the page-level facts attached to every
/// snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    /// Current page URL.
    pub url: String,
    /// Current document title.
    pub title: String,
    /// Viewport dimensions in CSS pixels.
    pub viewport: Viewport,
}

impl Default for PageInfo {
    /// Placeholder used when a failure path (e.g. `CDP_DISCONNECTED`)
    /// occurs before any page could be read.
    fn default() -> Self {
        Self {
            url: String::new(),
            title: String::new(),
            viewport: Viewport { width: 0, height: 0 },
        }
    }
}

/// Integer viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// `{ elements, page }` — a full point-in-time capture of the page's
/// interactive surface.
#[derive(Debug, Clone)]
pub struct SnapshotData {
    /// Interactive elements in document order.
    pub elements: Vec<SnapshotElement>,
    /// Page-level facts.
    pub page: PageInfo,
}

impl SnapshotData {
    /// The compact-line encoding of every element, in order — the
    /// `elements` field of a `SnapshotResult`.
    #[must_use]
    pub fn compact_lines(&self) -> Vec<String> {
        self.elements.iter().map(SnapshotElement::compact_line).collect()
    }

    /// Look up an element by ref within this snapshot.
    #[must_use]
    pub fn find(&self, r: &str) -> Option<&SnapshotElement> {
        self.elements.iter().find(|e| e.ref_ == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(properties: &[(&str, &str)]) -> SnapshotElement {
        SnapshotElement {
            ref_: "@e1".to_string(),
            ax_node_id: None,
            dom_path: "body".to_string(),
            role: "textbox".to_string(),
            name: "Name".to_string(),
            properties: properties
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn compact_line_with_no_state_or_value() {
        let e = element(&[]);
        assert_eq!(e.compact_line(), "@e1 textbox \"Name\"");
    }

    #[test]
    fn compact_line_with_states_in_fixed_order() {
        let e = element(&[("disabled", "true"), ("focused", "true")]);
        assert_eq!(e.compact_line(), "@e1 textbox \"Name\" [focused, disabled]");
    }

    #[test]
    fn compact_line_with_value_distinct_from_name() {
        let e = element(&[("value", "Alice")]);
        assert_eq!(e.compact_line(), "@e1 textbox \"Name\" value:\"Alice\"");
    }

    #[test]
    fn compact_line_omits_value_equal_to_name() {
        let e = element(&[("value", "Name")]);
        assert_eq!(e.compact_line(), "@e1 textbox \"Name\"");
    }

    #[test]
    fn compact_line_ignores_non_true_state() {
        let e = element(&[("checked", "false")]);
        assert_eq!(e.compact_line(), "@e1 textbox \"Name\"");
    }

    #[test]
    fn snapshot_data_to_result_elements_is_compact_lines() {
        let data = SnapshotData {
            elements: vec![element(&[]), element(&[("checked", "true")])],
            page: PageInfo {
                url: "about:blank".to_string(),
                title: String::new(),
                viewport: Viewport { width: 1280, height: 960 },
            },
        };
        let expected: Vec<String> = data.elements.iter().map(SnapshotElement::compact_line).collect();
        assert_eq!(data.compact_lines(), expected);
    }
}
