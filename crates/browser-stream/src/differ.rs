//! The differ: matches a pre- and post-action snapshot's element sets and
//! turns the result, plus observed network traffic, into an ordered
//! [`Consequence`] list.

use std::collections::HashMap;

use crate::snapshot::SnapshotElement;

/// A single network request observed during a stability wait, scoped to
/// Fetch/XHR resource types initiated after the action began.
#[derive(Debug, Clone)]
pub struct NetworkEvent {
    /// CDP `requestId`.
    pub request_id: String,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// CDP monotonic-time timestamp the request started at. Only
    /// comparable to other `timestamp` values from the same session, never
    /// to a wall-clock epoch.
    pub started_at: f64,
    /// CDP monotonic-time timestamp the request finished at, if it has.
    pub finished_at: Option<f64>,
    /// HTTP status code, if the request completed.
    pub status: Option<i64>,
}

impl NetworkEvent {
    /// Duration in milliseconds, when both timestamps are known.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        self.finished_at.map(|end| (end - self.started_at) * 1000.0)
    }

    /// The URL's path component, falling back to the full URL if it does
    /// not look like an absolute URL with a scheme and authority.
    fn pathname(&self) -> String {
        let Some(after_scheme) = self.url.split_once("://").map(|(_, rest)| rest) else {
            return self.url.clone();
        };
        let path_start = after_scheme.find('/').unwrap_or(after_scheme.len());
        let path_and_query = &after_scheme[path_start..];
        let path = path_and_query.split(['?', '#']).next().unwrap_or("");
        if path.is_empty() { "/".to_string() } else { path.to_string() }
    }

    /// `"{method} {pathname} -> {status|pending} ({durationMs}ms)"`.
    #[must_use]
    pub fn describe(&self) -> String {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "pending".to_string());
        let duration = self
            .duration_ms()
            .map(|d| format!("{d:.0}"))
            .unwrap_or_else(|| "?".to_string());
        format!(
            "{} {} -> {} ({duration}ms)",
            self.method,
            self.pathname(),
            status
        )
    }
}

/// A typed observation about what changed between a pre- and post-action
/// snapshot.
#[derive(Debug, Clone)]
pub enum Consequence {
    /// An interactive element present in the post-snapshot with no match in
    /// the pre-snapshot.
    Appeared {
        /// Human-readable description, e.g. `"button \"Submit\" appeared"`.
        desc: String,
        /// The new element's ref.
        ref_: String,
    },
    /// An interactive element present in the pre-snapshot with no match in
    /// the post-snapshot.
    Disappeared {
        /// Human-readable description.
        desc: String,
        /// The vanished element's ref (from the pre-snapshot).
        ref_: String,
    },
    /// A matched element whose name, role, or a tracked property differs
    /// between pre and post.
    Changed {
        /// Comma-separated `k: "old" -> "new"` segments.
        desc: String,
        /// The element's post-snapshot ref.
        ref_: String,
    },
    /// A Fetch/XHR request observed during the stability wait.
    Network {
        /// `"{method} {pathname} -> {status|pending} ({durationMs}ms)"`.
        desc: String,
    },
    /// Appended by the orchestrator for scroll when the standalone mutation
    /// tracker observed remove-and-re-add churn.
    DomChurn {
        /// Human-readable description.
        desc: String,
        /// `Σ min(insertions, removals)` across all parents.
        churn_count: u64,
    },
    /// Appended by the orchestrator for scroll when the layout-shift
    /// observer accumulated non-input-driven CLS.
    LayoutShift {
        /// Human-readable description.
        desc: String,
        /// Cumulative layout shift value.
        cls: f64,
    },
}

impl Consequence {
    /// The human-readable description carried by every variant.
    #[must_use]
    pub fn desc(&self) -> &str {
        match self {
            Self::Appeared { desc, .. }
            | Self::Disappeared { desc, .. }
            | Self::Changed { desc, .. }
            | Self::Network { desc }
            | Self::DomChurn { desc, .. }
            | Self::LayoutShift { desc, .. } => desc,
        }
    }

    /// The element ref this consequence concerns, if any.
    #[must_use]
    pub fn ref_(&self) -> Option<&str> {
        match self {
            Self::Appeared { ref_, .. } | Self::Disappeared { ref_, .. } | Self::Changed { ref_, .. } => {
                Some(ref_)
            }
            Self::Network { .. } | Self::DomChurn { .. } | Self::LayoutShift { .. } => None,
        }
    }
}

fn element_desc(verb: &str, e: &SnapshotElement) -> String {
    if e.name.is_empty() {
        format!("{} {verb}", e.role)
    } else {
        format!("{} \"{}\" {verb}", e.role, e.name)
    }
}

/// Diff a pre- and post-action snapshot's elements, folding in observed
/// network events.
///
/// Matching proceeds in two phases: by `axNodeId` first, then by `domPath`
/// for elements still unmatched after phase one. Unmatched pre elements
/// become `disappeared`; unmatched post elements become `appeared`. Matched
/// pairs whose `name`, `role`, or any property in the symmetric difference
/// of property keys differs become `changed`.
///
/// Ordering: appeared, then disappeared, then changed, then network.
#[must_use]
pub fn diff(
    pre: &[SnapshotElement],
    post: &[SnapshotElement],
    network_events: &[NetworkEvent],
) -> Vec<Consequence> {
    let mut matched_pre: Vec<bool> = vec![false; pre.len()];
    let mut pre_index_by_ax: HashMap<&str, usize> = HashMap::new();
    let mut pre_index_by_path: HashMap<&str, usize> = HashMap::new();
    for (i, e) in pre.iter().enumerate() {
        if let Some(ax) = e.ax_node_id.as_deref() {
            pre_index_by_ax.insert(ax, i);
        }
        pre_index_by_path.insert(e.dom_path.as_str(), i);
    }

    let mut pairs: Vec<(usize, &SnapshotElement)> = Vec::new(); // (pre_index, post_elem)
    let mut unmatched_post: Vec<&SnapshotElement> = Vec::new();

    // Phase 1: match by axNodeId.
    let mut post_matched = vec![false; post.len()];
    for (pi, post_elem) in post.iter().enumerate() {
        if let Some(ax) = post_elem.ax_node_id.as_deref() {
            if let Some(&pre_idx) = pre_index_by_ax.get(ax) {
                if !matched_pre[pre_idx] {
                    matched_pre[pre_idx] = true;
                    post_matched[pi] = true;
                    pairs.push((pre_idx, post_elem));
                }
            }
        }
    }

    // Phase 2: domPath fallback for the rest.
    for (pi, post_elem) in post.iter().enumerate() {
        if post_matched[pi] {
            continue;
        }
        if let Some(&pre_idx) = pre_index_by_path.get(post_elem.dom_path.as_str()) {
            if !matched_pre[pre_idx] {
                matched_pre[pre_idx] = true;
                post_matched[pi] = true;
                pairs.push((pre_idx, post_elem));
                continue;
            }
        }
        unmatched_post.push(post_elem);
    }

    let mut appeared = Vec::new();
    for post_elem in &unmatched_post {
        appeared.push(Consequence::Appeared {
            desc: element_desc("appeared", post_elem),
            ref_: post_elem.ref_.clone(),
        });
    }

    let mut disappeared = Vec::new();
    for (i, e) in pre.iter().enumerate() {
        if !matched_pre[i] {
            disappeared.push(Consequence::Disappeared {
                desc: element_desc("disappeared", e),
                ref_: e.ref_.clone(),
            });
        }
    }

    let mut changed = Vec::new();
    for (pre_idx, post_elem) in &pairs {
        let pre_elem = &pre[*pre_idx];
        if let Some(desc) = changed_desc(pre_elem, post_elem) {
            changed.push(Consequence::Changed {
                desc,
                ref_: post_elem.ref_.clone(),
            });
        }
    }

    let mut network = Vec::new();
    for event in network_events {
        network.push(Consequence::Network {
            desc: event.describe(),
        });
    }

    let mut result = Vec::with_capacity(appeared.len() + disappeared.len() + changed.len() + network.len());
    result.append(&mut appeared);
    result.append(&mut disappeared);
    result.append(&mut changed);
    result.append(&mut network);
    result
}

fn changed_desc(pre: &SnapshotElement, post: &SnapshotElement) -> Option<String> {
    let mut segments = Vec::new();

    if pre.name != post.name {
        segments.push(format!("name: \"{}\" -> \"{}\"", pre.name, post.name));
    }
    if pre.role != post.role {
        segments.push(format!("role: \"{}\" -> \"{}\"", pre.role, post.role));
    }

    let mut keys: Vec<&String> = pre.properties.keys().chain(post.properties.keys()).collect();
    keys.sort();
    keys.dedup();
    for key in keys {
        let old = pre.properties.get(key);
        let new = post.properties.get(key);
        if old != new {
            segments.push(format!(
                "{key}: \"{}\" -> \"{}\"",
                old.map(String::as_str).unwrap_or(""),
                new.map(String::as_str).unwrap_or("")
            ));
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as Map;

    fn elem(ref_: &str, ax: Option<&str>, path: &str, role: &str, name: &str, props: &[(&str, &str)]) -> SnapshotElement {
        SnapshotElement {
            ref_: ref_.to_string(),
            ax_node_id: ax.map(str::to_string),
            dom_path: path.to_string(),
            role: role.to_string(),
            name: name.to_string(),
            properties: props.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect::<Map<_, _>>(),
        }
    }

    #[test]
    fn matches_by_ax_node_id_and_finds_no_changes() {
        let pre = vec![elem("@e1", Some("ax1"), "body > button", "button", "Submit", &[])];
        let post = vec![elem("@e5", Some("ax1"), "body > button", "button", "Submit", &[])];
        let result = diff(&pre, &post, &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn disappeared_element_is_reported() {
        let pre = vec![elem("@e1", Some("ax1"), "body > button", "button", "Submit", &[])];
        let post = vec![];
        let result = diff(&pre, &post, &[]);
        assert_eq!(result.len(), 1);
        match &result[0] {
            Consequence::Disappeared { desc, ref_ } => {
                assert!(desc.contains("Submit"));
                assert_eq!(ref_, "@e1");
            }
            other => panic!("expected Disappeared, got {other:?}"),
        }
    }

    #[test]
    fn appeared_element_is_reported() {
        let pre = vec![];
        let post = vec![elem("@e1", Some("ax1"), "body > a", "link", "Continue", &[])];
        let result = diff(&pre, &post, &[]);
        assert_eq!(result.len(), 1);
        assert!(matches!(result[0], Consequence::Appeared { .. }));
    }

    #[test]
    fn dom_path_fallback_matches_when_ax_node_id_changed() {
        let pre = vec![elem("@e1", Some("ax-old"), "body > input", "textbox", "Name", &[])];
        let post = vec![elem("@e9", Some("ax-new"), "body > input", "textbox", "Name", &[("value", "Alice")])];
        let result = diff(&pre, &post, &[]);
        assert_eq!(result.len(), 1);
        match &result[0] {
            Consequence::Changed { desc, ref_ } => {
                assert!(desc.contains("value"));
                assert_eq!(ref_, "@e9");
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn property_change_is_reported_with_old_and_new() {
        let pre = vec![elem("@e1", Some("ax1"), "body > input", "checkbox", "Agree", &[("checked", "false")])];
        let post = vec![elem("@e1", Some("ax1"), "body > input", "checkbox", "Agree", &[("checked", "true")])];
        let result = diff(&pre, &post, &[]);
        assert_eq!(result.len(), 1);
        match &result[0] {
            Consequence::Changed { desc, .. } => {
                assert_eq!(desc, "checked: \"false\" -> \"true\"");
            }
            other => panic!("expected Changed, got {other:?}"),
        }
    }

    #[test]
    fn ordering_is_appeared_disappeared_changed_network() {
        let pre = vec![
            elem("@e1", Some("ax-gone"), "body > a", "link", "Old", &[]),
            elem("@e2", Some("ax-same"), "body > button", "button", "Save", &[("disabled", "false")]),
        ];
        let post = vec![
            elem("@e2", Some("ax-same"), "body > button", "button", "Save", &[("disabled", "true")]),
            elem("@e3", Some("ax-new"), "body > a", "link", "New", &[]),
        ];
        let events = vec![NetworkEvent {
            request_id: "1".to_string(),
            method: "GET".to_string(),
            url: "https://example.com/api/x".to_string(),
            started_at: 0.0,
            finished_at: Some(0.1),
            status: Some(200),
        }];
        let result = diff(&pre, &post, &events);
        assert_eq!(result.len(), 4);
        assert!(matches!(result[0], Consequence::Appeared { .. }));
        assert!(matches!(result[1], Consequence::Disappeared { .. }));
        assert!(matches!(result[2], Consequence::Changed { .. }));
        assert!(matches!(result[3], Consequence::Network { .. }));
    }

    #[test]
    fn network_event_describes_pending_request() {
        let event = NetworkEvent {
            request_id: "1".to_string(),
            method: "POST".to_string(),
            url: "https://example.com/submit".to_string(),
            started_at: 10.0,
            finished_at: None,
            status: None,
        };
        assert_eq!(event.describe(), "POST /submit -> pending (?ms)");
    }

    #[test]
    fn network_event_describes_completed_request_with_duration() {
        let event = NetworkEvent {
            request_id: "1".to_string(),
            method: "GET".to_string(),
            url: "https://example.com/a/b?x=1".to_string(),
            started_at: 10.0,
            finished_at: Some(10.25),
            status: Some(204),
        };
        assert_eq!(event.describe(), "GET /a/b -> 204 (250ms)");
    }

    #[test]
    fn network_event_falls_back_to_full_url_on_parse_failure() {
        let event = NetworkEvent {
            request_id: "1".to_string(),
            method: "GET".to_string(),
            url: "not-a-valid-url".to_string(),
            started_at: 0.0,
            finished_at: Some(0.0),
            status: Some(200),
        };
        assert_eq!(event.describe(), "GET not-a-valid-url -> 200 (0ms)");
    }
}
