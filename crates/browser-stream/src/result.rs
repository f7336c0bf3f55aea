//! Wire envelopes (§6/§7): the stable `ActionResult`/`SnapshotResult` JSON
//! shapes every tool call returns, and the error taxonomy that populates
//! their `errors` array.

use serde::Serialize;

use crate::differ::Consequence;
use crate::resolver::ResolvedBy;
use crate::snapshot::PageInfo;

/// The wire error taxonomy (§7). No exception is allowed to escape an
/// action; every failure path builds one of these into an `ErrorDetail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionErrorCode {
    #[serde(rename = "REF_STALE")]
    RefStale,
    #[serde(rename = "NO_SUCH_REF")]
    NoSuchRef,
    #[serde(rename = "NOT_INTERACTABLE")]
    NotInteractable,
    #[serde(rename = "STABILITY_TIMEOUT")]
    StabilityTimeout,
    #[serde(rename = "CDP_DISCONNECTED")]
    CdpDisconnected,
    #[serde(rename = "PAGE_CRASHED")]
    PageCrashed,
    #[serde(rename = "ACTION_FAILED")]
    ActionFailed,
    #[serde(rename = "SCRIPT_ERROR")]
    ScriptError,
    #[serde(rename = "FILL_FAILED")]
    FillFailed,
    #[serde(rename = "WAIT_TIMEOUT")]
    WaitTimeout,
}

impl ActionErrorCode {
    /// The wire string value, also useful in log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RefStale => "REF_STALE",
            Self::NoSuchRef => "NO_SUCH_REF",
            Self::NotInteractable => "NOT_INTERACTABLE",
            Self::StabilityTimeout => "STABILITY_TIMEOUT",
            Self::CdpDisconnected => "CDP_DISCONNECTED",
            Self::PageCrashed => "PAGE_CRASHED",
            Self::ActionFailed => "ACTION_FAILED",
            Self::ScriptError => "SCRIPT_ERROR",
            Self::FillFailed => "FILL_FAILED",
            Self::WaitTimeout => "WAIT_TIMEOUT",
        }
    }
}

impl std::fmt::Display for ActionErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One populated entry of an envelope's `errors` array.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: ActionErrorCode,
    pub message: String,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(code: ActionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// A `Consequence` in its wire shape: a `kind` tag plus kind-specific
/// fields, matching §3's tagged variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConsequenceWire {
    Appeared {
        desc: String,
        #[serde(rename = "ref")]
        ref_: String,
    },
    Disappeared {
        desc: String,
        #[serde(rename = "ref")]
        ref_: String,
    },
    Changed {
        desc: String,
        #[serde(rename = "ref")]
        ref_: String,
    },
    Network {
        desc: String,
    },
    DomChurn {
        desc: String,
        #[serde(rename = "churnCount")]
        churn_count: u64,
    },
    LayoutShift {
        desc: String,
        cls: f64,
    },
}

impl From<&Consequence> for ConsequenceWire {
    fn from(c: &Consequence) -> Self {
        match c.clone() {
            Consequence::Appeared { desc, ref_ } => Self::Appeared { desc, ref_ },
            Consequence::Disappeared { desc, ref_ } => Self::Disappeared { desc, ref_ },
            Consequence::Changed { desc, ref_ } => Self::Changed { desc, ref_ },
            Consequence::Network { desc } => Self::Network { desc },
            Consequence::DomChurn { desc, churn_count } => Self::DomChurn { desc, churn_count },
            Consequence::LayoutShift { desc, cls } => Self::LayoutShift { desc, cls },
        }
    }
}

/// The envelope every mutating tool call (`click`, `fill`, `press_key`,
/// `scroll`) returns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    pub version: u8,
    pub action: String,
    pub ok: bool,
    pub page: PageInfo,
    pub consequences: Vec<ConsequenceWire>,
    pub new_interactive_elements: Vec<String>,
    pub errors: Vec<ErrorDetail>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<&'static str>,
    pub timing_ms: u64,
}

impl ActionResult {
    /// Build a successful result. `resolved_by` is `None` for actions with
    /// no ref to resolve (`press_key`, the viewport path of `scroll`).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn success(
        action: impl Into<String>,
        page: PageInfo,
        consequences: &[Consequence],
        new_interactive_elements: Vec<String>,
        warnings: Vec<String>,
        resolved_by: Option<ResolvedBy>,
        timing_ms: u64,
    ) -> Self {
        Self {
            version: 1,
            action: action.into(),
            ok: true,
            page,
            consequences: consequences.iter().map(ConsequenceWire::from).collect(),
            new_interactive_elements,
            errors: Vec::new(),
            warnings,
            resolved_by: resolved_by.map(ResolvedBy::as_str),
            timing_ms,
        }
    }

    /// Build a failed result: `ok:false`, a single populated error, no
    /// consequences (per the `NO_SUCH_REF` testable property).
    #[must_use]
    pub fn failure(action: impl Into<String>, page: PageInfo, error: ErrorDetail, timing_ms: u64) -> Self {
        Self {
            version: 1,
            action: action.into(),
            ok: false,
            page,
            consequences: Vec::new(),
            new_interactive_elements: Vec::new(),
            errors: vec![error],
            warnings: Vec::new(),
            resolved_by: None,
            timing_ms,
        }
    }
}

/// The envelope `browser_navigate`, `browser_snapshot`, and
/// `browser_wait_for` return.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResult {
    pub version: u8,
    pub ok: bool,
    pub page: PageInfo,
    pub elements: Vec<String>,
    pub errors: Vec<ErrorDetail>,
    pub timing_ms: u64,
}

impl SnapshotResult {
    #[must_use]
    pub fn success(page: PageInfo, elements: Vec<String>, timing_ms: u64) -> Self {
        Self {
            version: 1,
            ok: true,
            page,
            elements,
            errors: Vec::new(),
            timing_ms,
        }
    }

    #[must_use]
    pub fn failure(page: PageInfo, error: ErrorDetail, timing_ms: u64) -> Self {
        Self {
            version: 1,
            ok: false,
            page,
            elements: Vec::new(),
            errors: vec![error],
            timing_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_wire_values_match_taxonomy() {
        assert_eq!(ActionErrorCode::RefStale.as_str(), "REF_STALE");
        assert_eq!(ActionErrorCode::NoSuchRef.as_str(), "NO_SUCH_REF");
        assert_eq!(ActionErrorCode::NotInteractable.as_str(), "NOT_INTERACTABLE");
        assert_eq!(ActionErrorCode::StabilityTimeout.as_str(), "STABILITY_TIMEOUT");
        assert_eq!(ActionErrorCode::CdpDisconnected.as_str(), "CDP_DISCONNECTED");
        assert_eq!(ActionErrorCode::PageCrashed.as_str(), "PAGE_CRASHED");
        assert_eq!(ActionErrorCode::ActionFailed.as_str(), "ACTION_FAILED");
        assert_eq!(ActionErrorCode::ScriptError.as_str(), "SCRIPT_ERROR");
        assert_eq!(ActionErrorCode::FillFailed.as_str(), "FILL_FAILED");
        assert_eq!(ActionErrorCode::WaitTimeout.as_str(), "WAIT_TIMEOUT");
    }

    #[test]
    fn no_such_ref_failure_has_empty_consequences() {
        let result = ActionResult::failure(
            "click @e99999",
            PageInfo::default(),
            ErrorDetail::new(ActionErrorCode::NoSuchRef, "no such ref"),
            5,
        );
        assert!(!result.ok);
        assert!(result.consequences.is_empty());
        assert_eq!(result.errors[0].code, ActionErrorCode::NoSuchRef);
    }

    #[test]
    fn success_result_serializes_with_camel_case_fields() {
        let result = ActionResult::success(
            "click @e1",
            PageInfo::default(),
            &[],
            vec!["@e2 button \"Save\"".to_string()],
            Vec::new(),
            Some(ResolvedBy::BackendNodeId),
            42,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["newInteractiveElements"][0], "@e2 button \"Save\"");
        assert_eq!(json["resolvedBy"], "backendNodeId");
        assert_eq!(json["timingMs"], 42);
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn resolved_by_omitted_when_absent() {
        let result = ActionResult::success("press_key Enter", PageInfo::default(), &[], Vec::new(), Vec::new(), None, 1);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("resolvedBy").is_none());
    }

    #[test]
    fn consequence_wire_tags_match_spec_kebab_case() {
        let appeared = Consequence::Appeared {
            desc: "button \"Submit\" appeared".to_string(),
            ref_: "@e2".to_string(),
        };
        let churn = Consequence::DomChurn {
            desc: "DOM churned".to_string(),
            churn_count: 3,
        };
        let appeared_json = serde_json::to_value(ConsequenceWire::from(&appeared)).unwrap();
        let churn_json = serde_json::to_value(ConsequenceWire::from(&churn)).unwrap();
        assert_eq!(appeared_json["kind"], "appeared");
        assert_eq!(appeared_json["ref"], "@e2");
        assert_eq!(churn_json["kind"], "dom-churn");
        assert_eq!(churn_json["churnCount"], 3);
    }

    #[test]
    fn snapshot_result_failure_has_empty_elements() {
        let result = SnapshotResult::failure(
            PageInfo::default(),
            ErrorDetail::new(ActionErrorCode::WaitTimeout, "timed out"),
            10_000,
        );
        assert!(!result.ok);
        assert!(result.elements.is_empty());
    }
}
