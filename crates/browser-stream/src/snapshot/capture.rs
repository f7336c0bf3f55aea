//! The snapshot builder: `Accessibility.getFullAXTree` primary path with a
//! DOM-query fallback for pages that expose no usable accessibility tree.

use std::collections::HashMap;

use chromiumoxide::cdp::browser_protocol::accessibility::{
    AxProperty, AxValue, GetFullAxTreeParams, GetPartialAxTreeParams, GetPartialAxTreeReturns,
};
use chromiumoxide::cdp::browser_protocol::dom::{
    DescribeNodeParams, GetDocumentParams, NodeId, QuerySelectorParams, ResolveNodeParams,
};
use chromiumoxide::cdp::js_protocol::runtime::{
    CallFunctionOnParams, ReleaseObjectParams, RemoteObjectId,
};
use serde::Deserialize;
use serde_json::Value;

use crate::cdp::CdpChannel;
use crate::registry::{BackendNodeId, NodeIdentity, RefRegistry};

use super::element::{INTERACTIVE_ROLES, PageInfo, SnapshotData, SnapshotElement, Viewport};
use super::error::SnapshotResult;

/// Computes the `domPath` of `this`: `#id` if the element or any ancestor up
/// to (and not including) `body` has one, else `tag:nth-of-type(k)` at every
/// level, rooted at `body`.
const DOM_PATH_FN: &str = r"
function() {
  let node = this;
  const parts = [];
  while (node && node.nodeType === 1 && node !== document.body) {
    if (node.id) {
      parts.unshift('#' + node.id);
      return parts.join(' > ');
    }
    const parent = node.parentElement;
    if (!parent) {
      parts.unshift(node.tagName.toLowerCase());
      break;
    }
    const sameTag = Array.from(parent.children).filter((c) => c.tagName === node.tagName);
    const index = sameTag.indexOf(node) + 1;
    parts.unshift(node.tagName.toLowerCase() + ':nth-of-type(' + index + ')');
    node = parent;
  }
  return parts.length ? 'body > ' + parts.join(' > ') : 'body';
}
";

/// The fixed selector union plus role/name/domPath synthesis for the DOM
/// fallback path, evaluated as a single in-page script. Mirrors
/// `classification::infer_role` and the `DOM_PATH_FN` walk above, run
/// client-side so the whole fallback is one round trip.
const DOM_FALLBACK_JS: &str = r#"
(() => {
  const SEL = 'a[href], button, input, select, textarea, [role=button], [role=link], '
    + '[role=textbox], [role=checkbox], [role=radio], [role=combobox], [role=menuitem], '
    + '[role=tab], [role=switch], [tabindex]:not([tabindex="-1"])';

  function domPath(el) {
    let node = el;
    const parts = [];
    while (node && node.nodeType === 1 && node !== document.body) {
      if (node.id) {
        parts.unshift('#' + node.id);
        return parts.join(' > ');
      }
      const parent = node.parentElement;
      if (!parent) {
        parts.unshift(node.tagName.toLowerCase());
        break;
      }
      const sameTag = Array.from(parent.children).filter((c) => c.tagName === node.tagName);
      const index = sameTag.indexOf(node) + 1;
      parts.unshift(node.tagName.toLowerCase() + ':nth-of-type(' + index + ')');
      node = parent;
    }
    return parts.length ? 'body > ' + parts.join(' > ') : 'body';
  }

  function roleOf(el) {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit;
    const tag = el.tagName.toLowerCase();
    if (tag === 'a') return 'link';
    if (tag === 'select') return 'combobox';
    if (tag === 'input') {
      const t = (el.getAttribute('type') || '').toLowerCase();
      if (t === 'checkbox') return 'checkbox';
      if (t === 'radio') return 'radio';
      return 'textbox';
    }
    if (tag === 'textarea') return 'textbox';
    return 'button';
  }

  return Array.from(document.querySelectorAll(SEL)).map((el) => ({
    role: roleOf(el),
    name: el.getAttribute('aria-label')
      || el.getAttribute('placeholder')
      || el.getAttribute('title')
      || (el.innerText || '').slice(0, 50),
    domPath: domPath(el),
  }));
})()
"#;

#[derive(Debug, Deserialize)]
struct FallbackRecord {
    role: String,
    name: String,
    #[serde(rename = "domPath")]
    dom_path: String,
}

#[derive(Debug, Deserialize)]
struct ViewportJs {
    width: u32,
    height: u32,
}

/// Build a [`SnapshotData`] from the current page.
///
/// If `keep_existing_refs` is false, `registry` is cleared first; its
/// monotonic counter is untouched, so refs assigned before and after never
/// collide. If true, existing entries are left alone — used for the
/// pre-action snapshot of the action pipeline, so a ref touched by the
/// action continues to identify the same node when the post-action snapshot
/// runs.
///
/// # Errors
///
/// Returns a [`super::SnapshotError`] if the CDP channel fails while walking
/// the accessibility tree, DOM, or evaluating the fallback script.
pub async fn take_snapshot(
    channel: &CdpChannel,
    registry: &mut RefRegistry,
    keep_existing_refs: bool,
) -> SnapshotResult<SnapshotData> {
    if !keep_existing_refs {
        registry.clear();
    }

    let mut elements = primary_pass(channel, registry).await?;

    if elements.is_empty() {
        let body_has_children: bool = channel
            .evaluate("!!(document.body && document.body.children.length > 0)")
            .await
            .unwrap_or(false);
        if body_has_children {
            elements = fallback_pass(channel, registry).await?;
        }
    }

    let page = page_info(channel).await?;

    Ok(SnapshotData { elements, page })
}

async fn primary_pass(
    channel: &CdpChannel,
    registry: &mut RefRegistry,
) -> SnapshotResult<Vec<SnapshotElement>> {
    let tree = channel.send(GetFullAxTreeParams::default()).await?;

    let mut elements = Vec::new();
    for node in tree.nodes {
        if node.ignored {
            continue;
        }
        let Some(role) = ax_value_str(node.role.as_ref()) else {
            continue;
        };
        if !INTERACTIVE_ROLES.contains(&role.as_str()) {
            continue;
        }
        let Some(backend_node_id) = node.backend_dom_node_id.map(|id| *id.inner()) else {
            continue;
        };

        let name = ax_value_str(node.name.as_ref()).unwrap_or_default();
        let mut properties = properties_map(node.properties.as_deref());
        if let Some(value) = ax_value_str(node.value.as_ref()) {
            properties.insert("value".to_string(), value);
        }

        let dom_path = compute_dom_path(channel, backend_node_id).await;
        let ax_node_id = Some(node.node_id.inner().clone());

        let ref_ = registry.assign(NodeIdentity::new(
            ax_node_id.clone(),
            Some(backend_node_id),
            dom_path.clone(),
        ));

        elements.push(SnapshotElement {
            ref_,
            ax_node_id,
            dom_path: dom_path.unwrap_or_default(),
            role,
            name,
            properties,
        });
    }

    Ok(elements)
}

async fn fallback_pass(
    channel: &CdpChannel,
    registry: &mut RefRegistry,
) -> SnapshotResult<Vec<SnapshotElement>> {
    let records: Vec<FallbackRecord> = channel.evaluate(DOM_FALLBACK_JS).await?;

    let document = channel
        .send(GetDocumentParams::builder().depth(0).build())
        .await
        .ok();

    let mut elements = Vec::with_capacity(records.len());
    for record in records {
        let backend_node_id = match &document {
            Some(doc) => resolve_backend_node_id(channel, doc.root.node_id, &record.dom_path).await,
            None => None,
        };
        let (ax_node_id, properties) = match backend_node_id {
            Some(id) => best_effort_ax_node_id(channel, id).await.unzip(),
            None => (None, None),
        };

        let ref_ = registry.assign(NodeIdentity::new(
            ax_node_id.clone(),
            backend_node_id,
            Some(record.dom_path.clone()),
        ));

        elements.push(SnapshotElement {
            ref_,
            ax_node_id,
            dom_path: record.dom_path,
            role: record.role,
            name: record.name,
            properties: properties.unwrap_or_default(),
        });
    }

    Ok(elements)
}

async fn resolve_backend_node_id(
    channel: &CdpChannel,
    root: NodeId,
    dom_path: &str,
) -> Option<BackendNodeId> {
    let found = channel
        .send(
            QuerySelectorParams::builder()
                .node_id(root)
                .selector(dom_path.to_string())
                .build(),
        )
        .await
        .ok()?;
    if *found.node_id.inner() == 0 {
        return None;
    }
    let described = channel
        .send(DescribeNodeParams::builder().node_id(found.node_id).build())
        .await
        .ok()?;
    Some(*described.node.backend_node_id.inner())
}

/// Best-effort AX lookup for a DOM-fallback-discovered element: returns the
/// node's `axNodeId` alongside whatever `focused`/`checked`/`selected`/…
/// properties the partial tree carries, on the reading that the spec text
/// describes what the upstream implementation drops, not a constraint this
/// reimplementation must also drop (§9 Open Question 1).
async fn best_effort_ax_node_id(
    channel: &CdpChannel,
    backend_node_id: BackendNodeId,
) -> Option<(String, HashMap<String, String>)> {
    let params = GetPartialAxTreeParams::builder()
        .backend_node_id(NodeId::from(backend_node_id))
        .build();
    let returns: GetPartialAxTreeReturns = channel.send(params).await.ok()?;
    let node = returns.nodes.into_iter().next()?;
    let mut properties = properties_map(node.properties.as_deref());
    if let Some(value) = ax_value_str(node.value.as_ref()) {
        properties.insert("value".to_string(), value);
    }
    Some((node.node_id.inner().clone(), properties))
}

/// Resolve `backend_node_id` to a remote object, ask it for its own
/// `domPath`, then release the object. Best effort: any failure along the
/// way yields `None` rather than failing the whole snapshot, since a missing
/// `domPath` is tolerated as long as `backendNodeId` is present.
async fn compute_dom_path(channel: &CdpChannel, backend_node_id: BackendNodeId) -> Option<String> {
    let resolved = channel
        .send(
            ResolveNodeParams::builder()
                .backend_node_id(NodeId::from(backend_node_id))
                .build(),
        )
        .await
        .ok()?;
    let object_id: RemoteObjectId = resolved.object.object_id?;

    let called = channel
        .send(
            CallFunctionOnParams::builder()
                .object_id(object_id.clone())
                .function_declaration(DOM_PATH_FN.to_string())
                .return_by_value(true)
                .build(),
        )
        .await
        .ok();

    let _ = channel.send(ReleaseObjectParams::new(object_id)).await;

    called?
        .result
        .value
        .as_ref()
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn ax_value_str(value: Option<&AxValue>) -> Option<String> {
    value.and_then(|v| v.value.as_ref()).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn properties_map(properties: Option<&[AxProperty]>) -> HashMap<String, String> {
    let Some(properties) = properties else {
        return HashMap::new();
    };
    properties
        .iter()
        .filter_map(|p| {
            let key = serde_json::to_value(&p.name)
                .ok()?
                .as_str()
                .map(str::to_string)?;
            let value = ax_value_str(Some(&p.value))?;
            Some((key, value))
        })
        .collect()
}

async fn page_info(channel: &CdpChannel) -> SnapshotResult<PageInfo> {
    let url = channel.url().await?;
    let title: String = channel.evaluate("document.title").await.unwrap_or_default();
    let viewport: ViewportJs = channel
        .evaluate("({ width: window.innerWidth, height: window.innerHeight })")
        .await
        .unwrap_or(ViewportJs { width: 0, height: 0 });

    Ok(PageInfo {
        url,
        title,
        viewport: Viewport {
            width: viewport.width,
            height: viewport.height,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_path_fn_mirrors_the_fallback_walk() {
        assert!(DOM_PATH_FN.contains("nth-of-type"));
        assert!(DOM_FALLBACK_JS.contains("nth-of-type"));
    }

    #[test]
    fn fallback_selector_union_matches_the_fixed_set() {
        for role_attr in [
            "[role=button]",
            "[role=link]",
            "[role=textbox]",
            "[role=checkbox]",
            "[role=radio]",
            "[role=combobox]",
            "[role=menuitem]",
            "[role=tab]",
            "[role=switch]",
        ] {
            assert!(DOM_FALLBACK_JS.contains(role_attr), "missing {role_attr}");
        }
        assert!(DOM_FALLBACK_JS.contains("a[href]"));
        assert!(DOM_FALLBACK_JS.contains(r#"[tabindex]:not([tabindex="-1"])"#));
    }
}
