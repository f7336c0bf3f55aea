//! Action Orchestrator (§4.7): the shared pre/act/settle/post/diff pipeline
//! behind every mutating action, plus navigate and wait-for.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chromiumoxide::cdp::browser_protocol::dom::{GetDocumentParams, NodeId, ResolveNodeParams};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams, DispatchMouseEventType,
    MouseButton,
};
use chromiumoxide::cdp::browser_protocol::page::{EventLoadEventFired, NavigateParams};
use chromiumoxide::cdp::js_protocol::runtime::{CallArgument, CallFunctionOnParams, RemoteObjectId};
use futures::StreamExt;
use serde::Deserialize;

use crate::cdp::{CdpChannel, CdpError};
use crate::differ::{diff, Consequence};
use crate::interactable::{ensure_interactable, InteractableError, Point};
use crate::registry::{BackendNodeId, RefRegistry};
use crate::resolver::{resolve, ResolvedBy, ResolverError};
use crate::result::{ActionErrorCode, ActionResult, ErrorDetail, SnapshotResult};
use crate::snapshot::{take_snapshot, PageInfo, SnapshotData, SnapshotElement, SnapshotError};
use crate::stability::{wait_for_stability, MutationTally, MutationTracker};

const NAVIGATE_TIMEOUT_MS: u64 = 30_000;
const WAIT_POLL_MS: u64 = 500;
/// Default `timeout` for `browser_wait_for` when the caller omits it.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Sets up a `window`-scoped accumulator fed by a `layout-shift`
/// `PerformanceObserver`, ignoring entries with `hadRecentInput`.
const INSTALL_LAYOUT_SHIFT_OBSERVER_JS: &str = r"
(() => {
  if (window.__browserStreamCls !== undefined) return true;
  window.__browserStreamCls = 0;
  try {
    const po = new PerformanceObserver((list) => {
      for (const entry of list.getEntries()) {
        if (!entry.hadRecentInput) {
          window.__browserStreamCls += entry.value;
        }
      }
    });
    po.observe({ type: 'layout-shift', buffered: true });
    window.__browserStreamClsObserver = po;
    return true;
  } catch (e) {
    return false;
  }
})()
";

/// Reads and resets the accumulator, disconnecting the observer.
const COLLECT_LAYOUT_SHIFT_JS: &str = r"
(() => {
  const cls = window.__browserStreamCls || 0;
  if (window.__browserStreamClsObserver) {
    window.__browserStreamClsObserver.disconnect();
  }
  window.__browserStreamCls = 0;
  return cls;
})()
";

/// Fill primitive (§4.7.2): content-editable path sets `innerText`; the
/// input/textarea path goes through the native value setter so React/Vue
/// pick up the change, falling back to direct assignment. Returns whether
/// the value actually persisted.
const FILL_FN: &str = r"
function(value) {
  if (this.isContentEditable) {
    this.focus();
    this.innerText = value;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    return this.innerText === value;
  }
  this.focus();
  const proto = this instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
  const desc = Object.getOwnPropertyDescriptor(proto, 'value');
  if (desc && desc.set) {
    desc.set.call(this, value);
  } else {
    this.value = value;
  }
  this.dispatchEvent(new Event('input', { bubbles: true }));
  this.dispatchEvent(new Event('change', { bubbles: true }));
  return this.value === value;
}
";

/// Scroll primitive (§4.7.4). `hasRef` selects between walking up from
/// `this` for a scrollable ancestor, or scrolling the document directly.
const SCROLL_FN: &str = r"
function(direction, amount, hasRef) {
  function findContainer(el) {
    let node = el ? el.parentElement : null;
    while (node) {
      const style = getComputedStyle(node);
      if ((style.overflowY === 'auto' || style.overflowY === 'scroll') && node.scrollHeight > node.clientHeight) {
        return { el: node, fallback: false };
      }
      node = node.parentElement;
    }
    return { el: document.scrollingElement || document.documentElement || document.body, fallback: true };
  }
  let container;
  let fallback;
  if (hasRef) {
    const found = findContainer(this);
    container = found.el;
    fallback = found.fallback;
  } else {
    container = document.scrollingElement || document.documentElement || document.body;
    fallback = false;
  }
  const scrollTopBefore = container.scrollTop;
  const clientHeight = container.clientHeight;
  const scrollHeight = container.scrollHeight;
  let target;
  if (amount === 'to-top') {
    target = 0;
  } else if (amount === 'to-bottom') {
    target = Math.max(0, scrollHeight - clientHeight);
  } else {
    const magnitude = amount === 'page' ? clientHeight : Number(amount);
    const signed = direction === 'up' ? -magnitude : magnitude;
    target = scrollTopBefore + signed;
  }
  container.scrollTop = target;
  return {
    scrollTopBefore: scrollTopBefore,
    scrollTopAfter: container.scrollTop,
    scrollHeight: container.scrollHeight,
    clientHeight: clientHeight,
    containerTag: container.tagName ? container.tagName.toLowerCase() : 'html',
    fallback: fallback,
  };
}
";

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn now_epoch_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn cdp_error_detail(e: CdpError) -> ErrorDetail {
    match e {
        CdpError::PageCrashed => ErrorDetail::new(ActionErrorCode::PageCrashed, "page crashed"),
        CdpError::Disconnected(msg) => ErrorDetail::new(ActionErrorCode::CdpDisconnected, msg),
        CdpError::Command(msg) | CdpError::Setup(msg) => ErrorDetail::new(ActionErrorCode::ActionFailed, msg),
    }
}

fn resolver_error_detail(e: ResolverError) -> ErrorDetail {
    match e {
        ResolverError::NoSuchRef => ErrorDetail::new(ActionErrorCode::NoSuchRef, "no such ref"),
        ResolverError::RefStale => ErrorDetail::new(ActionErrorCode::RefStale, "ref is stale"),
        ResolverError::Cdp(e) => cdp_error_detail(e),
    }
}

fn interactable_error_detail(e: InteractableError) -> ErrorDetail {
    match e {
        InteractableError::NotInteractable => {
            ErrorDetail::new(ActionErrorCode::NotInteractable, "element is not interactable")
        }
        InteractableError::Cdp(e) => cdp_error_detail(e),
    }
}

fn snapshot_error_detail(e: SnapshotError) -> ErrorDetail {
    match e {
        SnapshotError::Cdp(e) => cdp_error_detail(e),
        SnapshotError::UnexpectedShape(msg) => ErrorDetail::new(ActionErrorCode::ScriptError, msg),
    }
}

async fn resolve_object_id(channel: &CdpChannel, backend_node_id: BackendNodeId) -> Result<RemoteObjectId, CdpError> {
    let resolved = channel
        .send(
            ResolveNodeParams::builder()
                .backend_node_id(NodeId::from(backend_node_id))
                .build(),
        )
        .await?;
    resolved
        .object
        .object_id
        .ok_or_else(|| CdpError::Command("resolved node has no remote object id".to_string()))
}

/// Build the final result for a ref-based action: diff pre/post, surface
/// newly-appeared elements' compact lines, attach `STABILITY_TIMEOUT` if
/// the hard cap fired.
fn finish(
    action: String,
    pre: SnapshotData,
    post: SnapshotData,
    outcome: crate::stability::StabilityOutcome,
    resolved_by: Option<ResolvedBy>,
    start: Instant,
) -> ActionResult {
    let consequences = diff(&pre.elements, &post.elements, &outcome.network_events);
    let new_interactive_elements = new_interactive_elements(&consequences, &post);
    let mut warnings = Vec::new();
    if outcome.timed_out {
        warnings.push("STABILITY_TIMEOUT".to_string());
    }
    ActionResult::success(
        action,
        post.page,
        &consequences,
        new_interactive_elements,
        warnings,
        resolved_by,
        elapsed_ms(start),
    )
}

fn new_interactive_elements(consequences: &[Consequence], post: &SnapshotData) -> Vec<String> {
    consequences
        .iter()
        .filter_map(|c| match c {
            Consequence::Appeared { ref_, .. } => post.find(ref_).map(SnapshotElement::compact_line),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------
// Click (§4.7.1)
// ---------------------------------------------------------------------

async fn dispatch_click(channel: &CdpChannel, point: Point) -> Result<(), CdpError> {
    channel
        .send(
            DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MouseMoved)
                .x(point.x)
                .y(point.y)
                .build()
                .map_err(|e| CdpError::Command(e.to_string()))?,
        )
        .await?;
    channel
        .send(
            DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MousePressed)
                .x(point.x)
                .y(point.y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(|e| CdpError::Command(e.to_string()))?,
        )
        .await?;
    channel
        .send(
            DispatchMouseEventParams::builder()
                .r#type(DispatchMouseEventType::MouseReleased)
                .x(point.x)
                .y(point.y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(|e| CdpError::Command(e.to_string()))?,
        )
        .await?;
    Ok(())
}

/// `browser_click`: resolve, interactable-check, click at the centroid,
/// await stability, diff.
pub async fn click(channel: &CdpChannel, registry: &mut RefRegistry, r: &str) -> ActionResult {
    let start = Instant::now();
    let action = format!("click {r}");

    let resolved = match resolve(channel, registry, r).await {
        Ok(resolved) => resolved,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), resolver_error_detail(e), elapsed_ms(start)),
    };

    let point = match ensure_interactable(channel, resolved.backend_node_id).await {
        Ok(p) => p,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), interactable_error_detail(e), elapsed_ms(start)),
    };

    let pre = match take_snapshot(channel, registry, true).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
    };

    let action_start = now_epoch_seconds();

    if let Err(e) = dispatch_click(channel, point).await {
        return ActionResult::failure(action, pre.page, cdp_error_detail(e), elapsed_ms(start));
    }

    let outcome = wait_for_stability(channel, action_start).await;

    let post = match take_snapshot(channel, registry, false).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, pre.page, snapshot_error_detail(e), elapsed_ms(start)),
    };

    finish(action, pre, post, outcome, Some(resolved.resolved_by), start)
}

// ---------------------------------------------------------------------
// Fill (§4.7.2)
// ---------------------------------------------------------------------

async fn run_fill_script(channel: &CdpChannel, object_id: RemoteObjectId, value: &str) -> Result<bool, CdpError> {
    let result = channel
        .send(
            CallFunctionOnParams::builder()
                .object_id(object_id)
                .function_declaration(FILL_FN.to_string())
                .arguments(vec![CallArgument::builder().value(serde_json::json!(value)).build()])
                .return_by_value(true)
                .build(),
        )
        .await?;
    Ok(result
        .result
        .value
        .as_ref()
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false))
}

/// `browser_fill`: resolve, set the value through the native setter (or
/// `innerText` for content-editable), await stability, diff.
pub async fn fill(channel: &CdpChannel, registry: &mut RefRegistry, r: &str, value: &str) -> ActionResult {
    let start = Instant::now();
    let action = format!("fill {r}");

    let resolved = match resolve(channel, registry, r).await {
        Ok(resolved) => resolved,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), resolver_error_detail(e), elapsed_ms(start)),
    };

    let object_id = match resolve_object_id(channel, resolved.backend_node_id).await {
        Ok(id) => id,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), cdp_error_detail(e), elapsed_ms(start)),
    };

    let pre = match take_snapshot(channel, registry, true).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
    };

    let action_start = now_epoch_seconds();

    let persisted = match run_fill_script(channel, object_id, value).await {
        Ok(p) => p,
        Err(e) => return ActionResult::failure(action, pre.page, cdp_error_detail(e), elapsed_ms(start)),
    };

    if !persisted {
        return ActionResult::failure(
            action,
            pre.page,
            ErrorDetail::new(ActionErrorCode::FillFailed, "value was not persisted"),
            elapsed_ms(start),
        );
    }

    let outcome = wait_for_stability(channel, action_start).await;

    let post = match take_snapshot(channel, registry, false).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, pre.page, snapshot_error_detail(e), elapsed_ms(start)),
    };

    finish(action, pre, post, outcome, Some(resolved.resolved_by), start)
}

// ---------------------------------------------------------------------
// Press Key (§4.7.3)
// ---------------------------------------------------------------------

struct KeyDescriptor {
    key: String,
    code: String,
    key_code: u32,
}

fn named_key(name: &str) -> Option<KeyDescriptor> {
    let (key, code, key_code): (&str, &str, u32) = match name {
        "Enter" => ("Enter", "Enter", 13),
        "Escape" => ("Escape", "Escape", 27),
        "Tab" => ("Tab", "Tab", 9),
        "Backspace" => ("Backspace", "Backspace", 8),
        "ArrowUp" => ("ArrowUp", "ArrowUp", 38),
        "ArrowDown" => ("ArrowDown", "ArrowDown", 40),
        "ArrowLeft" => ("ArrowLeft", "ArrowLeft", 37),
        "ArrowRight" => ("ArrowRight", "ArrowRight", 39),
        "Space" | " " => (" ", "Space", 32),
        _ => return None,
    };
    Some(KeyDescriptor {
        key: key.to_string(),
        code: code.to_string(),
        key_code,
    })
}

fn describe_key(primary: &str) -> KeyDescriptor {
    if let Some(named) = named_key(primary) {
        return named;
    }
    let mut chars = primary.chars();
    let Some(c) = chars.next() else {
        return KeyDescriptor {
            key: String::new(),
            code: String::new(),
            key_code: 0,
        };
    };
    if chars.next().is_some() {
        return KeyDescriptor {
            key: primary.to_string(),
            code: primary.to_string(),
            key_code: 0,
        };
    }
    if c.is_ascii_digit() {
        KeyDescriptor {
            key: c.to_string(),
            code: format!("Digit{c}"),
            key_code: u32::from(c as u8),
        }
    } else {
        let upper = c.to_ascii_uppercase();
        KeyDescriptor {
            key: c.to_string(),
            code: format!("Key{upper}"),
            key_code: u32::from(upper as u8),
        }
    }
}

struct ParsedKey {
    descriptor: KeyDescriptor,
    modifiers: u8,
    is_single_printable: bool,
}

/// `alt = 1, ctrl = 2, meta = 4, shift = 8` per §4.7.3.
const MOD_ALT: u8 = 1;
const MOD_CTRL: u8 = 2;
const MOD_META: u8 = 4;
const MOD_SHIFT: u8 = 8;

fn parse_key(input: &str) -> ParsedKey {
    let tokens: Vec<&str> = input.split('+').filter(|t| !t.is_empty()).collect();
    let split_at = tokens.len().saturating_sub(1);
    let (mods, primary_tokens) = tokens.split_at(split_at);
    let primary = primary_tokens.first().copied().unwrap_or("");

    let mut modifiers: u8 = 0;
    for m in mods {
        match m.to_ascii_lowercase().as_str() {
            "alt" => modifiers |= MOD_ALT,
            "control" | "ctrl" => modifiers |= MOD_CTRL,
            "meta" | "command" | "cmd" => modifiers |= MOD_META,
            "shift" => modifiers |= MOD_SHIFT,
            _ => {}
        }
    }

    let descriptor = describe_key(primary);
    let is_single_printable = descriptor.key.chars().count() == 1
        && descriptor.key.chars().next().is_some_and(|c| !c.is_control())
        && (modifiers & (MOD_ALT | MOD_CTRL | MOD_META)) == 0;

    ParsedKey {
        descriptor,
        modifiers,
        is_single_printable,
    }
}

async fn dispatch_key(channel: &CdpChannel, parsed: &ParsedKey) -> Result<(), CdpError> {
    let d = &parsed.descriptor;
    channel
        .send(
            DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .key(d.key.clone())
                .code(d.code.clone())
                .windows_virtual_key_code(i64::from(d.key_code))
                .modifiers(i64::from(parsed.modifiers))
                .build(),
        )
        .await?;

    if parsed.is_single_printable {
        channel
            .send(
                DispatchKeyEventParams::builder()
                    .r#type(DispatchKeyEventType::Char)
                    .text(d.key.clone())
                    .key(d.key.clone())
                    .build(),
            )
            .await?;
    }

    channel
        .send(
            DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .key(d.key.clone())
                .code(d.code.clone())
                .windows_virtual_key_code(i64::from(d.key_code))
                .modifiers(i64::from(parsed.modifiers))
                .build(),
        )
        .await?;
    Ok(())
}

/// `browser_press_key`: no interactable check (there is no target
/// element), otherwise the standard pipeline.
pub async fn press_key(channel: &CdpChannel, registry: &mut RefRegistry, key_spec: &str) -> ActionResult {
    let start = Instant::now();
    let action = format!("press_key {key_spec}");
    let parsed = parse_key(key_spec);

    let pre = match take_snapshot(channel, registry, true).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
    };

    let action_start = now_epoch_seconds();

    if let Err(e) = dispatch_key(channel, &parsed).await {
        return ActionResult::failure(action, pre.page, cdp_error_detail(e), elapsed_ms(start));
    }

    let outcome = wait_for_stability(channel, action_start).await;

    let post = match take_snapshot(channel, registry, false).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, pre.page, snapshot_error_detail(e), elapsed_ms(start)),
    };

    finish(action, pre, post, outcome, None, start)
}

// ---------------------------------------------------------------------
// Scroll (§4.7.4)
// ---------------------------------------------------------------------

/// `up` or `down`, as supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// `page | to-top | to-bottom | <pixels>`, default `page`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAmount {
    Page,
    ToTop,
    ToBottom,
    Pixels(f64),
}

impl ScrollAmount {
    fn to_js_value(self) -> serde_json::Value {
        match self {
            Self::Page => serde_json::json!("page"),
            Self::ToTop => serde_json::json!("to-top"),
            Self::ToBottom => serde_json::json!("to-bottom"),
            Self::Pixels(n) => serde_json::json!(n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScrollOutcomeJs {
    #[serde(rename = "scrollTopBefore")]
    scroll_top_before: f64,
    #[serde(rename = "scrollTopAfter")]
    scroll_top_after: f64,
    fallback: bool,
}

fn parse_scroll_result(value: Option<serde_json::Value>) -> Result<ScrollOutcomeJs, CdpError> {
    let value = value.ok_or_else(|| CdpError::Command("scroll script returned no value".to_string()))?;
    serde_json::from_value(value).map_err(|e| CdpError::Command(e.to_string()))
}

async fn run_scroll_script(
    channel: &CdpChannel,
    object_id: Option<RemoteObjectId>,
    direction: ScrollDirection,
    amount: ScrollAmount,
) -> Result<ScrollOutcomeJs, CdpError> {
    match object_id {
        Some(object_id) => {
            let args = vec![
                CallArgument::builder().value(serde_json::json!(direction.as_str())).build(),
                CallArgument::builder().value(amount.to_js_value()).build(),
                CallArgument::builder().value(serde_json::json!(true)).build(),
            ];
            let result = channel
                .send(
                    CallFunctionOnParams::builder()
                        .object_id(object_id)
                        .function_declaration(SCROLL_FN.to_string())
                        .arguments(args)
                        .return_by_value(true)
                        .build(),
                )
                .await?;
            parse_scroll_result(result.result.value)
        }
        None => {
            let expr = format!(
                "({SCROLL_FN}).call(null, {}, {}, false)",
                serde_json::to_string(direction.as_str()).unwrap_or_default(),
                amount.to_js_value()
            );
            let value: serde_json::Value = channel.evaluate(&expr).await?;
            parse_scroll_result(Some(value))
        }
    }
}

/// `browser_scroll`: optionally resolve a ref to find its nearest
/// scrollable ancestor, scroll, then report DOM-churn and layout-shift
/// consequences alongside the usual diff.
pub async fn scroll(
    channel: &CdpChannel,
    registry: &mut RefRegistry,
    r: Option<&str>,
    direction: ScrollDirection,
    amount: ScrollAmount,
) -> ActionResult {
    let start = Instant::now();
    let action = match r {
        Some(r) => format!("scroll {r} {}", direction.as_str()),
        None => format!("scroll {}", direction.as_str()),
    };

    let mut resolved_by = None;
    let object_id = match r {
        Some(r) => match resolve(channel, registry, r).await {
            Ok(resolved) => {
                resolved_by = Some(resolved.resolved_by);
                match resolve_object_id(channel, resolved.backend_node_id).await {
                    Ok(id) => Some(id),
                    Err(e) => return ActionResult::failure(action, PageInfo::default(), cdp_error_detail(e), elapsed_ms(start)),
                }
            }
            Err(e) => return ActionResult::failure(action, PageInfo::default(), resolver_error_detail(e), elapsed_ms(start)),
        },
        None => None,
    };

    // Expand the DOM tree so `childNodeInserted`/`childNodeRemoved` cover
    // dynamically created subtrees (§4.7.4).
    let _ = channel.send(GetDocumentParams::builder().depth(-1).build()).await;
    if let Err(e) = channel.evaluate::<bool>(INSTALL_LAYOUT_SHIFT_OBSERVER_JS).await {
        tracing::debug!(error = %e, "layout-shift observer unavailable, cls will be 0");
    }
    let mutation_tracker = MutationTracker::start(channel).await;

    let pre = match take_snapshot(channel, registry, true).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
    };

    let action_start = now_epoch_seconds();

    let scroll_outcome = match run_scroll_script(channel, object_id, direction, amount).await {
        Ok(o) => o,
        Err(e) => return ActionResult::failure(action, pre.page, cdp_error_detail(e), elapsed_ms(start)),
    };

    let stability = wait_for_stability(channel, action_start).await;

    let tally = match mutation_tracker {
        Some(t) => t.stop().await,
        None => MutationTally::default(),
    };
    let cls: f64 = channel.evaluate(COLLECT_LAYOUT_SHIFT_JS).await.unwrap_or(0.0);

    let post = match take_snapshot(channel, registry, false).await {
        Ok(data) => data,
        Err(e) => return ActionResult::failure(action, pre.page, snapshot_error_detail(e), elapsed_ms(start)),
    };

    let mut consequences = diff(&pre.elements, &post.elements, &stability.network_events);
    if tally.churn_count > 0 {
        consequences.push(Consequence::DomChurn {
            desc: format!("DOM churned: {} element(s) removed and re-added", tally.churn_count),
            churn_count: tally.churn_count,
        });
    }
    if cls > 0.0 {
        consequences.push(Consequence::LayoutShift {
            desc: format!("layout shifted (cls={cls:.3})"),
            cls,
        });
    }

    let new_interactive_elements = new_interactive_elements(&consequences, &post);

    let mut warnings = Vec::new();
    if stability.timed_out {
        warnings.push("STABILITY_TIMEOUT".to_string());
    }
    let resolved_intent = match amount {
        ScrollAmount::ToTop => ScrollDirection::Up,
        ScrollAmount::ToBottom => ScrollDirection::Down,
        ScrollAmount::Page | ScrollAmount::Pixels(_) => direction,
    };
    if (scroll_outcome.scroll_top_before - scroll_outcome.scroll_top_after).abs() < f64::EPSILON {
        let edge = if matches!(resolved_intent, ScrollDirection::Up) { "top" } else { "bottom" };
        warnings.push(format!("SCROLL_AT_BOUNDARY: Already at {edge}"));
    }
    if scroll_outcome.fallback {
        if let Some(r) = r {
            warnings.push(format!(
                "SCROLL_FALLBACK: No scrollable ancestor found for {r}, scrolling viewport instead"
            ));
        }
    }

    ActionResult::success(
        action,
        post.page,
        &consequences,
        new_interactive_elements,
        warnings,
        resolved_by,
        elapsed_ms(start),
    )
}

// ---------------------------------------------------------------------
// Navigate (§4.7.5)
// ---------------------------------------------------------------------

/// `browser_navigate`: navigate, wait for `Page.loadEventFired` (30 s
/// cap), invalidate every ref, and take a fresh snapshot.
pub async fn navigate(channel: &CdpChannel, registry: &mut RefRegistry, url: &str) -> SnapshotResult {
    let start = Instant::now();

    let mut load_events = match channel.on::<EventLoadEventFired>().await {
        Ok(s) => s,
        Err(e) => return SnapshotResult::failure(PageInfo::default(), cdp_error_detail(e), elapsed_ms(start)),
    };

    if let Err(e) = channel
        .send(NavigateParams::builder().url(url.to_string()).build().unwrap_or_default())
        .await
    {
        return SnapshotResult::failure(PageInfo::default(), cdp_error_detail(e), elapsed_ms(start));
    }

    let waited = tokio::time::timeout(Duration::from_millis(NAVIGATE_TIMEOUT_MS), load_events.next()).await;
    if waited.is_err() {
        return SnapshotResult::failure(
            PageInfo::default(),
            ErrorDetail::new(ActionErrorCode::ActionFailed, "navigation timed out"),
            elapsed_ms(start),
        );
    }

    registry.mark_all_stale();

    match take_snapshot(channel, registry, false).await {
        Ok(data) => SnapshotResult::success(data.page, data.compact_lines(), elapsed_ms(start)),
        Err(e) => SnapshotResult::failure(PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
    }
}

// ---------------------------------------------------------------------
// Wait-For (§4.7.6)
// ---------------------------------------------------------------------

fn text_condition_holds(needle: &str, snapshot: &SnapshotData) -> bool {
    let needle = needle.to_lowercase();
    if snapshot.page.title.to_lowercase().contains(&needle) {
        return true;
    }
    snapshot.elements.iter().any(|e| {
        e.name.to_lowercase().contains(&needle)
            || e.properties
                .get("value")
                .is_some_and(|v| v.to_lowercase().contains(&needle))
    })
}

async fn ref_condition_holds(channel: &CdpChannel, registry: &mut RefRegistry, r: &str) -> bool {
    let Ok(resolved) = resolve(channel, registry, r).await else {
        return false;
    };
    channel
        .send(
            chromiumoxide::cdp::browser_protocol::dom::GetBoxModelParams::builder()
                .backend_node_id(NodeId::from(resolved.backend_node_id))
                .build(),
        )
        .await
        .is_ok()
}

/// `browser_wait_for`: poll every 500 ms until the text and/or ref
/// conditions hold, or `timeout_ms` elapses.
pub async fn wait_for(
    channel: &CdpChannel,
    registry: &mut RefRegistry,
    text: Option<&str>,
    r: Option<&str>,
    timeout_ms: u64,
) -> SnapshotResult {
    let start = Instant::now();
    let deadline = start + Duration::from_millis(timeout_ms);

    loop {
        let ref_ok = match r {
            Some(r) => ref_condition_holds(channel, registry, r).await,
            None => true,
        };

        let snapshot = match take_snapshot(channel, registry, true).await {
            Ok(data) => data,
            Err(e) => return SnapshotResult::failure(PageInfo::default(), snapshot_error_detail(e), elapsed_ms(start)),
        };

        let text_ok = match text {
            Some(needle) => text_condition_holds(needle, &snapshot),
            None => true,
        };

        if text_ok && ref_ok {
            return SnapshotResult::success(snapshot.page, snapshot.compact_lines(), elapsed_ms(start));
        }

        if Instant::now() >= deadline {
            return SnapshotResult::failure(
                snapshot.page,
                ErrorDetail::new(ActionErrorCode::WaitTimeout, "wait_for timed out"),
                elapsed_ms(start),
            );
        }

        tokio::time::sleep(Duration::from_millis(WAIT_POLL_MS)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_keys_resolve_to_fixed_descriptors() {
        let parsed = parse_key("Enter");
        assert_eq!(parsed.descriptor.key, "Enter");
        assert_eq!(parsed.descriptor.code, "Enter");
        assert_eq!(parsed.descriptor.key_code, 13);
        assert!(!parsed.is_single_printable);
    }

    #[test]
    fn single_letter_key_computes_key_upper_code() {
        let parsed = parse_key("a");
        assert_eq!(parsed.descriptor.code, "KeyA");
        assert!(parsed.is_single_printable);
    }

    #[test]
    fn single_digit_key_computes_digit_code() {
        let parsed = parse_key("5");
        assert_eq!(parsed.descriptor.code, "Digit5");
        assert!(parsed.is_single_printable);
    }

    #[test]
    fn ctrl_modifier_suppresses_char_dispatch() {
        let parsed = parse_key("ctrl+a");
        assert_eq!(parsed.modifiers, MOD_CTRL);
        assert!(!parsed.is_single_printable);
    }

    #[test]
    fn shift_modifier_does_not_suppress_char_dispatch() {
        let parsed = parse_key("shift+a");
        assert_eq!(parsed.modifiers, MOD_SHIFT);
        assert!(parsed.is_single_printable);
    }

    #[test]
    fn multiple_modifiers_combine_bitwise() {
        let parsed = parse_key("control+alt+Delete");
        assert_eq!(parsed.modifiers, MOD_CTRL | MOD_ALT);
    }

    #[test]
    fn scroll_direction_wire_values() {
        assert_eq!(ScrollDirection::Up.as_str(), "up");
        assert_eq!(ScrollDirection::Down.as_str(), "down");
    }

    #[test]
    fn scroll_amount_js_values() {
        assert_eq!(ScrollAmount::Page.to_js_value(), serde_json::json!("page"));
        assert_eq!(ScrollAmount::ToTop.to_js_value(), serde_json::json!("to-top"));
        assert_eq!(ScrollAmount::ToBottom.to_js_value(), serde_json::json!("to-bottom"));
        assert_eq!(ScrollAmount::Pixels(120.0).to_js_value(), serde_json::json!(120.0));
    }

    #[test]
    fn new_interactive_elements_only_includes_appeared() {
        let post = SnapshotData {
            elements: vec![SnapshotElement {
                ref_: "@e2".to_string(),
                ax_node_id: None,
                dom_path: "body > a".to_string(),
                role: "link".to_string(),
                name: "Continue".to_string(),
                properties: std::collections::HashMap::new(),
            }],
            page: PageInfo::default(),
        };
        let consequences = vec![
            Consequence::Appeared {
                desc: "link \"Continue\" appeared".to_string(),
                ref_: "@e2".to_string(),
            },
            Consequence::Network {
                desc: "GET /x -> 200 (10ms)".to_string(),
            },
        ];
        let lines = new_interactive_elements(&consequences, &post);
        assert_eq!(lines, vec!["@e2 link \"Continue\""]);
    }
}
