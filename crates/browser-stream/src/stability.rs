//! Stability Waiter (§4.6): a single-threaded event-driven debounce over
//! DOM mutations and in-flight Fetch/XHR traffic, deciding when a page has
//! settled after an action. Also provides the standalone mutation tracker
//! scroll uses to compute the churn heuristic.

use std::collections::HashMap;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::dom::{EventChildNodeInserted, EventChildNodeRemoved};
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent, EventResponseReceived, ResourceType,
};
use futures::{Stream, StreamExt};
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep_until};

use crate::cdp::CdpChannel;
use crate::differ::NetworkEvent;

/// Resolve once no tracked event has fired for this long.
pub const DEBOUNCE_MS: u64 = 200;
/// Absolute ceiling on how long a stability wait may run.
pub const HARD_CAP_MS: u64 = 3000;

/// Result of a stability wait: whether the hard cap fired before the
/// debounce settled, plus every Fetch/XHR request observed.
#[derive(Debug, Clone, Default)]
pub struct StabilityOutcome {
    /// `true` if `HARD_CAP_MS` elapsed before the page settled.
    pub timed_out: bool,
    /// Fetch/XHR requests observed during the wait.
    pub network_events: Vec<NetworkEvent>,
}

struct PendingRequest {
    method: String,
    url: String,
    started_at: f64,
    status: Option<i64>,
}

fn is_tracked_resource(kind: &ResourceType) -> bool {
    matches!(kind, ResourceType::Fetch | ResourceType::Xhr)
}

/// Poll `stream`'s next item, or never resolve if `stream` is `None` —
/// lets a failed-to-subscribe event source degrade to "never fires" rather
/// than aborting the whole wait.
async fn next_or_pending<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream {
        Some(s) => s.next().await,
        None => pending().await,
    }
}

/// Wait for the page to settle after an action: no tracked DOM mutation and
/// no in-flight Fetch/XHR request for `DEBOUNCE_MS`, or `HARD_CAP_MS`
/// elapses first.
///
/// `action_start` is the wall-clock Unix-epoch-seconds timestamp the action
/// began at; only requests whose `requestWillBeSent` `wallTime` is at or
/// after it are tracked. `timestamp` (CDP monotonic time) is a different
/// clock and is used only for duration math between two CDP timestamps,
/// never compared against `action_start`.
pub async fn wait_for_stability(channel: &CdpChannel, action_start: f64) -> StabilityOutcome {
    let mut inserted = channel.on::<EventChildNodeInserted>().await.ok();
    let mut removed = channel.on::<EventChildNodeRemoved>().await.ok();
    let mut will_be_sent = channel.on::<EventRequestWillBeSent>().await.ok();
    let mut response_received = channel.on::<EventResponseReceived>().await.ok();
    let mut finished = channel.on::<EventLoadingFinished>().await.ok();
    let mut failed = channel.on::<EventLoadingFailed>().await.ok();

    let mut in_flight: HashMap<String, PendingRequest> = HashMap::new();
    let mut events: Vec<NetworkEvent> = Vec::new();

    let hard_cap = Instant::now() + Duration::from_millis(HARD_CAP_MS);
    let mut debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);

    loop {
        tokio::select! {
            biased;

            () = sleep_until(hard_cap) => {
                return StabilityOutcome { timed_out: true, network_events: events };
            }

            () = sleep_until(debounce_deadline) => {
                if in_flight.is_empty() {
                    return StabilityOutcome { timed_out: false, network_events: events };
                }
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(_ev) = next_or_pending(&mut inserted) => {
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(_ev) = next_or_pending(&mut removed) => {
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(ev) = next_or_pending(&mut will_be_sent) => {
                // `timestamp` is CDP monotonic time (arbitrary origin), used
                // below only for self-consistent duration math. Whether the
                // request started at-or-after the action requires comparing
                // like clocks, so that test is against `wall_time` (Unix
                // epoch seconds), the same clock `action_start` is in.
                let wall = *ev.wall_time.inner();
                let ts = *ev.timestamp.inner();
                if is_tracked_resource(&ev.r#type) && wall >= action_start {
                    in_flight.insert(
                        ev.request_id.inner().clone(),
                        PendingRequest {
                            method: ev.request.method.clone(),
                            url: ev.request.url.clone(),
                            started_at: ts,
                            status: None,
                        },
                    );
                }
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(ev) = next_or_pending(&mut response_received) => {
                if let Some(req) = in_flight.get_mut(ev.request_id.inner()) {
                    req.status = Some(ev.response.status);
                }
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(ev) = next_or_pending(&mut finished) => {
                if let Some(req) = in_flight.remove(ev.request_id.inner()) {
                    events.push(NetworkEvent {
                        request_id: ev.request_id.inner().clone(),
                        method: req.method,
                        url: req.url,
                        started_at: req.started_at,
                        finished_at: Some(*ev.timestamp.inner()),
                        status: req.status,
                    });
                }
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }

            Some(ev) = next_or_pending(&mut failed) => {
                if let Some(req) = in_flight.remove(ev.request_id.inner()) {
                    events.push(NetworkEvent {
                        request_id: ev.request_id.inner().clone(),
                        method: req.method,
                        url: req.url,
                        started_at: req.started_at,
                        finished_at: Some(*ev.timestamp.inner()),
                        status: req.status,
                    });
                }
                debounce_deadline = Instant::now() + Duration::from_millis(DEBOUNCE_MS);
            }
        }
    }
}

/// Per-parent insertion/removal tally the churn heuristic is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationTally {
    /// Total child insertions across all parents.
    pub insertions: u64,
    /// Total child removals across all parents.
    pub removals: u64,
    /// `Σ min(insertions[p], removals[p])` — the remove-and-re-add heuristic.
    pub churn_count: u64,
}

/// Standalone DOM mutation tracker used by scroll (§4.6): subscribes
/// before the scroll command is issued, to catch synchronous mutations
/// fired during the in-page scroll assignment, and is stopped after the
/// stability wait.
pub struct MutationTracker {
    counts: Arc<Mutex<HashMap<i64, (u64, u64)>>>,
    task: tokio::task::JoinHandle<()>,
}

impl MutationTracker {
    /// Start tracking `DOM.childNodeInserted`/`DOM.childNodeRemoved` on
    /// `channel`. Returns `None` if subscription fails, in which case the
    /// caller should treat churn as unmeasurable (zero) rather than fail
    /// the scroll action.
    pub async fn start(channel: &CdpChannel) -> Option<Self> {
        let mut inserted = channel.on::<EventChildNodeInserted>().await.ok()?;
        let mut removed = channel.on::<EventChildNodeRemoved>().await.ok()?;

        let counts: Arc<Mutex<HashMap<i64, (u64, u64)>>> = Arc::new(Mutex::new(HashMap::new()));
        let counts_bg = Arc::clone(&counts);

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_ev = inserted.next() => {
                        let Some(ev) = maybe_ev else { break };
                        let mut c = counts_bg.lock().await;
                        c.entry(*ev.parent_node_id.inner()).or_insert((0, 0)).0 += 1;
                    }
                    maybe_ev = removed.next() => {
                        let Some(ev) = maybe_ev else { break };
                        let mut c = counts_bg.lock().await;
                        c.entry(*ev.parent_node_id.inner()).or_insert((0, 0)).1 += 1;
                    }
                }
            }
        });

        Some(Self { counts, task })
    }

    /// Stop tracking and aggregate: `insertions = Σ ins`, `removals = Σ
    /// rem`, `churn_count = Σ min(ins[p], rem[p])`. Invariant under
    /// reordering of the underlying events, since only per-parent totals
    /// matter.
    pub async fn stop(self) -> MutationTally {
        self.task.abort();
        let counts = self.counts.lock().await;
        let mut tally = MutationTally::default();
        for (ins, rem) in counts.values() {
            tally.insertions += ins;
            tally.removals += rem;
            tally.churn_count += ins.min(rem);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally_from(parents: &[(u64, u64)]) -> MutationTally {
        let mut tally = MutationTally::default();
        for (ins, rem) in parents {
            tally.insertions += ins;
            tally.removals += rem;
            tally.churn_count += (*ins).min(*rem);
        }
        tally
    }

    #[test]
    fn churn_is_min_pair_sum_per_parent() {
        // parent A: 5 inserted, 5 removed (re-render) -> churn 5
        // parent B: 3 inserted, 0 removed (genuinely new) -> churn 0
        let tally = tally_from(&[(5, 5), (3, 0)]);
        assert_eq!(tally.insertions, 8);
        assert_eq!(tally.removals, 5);
        assert_eq!(tally.churn_count, 5);
    }

    #[test]
    fn churn_total_is_invariant_under_event_reordering() {
        // Same aggregate counts regardless of the order events arrived in,
        // since only the per-parent totals feed the heuristic.
        let forward = tally_from(&[(2, 1), (4, 4)]);
        let reversed = tally_from(&[(4, 4), (2, 1)]);
        assert_eq!(forward.churn_count, reversed.churn_count);
        assert_eq!(forward.churn_count, 1 + 4);
    }

    #[test]
    fn zero_removals_means_zero_churn() {
        let tally = tally_from(&[(10, 0)]);
        assert_eq!(tally.churn_count, 0);
    }

    #[test]
    fn debounce_and_hard_cap_constants_match_spec() {
        assert_eq!(DEBOUNCE_MS, 200);
        assert_eq!(HARD_CAP_MS, 3000);
    }
}
