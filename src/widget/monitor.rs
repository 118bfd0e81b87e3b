//! Selection detection for one widget instance.
//!
//! Three signals feed a single event loop: place-selected events from the
//! widget, committed input values that look like a full address (checked
//! again after a settling window), and a periodic snapshot diff. Commits are
//! de-duplicated on the input value at commit time, so one physical selection
//! normally produces exactly one resolution. The exception is place data that
//! shows up after a commit had to fall back to the places service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use super::Delivery;
use crate::app::ports::{AutocompleteWidget, ListenerId, WidgetEvent};
use crate::constants::{INPUT_CHANGE_EVENT, PLACE_SELECTED_EVENTS, POLL_INTERVAL, SETTLE_WINDOW};
use crate::observability::metrics;
use crate::resolver::AddressResolver;
use crate::types::{PlaceData, SelectionEvidence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStrategy {
    PlaceEvent,
    InputCommit,
    SnapshotPoll,
}

impl DetectionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionStrategy::PlaceEvent => "place_event",
            DetectionStrategy::InputCommit => "input_commit",
            DetectionStrategy::SnapshotPoll => "snapshot_poll",
        }
    }
}

#[derive(Debug)]
enum Signal {
    PlaceEvent {
        event_name: String,
        place: Option<PlaceData>,
    },
    InputChanged(String),
}

/// Read the widget's current state through the adapter seam
pub fn capture(widget: &dyn AutocompleteWidget) -> SelectionEvidence {
    SelectionEvidence {
        predictions: widget.predictions(),
        place: widget.selected_place(),
        input_value: widget.input_value(),
    }
}

fn looks_complete(input: &str) -> bool {
    input.contains(',')
}

fn commit_key(evidence: &SelectionEvidence) -> String {
    let input = evidence.input_value.trim();
    if !input.is_empty() {
        return input.to_string();
    }
    evidence
        .place
        .as_ref()
        .and_then(|p| p.formatted().or(p.display()))
        .unwrap_or_default()
        .to_string()
}

/// The last committed snapshot, and whether its evidence resolved without the service
struct Committed {
    key: String,
    local: bool,
}

/// Owned by the widget handle; tears the monitor down on dispose.
pub(crate) struct MonitorHandle {
    task: JoinHandle<()>,
    listeners: Vec<ListenerId>,
}

impl MonitorHandle {
    pub(crate) fn shutdown(self, widget: &dyn AutocompleteWidget) {
        self.task.abort();
        for id in self.listeners {
            widget.remove_listener(id);
        }
    }
}

pub(crate) struct SelectionMonitor {
    widget: Arc<dyn AutocompleteWidget>,
    resolver: AddressResolver,
    delivery: Delivery,
    last: SelectionEvidence,
    last_committed: Option<Committed>,
    generation: Arc<AtomicU64>,
    settle_pending: Option<String>,
    settles: JoinSet<String>,
}

impl SelectionMonitor {
    /// Subscribe to the widget and start the monitor loop on the current runtime.
    pub(crate) fn attach(
        widget: Arc<dyn AutocompleteWidget>,
        resolver: AddressResolver,
        delivery: Delivery,
    ) -> MonitorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = Vec::with_capacity(PLACE_SELECTED_EVENTS.len() + 1);

        for event_name in PLACE_SELECTED_EVENTS {
            let tx = tx.clone();
            listeners.push(widget.add_listener(
                event_name,
                Arc::new(move |event: WidgetEvent| {
                    let _ = tx.send(Signal::PlaceEvent {
                        event_name: event.name,
                        place: event.place,
                    });
                }),
            ));
        }
        listeners.push(widget.add_listener(
            INPUT_CHANGE_EVENT,
            Arc::new(move |event: WidgetEvent| {
                if let Some(value) = event.value {
                    let _ = tx.send(Signal::InputChanged(value));
                }
            }),
        ));

        let monitor = Self {
            last: capture(widget.as_ref()),
            widget,
            resolver,
            delivery,
            last_committed: None,
            generation: Arc::new(AtomicU64::new(0)),
            settle_pending: None,
            settles: JoinSet::new(),
        };
        let task = tokio::spawn(monitor.run(rx));
        MonitorHandle { task, listeners }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Signal>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                signal = rx.recv() => match signal {
                    Some(signal) => self.handle_signal(signal),
                    None => break,
                },
                Some(settled) = self.settles.join_next() => {
                    if let Ok(input) = settled {
                        self.on_settled(input);
                    }
                }
                _ = ticker.tick() => self.poll(),
            }
        }
        debug!("selection monitor stopped");
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::PlaceEvent { event_name, place } => {
                // Some variants attach the place to the element rather than the event
                let place = place.or_else(|| self.widget.selected_place());
                match place.filter(PlaceData::is_usable) {
                    Some(place) => {
                        debug!(event_name, "place event carried usable data");
                        let mut evidence = capture(self.widget.as_ref());
                        evidence.place = Some(place);
                        self.commit(DetectionStrategy::PlaceEvent, evidence);
                    }
                    None => debug!(event_name, "place event without usable place"),
                }
            }
            Signal::InputChanged(value) => self.schedule_settle(value),
        }
    }

    /// Strategy 2: a full-looking value gets re-checked after the settling window
    fn schedule_settle(&mut self, input: String) {
        if !looks_complete(&input) {
            return;
        }
        let key = input.trim().to_string();
        if self.committed_key() == Some(key.as_str())
            || self.settle_pending.as_deref() == Some(key.as_str())
        {
            return;
        }
        trace!(input = %key, "scheduling settle check");
        self.settle_pending = Some(key.clone());
        self.settles.spawn(async move {
            tokio::time::sleep(SETTLE_WINDOW).await;
            key
        });
    }

    fn on_settled(&mut self, input: String) {
        if self.settle_pending.as_deref() == Some(input.as_str()) {
            self.settle_pending = None;
        }
        let evidence = capture(self.widget.as_ref());
        if evidence.input_value.trim() != input {
            debug!("input moved on during settling window");
            return;
        }
        self.commit(DetectionStrategy::InputCommit, evidence);
    }

    /// Strategy 3: diff the widget state against the previous tick
    fn poll(&mut self) {
        let current = capture(self.widget.as_ref());

        if current.predictions != self.last.predictions {
            trace!(count = current.predictions.len(), "predictions changed");
        }

        if current.input_value != self.last.input_value {
            let trimmed = current.input_value.trim();
            if self.committed_key().is_some_and(|k| k != trimmed) {
                // A new value re-arms detection for whatever gets picked next
                self.last_committed = None;
            }
            self.schedule_settle(current.input_value.clone());
        }

        let place_changed = current.place != self.last.place;
        self.last = current.clone();

        if place_changed && current.place.as_ref().is_some_and(PlaceData::is_usable) {
            self.commit(DetectionStrategy::SnapshotPoll, current);
        }
    }

    fn committed_key(&self) -> Option<&str> {
        self.last_committed.as_ref().map(|c| c.key.as_str())
    }

    /// A snapshot already committed is only resolved again when it now carries
    /// local address data and the earlier commit had to fall back to the service.
    fn commit(&mut self, strategy: DetectionStrategy, evidence: SelectionEvidence) {
        let key = commit_key(&evidence);
        let local = AddressResolver::resolve_local(&evidence).is_some();
        if let Some(previous) = self.last_committed.as_ref().filter(|c| c.key == key) {
            if previous.local || !local {
                debug!(strategy = strategy.as_str(), "selection already committed");
                metrics::monitor::duplicate_suppressed(strategy.as_str());
                return;
            }
            debug!(strategy = strategy.as_str(), "place data arrived after fallback commit");
        }
        info!(strategy = strategy.as_str(), input = %key, local, "selection committed");
        metrics::monitor::commit(strategy.as_str());
        self.last_committed = Some(Committed { key, local });

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();

        // Resolution is not cancelled by dispose; delivery checks liveness instead
        let resolver = self.resolver.clone();
        let delivery = self.delivery.clone();
        tokio::spawn(async move {
            let address = resolver.resolve(&evidence).await;
            if latest.load(Ordering::SeqCst) != generation {
                debug!("resolution superseded by a later commit");
                return;
            }
            delivery.deliver(address);
        });
    }
}
