//! Widget construction and lifetime.
//!
//! [`WidgetAdapter::create_instance`] builds one autocomplete element per form
//! field and attaches a selection monitor to it. The returned [`WidgetHandle`]
//! owns that element: dropping or disposing it removes the listeners, stops
//! the monitor and detaches the element.

pub mod monitor;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::ports::AutocompleteWidget;
use crate::constants::{
    DEFAULT_PLACEHOLDER, FIELD_BORDER, FIELD_ERROR_BORDER, REQUESTED_FIELDS,
    REQUESTED_PLACE_DATA_FIELDS, REQUEST_SOURCE,
};
use crate::observability::metrics;
use crate::resolver::AddressResolver;
use crate::session::{Readiness, WidgetSession};
use crate::types::NormalizedAddress;
use monitor::{MonitorHandle, SelectionMonitor};

/// Callback receiving each resolved address for a widget
pub type OnResolved = Arc<dyn Fn(NormalizedAddress) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeKind {
    #[default]
    MediumUntilSm,
    Medium,
}

impl SizeKind {
    fn height(&self) -> &'static str {
        match self {
            SizeKind::MediumUntilSm => "3rem",
            SizeKind::Medium => "2.75rem",
        }
    }
}

/// Presentation options applied to a new widget, and also describing the plain
/// input rendered when no widget can be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    pub id: Option<String>,
    pub placeholder: String,
    pub required: bool,
    pub aria_label: Option<String>,
    pub autocomplete: Option<String>,
    /// Restrict suggestions to these country codes
    pub countries: Vec<String>,
    pub size: SizeKind,
    pub initial_value: Option<String>,
    /// Draw the error border
    pub invalid: bool,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            id: None,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            required: false,
            aria_label: None,
            autocomplete: None,
            countries: Vec::new(),
            size: SizeKind::default(),
            initial_value: None,
            invalid: false,
        }
    }
}

fn apply_options(widget: &dyn AutocompleteWidget, options: &WidgetOptions) {
    widget.set_attribute("fields", REQUESTED_FIELDS);
    widget.set_attribute("requestedPlaceDataFields", REQUESTED_PLACE_DATA_FIELDS);
    widget.set_attribute("request-source", REQUEST_SOURCE);
    widget.set_attribute("placeholder", &options.placeholder);

    if !options.countries.is_empty() {
        widget.set_attribute("countries", &options.countries.join(","));
    }
    if let Some(id) = &options.id {
        widget.set_attribute("id", id);
    }
    if options.required {
        widget.set_attribute("required", "true");
    }
    if let Some(autocomplete) = &options.autocomplete {
        widget.set_attribute("autocomplete", autocomplete);
    }
    if let Some(label) = &options.aria_label {
        widget.set_attribute("aria-label", label);
    }
    if let Some(value) = options.initial_value.as_deref().filter(|v| !v.is_empty()) {
        widget.set_attribute("value", value);
    }

    widget.set_style("width", "100%");
    widget.set_style("height", options.size.height());
    widget.set_style(
        "border",
        if options.invalid {
            FIELD_ERROR_BORDER
        } else {
            FIELD_BORDER
        },
    );
    widget.set_style("border-radius", "0.375rem");
    widget.set_style("padding", "0.5rem 0.75rem");
    widget.set_style("font-size", "0.875rem");
    widget.set_style("line-height", "1.25rem");
}

/// Hands resolved addresses to the caller while the owning handle is alive.
#[derive(Clone)]
pub(crate) struct Delivery {
    alive: Arc<AtomicBool>,
    widget: Arc<dyn AutocompleteWidget>,
    on_resolved: OnResolved,
}

impl Delivery {
    /// Returns false when the handle was disposed and the address was dropped
    pub(crate) fn deliver(&self, address: NormalizedAddress) -> bool {
        if !self.alive.load(Ordering::SeqCst) {
            debug!("discarding resolution for disposed widget");
            metrics::monitor::late_resolution_discarded();
            return false;
        }
        self.widget.set_attribute("value", &address.line_1);
        (self.on_resolved)(address);
        true
    }
}

pub struct WidgetAdapter {
    session: Arc<WidgetSession>,
}

impl WidgetAdapter {
    pub fn new(session: Arc<WidgetSession>) -> Self {
        Self { session }
    }

    /// Build a monitored widget, or `None` when autocomplete is unavailable and
    /// the caller should render a plain text input instead.
    ///
    /// Must be called from within a tokio runtime.
    pub fn create_instance(
        &self,
        on_resolved: OnResolved,
        options: &WidgetOptions,
    ) -> Option<WidgetHandle> {
        let Some(library) = self.session.library() else {
            let readiness = self.session.readiness();
            debug!(?readiness, "places session not ready; no widget");
            metrics::widget::unavailable(match readiness {
                Readiness::Failed(_) => "session_failed",
                _ => "session_not_ready",
            });
            return None;
        };

        if tokio::runtime::Handle::try_current().is_err() {
            warn!("no async runtime available to monitor widget selections");
            metrics::widget::unavailable("no_runtime");
            return None;
        }

        let widget = match library.widgets.create() {
            Ok(widget) => widget,
            Err(e) => {
                warn!(error = %e, "failed to create autocomplete widget");
                metrics::widget::unavailable("construction_failed");
                return None;
            }
        };
        apply_options(widget.as_ref(), options);

        let alive = Arc::new(AtomicBool::new(true));
        let delivery = Delivery {
            alive: alive.clone(),
            widget: widget.clone(),
            on_resolved,
        };
        let resolver = AddressResolver::new(library.service.clone());
        let monitor = SelectionMonitor::attach(widget.clone(), resolver, delivery);

        let id = Uuid::new_v4();
        info!(widget_id = %id, "autocomplete widget created");
        metrics::widget::created();

        Some(WidgetHandle {
            id,
            widget,
            alive,
            monitor: Some(monitor),
        })
    }
}

/// Owner of one mounted widget instance.
pub struct WidgetHandle {
    id: Uuid,
    widget: Arc<dyn AutocompleteWidget>,
    alive: Arc<AtomicBool>,
    monitor: Option<MonitorHandle>,
}

impl WidgetHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn widget(&self) -> &Arc<dyn AutocompleteWidget> {
        &self.widget
    }

    /// Stop monitoring, remove listeners and detach the element. Idempotent.
    ///
    /// A resolution already in flight still completes, but its result is discarded.
    pub fn dispose(&mut self) {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown(self.widget.as_ref());
        }
        self.widget.detach();
        info!(widget_id = %self.id, "autocomplete widget disposed");
        metrics::widget::disposed();
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::in_memory::{
        InMemoryPlacesLoader, InMemoryPlacesService, ScriptedWidget, ScriptedWidgetFactory,
    };
    use crate::app::ports::PlacesLibrary;
    use std::sync::Mutex;

    async fn ready_session(factory: Arc<ScriptedWidgetFactory>) -> Arc<WidgetSession> {
        let library = PlacesLibrary {
            service: Arc::new(InMemoryPlacesService::default()),
            widgets: factory,
        };
        let session = Arc::new(WidgetSession::new(
            Some("key".into()),
            Arc::new(InMemoryPlacesLoader::new(library)),
        ));
        session.initialize().await;
        session
    }

    fn noop() -> OnResolved {
        Arc::new(|_| {})
    }

    #[tokio::test]
    async fn test_no_widget_before_initialize() {
        let factory = Arc::new(ScriptedWidgetFactory::default());
        let library = PlacesLibrary {
            service: Arc::new(InMemoryPlacesService::default()),
            widgets: factory.clone(),
        };
        let session = Arc::new(WidgetSession::new(
            Some("key".into()),
            Arc::new(InMemoryPlacesLoader::new(library)),
        ));
        let adapter = WidgetAdapter::new(session);

        assert!(adapter
            .create_instance(noop(), &WidgetOptions::default())
            .is_none());
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn test_options_are_applied() {
        let factory = Arc::new(ScriptedWidgetFactory::default());
        let adapter = WidgetAdapter::new(ready_session(factory.clone()).await);
        let options = WidgetOptions {
            id: Some("shipping-line-1".into()),
            required: true,
            aria_label: Some("Street address".into()),
            autocomplete: Some("address-line1".into()),
            countries: vec!["US".into(), "CA".into()],
            size: SizeKind::Medium,
            initial_value: Some("1 Main St".into()),
            invalid: true,
            ..Default::default()
        };

        let _handle = adapter.create_instance(noop(), &options).unwrap();
        let widget: Arc<ScriptedWidget> = factory.last().unwrap();

        assert_eq!(widget.attribute("placeholder").as_deref(), Some(DEFAULT_PLACEHOLDER));
        assert_eq!(widget.attribute("required").as_deref(), Some("true"));
        assert_eq!(widget.attribute("aria-label").as_deref(), Some("Street address"));
        assert_eq!(widget.attribute("countries").as_deref(), Some("US,CA"));
        assert_eq!(widget.attribute("id").as_deref(), Some("shipping-line-1"));
        assert_eq!(widget.attribute("value").as_deref(), Some("1 Main St"));
        assert_eq!(widget.attribute("fields").as_deref(), Some(REQUESTED_FIELDS));
        assert_eq!(widget.style("height").as_deref(), Some("2.75rem"));
        assert_eq!(widget.style("border").as_deref(), Some(FIELD_ERROR_BORDER));
    }

    #[tokio::test]
    async fn test_dispose_removes_listeners_and_detaches() {
        let factory = Arc::new(ScriptedWidgetFactory::default());
        let adapter = WidgetAdapter::new(ready_session(factory.clone()).await);

        let mut handle = adapter
            .create_instance(noop(), &WidgetOptions::default())
            .unwrap();
        let widget = factory.last().unwrap();
        assert!(widget.listener_count() > 0);

        handle.dispose();
        assert!(!handle.is_live());
        assert_eq!(widget.listener_count(), 0);
        assert!(widget.is_detached());

        // Second dispose is a no-op
        handle.dispose();
    }

    #[tokio::test]
    async fn test_drop_disposes() {
        let factory = Arc::new(ScriptedWidgetFactory::default());
        let adapter = WidgetAdapter::new(ready_session(factory.clone()).await);

        {
            let _handle = adapter
                .create_instance(noop(), &WidgetOptions::default())
                .unwrap();
        }
        let widget = factory.last().unwrap();
        assert!(widget.is_detached());
        assert_eq!(widget.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_each_field_gets_its_own_widget() {
        let factory = Arc::new(ScriptedWidgetFactory::default());
        let adapter = WidgetAdapter::new(ready_session(factory.clone()).await);

        let first = adapter.create_instance(noop(), &WidgetOptions::default()).unwrap();
        let second = adapter.create_instance(noop(), &WidgetOptions::default()).unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(factory.created(), 2);
    }

    #[tokio::test]
    async fn test_construction_failure_degrades() {
        let factory = Arc::new(ScriptedWidgetFactory::failing());
        let adapter = WidgetAdapter::new(ready_session(factory).await);
        assert!(adapter
            .create_instance(noop(), &WidgetOptions::default())
            .is_none());
    }

    #[tokio::test]
    async fn test_delivery_respects_liveness() {
        let widget: Arc<dyn AutocompleteWidget> = Arc::new(ScriptedWidget::default());
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let alive = Arc::new(AtomicBool::new(true));
        let delivery = Delivery {
            alive: alive.clone(),
            widget,
            on_resolved: Arc::new(move |address| sink.lock().unwrap().push(address)),
        };

        assert!(delivery.deliver(NormalizedAddress::default()));
        alive.store(false, Ordering::SeqCst);
        assert!(!delivery.deliver(NormalizedAddress::default()));
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
