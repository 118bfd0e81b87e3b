//! In-memory implementations of every port, for development, the demo binary
//! and tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use crate::app::ports::{
    AutocompleteWidget, FieldKind, FormEvent, FormStore, HtmlForm, ListenerId, PlacesLibrary,
    PlacesLibraryLoader, PlacesService, SetValueOptions, WidgetEvent, WidgetFactory,
    WidgetListener,
};
use crate::constants::INPUT_CHANGE_EVENT;
use crate::error::{AddressError, Result};
use crate::types::{PlaceData, Prediction};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn search_key(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Places service answering from canned search and details tables
#[derive(Default)]
pub struct InMemoryPlacesService {
    searches: HashMap<String, Vec<PlaceData>>,
    details: HashMap<String, PlaceData>,
    fail: bool,
    latency: Duration,
    search_calls: AtomicUsize,
    details_calls: AtomicUsize,
}

impl InMemoryPlacesService {
    pub fn with_search(mut self, query: &str, results: Vec<PlaceData>) -> Self {
        self.searches.insert(search_key(query), results);
        self
    }

    pub fn with_details(mut self, place_id: &str, place: PlaceData) -> Self {
        self.details.insert(place_id.to_string(), place);
        self
    }

    /// Every call fails as if the service were unreachable
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn unavailable() -> AddressError {
        AddressError::Api {
            status: "UNAVAILABLE".into(),
            message: "in-memory places service configured to fail".into(),
        }
    }
}

#[async_trait]
impl PlacesService for InMemoryPlacesService {
    async fn text_search(&self, query: &str) -> Result<Vec<PlaceData>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail {
            return Err(Self::unavailable());
        }
        Ok(self
            .searches
            .get(&search_key(query))
            .cloned()
            .unwrap_or_default())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceData> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail {
            return Err(Self::unavailable());
        }
        self.details
            .get(place_id)
            .cloned()
            .ok_or_else(|| AddressError::Api {
                status: "NOT_FOUND".into(),
                message: format!("no details for place {}", place_id),
            })
    }
}

/// Loader handing back a prepared library, or failing on demand
pub struct InMemoryPlacesLoader {
    library: PlacesLibrary,
    fail: bool,
    loads: AtomicUsize,
}

impl InMemoryPlacesLoader {
    pub fn new(library: PlacesLibrary) -> Self {
        Self {
            library,
            fail: false,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlacesLibraryLoader for InMemoryPlacesLoader {
    async fn load(&self, _credential: &str) -> Result<PlacesLibrary> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AddressError::LoadFailure("library script unreachable".into()));
        }
        Ok(self.library.clone())
    }
}

#[derive(Default)]
struct WidgetState {
    predictions: Vec<Prediction>,
    place: Option<PlaceData>,
    input_value: String,
    attributes: HashMap<String, String>,
    styles: HashMap<String, String>,
    listeners: BTreeMap<ListenerId, (String, WidgetListener)>,
    detached: bool,
}

/// An autocomplete widget driven by hand: tests and the demo type text,
/// publish predictions, set the selected place and emit events.
#[derive(Default)]
pub struct ScriptedWidget {
    state: Mutex<WidgetState>,
    next_listener: AtomicU64,
}

impl ScriptedWidget {
    pub fn type_text(&self, text: &str) {
        lock(&self.state).input_value = text.to_string();
    }

    pub fn set_predictions(&self, predictions: Vec<Prediction>) {
        lock(&self.state).predictions = predictions;
    }

    pub fn set_place(&self, place: Option<PlaceData>) {
        lock(&self.state).place = place;
    }

    /// Pick a dropdown entry: the input shows the full text and the place is populated
    pub fn choose(&self, text: &str, place: Option<PlaceData>) {
        let mut state = lock(&self.state);
        state.input_value = text.to_string();
        state.place = place;
    }

    /// Fire every listener registered for `event_name`
    pub fn emit(&self, event_name: &str, place: Option<PlaceData>, value: Option<String>) {
        let listeners: Vec<WidgetListener> = lock(&self.state)
            .listeners
            .values()
            .filter(|(name, _)| name == event_name)
            .map(|(_, listener)| listener.clone())
            .collect();
        debug!(event_name, listeners = listeners.len(), "scripted widget emitting");
        for listener in listeners {
            listener(WidgetEvent {
                name: event_name.to_string(),
                place: place.clone(),
                value: value.clone(),
            });
        }
    }

    /// Emit the inner input's change event with the current text
    pub fn commit_input(&self) {
        let value = self.input_value();
        self.emit(INPUT_CHANGE_EVENT, None, Some(value));
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        lock(&self.state).attributes.get(name).cloned()
    }

    pub fn style(&self, property: &str) -> Option<String> {
        lock(&self.state).styles.get(property).cloned()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }

    pub fn is_detached(&self) -> bool {
        lock(&self.state).detached
    }
}

impl AutocompleteWidget for ScriptedWidget {
    fn predictions(&self) -> Vec<Prediction> {
        lock(&self.state).predictions.clone()
    }

    fn selected_place(&self) -> Option<PlaceData> {
        lock(&self.state).place.clone()
    }

    fn input_value(&self) -> String {
        lock(&self.state).input_value.clone()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        lock(&self.state)
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_style(&self, property: &str, value: &str) {
        lock(&self.state)
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn add_listener(&self, event_name: &str, listener: WidgetListener) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        lock(&self.state)
            .listeners
            .insert(id, (event_name.to_string(), listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        lock(&self.state).listeners.remove(&id);
    }

    fn detach(&self) {
        lock(&self.state).detached = true;
    }
}

/// Factory keeping a typed handle on every widget it builds
#[derive(Default)]
pub struct ScriptedWidgetFactory {
    created: Mutex<Vec<Arc<ScriptedWidget>>>,
    fail: bool,
}

impl ScriptedWidgetFactory {
    pub fn failing() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn last(&self) -> Option<Arc<ScriptedWidget>> {
        lock(&self.created).last().cloned()
    }

    pub fn created(&self) -> usize {
        lock(&self.created).len()
    }
}

impl WidgetFactory for ScriptedWidgetFactory {
    fn create(&self) -> Result<Arc<dyn AutocompleteWidget>> {
        if self.fail {
            return Err(AddressError::Widget("element not defined".into()));
        }
        let widget = Arc::new(ScriptedWidget::default());
        lock(&self.created).push(widget.clone());
        Ok(widget)
    }
}

#[derive(Debug, Clone)]
struct FieldState {
    kind: FieldKind,
    value: String,
}

/// A plain form of named inputs and selects
#[derive(Default)]
pub struct InMemoryForm {
    fields: Mutex<HashMap<String, FieldState>>,
    events: Mutex<Vec<(String, FormEvent)>>,
}

impl InMemoryForm {
    pub fn with_input(self, name: &str) -> Self {
        lock(&self.fields).insert(
            name.to_string(),
            FieldState {
                kind: FieldKind::Input,
                value: String::new(),
            },
        );
        self
    }

    pub fn with_select(self, name: &str, options: &[&str], selected: &str) -> Self {
        lock(&self.fields).insert(
            name.to_string(),
            FieldState {
                kind: FieldKind::Select {
                    options: options.iter().map(|o| o.to_string()).collect(),
                },
                value: selected.to_string(),
            },
        );
        self
    }

    pub fn value(&self, name: &str) -> Option<String> {
        lock(&self.fields).get(name).map(|f| f.value.clone())
    }

    /// Name/value pairs sorted by name
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        lock(&self.fields)
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }

    pub fn events(&self) -> Vec<(String, FormEvent)> {
        lock(&self.events).clone()
    }
}

impl HtmlForm for InMemoryForm {
    fn field_kind(&self, name: &str) -> Option<FieldKind> {
        lock(&self.fields).get(name).map(|f| f.kind.clone())
    }

    fn set_value(&self, name: &str, value: &str) {
        if let Some(field) = lock(&self.fields).get_mut(name) {
            field.value = value.to_string();
        }
    }

    fn dispatch(&self, name: &str, event: FormEvent) {
        lock(&self.events).push((name.to_string(), event));
    }
}

/// A managed form-state store keyed by dotted paths
#[derive(Default)]
pub struct InMemoryFormStore {
    values: Mutex<BTreeMap<String, String>>,
    marked: Mutex<BTreeMap<String, bool>>,
    validations: Mutex<Vec<Vec<String>>>,
}

impl InMemoryFormStore {
    pub fn value(&self, path: &str) -> Option<String> {
        lock(&self.values).get(path).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        lock(&self.values).clone()
    }

    pub fn marked_for_validation(&self, path: &str) -> bool {
        lock(&self.marked).get(path).copied().unwrap_or(false)
    }

    /// Every batch passed to `validate_fields`, in call order
    pub fn validation_calls(&self) -> Vec<Vec<String>> {
        lock(&self.validations).clone()
    }
}

impl FormStore for InMemoryFormStore {
    fn set_field_value(&self, path: &str, value: &str, options: SetValueOptions) {
        lock(&self.values).insert(path.to_string(), value.to_string());
        lock(&self.marked).insert(path.to_string(), options.should_validate);
    }

    fn validate_fields(&self, paths: &[String]) {
        lock(&self.validations).push(paths.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_widget_routes_events_by_name() {
        let widget = ScriptedWidget::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = widget.add_listener(
            "place_changed",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        widget.emit("place_changed", None, None);
        widget.emit("something_else", None, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        widget.remove_listener(id);
        widget.emit("place_changed", None, None);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(widget.listener_count(), 0);
    }

    #[test]
    fn test_form_ignores_unknown_fields() {
        let form = InMemoryForm::default().with_input("city");
        form.set_value("nope", "x");
        form.set_value("city", "Paris");
        assert_eq!(form.value("city").as_deref(), Some("Paris"));
        assert!(form.value("nope").is_none());
    }

    #[tokio::test]
    async fn test_failing_service() {
        let service = InMemoryPlacesService::default().failing();
        assert!(service.text_search("x").await.is_err());
        assert!(service.place_details("x").await.is_err());
        assert_eq!(service.search_calls(), 1);
    }
}
