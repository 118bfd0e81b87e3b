use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{PlaceData, Prediction};

// Places service ports

#[async_trait]
pub trait PlacesService: Send + Sync {
    /// Free-text search; results are in the service's relevance order.
    async fn text_search(&self, query: &str) -> Result<Vec<PlaceData>>;

    async fn place_details(&self, place_id: &str) -> Result<PlaceData>;
}

/// What a successful library load hands back.
#[derive(Clone)]
pub struct PlacesLibrary {
    pub service: Arc<dyn PlacesService>,
    pub widgets: Arc<dyn WidgetFactory>,
}

#[async_trait]
pub trait PlacesLibraryLoader: Send + Sync {
    async fn load(&self, credential: &str) -> Result<PlacesLibrary>;
}

// Widget ports

pub type ListenerId = u64;

/// Payload delivered to widget listeners. Place-selected events carry
/// whatever place shape the widget chose to attach; input events carry the
/// committed text value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetEvent {
    pub name: String,
    pub place: Option<PlaceData>,
    pub value: Option<String>,
}

pub type WidgetListener = Arc<dyn Fn(WidgetEvent) + Send + Sync>;

/// The narrow seam over one mounted autocomplete element.
pub trait AutocompleteWidget: Send + Sync {
    fn predictions(&self) -> Vec<Prediction>;

    fn selected_place(&self) -> Option<PlaceData>;

    fn input_value(&self) -> String;

    fn set_attribute(&self, name: &str, value: &str);

    fn set_style(&self, property: &str, value: &str);

    fn add_listener(&self, event_name: &str, listener: WidgetListener) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);

    /// Remove the element from its document
    fn detach(&self);
}

pub trait WidgetFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn AutocompleteWidget>>;
}

// Form substrate ports

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    Select { options: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Input,
    Change,
}

/// A plain form whose fields are addressed by their `name`.
pub trait HtmlForm: Send + Sync {
    fn field_kind(&self, name: &str) -> Option<FieldKind>;

    fn set_value(&self, name: &str, value: &str);

    fn dispatch(&self, name: &str, event: FormEvent);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetValueOptions {
    pub should_validate: bool,
}

/// A managed form-state store addressed by dotted field paths.
pub trait FormStore: Send + Sync {
    fn set_field_value(&self, path: &str, value: &str, options: SetValueOptions);

    fn validate_fields(&self, paths: &[String]);
}
