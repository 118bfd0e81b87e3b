use std::sync::Arc;
use tracing::info;

use crate::session::{Readiness, WidgetSession};
use crate::sync::{self, AddressSink};
use crate::widget::{OnResolved, WidgetAdapter, WidgetHandle, WidgetOptions};

/// What ended up mounted for an address field
pub enum MountedField {
    Autocomplete(WidgetHandle),
    /// Autocomplete is unavailable; render an ordinary text input with these options
    PlainInput(WidgetOptions),
}

impl MountedField {
    pub fn is_autocomplete(&self) -> bool {
        matches!(self, MountedField::Autocomplete(_))
    }
}

/// Use case wiring the session, widget adapter and a form sink together
pub struct MountUseCase {
    session: Arc<WidgetSession>,
    adapter: WidgetAdapter,
}

impl MountUseCase {
    pub fn new(session: Arc<WidgetSession>) -> Self {
        Self {
            adapter: WidgetAdapter::new(session.clone()),
            session,
        }
    }

    pub fn session(&self) -> &Arc<WidgetSession> {
        &self.session
    }

    pub async fn initialize_session(&self) -> Readiness {
        self.session.initialize().await
    }

    pub fn create_autocomplete_field(
        &self,
        on_resolved: OnResolved,
        options: &WidgetOptions,
    ) -> Option<WidgetHandle> {
        self.adapter.create_instance(on_resolved, options)
    }

    /// Mount an address field synchronizing into `sink`, degrading to a plain input
    pub fn mount_address_field(
        &self,
        sink: Arc<dyn AddressSink>,
        options: WidgetOptions,
    ) -> MountedField {
        let sink_name = sink.name();
        match self.create_autocomplete_field(sync::callback(sink), &options) {
            Some(handle) => {
                info!(sink = sink_name, widget_id = %handle.id(), "address field mounted with autocomplete");
                MountedField::Autocomplete(handle)
            }
            None => {
                info!(sink = sink_name, "address field mounted as plain input");
                MountedField::PlainInput(options)
            }
        }
    }
}
