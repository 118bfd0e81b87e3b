//! Form synchronization sinks.
//!
//! Both sinks overwrite the target fields with the resolved values, so writing
//! the same address twice leaves the form exactly as after the first write.

pub mod form_store;
pub mod html_form;

pub use form_store::{AddressGroup, FormStoreSink};
pub use html_form::HtmlFormSink;

use std::sync::Arc;

use crate::types::NormalizedAddress;
use crate::widget::OnResolved;

/// Writes a resolved address into the form that owns the field.
pub trait AddressSink: Send + Sync {
    fn name(&self) -> &'static str;

    fn synchronize(&self, address: &NormalizedAddress);
}

/// Adapt a sink into the callback handed to the widget adapter
pub fn callback(sink: Arc<dyn AddressSink>) -> OnResolved {
    Arc::new(move |address: NormalizedAddress| sink.synchronize(&address))
}
