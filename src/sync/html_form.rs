use std::sync::Arc;
use tracing::{debug, instrument, trace};

use super::AddressSink;
use crate::app::ports::{FieldKind, FormEvent, HtmlForm};
use crate::error::AddressError;
use crate::observability::metrics;
use crate::types::NormalizedAddress;

const SINK: &str = "html_form";

/// Writes into sibling fields of a plain form, located by `name`.
pub struct HtmlFormSink {
    form: Arc<dyn HtmlForm>,
    bound_field: String,
}

impl HtmlFormSink {
    /// `bound_field` is the hidden input submitted on behalf of the widget
    pub fn new(form: Arc<dyn HtmlForm>, bound_field: impl Into<String>) -> Self {
        Self {
            form,
            bound_field: bound_field.into(),
        }
    }

    fn write_field(&self, name: &str, value: &str) {
        match self.form.field_kind(name) {
            Some(FieldKind::Input) => {
                self.form.set_value(name, value);
                self.form.dispatch(name, FormEvent::Input);
                trace!(field = name, value, "input written");
                metrics::sync::field_written(SINK);
            }
            Some(FieldKind::Select { options }) => {
                if options.iter().any(|option| option == value) {
                    self.form.set_value(name, value);
                    self.form.dispatch(name, FormEvent::Change);
                    trace!(field = name, value, "select written");
                    metrics::sync::field_written(SINK);
                } else {
                    debug!(field = name, value, "no matching option; keeping previous value");
                    metrics::sync::field_skipped(SINK);
                }
            }
            None => {
                let skip = AddressError::SynchronizationSkip(name.to_string());
                trace!(%skip, "field not in form");
                metrics::sync::field_skipped(SINK);
            }
        }
    }
}

impl AddressSink for HtmlFormSink {
    fn name(&self) -> &'static str {
        SINK
    }

    #[instrument(skip_all, fields(bound_field = %self.bound_field))]
    fn synchronize(&self, address: &NormalizedAddress) {
        if self.form.field_kind(&self.bound_field).is_some() {
            self.form.set_value(&self.bound_field, &address.line_1);
        }

        let fields = [
            ("line_1", address.line_1.as_str()),
            ("line_2", address.line_2.as_str()),
            ("city", address.city.as_str()),
            ("region", address.region.as_str()),
            // Some forms name the region field county
            ("county", address.region.as_str()),
            ("country", address.country.as_str()),
            ("postcode", address.postcode.as_str()),
        ];
        for (name, value) in fields {
            self.write_field(name, value);
        }
        debug!(line_1 = %address.line_1, "address synchronized into form");
    }
}
