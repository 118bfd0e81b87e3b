use std::sync::Arc;
use tracing::{debug, instrument};

use super::AddressSink;
use crate::app::ports::{FormStore, SetValueOptions};
use crate::observability::metrics;
use crate::types::NormalizedAddress;

const SINK: &str = "form_store";

/// Address group prefixing the store paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressGroup {
    Shipping,
    Billing,
    Custom(String),
}

impl AddressGroup {
    pub fn prefix(&self) -> &str {
        match self {
            AddressGroup::Shipping => "shippingAddress",
            AddressGroup::Billing => "billingAddress",
            AddressGroup::Custom(prefix) => prefix,
        }
    }

    fn path(&self, field: &str) -> String {
        format!("{}.{}", self.prefix(), field)
    }
}

/// Writes into a managed form-state store and triggers one validation batch.
pub struct FormStoreSink {
    store: Arc<dyn FormStore>,
    group: AddressGroup,
    bound_field: String,
}

impl FormStoreSink {
    pub fn new(store: Arc<dyn FormStore>, group: AddressGroup, bound_field: impl Into<String>) -> Self {
        Self {
            store,
            group,
            bound_field: bound_field.into(),
        }
    }
}

impl AddressSink for FormStoreSink {
    fn name(&self) -> &'static str {
        SINK
    }

    #[instrument(skip_all, fields(group = self.group.prefix()))]
    fn synchronize(&self, address: &NormalizedAddress) {
        self.store
            .set_field_value(&self.bound_field, &address.line_1, SetValueOptions::default());

        let validate = SetValueOptions {
            should_validate: true,
        };
        let mut batch = vec![self.bound_field.clone()];
        for (field, value) in address.fields() {
            let path = self.group.path(field);
            self.store.set_field_value(&path, value, validate);
            metrics::sync::field_written(SINK);
            if !batch.contains(&path) {
                batch.push(path);
            }
        }

        self.store.validate_fields(&batch);
        debug!(fields = batch.len(), "address written to form store");
    }
}
