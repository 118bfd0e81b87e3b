//! Two-tier address parsing: structured components first, formatted-string
//! heuristics second. Both tiers return a finalized [`NormalizedAddress`].

pub mod components;
pub mod formatted;

pub use components::parse_components;
pub use formatted::parse_formatted_address;

use crate::countries::normalize_country;
use crate::types::NormalizedAddress;

/// Trim every field and coerce the country into the canonical table.
pub fn finalize(mut address: NormalizedAddress) -> NormalizedAddress {
    for field in [
        &mut address.line_1,
        &mut address.line_2,
        &mut address.city,
        &mut address.region,
        &mut address.postcode,
    ] {
        let trimmed = field.trim();
        if trimmed.len() != field.len() {
            *field = trimmed.to_string();
        }
    }
    address.country = normalize_country(&address.country).to_string();
    address
}

/// The first comma-delimited segment of a formatted address
pub fn first_segment(formatted: &str) -> &str {
    formatted.split(',').next().unwrap_or_default().trim()
}

/// The degraded record produced when nothing could be resolved
pub fn raw_input_address(input: &str) -> NormalizedAddress {
    finalize(NormalizedAddress {
        line_1: input.to_string(),
        ..Default::default()
    })
}
