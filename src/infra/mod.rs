pub mod in_memory;
pub mod places_http;
