use std::time::Duration;

/// Country code used whenever a resolved value cannot be matched to the table
pub const DEFAULT_COUNTRY_CODE: &str = "US";

/// How long to wait after a full-looking input value before re-reading the place
pub const SETTLE_WINDOW: Duration = Duration::from_millis(500);

/// Snapshot polling period for the selection monitor
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Every event name the widget has been seen to emit on selection
pub const PLACE_SELECTED_EVENTS: [&str; 5] = [
    "gmp-placeselect",
    "placeselect",
    "place-select",
    "place_changed",
    "places_changed",
];

/// Emitted by the widget's inner text input when its value is committed
pub const INPUT_CHANGE_EVENT: &str = "change";

// Data fields requested from the widget at construction
pub const REQUESTED_FIELDS: &str =
    "address_components,formatted_address,name,geometry,place_id,plus_code,types,vicinity";
pub const REQUESTED_PLACE_DATA_FIELDS: &str = "address_components,formatted_address,name";
pub const REQUEST_SOURCE: &str = "PLACE_DETAILS";

pub const DEFAULT_PLACEHOLDER: &str = "Start typing your address...";

// Presentation
pub const FIELD_BORDER: &str = "1px solid rgb(209 213 219)";
pub const FIELD_ERROR_BORDER: &str = "1px solid rgb(239 68 68)";

// Web service defaults
pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";
pub const BASE_URL_ENV: &str = "PLACES_BASE_URL";
pub const CONFIG_PATH: &str = "config.toml";
