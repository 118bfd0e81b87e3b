use serde::{Deserialize, Serialize};

/// The resolved six-field address handed to form synchronizers.
///
/// Every field is always a defined string; `country` is always a code from the
/// canonical country table once it has passed through the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub line_1: String,
    pub line_2: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postcode: String,
}

impl NormalizedAddress {
    /// Field name / value pairs in synchronization order
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("line_1", self.line_1.as_str()),
            ("line_2", self.line_2.as_str()),
            ("city", self.city.as_str()),
            ("region", self.region.as_str()),
            ("country", self.country.as_str()),
            ("postcode", self.postcode.as_str()),
        ]
    }
}

/// One typed component of a structured address, in either the legacy
/// (`long_name`) or the newer (`longText`) wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default, alias = "longText")]
    pub long_name: String,
    #[serde(default, alias = "shortText")]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(long_name: &str, short_name: &str, types: &[&str]) -> Self {
        Self {
            long_name: long_name.to_string(),
            short_name: short_name.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}

/// Whatever place data the widget or the places service handed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceData {
    #[serde(default, alias = "addressComponents")]
    pub address_components: Vec<AddressComponent>,
    #[serde(default, alias = "formattedAddress")]
    pub formatted_address: Option<String>,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    #[serde(default, alias = "id")]
    pub place_id: Option<String>,
}

impl PlaceData {
    pub fn has_components(&self) -> bool {
        !self.address_components.is_empty()
    }

    pub fn formatted(&self) -> Option<&str> {
        non_blank(self.formatted_address.as_deref())
    }

    pub fn display(&self) -> Option<&str> {
        non_blank(self.display_name.as_deref())
    }

    /// True when this place carries anything the resolver can turn into an address
    pub fn is_usable(&self) -> bool {
        self.has_components() || self.formatted().is_some() || self.display().is_some()
    }
}

/// An entry of the widget's suggestion dropdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub text: String,
    #[serde(default)]
    pub place: Option<PlaceData>,
}

/// A snapshot of the widget state taken when a selection is suspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionEvidence {
    pub predictions: Vec<Prediction>,
    pub place: Option<PlaceData>,
    pub input_value: String,
}

impl SelectionEvidence {
    pub fn from_input(input_value: impl Into<String>) -> Self {
        Self {
            input_value: input_value.into(),
            ..Default::default()
        }
    }

    pub fn from_place(place: PlaceData) -> Self {
        Self {
            place: Some(place),
            ..Default::default()
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
