use tracing::debug;

use super::{finalize, first_segment};
use crate::types::{AddressComponent, NormalizedAddress};

#[derive(Debug, Default)]
struct ComponentFields {
    street_number: String,
    route: String,
    locality: String,
    postal_town: String,
    admin_area_level_1: String,
    admin_area_level_2: String,
    country: String,
    postal_code: String,
}

fn prefer<'a>(first: &'a str, second: &'a str) -> &'a str {
    if first.trim().is_empty() {
        second.trim()
    } else {
        first.trim()
    }
}

impl ComponentFields {
    fn collect(components: &[AddressComponent]) -> Self {
        let mut fields = Self::default();
        for component in components {
            let long = component.long_name.as_str();
            let short = component.short_name.as_str();
            // A component is filed under the first type it matches, in this order
            if component.has_type("street_number") {
                fields.street_number = prefer(long, short).to_string();
            } else if component.has_type("route") {
                fields.route = prefer(long, short).to_string();
            } else if component.has_type("locality") {
                fields.locality = prefer(long, short).to_string();
            } else if component.has_type("postal_town") {
                fields.postal_town = prefer(long, short).to_string();
            } else if component.has_type("administrative_area_level_1") {
                fields.admin_area_level_1 = prefer(short, long).to_string();
            } else if component.has_type("administrative_area_level_2") {
                fields.admin_area_level_2 = prefer(long, short).to_string();
            } else if component.has_type("country") {
                fields.country = prefer(short, long).to_string();
            } else if component.has_type("postal_code") {
                fields.postal_code = prefer(long, short).to_string();
            }
        }
        fields
    }
}

/// Map typed address components onto a normalized address.
///
/// `formatted` is only consulted when street number and route are both absent.
pub fn parse_components(
    components: &[AddressComponent],
    formatted: Option<&str>,
) -> NormalizedAddress {
    let fields = ComponentFields::collect(components);
    debug!(?fields, "collected address components");

    let mut line_1 = [fields.street_number.as_str(), fields.route.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if line_1.is_empty() {
        if let Some(formatted) = formatted {
            line_1 = first_segment(formatted).to_string();
        }
    }

    let city = if fields.locality.is_empty() {
        fields.postal_town
    } else {
        fields.locality
    };

    finalize(NormalizedAddress {
        line_1,
        line_2: String::new(),
        city,
        region: fields.admin_area_level_1,
        country: fields.country,
        postcode: fields.postal_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cupertino() -> Vec<AddressComponent> {
        vec![
            AddressComponent::new("1", "1", &["street_number"]),
            AddressComponent::new("Infinite Loop", "Infinite Loop", &["route"]),
            AddressComponent::new("Cupertino", "Cupertino", &["locality", "political"]),
            AddressComponent::new(
                "Santa Clara County",
                "Santa Clara County",
                &["administrative_area_level_2", "political"],
            ),
            AddressComponent::new(
                "California",
                "CA",
                &["administrative_area_level_1", "political"],
            ),
            AddressComponent::new("United States", "US", &["country", "political"]),
            AddressComponent::new("95014", "95014", &["postal_code"]),
        ]
    }

    #[test]
    fn test_full_component_set() {
        let address = parse_components(&cupertino(), None);
        assert_eq!(
            address,
            NormalizedAddress {
                line_1: "1 Infinite Loop".into(),
                line_2: "".into(),
                city: "Cupertino".into(),
                region: "CA".into(),
                country: "US".into(),
                postcode: "95014".into(),
            }
        );
    }

    #[test]
    fn test_street_number_and_route_are_space_joined() {
        for (number, route) in [("221B", "Baker Street"), ("5", "Rue de Rivoli"), ("10", "A")] {
            let components = vec![
                AddressComponent::new(number, number, &["street_number"]),
                AddressComponent::new(route, route, &["route"]),
            ];
            let address = parse_components(&components, Some("ignored, here"));
            assert_eq!(address.line_1, format!("{} {}", number, route));
        }
    }

    #[test]
    fn test_route_only() {
        let components = vec![AddressComponent::new("Main Street", "Main St", &["route"])];
        assert_eq!(parse_components(&components, None).line_1, "Main Street");
    }

    #[test]
    fn test_line_1_falls_back_to_formatted_first_segment() {
        let components = vec![AddressComponent::new("Cupertino", "Cupertino", &["locality"])];
        let address = parse_components(&components, Some("Apple Park, Cupertino, CA 95014, USA"));
        assert_eq!(address.line_1, "Apple Park");
        assert_eq!(address.city, "Cupertino");
    }

    #[test]
    fn test_long_country_name_is_mapped_to_code() {
        let components = vec![AddressComponent::new("Germany", "", &["country"])];
        assert_eq!(parse_components(&components, None).country, "DE");
    }

    #[test]
    fn test_region_prefers_short_form() {
        let components = vec![AddressComponent::new(
            "Illinois",
            "IL",
            &["administrative_area_level_1"],
        )];
        assert_eq!(parse_components(&components, None).region, "IL");
    }

    #[test]
    fn test_postal_town_used_when_locality_missing() {
        let components = vec![
            AddressComponent::new("London", "London", &["postal_town"]),
            AddressComponent::new("United Kingdom", "GB", &["country"]),
        ];
        let address = parse_components(&components, None);
        assert_eq!(address.city, "London");
        assert_eq!(address.country, "GB");
    }

    #[test]
    fn test_new_wire_shape_deserializes() {
        let json = serde_json::json!([
            {"longText": "1600", "shortText": "1600", "types": ["street_number"]},
            {"longText": "Amphitheatre Parkway", "shortText": "Amphitheatre Pkwy", "types": ["route"]}
        ]);
        let components: Vec<AddressComponent> = serde_json::from_value(json).unwrap();
        assert_eq!(
            parse_components(&components, None).line_1,
            "1600 Amphitheatre Parkway"
        );
    }

    #[test]
    fn test_empty_components_yield_defined_fields() {
        let address = parse_components(&[], None);
        assert_eq!(address.line_1, "");
        assert_eq!(address.country, "US");
    }
}
