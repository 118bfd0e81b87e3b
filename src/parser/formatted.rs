use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::finalize;
use crate::countries;
use crate::types::NormalizedAddress;

// "IL 62704", "IL, 62704", "IL 62704-1234"
static REGION_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z]{2})\s*,?\s*(\d{5}(?:-?\d{4})?)$").expect("valid region/postcode regex")
});

static REGION_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid region regex"));

static POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{5}(?:-?\d{4})?)\b").expect("valid postcode regex"));

fn find_postcode<'a>(parts: &[&'a str]) -> Option<&'a str> {
    parts.iter().find_map(|part| {
        POSTCODE
            .captures(part)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}

fn country_from_part(part: &str) -> Option<&'static str> {
    match part.trim().to_ascii_uppercase().as_str() {
        "USA" | "US" => Some("US"),
        _ => countries::lookup(part).map(|c| c.code),
    }
}

/// Heuristic parse of a single `street, city, region postcode, country` string.
pub fn parse_formatted_address(formatted: &str) -> NormalizedAddress {
    let parts: Vec<&str> = formatted.split(',').map(str::trim).collect();
    debug!(?parts, "parsing formatted address");

    let mut address = NormalizedAddress {
        line_1: parts.first().copied().unwrap_or_default().to_string(),
        city: parts.get(1).copied().unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(region_part) = parts.get(2).copied() {
        if let Some(caps) = REGION_POSTCODE.captures(region_part) {
            address.region = caps[1].to_string();
            address.postcode = caps[2].to_string();
        } else {
            if !REGION_ONLY.is_match(region_part) {
                debug!(region_part, "region part not a two-letter code, keeping verbatim");
            }
            address.region = region_part.to_string();
            if let Some(postcode) = find_postcode(&parts[3..]) {
                address.postcode = postcode.to_string();
            }
        }
    }

    if let Some(country_part) = parts.get(3).copied() {
        if let Some(code) = country_from_part(country_part) {
            address.country = code.to_string();
        }
    }

    finalize(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_COUNTRY_CODE;

    #[test]
    fn test_us_address_with_region_and_zip() {
        let address = parse_formatted_address("123 Main St, Springfield, IL 62704, USA");
        assert_eq!(address.line_1, "123 Main St");
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.region, "IL");
        assert_eq!(address.postcode, "62704");
        assert_eq!(address.country, "US");
        assert_eq!(address.line_2, "");
    }

    #[test]
    fn test_zip_plus_four() {
        let address = parse_formatted_address("1 Main St, Boston, MA 02108-1234, USA");
        assert_eq!(address.postcode, "02108-1234");
        let address = parse_formatted_address("1 Main St, Boston, MA 021081234, USA");
        assert_eq!(address.postcode, "021081234");
    }

    #[test]
    fn test_postcode_found_in_later_part() {
        let address = parse_formatted_address("123 Main St, Springfield, IL, 62704");
        assert_eq!(address.region, "IL");
        assert_eq!(address.postcode, "62704");
        assert_eq!(address.country, DEFAULT_COUNTRY_CODE);

        let address = parse_formatted_address("9 Elm Rd, Springfield, Illinois, 62704, USA");
        assert_eq!(address.region, "Illinois");
        assert_eq!(address.postcode, "62704");
    }

    #[test]
    fn test_unrecognized_region_is_verbatim() {
        let address = parse_formatted_address("10 Downing St, London, Greater London, United Kingdom");
        assert_eq!(address.region, "Greater London");
        assert_eq!(address.postcode, "");
        assert_eq!(address.country, "GB");
    }

    #[test]
    fn test_country_by_name() {
        let address = parse_formatted_address("1 Rue X, Paris, IDF, France");
        assert_eq!(address.country, "FR");
    }

    #[test]
    fn test_unknown_country_keeps_default() {
        let address = parse_formatted_address("1 Road, Town, ST 12345, Narnia");
        assert_eq!(address.country, DEFAULT_COUNTRY_CODE);
    }

    #[test]
    fn test_short_inputs() {
        let address = parse_formatted_address("42 Wallaby Way");
        assert_eq!(address.line_1, "42 Wallaby Way");
        assert_eq!(address.city, "");
        assert_eq!(address.region, "");

        let address = parse_formatted_address("");
        assert_eq!(address.line_1, "");
        assert_eq!(address.country, DEFAULT_COUNTRY_CODE);
    }

    #[test]
    fn test_country_alias_in_last_part() {
        let address = parse_formatted_address("10 Downing St, London, SW1A 2AA, UK");
        assert_eq!(address.region, "SW1A 2AA");
        assert_eq!(address.country, "GB");
    }
}
