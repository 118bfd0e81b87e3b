//! Turns whatever selection evidence is available into a [`NormalizedAddress`].
//!
//! Local evidence is tried first (structured components, a matching
//! prediction, a formatted string, a display name). Only when none of it is
//! usable does the resolver query the places service. Resolution never fails:
//! the worst outcome is the raw input text as `line_1`.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::app::ports::PlacesService;
use crate::error::{AddressError, Result};
use crate::observability::metrics;
use crate::parser::{finalize, parse_components, parse_formatted_address, raw_input_address};
use crate::types::{NormalizedAddress, PlaceData, SelectionEvidence};

/// How many leading characters of the input a prediction must contain to count as a match
const PREDICTION_MATCH_PREFIX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPath {
    Components,
    Prediction,
    Formatted,
    DisplayName,
    RemoteSearch,
    RemoteDetails,
    RemoteFormatted,
    RawInput,
    Empty,
}

impl ResolutionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::Components => "components",
            ResolutionPath::Prediction => "prediction",
            ResolutionPath::Formatted => "formatted",
            ResolutionPath::DisplayName => "display_name",
            ResolutionPath::RemoteSearch => "remote_search",
            ResolutionPath::RemoteDetails => "remote_details",
            ResolutionPath::RemoteFormatted => "remote_formatted",
            ResolutionPath::RawInput => "raw_input",
            ResolutionPath::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub address: NormalizedAddress,
    pub path: ResolutionPath,
}

impl Resolution {
    fn new(address: NormalizedAddress, path: ResolutionPath) -> Self {
        Self { address, path }
    }
}

#[derive(Clone, Default)]
pub struct AddressResolver {
    places: Option<Arc<dyn PlacesService>>,
}

impl AddressResolver {
    pub fn new(places: Arc<dyn PlacesService>) -> Self {
        Self {
            places: Some(places),
        }
    }

    /// A resolver with no remote fallback; unresolvable input is parsed as a formatted string
    pub fn offline() -> Self {
        Self { places: None }
    }

    pub async fn resolve(&self, evidence: &SelectionEvidence) -> NormalizedAddress {
        self.resolve_traced(evidence).await.address
    }

    /// Resolve and report which path produced the address
    #[instrument(skip(self, evidence), fields(input = %evidence.input_value))]
    pub async fn resolve_traced(&self, evidence: &SelectionEvidence) -> Resolution {
        let resolution = match Self::resolve_local(evidence) {
            Some(resolution) => resolution,
            None => self.resolve_remote(&evidence.input_value).await,
        };
        debug!(path = resolution.path.as_str(), address = ?resolution.address, "address resolved");
        metrics::resolver::resolved(resolution.path.as_str());
        resolution
    }

    /// Resolution from evidence alone, without touching the network
    pub fn resolve_local(evidence: &SelectionEvidence) -> Option<Resolution> {
        let place = evidence.place.as_ref();

        if let Some(place) = place.filter(|p| p.has_components()) {
            return Some(Resolution::new(
                parse_components(&place.address_components, place.formatted()),
                ResolutionPath::Components,
            ));
        }
        if let Some(prediction) = matching_prediction(evidence) {
            return Some(Resolution::new(
                parse_components(&prediction.address_components, prediction.formatted()),
                ResolutionPath::Prediction,
            ));
        }
        if let Some(formatted) = place.and_then(PlaceData::formatted) {
            return Some(Resolution::new(
                parse_formatted_address(formatted),
                ResolutionPath::Formatted,
            ));
        }
        if let Some(name) = place.and_then(PlaceData::display) {
            return Some(Resolution::new(
                raw_input_address(name),
                ResolutionPath::DisplayName,
            ));
        }
        None
    }

    async fn resolve_remote(&self, input: &str) -> Resolution {
        let input = input.trim();
        if input.is_empty() {
            return Resolution::new(finalize(NormalizedAddress::default()), ResolutionPath::Empty);
        }

        let Some(places) = self.places.as_ref() else {
            return Resolution::new(parse_formatted_address(input), ResolutionPath::Formatted);
        };

        match search(places.as_ref(), input).await {
            Ok(Some(resolution)) => resolution,
            Ok(None) => {
                let failure = AddressError::ResolutionFailure {
                    input: input.to_string(),
                };
                debug!(%failure, "places search returned nothing usable");
                Resolution::new(raw_input_address(input), ResolutionPath::RawInput)
            }
            Err(e) => {
                warn!(error = %e, "places search failed; keeping raw input");
                metrics::resolver::remote_error();
                Resolution::new(raw_input_address(input), ResolutionPath::RawInput)
            }
        }
    }
}

fn matching_prediction(evidence: &SelectionEvidence) -> Option<&PlaceData> {
    let input = evidence.input_value.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let needle: String = input.chars().take(PREDICTION_MATCH_PREFIX).collect();

    evidence.predictions.iter().find_map(|prediction| {
        let place = prediction.place.as_ref().filter(|p| p.has_components())?;
        let text_matches = prediction.text.to_lowercase().contains(&needle)
            || place
                .formatted()
                .map(|f| f.to_lowercase().contains(&needle))
                .unwrap_or(false);
        text_matches.then_some(place)
    })
}

async fn search(places: &dyn PlacesService, input: &str) -> Result<Option<Resolution>> {
    let results = places.text_search(input).await?;
    let Some(first) = results.into_iter().next() else {
        return Ok(None);
    };

    if first.has_components() {
        return Ok(Some(Resolution::new(
            parse_components(&first.address_components, first.formatted()),
            ResolutionPath::RemoteSearch,
        )));
    }

    if let Some(place_id) = first.place_id.as_deref().filter(|id| !id.trim().is_empty()) {
        match places.place_details(place_id).await {
            Ok(details) if details.has_components() => {
                let formatted = details.formatted().or(first.formatted());
                return Ok(Some(Resolution::new(
                    parse_components(&details.address_components, formatted),
                    ResolutionPath::RemoteDetails,
                )));
            }
            Ok(_) => debug!(place_id, "place details carried no components"),
            Err(e) => warn!(place_id, error = %e, "place details lookup failed"),
        }
        let formatted = first.formatted().unwrap_or(input);
        return Ok(Some(Resolution::new(
            parse_formatted_address(formatted),
            ResolutionPath::RemoteFormatted,
        )));
    }

    Ok(first.formatted().map(|formatted| {
        Resolution::new(
            parse_formatted_address(formatted),
            ResolutionPath::RemoteFormatted,
        )
    }))
}
