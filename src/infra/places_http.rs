use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::app::ports::{
    AutocompleteWidget, PlacesLibrary, PlacesLibraryLoader, PlacesService, WidgetFactory,
};
use crate::config::PlacesConfig;
use crate::constants::REQUESTED_PLACE_DATA_FIELDS;
use crate::error::{AddressError, Result};
use crate::types::PlaceData;

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<PlaceData>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    result: Option<PlaceData>,
    #[serde(default)]
    error_message: Option<String>,
}

fn check_status(status: &str, error_message: Option<String>) -> Result<()> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(AddressError::Api {
            status: other.to_string(),
            message: error_message.unwrap_or_default(),
        }),
    }
}

/// Places web service client (`textsearch/json` and `details/json`)
pub struct HttpPlacesService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: Option<String>,
}

impl HttpPlacesService {
    pub fn new(client: reqwest::Client, config: &PlacesConfig, api_key: &str) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            language: config.language.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn params<'a>(&'a self, extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
        let mut params = extra.to_vec();
        params.push(("key", self.api_key.as_str()));
        if let Some(language) = self.language.as_deref() {
            params.push(("language", language));
        }
        params
    }
}

#[async_trait]
impl PlacesService for HttpPlacesService {
    #[instrument(skip(self))]
    async fn text_search(&self, query: &str) -> Result<Vec<PlaceData>> {
        let response: TextSearchResponse = self
            .client
            .get(self.endpoint("textsearch/json"))
            .query(&self.params(&[("query", query)]))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_status(&response.status, response.error_message)?;
        debug!(results = response.results.len(), "text search complete");
        Ok(response.results)
    }

    #[instrument(skip(self))]
    async fn place_details(&self, place_id: &str) -> Result<PlaceData> {
        let response: DetailsResponse = self
            .client
            .get(self.endpoint("details/json"))
            .query(&self.params(&[
                ("place_id", place_id),
                ("fields", REQUESTED_PLACE_DATA_FIELDS),
            ]))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        check_status(&response.status, response.error_message)?;
        response.result.ok_or_else(|| AddressError::Api {
            status: response.status,
            message: format!("no details returned for {}", place_id),
        })
    }
}

/// Widget factory for service-only use, where no document exists to mount into.
pub struct HeadlessWidgetFactory;

impl WidgetFactory for HeadlessWidgetFactory {
    fn create(&self) -> Result<Arc<dyn AutocompleteWidget>> {
        Err(AddressError::Widget(
            "headless places library has no widget surface".into(),
        ))
    }
}

/// Builds the HTTP client on load; widgets come from the supplied factory.
pub struct HttpPlacesLoader {
    config: PlacesConfig,
    widgets: Arc<dyn WidgetFactory>,
}

impl HttpPlacesLoader {
    pub fn new(config: PlacesConfig, widgets: Arc<dyn WidgetFactory>) -> Self {
        Self { config, widgets }
    }

    /// A loader for the web service alone
    pub fn headless(config: PlacesConfig) -> Self {
        Self::new(config, Arc::new(HeadlessWidgetFactory))
    }
}

#[async_trait]
impl PlacesLibraryLoader for HttpPlacesLoader {
    async fn load(&self, credential: &str) -> Result<PlacesLibrary> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .gzip(true)
            .build()
            .map_err(|e| AddressError::LoadFailure(e.to_string()))?;
        let service = HttpPlacesService::new(client, &self.config, credential);
        Ok(PlacesLibrary {
            service: Arc::new(service),
            widgets: self.widgets.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_search_payload() {
        let payload = r#"{
            "status": "OK",
            "results": [{
                "formatted_address": "1 Infinite Loop, Cupertino, CA 95014, USA",
                "name": "Apple Infinite Loop",
                "place_id": "ChIJHTRqF7e1j4ARzZ_Fv8VA4Eo"
            }]
        }"#;
        let response: TextSearchResponse = serde_json::from_str(payload).unwrap();
        assert!(check_status(&response.status, response.error_message).is_ok());
        let first = &response.results[0];
        assert_eq!(first.place_id.as_deref(), Some("ChIJHTRqF7e1j4ARzZ_Fv8VA4Eo"));
        assert_eq!(first.display_name.as_deref(), Some("Apple Infinite Loop"));
        assert!(!first.has_components());
    }

    #[test]
    fn test_details_payload_with_components() {
        let payload = r#"{
            "status": "OK",
            "result": {
                "address_components": [
                    {"long_name": "1", "short_name": "1", "types": ["street_number"]},
                    {"long_name": "Infinite Loop", "short_name": "Infinite Loop", "types": ["route"]}
                ],
                "formatted_address": "1 Infinite Loop, Cupertino, CA 95014, USA"
            }
        }"#;
        let response: DetailsResponse = serde_json::from_str(payload).unwrap();
        let result = response.result.unwrap();
        assert_eq!(result.address_components.len(), 2);
        assert_eq!(result.address_components[1].long_name, "Infinite Loop");
    }

    #[test]
    fn test_error_status_is_api_error() {
        let payload = r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}"#;
        let response: TextSearchResponse = serde_json::from_str(payload).unwrap();
        let err = check_status(&response.status, response.error_message).unwrap_err();
        match err {
            AddressError::Api { status, message } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_results_is_not_an_error() {
        assert!(check_status("ZERO_RESULTS", None).is_ok());
    }

    #[test]
    fn test_params_include_key_and_language() {
        let config = PlacesConfig {
            language: Some("en".into()),
            base_url: "http://localhost/place/".into(),
            ..Default::default()
        };
        let service = HttpPlacesService::new(reqwest::Client::new(), &config, "secret");
        let params = service.params(&[("query", "x")]);
        assert!(params.contains(&("key", "secret")));
        assert!(params.contains(&("language", "en")));
        assert_eq!(service.endpoint("textsearch/json"), "http://localhost/place/textsearch/json");
    }

    #[tokio::test]
    async fn test_headless_loader_has_service_but_no_widgets() {
        let loader = HttpPlacesLoader::headless(PlacesConfig::default());
        let library = loader.load("secret").await.unwrap();
        assert!(matches!(
            library.widgets.create(),
            Err(AddressError::Widget(_))
        ));
    }
}
