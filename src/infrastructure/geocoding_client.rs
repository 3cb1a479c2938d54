use crate::domain::models::Coordinates;
use crate::infrastructure::error::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use url::Url;

const SEARCH_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
const REVERSE_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";
const CLIENT_USER_AGENT: &str = "Minaret Prayer Times/1.0 (prayer schedule engine)";
const RESULT_LIMIT: &str = "20";

// Nominatim serves lat/lon sometimes as numbers, sometimes as numeric
// strings. Decode tries the numeric form first, then a string parsed as a
// number, and rejects anything else.
fn flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(raw) => raw.trim().parse::<f64>().map_err(|_| {
            serde::de::Error::custom(format!(
                "expected a number or a numeric string, got {raw:?}"
            ))
        }),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl NominatimAddress {
    pub fn locality(&self) -> Option<&str> {
        [&self.city, &self.town, &self.village, &self.county, &self.state]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NominatimPlace {
    #[serde(deserialize_with = "flexible_f64")]
    pub lat: f64,
    #[serde(deserialize_with = "flexible_f64")]
    pub lon: f64,
    pub display_name: String,
    #[serde(default)]
    pub address: NominatimAddress,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: NominatimAddress,
}

#[async_trait]
pub trait GeocodingClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<NominatimPlace>, SearchError>;

    async fn reverse(&self, coordinates: Coordinates) -> Result<Option<String>, SearchError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestNominatimClient {
    client: Client,
}

impl ReqwestNominatimClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn search_url(query: &str) -> Result<Url, SearchError> {
        Url::parse_with_params(
            SEARCH_ENDPOINT,
            &[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("accept-language", "en"),
                ("limit", RESULT_LIMIT),
            ],
        )
        .map_err(|error| SearchError::Http(format!("invalid search url: {error}")))
    }

    fn reverse_url(coordinates: Coordinates) -> Result<Url, SearchError> {
        Url::parse_with_params(
            REVERSE_ENDPOINT,
            &[
                ("lat", coordinates.latitude.to_string().as_str()),
                ("lon", coordinates.longitude.to_string().as_str()),
                ("format", "json"),
                ("accept-language", "en"),
            ],
        )
        .map_err(|error| SearchError::Http(format!("invalid reverse url: {error}")))
    }

    async fn fetch_body(&self, url: Url, context: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .map_err(|error| {
                SearchError::Http(format!("network error while {context}: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            SearchError::Http(format!("failed reading response while {context}: {error}"))
        })?;

        if !status.is_success() {
            return Err(SearchError::Http(format!(
                "geocoder error while {context}: http {}",
                status.as_u16()
            )));
        }
        Ok(body)
    }
}

#[async_trait]
impl GeocodingClient for ReqwestNominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<NominatimPlace>, SearchError> {
        let url = Self::search_url(query)?;
        let body = self.fetch_body(url, "searching places").await?;
        serde_json::from_str(&body)
            .map_err(|error| SearchError::Decode(format!("invalid search payload: {error}")))
    }

    async fn reverse(&self, coordinates: Coordinates) -> Result<Option<String>, SearchError> {
        let url = Self::reverse_url(coordinates)?;
        let body = self.fetch_body(url, "reverse geocoding").await?;
        let parsed: ReverseResponse = serde_json::from_str(&body)
            .map_err(|error| SearchError::Decode(format!("invalid reverse payload: {error}")))?;
        Ok(parsed.address.locality().map(ToOwned::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_decodes_numeric_coordinates() {
        let raw = r#"{
            "lat": 21.4225,
            "lon": 39.8262,
            "display_name": "Makkah, Makkah Province, Saudi Arabia",
            "address": {"city": "Makkah", "country": "Saudi Arabia"}
        }"#;
        let place: NominatimPlace = serde_json::from_str(raw).expect("decode place");
        assert_eq!(place.lat, 21.4225);
        assert_eq!(place.address.locality(), Some("Makkah"));
    }

    #[test]
    fn place_decodes_string_coordinates() {
        let raw = r#"{
            "lat": "51.5074",
            "lon": "-0.1278",
            "display_name": "London, Greater London, England, United Kingdom",
            "address": {"city": "London", "country": "United Kingdom"}
        }"#;
        let place: NominatimPlace = serde_json::from_str(raw).expect("decode place");
        assert_eq!(place.lat, 51.5074);
        assert_eq!(place.lon, -0.1278);
    }

    #[test]
    fn place_rejects_non_numeric_coordinate_strings() {
        let raw = r#"{
            "lat": "north-ish",
            "lon": "-0.1278",
            "display_name": "Nowhere",
            "address": {"country": "Nowhere Land"}
        }"#;
        let result: Result<NominatimPlace, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn place_tolerates_missing_address_object() {
        let raw = r#"{
            "lat": "35.6762",
            "lon": "139.6503",
            "display_name": "Tokyo, Japan"
        }"#;
        let place: NominatimPlace = serde_json::from_str(raw).expect("decode place");
        assert_eq!(place.address.country, None);
        assert_eq!(place.address.locality(), None);
    }

    #[test]
    fn locality_prefers_city_then_falls_through() {
        let address = NominatimAddress {
            city: None,
            town: Some("  ".to_string()),
            village: Some("Smallville".to_string()),
            county: Some("Some County".to_string()),
            state: None,
            country: Some("Somewhere".to_string()),
        };
        assert_eq!(address.locality(), Some("Smallville"));
    }

    #[test]
    fn reverse_payload_yields_locality() {
        let raw = r#"{
            "lat": "52.52",
            "lon": "13.405",
            "display_name": "Berlin, Germany",
            "address": {"city": "Berlin", "state": "Berlin", "country": "Germany"}
        }"#;
        let parsed: ReverseResponse = serde_json::from_str(raw).expect("decode reverse");
        assert_eq!(parsed.address.locality(), Some("Berlin"));
    }

    #[test]
    fn search_url_carries_required_parameters() {
        let url = ReqwestNominatimClient::search_url("mecca").expect("valid url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert!(pairs.contains(&("q".to_string(), "mecca".to_string())));
        assert!(pairs.contains(&("format".to_string(), "json".to_string())));
        assert!(pairs.contains(&("addressdetails".to_string(), "1".to_string())));
        assert!(pairs.contains(&("accept-language".to_string(), "en".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "20".to_string())));
    }
}
