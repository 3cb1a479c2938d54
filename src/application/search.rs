use crate::domain::models::{CUSTOM_COORDINATE_NAME, Coordinates, SearchResult};
use crate::infrastructure::geocoding_client::{GeocodingClient, NominatimPlace};
use crate::infrastructure::logging::{EventSink, NullSink};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

const DEBOUNCE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub results: Vec<SearchResult>,
    pub searching: bool,
}

// "21.4225, 39.8262" commits directly as a synthetic result; anything that is
// not exactly two in-range numbers falls through to the geocoder.
pub fn parse_coordinate_query(query: &str) -> Option<SearchResult> {
    let cleaned: String = query.chars().filter(|c| !c.is_whitespace()).collect();
    let mut tokens = cleaned.split(',');
    let latitude = tokens.next()?.parse::<f64>().ok()?;
    let longitude = tokens.next()?.parse::<f64>().ok()?;
    if tokens.next().is_some() {
        return None;
    }

    let coordinates = Coordinates::new(latitude, longitude);
    coordinates.validate().ok()?;
    Some(SearchResult {
        name: CUSTOM_COORDINATE_NAME.to_string(),
        country: format!("{latitude:.4}, {longitude:.4}"),
        coordinates,
    })
}

pub fn collate_places(places: Vec<NominatimPlace>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for place in places {
        let Some(country) = place
            .address
            .country
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
        else {
            continue;
        };

        let name = place
            .address
            .locality()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| {
                place
                    .display_name
                    .split(',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            });

        let result = SearchResult {
            name,
            country,
            coordinates: Coordinates::new(place.lat, place.lon),
        };
        if seen.insert(result.identity()) {
            results.push(result);
        }
    }

    results.sort_by(|a, b| a.name.cmp(&b.name));
    results
}

// One pending query at a time: a newer submission bumps the generation and any
// older in-flight lookup discards its result at the next checkpoint.
pub struct GeocodeSearchPipeline<C>
where
    C: GeocodingClient + 'static,
{
    client: Arc<C>,
    state: Arc<watch::Sender<SearchState>>,
    generation: Arc<AtomicU64>,
    event_sink: Arc<dyn EventSink>,
    debounce: Duration,
}

impl<C> GeocodeSearchPipeline<C>
where
    C: GeocodingClient + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Arc::new(watch::Sender::new(SearchState::default())),
            generation: Arc::new(AtomicU64::new(0)),
            event_sink: Arc::new(NullSink),
            debounce: DEBOUNCE,
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    pub fn submit(&self, query: &str) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.state.send_replace(SearchState::default());
            return;
        }
        if let Some(result) = parse_coordinate_query(trimmed) {
            self.state.send_replace(SearchState {
                results: vec![result],
                searching: false,
            });
            return;
        }

        self.state.send_modify(|state| state.searching = true);

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let counter = Arc::clone(&self.generation);
        let event_sink = Arc::clone(&self.event_sink);
        let debounce = self.debounce;
        let query = trimmed.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if counter.load(Ordering::SeqCst) != generation {
                return;
            }

            let places = match client.search(&query).await {
                Ok(places) => places,
                Err(error) => {
                    // Transport and decode failures degrade to "no results".
                    event_sink.error("search", &error.to_string());
                    Vec::new()
                }
            };
            if counter.load(Ordering::SeqCst) != generation {
                return;
            }

            state.send_replace(SearchState {
                results: collate_places(places),
                searching: false,
            });
        });
    }
}
