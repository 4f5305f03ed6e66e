//! Sentinel Hub API client for satellite index statistics
//!
//! Integrates with the Sentinel Hub OAuth, Catalog and Statistical APIs. One client serves
//! both the Sentinel-2 L2A and Landsat 8-9 L2 collections.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{
    BandNames, Bounds, Crs, DateRange, IndexSourceKind, IndexSourceRecord, VegetationIndex,
    ZonalStatistics, METERS_PER_DEGREE,
};
use thiserror::Error;

use crate::config::{Credentials, SentinelHubConfig};

/// Reasons a provider could not deliver an index record
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Sentinel Hub credentials are not configured")]
    MissingCredentials,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode provider response: {0}")]
    Decode(String),

    #[error("No {collection} scenes between {start} and {end}")]
    NoScenes {
        collection: &'static str,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Provider returned no valid pixels for the parcel")]
    NoData,

    #[error("{index} needs a red-edge band, which {collection} does not carry")]
    UnsupportedIndex {
        index: VegetationIndex,
        collection: &'static str,
    },

    #[error("Provider did not answer within {0} seconds")]
    Timeout(u64),
}

/// Imagery collections reachable through Sentinel Hub
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Sentinel2L2a,
    LandsatOtL2,
}

impl Collection {
    pub fn id(&self) -> &'static str {
        match self {
            Collection::Sentinel2L2a => "sentinel-2-l2a",
            Collection::LandsatOtL2 => "landsat-ot-l2",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Collection::Sentinel2L2a => "Sentinel-2 L2A",
            Collection::LandsatOtL2 => "Landsat 8-9 L2",
        }
    }

    pub fn bands(&self) -> BandNames {
        match self {
            Collection::Sentinel2L2a => BandNames {
                green: "B03",
                red: "B04",
                red_edge: Some("B05"),
                nir: "B08",
            },
            Collection::LandsatOtL2 => BandNames {
                green: "B03",
                red: "B04",
                red_edge: None,
                nir: "B05",
            },
        }
    }

    pub fn resolution_m(&self) -> f64 {
        match self {
            Collection::Sentinel2L2a => 10.0,
            Collection::LandsatOtL2 => 30.0,
        }
    }

    pub fn source_kind(&self) -> IndexSourceKind {
        match self {
            Collection::Sentinel2L2a => IndexSourceKind::Sentinel2,
            Collection::LandsatOtL2 => IndexSourceKind::Landsat,
        }
    }

    fn scene_prefix(&self) -> &'static str {
        match self {
            Collection::Sentinel2L2a => "S2",
            Collection::LandsatOtL2 => "LS",
        }
    }
}

/// What to ask a provider for
#[derive(Debug, Clone)]
pub struct IndexQuery {
    pub bounds: Bounds,
    pub crs: Crs,
    pub date_range: DateRange,
    pub index: VegetationIndex,
    pub max_cloud_cover_percent: f64,
}

/// One catalog hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub id: String,
    pub acquired: NaiveDate,
    pub cloud_cover_percent: f64,
}

/// Sentinel Hub API client
#[derive(Clone)]
pub struct SentinelHubClient {
    client: Client,
    credentials: Option<Credentials>,
    base_url: String,
    auth_url: String,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    features: Vec<CatalogFeature>,
}

#[derive(Debug, Deserialize)]
struct CatalogFeature {
    id: String,
    properties: CatalogProperties,
}

#[derive(Debug, Deserialize)]
struct CatalogProperties {
    datetime: DateTime<Utc>,
    #[serde(rename = "eo:cloud_cover", default)]
    cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct StatisticsResponse {
    #[serde(default)]
    data: Vec<StatisticsInterval>,
}

#[derive(Debug, Deserialize)]
struct StatisticsInterval {
    outputs: StatisticsOutputs,
}

#[derive(Debug, Deserialize)]
struct StatisticsOutputs {
    index: StatisticsOutput,
}

#[derive(Debug, Deserialize)]
struct StatisticsOutput {
    bands: StatisticsBands,
}

#[derive(Debug, Deserialize)]
struct StatisticsBands {
    #[serde(rename = "B0")]
    b0: BandStatistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BandStatistics {
    stats: BandStats,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BandStats {
    // Sentinel Hub reports "NaN" as a string for fully masked intervals
    mean: Value,
    #[serde(default)]
    st_dev: Value,
    #[serde(default)]
    min: Value,
    #[serde(default)]
    max: Value,
    #[serde(default)]
    sample_count: usize,
    #[serde(default)]
    no_data_count: usize,
    #[serde(default)]
    percentiles: Option<std::collections::HashMap<String, Value>>,
}

fn number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

impl BandStats {
    fn into_statistics(self) -> Option<ZonalStatistics> {
        let mean = number(&self.mean)?;
        let pixel_count = self.sample_count.saturating_sub(self.no_data_count);
        if pixel_count == 0 {
            return None;
        }
        let median = self
            .percentiles
            .as_ref()
            .and_then(|p| p.get("50.0"))
            .and_then(number)
            .unwrap_or(mean);
        Some(ZonalStatistics {
            mean,
            std_dev: number(&self.st_dev).unwrap_or(0.0),
            min: number(&self.min).unwrap_or(mean),
            max: number(&self.max).unwrap_or(mean),
            median,
            pixel_count,
        })
    }
}

// ============================================================================
// Request bodies
// ============================================================================

fn crs_uri(crs: Crs) -> String {
    format!("http://www.opengis.net/def/crs/EPSG/0/{}", crs.epsg())
}

fn time_bounds(range: &DateRange) -> (String, String) {
    (
        format!("{}T00:00:00Z", range.start.format("%Y-%m-%d")),
        format!("{}T23:59:59Z", range.end.format("%Y-%m-%d")),
    )
}

/// Evalscript computing one index band plus the data mask
pub fn evalscript(index: VegetationIndex, bands: &BandNames) -> Option<String> {
    let expression = index.expression(bands)?;
    let inputs = bands
        .all()
        .iter()
        .chain(std::iter::once(&"dataMask"))
        .map(|b| format!("\"{}\"", b))
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!(
        r#"//VERSION=3
function setup() {{
  return {{
    input: [{{ bands: [{inputs}] }}],
    output: [
      {{ id: "index", bands: 1, sampleType: "FLOAT32" }},
      {{ id: "dataMask", bands: 1 }}
    ]
  }};
}}

function evaluatePixel(sample) {{
  return {{
    index: [{expression}],
    dataMask: [sample.dataMask]
  }};
}}
"#
    ))
}

fn catalog_body(collection: Collection, query: &IndexQuery) -> Value {
    let (from, to) = time_bounds(&query.date_range);
    json!({
        "collections": [collection.id()],
        "bbox": query.bounds.to_array(),
        "bbox-crs": crs_uri(query.crs),
        "datetime": format!("{}/{}", from, to),
        "filter": format!("eo:cloud_cover <= {}", query.max_cloud_cover_percent),
        "filter-lang": "cql2-text",
        "limit": 50,
    })
}

fn statistics_body(collection: Collection, query: &IndexQuery, script: String) -> Value {
    let (from, to) = time_bounds(&query.date_range);
    let days = (query.date_range.end - query.date_range.start).num_days() + 1;
    let resolution = if query.crs.is_geographic() {
        collection.resolution_m() / METERS_PER_DEGREE
    } else {
        collection.resolution_m()
    };
    json!({
        "input": {
            "bounds": {
                "bbox": query.bounds.to_array(),
                "properties": { "crs": crs_uri(query.crs) }
            },
            "data": [{
                "type": collection.id(),
                "dataFilter": {
                    "mosaickingOrder": "leastCC",
                    "maxCloudCoverage": query.max_cloud_cover_percent
                }
            }]
        },
        "aggregation": {
            "timeRange": { "from": from, "to": to },
            "aggregationInterval": { "of": format!("P{}D", days.max(1)) },
            "evalscript": script,
            "resx": resolution,
            "resy": resolution
        },
        "calculations": {
            "default": {
                "statistics": { "default": { "percentiles": { "k": [50] } } }
            }
        }
    })
}

/// Scenes sorted least cloudy first
fn scenes_from(catalog: CatalogResponse) -> Vec<Scene> {
    let mut scenes: Vec<Scene> = catalog
        .features
        .into_iter()
        .map(|f| Scene {
            id: f.id,
            acquired: f.properties.datetime.date_naive(),
            cloud_cover_percent: f.properties.cloud_cover.unwrap_or(100.0),
        })
        .collect();
    scenes.sort_by(|a, b| a.cloud_cover_percent.total_cmp(&b.cloud_cover_percent));
    scenes
}

fn statistics_from(response: StatisticsResponse) -> Option<ZonalStatistics> {
    response
        .data
        .into_iter()
        .find_map(|interval| interval.outputs.index.bands.b0.stats.into_statistics())
}

impl SentinelHubClient {
    /// Create a client from configuration; requests time out after `timeout`
    pub fn new(config: &SentinelHubConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials: config.credentials(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
        })
    }

    /// Create a client against custom endpoints (for testing)
    pub fn with_base_url(credentials: Option<Credentials>, base_url: String, auth_url: String) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url,
            auth_url,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// OAuth2 client-credentials token
    async fn access_token(&self) -> Result<String, ProviderError> {
        let credentials = self.credentials.as_ref().ok_or(ProviderError::MissingCredentials)?;
        let response = self
            .client
            .post(&self.auth_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
            ])
            .send()
            .await?;
        let token: TokenResponse = Self::decode(response).await?;
        Ok(token.access_token)
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Scenes over the query bbox within the cloud-cover limit, least cloudy first
    pub async fn search_scenes(
        &self,
        token: &str,
        collection: Collection,
        query: &IndexQuery,
    ) -> Result<Vec<Scene>, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/v1/catalog/1.0.0/search", self.base_url))
            .bearer_auth(token)
            .json(&catalog_body(collection, query))
            .send()
            .await?;
        let catalog: CatalogResponse = Self::decode(response).await?;
        Ok(scenes_from(catalog))
    }

    /// Index statistics over the query bbox, least-cloud mosaic of the date range
    pub async fn index_statistics(
        &self,
        token: &str,
        collection: Collection,
        query: &IndexQuery,
    ) -> Result<ZonalStatistics, ProviderError> {
        let script = evalscript(query.index, &collection.bands()).ok_or(
            ProviderError::UnsupportedIndex {
                index: query.index,
                collection: collection.id(),
            },
        )?;
        let response = self
            .client
            .post(format!("{}/api/v1/statistics", self.base_url))
            .bearer_auth(token)
            .json(&statistics_body(collection, query, script))
            .send()
            .await?;
        let stats: StatisticsResponse = Self::decode(response).await?;
        statistics_from(stats).ok_or(ProviderError::NoData)
    }

    /// Full provider round trip: token, catalog search, statistics
    pub async fn fetch_index(
        &self,
        collection: Collection,
        query: &IndexQuery,
    ) -> Result<IndexSourceRecord, ProviderError> {
        if query.index.expression(&collection.bands()).is_none() {
            return Err(ProviderError::UnsupportedIndex {
                index: query.index,
                collection: collection.id(),
            });
        }

        let token = self.access_token().await?;
        let scenes = self.search_scenes(&token, collection, query).await?;
        let best = scenes.into_iter().next().ok_or(ProviderError::NoScenes {
            collection: collection.id(),
            start: query.date_range.start,
            end: query.date_range.end,
        })?;
        tracing::debug!(
            "{} scene {} selected ({:.1}% cloud)",
            collection.label(),
            best.id,
            best.cloud_cover_percent
        );

        let statistics = self.index_statistics(&token, collection, query).await?;

        Ok(IndexSourceRecord {
            index: query.index,
            base_value: statistics.mean,
            source: collection.source_kind(),
            source_label: collection.label().to_string(),
            acquisition_date: best.acquired,
            scene_id: Some(format!("{}:{}", collection.scene_prefix(), best.id)),
            cloud_cover_percent: Some(best.cloud_cover_percent),
            resolution_m: collection.resolution_m(),
            statistics: Some(statistics),
        })
    }
}
