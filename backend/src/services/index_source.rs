//! Index source selection and acquisition
//!
//! A run asks one source for its base index record. Provider failures never abort the run:
//! they fall back to the simulated source and leave a notice on the report.

use std::time::Duration;

use shared::{
    simulate_index_record, CropProfile, DateRange, IndexSourceKind, IndexSourceRecord, NoiseSource,
    Parcel, VegetationIndex,
};

use crate::external::{Collection, IndexQuery, ProviderError, SentinelHubClient};

/// The closed set of index sources
#[derive(Clone)]
pub enum IndexSource {
    Sentinel2(SentinelHubClient),
    Landsat(SentinelHubClient),
    Simulated,
}

/// Record of the acquisition stage
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub record: IndexSourceRecord,
    pub notice: Option<String>,
}

impl IndexSource {
    /// Source for a requested kind. Missing credentials select `Simulated`, with a notice.
    pub fn select(requested: IndexSourceKind, client: &SentinelHubClient) -> (Self, Option<String>) {
        let provider = match requested {
            IndexSourceKind::Simulated => return (IndexSource::Simulated, None),
            IndexSourceKind::Sentinel2 => IndexSource::Sentinel2(client.clone()),
            IndexSourceKind::Landsat => IndexSource::Landsat(client.clone()),
        };
        if client.has_credentials() {
            (provider, None)
        } else {
            tracing::warn!("{} requested without Sentinel Hub credentials; using simulated data", requested);
            (
                IndexSource::Simulated,
                Some(format!(
                    "{} credentials are not configured; simulated data was used instead",
                    requested
                )),
            )
        }
    }

    pub fn kind(&self) -> IndexSourceKind {
        match self {
            IndexSource::Sentinel2(_) => IndexSourceKind::Sentinel2,
            IndexSource::Landsat(_) => IndexSourceKind::Landsat,
            IndexSource::Simulated => IndexSourceKind::Simulated,
        }
    }

    /// Fetch the base index record for a parcel.
    ///
    /// Provider variants are bounded by `timeout`; the simulated variant always succeeds.
    pub async fn fetch(
        &self,
        parcel: &Parcel,
        crop: &CropProfile,
        date_range: &DateRange,
        index: VegetationIndex,
        timeout: Duration,
        noise: &mut impl NoiseSource,
    ) -> Result<IndexSourceRecord, ProviderError> {
        let (client, collection) = match self {
            IndexSource::Sentinel2(client) => (client, Collection::Sentinel2L2a),
            IndexSource::Landsat(client) => (client, Collection::LandsatOtL2),
            IndexSource::Simulated => {
                return Ok(simulate_index_record(parcel, crop, index, date_range, noise));
            }
        };

        let bounds = parcel.bounds().ok_or(ProviderError::NoData)?;
        let query = IndexQuery {
            bounds,
            crs: parcel.crs,
            date_range: *date_range,
            index,
            max_cloud_cover_percent: crop.imagery.max_cloud_cover_percent,
        };
        tokio::time::timeout(timeout, client.fetch_index(collection, &query))
            .await
            .map_err(|_| ProviderError::Timeout(timeout.as_secs()))?
    }

    /// Fetch, falling back to the simulated source on any provider error
    pub async fn acquire(
        &self,
        parcel: &Parcel,
        crop: &CropProfile,
        date_range: &DateRange,
        index: VegetationIndex,
        timeout: Duration,
        noise: &mut impl NoiseSource,
    ) -> Acquisition {
        match self
            .fetch(parcel, crop, date_range, index, timeout, noise)
            .await
        {
            Ok(record) => Acquisition { record, notice: None },
            Err(err) => {
                tracing::warn!("{} unavailable, falling back to simulated data: {}", self.kind(), err);
                Acquisition {
                    record: simulate_index_record(parcel, crop, index, date_range, noise),
                    notice: Some(format!(
                        "{} unavailable ({}); simulated data was used instead",
                        self.kind(),
                        err
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use chrono::NaiveDate;
    use geo::polygon;
    use shared::{Crop, Crs, NoNoise};

    fn client(credentials: Option<Credentials>) -> SentinelHubClient {
        SentinelHubClient::with_base_url(
            credentials,
            "http://127.0.0.1:9".to_string(),
            "http://127.0.0.1:9/token".to_string(),
        )
    }

    fn credentials() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    fn parcel() -> Parcel {
        Parcel::new(
            Crs::Projected { epsg: 32720 },
            vec![polygon![(x: 0.0, y: 0.0), (x: 1000.0, y: 0.0), (x: 1000.0, y: 1000.0), (x: 0.0, y: 1000.0)]],
        )
    }

    fn date_range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        )
    }

    #[test]
    fn test_select_without_credentials_is_simulated() {
        let (source, notice) = IndexSource::select(IndexSourceKind::Sentinel2, &client(None));
        assert_eq!(source.kind(), IndexSourceKind::Simulated);
        assert!(notice.is_some());
    }

    #[test]
    fn test_select_with_credentials() {
        let (source, notice) = IndexSource::select(IndexSourceKind::Landsat, &client(Some(credentials())));
        assert_eq!(source.kind(), IndexSourceKind::Landsat);
        assert!(notice.is_none());

        let (source, notice) = IndexSource::select(IndexSourceKind::Simulated, &client(Some(credentials())));
        assert_eq!(source.kind(), IndexSourceKind::Simulated);
        assert!(notice.is_none());
    }

    #[tokio::test]
    async fn test_simulated_fetch_uses_crop_optimum() {
        let crop = Crop::Wheat.profile();
        let record = IndexSource::Simulated
            .fetch(&parcel(), crop, &date_range(), VegetationIndex::Ndvi, Duration::from_secs(1), &mut NoNoise)
            .await
            .unwrap();
        assert_eq!(record.source, IndexSourceKind::Simulated);
        assert!((record.base_value - crop.optimal_ndvi * 0.9).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unreachable_provider_falls_back() {
        let crop = Crop::Maize.profile();
        let source = IndexSource::Sentinel2(client(Some(credentials())));
        let acquisition = source
            .acquire(&parcel(), crop, &date_range(), VegetationIndex::Ndvi, Duration::from_secs(5), &mut NoNoise)
            .await;
        assert_eq!(acquisition.record.source, IndexSourceKind::Simulated);
        assert!(acquisition.notice.unwrap().contains("Sentinel-2"));
    }

    #[tokio::test]
    async fn test_landsat_red_edge_falls_back() {
        let crop = Crop::Soybean.profile();
        let source = IndexSource::Landsat(client(Some(credentials())));
        let acquisition = source
            .acquire(&parcel(), crop, &date_range(), VegetationIndex::Ndre, Duration::from_secs(5), &mut NoNoise)
            .await;
        assert_eq!(acquisition.record.source, IndexSourceKind::Simulated);
        assert_eq!(acquisition.record.index, VegetationIndex::Ndre);
        assert!(acquisition.notice.unwrap().contains("red-edge"));
    }
}
