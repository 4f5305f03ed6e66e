//! Analysis pipeline tests
//!
//! Drives `AnalysisService` end to end:
//! - Simulated fertility run on a 100 ha rectangle
//! - Provider fallback without credentials and with an unreachable provider
//! - Recommendation mode, seeded reproducibility, input rejection

use std::sync::Arc;

use chrono::NaiveDate;
use parcel_fertility_backend::config::{AnalysisConfig, Config, Credentials, SentinelHubConfig, ServerConfig};
use parcel_fertility_backend::error::AppError;
use parcel_fertility_backend::external::SentinelHubClient;
use parcel_fertility_backend::models::{AnalysisRequest, AnalysisStage};
use parcel_fertility_backend::services::AnalysisService;
use shared::{
    coefficient_of_variation, AnalysisMode, Crop, Crs, DateRange, IndexSourceKind, Nutrient, ParcelInput,
    PolygonRings, VegetationIndex, DOSE_CEILING_FACTOR, DOSE_FLOOR_FACTOR,
};

// ============================================================================
// Fixtures
// ============================================================================

const UNREACHABLE: &str = "http://127.0.0.1:9";

fn config(seed: Option<u64>) -> Config {
    Config {
        environment: "test".to_string(),
        server: ServerConfig::default(),
        sentinel_hub: SentinelHubConfig {
            base_url: UNREACHABLE.to_string(),
            auth_url: format!("{}/token", UNREACHABLE),
            ..Default::default()
        },
        analysis: AnalysisConfig {
            seed,
            provider_timeout_secs: 5,
            ..Default::default()
        },
    }
}

fn service(seed: Option<u64>, credentials: Option<Credentials>) -> AnalysisService {
    let client = SentinelHubClient::with_base_url(
        credentials,
        UNREACHABLE.to_string(),
        format!("{}/token", UNREACHABLE),
    );
    AnalysisService::new(Arc::new(config(seed)), client)
}

/// 1000 m × 1000 m in UTM, 100 ha
fn hundred_hectares() -> ParcelInput {
    ParcelInput {
        crs: Crs::Projected { epsg: 32720 },
        polygons: vec![PolygonRings {
            exterior: vec![
                [0.0, 0.0],
                [1000.0, 0.0],
                [1000.0, 1000.0],
                [0.0, 1000.0],
                [0.0, 0.0],
            ],
            interiors: vec![],
        }],
    }
}

fn wheat_season() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
    )
}

fn request(mode: AnalysisMode, source: IndexSourceKind) -> AnalysisRequest {
    AnalysisRequest {
        parcel: hundred_hectares(),
        crop: Crop::Wheat,
        mode,
        zone_count: Some(16),
        date_range: wheat_season(),
        source,
        index: VegetationIndex::Ndvi,
    }
}

// ============================================================================
// Fertility runs
// ============================================================================

#[tokio::test]
async fn test_simulated_fertility_run_on_hundred_hectares() {
    let report = service(Some(42), None)
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated))
        .await
        .unwrap();

    assert_eq!(report.stage, AnalysisStage::Ready);
    assert_eq!(report.zones.len(), 16);
    assert!(report.notices.is_empty());
    for (i, zone) in report.zones.iter().enumerate() {
        assert_eq!(zone.id, i as u32 + 1);
        assert!((zone.area_ha - 6.25).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&zone.npk_current));
        assert!(zone.recommended_value.is_none());
    }

    let npk: Vec<f64> = report.zones.iter().map(|z| z.npk_current).collect();
    assert_eq!(report.summary.zone_count, 16);
    assert!((report.summary.total_area_ha - 100.0).abs() < 1e-6);
    assert!((report.summary.coefficient_of_variation - coefficient_of_variation(&npk)).abs() < 1e-12);
    assert_eq!(report.summary.category_counts.values().sum::<usize>(), 16);
}

#[tokio::test]
async fn test_fertility_run_skips_recommendation_stage() {
    let report = service(Some(1), None)
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated))
        .await
        .unwrap();

    assert_eq!(
        report.stages,
        vec![
            AnalysisStage::Idle,
            AnalysisStage::Partitioned,
            AnalysisStage::IndicesAcquired,
            AnalysisStage::IndicesSynthesized,
            AnalysisStage::Categorized,
            AnalysisStage::Ready,
        ]
    );
    assert!(report.fertilizer.is_none());
    assert_eq!(report.palette.len(), 5);
}

#[tokio::test]
async fn test_same_seed_same_report_values() {
    let first = service(Some(7), None)
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated))
        .await
        .unwrap();
    let second = service(Some(7), None)
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated))
        .await
        .unwrap();

    assert_ne!(first.run_id, second.run_id);
    let values = |r: &parcel_fertility_backend::models::AnalysisReport| {
        r.zones.iter().map(|z| (z.organic_matter, z.ndvi, z.npk_current)).collect::<Vec<_>>()
    };
    assert_eq!(values(&first), values(&second));
    assert_eq!(first.source.base_value, second.source.base_value);
}

#[tokio::test]
async fn test_off_season_range_adds_notice() {
    let mut req = request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated);
    req.date_range = DateRange::new(
        NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
    );
    let report = service(Some(3), None).run(req).await.unwrap();

    assert_eq!(report.stage, AnalysisStage::Ready);
    assert_eq!(report.notices.len(), 1);
    assert!(report.notices[0].contains("optimal imagery months"));
}

// ============================================================================
// Provider fallback
// ============================================================================

#[tokio::test]
async fn test_provider_without_credentials_falls_back() {
    let report = service(Some(5), None)
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Sentinel2))
        .await
        .unwrap();

    assert_eq!(report.stage, AnalysisStage::Ready);
    assert_eq!(report.source.source, IndexSourceKind::Simulated);
    assert_eq!(report.zones.len(), 16);
    assert!(report.notices.iter().any(|n| n.contains("credentials")));
}

#[tokio::test]
async fn test_unreachable_provider_falls_back() {
    let credentials = Credentials {
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
    };
    let report = service(Some(5), Some(credentials))
        .run(request(AnalysisMode::CurrentFertility, IndexSourceKind::Landsat))
        .await
        .unwrap();

    assert_eq!(report.stage, AnalysisStage::Ready);
    assert_eq!(report.source.source, IndexSourceKind::Simulated);
    assert!(report.notices.iter().any(|n| n.contains("unavailable")));
}

// ============================================================================
// Recommendation runs
// ============================================================================

#[tokio::test]
async fn test_nitrogen_recommendation_run() {
    let mode = AnalysisMode::Recommendation {
        nutrient: Nutrient::Nitrogen,
    };
    let report = service(Some(11), None)
        .run(request(mode, IndexSourceKind::Simulated))
        .await
        .unwrap();

    let range = Crop::Wheat.profile().nitrogen;
    assert!(report.stages.contains(&AnalysisStage::RecommendationsComputed));
    assert!(report.fertilizer.is_some());
    for zone in &report.zones {
        let dose = zone.recommended_value.unwrap();
        assert!(dose >= range.min * DOSE_FLOOR_FACTOR - 1e-9);
        assert!(dose <= range.max * DOSE_CEILING_FACTOR + 1e-9);
        assert!(((dose * 10.0).round() - dose * 10.0).abs() < 1e-6);
    }
    let doses: Vec<f64> = report.zones.iter().map(|z| z.value()).collect();
    let mean = doses.iter().sum::<f64>() / doses.len() as f64;
    assert!((report.summary.mean_value - mean).abs() < 1e-9);
}

// ============================================================================
// Input errors
// ============================================================================

#[tokio::test]
async fn test_empty_parcel_is_rejected() {
    let mut req = request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated);
    req.parcel.polygons.clear();
    let err = service(None, None).run(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "parcel"));
}

#[tokio::test]
async fn test_zone_count_out_of_range_is_rejected() {
    let mut req = request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated);
    req.zone_count = Some(64);
    let err = service(None, None).run(req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "zone_count"));
}

#[tokio::test]
async fn test_default_zone_count_applies() {
    let mut req = request(AnalysisMode::CurrentFertility, IndexSourceKind::Simulated);
    req.zone_count = None;
    let report = service(Some(2), None).run(req).await.unwrap();
    // 32 cells on a 6 × 6 grid: the first 32 cells in scan order all lie inside the square
    assert_eq!(report.zones.len(), 32);
}
