//! Analysis orchestration
//!
//! Runs one request through partition → index acquisition → synthesis → (recommendation) →
//! categorization. Each run owns its zones and records; nothing is cached across runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    categorize, category_color, color_ramp, partition, recommend, summarize, synthesize,
    validate_date_range, validate_parcel, validate_zone_count, AnalysisMode, Category, GaussianNoise,
    IndexSourceRecord, ManagementZone, Parcel, ZoneMetrics,
};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::SentinelHubClient;
use crate::models::{AnalysisReport, AnalysisRequest, AnalysisStage, ZoneReport};
use crate::services::index_source::IndexSource;

/// Stage bookkeeping for one run
#[derive(Debug)]
pub struct StageTracker {
    run_id: Uuid,
    mode: AnalysisMode,
    stage: AnalysisStage,
    history: Vec<AnalysisStage>,
}

impl StageTracker {
    pub fn new(run_id: Uuid, mode: AnalysisMode) -> Self {
        Self {
            run_id,
            mode,
            stage: AnalysisStage::Idle,
            history: vec![AnalysisStage::Idle],
        }
    }

    pub fn stage(&self) -> AnalysisStage {
        self.stage
    }

    pub fn history(&self) -> &[AnalysisStage] {
        &self.history
    }

    /// Move to `next`, which must be the successor of the current stage
    pub fn advance(&mut self, next: AnalysisStage) -> AppResult<()> {
        if self.stage.next(self.mode) != Some(next) {
            return Err(AppError::Internal(format!(
                "Invalid stage transition {:?} -> {:?}",
                self.stage, next
            )));
        }
        tracing::debug!(run_id = %self.run_id, "stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
        self.history.push(next);
        Ok(())
    }

    /// Move to `Failed`; a run that already finished keeps its terminal stage
    pub fn fail(&mut self, err: &AppError) {
        if self.stage.is_terminal() {
            tracing::warn!(run_id = %self.run_id, "error after {:?} ignored: {}", self.stage, err);
            return;
        }
        tracing::error!(run_id = %self.run_id, "run failed during {:?}: {}", self.stage, err);
        self.stage = AnalysisStage::Failed;
        self.history.push(AnalysisStage::Failed);
    }
}

/// Run a computation stage on the blocking pool; a panic becomes a computation error
async fn blocking<T, F>(stage: &'static str, f: F) -> AppResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|err| {
        let detail = if err.is_panic() {
            let payload = err.into_panic();
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string())
        } else {
            err.to_string()
        };
        AppError::Computation(format!("{} stage: {}", stage, detail))
    })
}

/// Inputs that passed validation
struct ValidatedRequest {
    parcel: Arc<Parcel>,
    zone_count: u32,
}

/// Orchestrates analysis runs
#[derive(Clone)]
pub struct AnalysisService {
    config: Arc<Config>,
    client: SentinelHubClient,
}

impl AnalysisService {
    pub fn new(config: Arc<Config>, client: SentinelHubClient) -> Self {
        Self { config, client }
    }

    fn validate(&self, request: &AnalysisRequest) -> AppResult<ValidatedRequest> {
        let parcel = Parcel::from(&request.parcel);
        validate_parcel(&parcel)?;
        let limits = &self.config.analysis;
        let zone_count = request.zone_count.unwrap_or(limits.default_zone_count);
        validate_zone_count(zone_count, limits.min_zone_count, limits.max_zone_count)?;
        validate_date_range(&request.date_range)?;
        Ok(ValidatedRequest {
            parcel: Arc::new(parcel),
            zone_count,
        })
    }

    fn noise(&self) -> GaussianNoise<StdRng> {
        let rng = match self.config.analysis.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        GaussianNoise::new(rng)
    }

    /// Run one analysis end to end.
    ///
    /// Input errors are returned before any stage runs. Provider problems only add notices.
    /// A failing computation stage moves the run to `Failed` and is returned as
    /// `AppError::Computation`.
    pub async fn run(&self, request: AnalysisRequest) -> AppResult<AnalysisReport> {
        let validated = self.validate(&request)?;
        let run_id = Uuid::new_v4();
        let mut tracker = StageTracker::new(run_id, request.mode);

        tracing::info!(
            run_id = %run_id,
            "analysis started: crop={} mode={} source={} zones={}",
            request.crop,
            request.mode,
            request.source,
            validated.zone_count
        );

        match self.execute(&mut tracker, request, validated).await {
            Ok(report) => Ok(report),
            Err(err) => {
                tracker.fail(&err);
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        tracker: &mut StageTracker,
        request: AnalysisRequest,
        validated: ValidatedRequest,
    ) -> AppResult<AnalysisReport> {
        let started = Instant::now();
        let crop = request.crop.profile();
        let mode = request.mode;
        let mut notices = Vec::new();
        let mut noise = self.noise();

        // Partition
        let parcel = Arc::clone(&validated.parcel);
        let zone_count = validated.zone_count;
        let zones: Vec<ManagementZone> =
            blocking("partition", move || partition(&parcel, zone_count)).await?;
        if zones.is_empty() {
            notices.push("No management zones intersect the parcel boundary".to_string());
        }
        tracker.advance(AnalysisStage::Partitioned)?;

        // Index acquisition
        if !crop.in_imagery_window(&request.date_range.months()) {
            notices.push(format!(
                "The date range misses the optimal imagery months for {} ({:?})",
                request.crop, crop.imagery.optimal_months
            ));
        }
        let (source, selection_notice) = IndexSource::select(request.source, &self.client);
        notices.extend(selection_notice);
        let timeout = Duration::from_secs(self.config.analysis.provider_timeout_secs);
        let acquisition = source
            .acquire(
                &validated.parcel,
                crop,
                &request.date_range,
                request.index,
                timeout,
                &mut noise,
            )
            .await;
        notices.extend(acquisition.notice);
        let record: IndexSourceRecord = acquisition.record;
        tracker.advance(AnalysisStage::IndicesAcquired)?;

        // Synthesis
        let synth_record = record.clone();
        let (zones, metrics): (Vec<ManagementZone>, Vec<ZoneMetrics>) =
            blocking("synthesis", move || {
                let metrics = synthesize(&zones, crop, &synth_record, &mut noise);
                (zones, metrics)
            })
            .await?;
        tracker.advance(AnalysisStage::IndicesSynthesized)?;

        // Recommendation
        let (metrics, doses) = match mode.nutrient() {
            Some(nutrient) => {
                let (metrics, doses) = blocking("recommendation", move || {
                    let doses = recommend(&metrics, nutrient, crop);
                    (metrics, doses)
                })
                .await?;
                tracker.advance(AnalysisStage::RecommendationsComputed)?;
                (metrics, Some(doses))
            }
            None => (metrics, None),
        };

        // Categorization
        let values: Vec<f64> = match &doses {
            Some(doses) => doses.clone(),
            None => metrics.iter().map(|m| m.npk_current).collect(),
        };
        let categories: Vec<Category> = blocking("categorization", move || {
            values.iter().map(|v| categorize(*v, mode, crop)).collect()
        })
        .await?;
        tracker.advance(AnalysisStage::Categorized)?;

        let zone_reports: Vec<ZoneReport> = zones
            .iter()
            .zip(&metrics)
            .zip(&categories)
            .enumerate()
            .map(|(i, ((zone, m), category))| ZoneReport {
                id: zone.id,
                area_ha: zone.area_ha,
                organic_matter: m.organic_matter,
                soil_moisture: m.soil_moisture,
                ndvi: m.ndvi,
                ndre: m.ndre,
                npk_current: m.npk_current,
                recommended_value: doses.as_ref().map(|d| d[i]),
                category: *category,
                category_label: category.label(mode).to_string(),
                category_label_es: category.label_es(mode).to_string(),
                color: category_color(mode, *category).to_string(),
                centroid: zone.centroid,
                geometry: zone.rings(),
            })
            .collect();

        let areas: Vec<f64> = zone_reports.iter().map(|z| z.area_ha).collect();
        let values: Vec<f64> = zone_reports.iter().map(ZoneReport::value).collect();
        let summary = summarize(&areas, &values, &categories);
        tracker.advance(AnalysisStage::Ready)?;

        tracing::info!(
            run_id = %tracker.run_id,
            "analysis ready: {} zones, {:.2} ha, mean {:.3}, CV {:.1}% in {:?}",
            summary.zone_count,
            summary.total_area_ha,
            summary.mean_value,
            summary.coefficient_of_variation,
            started.elapsed()
        );

        Ok(AnalysisReport {
            run_id: tracker.run_id,
            crop: request.crop,
            mode,
            source: record,
            notices,
            stage: tracker.stage(),
            stages: tracker.history().to_vec(),
            zones: zone_reports,
            summary,
            palette: color_ramp(mode).iter().map(|c| c.to_string()).collect(),
            fertilizer: mode.nutrient().map(|n| crop.fertilizer(n).to_string()),
            generated_at: Utc::now(),
        })
    }
}
