//! Crop profile lookup

use axum::{extract::Path, Json};
use shared::{Crop, CropProfile};

use crate::error::{AppError, AppResult};

/// All crop profiles, in a fixed order
pub async fn list_crops() -> Json<Vec<&'static CropProfile>> {
    Json(Crop::ALL.iter().map(|c| c.profile()).collect())
}

/// One crop profile by English or Spanish name
pub async fn get_crop(Path(name): Path<String>) -> AppResult<Json<&'static CropProfile>> {
    let crop: Crop = name
        .parse()
        .map_err(|_| AppError::NotFound(format!("Crop '{}'", name)))?;
    Ok(Json(crop.profile()))
}
