use axum::{extract::Path, Json};
use serde::{Deserialize, Serialize};

use super::AppJson;
use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    services::imports::{ImportPlatform, ImportWizard, ImportedItem},
};

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub platform: ImportPlatform,
    pub items: Vec<ImportedItem>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmImportRequest {
    content: String,
    #[serde(default)]
    selected: Vec<usize>,
}

fn wizard_for(platform: &str, content: &str) -> AppResult<(ImportPlatform, ImportWizard)> {
    let platform: ImportPlatform = platform.parse().map_err(AppError::InvalidInput)?;

    let mut wizard = ImportWizard::new();
    wizard.select_platform(platform)?;
    wizard.upload(content)?;

    Ok((platform, wizard))
}

/// Handler that parses an export file and returns the importable items
pub async fn preview(
    user: AuthUser,
    Path(platform): Path<String>,
    content: String,
) -> AppResult<Json<ImportResponse>> {
    let (platform, wizard) = wizard_for(&platform, &content)?;

    tracing::info!(
        user_id = %user.id,
        platform = %platform,
        items = wizard.items().len(),
        "Import preview generated"
    );

    Ok(Json(ImportResponse {
        platform,
        items: wizard.items().to_vec(),
    }))
}

/// Handler that returns the subset of parsed items the caller selected
pub async fn confirm(
    user: AuthUser,
    Path(platform): Path<String>,
    AppJson(request): AppJson<ConfirmImportRequest>,
) -> AppResult<Json<ImportResponse>> {
    let (platform, wizard) = wizard_for(&platform, &request.content)?;
    let items = wizard.confirm(&request.selected)?;

    tracing::info!(
        user_id = %user.id,
        platform = %platform,
        confirmed = items.len(),
        "Import confirmed"
    );

    Ok(Json(ImportResponse { platform, items }))
}
