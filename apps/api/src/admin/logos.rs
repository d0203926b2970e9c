//! Company logo storage: multipart upload or fetch-by-URL, written to the
//! S3 bucket under a per-company key and recorded on the company row.

use aws_sdk_s3::primitives::ByteStream;
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::admin::auth::AdminSession;
use crate::config::Config;
use crate::errors::AppError;
use crate::state::AppState;

pub const MAX_LOGO_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/svg+xml", "svg"),
    ("image/webp", "webp"),
];

/// File extension for an accepted logo content type.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}

/// S3 object key for a company's logo. Keyed by company id, so replacing a
/// logo overwrites the object.
pub fn logo_key(company_id: Uuid, ext: &str) -> String {
    format!("logos/{company_id}.{ext}")
}

/// Public URL of a stored logo object.
pub fn public_logo_url(config: &Config, key: &str) -> String {
    format!(
        "{}/{}/{}",
        config.s3_endpoint.trim_end_matches('/'),
        config.s3_bucket,
        key
    )
}

#[derive(Serialize)]
pub struct LogoResponse {
    pub logo_key: String,
    pub logo_url: String,
}

/// POST /api/v1/admin/companies/:id/logo  (multipart, field `file`)
pub async fn handle_upload_logo(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<LogoResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Logo file must declare a content type".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read logo upload: {e}")))?;
        let key = store_logo(&state, company_id, &content_type, data).await?;
        let logo_url = public_logo_url(&state.config, &key);
        return Ok(Json(LogoResponse {
            logo_key: key,
            logo_url,
        }));
    }
    Err(AppError::Validation(
        "Multipart request is missing the 'file' field".to_string(),
    ))
}

#[derive(Deserialize)]
pub struct LogoFromUrlRequest {
    pub url: String,
}

/// POST /api/v1/admin/companies/:id/logo/from-url
pub async fn handle_logo_from_url(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Json(req): Json<LogoFromUrlRequest>,
) -> Result<Json<LogoResponse>, AppError> {
    let response = state
        .http
        .get(&req.url)
        .send()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(AppError::Fetch(format!(
            "remote returned status {}",
            response.status()
        )));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(media_type)
        .ok_or_else(|| AppError::Validation("Remote resource has no content type".to_string()))?;
    let data = response
        .bytes()
        .await
        .map_err(|e| AppError::Fetch(e.to_string()))?;

    let key = store_logo(&state, company_id, &content_type, data).await?;
    let logo_url = public_logo_url(&state.config, &key);
    Ok(Json(LogoResponse {
        logo_key: key,
        logo_url,
    }))
}

/// Strips content-type parameters: "image/png; charset=..." -> "image/png".
fn media_type(header_value: &str) -> String {
    header_value
        .split(';')
        .next()
        .unwrap_or(header_value)
        .trim()
        .to_string()
}

async fn store_logo(
    state: &AppState,
    company_id: Uuid,
    content_type: &str,
    data: Bytes,
) -> Result<String, AppError> {
    let ext = extension_for(content_type).ok_or_else(|| {
        AppError::Validation(format!(
            "Unsupported logo content type '{content_type}' (use png, jpeg, svg, or webp)"
        ))
    })?;
    if data.is_empty() {
        return Err(AppError::Validation("Logo file is empty".to_string()));
    }
    if data.len() > MAX_LOGO_BYTES {
        return Err(AppError::Validation(format!(
            "Logo exceeds the {} byte limit",
            MAX_LOGO_BYTES
        )));
    }

    let key = logo_key(company_id, ext);
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(ByteStream::from(data.to_vec()))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Logo upload failed: {e}")))?;

    let result = sqlx::query("UPDATE companies SET logo_key = $1 WHERE id = $2")
        .bind(&key)
        .bind(company_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Company {company_id} not found")));
    }

    info!(
        "Stored logo for company {company_id} at s3://{}/{}",
        state.config.s3_bucket, key
    );
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/svg+xml"), Some("svg"));
    }

    #[test]
    fn test_extension_for_rejects_others() {
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_logo_key_is_per_company() {
        let id = Uuid::new_v4();
        assert_eq!(logo_key(id, "png"), format!("logos/{id}.png"));
    }

    #[test]
    fn test_media_type_strips_parameters() {
        assert_eq!(media_type("image/png; charset=binary"), "image/png");
        assert_eq!(media_type("image/webp"), "image/webp");
    }
}
