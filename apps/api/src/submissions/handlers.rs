use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::browse::queries as browse_queries;
use crate::browse::stats::{outlier_band, Sample};
use crate::errors::AppError;
use crate::normalize::companies::is_near_duplicate;
use crate::normalize::{clean, normalize_company_name, normalize_title, slugify};
use crate::state::AppState;
use crate::submissions::access::{is_unlocked, unlock_expiry, SubmissionView};
use crate::submissions::queries::{
    self, location_slug, NewSubmission,
};
use crate::submissions::tokens::{generate_claim_token, hash_token};
use crate::submissions::wizard::{
    validate_background, validate_compensation, validate_draft, validate_role, FieldError,
    SubmissionDraft, WizardStep,
};

#[derive(Serialize)]
pub struct StepValidationResponse {
    pub valid: bool,
    pub errors: Vec<FieldError>,
}

/// POST /api/v1/submissions/steps/:step/validate
pub async fn handle_validate_step(
    Path(step): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<StepValidationResponse>, AppError> {
    let step: WizardStep = step
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown wizard step '{step}'")))?;

    let errors = match step {
        WizardStep::Role => validate_role(&parse_step(payload)?),
        WizardStep::Compensation => validate_compensation(&parse_step(payload)?),
        WizardStep::Background => validate_background(&parse_step(payload)?),
    };

    Ok(Json(StepValidationResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

fn parse_step<T: serde::de::DeserializeOwned>(payload: serde_json::Value) -> Result<T, AppError> {
    serde_json::from_value(payload).map_err(|e| AppError::Validation(format!("Malformed step payload: {e}")))
}

#[derive(Serialize)]
pub struct NewEntities {
    pub company: bool,
    pub job_title: bool,
    pub location: bool,
    pub level: bool,
}

#[derive(Serialize)]
pub struct SubmissionWarning {
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
pub struct PreviewResponse {
    pub draft: SubmissionDraft,
    pub new_entities: NewEntities,
    pub warnings: Vec<SubmissionWarning>,
}

/// POST /api/v1/submissions/preview
///
/// Validates the full draft, resolves which entities already exist, and
/// returns advisory warnings. Never writes.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(mut draft): Json<SubmissionDraft>,
) -> Result<Json<PreviewResponse>, AppError> {
    let errors = validate_draft(&draft);
    if !errors.is_empty() {
        return Err(AppError::UnprocessableEntity(
            serde_json::to_string(&errors).unwrap_or_default(),
        ));
    }

    // Normalize in place so the client previews the canonical names.
    draft.role.company = normalize_company_name(&draft.role.company);
    draft.role.job_title = normalize_title(&draft.role.job_title);
    draft.role.level = draft.role.level.as_deref().map(clean);
    draft.background.city = clean(&draft.background.city);
    draft.background.region = draft
        .background
        .region
        .as_deref()
        .map(clean)
        .filter(|r| !r.is_empty());
    draft.background.country = clean(&draft.background.country);

    let company = browse_queries::get_company_by_slug(&state.db, &slugify(&draft.role.company)).await?;
    let title = browse_queries::get_title_by_slug(&state.db, &slugify(&draft.role.job_title)).await?;
    let location = browse_queries::get_location_by_slug(
        &state.db,
        &location_slug(
            &draft.background.city,
            draft.background.region.as_deref(),
            &draft.background.country,
        ),
    )
    .await?;

    let level = match (&company, &title, &draft.role.level) {
        (Some(company), Some(title), Some(name)) => {
            queries::find_level(&state.db, company.id, title.id, name).await?
        }
        _ => None,
    };

    let mut warnings = Vec::new();

    if company.is_none() {
        let existing = queries::all_company_names(&state.db).await?;
        for name in &existing {
            if let Some(similarity) = is_near_duplicate(&draft.role.company, name) {
                warnings.push(SubmissionWarning {
                    code: "near_duplicate_company",
                    message: format!(
                        "'{}' is very similar to existing company '{}' ({:.0}% match). \
                         Double-check before creating a new company.",
                        draft.role.company,
                        name,
                        similarity * 100.0
                    ),
                });
            }
        }
        warnings.truncate(3);
    }

    if let Some(title) = &title {
        let samples = browse_queries::samples_for_title(&state.db, title.id).await?;
        if let Some((low, high)) = outlier_band(&samples, state.config.min_group_size) {
            let total = Sample {
                base: draft.compensation.base_salary,
                bonus: draft.compensation.bonus,
                stock: draft.compensation.stock,
            }
            .total();
            if total < low || total > high {
                warnings.push(SubmissionWarning {
                    code: "compensation_outlier",
                    message: format!(
                        "Total compensation {} is outside the typical range for '{}'. \
                         Submit anyway if the figures are correct.",
                        total, title.title
                    ),
                });
            }
        }
    }

    let new_entities = NewEntities {
        company: company.is_none(),
        job_title: title.is_none(),
        location: location.is_none(),
        level: draft_has_level(&draft) && level.is_none(),
    };

    Ok(Json(PreviewResponse {
        draft,
        new_entities,
        warnings,
    }))
}

fn draft_has_level(draft: &SubmissionDraft) -> bool {
    draft.role.level.as_deref().is_some_and(|l| !l.is_empty())
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub draft: SubmissionDraft,
    /// Set for authenticated submitters; anonymous callers get a claim
    /// token back instead.
    pub user_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub submission_id: Uuid,
    /// Returned exactly once; the server stores only its hash.
    pub claim_token: Option<String>,
}

/// POST /api/v1/submissions
pub async fn handle_submit(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let draft = &req.draft;
    let errors = validate_draft(draft);
    if !errors.is_empty() {
        return Err(AppError::UnprocessableEntity(
            serde_json::to_string(&errors).unwrap_or_default(),
        ));
    }

    if let Some(user_id) = req.user_id {
        if !queries::user_exists(&state.db, user_id).await? {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        }
    }

    let claim_token = match req.user_id {
        Some(_) => None,
        None => Some(generate_claim_token()),
    };
    let token_hash = claim_token.as_deref().map(hash_token);

    let mut tx = state.db.begin().await?;

    let company = queries::get_or_create_company(&mut tx, &draft.role.company).await?;
    let title = queries::get_or_create_title(&mut tx, &draft.role.job_title).await?;
    let location = queries::get_or_create_location(
        &mut tx,
        &draft.background.city,
        draft.background.region.as_deref(),
        &draft.background.country,
    )
    .await?;
    let level = match draft.role.level.as_deref().map(clean).filter(|l| !l.is_empty()) {
        Some(name) => Some(queries::get_or_create_level(&mut tx, company.id, title.id, &name).await?),
        None => None,
    };

    let submission = queries::insert_submission(
        &mut tx,
        NewSubmission {
            company_id: company.id,
            job_title_id: title.id,
            location_id: location.id,
            level_id: level.map(|l| l.id),
            base_salary: draft.compensation.base_salary,
            bonus: draft.compensation.bonus,
            stock: draft.compensation.stock,
            currency: &draft.compensation.currency,
            years_experience: draft.background.years_experience,
            years_at_company: draft.background.years_at_company,
            note: draft.note.as_deref(),
            user_id: req.user_id,
            anon_token_hash: token_hash.as_deref(),
        },
    )
    .await?;

    tx.commit().await?;

    info!(
        "Recorded submission {} for '{}' at '{}'",
        submission.id, title.title, company.name
    );

    Ok(Json(SubmitResponse {
        submission_id: submission.id,
        claim_token,
    }))
}

#[derive(Deserialize)]
pub struct OwnerQuery {
    pub user_id: Option<Uuid>,
    pub token: Option<String>,
}

/// GET /api/v1/submissions/mine
pub async fn handle_list_mine(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<Vec<SubmissionView>>, AppError> {
    if params.user_id.is_none() && params.token.is_none() {
        return Err(AppError::Validation(
            "Provide user_id or token to list your submissions".to_string(),
        ));
    }
    let token_hash = params.token.as_deref().map(hash_token);
    let rows = queries::list_by_owner(&state.db, params.user_id, token_hash.as_deref()).await?;
    // Owners always see their own figures.
    let views = rows
        .into_iter()
        .map(|d| SubmissionView::from_detail(d, true))
        .collect();
    Ok(Json(views))
}

#[derive(Deserialize)]
pub struct SyncUserRequest {
    pub external_id: String,
    pub email: String,
}

/// POST /api/v1/users
///
/// Upserts the user row at sign-in so claims and authenticated submissions
/// have a user id to reference.
pub async fn handle_sync_user(
    State(state): State<AppState>,
    Json(req): Json<SyncUserRequest>,
) -> Result<Json<crate::models::user::User>, AppError> {
    if req.external_id.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::Validation(
            "external_id and email are required".to_string(),
        ));
    }
    let user = queries::get_or_create_user(&state.db, &req.external_id, &req.email).await?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Serialize)]
pub struct ClaimResponse {
    pub migrated: u64,
}

/// POST /api/v1/access/claim
///
/// Migrates anonymous submissions matching the token to the user. Repeat
/// claims migrate zero rows and succeed.
pub async fn handle_claim(
    State(state): State<AppState>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    if !queries::user_exists(&state.db, req.user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", req.user_id)));
    }
    let migrated =
        queries::migrate_anonymous(&state.db, req.user_id, &hash_token(&req.token)).await?;
    info!(
        "Migrated {migrated} anonymous submissions to user {}",
        req.user_id
    );
    Ok(Json(ClaimResponse { migrated }))
}

#[derive(Serialize)]
pub struct AccessStatusResponse {
    pub unlocked: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// GET /api/v1/access/status
pub async fn handle_access_status(
    State(state): State<AppState>,
    Query(params): Query<OwnerQuery>,
) -> Result<Json<AccessStatusResponse>, AppError> {
    let token_hash = params.token.as_deref().map(hash_token);
    let latest =
        queries::latest_owned_submission(&state.db, params.user_id, token_hash.as_deref()).await?;
    let window = state.config.unlock_window_days;
    let unlocked = is_unlocked(latest, Utc::now(), window);
    let expires_at = match latest {
        Some(submitted_at) if unlocked => Some(unlock_expiry(submitted_at, window)),
        _ => None,
    };
    Ok(Json(AccessStatusResponse {
        unlocked,
        expires_at,
    }))
}

/// Resolves whether a viewer identified by the given credentials is
/// currently unlocked. Used by browse endpoints for redaction.
pub async fn viewer_unlocked(
    state: &AppState,
    user_id: Option<Uuid>,
    token: Option<&str>,
) -> Result<bool, AppError> {
    if user_id.is_none() && token.is_none() {
        return Ok(false);
    }
    let token_hash = token.map(hash_token);
    let latest =
        queries::latest_owned_submission(&state.db, user_id, token_hash.as_deref()).await?;
    Ok(is_unlocked(latest, Utc::now(), state.config.unlock_window_days))
}
