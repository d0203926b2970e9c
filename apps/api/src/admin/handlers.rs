//! Admin CRUD over the catalog entities and submissions. Every handler
//! requires an `AdminSession`. Unique and foreign-key violations surface as
//! 409s through the error mapping.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::admin::auth::AdminSession;
use crate::errors::AppError;
use crate::models::company::Company;
use crate::models::industry::Industry;
use crate::models::job_title::JobTitle;
use crate::models::level::Level;
use crate::models::location::Location;
use crate::models::submission::{Submission, SubmissionDetail};
use crate::normalize::{clean, slugify};
use crate::state::AppState;
use crate::submissions::queries::location_slug;

fn required_name(raw: &str, field: &str) -> Result<String, AppError> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(cleaned)
}

// ---- companies -------------------------------------------------------------

#[derive(Deserialize)]
pub struct CompanyCreate {
    pub name: String,
    pub website: Option<String>,
}

/// POST /api/v1/admin/companies
pub async fn handle_create_company(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<CompanyCreate>,
) -> Result<(StatusCode, Json<Company>), AppError> {
    let name = required_name(&req.name, "name")?;
    let company = sqlx::query_as::<_, Company>(
        "INSERT INTO companies (name, slug, website) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&name)
    .bind(slugify(&name))
    .bind(&req.website)
    .fetch_one(&state.db)
    .await?;
    info!("Admin created company '{}'", company.name);
    Ok((StatusCode::CREATED, Json(company)))
}

#[derive(Deserialize)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub website: Option<String>,
}

/// PATCH /api/v1/admin/companies/:id
pub async fn handle_update_company(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompanyUpdate>,
) -> Result<Json<Company>, AppError> {
    let existing = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    let name = match &req.name {
        Some(raw) => required_name(raw, "name")?,
        None => existing.name,
    };
    let website = req.website.or(existing.website);

    let updated = sqlx::query_as::<_, Company>(
        "UPDATE companies SET name = $1, slug = $2, website = $3 WHERE id = $4 RETURNING *",
    )
    .bind(&name)
    .bind(slugify(&name))
    .bind(&website)
    .bind(id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/companies/:id
pub async fn handle_delete_company(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "companies", id).await
}

// ---- job titles ------------------------------------------------------------

#[derive(Deserialize)]
pub struct JobTitleCreate {
    pub title: String,
    pub industry_id: Option<Uuid>,
}

/// POST /api/v1/admin/job-titles
pub async fn handle_create_title(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<JobTitleCreate>,
) -> Result<(StatusCode, Json<JobTitle>), AppError> {
    let title = required_name(&req.title, "title")?;
    let created = sqlx::query_as::<_, JobTitle>(
        "INSERT INTO job_titles (title, slug, industry_id) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(&title)
    .bind(slugify(&title))
    .bind(req.industry_id)
    .fetch_one(&state.db)
    .await?;
    info!("Admin created job title '{}'", created.title);
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct JobTitleUpdate {
    pub title: Option<String>,
    pub industry_id: Option<Uuid>,
}

/// PATCH /api/v1/admin/job-titles/:id
pub async fn handle_update_title(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JobTitleUpdate>,
) -> Result<Json<JobTitle>, AppError> {
    let existing = sqlx::query_as::<_, JobTitle>("SELECT * FROM job_titles WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job title {id} not found")))?;

    let title = match &req.title {
        Some(raw) => required_name(raw, "title")?,
        None => existing.title,
    };
    let industry_id = req.industry_id.or(existing.industry_id);

    let updated = sqlx::query_as::<_, JobTitle>(
        "UPDATE job_titles SET title = $1, slug = $2, industry_id = $3 WHERE id = $4 RETURNING *",
    )
    .bind(&title)
    .bind(slugify(&title))
    .bind(industry_id)
    .bind(id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/job-titles/:id
pub async fn handle_delete_title(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "job_titles", id).await
}

// ---- locations -------------------------------------------------------------

#[derive(Deserialize)]
pub struct LocationCreate {
    pub city: String,
    pub region: Option<String>,
    pub country: String,
}

/// POST /api/v1/admin/locations
pub async fn handle_create_location(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<LocationCreate>,
) -> Result<(StatusCode, Json<Location>), AppError> {
    let city = required_name(&req.city, "city")?;
    let country = required_name(&req.country, "country")?;
    let region = req.region.as_deref().map(clean).filter(|r| !r.is_empty());
    let slug = location_slug(&city, region.as_deref(), &country);
    let created = sqlx::query_as::<_, Location>(
        "INSERT INTO locations (city, region, country, slug) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(&city)
    .bind(&region)
    .bind(&country)
    .bind(&slug)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct LocationUpdate {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

/// PATCH /api/v1/admin/locations/:id
pub async fn handle_update_location(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LocationUpdate>,
) -> Result<Json<Location>, AppError> {
    let existing = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {id} not found")))?;

    let city = match &req.city {
        Some(raw) => required_name(raw, "city")?,
        None => existing.city,
    };
    let country = match &req.country {
        Some(raw) => required_name(raw, "country")?,
        None => existing.country,
    };
    let region = req
        .region
        .as_deref()
        .map(clean)
        .filter(|r| !r.is_empty())
        .or(existing.region);
    let slug = location_slug(&city, region.as_deref(), &country);

    let updated = sqlx::query_as::<_, Location>(
        "UPDATE locations SET city = $1, region = $2, country = $3, slug = $4 WHERE id = $5 RETURNING *",
    )
    .bind(&city)
    .bind(&region)
    .bind(&country)
    .bind(&slug)
    .bind(id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/locations/:id
pub async fn handle_delete_location(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "locations", id).await
}

// ---- industries ------------------------------------------------------------

#[derive(Deserialize)]
pub struct IndustryPayload {
    pub name: String,
}

/// POST /api/v1/admin/industries
pub async fn handle_create_industry(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<IndustryPayload>,
) -> Result<(StatusCode, Json<Industry>), AppError> {
    let name = required_name(&req.name, "name")?;
    let created = sqlx::query_as::<_, Industry>(
        "INSERT INTO industries (name, slug) VALUES ($1, $2) RETURNING *",
    )
    .bind(&name)
    .bind(slugify(&name))
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/admin/industries/:id
pub async fn handle_update_industry(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<IndustryPayload>,
) -> Result<Json<Industry>, AppError> {
    let name = required_name(&req.name, "name")?;
    let updated = sqlx::query_as::<_, Industry>(
        "UPDATE industries SET name = $1, slug = $2 WHERE id = $3 RETURNING *",
    )
    .bind(&name)
    .bind(slugify(&name))
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Industry {id} not found")))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/industries/:id
pub async fn handle_delete_industry(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "industries", id).await
}

// ---- levels ----------------------------------------------------------------

#[derive(Deserialize)]
pub struct LevelCreate {
    pub company_id: Uuid,
    pub job_title_id: Uuid,
    pub name: String,
}

/// POST /api/v1/admin/levels
pub async fn handle_create_level(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(req): Json<LevelCreate>,
) -> Result<(StatusCode, Json<Level>), AppError> {
    let name = required_name(&req.name, "name")?;
    ensure_exists(&state, "companies", req.company_id).await?;
    ensure_exists(&state, "job_titles", req.job_title_id).await?;
    let created = sqlx::query_as::<_, Level>(
        "INSERT INTO levels (company_id, job_title_id, name) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(req.company_id)
    .bind(req.job_title_id)
    .bind(&name)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct LevelUpdate {
    pub name: String,
}

/// PATCH /api/v1/admin/levels/:id
pub async fn handle_update_level(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LevelUpdate>,
) -> Result<Json<Level>, AppError> {
    let name = required_name(&req.name, "name")?;
    let updated =
        sqlx::query_as::<_, Level>("UPDATE levels SET name = $1 WHERE id = $2 RETURNING *")
            .bind(&name)
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Level {id} not found")))?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/levels/:id
pub async fn handle_delete_level(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "levels", id).await
}

// ---- submissions -----------------------------------------------------------

#[derive(Deserialize)]
pub struct AdminListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/admin/submissions — dashboard listing, newest first.
pub async fn handle_list_submissions(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<AdminListQuery>,
) -> Result<Json<Vec<SubmissionDetail>>, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);
    let offset = params.offset.unwrap_or(0).max(0);
    let rows = sqlx::query_as::<_, SubmissionDetail>(
        r#"
        SELECT s.id, c.name AS company, c.slug AS company_slug,
               t.title AS job_title, t.slug AS job_title_slug,
               l.city, l.country, lv.name AS level,
               s.base_salary, s.bonus, s.stock, s.currency,
               s.years_experience, s.years_at_company, s.note, s.submitted_at
        FROM salary_submissions s
        JOIN companies c ON c.id = s.company_id
        JOIN job_titles t ON t.id = s.job_title_id
        JOIN locations l ON l.id = s.location_id
        LEFT JOIN levels lv ON lv.id = s.level_id
        ORDER BY s.submitted_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct SubmissionUpdate {
    pub base_salary: Option<i64>,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    pub level_id: Option<Uuid>,
    pub note: Option<String>,
}

/// PATCH /api/v1/admin/submissions/:id
pub async fn handle_update_submission(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SubmissionUpdate>,
) -> Result<Json<Submission>, AppError> {
    let existing =
        sqlx::query_as::<_, Submission>("SELECT * FROM salary_submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))?;

    let base_salary = req.base_salary.unwrap_or(existing.base_salary);
    if base_salary <= 0 {
        return Err(AppError::Validation("Base salary must be positive".to_string()));
    }

    // A level must stay scoped to the submission's (company, job title) pair.
    let level_id = match req.level_id {
        Some(level_id) => {
            let level = sqlx::query_as::<_, Level>("SELECT * FROM levels WHERE id = $1")
                .bind(level_id)
                .fetch_optional(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Level {level_id} not found")))?;
            if level.company_id != existing.company_id
                || level.job_title_id != existing.job_title_id
            {
                return Err(AppError::Validation(
                    "Level does not belong to the submission's company and job title".to_string(),
                ));
            }
            Some(level.id)
        }
        None => existing.level_id,
    };

    let updated = sqlx::query_as::<_, Submission>(
        r#"
        UPDATE salary_submissions
        SET base_salary = $1, bonus = $2, stock = $3, level_id = $4, note = $5
        WHERE id = $6
        RETURNING *
        "#,
    )
    .bind(base_salary)
    .bind(req.bonus.or(existing.bonus))
    .bind(req.stock.or(existing.stock))
    .bind(level_id)
    .bind(req.note.or(existing.note))
    .bind(id)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(updated))
}

/// DELETE /api/v1/admin/submissions/:id
pub async fn handle_delete_submission(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_by_id(&state, "salary_submissions", id).await
}

// ---- shared ----------------------------------------------------------------

/// Table names are compile-time constants from this module, never user input.
async fn delete_by_id(state: &AppState, table: &str, id: Uuid) -> Result<StatusCode, AppError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Record {id} not found")));
    }
    info!("Admin deleted {id} from {table}");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_exists(state: &AppState, table: &str, id: Uuid) -> Result<(), AppError> {
    let exists: bool =
        sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"))
            .bind(id)
            .fetch_one(&state.db)
            .await?;
    if !exists {
        return Err(AppError::NotFound(format!("Record {id} not found")));
    }
    Ok(())
}
