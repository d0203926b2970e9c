//! Read-side SQL for the browse endpoints. Aggregation happens in
//! `browse::stats` over the sampled rows returned here.

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::browse::stats::Sample;
use crate::models::company::Company;
use crate::models::job_title::JobTitle;
use crate::models::location::Location;
use crate::models::submission::SubmissionDetail;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanySummaryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_key: Option<String>,
    pub submission_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IndustrySummaryRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub title_count: i64,
    pub submission_count: i64,
}

pub async fn list_titles(
    pool: &PgPool,
    industry_slug: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<JobTitle>, sqlx::Error> {
    match industry_slug {
        Some(slug) => {
            sqlx::query_as::<_, JobTitle>(
                r#"
                SELECT t.* FROM job_titles t
                JOIN industries i ON i.id = t.industry_id
                WHERE i.slug = $1
                ORDER BY t.title
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(slug)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, JobTitle>(
                "SELECT * FROM job_titles ORDER BY title LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn get_title_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<JobTitle>, sqlx::Error> {
    sqlx::query_as::<_, JobTitle>("SELECT * FROM job_titles WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn get_company_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Company>, sqlx::Error> {
    sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn get_location_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Location>, sqlx::Error> {
    sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn list_companies_with_counts(
    pool: &PgPool,
) -> Result<Vec<CompanySummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, CompanySummaryRow>(
        r#"
        SELECT c.id, c.name, c.slug, c.logo_key, COUNT(s.id) AS submission_count
        FROM companies c
        LEFT JOIN salary_submissions s ON s.company_id = c.id
        GROUP BY c.id, c.name, c.slug, c.logo_key
        ORDER BY submission_count DESC, c.name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn list_industries_with_counts(
    pool: &PgPool,
) -> Result<Vec<IndustrySummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, IndustrySummaryRow>(
        r#"
        SELECT i.id, i.name, i.slug,
               COUNT(DISTINCT t.id) AS title_count,
               COUNT(s.id) AS submission_count
        FROM industries i
        LEFT JOIN job_titles t ON t.industry_id = i.id
        LEFT JOIN salary_submissions s ON s.job_title_id = t.id
        GROUP BY i.id, i.name, i.slug
        ORDER BY i.name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn samples_for_title(
    pool: &PgPool,
    title_id: Uuid,
) -> Result<Vec<Sample>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, Option<i64>, Option<i64>)>(
        "SELECT base_salary, bonus, stock FROM salary_submissions WHERE job_title_id = $1",
    )
    .bind(title_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(base, bonus, stock)| Sample { base, bonus, stock })
        .collect())
}

/// Samples for a page of titles at once, keyed by title id.
pub async fn samples_for_titles(
    pool: &PgPool,
    title_ids: &[Uuid],
) -> Result<Vec<(Uuid, Sample)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, i64, Option<i64>, Option<i64>)>(
        r#"
        SELECT job_title_id, base_salary, bonus, stock
        FROM salary_submissions
        WHERE job_title_id = ANY($1)
        "#,
    )
    .bind(title_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, base, bonus, stock)| (id, Sample { base, bonus, stock }))
        .collect())
}

/// Samples for one title, keyed by company (id, name, slug).
pub async fn samples_by_company_for_title(
    pool: &PgPool,
    title_id: Uuid,
) -> Result<Vec<(Uuid, String, String, Sample)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, i64, Option<i64>, Option<i64>)>(
        r#"
        SELECT c.id, c.name, c.slug, s.base_salary, s.bonus, s.stock
        FROM salary_submissions s
        JOIN companies c ON c.id = s.company_id
        WHERE s.job_title_id = $1
        "#,
    )
    .bind(title_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, name, slug, base, bonus, stock)| {
            (id, name, slug, Sample { base, bonus, stock })
        })
        .collect())
}

/// Samples for one company, keyed by job title (id, title, slug).
pub async fn samples_by_title_for_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<(Uuid, String, String, Sample)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, i64, Option<i64>, Option<i64>)>(
        r#"
        SELECT t.id, t.title, t.slug, s.base_salary, s.bonus, s.stock
        FROM salary_submissions s
        JOIN job_titles t ON t.id = s.job_title_id
        WHERE s.company_id = $1
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, title, slug, base, bonus, stock)| {
            (id, title, slug, Sample { base, bonus, stock })
        })
        .collect())
}

/// Samples at one location, keyed by job title (id, title, slug).
pub async fn samples_by_title_for_location(
    pool: &PgPool,
    location_id: Uuid,
) -> Result<Vec<(Uuid, String, String, Sample)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, i64, Option<i64>, Option<i64>)>(
        r#"
        SELECT t.id, t.title, t.slug, s.base_salary, s.bonus, s.stock
        FROM salary_submissions s
        JOIN job_titles t ON t.id = s.job_title_id
        WHERE s.location_id = $1
        "#,
    )
    .bind(location_id)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|(id, title, slug, base, bonus, stock)| {
            (id, title, slug, Sample { base, bonus, stock })
        })
        .collect())
}

/// Level names per job title at a company, ordered for display.
pub async fn levels_for_company(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<Vec<(String, String)>, sqlx::Error> {
    sqlx::query_as::<_, (String, String)>(
        r#"
        SELECT t.title, lv.name
        FROM levels lv
        JOIN job_titles t ON t.id = lv.job_title_id
        WHERE lv.company_id = $1
        ORDER BY t.title, lv.name
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn recent_submissions_for_title(
    pool: &PgPool,
    title_id: Uuid,
    limit: i64,
) -> Result<Vec<SubmissionDetail>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionDetail>(
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
        WHERE s.job_title_id = $1
        ORDER BY s.submitted_at DESC
        LIMIT $2
        "#,
    )
    .bind(title_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Typeahead candidates, capped per entity; ranking happens in `search`.
pub async fn search_candidates(
    pool: &PgPool,
    pattern: &str,
) -> Result<SearchCandidates, sqlx::Error> {
    let companies = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, name, slug FROM companies WHERE name ILIKE $1 ORDER BY name LIMIT 25",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    let titles = sqlx::query_as::<_, (Uuid, String, String)>(
        "SELECT id, title, slug FROM job_titles WHERE title ILIKE $1 ORDER BY title LIMIT 25",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    let locations = sqlx::query_as::<_, (Uuid, String, String)>(
        r#"
        SELECT id, city || ', ' || country, slug
        FROM locations
        WHERE city ILIKE $1 OR country ILIKE $1
        ORDER BY city
        LIMIT 25
        "#,
    )
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(SearchCandidates {
        companies,
        titles,
        locations,
    })
}

pub struct SearchCandidates {
    pub companies: Vec<(Uuid, String, String)>,
    pub titles: Vec<(Uuid, String, String)>,
    pub locations: Vec<(Uuid, String, String)>,
}
