//! Write-side SQL for the submission flow: entity resolution inside a
//! transaction, the submission insert, ownership migration, and the unlock
//! lookup.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::company::Company;
use crate::models::job_title::JobTitle;
use crate::models::level::Level;
use crate::models::location::Location;
use crate::models::submission::{Submission, SubmissionDetail};
use crate::models::user::User;
use crate::normalize::{clean, normalize_company_name, normalize_title, slugify};

/// Resolves a company by normalized name, creating it if missing.
pub async fn get_or_create_company(
    tx: &mut Transaction<'_, Postgres>,
    raw_name: &str,
) -> Result<Company, sqlx::Error> {
    let name = normalize_company_name(raw_name);
    let slug = slugify(&name);
    if let Some(existing) =
        sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&mut **tx)
            .await?
    {
        return Ok(existing);
    }
    let inserted = sqlx::query_as::<_, Company>(
        "INSERT INTO companies (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING RETURNING *",
    )
    .bind(&name)
    .bind(&slug)
    .fetch_optional(&mut **tx)
    .await?;
    match inserted {
        Some(company) => Ok(company),
        // Lost a racing insert; the row exists now.
        None => {
            sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE slug = $1")
                .bind(&slug)
                .fetch_one(&mut **tx)
                .await
        }
    }
}

/// Resolves a job title by normalized title, creating it if missing.
pub async fn get_or_create_title(
    tx: &mut Transaction<'_, Postgres>,
    raw_title: &str,
) -> Result<JobTitle, sqlx::Error> {
    let title = normalize_title(raw_title);
    let slug = slugify(&title);
    if let Some(existing) =
        sqlx::query_as::<_, JobTitle>("SELECT * FROM job_titles WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&mut **tx)
            .await?
    {
        return Ok(existing);
    }
    let inserted = sqlx::query_as::<_, JobTitle>(
        "INSERT INTO job_titles (title, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING RETURNING *",
    )
    .bind(&title)
    .bind(&slug)
    .fetch_optional(&mut **tx)
    .await?;
    match inserted {
        Some(job_title) => Ok(job_title),
        None => {
            sqlx::query_as::<_, JobTitle>("SELECT * FROM job_titles WHERE slug = $1")
                .bind(&slug)
                .fetch_one(&mut **tx)
                .await
        }
    }
}

/// Slug for a location from its cleaned parts.
pub fn location_slug(city: &str, region: Option<&str>, country: &str) -> String {
    match region {
        Some(region) if !region.trim().is_empty() => {
            slugify(&format!("{city} {region} {country}"))
        }
        _ => slugify(&format!("{city} {country}")),
    }
}

pub async fn get_or_create_location(
    tx: &mut Transaction<'_, Postgres>,
    city: &str,
    region: Option<&str>,
    country: &str,
) -> Result<Location, sqlx::Error> {
    let city = clean(city);
    let region = region.map(clean).filter(|r| !r.is_empty());
    let country = clean(country);
    let slug = location_slug(&city, region.as_deref(), &country);
    if let Some(existing) =
        sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE slug = $1")
            .bind(&slug)
            .fetch_optional(&mut **tx)
            .await?
    {
        return Ok(existing);
    }
    let inserted = sqlx::query_as::<_, Location>(
        r#"
        INSERT INTO locations (city, region, country, slug)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(&city)
    .bind(&region)
    .bind(&country)
    .bind(&slug)
    .fetch_optional(&mut **tx)
    .await?;
    match inserted {
        Some(location) => Ok(location),
        None => {
            sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE slug = $1")
                .bind(&slug)
                .fetch_one(&mut **tx)
                .await
        }
    }
}

/// Resolves a level scoped to a (company, job title) pair, creating it if
/// missing. Racing inserts resolve through the UNIQUE constraint.
pub async fn get_or_create_level(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
    job_title_id: Uuid,
    raw_name: &str,
) -> Result<Level, sqlx::Error> {
    let name = clean(raw_name);
    if let Some(existing) = sqlx::query_as::<_, Level>(
        "SELECT * FROM levels WHERE company_id = $1 AND job_title_id = $2 AND name = $3",
    )
    .bind(company_id)
    .bind(job_title_id)
    .bind(&name)
    .fetch_optional(&mut **tx)
    .await?
    {
        return Ok(existing);
    }
    let inserted = sqlx::query_as::<_, Level>(
        r#"
        INSERT INTO levels (company_id, job_title_id, name)
        VALUES ($1, $2, $3)
        ON CONFLICT (company_id, job_title_id, name) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(company_id)
    .bind(job_title_id)
    .bind(&name)
    .fetch_optional(&mut **tx)
    .await?;
    match inserted {
        Some(level) => Ok(level),
        None => {
            sqlx::query_as::<_, Level>(
                "SELECT * FROM levels WHERE company_id = $1 AND job_title_id = $2 AND name = $3",
            )
            .bind(company_id)
            .bind(job_title_id)
            .bind(&name)
            .fetch_one(&mut **tx)
            .await
        }
    }
}

/// Parameters for inserting a submission. Exactly one of `user_id` and
/// `anon_token_hash` is set at creation time.
pub struct NewSubmission<'a> {
    pub company_id: Uuid,
    pub job_title_id: Uuid,
    pub location_id: Uuid,
    pub level_id: Option<Uuid>,
    pub base_salary: i64,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    pub currency: &'a str,
    pub years_experience: i32,
    pub years_at_company: i32,
    pub note: Option<&'a str>,
    pub user_id: Option<Uuid>,
    pub anon_token_hash: Option<&'a str>,
}

pub async fn insert_submission(
    tx: &mut Transaction<'_, Postgres>,
    params: NewSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(
        r#"
        INSERT INTO salary_submissions
            (company_id, job_title_id, location_id, level_id,
             base_salary, bonus, stock, currency,
             years_experience, years_at_company, note, user_id, anon_token_hash)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(params.company_id)
    .bind(params.job_title_id)
    .bind(params.location_id)
    .bind(params.level_id)
    .bind(params.base_salary)
    .bind(params.bonus)
    .bind(params.stock)
    .bind(params.currency)
    .bind(params.years_experience)
    .bind(params.years_at_company)
    .bind(params.note)
    .bind(params.user_id)
    .bind(params.anon_token_hash)
    .fetch_one(&mut **tx)
    .await
}

/// Moves anonymous submissions matching the token hash to the user.
/// The `user_id IS NULL` guard makes the migration at-most-once: a second
/// claim with the same token matches zero rows.
pub async fn migrate_anonymous(
    pool: &PgPool,
    user_id: Uuid,
    token_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE salary_submissions
        SET user_id = $1, anon_token_hash = NULL
        WHERE anon_token_hash = $2 AND user_id IS NULL
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Most recent submission owned by the viewer, by user id or token hash.
pub async fn latest_owned_submission(
    pool: &PgPool,
    user_id: Option<Uuid>,
    token_hash: Option<&str>,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        r#"
        SELECT MAX(submitted_at)
        FROM salary_submissions
        WHERE ($1::uuid IS NOT NULL AND user_id = $1)
           OR ($2::text IS NOT NULL AND anon_token_hash = $2)
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .fetch_one(pool)
    .await
}

pub async fn list_by_owner(
    pool: &PgPool,
    user_id: Option<Uuid>,
    token_hash: Option<&str>,
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
        WHERE ($1::uuid IS NOT NULL AND s.user_id = $1)
           OR ($2::text IS NOT NULL AND s.anon_token_hash = $2)
        ORDER BY s.submitted_at DESC
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .fetch_all(pool)
    .await
}

/// Upserts a user row at sign-in, keyed by the identity provider's id.
pub async fn get_or_create_user(
    pool: &PgPool,
    external_id: &str,
    email: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (external_id, email)
        VALUES ($1, $2)
        ON CONFLICT (external_id) DO UPDATE SET email = EXCLUDED.email
        RETURNING *
        "#,
    )
    .bind(external_id)
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn user_exists(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Existing level for a (company, title) pair by name, for preview.
pub async fn find_level(
    pool: &PgPool,
    company_id: Uuid,
    job_title_id: Uuid,
    name: &str,
) -> Result<Option<Level>, sqlx::Error> {
    sqlx::query_as::<_, Level>(
        "SELECT * FROM levels WHERE company_id = $1 AND job_title_id = $2 AND name = $3",
    )
    .bind(company_id)
    .bind(job_title_id)
    .bind(name)
    .fetch_optional(pool)
    .await
}

/// All company display names, for the near-duplicate advisory at preview.
pub async fn all_company_names(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT name FROM companies ORDER BY name")
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_slug_with_region() {
        assert_eq!(
            location_slug("San Francisco", Some("CA"), "USA"),
            "san-francisco-ca-usa"
        );
    }

    #[test]
    fn test_location_slug_without_region() {
        assert_eq!(location_slug("Berlin", None, "Germany"), "berlin-germany");
    }

    #[test]
    fn test_location_slug_blank_region() {
        assert_eq!(location_slug("Berlin", Some("  "), "Germany"), "berlin-germany");
    }
}
