//! Offline re-normalization of job-title and company text data.
//!
//! Dry-run by default: reports the rows that would change. With `--apply`,
//! renames rows in place; a rename that collides with an existing row
//! merges the duplicate into it (submissions re-pointed, levels re-scoped)
//! inside one transaction per rename.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use api::normalize::companies::near_duplicates;
use api::normalize::{normalize_company_name, normalize_title, slugify};

#[derive(Parser)]
#[command(name = "normalize", about = "Re-normalize job-title and company text data")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Re-normalize job titles, merging rows that collide after renaming
    Titles {
        #[arg(long)]
        apply: bool,
    },
    /// Re-normalize company names; exact-normalized duplicates are merged,
    /// near duplicates are reported for manual review
    Companies {
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Debug, PartialEq)]
struct RenamePlan {
    id: Uuid,
    from: String,
    to: String,
}

/// Rows whose normalized form differs from the stored one.
fn plan_renames(rows: &[(Uuid, String)], normalize: impl Fn(&str) -> String) -> Vec<RenamePlan> {
    rows.iter()
        .filter_map(|(id, name)| {
            let to = normalize(name);
            (!to.is_empty() && to != *name).then(|| RenamePlan {
                id: *id,
                from: name.clone(),
                to,
            })
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let pool = api::db::create_pool(&args.database_url).await?;

    match args.command {
        Command::Titles { apply } => normalize_titles(&pool, apply).await,
        Command::Companies { apply } => normalize_companies(&pool, apply).await,
    }
}

async fn normalize_titles(pool: &PgPool, apply: bool) -> Result<()> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, title FROM job_titles ORDER BY title")
            .fetch_all(pool)
            .await?;
    let plan = plan_renames(&rows, normalize_title);

    for rename in &plan {
        info!("title: '{}' -> '{}'", rename.from, rename.to);
    }
    if !apply {
        info!("{} of {} titles would change (dry run; pass --apply)", plan.len(), rows.len());
        return Ok(());
    }

    let mut renamed = 0usize;
    let mut merged = 0usize;
    for rename in &plan {
        let mut tx = pool.begin().await?;
        let target: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM job_titles WHERE slug = $1 AND id <> $2")
                .bind(slugify(&rename.to))
                .bind(rename.id)
                .fetch_optional(&mut *tx)
                .await?;
        match target {
            None => {
                sqlx::query("UPDATE job_titles SET title = $1, slug = $2 WHERE id = $3")
                    .bind(&rename.to)
                    .bind(slugify(&rename.to))
                    .bind(rename.id)
                    .execute(&mut *tx)
                    .await?;
                renamed += 1;
            }
            Some((target_id,)) => {
                merge_title(&mut tx, rename.id, target_id).await?;
                info!("merged duplicate title '{}' into '{}'", rename.from, rename.to);
                merged += 1;
            }
        }
        tx.commit().await?;
    }

    info!("Normalized job titles: {renamed} renamed, {merged} merged");
    Ok(())
}

/// Folds the duplicate title into the target: levels first (moving
/// non-conflicting rows, re-pointing submissions off conflicting ones),
/// then submissions, then the duplicate row itself.
async fn merge_title(
    tx: &mut Transaction<'_, Postgres>,
    dupe_id: Uuid,
    target_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE levels SET job_title_id = $2
        WHERE job_title_id = $1
          AND NOT EXISTS (
              SELECT 1 FROM levels l2
              WHERE l2.company_id = levels.company_id
                AND l2.job_title_id = $2
                AND l2.name = levels.name
          )
        "#,
    )
    .bind(dupe_id)
    .bind(target_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE salary_submissions s
        SET level_id = l2.id
        FROM levels l, levels l2
        WHERE s.level_id = l.id
          AND l.job_title_id = $1
          AND l2.company_id = l.company_id
          AND l2.job_title_id = $2
          AND l2.name = l.name
        "#,
    )
    .bind(dupe_id)
    .bind(target_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM levels WHERE job_title_id = $1")
        .bind(dupe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("UPDATE salary_submissions SET job_title_id = $2 WHERE job_title_id = $1")
        .bind(dupe_id)
        .bind(target_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM job_titles WHERE id = $1")
        .bind(dupe_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

async fn normalize_companies(pool: &PgPool, apply: bool) -> Result<()> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, name FROM companies ORDER BY name")
            .fetch_all(pool)
            .await?;
    let plan = plan_renames(&rows, normalize_company_name);

    for rename in &plan {
        info!("company: '{}' -> '{}'", rename.from, rename.to);
    }

    if apply {
        let mut renamed = 0usize;
        let mut merged = 0usize;
        for rename in &plan {
            let mut tx = pool.begin().await?;
            let target: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM companies WHERE slug = $1 AND id <> $2")
                    .bind(slugify(&rename.to))
                    .bind(rename.id)
                    .fetch_optional(&mut *tx)
                    .await?;
            match target {
                None => {
                    sqlx::query("UPDATE companies SET name = $1, slug = $2 WHERE id = $3")
                        .bind(&rename.to)
                        .bind(slugify(&rename.to))
                        .bind(rename.id)
                        .execute(&mut *tx)
                        .await?;
                    renamed += 1;
                }
                Some((target_id,)) => {
                    merge_company(&mut tx, rename.id, target_id).await?;
                    info!("merged duplicate company '{}' into '{}'", rename.from, rename.to);
                    merged += 1;
                }
            }
            tx.commit().await?;
        }
        info!("Normalized companies: {renamed} renamed, {merged} merged");
    } else {
        info!("{} of {} companies would change (dry run; pass --apply)", plan.len(), rows.len());
    }

    // Near duplicates are never merged automatically.
    let names: Vec<String> = sqlx::query_scalar("SELECT name FROM companies ORDER BY name")
        .fetch_all(pool)
        .await?;
    for (a, b, similarity) in near_duplicates(&names) {
        warn!("possible duplicate companies: '{a}' / '{b}' ({similarity:.2}) — review manually");
    }

    Ok(())
}

async fn merge_company(
    tx: &mut Transaction<'_, Postgres>,
    dupe_id: Uuid,
    target_id: Uuid,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE levels SET company_id = $2
        WHERE company_id = $1
          AND NOT EXISTS (
              SELECT 1 FROM levels l2
              WHERE l2.company_id = $2
                AND l2.job_title_id = levels.job_title_id
                AND l2.name = levels.name
          )
        "#,
    )
    .bind(dupe_id)
    .bind(target_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE salary_submissions s
        SET level_id = l2.id
        FROM levels l, levels l2
        WHERE s.level_id = l.id
          AND l.company_id = $1
          AND l2.job_title_id = l.job_title_id
          AND l2.company_id = $2
          AND l2.name = l.name
        "#,
    )
    .bind(dupe_id)
    .bind(target_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM levels WHERE company_id = $1")
        .bind(dupe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("UPDATE salary_submissions SET company_id = $2 WHERE company_id = $1")
        .bind(dupe_id)
        .bind(target_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM companies WHERE id = $1")
        .bind(dupe_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_skips_already_normalized() {
        let rows = vec![(Uuid::new_v4(), "Senior Software Engineer".to_string())];
        assert!(plan_renames(&rows, normalize_title).is_empty());
    }

    #[test]
    fn test_plan_picks_up_abbreviations() {
        let id = Uuid::new_v4();
        let rows = vec![(id, "sr software eng".to_string())];
        let plan = plan_renames(&rows, normalize_title);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].id, id);
        assert_eq!(plan[0].to, "Senior Software Engineer");
    }

    #[test]
    fn test_plan_companies_strips_suffixes() {
        let rows = vec![
            (Uuid::new_v4(), "Acme".to_string()),
            (Uuid::new_v4(), "Globex LLC".to_string()),
        ];
        let plan = plan_renames(&rows, normalize_company_name);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].from, "Globex LLC");
        assert_eq!(plan[0].to, "Globex");
    }

    #[test]
    fn test_plan_leaves_single_token_suffix_names_alone() {
        // A company literally named "LLC" has no preceding token to keep.
        let rows = vec![(Uuid::new_v4(), "LLC".to_string())];
        assert!(plan_renames(&rows, normalize_company_name).is_empty());
    }
}
