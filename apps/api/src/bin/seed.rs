//! Offline seeding: loads a JSON fixture of industries, companies, job
//! titles, and locations. Existing rows are left untouched
//! (`ON CONFLICT DO NOTHING`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::normalize::{clean, normalize_company_name, normalize_title, slugify};
use api::submissions::queries::location_slug;

#[derive(Parser)]
#[command(name = "seed", about = "Load catalog fixtures into the database")]
struct Args {
    /// JSON fixture file
    #[arg(long)]
    file: PathBuf,

    /// Parse and report without writing
    #[arg(long)]
    dry_run: bool,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    industries: Vec<IndustrySeed>,
    #[serde(default)]
    companies: Vec<CompanySeed>,
    #[serde(default)]
    job_titles: Vec<TitleSeed>,
    #[serde(default)]
    locations: Vec<LocationSeed>,
}

#[derive(Debug, Deserialize)]
struct IndustrySeed {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CompanySeed {
    name: String,
    website: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TitleSeed {
    title: String,
    /// Industry name; the title is linked if the industry exists.
    industry: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationSeed {
    city: String,
    region: Option<String>,
    country: String,
}

fn load_seed_file(path: &Path) -> Result<SeedFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read seed file {}", path.display()))?;
    parse_seed_file(&raw)
}

fn parse_seed_file(raw: &str) -> Result<SeedFile> {
    let seed: SeedFile = serde_json::from_str(raw).context("Seed file is not valid JSON")?;
    for industry in &seed.industries {
        if clean(&industry.name).is_empty() {
            bail!("Seed file contains an industry with an empty name");
        }
    }
    for company in &seed.companies {
        if clean(&company.name).is_empty() {
            bail!("Seed file contains a company with an empty name");
        }
    }
    for title in &seed.job_titles {
        if clean(&title.title).is_empty() {
            bail!("Seed file contains a job title with an empty title");
        }
    }
    for location in &seed.locations {
        if clean(&location.city).is_empty() || clean(&location.country).is_empty() {
            bail!("Seed file contains a location without a city or country");
        }
    }
    Ok(seed)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let seed = load_seed_file(&args.file)?;
    info!(
        "Loaded fixture: {} industries, {} companies, {} job titles, {} locations",
        seed.industries.len(),
        seed.companies.len(),
        seed.job_titles.len(),
        seed.locations.len()
    );

    if args.dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    let pool = api::db::create_pool(&args.database_url).await?;
    seed_all(&pool, &seed).await?;
    Ok(())
}

async fn seed_all(pool: &PgPool, seed: &SeedFile) -> Result<()> {
    let mut created = 0u64;
    let mut skipped = 0u64;

    for industry in &seed.industries {
        let name = clean(&industry.name);
        let rows = sqlx::query(
            "INSERT INTO industries (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(&name)
        .bind(slugify(&name))
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut created, &mut skipped, rows);
    }

    for company in &seed.companies {
        let name = normalize_company_name(&company.name);
        let rows = sqlx::query(
            "INSERT INTO companies (name, slug, website) VALUES ($1, $2, $3) ON CONFLICT (slug) DO NOTHING",
        )
        .bind(&name)
        .bind(slugify(&name))
        .bind(&company.website)
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut created, &mut skipped, rows);
    }

    for title in &seed.job_titles {
        let name = normalize_title(&title.title);
        let industry_slug = title.industry.as_deref().map(slugify);
        let rows = sqlx::query(
            r#"
            INSERT INTO job_titles (title, slug, industry_id)
            VALUES ($1, $2, (SELECT id FROM industries WHERE slug = $3))
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(&name)
        .bind(slugify(&name))
        .bind(&industry_slug)
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut created, &mut skipped, rows);
    }

    for location in &seed.locations {
        let city = clean(&location.city);
        let region = location.region.as_deref().map(clean).filter(|r| !r.is_empty());
        let country = clean(&location.country);
        let rows = sqlx::query(
            r#"
            INSERT INTO locations (city, region, country, slug)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(&city)
        .bind(&region)
        .bind(&country)
        .bind(location_slug(&city, region.as_deref(), &country))
        .execute(pool)
        .await?
        .rows_affected();
        tally(&mut created, &mut skipped, rows);
    }

    info!("Seed complete: {created} created, {skipped} already present");
    Ok(())
}

fn tally(created: &mut u64, skipped: &mut u64, rows_affected: u64) {
    if rows_affected > 0 {
        *created += rows_affected;
    } else {
        *skipped += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "industries": [{"name": "Technology"}],
        "companies": [{"name": "Acme Inc.", "website": "https://acme.example"}],
        "job_titles": [{"title": "sr software eng", "industry": "Technology"}],
        "locations": [{"city": "Berlin", "country": "Germany"}]
    }"#;

    #[test]
    fn test_parse_full_fixture() {
        let seed = parse_seed_file(FIXTURE).unwrap();
        assert_eq!(seed.industries.len(), 1);
        assert_eq!(seed.companies.len(), 1);
        assert_eq!(seed.job_titles[0].industry.as_deref(), Some("Technology"));
        assert_eq!(seed.locations[0].region, None);
    }

    #[test]
    fn test_parse_rejects_empty_names() {
        let raw = r#"{"companies": [{"name": "   "}]}"#;
        assert!(parse_seed_file(raw).is_err());
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_seed_file("not json").is_err());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed = parse_seed_file("{}").unwrap();
        assert!(seed.industries.is_empty());
        assert!(seed.locations.is_empty());
    }

    #[test]
    fn test_load_seed_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();
        let seed = load_seed_file(file.path()).unwrap();
        assert_eq!(seed.companies[0].name, "Acme Inc.");
    }

    #[test]
    fn test_load_seed_file_missing_path() {
        assert!(load_seed_file(Path::new("/nonexistent/seed.json")).is_err());
    }
}
