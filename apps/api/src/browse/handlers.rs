use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::admin::logos::public_logo_url;
use crate::browse::cache::title_stats_key;
use crate::browse::queries;
use crate::browse::search::{ilike_pattern, rank_matches, SearchHit, SearchKind, MIN_QUERY_LEN};
use crate::browse::stats::{compute_stats, CompStats, Sample};
use crate::errors::AppError;
use crate::state::AppState;
use crate::submissions::access::SubmissionView;
use crate::submissions::handlers::{viewer_unlocked, OwnerQuery};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;
const RECENT_SUBMISSIONS_LIMIT: i64 = 25;

/// Clamps client-supplied pagination to sane bounds.
fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

#[derive(Deserialize)]
pub struct TitlesQuery {
    pub industry: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize)]
pub struct TitleSummary {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub stats: CompStats,
}

/// GET /api/v1/titles
pub async fn handle_list_titles(
    State(state): State<AppState>,
    Query(params): Query<TitlesQuery>,
) -> Result<Json<Vec<TitleSummary>>, AppError> {
    let (limit, offset) = page_bounds(params.limit, params.offset);
    let titles = queries::list_titles(&state.db, params.industry.as_deref(), limit, offset).await?;

    let ids: Vec<Uuid> = titles.iter().map(|t| t.id).collect();
    let mut samples: BTreeMap<Uuid, Vec<Sample>> = BTreeMap::new();
    for (id, sample) in queries::samples_for_titles(&state.db, &ids).await? {
        samples.entry(id).or_default().push(sample);
    }

    let min_group = state.config.min_group_size;
    let summaries = titles
        .into_iter()
        .map(|t| {
            let group = samples.remove(&t.id).unwrap_or_default();
            TitleSummary {
                id: t.id,
                title: t.title,
                slug: t.slug,
                stats: compute_stats(&group, min_group),
            }
        })
        .collect();
    Ok(Json(summaries))
}

/// A grouped aggregate row (per company or per title).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatsRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub stats: CompStats,
}

fn group_stats(
    rows: Vec<(Uuid, String, String, Sample)>,
    min_group_size: usize,
) -> Vec<GroupStatsRow> {
    let mut groups: BTreeMap<Uuid, (String, String, Vec<Sample>)> = BTreeMap::new();
    for (id, name, slug, sample) in rows {
        groups
            .entry(id)
            .or_insert_with(|| (name, slug, Vec::new()))
            .2
            .push(sample);
    }
    let mut out: Vec<GroupStatsRow> = groups
        .into_iter()
        .map(|(id, (name, slug, samples))| GroupStatsRow {
            id,
            name,
            slug,
            stats: compute_stats(&samples, min_group_size),
        })
        .collect();
    out.sort_by(|a, b| b.stats.count.cmp(&a.stats.count).then_with(|| a.name.cmp(&b.name)));
    out
}

/// The cacheable part of a title detail page (viewer-independent).
#[derive(Serialize, Deserialize)]
struct TitleStatsPayload {
    stats: CompStats,
    by_company: Vec<GroupStatsRow>,
}

#[derive(Serialize)]
pub struct TitleDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub stats: CompStats,
    pub by_company: Vec<GroupStatsRow>,
    pub recent: Vec<SubmissionView>,
}

/// GET /api/v1/titles/:slug
pub async fn handle_get_title(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(viewer): Query<OwnerQuery>,
) -> Result<Json<TitleDetailResponse>, AppError> {
    let title = queries::get_title_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job title '{slug}' not found")))?;

    let cache_key = title_stats_key(&title.slug);
    let payload = match state.cache.get(&cache_key).await {
        Some(cached) => match serde_json::from_str::<TitleStatsPayload>(&cached) {
            Ok(payload) => payload,
            Err(e) => {
                debug!("Discarding malformed cached stats for {cache_key}: {e}");
                build_title_stats(&state, title.id).await?
            }
        },
        None => {
            let payload = build_title_stats(&state, title.id).await?;
            if let Ok(serialized) = serde_json::to_string(&payload) {
                state.cache.put(&cache_key, &serialized).await;
            }
            payload
        }
    };

    let unlocked = viewer_unlocked(&state, viewer.user_id, viewer.token.as_deref()).await?;
    let recent = queries::recent_submissions_for_title(&state.db, title.id, RECENT_SUBMISSIONS_LIMIT)
        .await?
        .into_iter()
        .map(|d| SubmissionView::from_detail(d, unlocked))
        .collect();

    Ok(Json(TitleDetailResponse {
        id: title.id,
        title: title.title,
        slug: title.slug,
        stats: payload.stats,
        by_company: payload.by_company,
        recent,
    }))
}

async fn build_title_stats(state: &AppState, title_id: Uuid) -> Result<TitleStatsPayload, AppError> {
    let min_group = state.config.min_group_size;
    let samples = queries::samples_for_title(&state.db, title_id).await?;
    let by_company = queries::samples_by_company_for_title(&state.db, title_id).await?;
    Ok(TitleStatsPayload {
        stats: compute_stats(&samples, min_group),
        by_company: group_stats(by_company, min_group),
    })
}

#[derive(Serialize)]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub submission_count: i64,
}

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanySummary>>, AppError> {
    let rows = queries::list_companies_with_counts(&state.db).await?;
    let summaries = rows
        .into_iter()
        .map(|r| CompanySummary {
            id: r.id,
            name: r.name,
            slug: r.slug,
            logo_url: r.logo_key.as_deref().map(|k| public_logo_url(&state.config, k)),
            submission_count: r.submission_count,
        })
        .collect();
    Ok(Json(summaries))
}

#[derive(Serialize)]
pub struct CompanyDetailResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub by_title: Vec<GroupStatsRow>,
    /// Level names per job title, for the levels table on the company page.
    pub levels: BTreeMap<String, Vec<String>>,
}

/// GET /api/v1/companies/:slug
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CompanyDetailResponse>, AppError> {
    let company = queries::get_company_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company '{slug}' not found")))?;

    let by_title = group_stats(
        queries::samples_by_title_for_company(&state.db, company.id).await?,
        state.config.min_group_size,
    );

    let mut levels: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (title, level) in queries::levels_for_company(&state.db, company.id).await? {
        levels.entry(title).or_default().push(level);
    }

    Ok(Json(CompanyDetailResponse {
        id: company.id,
        name: company.name,
        slug: company.slug,
        website: company.website,
        logo_url: company
            .logo_key
            .as_deref()
            .map(|k| public_logo_url(&state.config, k)),
        by_title,
        levels,
    }))
}

#[derive(Serialize)]
pub struct LocationDetailResponse {
    pub id: Uuid,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub slug: String,
    pub by_title: Vec<GroupStatsRow>,
}

/// GET /api/v1/locations/:slug
pub async fn handle_get_location(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<LocationDetailResponse>, AppError> {
    let location = queries::get_location_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location '{slug}' not found")))?;

    let by_title = group_stats(
        queries::samples_by_title_for_location(&state.db, location.id).await?,
        state.config.min_group_size,
    );

    Ok(Json(LocationDetailResponse {
        id: location.id,
        city: location.city,
        region: location.region,
        country: location.country,
        slug: location.slug,
        by_title,
    }))
}

/// GET /api/v1/industries
pub async fn handle_list_industries(
    State(state): State<AppState>,
) -> Result<Json<Vec<queries::IndustrySummaryRow>>, AppError> {
    Ok(Json(queries::list_industries_with_counts(&state.db).await?))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/v1/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, AppError> {
    let q = params.q.trim();
    if q.chars().count() < MIN_QUERY_LEN {
        return Ok(Json(Vec::new()));
    }

    let candidates = queries::search_candidates(&state.db, &ilike_pattern(q)).await?;
    let mut hits = Vec::new();
    for (id, name, slug) in candidates.companies {
        hits.push(SearchHit {
            kind: SearchKind::Company,
            id,
            name,
            slug,
        });
    }
    for (id, name, slug) in candidates.titles {
        hits.push(SearchHit {
            kind: SearchKind::JobTitle,
            id,
            name,
            slug,
        });
    }
    for (id, name, slug) in candidates.locations {
        hits.push(SearchHit {
            kind: SearchKind::Location,
            id,
            name,
            slug,
        });
    }

    Ok(Json(rank_matches(q, hits)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_defaults() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
    }

    #[test]
    fn test_page_bounds_clamps_limit() {
        assert_eq!(page_bounds(Some(10_000), None), (MAX_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(0), None), (1, 0));
    }

    #[test]
    fn test_page_bounds_rejects_negative_offset() {
        assert_eq!(page_bounds(Some(20), Some(-5)), (20, 0));
    }

    #[test]
    fn test_group_stats_groups_and_sorts() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let sample = |base| Sample {
            base,
            bonus: None,
            stock: None,
        };
        let rows = vec![
            (a, "Acme".to_string(), "acme".to_string(), sample(100)),
            (b, "Globex".to_string(), "globex".to_string(), sample(200)),
            (b, "Globex".to_string(), "globex".to_string(), sample(300)),
        ];
        let grouped = group_stats(rows, 1);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].name, "Globex");
        assert_eq!(grouped[0].stats.count, 2);
        assert_eq!(grouped[1].stats.count, 1);
    }
}
