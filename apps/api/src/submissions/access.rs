//! Unlock gating: a viewer may see individual submission rows if and only
//! if they own at least one submission inside the unlock window. Locked
//! viewers get redacted rows instead of an error.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::submission::SubmissionDetail;

/// When a submission's unlock grant lapses.
pub fn unlock_expiry(submitted_at: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    submitted_at + Duration::days(window_days)
}

/// Whether a viewer with the given latest owned submission is unlocked now.
pub fn is_unlocked(
    latest_submission: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window_days: i64,
) -> bool {
    match latest_submission {
        Some(submitted_at) => unlock_expiry(submitted_at, window_days) > now,
        None => false,
    }
}

/// A submission as served to a viewer. Compensation figures and the free
/// text note are withheld for locked viewers.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub company: String,
    pub company_slug: String,
    pub job_title: String,
    pub job_title_slug: String,
    pub city: String,
    pub country: String,
    pub level: Option<String>,
    pub base_salary: Option<i64>,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    pub currency: String,
    pub years_experience: i32,
    pub years_at_company: i32,
    pub note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub redacted: bool,
}

impl SubmissionView {
    pub fn from_detail(detail: SubmissionDetail, unlocked: bool) -> Self {
        let SubmissionDetail {
            id,
            company,
            company_slug,
            job_title,
            job_title_slug,
            city,
            country,
            level,
            base_salary,
            bonus,
            stock,
            currency,
            years_experience,
            years_at_company,
            note,
            submitted_at,
        } = detail;
        if unlocked {
            SubmissionView {
                id,
                company,
                company_slug,
                job_title,
                job_title_slug,
                city,
                country,
                level,
                base_salary: Some(base_salary),
                bonus,
                stock,
                currency,
                years_experience,
                years_at_company,
                note,
                submitted_at,
                redacted: false,
            }
        } else {
            SubmissionView {
                id,
                company,
                company_slug,
                job_title,
                job_title_slug,
                city,
                country,
                level,
                base_salary: None,
                bonus: None,
                stock: None,
                currency,
                years_experience,
                years_at_company,
                note: None,
                submitted_at,
                redacted: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn detail() -> SubmissionDetail {
        SubmissionDetail {
            id: Uuid::new_v4(),
            company: "Acme".to_string(),
            company_slug: "acme".to_string(),
            job_title: "Engineer".to_string(),
            job_title_slug: "engineer".to_string(),
            city: "Berlin".to_string(),
            country: "Germany".to_string(),
            level: Some("L4".to_string()),
            base_salary: 100_000,
            bonus: Some(10_000),
            stock: None,
            currency: "EUR".to_string(),
            years_experience: 8,
            years_at_company: 2,
            note: Some("includes relocation".to_string()),
            submitted_at: at(2025, 1, 1),
        }
    }

    #[test]
    fn test_no_submission_is_locked() {
        assert!(!is_unlocked(None, at(2025, 6, 1), 365));
    }

    #[test]
    fn test_recent_submission_unlocks() {
        assert!(is_unlocked(Some(at(2025, 1, 1)), at(2025, 6, 1), 365));
    }

    #[test]
    fn test_expired_submission_is_locked() {
        assert!(!is_unlocked(Some(at(2023, 1, 1)), at(2025, 6, 1), 365));
    }

    #[test]
    fn test_window_boundary_is_exclusive() {
        let submitted = at(2024, 6, 1);
        let exactly_at_expiry = unlock_expiry(submitted, 365);
        assert!(!is_unlocked(Some(submitted), exactly_at_expiry, 365));
    }

    #[test]
    fn test_unlocked_view_keeps_figures() {
        let view = SubmissionView::from_detail(detail(), true);
        assert!(!view.redacted);
        assert_eq!(view.base_salary, Some(100_000));
        assert_eq!(view.bonus, Some(10_000));
        assert!(view.note.is_some());
    }

    #[test]
    fn test_locked_view_withholds_figures() {
        let view = SubmissionView::from_detail(detail(), false);
        assert!(view.redacted);
        assert_eq!(view.base_salary, None);
        assert_eq!(view.bonus, None);
        assert_eq!(view.note, None);
        // Context fields stay visible.
        assert_eq!(view.company, "Acme");
        assert_eq!(view.level.as_deref(), Some("L4"));
    }
}
