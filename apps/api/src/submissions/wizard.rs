//! Server-side validation for the multi-step submission wizard. Each step
//! validates independently; the full draft re-validates everything at
//! preview and submit time.

use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 200;
const MAX_LEVEL_LEN: usize = 50;
const MAX_NOTE_LEN: usize = 2000;
const MAX_BASE_SALARY: i64 = 100_000_000;
const MAX_YEARS: i32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleStep {
    pub company: String,
    pub job_title: String,
    pub level: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationStep {
    pub base_salary: i64,
    pub bonus: Option<i64>,
    pub stock: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundStep {
    pub years_experience: i32,
    pub years_at_company: i32,
    pub city: String,
    pub region: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionDraft {
    pub role: RoleStep,
    pub compensation: CompensationStep,
    pub background: BackgroundStep,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Role,
    Compensation,
    Background,
}

impl std::str::FromStr for WizardStep {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role" => Ok(WizardStep::Role),
            "compensation" => Ok(WizardStep::Compensation),
            "background" => Ok(WizardStep::Background),
            _ => Err(()),
        }
    }
}

pub fn validate_role(step: &RoleStep) -> Vec<FieldError> {
    let mut errors = Vec::new();
    require_name(&mut errors, "company", &step.company);
    require_name(&mut errors, "job_title", &step.job_title);
    if let Some(level) = &step.level {
        if level.trim().is_empty() {
            errors.push(FieldError::new("level", "Level must not be blank when given"));
        } else if level.len() > MAX_LEVEL_LEN {
            errors.push(FieldError::new("level", "Level is too long"));
        }
    }
    errors
}

pub fn validate_compensation(step: &CompensationStep) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if step.base_salary <= 0 {
        errors.push(FieldError::new("base_salary", "Base salary must be positive"));
    } else if step.base_salary > MAX_BASE_SALARY {
        errors.push(FieldError::new("base_salary", "Base salary is implausibly large"));
    }
    if step.bonus.is_some_and(|b| b < 0) {
        errors.push(FieldError::new("bonus", "Bonus must not be negative"));
    }
    if step.stock.is_some_and(|s| s < 0) {
        errors.push(FieldError::new("stock", "Stock must not be negative"));
    }
    if step.currency.len() != 3 || !step.currency.chars().all(|c| c.is_ascii_uppercase()) {
        errors.push(FieldError::new(
            "currency",
            "Currency must be a 3-letter uppercase code",
        ));
    }
    errors
}

pub fn validate_background(step: &BackgroundStep) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !(0..=MAX_YEARS).contains(&step.years_experience) {
        errors.push(FieldError::new(
            "years_experience",
            format!("Years of experience must be between 0 and {MAX_YEARS}"),
        ));
    }
    if step.years_at_company < 0 {
        errors.push(FieldError::new(
            "years_at_company",
            "Years at company must not be negative",
        ));
    } else if step.years_at_company > step.years_experience {
        errors.push(FieldError::new(
            "years_at_company",
            "Years at company cannot exceed total experience",
        ));
    }
    require_name(&mut errors, "city", &step.city);
    require_name(&mut errors, "country", &step.country);
    errors
}

/// Validates the whole draft, collecting errors from every step.
pub fn validate_draft(draft: &SubmissionDraft) -> Vec<FieldError> {
    let mut errors = validate_role(&draft.role);
    errors.extend(validate_compensation(&draft.compensation));
    errors.extend(validate_background(&draft.background));
    if draft.note.as_ref().is_some_and(|n| n.len() > MAX_NOTE_LEN) {
        errors.push(FieldError::new("note", "Note is too long"));
    }
    errors
}

fn require_name(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
    } else if value.len() > MAX_NAME_LEN {
        errors.push(FieldError::new(field, format!("{field} is too long")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role() -> RoleStep {
        RoleStep {
            company: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            level: None,
        }
    }

    fn compensation() -> CompensationStep {
        CompensationStep {
            base_salary: 120_000,
            bonus: Some(10_000),
            stock: None,
            currency: "USD".to_string(),
        }
    }

    fn background() -> BackgroundStep {
        BackgroundStep {
            years_experience: 10,
            years_at_company: 3,
            city: "Berlin".to_string(),
            region: None,
            country: "Germany".to_string(),
        }
    }

    fn draft() -> SubmissionDraft {
        SubmissionDraft {
            role: role(),
            compensation: compensation(),
            background: background(),
            note: None,
        }
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate_draft(&draft()).is_empty());
    }

    #[test]
    fn test_missing_company() {
        let step = RoleStep {
            company: "   ".to_string(),
            ..role()
        };
        let errors = validate_role(&step);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "company");
    }

    #[test]
    fn test_blank_level_rejected_when_given() {
        let step = RoleStep {
            level: Some("  ".to_string()),
            ..role()
        };
        assert_eq!(validate_role(&step)[0].field, "level");
    }

    #[test]
    fn test_zero_base_salary_rejected() {
        let step = CompensationStep {
            base_salary: 0,
            ..compensation()
        };
        assert_eq!(validate_compensation(&step)[0].field, "base_salary");
    }

    #[test]
    fn test_negative_bonus_rejected() {
        let step = CompensationStep {
            bonus: Some(-1),
            ..compensation()
        };
        assert_eq!(validate_compensation(&step)[0].field, "bonus");
    }

    #[test]
    fn test_lowercase_currency_rejected() {
        let step = CompensationStep {
            currency: "usd".to_string(),
            ..compensation()
        };
        assert_eq!(validate_compensation(&step)[0].field, "currency");
    }

    #[test]
    fn test_years_at_company_capped_by_experience() {
        let step = BackgroundStep {
            years_experience: 2,
            years_at_company: 5,
            ..background()
        };
        assert_eq!(validate_background(&step)[0].field, "years_at_company");
    }

    #[test]
    fn test_implausible_experience_rejected() {
        let step = BackgroundStep {
            years_experience: 80,
            ..background()
        };
        assert!(validate_background(&step)
            .iter()
            .any(|e| e.field == "years_experience"));
    }

    #[test]
    fn test_draft_collects_errors_across_steps() {
        let mut d = draft();
        d.role.company = String::new();
        d.compensation.base_salary = -5;
        let errors = validate_draft(&d);
        assert!(errors.iter().any(|e| e.field == "company"));
        assert!(errors.iter().any(|e| e.field == "base_salary"));
    }

    #[test]
    fn test_oversized_note_rejected() {
        let mut d = draft();
        d.note = Some("x".repeat(3000));
        assert!(validate_draft(&d).iter().any(|e| e.field == "note"));
    }

    #[test]
    fn test_step_parsing() {
        assert_eq!("role".parse(), Ok(WizardStep::Role));
        assert_eq!("compensation".parse(), Ok(WizardStep::Compensation));
        assert!("payment".parse::<WizardStep>().is_err());
    }
}
