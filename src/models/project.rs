use std::fmt;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::models::hours::{format_hours, validate_actual_hours, validate_increment, zero_hours};
use crate::models::slug::slugify;
use crate::models::{Company, Tag, validate_text};

pub const PROJECT_TITLE_MAX_LENGTH: usize = 128;

/// Slug used when nothing in the title survives slugification.
const FALLBACK_SLUG: &str = "project";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub estimated_design: i16,
    pub actual_design: BigDecimal,

    pub estimated_development: i16,
    pub actual_development: BigDecimal,

    pub estimated_testing: i16,
    pub actual_testing: BigDecimal,
}

/// Hours worked since the last log, per phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedHours {
    pub design: BigDecimal,
    pub development: BigDecimal,
    pub testing: BigDecimal,
}

impl Default for LoggedHours {
    fn default() -> Self {
        Self {
            design: zero_hours(),
            development: zero_hours(),
            testing: zero_hours(),
        }
    }
}

impl LoggedHours {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_increment("actual_design", &self.design, &mut errors);
        validate_increment("actual_development", &self.development, &mut errors);
        validate_increment("actual_testing", &self.testing, &mut errors);
        errors.into_result()
    }
}

impl Project {
    /// An unsaved project with nothing logged yet.
    pub fn new(
        company_id: i32,
        title: impl Into<String>,
        estimated_design: i16,
        estimated_development: i16,
        estimated_testing: i16,
    ) -> Self {
        Self {
            id: 0,
            company_id,
            title: title.into(),
            start_date: None,
            end_date: None,
            estimated_design,
            actual_design: zero_hours(),
            estimated_development,
            actual_development: zero_hours(),
            estimated_testing,
            actual_testing: zero_hours(),
        }
    }

    pub fn total_estimated_hours(&self) -> i32 {
        i32::from(self.estimated_design)
            + i32::from(self.estimated_development)
            + i32::from(self.estimated_testing)
    }

    pub fn total_actual_hours(&self) -> BigDecimal {
        &self.actual_design + &self.actual_development + &self.actual_testing
    }

    pub fn is_over_budget(&self) -> bool {
        self.total_actual_hours() > BigDecimal::from(self.total_estimated_hours())
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended_on(chrono::Local::now().date_naive())
    }

    pub fn has_ended_on(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end_date| end_date < today)
    }

    pub fn slug(&self) -> String {
        let slug = slugify(&self.title);
        if slug.is_empty() { FALLBACK_SLUG.to_string() } else { slug }
    }

    /// Path of the project's edit page.
    pub fn absolute_url(&self) -> String {
        format!("/projects/{}-{}/", self.id, self.slug())
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_text("title", &self.title, PROJECT_TITLE_MAX_LENGTH, &mut errors);

        for (field, value) in [
            ("estimated_design", self.estimated_design),
            ("estimated_development", self.estimated_development),
            ("estimated_testing", self.estimated_testing),
        ] {
            if value < 0 {
                errors.add(field, "Ensure this value is greater than or equal to 0.");
            }
        }

        validate_actual_hours("actual_design", &self.actual_design, &mut errors);
        validate_actual_hours("actual_development", &self.actual_development, &mut errors);
        validate_actual_hours("actual_testing", &self.actual_testing, &mut errors);

        errors.into_result()
    }

    /// Add logged hours to the actuals. Leaves the project untouched when the
    /// increments or the resulting totals are invalid.
    pub fn log_hours(&mut self, hours: &LoggedHours) -> Result<(), ValidationErrors> {
        hours.validate()?;

        let mut updated = self.clone();
        updated.actual_design = &self.actual_design + &hours.design;
        updated.actual_development = &self.actual_development + &hours.development;
        updated.actual_testing = &self.actual_testing + &hours.testing;
        updated.validate()?;

        *self = updated;
        Ok(())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A project fetched together with its company and the company's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWithCompany {
    pub project: Project,
    pub company: Company,
}

/// Flattened view of a project with its derived values, as listed to users.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub id: i32,
    pub title: String,
    pub company: String,
    pub tags: Vec<Tag>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub estimated_design: i16,
    pub actual_design: String,
    pub estimated_development: i16,
    pub actual_development: String,
    pub estimated_testing: i16,
    pub actual_testing: String,
    pub total_estimated_hours: i32,
    pub total_actual_hours: String,
    pub is_over_budget: bool,
    pub has_ended: bool,
    pub url: String,
}

impl ProjectWithCompany {
    pub fn report(&self, today: NaiveDate) -> ProjectReport {
        let project = &self.project;
        ProjectReport {
            id: project.id,
            title: project.title.clone(),
            company: self.company.name.clone(),
            tags: self.company.tags.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            estimated_design: project.estimated_design,
            actual_design: format_hours(&project.actual_design),
            estimated_development: project.estimated_development,
            actual_development: format_hours(&project.actual_development),
            estimated_testing: project.estimated_testing,
            actual_testing: format_hours(&project.actual_testing),
            total_estimated_hours: project.total_estimated_hours(),
            total_actual_hours: format_hours(&project.total_actual_hours()),
            is_over_budget: project.is_over_budget(),
            has_ended: project.has_ended_on(today),
            url: project.absolute_url(),
        }
    }
}
