mod company;
pub mod hours;
mod project;
pub mod slug;
mod tag;

pub use company::{COMPANY_NAME_MAX_LENGTH, Company};
pub use project::{LoggedHours, PROJECT_TITLE_MAX_LENGTH, Project, ProjectReport, ProjectWithCompany};
pub use tag::{TAG_NAME_MAX_LENGTH, Tag, TagColor};

use crate::error::ValidationErrors;

/// Required, length-bounded text field.
pub(crate) fn validate_text(field: &'static str, value: &str, max_length: usize, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(field, "This field cannot be blank.");
        return;
    }
    let length = value.chars().count();
    if length > max_length {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max_length, length
            ),
        );
    }
}
