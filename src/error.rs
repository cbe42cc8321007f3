use std::collections::BTreeMap;

use thiserror::Error;

/// Errors raised by the model and database layers.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("cannot delete company {company_id}: it is referenced by {project_count} project(s)")]
    ProtectedCompany { company_id: i32, project_count: i64 },

    #[error("invalid tag color '{0}'")]
    InvalidColor(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, ProjectError>;

/// Field name to validation messages, sorted by field name.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", join_messages(.fields))]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.fields.iter().map(|(field, messages)| (*field, messages.as_slice()))
    }

    /// `Ok(())` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result(self) -> std::result::Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

fn join_messages(fields: &BTreeMap<&'static str, Vec<String>>) -> String {
    fields
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |message| format!("{}: {}", field, message)))
        .collect::<Vec<_>>()
        .join("; ")
}
