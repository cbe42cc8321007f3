use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;
use crate::models::{Tag, validate_text};

pub const COMPANY_NAME_MAX_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub tags: Vec<Tag>,
}

impl Company {
    pub const VERBOSE_NAME: &'static str = "company";
    pub const VERBOSE_NAME_PLURAL: &'static str = "companies";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag_ids(&self) -> Vec<i32> {
        self.tags.iter().map(|tag| tag.id).collect()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_text("name", &self.name, COMPANY_NAME_MAX_LENGTH, &mut errors);
        errors.into_result()
    }
}

impl fmt::Display for Company {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
