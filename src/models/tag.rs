use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectError, ValidationErrors};
use crate::models::validate_text;

pub const TAG_NAME_MAX_LENGTH: usize = 255;

/// The palette a tag may be drawn in. Stored by its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagColor {
    Primary,
    Secondary,
    Success,
    Danger,
    Warning,
    Info,
    Light,
    Dark,
}

impl TagColor {
    pub const ALL: [TagColor; 8] = [
        TagColor::Primary,
        TagColor::Secondary,
        TagColor::Success,
        TagColor::Danger,
        TagColor::Warning,
        TagColor::Info,
        TagColor::Light,
        TagColor::Dark,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TagColor::Primary => "primary",
            TagColor::Secondary => "secondary",
            TagColor::Success => "success",
            TagColor::Danger => "danger",
            TagColor::Warning => "warning",
            TagColor::Info => "info",
            TagColor::Light => "light",
            TagColor::Dark => "dark",
        }
    }

    /// Human-readable label, e.g. `Primary`.
    pub fn label(&self) -> &'static str {
        match self {
            TagColor::Primary => "Primary",
            TagColor::Secondary => "Secondary",
            TagColor::Success => "Success",
            TagColor::Danger => "Danger",
            TagColor::Warning => "Warning",
            TagColor::Info => "Info",
            TagColor::Light => "Light",
            TagColor::Dark => "Dark",
        }
    }
}

impl fmt::Display for TagColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagColor {
    type Err = ProjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TagColor::ALL
            .iter()
            .copied()
            .find(|color| color.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProjectError::InvalidColor(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub color: TagColor,
}

impl Tag {
    /// An unsaved tag; the id is assigned on insert.
    pub fn new(name: impl Into<String>, color: TagColor) -> Self {
        Self {
            id: 0,
            name: name.into(),
            color,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_text("name", &self.name, TAG_NAME_MAX_LENGTH, &mut errors);
        errors.into_result()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_eight_colors() {
        assert_eq!(TagColor::ALL.len(), 8);
        let labels: Vec<&str> = TagColor::ALL.iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            ["Primary", "Secondary", "Success", "Danger", "Warning", "Info", "Light", "Dark"]
        );
    }

    #[test]
    fn color_parses_from_stored_name() {
        for color in TagColor::ALL {
            assert_eq!(color.as_str().parse::<TagColor>().unwrap(), color);
        }
        assert_eq!("Danger".parse::<TagColor>().unwrap(), TagColor::Danger);
    }

    #[test]
    fn unknown_color_is_rejected() {
        let err = "magenta".parse::<TagColor>().unwrap_err();
        assert!(matches!(err, ProjectError::InvalidColor(ref c) if c == "magenta"));
    }

    #[test]
    fn color_serializes_lowercase() {
        let json = serde_json::to_string(&TagColor::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn tag_displays_as_its_name() {
        let tag = Tag::new("Frontend", TagColor::Info);
        assert_eq!(tag.to_string(), "Frontend");
    }

    #[test]
    fn tag_requires_a_name() {
        let errors = Tag::new("   ", TagColor::Light).validate().unwrap_err();
        assert_eq!(errors.get("name").unwrap(), ["This field cannot be blank."]);
    }

    #[test]
    fn tag_name_is_limited_to_255_characters() {
        let errors = Tag::new("x".repeat(256), TagColor::Dark).validate().unwrap_err();
        assert_eq!(
            errors.get("name").unwrap(),
            ["Ensure this value has at most 255 characters (it has 256)."]
        );
        assert!(Tag::new("x".repeat(255), TagColor::Dark).validate().is_ok());
    }
}
