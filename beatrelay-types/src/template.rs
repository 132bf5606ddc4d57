//! Index name templates resolved against the UTC date.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date layout substituted into an index template.
pub const INDEX_DATE_FORMAT: &str = "%Y.%m.%d";

/// Errors from parsing an index template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template has no `%s` placeholder.
    #[error("index template {0:?} has no %s placeholder for the date")]
    MissingPlaceholder(String),

    /// The template has more than one `%s` placeholder.
    #[error("index template {template:?} has {count} %s placeholders, expected exactly one")]
    MultiplePlaceholders { template: String, count: usize },

    /// The template has a `%` that is not part of the `%s` placeholder.
    #[error("index template {0:?} has a % outside the single %s placeholder")]
    StrayPercent(String),
}

/// A naming pattern for the storage index, e.g. `metricbeat-6.2.4-%s`.
///
/// Holds exactly one `%s` placeholder which is replaced by the date in
/// `YYYY.MM.DD` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexTemplate(String);

impl IndexTemplate {
    /// The placeholder substituted with the date.
    pub const PLACEHOLDER: &'static str = "%s";

    /// Parse and validate a template.
    pub fn parse(template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        match template.matches(Self::PLACEHOLDER).count() {
            0 => Err(TemplateError::MissingPlaceholder(template)),
            1 if template.replacen(Self::PLACEHOLDER, "", 1).contains('%') => {
                Err(TemplateError::StrayPercent(template))
            }
            1 => Ok(Self(template)),
            count => Err(TemplateError::MultiplePlaceholders { template, count }),
        }
    }

    /// Resolve the template against a calendar date.
    pub fn resolve(&self, date: NaiveDate) -> String {
        let date = date.format(INDEX_DATE_FORMAT).to_string();
        self.0.replacen(Self::PLACEHOLDER, &date, 1)
    }

    /// Resolve the template against the UTC date of an instant.
    pub fn resolve_at(&self, now: DateTime<Utc>) -> String {
        self.resolve(now.date_naive())
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for IndexTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IndexTemplate {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<IndexTemplate> for String {
    fn from(template: IndexTemplate) -> Self {
        template.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_date() {
        let template = IndexTemplate::parse("metrics-%s").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(template.resolve(date), "metrics-2024.03.05");
    }

    #[test]
    fn test_resolve_uses_utc_date() {
        let template = IndexTemplate::parse("metricbeat-6.2.4-%s").unwrap();
        let late = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(template.resolve_at(late), "metricbeat-6.2.4-2023.12.31");
    }

    #[test]
    fn test_placeholder_in_the_middle() {
        let template = IndexTemplate::parse("app-%s-metrics").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        assert_eq!(template.resolve(date), "app-2025.11.20-metrics");
    }

    #[test]
    fn test_missing_placeholder() {
        let err = IndexTemplate::parse("metrics").unwrap_err();
        assert_eq!(err, TemplateError::MissingPlaceholder("metrics".to_string()));
    }

    #[test]
    fn test_multiple_placeholders() {
        let err = IndexTemplate::parse("%s-metrics-%s").unwrap_err();
        assert!(matches!(err, TemplateError::MultiplePlaceholders { count: 2, .. }));
    }

    #[test]
    fn test_other_verbs_rejected() {
        for template in ["m-%s-%d", "%%s-metrics", "metrics-%s%", "%v-%s"] {
            let err = IndexTemplate::parse(template).unwrap_err();
            assert_eq!(err, TemplateError::StrayPercent(template.to_string()), "{template}");
        }
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<IndexTemplate>("\"ok-%s\"").is_ok());
        assert!(serde_json::from_str::<IndexTemplate>("\"no-placeholder\"").is_err());
    }
}
