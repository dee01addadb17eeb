//! Template types and error definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template version not found: {key} v{version} ({locale})")]
    VersionNotFound {
        key: String,
        version: i32,
        locale: String,
    },

    #[error("No active version for template: {0}")]
    NoActiveVersion(String),

    #[error("Invalid template: {0}")]
    Invalid(String),

    #[error("Template syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Undefined template variable: {0}")]
    UndefinedVariable(String),

    #[error("Template storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl TemplateError {
    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            message: message.into(),
        }
    }
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A named template; versions hang off its key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: i64,

    /// Stable, globally unique key (e.g. `bienvenida`)
    pub key: String,

    /// Human-readable template name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One immutable revision of a template for a single locale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TemplateVersion {
    pub template_id: i64,
    pub version: i32,
    pub locale: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new version
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplateVersion {
    #[serde(alias = "templateKey")]
    pub key: String,
    #[serde(default)]
    pub locale: String,
    pub subject: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
    /// Activate the version as part of its creation
    #[serde(default, alias = "isActive")]
    pub activate: bool,
}

impl NewTemplateVersion {
    /// Check the version is usable and fill in the default locale.
    pub fn normalize(mut self, default_locale: &str) -> TemplateResult<Self> {
        self.key = self.key.trim().to_string();
        self.locale = self.locale.trim().to_string();

        if self.key.is_empty() {
            return Err(TemplateError::Invalid("template key is required".to_string()));
        }
        if self.subject.trim().is_empty() {
            return Err(TemplateError::Invalid("subject is required".to_string()));
        }
        if !non_empty(&self.body_html) && !non_empty(&self.body_text) {
            return Err(TemplateError::Invalid(
                "at least one of bodyHtml or bodyText is required".to_string(),
            ));
        }
        if self.locale.is_empty() {
            self.locale = default_locale.to_string();
        }

        // An empty body variant is the same as an absent one
        self.body_html = self.body_html.filter(|b| !b.trim().is_empty());
        self.body_text = self.body_text.filter(|b| !b.trim().is_empty());

        Ok(self)
    }
}

/// Result of rendering a template version against a data mapping
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTemplate {
    pub subject: String,
    pub body_html: Option<String>,
    pub body_text: Option<String>,
}

impl RenderedTemplate {
    /// The body persisted on the email record: HTML when present, plain text otherwise.
    pub fn persisted_body(&self) -> Option<&str> {
        self.body_html
            .as_deref()
            .filter(|b| !b.is_empty())
            .or_else(|| self.body_text.as_deref().filter(|b| !b.is_empty()))
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_version() -> NewTemplateVersion {
        NewTemplateVersion {
            key: " welcome ".to_string(),
            locale: String::new(),
            subject: "Hi".to_string(),
            body_html: Some("<b>Hi</b>".to_string()),
            body_text: Some("   ".to_string()),
            activate: false,
        }
    }

    #[test]
    fn test_normalize_fills_default_locale() {
        let version = new_version().normalize("es-GT").unwrap();
        assert_eq!(version.key, "welcome");
        assert_eq!(version.locale, "es-GT");
        assert_eq!(version.body_text, None);
    }

    #[test]
    fn test_normalize_rejects_missing_bodies() {
        let mut version = new_version();
        version.body_html = None;
        assert!(matches!(
            version.normalize("es-GT"),
            Err(TemplateError::Invalid(_))
        ));
    }

    #[test]
    fn test_normalize_rejects_empty_subject() {
        let mut version = new_version();
        version.subject = " ".to_string();
        assert!(matches!(
            version.normalize("es-GT"),
            Err(TemplateError::Invalid(_))
        ));
    }

    #[test]
    fn test_persisted_body_prefers_html() {
        let rendered = RenderedTemplate {
            subject: "s".to_string(),
            body_html: Some("<p>x</p>".to_string()),
            body_text: Some("x".to_string()),
        };
        assert_eq!(rendered.persisted_body(), Some("<p>x</p>"));

        let text_only = RenderedTemplate {
            body_html: None,
            ..rendered
        };
        assert_eq!(text_only.persisted_body(), Some("x"));
    }

    #[test]
    fn test_version_serializes_camel_case() {
        let version = TemplateVersion {
            template_id: 1,
            version: 2,
            locale: "es-GT".to_string(),
            subject: "Hi".to_string(),
            body_html: Some("<b>Hi</b>".to_string()),
            body_text: None,
            is_active: true,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&version).unwrap();
        assert_eq!(json["templateId"], 1);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["bodyHtml"], "<b>Hi</b>");
        assert!(json.get("bodyText").is_none());
        assert!(json.get("is_active").is_none());
    }
}
