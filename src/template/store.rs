//! Backend trait for versioned template storage.

use async_trait::async_trait;

use super::types::{NewTemplateVersion, Template, TemplateResult, TemplateVersion};

/// Behaviour shared by every template store backend
#[derive(Debug, Clone)]
pub struct TemplateStoreConfig {
    /// Locale applied when a caller does not name one
    pub default_locale: String,
    /// Serve the newest active version of another locale when the requested
    /// locale has none
    pub locale_fallback: bool,
}

impl Default for TemplateStoreConfig {
    fn default() -> Self {
        Self {
            default_locale: "es-GT".to_string(),
            locale_fallback: true,
        }
    }
}

impl TemplateStoreConfig {
    pub(crate) fn locale_or_default<'a>(&'a self, locale: Option<&'a str>) -> &'a str {
        match locale.map(str::trim) {
            Some(l) if !l.is_empty() => l,
            _ => &self.default_locale,
        }
    }
}

/// Storage for templates and their versions.
///
/// # Invariants
///
/// - Template keys are unique; `ensure_template` is an upsert.
/// - Version numbers are dense per (template, locale), starting at 1.
/// - Version content is never modified after creation.
/// - At most one version is active per (template, locale). Implementations
///   serialize activation so concurrent callers cannot leave two versions
///   active, and a failed activation leaves the previous state intact.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Create the template or update its metadata; returns its id.
    async fn ensure_template(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
    ) -> TemplateResult<i64>;

    /// Append a version, creating the template (named after its key) if needed.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::Invalid` if the subject is empty or both bodies are empty.
    async fn add_version(&self, version: NewTemplateVersion) -> TemplateResult<TemplateVersion>;

    /// Make `version` the only active version for (key, locale).
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::VersionNotFound` (or `NotFound` for an unknown
    /// key) without touching the current active version.
    async fn activate_version(&self, key: &str, version: i32, locale: &str) -> TemplateResult<()>;

    /// Active version for (key, locale), with the configured cross-locale fallback.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::NoActiveVersion` when nothing is active for the key.
    async fn get_active_version(
        &self,
        key: &str,
        locale: Option<&str>,
    ) -> TemplateResult<TemplateVersion>;

    /// All versions of a template, newest first.
    async fn list_versions(&self, key: &str) -> TemplateResult<Vec<TemplateVersion>>;

    async fn list_templates(&self) -> TemplateResult<Vec<Template>>;
}

/// Newest first, version number descending as tiebreak.
pub(crate) fn sort_newest_first(versions: &mut [TemplateVersion]) {
    versions.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.version.cmp(&a.version))
    });
}
