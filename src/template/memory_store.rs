//! In-memory template store using DashMap.
//!
//! Each template key maps to one entry holding the template and all of its
//! versions, so versioning and activation for a key run under that entry's
//! lock. Data is lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::store::{sort_newest_first, TemplateStore, TemplateStoreConfig};
use super::types::{NewTemplateVersion, Template, TemplateError, TemplateResult, TemplateVersion};

struct TemplateEntry {
    template: Template,
    /// Insertion order doubles as creation order
    versions: Vec<TemplateVersion>,
}

impl TemplateEntry {
    fn activate(&mut self, version: i32, locale: &str) -> bool {
        if !self
            .versions
            .iter()
            .any(|v| v.version == version && v.locale == locale)
        {
            return false;
        }

        for v in self.versions.iter_mut().filter(|v| v.locale == locale) {
            v.is_active = v.version == version;
        }
        true
    }
}

pub struct MemoryTemplateStore {
    entries: DashMap<String, TemplateEntry>,
    next_id: AtomicI64,
    config: TemplateStoreConfig,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new(TemplateStoreConfig::default())
    }
}

impl MemoryTemplateStore {
    pub fn new(config: TemplateStoreConfig) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicI64::new(1),
            config,
        }
    }

    fn new_template(&self, key: &str, name: &str, description: Option<&str>) -> Template {
        let now = Utc::now();
        Template {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            key: key.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn ensure_template(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
    ) -> TemplateResult<i64> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TemplateError::Invalid("template key is required".to_string()));
        }

        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| TemplateEntry {
                template: self.new_template(key, name, description),
                versions: Vec::new(),
            });

        let template = &mut entry.template;
        template.name = name.to_string();
        template.description = description.map(str::to_string);
        template.updated_at = Utc::now();

        Ok(template.id)
    }

    async fn add_version(&self, version: NewTemplateVersion) -> TemplateResult<TemplateVersion> {
        let version = version.normalize(&self.config.default_locale)?;

        let mut entry = self
            .entries
            .entry(version.key.clone())
            .or_insert_with(|| TemplateEntry {
                template: self.new_template(&version.key, &version.key, None),
                versions: Vec::new(),
            });

        let next = entry
            .versions
            .iter()
            .filter(|v| v.locale == version.locale)
            .map(|v| v.version)
            .max()
            .unwrap_or(0)
            + 1;

        let mut created = TemplateVersion {
            template_id: entry.template.id,
            version: next,
            locale: version.locale.clone(),
            subject: version.subject,
            body_html: version.body_html,
            body_text: version.body_text,
            is_active: false,
            created_at: Utc::now(),
        };
        entry.versions.push(created.clone());

        if version.activate {
            created.is_active = entry.activate(next, &version.locale);
        }

        tracing::debug!(
            template_key = %version.key,
            locale = %version.locale,
            version = next,
            activated = version.activate,
            "Template version added"
        );

        Ok(created)
    }

    async fn activate_version(&self, key: &str, version: i32, locale: &str) -> TemplateResult<()> {
        let locale = self.config.locale_or_default(Some(locale)).to_string();
        let mut entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))?;

        if !entry.activate(version, &locale) {
            return Err(TemplateError::VersionNotFound {
                key: key.to_string(),
                version,
                locale,
            });
        }

        tracing::info!(template_key = %key, locale = %locale, version, "Template version activated");
        Ok(())
    }

    async fn get_active_version(
        &self,
        key: &str,
        locale: Option<&str>,
    ) -> TemplateResult<TemplateVersion> {
        let locale = self.config.locale_or_default(locale);
        let entry = self
            .entries
            .get(key)
            .ok_or_else(|| TemplateError::NoActiveVersion(key.to_string()))?;

        if let Some(exact) = entry
            .versions
            .iter()
            .find(|v| v.is_active && v.locale == locale)
        {
            return Ok(exact.clone());
        }

        if !self.config.locale_fallback {
            return Err(TemplateError::NoActiveVersion(key.to_string()));
        }

        entry
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_active)
            .max_by_key(|(index, v)| (v.created_at, *index))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| TemplateError::NoActiveVersion(key.to_string()))
    }

    async fn list_versions(&self, key: &str) -> TemplateResult<Vec<TemplateVersion>> {
        let mut versions = self
            .entries
            .get(key)
            .map(|entry| entry.versions.clone())
            .unwrap_or_default();
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    async fn list_templates(&self) -> TemplateResult<Vec<Template>> {
        let mut templates: Vec<Template> = self
            .entries
            .iter()
            .map(|entry| entry.template.clone())
            .collect();
        templates.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(templates)
    }
}
