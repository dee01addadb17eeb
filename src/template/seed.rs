//! Built-in templates installed at startup.

use super::store::TemplateStore;
use super::types::{NewTemplateVersion, TemplateResult};

pub const WELCOME_TEMPLATE_KEY: &str = "bienvenida";
pub const WELCOME_TEMPLATE_LOCALE: &str = "es-GT";

/// Install the welcome template as version 1 (active).
///
/// An existing template keeps its metadata and versions untouched.
pub async fn seed_default_templates(store: &dyn TemplateStore) -> TemplateResult<()> {
    let exists = store
        .list_templates()
        .await?
        .iter()
        .any(|t| t.key == WELCOME_TEMPLATE_KEY);

    if !exists {
        store
            .ensure_template(
                WELCOME_TEMPLATE_KEY,
                "Bienvenida",
                Some("Plantilla de bienvenida por defecto"),
            )
            .await?;
    }

    if !store.list_versions(WELCOME_TEMPLATE_KEY).await?.is_empty() {
        return Ok(());
    }

    store
        .add_version(NewTemplateVersion {
            key: WELCOME_TEMPLATE_KEY.to_string(),
            locale: WELCOME_TEMPLATE_LOCALE.to_string(),
            subject: "Hola {{ .userName }}, ¡bienvenido!".to_string(),
            body_html: Some(
                "<h1>¡Hola {{ .userName }}!</h1>\
                 <p>Tu registro fue exitoso. Soporte: {{ .supportEmail }}</p>"
                    .to_string(),
            ),
            body_text: Some(
                "Hola {{ .userName }}! Tu registro fue exitoso. Soporte: {{ .supportEmail }}"
                    .to_string(),
            ),
            activate: true,
        })
        .await?;

    tracing::info!(template_key = WELCOME_TEMPLATE_KEY, "Seeded default template");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MemoryTemplateStore;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryTemplateStore::default();
        seed_default_templates(&store).await.unwrap();
        seed_default_templates(&store).await.unwrap();

        let versions = store.list_versions(WELCOME_TEMPLATE_KEY).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert!(versions[0].is_active);
        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[0].locale, WELCOME_TEMPLATE_LOCALE);
    }

    #[tokio::test]
    async fn test_seed_keeps_operator_metadata() {
        let store = MemoryTemplateStore::default();
        seed_default_templates(&store).await.unwrap();

        store
            .ensure_template(WELCOME_TEMPLATE_KEY, "Welcome (ops)", Some("edited by operator"))
            .await
            .unwrap();
        seed_default_templates(&store).await.unwrap();

        let templates = store.list_templates().await.unwrap();
        let welcome = templates
            .iter()
            .find(|t| t.key == WELCOME_TEMPLATE_KEY)
            .unwrap();
        assert_eq!(welcome.name, "Welcome (ops)");
        assert_eq!(welcome.description.as_deref(), Some("edited by operator"));
    }
}
