use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::Store;

#[derive(Debug, Serialize)]
pub struct SettingsPreview {
    pub current: Settings,
    pub preview: Settings,
}

/// The single settings record, created from defaults on first read.
pub async fn current(store: &dyn Store) -> AppResult<Settings> {
    if let Some(settings) = store.current_settings().await? {
        return Ok(settings);
    }
    let admin = store
        .users_by_role(Role::Admin)
        .await?
        .into_iter()
        .min_by_key(|u| u.id)
        .ok_or_else(|| AppError::NotFound("No admin user found to create default settings".into()))?;

    let settings = store.settings_or_insert(&Settings::defaults(admin.id)).await?;
    tracing::info!(settings_id = settings.id, admin_id = admin.id, "default settings ensured");
    Ok(settings)
}

pub async fn basic(store: &dyn Store) -> AppResult<BasicSettings> {
    let s = current(store).await?;
    Ok(BasicSettings {
        name: s.name,
        logo_url: s.logo_url,
    })
}

pub async fn about(store: &dyn Store) -> AppResult<AboutSettings> {
    let s = current(store).await?;
    Ok(AboutSettings {
        about_image_url: s.about_image_url,
        about_description: s.about_description,
    })
}

pub async fn terms(store: &dyn Store) -> AppResult<TermsSettings> {
    let s = current(store).await?;
    Ok(TermsSettings {
        terms_and_conditions: s.terms_and_conditions,
    })
}

pub async fn contact(store: &dyn Store) -> AppResult<ContactSettings> {
    let s = current(store).await?;
    Ok(ContactSettings {
        facebook_url: s.facebook_url,
        whatsapp_number: s.whatsapp_number,
        phone_number: s.phone_number,
        second_phone_number: s.second_phone_number,
    })
}

fn trimmed(value: Option<String>, current: &mut Option<String>) {
    if let Some(v) = value {
        *current = Some(v.trim().to_string());
    }
}

fn apply(mut settings: Settings, req: UpdateSettingsRequest) -> Settings {
    if let Some(name) = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        settings.name = name.to_string();
    }
    trimmed(req.logo_url, &mut settings.logo_url);
    trimmed(req.about_image_url, &mut settings.about_image_url);
    trimmed(req.about_description, &mut settings.about_description);
    trimmed(req.terms_and_conditions, &mut settings.terms_and_conditions);
    trimmed(req.facebook_url, &mut settings.facebook_url);
    trimmed(req.whatsapp_number, &mut settings.whatsapp_number);
    trimmed(req.phone_number, &mut settings.phone_number);
    trimmed(req.second_phone_number, &mut settings.second_phone_number);
    settings
}

pub async fn update(store: &dyn Store, admin_id: i32, req: UpdateSettingsRequest) -> AppResult<Settings> {
    let settings = apply(current(store).await?, req);
    let saved = store.save_settings(&settings).await?;
    tracing::info!(settings_id = saved.id, admin_id, "settings updated");
    Ok(saved)
}

/// Shows the record as it would look after `update`, without saving.
pub async fn preview(store: &dyn Store, req: UpdateSettingsRequest) -> AppResult<SettingsPreview> {
    let current = current(store).await?;
    let preview = apply(current.clone(), req);
    Ok(SettingsPreview { current, preview })
}

pub async fn update_logo(store: &dyn Store, admin_id: i32, req: LogoRequest) -> AppResult<Settings> {
    let mut settings = current(store).await?;
    settings.logo_url = req.logo_url.map(|u| u.trim().to_string());
    let saved = store.save_settings(&settings).await?;
    tracing::info!(settings_id = saved.id, admin_id, "logo updated");
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::seed_user;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn defaults_need_an_admin() {
        let store = MemoryStore::new();
        assert!(matches!(current(&store).await, Err(AppError::NotFound(_))));

        let admin = seed_user(&store, "admin@example.com", Role::Admin).await;
        let settings = current(&store).await.unwrap();
        assert_eq!(settings.admin_id, admin.id);
        assert_eq!(settings.name, DEFAULT_NAME);
        assert_eq!(terms(&store).await.unwrap().terms_and_conditions.as_deref(), Some(DEFAULT_TERMS));

        // Second read returns the stored record.
        assert_eq!(current(&store).await.unwrap().id, settings.id);
    }

    #[tokio::test]
    async fn concurrent_first_reads_share_one_record() {
        let store = MemoryStore::new();
        seed_user(&store, "admin@example.com", Role::Admin).await;

        let (first, second) = tokio::join!(current(&store), current(&store));
        let first = first.unwrap();
        assert_eq!(first.id, second.unwrap().id);
        let stored = store.current_settings().await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn saving_without_a_record_is_not_found() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "admin@example.com", Role::Admin).await;
        let mut settings = Settings::defaults(admin.id);
        settings.id = 77;
        assert!(matches!(store.save_settings(&settings).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_trims_and_keeps_name_when_blank() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "admin@example.com", Role::Admin).await;

        let req = UpdateSettingsRequest {
            name: Some("   ".into()),
            phone_number: Some(" 0223456789 ".into()),
            facebook_url: Some("https://facebook.com/fields ".into()),
            ..Default::default()
        };
        let saved = update(&store, admin.id, req).await.unwrap();
        assert_eq!(saved.name, DEFAULT_NAME);
        assert_eq!(saved.phone_number.as_deref(), Some("0223456789"));

        let c = contact(&store).await.unwrap();
        assert_eq!(c.facebook_url.as_deref(), Some("https://facebook.com/fields"));
        assert!(c.whatsapp_number.is_none());
    }

    #[tokio::test]
    async fn preview_does_not_write() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "admin@example.com", Role::Admin).await;

        let req = UpdateSettingsRequest {
            name: Some("Goal Arena".into()),
            ..Default::default()
        };
        let p = preview(&store, req).await.unwrap();
        assert_eq!(p.preview.name, "Goal Arena");
        assert_eq!(p.current.name, DEFAULT_NAME);
        assert_eq!(basic(&store).await.unwrap().name, DEFAULT_NAME);

        update_logo(
            &store,
            admin.id,
            LogoRequest {
                logo_url: Some("https://cdn.example.com/logo.png".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            basic(&store).await.unwrap().logo_url.as_deref(),
            Some("https://cdn.example.com/logo.png")
        );
        assert_eq!(about(&store).await.unwrap().about_description.as_deref(), Some(DEFAULT_ABOUT));
    }
}
