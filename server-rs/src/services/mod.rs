pub mod access;
pub mod accounts;
pub mod booking;
pub mod enquiries;
pub mod fields;
pub mod reviews;
pub mod settings;
pub mod teams;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Zero-based page and a size in `1..=200`.
pub fn page_params(page: Option<i64>, size: Option<i64>) -> AppResult<(i64, i64)> {
    let page = page.unwrap_or(0);
    let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 0 {
        return Err(AppError::BadRequest("Page number must be >= 0".into()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(AppError::BadRequest(format!(
            "Page size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok((page, size))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::models::{Field, NewField, NewUser, Role, User};
    use crate::store::{MemoryStore, Store};

    pub async fn seed_user(store: &MemoryStore, email: &str, role: Role) -> User {
        store
            .create_user(NewUser {
                name: email.split('@').next().unwrap_or("user").to_string(),
                email: email.to_string(),
                phone: "01012345678".to_string(),
                password_hash: bcrypt::hash("secret1", 4).unwrap(),
                role,
            })
            .await
            .unwrap()
    }

    pub async fn seed_field(store: &MemoryStore, name: &str, active: bool) -> Field {
        let mut field = store
            .create_field(NewField {
                name: name.to_string(),
                images: String::new(),
                players_capacity: 10,
                location_address: "Nasr City, Cairo".to_string(),
            })
            .await
            .unwrap();
        if !active {
            field.is_active = false;
            field = store.update_field(&field).await.unwrap();
        }
        field
    }
}
