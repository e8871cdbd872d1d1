use crate::{
    error::{AppError, AppResult},
    models::{user, User, UserModel},
    utils::{hash_password, verify_password},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashMap;

pub struct UserService {
    db: DatabaseConnection,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<UserModel> {
        User::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    /// Batch lookup for annotating lists with author summaries.
    pub async fn get_many(&self, ids: &[i32]) -> AppResult<HashMap<i32, UserModel>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Update profile fields. A password change requires the current password.
    pub async fn update_profile(&self, user_id: i32, update: ProfileUpdate) -> AppResult<UserModel> {
        let existing = self.get_by_id(user_id).await?;

        let new_password_hash = match (&update.password, &update.current_password) {
            (Some(new), Some(current)) => {
                if !verify_password(current, &existing.password_hash)? {
                    return Err(AppError::Unauthorized);
                }
                Some(hash_password(new)?)
            }
            (Some(_), None) => {
                return Err(AppError::Validation(
                    "Current password is required to change password".to_string(),
                ));
            }
            _ => None,
        };

        let now = chrono::Utc::now().naive_utc();

        let mut active: user::ActiveModel = existing.into();
        if let Some(full_name) = update.full_name {
            active.full_name = sea_orm::ActiveValue::Set(full_name);
        }
        if let Some(bio) = update.bio {
            active.bio = sea_orm::ActiveValue::Set(Some(bio));
        }
        if let Some(avatar) = update.avatar {
            active.avatar = sea_orm::ActiveValue::Set(Some(avatar));
        }
        if let Some(hash) = new_password_hash {
            active.password_hash = sea_orm::ActiveValue::Set(hash);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }
}
