use crate::{
    error::{AppError, AppResult},
    models::{donation, user, Donation, DonationModel, User, UserModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::collections::HashMap;

pub struct DonationService {
    db: DatabaseConnection,
}

pub struct NewDonation {
    pub amount: f64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
    pub is_anonymous: bool,
}

/// Display-name resolution for the public donation feed. Emails are never
/// exposed here.
pub fn display_name(
    is_anonymous: bool,
    name: Option<&str>,
    donor_full_name: Option<&str>,
) -> String {
    if is_anonymous {
        return "Anonymous".to_string();
    }
    name.or(donor_full_name).unwrap_or("Unknown").to_string()
}

impl DonationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record a donation. Payment processing is out of scope; this only
    /// validates and persists the record.
    pub async fn create(
        &self,
        user_id: Option<i32>,
        donation: NewDonation,
    ) -> AppResult<DonationModel> {
        if donation.amount <= 0.0 {
            return Err(AppError::Validation(
                "Donation amount must be positive".to_string(),
            ));
        }

        if donation.is_anonymous && donation.email.is_none() {
            return Err(AppError::Validation(
                "Email is required for anonymous donations".to_string(),
            ));
        }

        // Anonymous donations are never attributed to an account.
        let recorded_user_id = if donation.is_anonymous { None } else { user_id };

        let now = chrono::Utc::now().naive_utc();

        let new_donation = donation::ActiveModel {
            amount: sea_orm::ActiveValue::Set(donation.amount),
            user_id: sea_orm::ActiveValue::Set(recorded_user_id),
            email: sea_orm::ActiveValue::Set(donation.email),
            name: sea_orm::ActiveValue::Set(donation.name),
            message: sea_orm::ActiveValue::Set(donation.message),
            is_anonymous: sea_orm::ActiveValue::Set(donation.is_anonymous),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let donation = new_donation.insert(&self.db).await?;
        Ok(donation)
    }

    /// The ten most recent donations with their donors resolved for display.
    pub async fn recent(&self) -> AppResult<Vec<(DonationModel, Option<UserModel>)>> {
        let donations = Donation::find()
            .order_by_desc(donation::Column::CreatedAt)
            .limit(10)
            .all(&self.db)
            .await?;

        let user_ids: Vec<i32> = donations.iter().filter_map(|d| d.user_id).collect();
        let users: HashMap<i32, UserModel> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            User::find()
                .filter(user::Column::Id.is_in(user_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        Ok(donations
            .into_iter()
            .map(|d| {
                let donor = d.user_id.and_then(|id| users.get(&id).cloned());
                (d, donor)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_hides_everything() {
        assert_eq!(
            display_name(true, Some("Alice"), Some("Alice Smith")),
            "Anonymous"
        );
    }

    #[test]
    fn explicit_name_wins() {
        assert_eq!(
            display_name(false, Some("Alice"), Some("Alice Smith")),
            "Alice"
        );
    }

    #[test]
    fn falls_back_to_donor_full_name() {
        assert_eq!(display_name(false, None, Some("Alice Smith")), "Alice Smith");
    }

    #[test]
    fn unknown_when_nothing_available() {
        assert_eq!(display_name(false, None, None), "Unknown");
    }
}
