use crate::error::{AppError, AppResult};
use crate::middleware::auth::MaybeAuthUser;
use crate::response::ApiResponse;
use crate::services::donation::{display_name, DonationService, NewDonation};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDonationRequest {
    pub amount: f64,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DonationReceipt {
    pub id: i32,
    pub amount: f64,
    pub is_anonymous: bool,
    pub created_at: String,
}

/// Public feed entry. No email, no user id.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentDonation {
    pub name: String,
    pub amount: f64,
    pub message: Option<String>,
    pub created_at: String,
}

#[utoipa::path(
    post,
    path = "/api/donations",
    request_body = CreateDonationRequest,
    responses(
        (status = 200, description = "Donation recorded", body = DonationReceipt),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "donations"
)]
pub async fn make_donation(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
    Json(payload): Json<CreateDonationRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = DonationService::new(db);
    let donation = service
        .create(
            auth_user.map(|u| u.user_id),
            NewDonation {
                amount: payload.amount,
                email: payload.email,
                name: payload.name,
                message: payload.message,
                is_anonymous: payload.is_anonymous,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        DonationReceipt {
            id: donation.id,
            amount: donation.amount,
            is_anonymous: donation.is_anonymous,
            created_at: donation.created_at.to_string(),
        },
        "Thank you for your donation".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/donations/recent",
    responses(
        (status = 200, description = "Ten most recent donations", body = [RecentDonation]),
    ),
    tag = "donations"
)]
pub async fn recent_donations(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = DonationService::new(db);
    let recent = service.recent().await?;

    let items: Vec<RecentDonation> = recent
        .into_iter()
        .map(|(d, donor)| RecentDonation {
            name: display_name(
                d.is_anonymous,
                d.name.as_deref(),
                donor.as_ref().map(|u| u.full_name.as_str()),
            ),
            amount: d.amount,
            message: d.message,
            created_at: d.created_at.to_string(),
        })
        .collect();

    Ok(ApiResponse::ok(items))
}
