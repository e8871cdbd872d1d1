use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::enrollment::EnrollmentService;
use crate::services::like::LikeService;
use crate::services::user::{ProfileUpdate, UserService};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Short author/instructor representation embedded in other responses.
#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub full_name: String,
    pub avatar: Option<String>,
}

impl From<&UserModel> for UserSummary {
    fn from(u: &UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            full_name: u.full_name.clone(),
            avatar: u.avatar.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserProfileResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
}

impl From<UserModel> for UserProfileResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            bio: u.bio,
            avatar: u.avatar,
            created_at: u.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    pub avatar: Option<String>,
    /// New password; requires `current_password`
    #[validate(length(min = 8))]
    pub password: Option<String>,
    pub current_password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrolledCourseResponse {
    pub course: crate::handlers::course::CourseResponse,
    pub progress: i32,
    pub last_lecture_id: Option<i32>,
    pub enrolled_at: String,
}

#[utoipa::path(
    get,
    path = "/api/user/profile",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserProfileResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_id(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserProfileResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/user/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfileResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = UserService::new(db);
    let user = service
        .update_profile(
            auth_user.user_id,
            ProfileUpdate {
                full_name: payload.full_name,
                bio: payload.bio,
                avatar: payload.avatar,
                password: payload.password,
                current_password: payload.current_password,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        UserProfileResponse::from(user),
        "Profile updated successfully".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/user/liked-articles",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Articles the caller has liked", body = Vec<crate::handlers::article::ArticleResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_liked_articles(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db.clone());
    let articles = service.liked_articles(auth_user.user_id).await?;
    let items = crate::handlers::article::annotate_articles(&db, articles).await?;
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/user/enrolled-courses",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Courses the caller is enrolled in", body = Vec<EnrolledCourseResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_enrolled_courses(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = EnrollmentService::new(db.clone());
    let enrolled = service.enrolled_courses(auth_user.user_id).await?;

    let courses: Vec<_> = enrolled.iter().map(|(c, _)| c.clone()).collect();
    let annotated = crate::handlers::course::annotate_courses(&db, courses).await?;

    let items: Vec<EnrolledCourseResponse> = annotated
        .into_iter()
        .zip(enrolled.into_iter().map(|(_, e)| e))
        .map(|(course, e)| EnrolledCourseResponse {
            course,
            progress: e.progress,
            last_lecture_id: e.last_lecture_id,
            enrolled_at: e.enrolled_at.to_string(),
        })
        .collect();

    Ok(ApiResponse::ok(items))
}
