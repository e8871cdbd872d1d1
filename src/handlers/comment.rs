use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::CommentModel;
use crate::response::ApiResponse;
use crate::services::comment::{CommentService, CommentTarget};
use crate::services::user::UserService;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::user::UserSummary;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
    /// Target article; exactly one of article_id/lecture_id must be set
    pub article_id: Option<i32>,
    /// Target lecture; exactly one of article_id/lecture_id must be set
    pub lecture_id: Option<i32>,
    /// Parent comment for replies
    pub parent_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub article_id: Option<i32>,
    pub lecture_id: Option<i32>,
    pub parent_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<UserSummary>,
}

impl CommentResponse {
    fn new(c: CommentModel, author: Option<UserSummary>) -> Self {
        Self {
            id: c.id,
            content: c.content,
            user_id: c.user_id,
            article_id: c.article_id,
            lecture_id: c.lecture_id,
            parent_id: c.parent_id,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
            author,
        }
    }
}

/// Batch-annotate comments with their author summaries.
pub(crate) async fn annotate_comments(
    db: &DatabaseConnection,
    comments: Vec<CommentModel>,
) -> AppResult<Vec<CommentResponse>> {
    let user_ids: Vec<i32> = comments.iter().map(|c| c.user_id).collect();
    let users = UserService::new(db.clone()).get_many(&user_ids).await?;

    Ok(comments
        .into_iter()
        .map(|c| {
            let author = users.get(&c.user_id).map(UserSummary::from);
            CommentResponse::new(c, author)
        })
        .collect())
}

#[utoipa::path(
    post,
    path = "/api/comments",
    security(("jwt_token" = [])),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Target not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let target = CommentTarget::from_ids(payload.article_id, payload.lecture_id)?;

    let service = CommentService::new(db.clone());
    let comment = service
        .create(auth_user.user_id, &payload.content, target, payload.parent_id)
        .await?;

    let mut annotated = annotate_comments(&db, vec![comment]).await?;
    let response = annotated.remove(0);

    Ok(ApiResponse::with_message(
        response,
        "Comment created successfully".to_string(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 403, description = "Not the comment author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn update_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CommentService::new(db.clone());
    let comment = service
        .update(id, auth_user.user_id, &payload.content)
        .await?;

    let mut annotated = annotate_comments(&db, vec![comment]).await?;
    Ok(ApiResponse::ok(annotated.remove(0)))
}

#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted", body = String),
        (status = 403, description = "Not the comment author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    service.delete(id, auth_user.user_id).await?;

    Ok(ApiResponse::ok("Comment deleted"))
}

#[utoipa::path(
    get,
    path = "/api/comments/{id}/replies",
    params(("id" = i32, Path, description = "Parent comment ID")),
    responses(
        (status = 200, description = "Direct replies, oldest first", body = Vec<CommentResponse>),
    ),
    tag = "comments"
)]
pub async fn get_replies(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db.clone());
    let replies = service.replies(id).await?;
    let items = annotate_comments(&db, replies).await?;
    Ok(ApiResponse::ok(items))
}
