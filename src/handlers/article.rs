use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::ArticleModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, SearchQuery};
use crate::services::article::ArticleService;
use crate::services::category::CategoryService;
use crate::services::comment::CommentService;
use crate::services::like::LikeService;
use crate::services::user::UserService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::category::CategorySummary;
use super::comment::CommentResponse;
use super::user::UserSummary;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateArticleRequest {
    /// Article title (1-255 characters)
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub content: String,
    pub thumbnail: Option<String>,
    pub category_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub thumbnail: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub author_id: i32,
    pub category_id: i32,
    pub views: i32,
    pub likes: i32,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<UserSummary>,
    pub category: Option<CategorySummary>,
}

impl ArticleResponse {
    fn new(
        a: ArticleModel,
        author: Option<UserSummary>,
        category: Option<CategorySummary>,
    ) -> Self {
        Self {
            id: a.id,
            title: a.title,
            content: a.content,
            thumbnail: a.thumbnail,
            author_id: a.author_id,
            category_id: a.category_id,
            views: a.views,
            likes: a.likes,
            created_at: a.created_at.to_string(),
            updated_at: a.updated_at.to_string(),
            author,
            category,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: ArticleResponse,
    /// Whether the calling user has liked this article; false for anonymous
    pub is_liked: bool,
    /// Root comments, newest first. Replies are fetched separately.
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeToggleResponse {
    pub liked: bool,
    pub likes: i32,
}

/// Batch-annotate articles with author and category summaries.
pub(crate) async fn annotate_articles(
    db: &DatabaseConnection,
    articles: Vec<ArticleModel>,
) -> AppResult<Vec<ArticleResponse>> {
    let author_ids: Vec<i32> = articles.iter().map(|a| a.author_id).collect();
    let category_ids: Vec<i32> = articles.iter().map(|a| a.category_id).collect();

    let authors = UserService::new(db.clone()).get_many(&author_ids).await?;
    let categories = CategoryService::new(db.clone())
        .get_many(&category_ids)
        .await?;

    Ok(articles
        .into_iter()
        .map(|a| {
            let author = authors.get(&a.author_id).map(UserSummary::from);
            let category = categories.get(&a.category_id).map(CategorySummary::from);
            ArticleResponse::new(a, author, category)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/articles",
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("categoryId" = Option<i32>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "Paginated articles, newest first", body = PaginatedResponse<ArticleResponse>),
    ),
    tag = "articles"
)]
pub async fn list_articles(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.list(page, limit, params.category_id).await?;
    let items = annotate_articles(&db, articles).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/articles/search",
    params(
        ("q" = String, Query, description = "Substring to match in title or content"),
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Matching articles, newest first", body = PaginatedResponse<ArticleResponse>),
        (status = 400, description = "Missing query", body = AppError),
    ),
    tag = "articles"
)]
pub async fn search_articles(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let service = ArticleService::new(db.clone());
    let (articles, total) = service.search(query, page, limit).await?;
    let items = annotate_articles(&db, articles).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article with root comments", body = ArticleDetailResponse),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn get_article(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ArticleService::new(db.clone());
    let article = service.get_by_id(id).await?;

    // Approximate counter; a lost update here is fine.
    if let Err(e) = service.increment_views(id).await {
        tracing::warn!("Failed to increment views for article {}: {}", id, e);
    }

    let is_liked = match &auth_user {
        Some(user) => LikeService::new(db.clone()).is_liked(user.user_id, id).await?,
        None => false,
    };

    let roots = CommentService::new(db.clone()).roots_for_article(id).await?;
    let comments = super::comment::annotate_comments(&db, roots).await?;

    let mut annotated = annotate_articles(&db, vec![article]).await?;

    Ok(ApiResponse::ok(ArticleDetailResponse {
        article: annotated.remove(0),
        is_liked,
        comments,
    }))
}

#[utoipa::path(
    post,
    path = "/api/articles",
    security(("jwt_token" = [])),
    request_body = CreateArticleRequest,
    responses(
        (status = 200, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "articles"
)]
pub async fn create_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ArticleService::new(db.clone());
    let article = service
        .create(
            auth_user.user_id,
            &payload.title,
            &payload.content,
            payload.thumbnail,
            payload.category_id,
        )
        .await?;

    let mut annotated = annotate_articles(&db, vec![article]).await?;

    Ok(ApiResponse::with_message(
        annotated.remove(0),
        "Article created successfully".to_string(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn update_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateArticleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ArticleService::new(db.clone());
    let article = service
        .update(
            id,
            auth_user.user_id,
            payload.title,
            payload.content,
            payload.thumbnail,
            payload.category_id,
        )
        .await?;

    let mut annotated = annotate_articles(&db, vec![article]).await?;

    Ok(ApiResponse::with_message(
        annotated.remove(0),
        "Article updated successfully".to_string(),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = String),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn delete_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = ArticleService::new(db);
    service.delete(id, auth_user.user_id).await?;

    Ok(ApiResponse::ok("Article deleted"))
}

#[utoipa::path(
    post,
    path = "/api/articles/{id}/like",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Like toggled", body = LikeToggleResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 404, description = "Article not found", body = AppError),
    ),
    tag = "articles"
)]
pub async fn like_article(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = LikeService::new(db);
    let change = service.toggle(auth_user.user_id, id).await?;

    let message = if change.liked {
        "Article liked successfully"
    } else {
        "Article unliked successfully"
    };

    Ok(ApiResponse::with_message(
        LikeToggleResponse {
            liked: change.liked,
            likes: change.likes,
        },
        message.to_string(),
    ))
}
