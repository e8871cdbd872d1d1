use crate::error::AppResult;
use crate::models::CategoryModel;
use crate::response::ApiResponse;
use crate::services::category::CategoryService;
use axum::{response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Clone, ToSchema)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
}

impl From<&CategoryModel> for CategorySummary {
    fn from(c: &CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategorySummary>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(db);
    let categories = service.list().await?;
    let items: Vec<CategorySummary> = categories.iter().map(CategorySummary::from).collect();
    Ok(ApiResponse::ok(items))
}
