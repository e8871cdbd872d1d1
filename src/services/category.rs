use crate::{
    error::AppResult,
    models::{category, Category, CategoryModel},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::collections::HashMap;

pub struct CategoryService {
    db: DatabaseConnection,
}

impl CategoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        let categories = Category::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        Ok(Category::find_by_id(id).one(&self.db).await?.is_some())
    }

    pub async fn get_many(&self, ids: &[i32]) -> AppResult<HashMap<i32, CategoryModel>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let categories = Category::find()
            .filter(category::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;

        Ok(categories.into_iter().map(|c| (c.id, c)).collect())
    }
}
