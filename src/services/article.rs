use crate::{
    error::{AppError, AppResult},
    middleware::auth::ensure_owner,
    models::{article, Article, ArticleModel},
    services::category::CategoryService,
};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Statement,
};

pub struct ArticleService {
    db: DatabaseConnection,
}

impl ArticleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest-first paginated listing with an optional exact category filter.
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        category_id: Option<i32>,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let mut query = Article::find();
        if let Some(cid) = category_id {
            query = query.filter(article::Column::CategoryId.eq(cid));
        }

        let paginator = query
            .order_by_desc(article::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((articles, total))
    }

    /// Substring search over title OR content. Search and the category filter
    /// are separate entry points by design.
    pub async fn search(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<ArticleModel>, u64)> {
        let pattern = format!("%{}%", query);
        let paginator = Article::find()
            .filter(
                Condition::any()
                    .add(Expr::col(article::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(article::Column::Content).ilike(pattern)),
            )
            .order_by_desc(article::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let articles = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((articles, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<ArticleModel> {
        Article::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        author_id: i32,
        title: &str,
        content: &str,
        thumbnail: Option<String>,
        category_id: i32,
    ) -> AppResult<ArticleModel> {
        if !CategoryService::new(self.db.clone()).exists(category_id).await? {
            return Err(AppError::Validation("Category not found".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();

        let new_article = article::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            content: sea_orm::ActiveValue::Set(content.to_string()),
            thumbnail: sea_orm::ActiveValue::Set(thumbnail),
            author_id: sea_orm::ActiveValue::Set(author_id),
            category_id: sea_orm::ActiveValue::Set(category_id),
            views: sea_orm::ActiveValue::Set(0),
            likes: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let article = new_article.insert(&self.db).await?;
        Ok(article)
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        title: Option<String>,
        content: Option<String>,
        thumbnail: Option<String>,
        category_id: Option<i32>,
    ) -> AppResult<ArticleModel> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(user_id, existing.author_id)?;

        if let Some(cid) = category_id {
            if !CategoryService::new(self.db.clone()).exists(cid).await? {
                return Err(AppError::Validation("Category not found".to_string()));
            }
        }

        let now = chrono::Utc::now().naive_utc();

        let mut active: article::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(content) = content {
            active.content = sea_orm::ActiveValue::Set(content);
        }
        if let Some(thumbnail) = thumbnail {
            active.thumbnail = sea_orm::ActiveValue::Set(Some(thumbnail));
        }
        if let Some(cid) = category_id {
            active.category_id = sea_orm::ActiveValue::Set(cid);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(user_id, existing.author_id)?;

        Article::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    /// Fire-and-forget view counter. Lost updates under concurrent reads are
    /// acceptable for an approximate counter.
    pub async fn increment_views(&self, id: i32) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE articles SET views = views + 1 WHERE id = $1",
                [id.into()],
            ))
            .await?;
        Ok(())
    }
}
