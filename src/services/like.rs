use crate::{
    error::{AppError, AppResult},
    models::{article, article_like, Article, ArticleLike, ArticleModel},
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Statement, TransactionTrait,
};
use std::collections::HashMap;

pub struct LikeService {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, Copy)]
pub struct LikeChange {
    pub liked: bool,
    pub likes: i32,
}

impl LikeService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Toggle a like. The join-row mutation and the denormalized counter
    /// update run in one transaction, and the counter only moves when the
    /// mutation actually changed a row. Two racing toggles both pass the
    /// membership check, but the second insert (or delete) affects zero
    /// rows, so the counter stays equal to the join table's cardinality.
    pub async fn toggle(&self, user_id: i32, article_id: i32) -> AppResult<LikeChange> {
        Article::find_by_id(article_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let txn = self.db.begin().await?;

        let existing = ArticleLike::find()
            .filter(article_like::Column::UserId.eq(user_id))
            .filter(article_like::Column::ArticleId.eq(article_id))
            .one(&txn)
            .await?;

        let liked = if existing.is_some() {
            let deleted = ArticleLike::delete_many()
                .filter(article_like::Column::UserId.eq(user_id))
                .filter(article_like::Column::ArticleId.eq(article_id))
                .exec(&txn)
                .await?;

            if deleted.rows_affected > 0 {
                txn.execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "UPDATE articles SET likes = GREATEST(likes - 1, 0) WHERE id = $1",
                    [article_id.into()],
                ))
                .await?;
            }

            false
        } else {
            let inserted = txn
                .execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "INSERT INTO article_likes (user_id, article_id, created_at)
                     VALUES ($1, $2, NOW())
                     ON CONFLICT (user_id, article_id) DO NOTHING",
                    [user_id.into(), article_id.into()],
                ))
                .await?;

            if inserted.rows_affected() > 0 {
                txn.execute(Statement::from_sql_and_values(
                    sea_orm::DatabaseBackend::Postgres,
                    "UPDATE articles SET likes = likes + 1 WHERE id = $1",
                    [article_id.into()],
                ))
                .await?;
            }

            true
        };

        let likes = Article::find_by_id(article_id)
            .one(&txn)
            .await?
            .map(|a| a.likes)
            .unwrap_or(0);

        txn.commit().await?;

        Ok(LikeChange { liked, likes })
    }

    pub async fn is_liked(&self, user_id: i32, article_id: i32) -> AppResult<bool> {
        let existing = ArticleLike::find()
            .filter(article_like::Column::UserId.eq(user_id))
            .filter(article_like::Column::ArticleId.eq(article_id))
            .one(&self.db)
            .await?;
        Ok(existing.is_some())
    }

    /// Articles the user has liked, most recently liked first.
    pub async fn liked_articles(&self, user_id: i32) -> AppResult<Vec<ArticleModel>> {
        let likes = ArticleLike::find()
            .filter(article_like::Column::UserId.eq(user_id))
            .order_by_desc(article_like::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let article_ids: Vec<i32> = likes.iter().map(|l| l.article_id).collect();
        if article_ids.is_empty() {
            return Ok(vec![]);
        }

        let articles = Article::find()
            .filter(article::Column::Id.is_in(article_ids.clone()))
            .all(&self.db)
            .await?;

        let article_map: HashMap<i32, ArticleModel> =
            articles.into_iter().map(|a| (a.id, a)).collect();
        let ordered: Vec<ArticleModel> = article_ids
            .into_iter()
            .filter_map(|id| article_map.get(&id).cloned())
            .collect();

        Ok(ordered)
    }
}
