use crate::{
    error::{AppError, AppResult},
    middleware::auth::ensure_owner,
    models::{comment, Article, Comment, CommentModel, Lecture},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub struct CommentService {
    db: DatabaseConnection,
}

/// A comment attaches to exactly one of {article, lecture}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Article(i32),
    Lecture(i32),
}

impl CommentTarget {
    /// Resolve the request's optional pair into a single target. Neither and
    /// both are rejected explicitly.
    pub fn from_ids(article_id: Option<i32>, lecture_id: Option<i32>) -> AppResult<Self> {
        match (article_id, lecture_id) {
            (Some(a), None) => Ok(CommentTarget::Article(a)),
            (None, Some(l)) => Ok(CommentTarget::Lecture(l)),
            (None, None) => Err(AppError::Validation(
                "Comment must be associated with an article or a lecture".to_string(),
            )),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "Comment cannot target both an article and a lecture".to_string(),
            )),
        }
    }
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: i32,
        content: &str,
        target: CommentTarget,
        parent_id: Option<i32>,
    ) -> AppResult<CommentModel> {
        let (article_id, lecture_id) = match target {
            CommentTarget::Article(id) => {
                Article::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                (Some(id), None)
            }
            CommentTarget::Lecture(id) => {
                Lecture::find_by_id(id)
                    .one(&self.db)
                    .await?
                    .ok_or(AppError::NotFound)?;
                (None, Some(id))
            }
        };

        if let Some(pid) = parent_id {
            self.validate_parent(pid, article_id, lecture_id).await?;
        }

        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            content: sea_orm::ActiveValue::Set(content.to_string()),
            user_id: sea_orm::ActiveValue::Set(user_id),
            article_id: sea_orm::ActiveValue::Set(article_id),
            lecture_id: sea_orm::ActiveValue::Set(lecture_id),
            parent_id: sea_orm::ActiveValue::Set(parent_id),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let comment = new_comment.insert(&self.db).await?;
        Ok(comment)
    }

    /// Root comments (no parent) for an article, newest first.
    pub async fn roots_for_article(&self, article_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::ArticleId.eq(article_id))
            .filter(comment::Column::ParentId.is_null())
            .order_by_desc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Root comments (no parent) for a lecture, newest first.
    pub async fn roots_for_lecture(&self, lecture_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::LectureId.eq(lecture_id))
            .filter(comment::Column::ParentId.is_null())
            .order_by_desc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    /// Direct replies to a comment, oldest first.
    pub async fn replies(&self, parent_id: i32) -> AppResult<Vec<CommentModel>> {
        let comments = Comment::find()
            .filter(comment::Column::ParentId.eq(parent_id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn update(&self, id: i32, user_id: i32, content: &str) -> AppResult<CommentModel> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(user_id, existing.user_id)?;

        let now = chrono::Utc::now().naive_utc();

        let mut active: comment::ActiveModel = existing.into();
        active.content = sea_orm::ActiveValue::Set(content.to_string());
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(user_id, existing.user_id)?;

        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn validate_parent(
        &self,
        parent_id: i32,
        article_id: Option<i32>,
        lecture_id: Option<i32>,
    ) -> AppResult<()> {
        let parent = Comment::find_by_id(parent_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Validation("Parent comment not found".to_string()))?;

        if parent.article_id != article_id || parent.lecture_id != lecture_id {
            return Err(AppError::Validation(
                "Parent comment belongs to a different target".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_target_resolves() {
        assert_eq!(
            CommentTarget::from_ids(Some(3), None).unwrap(),
            CommentTarget::Article(3)
        );
    }

    #[test]
    fn lecture_target_resolves() {
        assert_eq!(
            CommentTarget::from_ids(None, Some(9)).unwrap(),
            CommentTarget::Lecture(9)
        );
    }

    #[test]
    fn neither_target_rejected() {
        let err = CommentTarget::from_ids(None, None).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn both_targets_rejected() {
        let err = CommentTarget::from_ids(Some(1), Some(2)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
