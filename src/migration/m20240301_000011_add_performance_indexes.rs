use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_articles_author_id ON articles(author_id)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_courses_instructor_id ON courses(instructor_id)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_courses_created_at ON courses(created_at)",
        )
        .await?;

        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP INDEX IF EXISTS idx_articles_author_id")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_courses_instructor_id")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_courses_created_at")
            .await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_comments_user_id")
            .await?;

        Ok(())
    }
}
