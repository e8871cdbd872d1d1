use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS course_lectures (
                id SERIAL PRIMARY KEY,
                section_id INTEGER NOT NULL REFERENCES course_sections(id) ON DELETE CASCADE,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                video_url VARCHAR(255),
                duration INTEGER NOT NULL DEFAULT 0,
                position INTEGER NOT NULL,
                resources TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .await?;

        db.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_lectures_section_position
             ON course_lectures(section_id, position)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS course_lectures")
            .await?;
        Ok(())
    }
}
