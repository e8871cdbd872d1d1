use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "CREATE TABLE IF NOT EXISTS categories (
                id SERIAL PRIMARY KEY,
                name VARCHAR(100) NOT NULL UNIQUE
            )",
        )
        .await?;

        // There is no category-authoring endpoint; start with a usable set.
        db.execute_unprepared(
            "INSERT INTO categories (name) VALUES
                ('Programming'),
                ('Design'),
                ('Business'),
                ('Science'),
                ('General')
             ON CONFLICT (name) DO NOTHING",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS categories")
            .await?;
        Ok(())
    }
}
