use sea_orm_migration::prelude::*;

mod m20240301_000001_create_users_table;
mod m20240301_000002_create_categories_table;
mod m20240301_000003_create_articles_table;
mod m20240301_000004_create_courses_table;
mod m20240301_000005_create_sections_table;
mod m20240301_000006_create_lectures_table;
mod m20240301_000007_create_comments_table;
mod m20240301_000008_create_donations_table;
mod m20240301_000009_create_article_likes_table;
mod m20240301_000010_create_enrollments_table;
mod m20240301_000011_add_performance_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_users_table::Migration),
            Box::new(m20240301_000002_create_categories_table::Migration),
            Box::new(m20240301_000003_create_articles_table::Migration),
            Box::new(m20240301_000004_create_courses_table::Migration),
            Box::new(m20240301_000005_create_sections_table::Migration),
            Box::new(m20240301_000006_create_lectures_table::Migration),
            Box::new(m20240301_000007_create_comments_table::Migration),
            Box::new(m20240301_000008_create_donations_table::Migration),
            Box::new(m20240301_000009_create_article_likes_table::Migration),
            Box::new(m20240301_000010_create_enrollments_table::Migration),
            Box::new(m20240301_000011_add_performance_indexes::Migration),
        ]
    }
}
