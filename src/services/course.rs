use crate::{
    error::{AppError, AppResult},
    middleware::auth::ensure_owner,
    models::{
        course, lecture, section, Course, CourseModel, Lecture, LectureModel, Section,
        SectionModel,
    },
    services::category::CategoryService,
};
use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

pub struct CourseService {
    db: DatabaseConnection,
}

impl CourseService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        category_id: Option<i32>,
    ) -> AppResult<(Vec<CourseModel>, u64)> {
        let mut query = Course::find();
        if let Some(cid) = category_id {
            query = query.filter(course::Column::CategoryId.eq(cid));
        }

        let paginator = query
            .order_by_desc(course::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let courses = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((courses, total))
    }

    /// Substring search over title OR description.
    pub async fn search(
        &self,
        query: &str,
        page: u64,
        limit: u64,
    ) -> AppResult<(Vec<CourseModel>, u64)> {
        let pattern = format!("%{}%", query);
        let paginator = Course::find()
            .filter(
                Condition::any()
                    .add(Expr::col(course::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(course::Column::Description).ilike(pattern)),
            )
            .order_by_desc(course::Column::CreatedAt)
            .paginate(&self.db, limit);

        let total = paginator.num_items().await?;
        let courses = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((courses, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CourseModel> {
        Course::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        instructor_id: i32,
        title: &str,
        description: Option<String>,
        thumbnail: Option<String>,
        category_id: i32,
        price: f64,
    ) -> AppResult<CourseModel> {
        if price < 0.0 {
            return Err(AppError::Validation(
                "Course price must not be negative".to_string(),
            ));
        }
        if !CategoryService::new(self.db.clone()).exists(category_id).await? {
            return Err(AppError::Validation("Category not found".to_string()));
        }

        let now = chrono::Utc::now().naive_utc();

        let new_course = course::ActiveModel {
            title: sea_orm::ActiveValue::Set(title.to_string()),
            description: sea_orm::ActiveValue::Set(description),
            thumbnail: sea_orm::ActiveValue::Set(thumbnail),
            instructor_id: sea_orm::ActiveValue::Set(instructor_id),
            category_id: sea_orm::ActiveValue::Set(category_id),
            price: sea_orm::ActiveValue::Set(price),
            total_duration: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let course = new_course.insert(&self.db).await?;
        Ok(course)
    }

    pub async fn update(
        &self,
        id: i32,
        user_id: i32,
        title: Option<String>,
        description: Option<String>,
        thumbnail: Option<String>,
        price: Option<f64>,
    ) -> AppResult<CourseModel> {
        let existing = self.get_by_id(id).await?;
        ensure_owner(user_id, existing.instructor_id)?;

        if let Some(price) = price {
            if price < 0.0 {
                return Err(AppError::Validation(
                    "Course price must not be negative".to_string(),
                ));
            }
        }

        let now = chrono::Utc::now().naive_utc();

        let mut active: course::ActiveModel = existing.into();
        if let Some(title) = title {
            active.title = sea_orm::ActiveValue::Set(title);
        }
        if let Some(description) = description {
            active.description = sea_orm::ActiveValue::Set(Some(description));
        }
        if let Some(thumbnail) = thumbnail {
            active.thumbnail = sea_orm::ActiveValue::Set(Some(thumbnail));
        }
        if let Some(price) = price {
            active.price = sea_orm::ActiveValue::Set(price);
        }
        active.updated_at = sea_orm::ActiveValue::Set(now);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Sections with their lectures, both ordered by position. Two queries,
    /// grouped in memory.
    pub async fn curriculum(
        &self,
        course_id: i32,
    ) -> AppResult<Vec<(SectionModel, Vec<LectureModel>)>> {
        let sections = Section::find()
            .filter(section::Column::CourseId.eq(course_id))
            .order_by_asc(section::Column::Position)
            .all(&self.db)
            .await?;

        if sections.is_empty() {
            return Ok(vec![]);
        }

        let section_ids: Vec<i32> = sections.iter().map(|s| s.id).collect();
        let lectures = Lecture::find()
            .filter(lecture::Column::SectionId.is_in(section_ids))
            .order_by_asc(lecture::Column::Position)
            .all(&self.db)
            .await?;

        let mut grouped: Vec<(SectionModel, Vec<LectureModel>)> =
            sections.into_iter().map(|s| (s, Vec::new())).collect();
        for lec in lectures {
            if let Some((_, list)) = grouped.iter_mut().find(|(s, _)| s.id == lec.section_id) {
                list.push(lec);
            }
        }

        Ok(grouped)
    }

    /// Lecture with its section and course context.
    pub async fn get_lecture(
        &self,
        lecture_id: i32,
    ) -> AppResult<(LectureModel, SectionModel, CourseModel)> {
        let lecture = Lecture::find_by_id(lecture_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let section = Section::find_by_id(lecture.section_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let course = Course::find_by_id(section.course_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok((lecture, section, course))
    }
}
