use crate::{
    error::{AppError, AppResult},
    models::{course, enrollment, Course, CourseModel, Enrollment, EnrollmentModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};
use std::collections::HashMap;

pub struct EnrollmentService {
    db: DatabaseConnection,
}

/// The access gate: paid courses require an enrollment row, free courses are
/// open to everyone.
pub fn lecture_access_allowed(price: f64, enrolled: bool) -> bool {
    price <= 0.0 || enrolled
}

impl EnrollmentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Enroll a user. The insert races against itself via the primary key:
    /// ON CONFLICT DO NOTHING plus a row-count check makes the
    /// check-then-insert atomic, and a duplicate attempt is a Conflict
    /// rather than a toggle-off.
    pub async fn enroll(&self, user_id: i32, course_id: i32) -> AppResult<EnrollmentModel> {
        Course::find_by_id(course_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let result = self
            .db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "INSERT INTO enrollments (user_id, course_id, progress, last_lecture_id, enrolled_at)
                 VALUES ($1, $2, 0, NULL, NOW())
                 ON CONFLICT (user_id, course_id) DO NOTHING",
                [user_id.into(), course_id.into()],
            ))
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "You are already enrolled in this course".to_string(),
            ));
        }

        self.find(user_id, course_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn find(&self, user_id: i32, course_id: i32) -> AppResult<Option<EnrollmentModel>> {
        let enrollment = Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .filter(enrollment::Column::CourseId.eq(course_id))
            .one(&self.db)
            .await?;
        Ok(enrollment)
    }

    /// Set course progress. Requires an existing enrollment row; updating
    /// progress on a course the user never enrolled in is Forbidden.
    pub async fn set_progress(
        &self,
        user_id: i32,
        course_id: i32,
        progress: i32,
    ) -> AppResult<EnrollmentModel> {
        if !(0..=100).contains(&progress) {
            return Err(AppError::Validation(
                "Progress must be a number between 0 and 100".to_string(),
            ));
        }

        let existing = self
            .find(user_id, course_id)
            .await?
            .ok_or(AppError::Forbidden)?;

        let mut active: enrollment::ActiveModel = existing.into();
        active.progress = sea_orm::ActiveValue::Set(progress);

        let updated = active.update(&self.db).await?;
        Ok(updated)
    }

    /// Best-effort bookmark of the last lecture a user opened. Not
    /// transactional with the lecture read.
    pub async fn record_last_lecture(
        &self,
        user_id: i32,
        course_id: i32,
        lecture_id: i32,
    ) -> AppResult<()> {
        self.db
            .execute(Statement::from_sql_and_values(
                sea_orm::DatabaseBackend::Postgres,
                "UPDATE enrollments SET last_lecture_id = $1
                 WHERE user_id = $2 AND course_id = $3",
                [lecture_id.into(), user_id.into(), course_id.into()],
            ))
            .await?;
        Ok(())
    }

    /// The user's enrolled courses with their enrollment state, most recent
    /// enrollment first.
    pub async fn enrolled_courses(
        &self,
        user_id: i32,
    ) -> AppResult<Vec<(CourseModel, EnrollmentModel)>> {
        let enrollments = Enrollment::find()
            .filter(enrollment::Column::UserId.eq(user_id))
            .order_by_desc(enrollment::Column::EnrolledAt)
            .all(&self.db)
            .await?;

        let course_ids: Vec<i32> = enrollments.iter().map(|e| e.course_id).collect();
        if course_ids.is_empty() {
            return Ok(vec![]);
        }

        let courses = Course::find()
            .filter(course::Column::Id.is_in(course_ids))
            .all(&self.db)
            .await?;

        let course_map: HashMap<i32, CourseModel> =
            courses.into_iter().map(|c| (c.id, c)).collect();

        Ok(enrollments
            .into_iter()
            .filter_map(|e| course_map.get(&e.course_id).cloned().map(|c| (c, e)))
            .collect())
    }
}
