use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::models::{CourseModel, EnrollmentModel, LectureModel, SectionModel};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery, SearchQuery};
use crate::services::category::CategoryService;
use crate::services::comment::CommentService;
use crate::services::course::CourseService;
use crate::services::enrollment::{lecture_access_allowed, EnrollmentService};
use crate::services::user::UserService;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::category::CategorySummary;
use super::comment::CommentResponse;
use super::user::UserSummary;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub category_id: i32,
    /// Price; 0 makes the course free
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProgressRequest {
    /// Completion percentage, 0-100
    pub progress: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub instructor_id: i32,
    pub category_id: i32,
    pub price: f64,
    pub total_duration: i32,
    pub created_at: String,
    pub updated_at: String,
    pub instructor: Option<UserSummary>,
    pub category: Option<CategorySummary>,
}

impl CourseResponse {
    fn new(
        c: CourseModel,
        instructor: Option<UserSummary>,
        category: Option<CategorySummary>,
    ) -> Self {
        Self {
            id: c.id,
            title: c.title,
            description: c.description,
            thumbnail: c.thumbnail,
            instructor_id: c.instructor_id,
            category_id: c.category_id,
            price: c.price,
            total_duration: c.total_duration,
            created_at: c.created_at.to_string(),
            updated_at: c.updated_at.to_string(),
            instructor,
            category,
        }
    }
}

/// Lecture as listed in a course outline. `video_url` and `resources` are
/// only exposed by the gated lecture endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct LectureSummary {
    pub id: i32,
    pub title: String,
    pub duration: i32,
    pub position: i32,
}

impl From<&LectureModel> for LectureSummary {
    fn from(l: &LectureModel) -> Self {
        Self {
            id: l.id,
            title: l.title.clone(),
            duration: l.duration,
            position: l.position,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionResponse {
    pub id: i32,
    pub title: String,
    pub position: i32,
    pub duration: i32,
    pub lectures: Vec<LectureSummary>,
}

impl SectionResponse {
    fn new(s: SectionModel, lectures: &[LectureModel]) -> Self {
        Self {
            id: s.id,
            title: s.title,
            position: s.position,
            duration: s.duration,
            lectures: lectures.iter().map(LectureSummary::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EnrollmentResponse {
    pub progress: i32,
    pub last_lecture_id: Option<i32>,
    pub enrolled_at: String,
}

impl From<EnrollmentModel> for EnrollmentResponse {
    fn from(e: EnrollmentModel) -> Self {
        Self {
            progress: e.progress,
            last_lecture_id: e.last_lecture_id,
            enrolled_at: e.enrolled_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseDetailResponse {
    #[serde(flatten)]
    pub course: CourseResponse,
    pub sections: Vec<SectionResponse>,
    /// Present when the calling user is enrolled
    pub enrollment: Option<EnrollmentResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LectureResponse {
    pub id: i32,
    pub section_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub duration: i32,
    pub position: i32,
    /// Opaque name -> URL mapping
    pub resources: serde_json::Value,
    pub course_id: i32,
    pub course_title: String,
    pub instructor: Option<UserSummary>,
    /// Root comments on this lecture, newest first
    pub comments: Vec<CommentResponse>,
}

/// Batch-annotate courses with instructor and category summaries.
pub(crate) async fn annotate_courses(
    db: &DatabaseConnection,
    courses: Vec<CourseModel>,
) -> AppResult<Vec<CourseResponse>> {
    let instructor_ids: Vec<i32> = courses.iter().map(|c| c.instructor_id).collect();
    let category_ids: Vec<i32> = courses.iter().map(|c| c.category_id).collect();

    let instructors = UserService::new(db.clone()).get_many(&instructor_ids).await?;
    let categories = CategoryService::new(db.clone())
        .get_many(&category_ids)
        .await?;

    Ok(courses
        .into_iter()
        .map(|c| {
            let instructor = instructors.get(&c.instructor_id).map(UserSummary::from);
            let category = categories.get(&c.category_id).map(CategorySummary::from);
            CourseResponse::new(c, instructor, category)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/courses",
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
        ("categoryId" = Option<i32>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "Paginated courses, newest first", body = PaginatedResponse<CourseResponse>),
    ),
    tag = "courses"
)]
pub async fn list_courses(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let service = CourseService::new(db.clone());
    let (courses, total) = service.list(page, limit, params.category_id).await?;
    let items = annotate_courses(&db, courses).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/courses/search",
    params(
        ("q" = String, Query, description = "Substring to match in title or description"),
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Matching courses, newest first", body = PaginatedResponse<CourseResponse>),
        (status = 400, description = "Missing query", body = AppError),
    ),
    tag = "courses"
)]
pub async fn search_courses(
    Extension(db): Extension<DatabaseConnection>,
    Query(params): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?;

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let service = CourseService::new(db.clone());
    let (courses, total) = service.search(query, page, limit).await?;
    let items = annotate_courses(&db, courses).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, limit,
    )))
}

#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with curriculum and enrollment state", body = CourseDetailResponse),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn get_course(
    Extension(db): Extension<DatabaseConnection>,
    MaybeAuthUser(auth_user): MaybeAuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CourseService::new(db.clone());
    let course = service.get_by_id(id).await?;
    let curriculum = service.curriculum(id).await?;

    let enrollment = match &auth_user {
        Some(user) => EnrollmentService::new(db.clone())
            .find(user.user_id, id)
            .await?,
        None => None,
    };

    let sections: Vec<SectionResponse> = curriculum
        .into_iter()
        .map(|(s, lectures)| SectionResponse::new(s, &lectures))
        .collect();

    let mut annotated = annotate_courses(&db, vec![course]).await?;

    Ok(ApiResponse::ok(CourseDetailResponse {
        course: annotated.remove(0),
        sections,
        enrollment: enrollment.map(EnrollmentResponse::from),
    }))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    security(("jwt_token" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 200, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "courses"
)]
pub async fn create_course(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CourseService::new(db.clone());
    let course = service
        .create(
            auth_user.user_id,
            &payload.title,
            payload.description,
            payload.thumbnail,
            payload.category_id,
            payload.price.unwrap_or(0.0),
        )
        .await?;

    let mut annotated = annotate_courses(&db, vec![course]).await?;

    Ok(ApiResponse::with_message(
        annotated.remove(0),
        "Course created successfully".to_string(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 403, description = "Not the instructor", body = AppError),
        (status = 404, description = "Course not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn update_course(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCourseRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CourseService::new(db.clone());
    let course = service
        .update(
            id,
            auth_user.user_id,
            payload.title,
            payload.description,
            payload.thumbnail,
            payload.price,
        )
        .await?;

    let mut annotated = annotate_courses(&db, vec![course]).await?;

    Ok(ApiResponse::with_message(
        annotated.remove(0),
        "Course updated successfully".to_string(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/courses/{id}/enroll",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Enrolled", body = EnrollmentResponse),
        (status = 404, description = "Course not found", body = AppError),
        (status = 409, description = "Already enrolled", body = AppError),
    ),
    tag = "courses"
)]
pub async fn enroll_course(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = EnrollmentService::new(db);
    let enrollment = service.enroll(auth_user.user_id, id).await?;

    Ok(ApiResponse::with_message(
        EnrollmentResponse::from(enrollment),
        "Successfully enrolled in course".to_string(),
    ))
}

#[utoipa::path(
    put,
    path = "/api/courses/{id}/progress",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Course ID")),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = EnrollmentResponse),
        (status = 400, description = "Progress out of range", body = AppError),
        (status = 403, description = "Not enrolled", body = AppError),
    ),
    tag = "courses"
)]
pub async fn update_progress(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ProgressRequest>,
) -> AppResult<impl IntoResponse> {
    let service = EnrollmentService::new(db);
    let enrollment = service
        .set_progress(auth_user.user_id, id, payload.progress)
        .await?;

    Ok(ApiResponse::with_message(
        EnrollmentResponse::from(enrollment),
        "Course progress updated successfully".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/lectures/{lecture_id}",
    security(("jwt_token" = [])),
    params(("lecture_id" = i32, Path, description = "Lecture ID")),
    responses(
        (status = 200, description = "Lecture content", body = LectureResponse),
        (status = 403, description = "Enrollment required for paid course", body = AppError),
        (status = 404, description = "Lecture not found", body = AppError),
    ),
    tag = "courses"
)]
pub async fn get_lecture(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(lecture_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let course_service = CourseService::new(db.clone());
    let (lecture, _section, course) = course_service.get_lecture(lecture_id).await?;

    let enrollment_service = EnrollmentService::new(db.clone());
    let enrollment = enrollment_service
        .find(auth_user.user_id, course.id)
        .await?;

    if !lecture_access_allowed(course.price, enrollment.is_some()) {
        return Err(AppError::Forbidden);
    }

    // Best-effort bookmark; the lecture read must not fail on it.
    if enrollment.is_some() {
        if let Err(e) = enrollment_service
            .record_last_lecture(auth_user.user_id, course.id, lecture.id)
            .await
        {
            tracing::warn!(
                "Failed to record last lecture for user {}: {}",
                auth_user.user_id,
                e
            );
        }
    }

    let roots = CommentService::new(db.clone())
        .roots_for_lecture(lecture_id)
        .await?;
    let comments = super::comment::annotate_comments(&db, roots).await?;

    let instructors = UserService::new(db.clone())
        .get_many(&[course.instructor_id])
        .await?;
    let instructor = instructors.get(&course.instructor_id).map(UserSummary::from);

    let resources = lecture
        .resources
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or(serde_json::Value::Null);

    Ok(ApiResponse::ok(LectureResponse {
        id: lecture.id,
        section_id: lecture.section_id,
        title: lecture.title,
        description: lecture.description,
        video_url: lecture.video_url,
        duration: lecture.duration,
        position: lecture.position,
        resources,
        course_id: course.id,
        course_title: course.title,
        instructor,
        comments,
    }))
}
