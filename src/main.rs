mod config;
mod error;
mod handlers;
mod middleware;
mod migration;
mod models;
mod response;
mod routes;
mod services;
mod utils;

use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        crate::handlers::signup,
        crate::handlers::signin,
        // User routes
        crate::handlers::user::get_profile,
        crate::handlers::user::update_profile,
        crate::handlers::user::get_liked_articles,
        crate::handlers::user::get_enrolled_courses,
        // Article routes
        crate::handlers::article::list_articles,
        crate::handlers::article::search_articles,
        crate::handlers::article::get_article,
        crate::handlers::article::create_article,
        crate::handlers::article::update_article,
        crate::handlers::article::delete_article,
        crate::handlers::article::like_article,
        // Course routes
        crate::handlers::course::list_courses,
        crate::handlers::course::search_courses,
        crate::handlers::course::get_course,
        crate::handlers::course::create_course,
        crate::handlers::course::update_course,
        crate::handlers::course::enroll_course,
        crate::handlers::course::update_progress,
        crate::handlers::course::get_lecture,
        // Comment routes
        crate::handlers::comment::create_comment,
        crate::handlers::comment::update_comment,
        crate::handlers::comment::delete_comment,
        crate::handlers::comment::get_replies,
        // Category routes
        crate::handlers::category::list_categories,
        // Donation routes
        crate::handlers::donation::make_donation,
        crate::handlers::donation::recent_donations,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::response::SearchQuery,
            crate::error::AppError,
            // Auth
            crate::handlers::auth::SignupRequest,
            crate::handlers::auth::SigninRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            // User
            crate::handlers::user::UserSummary,
            crate::handlers::user::UserProfileResponse,
            crate::handlers::user::UpdateProfileRequest,
            crate::handlers::user::EnrolledCourseResponse,
            // Article
            crate::handlers::article::ArticleResponse,
            crate::handlers::article::ArticleDetailResponse,
            crate::handlers::article::CreateArticleRequest,
            crate::handlers::article::UpdateArticleRequest,
            crate::handlers::article::LikeToggleResponse,
            // Course
            crate::handlers::course::CourseResponse,
            crate::handlers::course::CourseDetailResponse,
            crate::handlers::course::CreateCourseRequest,
            crate::handlers::course::UpdateCourseRequest,
            crate::handlers::course::SectionResponse,
            crate::handlers::course::LectureSummary,
            crate::handlers::course::LectureResponse,
            crate::handlers::course::EnrollmentResponse,
            crate::handlers::course::ProgressRequest,
            // Comment
            crate::handlers::comment::CommentResponse,
            crate::handlers::comment::CreateCommentRequest,
            crate::handlers::comment::UpdateCommentRequest,
            // Category
            crate::handlers::category::CategorySummary,
            // Donation
            crate::handlers::donation::CreateDonationRequest,
            crate::handlers::donation::DonationReceipt,
            crate::handlers::donation::RecentDonation,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "users", description = "User profile operations"),
        (name = "articles", description = "Article management operations"),
        (name = "courses", description = "Course, curriculum and enrollment operations"),
        (name = "comments", description = "Comment management operations"),
        (name = "categories", description = "Category listing"),
        (name = "donations", description = "Donation operations"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnhub=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    // Initialize JWT config
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting LearnHub API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app().layer(Extension(db));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<crate::config::jwt::JwtConfig> {
    // JWT config, validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL is checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "LearnHub API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
