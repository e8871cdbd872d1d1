#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Once, OnceLock,
};
use tokio::sync::{Mutex, MutexGuard};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
// Tests in one binary share the database and truncate it; run them one at
// a time.
static DB_EXCLUSIVE: OnceLock<Mutex<()>> = OnceLock::new();

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        // Rate limiting gets in the way of rapid-fire test requests
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = learnhub::config::jwt::JwtConfig::from_env().unwrap();
        let _ = learnhub::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _exclusive: MutexGuard<'static, ()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let exclusive = DB_EXCLUSIVE.get_or_init(|| Mutex::new(())).lock().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        learnhub::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order); categories keep their seed
    cleanup_tables(&db).await;

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(learnhub::routes::create_routes())
        .layer(axum::middleware::from_fn(
            learnhub::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let addr_str = format!("http://{}", addr);
    let client = Client::new();

    TestApp {
        addr: addr_str,
        db,
        client,
        _exclusive: exclusive,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = [
        "enrollments",
        "article_likes",
        "donations",
        "comments",
        "course_lectures",
        "course_sections",
        "courses",
        "articles",
        "users",
    ];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register and sign in a user, returning (user_id, token).
pub async fn create_test_user(app: &TestApp, username_prefix: &str) -> (i32, String) {
    static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let unique_username = format!("{}_{}", username_prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/signup"))
        .json(&serde_json::json!({
            "username": unique_username,
            "email": format!("{}@test.com", unique_username),
            "password": "test_password_123",
            "full_name": format!("Test User {}", counter),
        }))
        .send()
        .await
        .expect("Failed to sign up user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse signup response for user '{}': status={}, error={}",
            unique_username, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to sign up user '{}': status={}, body={}",
            unique_username, status, body
        );
    }

    let user_id = body["data"]["id"].as_i64().unwrap_or_else(|| {
        panic!(
            "Signup response missing id for user '{}': {:?}",
            unique_username, body
        )
    }) as i32;

    let resp = app
        .client
        .post(app.url("/auth/signin"))
        .json(&serde_json::json!({
            "username": unique_username,
            "password": "test_password_123",
        }))
        .send()
        .await
        .expect("Failed to sign in user");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse signin response");
    let token = body["data"]["access_token"]
        .as_str()
        .unwrap_or_else(|| panic!("Signin response missing access_token: {:?}", body))
        .to_string();

    (user_id, token)
}

/// First seeded category id, via the public endpoint.
pub async fn get_category_id(app: &TestApp) -> i32 {
    let resp = app
        .client
        .get(app.url("/categories"))
        .send()
        .await
        .expect("Failed to list categories");

    let body: serde_json::Value = resp.json().await.expect("Failed to parse categories");
    body["data"][0]["id"]
        .as_i64()
        .expect("Categories response missing id") as i32
}

/// Create an article via the API and return its id.
pub async fn create_test_article(app: &TestApp, token: &str, title: &str) -> i32 {
    let category_id = get_category_id(app).await;

    let resp = app
        .client
        .post(app.url("/articles"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "content": "Some article content long enough to be useful.",
            "category_id": category_id,
        }))
        .send()
        .await
        .expect("Failed to create article");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse article response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create article: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("Article missing id") as i32
}

/// Create a course via the API and return its id.
pub async fn create_test_course(app: &TestApp, token: &str, title: &str, price: f64) -> i32 {
    let category_id = get_category_id(app).await;

    let resp = app
        .client
        .post(app.url("/courses"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "description": "A test course",
            "category_id": category_id,
            "price": price,
        }))
        .send()
        .await
        .expect("Failed to create course");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse course response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create course: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("Course missing id") as i32
}

/// Read an article's denormalized like counter alongside the join-table
/// cardinality, straight from the database.
pub async fn like_counts(db: &DatabaseConnection, article_id: i32) -> (i64, i64) {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT likes::bigint, \
             (SELECT COUNT(*) FROM article_likes WHERE article_id = articles.id) \
             FROM articles WHERE id = $1",
            vec![article_id.into()],
        ))
        .await
        .expect("Failed to read like counts")
        .expect("Article not found");

    (
        row.try_get_by_index::<i64>(0).unwrap(),
        row.try_get_by_index::<i64>(1).unwrap(),
    )
}

/// Seed a section directly; there is no authoring endpoint for curriculum.
pub async fn seed_section(db: &DatabaseConnection, course_id: i32, position: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "INSERT INTO course_sections (course_id, title, position, duration) \
             VALUES ($1, $2, $3, 30) RETURNING id",
            vec![
                course_id.into(),
                format!("Section {}", position).into(),
                position.into(),
            ],
        ))
        .await
        .expect("Failed to insert section")
        .expect("Section insert returned no row");

    row.try_get_by_index::<i32>(0).unwrap()
}

/// Seed a lecture directly and return its id.
pub async fn seed_lecture(db: &DatabaseConnection, section_id: i32, position: i32) -> i32 {
    let row = db
        .query_one(Statement::from_sql_and_values(
            sea_orm::DatabaseBackend::Postgres,
            "INSERT INTO course_lectures \
             (section_id, title, description, video_url, duration, position) \
             VALUES ($1, $2, 'A lecture', 'https://videos.test/1.mp4', 10, $3) RETURNING id",
            vec![
                section_id.into(),
                format!("Lecture {}", position).into(),
                position.into(),
            ],
        ))
        .await
        .expect("Failed to insert lecture")
        .expect("Lecture insert returned no row");

    row.try_get_by_index::<i32>(0).unwrap()
}
