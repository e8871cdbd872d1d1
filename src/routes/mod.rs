use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::{auth_middleware, optional_auth_middleware};
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let personalized =
        personalized_routes(&rate_limit_config).layer(middleware::from_fn(optional_auth_middleware));
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(personalized).merge(protected)
}

/// Auth routes: signup and signin.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/signup", routing::post(handlers::signup))
        .route("/auth/signin", routing::post(handlers::signin));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes: listings, search, replies, categories, the donation
/// feed. No auth state is consulted.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Articles
        .route("/articles", routing::get(handlers::article::list_articles))
        .route(
            "/articles/search",
            routing::get(handlers::article::search_articles),
        )
        // Courses
        .route("/courses", routing::get(handlers::course::list_courses))
        .route(
            "/courses/search",
            routing::get(handlers::course::search_courses),
        )
        // Comments
        .route(
            "/comments/{id}/replies",
            routing::get(handlers::comment::get_replies),
        )
        // Categories
        .route(
            "/categories",
            routing::get(handlers::category::list_categories),
        )
        // Donations
        .route(
            "/donations/recent",
            routing::get(handlers::donation::recent_donations),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Routes that stay public but personalize when a valid token is present
/// (is_liked, enrollment state, donation attribution).
fn personalized_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/articles/{id}", routing::get(handlers::article::get_article))
        .route("/courses/{id}", routing::get(handlers::course::get_course))
        .route("/donations", routing::post(handlers::donation::make_donation));

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: all authenticated reads and writes.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Articles
        .route("/articles", routing::post(handlers::article::create_article))
        .route(
            "/articles/{id}",
            routing::put(handlers::article::update_article)
                .delete(handlers::article::delete_article),
        )
        .route(
            "/articles/{id}/like",
            routing::post(handlers::article::like_article),
        )
        // Courses
        .route("/courses", routing::post(handlers::course::create_course))
        .route(
            "/courses/{id}",
            routing::put(handlers::course::update_course),
        )
        .route(
            "/courses/{id}/enroll",
            routing::post(handlers::course::enroll_course),
        )
        .route(
            "/courses/{id}/progress",
            routing::put(handlers::course::update_progress),
        )
        // Lectures (enrollment gate checked in the handler)
        .route(
            "/lectures/{lecture_id}",
            routing::get(handlers::course::get_lecture),
        )
        // Comments
        .route("/comments", routing::post(handlers::comment::create_comment))
        .route(
            "/comments/{id}",
            routing::put(handlers::comment::update_comment)
                .delete(handlers::comment::delete_comment),
        )
        // Profile
        .route(
            "/user/profile",
            routing::get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route(
            "/user/liked-articles",
            routing::get(handlers::user::get_liked_articles),
        )
        .route(
            "/user/enrolled-courses",
            routing::get(handlers::user::get_enrolled_courses),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
