mod common;

use serde_json::Value;

#[tokio::test]
async fn course_detail_nests_curriculum_in_order() {
    let app = common::spawn_app().await;
    let (instructor_id, token) = common::create_test_user(&app, "teacher").await;

    let course_id = common::create_test_course(&app, &token, "Rust 101", 0.0).await;
    let s1 = common::seed_section(&app.db, course_id, 1).await;
    let s2 = common::seed_section(&app.db, course_id, 2).await;
    common::seed_lecture(&app.db, s1, 2).await;
    common::seed_lecture(&app.db, s1, 1).await;
    common::seed_lecture(&app.db, s2, 1).await;

    let resp = app
        .client
        .get(app.url(&format!("/courses/{}", course_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Rust 101");
    assert_eq!(body["data"]["instructor"]["id"], instructor_id);

    let sections = body["data"]["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["position"], 1);
    assert_eq!(sections[1]["position"], 2);

    let lectures = sections[0]["lectures"].as_array().unwrap();
    assert_eq!(lectures.len(), 2);
    assert_eq!(lectures[0]["position"], 1);
    assert_eq!(lectures[1]["position"], 2);

    // No enrollment for anonymous callers
    assert!(body["data"]["enrollment"].is_null());
}

#[tokio::test]
async fn enrolling_twice_conflicts() {
    let app = common::spawn_app().await;
    let (_, instructor_token) = common::create_test_user(&app, "lecturer").await;
    let (_, student_token) = common::create_test_user(&app, "student").await;

    let course_id = common::create_test_course(&app, &instructor_token, "Databases", 19.99).await;
    let enroll_url = app.url(&format!("/courses/{}/enroll", course_id));

    let resp = app
        .client
        .post(&enroll_url)
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["progress"], 0);
    assert!(body["data"]["last_lecture_id"].is_null());

    let resp = app
        .client
        .post(&enroll_url)
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Exactly one enrollment shows up
    let resp = app
        .client
        .get(app.url("/user/enrolled-courses"))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["course"]["id"], course_id);
}

#[tokio::test]
async fn enrolling_in_missing_course_is_not_found() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "lost").await;

    let resp = app
        .client
        .post(app.url("/courses/999999/enroll"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn progress_requires_enrollment_and_bounds() {
    let app = common::spawn_app().await;
    let (_, instructor_token) = common::create_test_user(&app, "prof").await;
    let (_, student_token) = common::create_test_user(&app, "learner").await;

    let course_id = common::create_test_course(&app, &instructor_token, "Algorithms", 0.0).await;
    let progress_url = app.url(&format!("/courses/{}/progress", course_id));

    // No enrollment row yet
    let resp = app
        .client
        .put(&progress_url)
        .bearer_auth(&student_token)
        .json(&serde_json::json!({"progress": 50}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    app.client
        .post(app.url(&format!("/courses/{}/enroll", course_id)))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    for bad in [-1, 101] {
        let resp = app
            .client
            .put(&progress_url)
            .bearer_auth(&student_token)
            .json(&serde_json::json!({"progress": bad}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    // Setting the same value twice is idempotent
    for _ in 0..2 {
        let resp = app
            .client
            .put(&progress_url)
            .bearer_auth(&student_token)
            .json(&serde_json::json!({"progress": 75}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["progress"], 75);
    }
}

#[tokio::test]
async fn paid_lectures_are_gated_by_enrollment() {
    let app = common::spawn_app().await;
    let (_, instructor_token) = common::create_test_user(&app, "paidprof").await;
    let (_, student_token) = common::create_test_user(&app, "payer").await;

    let course_id = common::create_test_course(&app, &instructor_token, "Pro Course", 49.0).await;
    let section_id = common::seed_section(&app.db, course_id, 1).await;
    let lecture_id = common::seed_lecture(&app.db, section_id, 1).await;
    let lecture_url = app.url(&format!("/lectures/{}", lecture_id));

    // Authenticated but not enrolled
    let resp = app
        .client
        .get(&lecture_url)
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    app.client
        .post(app.url(&format!("/courses/{}/enroll", course_id)))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(&lecture_url)
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["course_id"], course_id);
    assert!(body["data"]["video_url"].is_string());

    // The visit is remembered on the enrollment
    let resp = app
        .client
        .get(app.url("/user/enrolled-courses"))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"][0]["last_lecture_id"], lecture_id);
}

#[tokio::test]
async fn free_lectures_skip_the_gate() {
    let app = common::spawn_app().await;
    let (_, instructor_token) = common::create_test_user(&app, "freeprof").await;
    let (_, student_token) = common::create_test_user(&app, "browser").await;

    let course_id = common::create_test_course(&app, &instructor_token, "Free Intro", 0.0).await;
    let section_id = common::seed_section(&app.db, course_id, 1).await;
    let lecture_id = common::seed_lecture(&app.db, section_id, 1).await;

    let resp = app
        .client
        .get(app.url(&format!("/lectures/{}", lecture_id)))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn only_the_instructor_can_update_a_course() {
    let app = common::spawn_app().await;
    let (_, instructor_token) = common::create_test_user(&app, "owner").await;
    let (_, other_token) = common::create_test_user(&app, "other").await;

    let course_id = common::create_test_course(&app, &instructor_token, "Original", 0.0).await;

    let resp = app
        .client
        .put(app.url(&format!("/courses/{}", course_id)))
        .bearer_auth(&other_token)
        .json(&serde_json::json!({"title": "Hijacked"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/courses/{}", course_id)))
        .bearer_auth(&instructor_token)
        .json(&serde_json::json!({"title": "Renamed", "price": 9.99}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Renamed");
}

#[tokio::test]
async fn course_search_and_listing() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "catalog").await;

    common::create_test_course(&app, &token, "Advanced Rust", 10.0).await;
    common::create_test_course(&app, &token, "Intro to Painting", 0.0).await;

    let resp = app.client.get(app.url("/courses")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 2);
    // Newest first
    assert_eq!(body["data"]["items"][0]["title"], "Intro to Painting");

    let resp = app
        .client
        .get(app.url("/courses/search?q=rust"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Advanced Rust");
}
