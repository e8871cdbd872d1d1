mod common;

use serde_json::Value;

async fn post_comment(
    app: &common::TestApp,
    token: &str,
    payload: serde_json::Value,
) -> (reqwest::StatusCode, Value) {
    let resp = app
        .client
        .post(app.url("/comments"))
        .bearer_auth(token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    let status = resp.status();
    let body: Value = resp.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn comment_must_target_exactly_one_thing() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "commenter").await;
    let article_id = common::create_test_article(&app, &token, "Discussed").await;

    let course_id = common::create_test_course(&app, &token, "Commented Course", 0.0).await;
    let section_id = common::seed_section(&app.db, course_id, 1).await;
    let lecture_id = common::seed_lecture(&app.db, section_id, 1).await;

    // Neither target
    let (status, _) = post_comment(&app, &token, serde_json::json!({"content": "hi"})).await;
    assert_eq!(status, 400);

    // Both targets
    let (status, _) = post_comment(
        &app,
        &token,
        serde_json::json!({
            "content": "hi",
            "article_id": article_id,
            "lecture_id": lecture_id,
        }),
    )
    .await;
    assert_eq!(status, 400);

    // Exactly one works, for each kind
    let (status, body) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "on the article", "article_id": article_id}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["article_id"], article_id);

    let (status, body) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "on the lecture", "lecture_id": lecture_id}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["lecture_id"], lecture_id);

    // Missing target entity
    let (status, _) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "ghost", "article_id": 999999}),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn replies_nest_under_their_parent() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "threader").await;
    let article_id = common::create_test_article(&app, &token, "Threaded").await;

    let (_, body) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "root one", "article_id": article_id}),
    )
    .await;
    let root_one = body["data"]["id"].as_i64().unwrap();

    let (_, body) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "root two", "article_id": article_id}),
    )
    .await;
    let root_two = body["data"]["id"].as_i64().unwrap();

    let (status, body) = post_comment(
        &app,
        &token,
        serde_json::json!({
            "content": "first reply",
            "article_id": article_id,
            "parent_id": root_one,
        }),
    )
    .await;
    assert_eq!(status, 200);
    let reply_id = body["data"]["id"].as_i64().unwrap();

    post_comment(
        &app,
        &token,
        serde_json::json!({
            "content": "second reply",
            "article_id": article_id,
            "parent_id": root_one,
        }),
    )
    .await;

    // Article detail lists only roots, newest first
    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["id"], root_two);
    assert_eq!(comments[1]["id"], root_one);

    // Replies are public and oldest first
    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", root_one)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let replies = body["data"].as_array().unwrap();
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["id"], reply_id);
    assert_eq!(replies[0]["content"], "first reply");
    assert_eq!(replies[1]["content"], "second reply");

    // No replies under the other root
    let resp = app
        .client
        .get(app.url(&format!("/comments/{}/replies", root_two)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn reply_must_share_the_parents_target() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "crossposter").await;
    let first = common::create_test_article(&app, &token, "Here").await;
    let second = common::create_test_article(&app, &token, "There").await;

    let (_, body) = post_comment(
        &app,
        &token,
        serde_json::json!({"content": "root", "article_id": first}),
    )
    .await;
    let parent_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = post_comment(
        &app,
        &token,
        serde_json::json!({
            "content": "wrong thread",
            "article_id": second,
            "parent_id": parent_id,
        }),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete_a_comment() {
    let app = common::spawn_app().await;
    let (_, author_token) = common::create_test_user(&app, "voice").await;
    let (_, other_token) = common::create_test_user(&app, "stranger").await;
    let article_id = common::create_test_article(&app, &author_token, "Moderated").await;

    let (_, body) = post_comment(
        &app,
        &author_token,
        serde_json::json!({"content": "original", "article_id": article_id}),
    )
    .await;
    let comment_id = body["data"]["id"].as_i64().unwrap();
    let comment_url = app.url(&format!("/comments/{}", comment_id));

    let resp = app
        .client
        .put(&comment_url)
        .bearer_auth(&other_token)
        .json(&serde_json::json!({"content": "defaced"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(&comment_url)
        .bearer_auth(&other_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(&comment_url)
        .bearer_auth(&author_token)
        .json(&serde_json::json!({"content": "edited"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["content"], "edited");

    let resp = app
        .client
        .delete(&comment_url)
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}
