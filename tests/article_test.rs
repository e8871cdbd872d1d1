mod common;

use serde_json::Value;

#[tokio::test]
async fn create_list_and_get_article() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "writer").await;

    let article_id = common::create_test_article(&app, &token, "First Article").await;

    let resp = app.client.get(app.url("/articles")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "First Article");
    assert_eq!(body["data"]["items"][0]["author"]["id"], user_id);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "First Article");
    // Anonymous readers never see is_liked = true
    assert_eq!(body["data"]["is_liked"], false);
}

#[tokio::test]
async fn pagination_envelope_is_correct() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "prolific").await;

    for i in 0..25 {
        common::create_test_article(&app, &token, &format!("Article {}", i)).await;
    }

    let resp = app
        .client
        .get(app.url("/articles?page=1&limit=10"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 25);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["currentPage"], 1);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 10);
    // Newest first
    assert_eq!(body["data"]["items"][0]["title"], "Article 24");

    // Out-of-range page keeps the totals and returns no items
    let resp = app
        .client
        .get(app.url("/articles?page=4&limit=10"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 25);
    assert_eq!(body["data"]["totalPages"], 3);
    assert_eq!(body["data"]["currentPage"], 4);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn search_requires_query() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "searcher").await;

    common::create_test_article(&app, &token, "Rust ownership explained").await;
    common::create_test_article(&app, &token, "Gardening for beginners").await;

    let resp = app
        .client
        .get(app.url("/articles/search?q=ownership"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalItems"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Rust ownership explained");

    let resp = app
        .client
        .get(app.url("/articles/search"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn only_the_author_can_update_or_delete() {
    let app = common::spawn_app().await;
    let (_, author_token) = common::create_test_user(&app, "author").await;
    let (_, intruder_token) = common::create_test_user(&app, "intruder").await;

    let article_id = common::create_test_article(&app, &author_token, "Mine").await;

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&intruder_token)
        .json(&serde_json::json!({"title": "Stolen"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = app
        .client
        .put(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&author_token)
        .json(&serde_json::json!({"title": "Mine, updated"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["title"], "Mine, updated");

    let resp = app
        .client
        .delete(app.url(&format!("/articles/{}", article_id)))
        .bearer_auth(&author_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn like_toggle_is_its_own_inverse() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "liker").await;
    let article_id = common::create_test_article(&app, &token, "Likeable").await;

    let like_url = app.url(&format!("/articles/{}/like", article_id));

    let resp = app
        .client
        .post(&like_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likes"], 1);

    // Second toggle undoes the first
    let resp = app
        .client
        .post(&like_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["liked"], false);
    assert_eq!(body["data"]["likes"], 0);

    // Anonymous callers cannot like
    let resp = app.client.post(&like_url).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn concurrent_toggles_keep_the_counter_honest() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "racer").await;
    let article_id = common::create_test_article(&app, &token, "Contended").await;

    let like_url = app.url(&format!("/articles/{}/like", article_id));

    for _ in 0..20 {
        // Fire two toggles from the same unliked state at once. Depending on
        // interleaving the pair may land as like+unlike or as a single like,
        // but the counter must always equal the join table's row count.
        let first = app.client.post(&like_url).bearer_auth(&token).send();
        let second = app.client.post(&like_url).bearer_auth(&token).send();
        let (first, second) = tokio::join!(first, second);
        assert_eq!(first.unwrap().status(), 200);
        assert_eq!(second.unwrap().status(), 200);

        let (likes, cardinality) = common::like_counts(&app.db, article_id).await;
        assert_eq!(
            likes, cardinality,
            "like counter drifted from the join table"
        );

        // Back to the unliked state for the next round
        if cardinality == 1 {
            let resp = app
                .client
                .post(&like_url)
                .bearer_auth(&token)
                .send()
                .await
                .unwrap();
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["data"]["liked"], false);
            assert_eq!(body["data"]["likes"], 0);
        }
    }
}

#[tokio::test]
async fn liked_articles_follow_the_toggle() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "collector").await;

    let first = common::create_test_article(&app, &token, "Keep").await;
    let second = common::create_test_article(&app, &token, "Discard").await;

    for id in [first, second] {
        app.client
            .post(app.url(&format!("/articles/{}/like", id)))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
    }
    // Unlike the second
    app.client
        .post(app.url(&format!("/articles/{}/like", second)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/user/liked-articles"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], first);

    // Detail view reflects the like for the authenticated caller
    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", first)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["is_liked"], true);
}

#[tokio::test]
async fn views_increment_on_detail_reads() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "viewer").await;
    let article_id = common::create_test_article(&app, &token, "Watched").await;

    for _ in 0..3 {
        app.client
            .get(app.url(&format!("/articles/{}", article_id)))
            .send()
            .await
            .unwrap();
    }

    let resp = app
        .client
        .get(app.url(&format!("/articles/{}", article_id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    // The read that returns this body also counts
    assert!(body["data"]["views"].as_i64().unwrap() >= 3);
}
