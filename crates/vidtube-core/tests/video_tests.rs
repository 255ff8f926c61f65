use reqwest::multipart::Form;
use serde_json::json;
use vidtube_core::testing::png_part;
use vidtube_core::TestApp;

const PASSWORD: &str = "password123";

#[tokio::test]
async fn test_publish_requires_auth_and_files() {
    let app = TestApp::new().await;
    let (token, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let url = app.url("/api/v1/videos");

    let res = app
        .client
        .post_multipart(&url, None, Form::new().text("title", "t"))
        .await;
    assert_eq!(res.status, 401);

    let form = Form::new()
        .text("title", "No file")
        .text("description", "missing the video")
        .part("thumbnail", png_part("thumb.png"));
    let res = app.client.post_multipart(&url, Some(&token), form).await;
    assert_eq!(res.status, 400);

    let form = Form::new()
        .text("description", "missing the title")
        .part("thumbnail", png_part("thumb.png"));
    let res = app.client.post_multipart(&url, Some(&token), form).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_publish_rejects_wrong_media_type() {
    let app = TestApp::new().await;
    let (token, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;

    // An image where the video file belongs.
    let form = Form::new()
        .text("title", "Wrong type")
        .text("description", "png as video")
        .part("videoFile", png_part("clip.png"))
        .part("thumbnail", png_part("thumb.png"));
    let res = app
        .client
        .post_multipart(&app.url("/api/v1/videos"), Some(&token), form)
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_publish_and_get_counts_views() {
    let app = TestApp::new().await;
    let (token, user) = app.create_user("alice", "alice@example.com", PASSWORD).await;

    let video = app.publish_video(&token, "First upload").await;
    assert_eq!(video["title"], "First upload");
    assert_eq!(video["ownerId"], user["id"]);
    assert_eq!(video["views"], 0);
    assert_eq!(video["duration"], 12.5);
    assert_eq!(video["isPublished"], true);
    assert!(video["videoFile"].as_str().unwrap().starts_with("/media/"));

    let url = app.url(&format!("/api/v1/videos/{}", video["id"].as_str().unwrap()));
    let res = app.client.get(&url).await;
    assert_eq!(res.status, 200);
    let data = res.data();
    assert_eq!(data["views"], 1);
    assert_eq!(data["likes"], 0);
    assert_eq!(data["isLiked"], false);
    assert_eq!(data["commentsCount"], 0);
    assert_eq!(data["owner"]["username"], "alice");
    assert_eq!(data["owner"]["subscribersCount"], 0);

    let res = app.client.get_with_auth(&url, &token).await;
    assert_eq!(res.data()["views"], 2);
}

#[tokio::test]
async fn test_get_video_bad_and_missing_ids() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/v1/videos/not-a-uuid")).await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .get(&app.url(&format!("/api/v1/videos/{}", uuid::Uuid::new_v4())))
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_list_videos_filters_and_pages() {
    let app = TestApp::new().await;
    let (alice, alice_user) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;

    app.publish_video(&alice, "Rust tutorial").await;
    app.publish_video(&alice, "Cooking pasta").await;
    app.publish_video(&bob, "Advanced RUST").await;

    let res = app.client.get(&app.url("/api/v1/videos")).await;
    assert_eq!(res.status, 200);
    let data = res.data();
    assert_eq!(data["totalItems"], 3);
    assert_eq!(data["items"].as_array().unwrap().len(), 3);
    assert!(data["items"][0]["owner"]["username"].is_string());

    let res = app.client.get(&app.url("/api/v1/videos?query=rust")).await;
    assert_eq!(res.data()["totalItems"], 2);

    let res = app
        .client
        .get(&app.url(&format!(
            "/api/v1/videos?userId={}",
            alice_user["id"].as_str().unwrap()
        )))
        .await;
    assert_eq!(res.data()["totalItems"], 2);

    let res = app
        .client
        .get(&app.url("/api/v1/videos?page=2&limit=2&sortBy=title&sortType=asc"))
        .await;
    let data = res.data();
    assert_eq!(data["page"], 2);
    assert_eq!(data["totalPages"], 2);
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(data["items"][0]["title"], "Rust tutorial");
}

#[tokio::test]
async fn test_list_videos_rejects_bad_parameters() {
    let app = TestApp::new().await;

    for query in [
        "limit=21",
        "limit=0",
        "page=0",
        "page=abc",
        "sortBy=password",
        "sortType=up",
        "userId=nope",
    ] {
        let res = app
            .client
            .get(&app.url(&format!("/api/v1/videos?{}", query)))
            .await;
        assert_eq!(res.status, 400, "{}", query);
    }
}

#[tokio::test]
async fn test_unpublished_video_is_only_visible_to_owner() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Draft").await;
    let id = video["id"].as_str().unwrap();

    let res = app
        .client
        .patch_with_auth(&app.url(&format!("/api/v1/videos/toggle/publish/{}", id)), &alice, "")
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["isPublished"], false);

    let url = app.url(&format!("/api/v1/videos/{}", id));
    assert_eq!(app.client.get(&url).await.status, 404);
    assert_eq!(app.client.get_with_auth(&url, &bob).await.status, 404);
    assert_eq!(app.client.get_with_auth(&url, &alice).await.status, 200);

    let res = app.client.get(&app.url("/api/v1/videos")).await;
    assert_eq!(res.data()["totalItems"], 0);
}

#[tokio::test]
async fn test_only_owner_may_modify_video() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Mine").await;
    let id = video["id"].as_str().unwrap();
    let url = app.url(&format!("/api/v1/videos/{}", id));

    let res = app
        .client
        .patch_multipart_with_auth(&url, &bob, Form::new().text("title", "Stolen"))
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.error_code(), "FORBIDDEN");

    let res = app
        .client
        .patch_with_auth(&app.url(&format!("/api/v1/videos/toggle/publish/{}", id)), &bob, "")
        .await;
    assert_eq!(res.status, 403);

    let res = app.client.delete_with_auth(&url, &bob).await;
    assert_eq!(res.status, 403);

    let res = app
        .client
        .patch_multipart_with_auth(
            &url,
            &alice,
            Form::new()
                .text("title", "Renamed")
                .part("thumbnail", png_part("new-thumb.png")),
        )
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["title"], "Renamed");
    assert_eq!(res.data()["description"], "Mine description");
    assert_ne!(res.data()["thumbnail"], video["thumbnail"]);
}

#[tokio::test]
async fn test_update_video_requires_a_field() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Mine").await;

    let res = app
        .client
        .patch_multipart_with_auth(
            &app.url(&format!("/api/v1/videos/{}", video["id"].as_str().unwrap())),
            &alice,
            Form::new().text("unrelated", "x"),
        )
        .await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_watch_history_is_deduplicated_latest_first() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let first = app.publish_video(&alice, "First").await;
    let second = app.publish_video(&alice, "Second").await;

    for video in [&first, &second, &first] {
        let url = app.url(&format!("/api/v1/videos/{}", video["id"].as_str().unwrap()));
        assert_eq!(app.client.get_with_auth(&url, &alice).await.status, 200);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/watch-history"), &alice)
        .await;
    assert_eq!(res.status, 200);
    let items = res.data();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], first["id"]);
    assert_eq!(items[1]["id"], second["id"]);
    assert_eq!(items[0]["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_anonymous_views_are_not_recorded() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Anon").await;

    app.client
        .get(&app.url(&format!("/api/v1/videos/{}", video["id"].as_str().unwrap())))
        .await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/watch-history"), &alice)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_video_cascades() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Doomed").await;
    let id = video["id"].as_str().unwrap();

    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/comments/{}", id)),
            &bob,
            &json!({ "content": "nice" }).to_string(),
        )
        .await;
    assert_eq!(res.status, 201);
    let comment_id = res.data()["id"].as_str().unwrap().to_string();
    app.client
        .post_with_auth(&app.url(&format!("/api/v1/likes/toggle/c/{}", comment_id)), &alice, "")
        .await;
    app.client
        .post_with_auth(&app.url(&format!("/api/v1/likes/toggle/v/{}", id)), &bob, "")
        .await;
    app.client
        .get_with_auth(&app.url(&format!("/api/v1/videos/{}", id)), &bob)
        .await;

    let playlist = app
        .client
        .post_with_auth(
            &app.url("/api/v1/playlist"),
            &bob,
            &json!({ "name": "Saved" }).to_string(),
        )
        .await
        .data();
    let playlist_id = playlist["id"].as_str().unwrap();
    app.client
        .patch_with_auth(
            &app.url(&format!("/api/v1/playlist/add/{}/{}", id, playlist_id)),
            &bob,
            "",
        )
        .await;

    let res = app
        .client
        .delete_with_auth(&app.url(&format!("/api/v1/videos/{}", id)), &alice)
        .await;
    assert_eq!(res.status, 200);

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/videos/{}", id)), &alice)
        .await;
    assert_eq!(res.status, 404);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/likes/videos"), &bob)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/watch-history"), &bob)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/playlist/{}", playlist_id)), &bob)
        .await;
    assert_eq!(res.data()["totalVideos"], 0);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/dashboard/stats"), &alice)
        .await;
    assert_eq!(res.data()["totalVideos"], 0);
    assert_eq!(res.data()["totalLikes"], 0);
}
