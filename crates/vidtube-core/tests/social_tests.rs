use serde_json::json;
use vidtube_core::TestApp;

const PASSWORD: &str = "password123";

fn id_of(value: &serde_json::Value) -> String {
    value["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_healthcheck() {
    let app = TestApp::new().await;

    let res = app.client.get(&app.url("/api/v1/healthcheck")).await;

    assert_eq!(res.status, 200);
    assert!(res.is_success());
    assert_eq!(res.data()["status"], "OK");
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Talk").await;
    let list_url = app.url(&format!("/api/v1/comments/{}", id_of(&video)));

    let res = app
        .client
        .post_with_auth(&list_url, &bob, &json!({ "content": "   " }).to_string())
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .post_with_auth(&list_url, &bob, &json!({ "content": "First!" }).to_string())
        .await;
    assert_eq!(res.status, 201);
    let comment = res.data();
    assert_eq!(comment["content"], "First!");
    assert_eq!(comment["owner"]["username"], "bob");
    assert_eq!(comment["likes"], 0);

    let res = app.client.get(&list_url).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["totalItems"], 1);
    assert_eq!(res.data()["items"][0]["content"], "First!");

    let comment_url = app.url(&format!("/api/v1/comments/c/{}", id_of(&comment)));
    let res = app
        .client
        .patch_with_auth(&comment_url, &alice, &json!({ "content": "hijack" }).to_string())
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .client
        .patch_with_auth(&comment_url, &bob, &json!({ "content": "Edited" }).to_string())
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["content"], "Edited");

    let res = app.client.delete_with_auth(&comment_url, &alice).await;
    assert_eq!(res.status, 403);

    let res = app.client.delete_with_auth(&comment_url, &bob).await;
    assert_eq!(res.status, 200);

    let res = app.client.get(&list_url).await;
    assert_eq!(res.data()["totalItems"], 0);

    let res = app.client.delete_with_auth(&comment_url, &bob).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_comments_on_missing_video() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let url = app.url(&format!("/api/v1/comments/{}", uuid::Uuid::new_v4()));

    assert_eq!(app.client.get(&url).await.status, 404);

    let res = app
        .client
        .post_with_auth(&url, &alice, &json!({ "content": "hello?" }).to_string())
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_like_toggles_on_and_off() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Likeable").await;
    let video_id = id_of(&video);
    let toggle_url = app.url(&format!("/api/v1/likes/toggle/v/{}", video_id));

    let res = app.client.post_with_auth(&toggle_url, &bob, "").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["liked"], true);

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/videos/{}", video_id)), &bob)
        .await;
    assert_eq!(res.data()["likes"], 1);
    assert_eq!(res.data()["isLiked"], true);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/likes/videos"), &bob)
        .await;
    let liked = res.data();
    assert_eq!(liked.as_array().unwrap().len(), 1);
    assert_eq!(liked[0]["id"], video["id"]);

    let res = app.client.post_with_auth(&toggle_url, &bob, "").await;
    assert_eq!(res.data()["liked"], false);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/likes/videos"), &bob)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);

    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/likes/toggle/v/{}", uuid::Uuid::new_v4())),
            &bob,
            "",
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_comment_and_tweet_likes_are_counted() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Talk").await;

    let comment = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/comments/{}", id_of(&video))),
            &alice,
            &json!({ "content": "pinned" }).to_string(),
        )
        .await
        .data();
    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/likes/toggle/c/{}", id_of(&comment))),
            &bob,
            "",
        )
        .await;
    assert_eq!(res.data()["liked"], true);

    let res = app
        .client
        .get(&app.url(&format!("/api/v1/comments/{}", id_of(&video))))
        .await;
    assert_eq!(res.data()["items"][0]["likes"], 1);

    let tweet = app
        .client
        .post_with_auth(
            &app.url("/api/v1/tweets"),
            &alice,
            &json!({ "content": "new video out" }).to_string(),
        )
        .await
        .data();
    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/likes/toggle/t/{}", id_of(&tweet))),
            &bob,
            "",
        )
        .await;
    assert_eq!(res.data()["liked"], true);

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/v1/tweets/user/{}", tweet["ownerId"].as_str().unwrap())),
            &bob,
        )
        .await;
    assert_eq!(res.data()[0]["likes"], 1);
}

#[tokio::test]
async fn test_subscriptions() {
    let app = TestApp::new().await;
    let (alice, alice_user) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, bob_user) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let alice_id = id_of(&alice_user);
    let bob_id = id_of(&bob_user);
    let toggle_url = app.url(&format!("/api/v1/subscriptions/c/{}", alice_id));

    let res = app.client.post_with_auth(&toggle_url, &alice, "").await;
    assert_eq!(res.status, 400);

    let res = app.client.post_with_auth(&toggle_url, &bob, "").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["subscribed"], true);

    let res = app.client.get_with_auth(&toggle_url, &alice).await;
    let subscribers = res.data();
    assert_eq!(subscribers.as_array().unwrap().len(), 1);
    assert_eq!(subscribers[0]["username"], "bob");

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/subscriptions/u/{}", bob_id)), &bob)
        .await;
    assert_eq!(res.data()[0]["username"], "alice");

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/channel/alice"), &bob)
        .await;
    assert_eq!(res.status, 200);
    let profile = res.data();
    assert_eq!(profile["subscribersCount"], 1);
    assert_eq!(profile["subscribedToCount"], 0);
    assert_eq!(profile["isSubscribed"], true);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/channel/bob"), &bob)
        .await;
    assert_eq!(res.data()["subscribedToCount"], 1);
    assert_eq!(res.data()["isSubscribed"], false);

    let res = app.client.post_with_auth(&toggle_url, &bob, "").await;
    assert_eq!(res.data()["subscribed"], false);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/channel/alice"), &bob)
        .await;
    assert_eq!(res.data()["subscribersCount"], 0);
}

#[tokio::test]
async fn test_subscribe_to_missing_channel() {
    let app = TestApp::new().await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;

    let res = app
        .client
        .post_with_auth(
            &app.url(&format!("/api/v1/subscriptions/c/{}", uuid::Uuid::new_v4())),
            &bob,
            "",
        )
        .await;
    assert_eq!(res.status, 404);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/users/channel/nobody"), &bob)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_tweet_lifecycle() {
    let app = TestApp::new().await;
    let (alice, alice_user) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;

    let res = app
        .client
        .post_with_auth(&app.url("/api/v1/tweets"), &alice, &json!({ "content": "" }).to_string())
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/v1/tweets"),
            &alice,
            &json!({ "content": "hello world" }).to_string(),
        )
        .await;
    assert_eq!(res.status, 201);
    let tweet = res.data();
    assert_eq!(tweet["ownerId"], alice_user["id"]);

    let list_url = app.url(&format!("/api/v1/tweets/user/{}", id_of(&alice_user)));
    let res = app.client.get_with_auth(&list_url, &bob).await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);

    let tweet_url = app.url(&format!("/api/v1/tweets/{}", id_of(&tweet)));
    let res = app
        .client
        .patch_with_auth(&tweet_url, &bob, &json!({ "content": "mine now" }).to_string())
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .client
        .patch_with_auth(&tweet_url, &alice, &json!({ "content": "edited" }).to_string())
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["content"], "edited");

    let res = app.client.delete_with_auth(&tweet_url, &alice).await;
    assert_eq!(res.status, 200);

    let res = app.client.get_with_auth(&list_url, &bob).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);

    let res = app
        .client
        .get_with_auth(
            &app.url(&format!("/api/v1/tweets/user/{}", uuid::Uuid::new_v4())),
            &bob,
        )
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_playlist_lifecycle() {
    let app = TestApp::new().await;
    let (alice, alice_user) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Keeper").await;
    let video_id = id_of(&video);

    let res = app
        .client
        .post_with_auth(&app.url("/api/v1/playlist"), &alice, &json!({ "name": " " }).to_string())
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/v1/playlist"),
            &alice,
            &json!({ "name": "Favourites", "description": "best of" }).to_string(),
        )
        .await;
    assert_eq!(res.status, 201);
    let playlist = res.data();
    let playlist_id = id_of(&playlist);
    assert_eq!(playlist["totalVideos"], 0);

    let add_url = app.url(&format!("/api/v1/playlist/add/{}/{}", video_id, playlist_id));
    let res = app.client.patch_with_auth(&add_url, &bob, "").await;
    assert_eq!(res.status, 403);

    let res = app.client.patch_with_auth(&add_url, &alice, "").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["totalVideos"], 1);
    assert_eq!(res.data()["videos"][0]["id"], video["id"]);

    let res = app.client.patch_with_auth(&add_url, &alice, "").await;
    assert_eq!(res.status, 409);

    let res = app
        .client
        .get_with_auth(&app.url(&format!("/api/v1/playlist/user/{}", id_of(&alice_user))), &bob)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 1);
    assert_eq!(res.data()[0]["totalVideos"], 1);

    let playlist_url = app.url(&format!("/api/v1/playlist/{}", playlist_id));
    let res = app
        .client
        .patch_with_auth(&playlist_url, &alice, &json!({ "name": "Renamed" }).to_string())
        .await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["name"], "Renamed");
    assert_eq!(res.data()["description"], "best of");

    let remove_url = app.url(&format!("/api/v1/playlist/remove/{}/{}", video_id, playlist_id));
    let res = app.client.patch_with_auth(&remove_url, &alice, "").await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["totalVideos"], 0);

    let res = app.client.patch_with_auth(&remove_url, &alice, "").await;
    assert_eq!(res.status, 404);

    let res = app.client.delete_with_auth(&playlist_url, &bob).await;
    assert_eq!(res.status, 403);

    let res = app.client.delete_with_auth(&playlist_url, &alice).await;
    assert_eq!(res.status, 200);

    let res = app.client.get_with_auth(&playlist_url, &alice).await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn test_dashboard_for_empty_channel() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/dashboard/stats"), &alice)
        .await;
    assert_eq!(res.status, 200);
    let stats = res.data();
    assert_eq!(stats["totalVideos"], 0);
    assert_eq!(stats["totalViews"], 0);
    assert_eq!(stats["totalSubscribers"], 0);
    assert_eq!(stats["totalLikes"], 0);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/dashboard/videos"), &alice)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dashboard_aggregates_channel() {
    let app = TestApp::new().await;
    let (alice, alice_user) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let first = app.publish_video(&alice, "One").await;
    let second = app.publish_video(&alice, "Two").await;

    // Hidden videos still count on the owner's dashboard.
    app.client
        .patch_with_auth(
            &app.url(&format!("/api/v1/videos/toggle/publish/{}", id_of(&second))),
            &alice,
            "",
        )
        .await;
    for _ in 0..3 {
        app.client
            .get(&app.url(&format!("/api/v1/videos/{}", id_of(&first))))
            .await;
    }
    app.client
        .post_with_auth(&app.url(&format!("/api/v1/likes/toggle/v/{}", id_of(&first))), &bob, "")
        .await;
    app.client
        .post_with_auth(
            &app.url(&format!("/api/v1/subscriptions/c/{}", id_of(&alice_user))),
            &bob,
            "",
        )
        .await;

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/dashboard/stats"), &alice)
        .await;
    let stats = res.data();
    assert_eq!(stats["totalVideos"], 2);
    assert_eq!(stats["totalViews"], 3);
    assert_eq!(stats["totalSubscribers"], 1);
    assert_eq!(stats["totalLikes"], 1);

    let res = app
        .client
        .get_with_auth(&app.url("/api/v1/dashboard/videos"), &alice)
        .await;
    assert_eq!(res.data().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unpublished_video_is_hidden_from_comments_likes_and_playlists() {
    let app = TestApp::new().await;
    let (alice, _) = app.create_user("alice", "alice@example.com", PASSWORD).await;
    let (bob, _) = app.create_user("bob", "bob@example.com", PASSWORD).await;
    let video = app.publish_video(&alice, "Draft").await;
    let video_id = id_of(&video);
    app.client
        .patch_with_auth(
            &app.url(&format!("/api/v1/videos/toggle/publish/{}", video_id)),
            &alice,
            "",
        )
        .await;

    let comments_url = app.url(&format!("/api/v1/comments/{}", video_id));
    assert_eq!(app.client.get(&comments_url).await.status, 404);
    assert_eq!(app.client.get_with_auth(&comments_url, &bob).await.status, 404);
    let res = app
        .client
        .post_with_auth(&comments_url, &bob, &json!({ "content": "first" }).to_string())
        .await;
    assert_eq!(res.status, 404);

    let like_url = app.url(&format!("/api/v1/likes/toggle/v/{}", video_id));
    assert_eq!(app.client.post_with_auth(&like_url, &bob, "").await.status, 404);

    let res = app
        .client
        .post_with_auth(
            &app.url("/api/v1/playlist"),
            &bob,
            &json!({ "name": "Grabbed" }).to_string(),
        )
        .await;
    let add_url = app.url(&format!(
        "/api/v1/playlist/add/{}/{}",
        video_id,
        id_of(&res.data())
    ));
    assert_eq!(app.client.patch_with_auth(&add_url, &bob, "").await.status, 404);

    // The owner still reaches all of it.
    assert_eq!(app.client.get_with_auth(&comments_url, &alice).await.status, 200);
    let res = app
        .client
        .post_with_auth(&comments_url, &alice, &json!({ "content": "note" }).to_string())
        .await;
    assert_eq!(res.status, 201);
    assert_eq!(app.client.post_with_auth(&like_url, &alice, "").await.status, 200);
}
