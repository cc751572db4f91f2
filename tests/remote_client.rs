//! Control-plane client against an in-process media server.

use std::time::Duration;

use media_console::remote::{MediaServerClient, RemoteApiError};

mod common;

use common::{start_mock_media_server, MockOptions, UNREACHABLE_URL};

fn client(url: &str, token: &str) -> MediaServerClient {
    MediaServerClient::new(url, token, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_unwraps_response_envelope() {
    let server = start_mock_media_server(MockOptions::default()).await;
    let client = client(&server.url(), "");

    let vhosts = client.list_vhosts().await.unwrap();
    assert_eq!(vhosts, vec![serde_json::json!("default")]);

    let vhost = client.get_vhost("default").await.unwrap();
    assert_eq!(vhost["name"], "default");

    // Envelope without a `response` member reads as an empty object.
    let app = client.get_app("default", "app").await.unwrap();
    assert_eq!(app, serde_json::json!({}));
}

#[tokio::test]
async fn test_not_found_surfaces_status() {
    let server = start_mock_media_server(MockOptions::default()).await;
    let client = client(&server.url(), "");

    let err = client.get_vhost("missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    match err {
        RemoteApiError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Could not find"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_basic_auth_from_user_password_token() {
    // base64("ome:secret")
    let expected = "Basic b21lOnNlY3JldA==";
    let server = start_mock_media_server(MockOptions {
        required_auth: Some(expected.to_string()),
        ..Default::default()
    })
    .await;

    assert!(client(&server.url(), "ome:secret").health_check().await);
    assert!(!client(&server.url(), "ome:wrong").health_check().await);

    let requests = server.requests();
    assert_eq!(requests[0].authorization.as_deref(), Some(expected));
}

#[tokio::test]
async fn test_opaque_token_passed_through() {
    let server = start_mock_media_server(MockOptions {
        required_auth: Some("Basic b21lOnNlY3JldA==".to_string()),
        ..Default::default()
    })
    .await;

    let client = client(&server.url(), "b21lOnNlY3JldA==");
    assert_eq!(client.list_vhosts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_path_segments_are_encoded() {
    let server = start_mock_media_server(MockOptions::default()).await;
    let client = client(&server.url(), "");

    let stream = client.get_stream("default", "app", "my stream").await.unwrap();
    assert_eq!(stream["name"], "my stream");

    let paths: Vec<_> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/v1/vhosts/default/apps/app/streams/my%20stream"]);
}

#[tokio::test]
async fn test_delete_is_true_only_for_200() {
    let server = start_mock_media_server(MockOptions::default()).await;
    let client = client(&server.url(), "");

    assert!(client.delete_app("default", "app").await.unwrap());
    assert!(!client.delete_vhost("default").await.unwrap());
    assert_eq!(client.delete_vhost("missing").await.unwrap_err().status(), Some(404));
}

#[tokio::test]
async fn test_stats_degrade_to_empty_object() {
    let server = start_mock_media_server(MockOptions::default()).await;
    let api = client(&server.url(), "");

    assert_eq!(api.get_server_stats().await, serde_json::json!({}));
    assert_eq!(
        api.get_stream_stats("default", "app", "nope").await,
        serde_json::json!({})
    );
    assert!(api.fetch_server_stats().await.is_err());

    let with_stats = start_mock_media_server(MockOptions {
        stats_available: true,
        ..Default::default()
    })
    .await;
    let stats = client(&with_stats.url(), "").get_server_stats().await;
    assert_eq!(stats["totalConnections"], 3);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = start_mock_media_server(MockOptions {
        delay: Some(Duration::from_secs(3)),
        ..Default::default()
    })
    .await;
    let client = MediaServerClient::new(&server.url(), "", Duration::from_secs(1)).unwrap();

    assert!(matches!(
        client.list_vhosts().await,
        Err(RemoteApiError::Timeout(1))
    ));
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_unreachable_server() {
    let client = client(UNREACHABLE_URL, "");

    assert!(!client.health_check().await);
    assert!(matches!(
        client.list_vhosts().await,
        Err(RemoteApiError::Connection(_))
    ));
    assert_eq!(client.get_server_stats().await, serde_json::json!({}));
}
