//! GraphQL client behavior against a mock HTTP endpoint.

use chrono::{Duration, Utc};
use commit_receipt::github::{GithubClient, ProfileError, Transport};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> GithubClient {
    GithubClient::new(Some("test_token"), server.uri()).unwrap()
}

#[tokio::test]
async fn test_profile_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "Bearer test_token"))
        .and(body_partial_json(json!({"variables": {"login": "alice"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": {
                    "name": "Alice",
                    "login": "alice",
                    "avatarUrl": "https://example.com/a.png",
                    "createdAt": "2020-06-15T12:00:00Z",
                    "followers": {"totalCount": 10},
                    "following": {"totalCount": 4},
                    "repositories": {"totalCount": 7}
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let profile = client_for(&server).await.fetch_profile("alice").await.unwrap();

    assert_eq!(profile.login, "alice");
    assert_eq!(profile.name, "Alice");
    assert_eq!(profile.followers, 10);
    assert_eq!(profile.public_repos, 7);
    assert_eq!(profile.created_at.to_rfc3339(), "2020-06-15T12:00:00+00:00");
}

#[tokio::test]
async fn test_profile_null_name_falls_back_to_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": {
                    "name": null,
                    "login": "alice",
                    "avatarUrl": "",
                    "createdAt": "2020-01-01T00:00:00Z",
                    "followers": {"totalCount": 0},
                    "following": {"totalCount": 0},
                    "repositories": {"totalCount": 0}
                }
            }
        })))
        .mount(&server)
        .await;

    let profile = client_for(&server).await.fetch_profile("alice").await.unwrap();
    assert_eq!(profile.name, "alice");
}

#[tokio::test]
async fn test_null_user_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"user": null}})))
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_profile("ghost").await.unwrap_err();
    assert!(matches!(err, ProfileError::NotFound(login) if login == "ghost"));
}

#[tokio::test]
async fn test_server_error_is_remote_for_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_profile("alice").await.unwrap_err();
    assert!(matches!(err, ProfileError::Remote(_)));
}

#[tokio::test]
async fn test_graphql_errors_are_remote_for_profile() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "API rate limit exceeded"}]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).await.fetch_profile("alice").await.unwrap_err();
    assert!(matches!(err, ProfileError::Remote(_)));
}

#[tokio::test]
async fn test_daily_records_flatten_calendar_weeks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": {
                    "contributionsCollection": {
                        "contributionCalendar": {
                            "weeks": [
                                {"contributionDays": [
                                    {"date": "2024-01-01", "contributionCount": 2},
                                    {"date": "2024-01-02", "contributionCount": 0}
                                ]},
                                {"contributionDays": [
                                    {"date": "2024-01-08", "contributionCount": 5}
                                ]}
                            ]
                        }
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let now = Utc::now();
    let records = client_for(&server)
        .await
        .fetch_daily_records("alice", now - Duration::days(30), now)
        .await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].date, "2024-01-01");
    assert_eq!(records[0].count, 2);
    assert_eq!(records[2].date, "2024-01-08");
    assert_eq!(records[2].count, 5);
}

#[tokio::test]
async fn test_daily_records_degrade_to_empty_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let now = Utc::now();
    let records = client_for(&server)
        .await
        .fetch_daily_records("alice", now - Duration::days(30), now)
        .await;

    assert!(records.is_empty());
}

#[tokio::test]
async fn test_top_repos_mapped_from_nodes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"variables": {"login": "alice", "first": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": {
                    "repositories": {
                        "nodes": [
                            {
                                "name": "widget",
                                "stargazerCount": 42,
                                "primaryLanguage": {"name": "Rust"},
                                "updatedAt": "2024-06-01T00:00:00Z"
                            },
                            {
                                "name": "scratch",
                                "stargazerCount": 1,
                                "primaryLanguage": null,
                                "updatedAt": "2023-01-01T00:00:00Z"
                            }
                        ]
                    }
                }
            }
        })))
        .mount(&server)
        .await;

    let repos = client_for(&server).await.fetch_top_repos("alice", 2).await;

    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].name, "widget");
    assert_eq!(repos[0].stars, 42);
    assert_eq!(repos[0].primary_language.as_deref(), Some("Rust"));
    assert!(repos[1].primary_language.is_none());
}

#[tokio::test]
async fn test_top_repos_degrade_to_empty_on_graphql_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "something went wrong"}]
        })))
        .mount(&server)
        .await;

    let repos = client_for(&server).await.fetch_top_repos("alice", 5).await;
    assert!(repos.is_empty());
}
