mod common;

use common::{read_json, wiki_settings};
use confluence_snapshot::app::jobs::WatchersPipeline;
use confluence_snapshot::{EtlEngine, EtlError, LocalStorage};
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn mock_space_and_pages(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/wiki/rest/api/space");
        then.status(200).json_body(json!({
            "results": [{"id": 1, "key": "ENG", "name": "Engineering", "type": "global"}]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/wiki/rest/api/space/ENG/content/page");
        then.status(200).json_body(json!({
            "results": [
                {"id": "11", "title": "Runbook"},
                {"id": "12", "title": "Draft"}
            ]
        }));
    });
}

#[tokio::test]
async fn test_watchers_snapshot_pages_through_cursors() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_space_and_pages(&server);

    let space_first = server.mock(|when, then| {
        when.method(POST)
            .path("/cgraphql")
            .query_param("q", "SpaceWatchersQuery")
            .json_body_partial(r#"{"operationName": "SpaceWatchersQuery", "variables": {"spaceKey": "ENG", "first": 20, "after": null}}"#);
        then.status(200).json_body(json!({
            "data": {"spaceWatchers": {
                "count": 3,
                "nodes": [
                    {"accountId": "u1", "displayName": "Ada"},
                    {"accountId": "u2", "displayName": "Grace"}
                ],
                "pageInfo": {"hasNextPage": true, "endCursor": "c2"}
            }}
        }));
    });
    let space_second = server.mock(|when, then| {
        when.method(POST)
            .path("/cgraphql")
            .query_param("q", "SpaceWatchersQuery")
            .json_body_partial(r#"{"variables": {"spaceKey": "ENG", "after": "c2"}}"#);
        then.status(200).json_body(json!({
            "data": {"spaceWatchers": {
                "count": 3,
                "nodes": [{"accountId": "u3", "displayName": "Linus"}],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }}
        }));
    });
    let page_watchers = server.mock(|when, then| {
        when.method(POST)
            .path("/cgraphql")
            .query_param("q", "ContentWatchersQuery")
            .json_body_partial(r#"{"variables": {"contentId": "11"}}"#);
        then.status(200).json_body(json!({
            "data": {"contentWatchers": {
                "count": 1,
                "nodes": [{"accountId": "u1", "displayName": "Ada"}],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }}
        }));
    });
    // 頁面 12 沒有對應的 mock -> 404 -> 空的關注者清單

    let settings = wiki_settings(&server, &temp_dir);
    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = WatchersPipeline::new(storage, settings).unwrap();

    EtlEngine::new(pipeline).run().await.unwrap();

    space_first.assert();
    space_second.assert();
    page_watchers.assert();

    let written = read_json(&temp_dir, "confluence_space_and_page_watchers_data.json");
    let eng = &written[0];
    assert_eq!(eng["space_name"], "Engineering");
    assert_eq!(eng["space_id"], 1);
    assert_eq!(eng["space_watchers"]["count"], 3);
    let watchers = eng["space_watchers"]["watchers"].as_array().unwrap();
    assert_eq!(watchers.len(), 3);
    assert_eq!(watchers[2]["displayName"], "Linus");

    assert_eq!(eng["space_pages"][0]["page_name"], "Runbook");
    assert_eq!(eng["space_pages"][0]["page_watchers"]["count"], 1);
    assert_eq!(
        eng["space_pages"][1]["page_watchers"],
        json!({"count": 0, "watchers": []})
    );
}

#[tokio::test]
async fn test_graphql_errors_without_data_fail_the_job() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();
    mock_space_and_pages(&server);

    server.mock(|when, then| {
        when.method(POST)
            .path("/cgraphql")
            .query_param("q", "SpaceWatchersQuery");
        then.status(200).json_body(json!({
            "errors": [{"message": "Not permitted"}]
        }));
    });

    let settings = wiki_settings(&server, &temp_dir);
    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = WatchersPipeline::new(storage, settings).unwrap();

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    match err {
        EtlError::GraphQlError { operation, message } => {
            assert_eq!(operation, "SpaceWatchersQuery");
            assert!(message.contains("Not permitted"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!common::exists(&temp_dir, "confluence_space_and_page_watchers_data.json"));
}

#[tokio::test]
async fn test_page_list_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/wiki/rest/api/space");
        then.status(200).json_body(json!({
            "results": [{"id": 1, "key": "ENG", "name": "Engineering", "type": "global"}]
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/cgraphql");
        then.status(200).json_body(json!({
            "data": {"spaceWatchers": {"count": 0, "nodes": [], "pageInfo": {"hasNextPage": false}}}
        }));
    });
    // 頁面清單未設定 mock -> 404

    let settings = wiki_settings(&server, &temp_dir);
    let storage = LocalStorage::new(settings.output_path.clone());
    let pipeline = WatchersPipeline::new(storage, settings).unwrap();

    let err = EtlEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, EtlError::HttpStatusError { status: 404, .. }));
}
