//! Integration tests for `QueryClient` caching and de-duplication.

use std::sync::Arc;
use std::time::Duration;

use dinemore_client::{
    activity_logs_key, branches_key, ApiClient, MemoryStore, QueryClient, RefetchTrigger,
    SessionStore,
};
use dinemore_core::Branch;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn query_client(base_url: &str) -> QueryClient {
    let session = SessionStore::new(Arc::new(MemoryStore::new()));
    let api = ApiClient::with_base_url(base_url, 30, "dinemore-test", session)
        .expect("client construction should not fail");
    QueryClient::new(api)
}

fn one_branch() -> serde_json::Value {
    serde_json::json!([{
        "id": "b-1",
        "restaurantId": "r-1",
        "name": "Main",
        "isDefault": true,
        "isActive": true
    }])
}

#[tokio::test]
async fn concurrent_fetches_share_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(one_branch())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let key = branches_key("r-1");
    let (a, b) = tokio::join!(client.fetch(&key), client.fetch(&key));

    assert_eq!(a.unwrap(), b.unwrap());
    assert!(client.cached(&key).is_some());
}

#[tokio::test]
async fn every_trigger_refetches_because_data_is_never_fresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_branch()))
        .expect(4)
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let key = branches_key("r-1");

    client.fetch(&key).await.unwrap();
    for trigger in [
        RefetchTrigger::Mount,
        RefetchTrigger::WindowFocus,
        RefetchTrigger::Reconnect,
    ] {
        client.revalidate(&key, trigger).await.unwrap();
    }
}

#[tokio::test]
async fn failed_refetch_keeps_previous_value() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_branch()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let key = branches_key("r-1");

    let branches: Vec<Branch> = client.fetch_as(&key).await.unwrap().unwrap();
    assert_eq!(branches[0].name, "Main");

    let err = client.fetch(&key).await.unwrap_err();
    assert_eq!(err.to_string(), "502: bad gateway");
    assert_eq!(client.cached(&key), Some(one_branch()));
}

#[tokio::test]
async fn clear_detaches_in_flight_fetch_from_next_identity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .and(header("X-User-Id", "old-user"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!(["old"]))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .and(header("X-User-Id", "new-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["new"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let session = client.api().session().clone();
    session.set_stored_auth("old-user", "restaurant_admin").unwrap();
    let key = branches_key("r-1");

    let (old, new) = tokio::join!(client.fetch(&key), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.clear();
        session.clear_stored_auth().unwrap();
        session.set_stored_auth("new-user", "restaurant_admin").unwrap();
        client.fetch(&key).await
    });

    assert_eq!(new.unwrap(), Some(serde_json::json!(["new"])));
    assert_eq!(old.unwrap(), Some(serde_json::json!(["old"])));
    assert_eq!(client.cached(&key), Some(serde_json::json!(["new"])));
}

#[tokio::test]
async fn fetch_finishing_after_clear_does_not_refill_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r-1/branches"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(one_branch())
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let key = branches_key("r-1");

    let (result, ()) = tokio::join!(client.fetch(&key), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.clear();
    });

    assert_eq!(result.unwrap(), Some(one_branch()));
    assert!(client.cached(&key).is_none());
}

#[tokio::test]
async fn cached_queries_and_direct_calls_share_encoded_urls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/restaurants/r%2F1%20x/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(one_branch()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/restaurants/r%2F1%20x/activity-logs"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = query_client(&server.uri());
    let restaurant_id = "r/1 x";

    client.fetch(&branches_key(restaurant_id)).await.unwrap();
    client.api().branches(restaurant_id).await.unwrap();
    client
        .fetch(&activity_logs_key(restaurant_id, 3))
        .await
        .unwrap();
    client.api().activity_logs(restaurant_id, 3).await.unwrap();
}
