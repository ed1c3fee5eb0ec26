use chat_sync::session::{MemoryStorage, TOKEN_KEY};
use chat_sync::{
    ApiClient, CacheKey, ChatError, ClientConfig, MutationCoordinator, Queries, QueryCache,
    SessionStore,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn message_json(id: &str, content: &str) -> serde_json::Value {
    json!({
        "message_id": id,
        "content": content,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "user": { "username": "alice" }
    })
}

struct Harness {
    queries: Queries,
    mutations: MutationCoordinator,
    cache: Arc<QueryCache>,
}

fn harness(server: &MockServer) -> Harness {
    let session = Arc::new(SessionStore::new(Arc::new(MemoryStorage::seeded(TOKEN_KEY, "tok"))));
    session.initialize().unwrap();
    let api = ApiClient::new(ClientConfig::with_base_url(server.uri()), session).unwrap();
    let cache = Arc::new(QueryCache::new());
    Harness {
        queries: Queries::new(api.clone(), cache.clone()),
        mutations: MutationCoordinator::new(api, cache.clone()),
        cache,
    }
}

async fn mount_messages(server: &MockServer, channel_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/channels/{}/messages", channel_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json("1", "hello")])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fresh_entries_are_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json("1", "hello")])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let first = h.queries.messages("7").await.unwrap();
    let second = h.queries.messages("7").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].content, "hello");
}

#[tokio::test]
async fn test_send_trims_and_invalidates_channel() {
    let server = MockServer::start().await;
    mount_messages(&server, "7").await;
    mount_messages(&server, "8").await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .and(body_json(json!({"content": "hi there"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(message_json("2", "hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.queries.messages("7").await.unwrap();
    h.queries.messages("8").await.unwrap();
    assert!(!h.cache.is_stale(&CacheKey::messages("7")));

    let sent = h.mutations.send("7", "  hi there \n").await.unwrap();
    assert_eq!(sent.message_id, "2");
    assert!(h.cache.is_stale(&CacheKey::messages("7")));
    assert!(!h.cache.is_stale(&CacheKey::messages("8")));
}

#[tokio::test]
async fn test_failed_write_leaves_cache_untouched() {
    let server = MockServer::start().await;
    mount_messages(&server, "7").await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.queries.messages("7").await.unwrap();
    let before = h.cache.get(&CacheKey::messages("7")).unwrap();

    let err = h.mutations.send("7", "hello").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(h.cache.get(&CacheKey::messages("7")).unwrap(), before);
    assert!(!h.cache.is_stale(&CacheKey::messages("7")));
}

#[tokio::test]
async fn test_blank_content_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(201).set_body_json(message_json("2", "x")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/channels/7/messages/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("2", "x")))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    assert!(matches!(
        h.mutations.send("7", "   ").await,
        Err(ChatError::Validation(_))
    ));
    assert!(matches!(
        h.mutations.edit("7", "2", "\n\t").await,
        Err(ChatError::Validation(_))
    ));
}

#[tokio::test]
async fn test_edit_uses_patch() {
    let server = MockServer::start().await;
    mount_messages(&server, "7").await;
    Mock::given(method("PATCH"))
        .and(path("/channels/7/messages/1"))
        .and(body_json(json!({"content": "edited"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(message_json("1", "edited")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.queries.messages("7").await.unwrap();
    let edited = h.mutations.edit("7", "1", " edited ").await.unwrap();
    assert_eq!(edited.content, "edited");
    assert!(h.cache.is_stale(&CacheKey::messages("7")));
}

#[tokio::test]
async fn test_delete_invalidates_every_message_collection() {
    let server = MockServer::start().await;
    mount_messages(&server, "7").await;
    mount_messages(&server, "8").await;
    Mock::given(method("GET"))
        .and(path("/servers/my-servers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "statusCode": 200,
            "data": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/channels/7/messages/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.queries.messages("7").await.unwrap();
    h.queries.messages("8").await.unwrap();
    h.queries.servers().await.unwrap();

    h.mutations.delete("7", "1").await.unwrap();
    assert!(h.cache.is_stale(&CacheKey::messages("7")));
    assert!(h.cache.is_stale(&CacheKey::messages("8")));
    assert!(!h.cache.is_stale(&CacheKey::servers()));
}

#[tokio::test]
async fn test_invalidated_entry_is_refetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels/7/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json("1", "hello")])))
        .expect(2)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.queries.messages("7").await.unwrap();
    h.cache.invalidate(&CacheKey::messages("7"));
    h.queries.messages("7").await.unwrap();
    assert!(!h.cache.is_stale(&CacheKey::messages("7")));
}
