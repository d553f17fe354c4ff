//! Integration tests for the request hook.
//!
//! These tests drive `UseRequest` against mock HTTP servers and assert on the
//! reactive state it exposes.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fetcher_core::request::RequestError;
use fetcher_core::{HttpClient, RequestConfig, Scope, UseRequest, UseRequestOptions};
use serde::Deserialize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Item {
    id: u32,
}

/// Counts callback invocations.
#[derive(Clone, Default)]
struct Counter(Arc<AtomicUsize>);

impl Counter {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

async fn mount_item(server: &MockServer, id: u32, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/items/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": id }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

fn items_hook(
    server: &MockServer,
    options: UseRequestOptions<Item>,
    scope: &Scope,
) -> UseRequest<Item> {
    UseRequest::new(
        HttpClient::new(),
        format!("{}/items/{{id}}", server.uri()),
        RequestConfig::new().param("id", "1"),
        options,
        scope,
    )
}

#[tokio::test]
async fn test_execute_success_populates_state_and_callbacks() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::ZERO).await;

    let successes = Counter::default();
    let finishes = Counter::default();
    let (s, f) = (successes.clone(), finishes.clone());
    let options = UseRequestOptions::new()
        .on_success(move |item: &Item| {
            assert_eq!(item.id, 1);
            s.bump();
        })
        .on_finish(move || f.bump());

    let scope = Scope::new();
    let hook = items_hook(&server, options, &scope);
    assert!(!hook.finished().get());

    let item = hook.execute().await.expect("request should succeed");

    assert_eq!(item, Item { id: 1 });
    assert_eq!(hook.data().get(), Some(Item { id: 1 }));
    assert_eq!(hook.response().get().map(|r| r.status), Some(200));
    assert!(hook.error().get().is_none());
    assert!(hook.finished().get());
    assert!(!hook.loading().get());
    assert!(!hook.aborted().get());
    assert_eq!(successes.get(), 1);
    assert_eq!(finishes.get(), 1);
}

#[tokio::test]
async fn test_execute_expands_template_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/rust%20lang/users/42"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 42 })))
        .expect(1)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = UseRequest::<Item>::new(
        HttpClient::new(),
        "/orgs/{org}/users/{id}",
        RequestConfig::new()
            .base_url(server.uri())
            .param("org", "rust lang")
            .query("page", "1"),
        UseRequestOptions::new(),
        &scope,
    );

    let overrides = RequestConfig::new().param("id", "42").query("page", "2");
    let item = hook.execute_with(overrides).await.expect("request should succeed");
    assert_eq!(item.id, 42);
}

#[tokio::test]
async fn test_retry_count_is_honored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let errors = Counter::default();
    let e = errors.clone();
    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new().retry(2).on_error(move |_| e.bump()),
        &scope,
    );

    let err = hook.execute().await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(hook.error().get().and_then(|e| e.status()), Some(503));
    assert_eq!(errors.get(), 1, "on_error fires once after retries");
    assert!(hook.finished().get());
    assert!(!hook.aborted().get());
    assert!(hook.data().get().is_none());
}

#[tokio::test]
async fn test_retry_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_item(&server, 1, Duration::ZERO).await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new().retry(2), &scope);

    let item = hook.execute().await.expect("third attempt should succeed");
    assert_eq!(item.id, 1);
    assert!(hook.error().get().is_none());
}

#[tokio::test]
async fn test_decode_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new().retry(3), &scope);

    let err = hook.execute().await.unwrap_err();
    assert!(matches!(err, RequestError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_missing_param_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let errors = Counter::default();
    let e = errors.clone();
    let scope = Scope::new();
    let hook = UseRequest::<Item>::new(
        HttpClient::new(),
        format!("{}/items/{{id}}", server.uri()),
        RequestConfig::new(),
        UseRequestOptions::new().retry(2).on_error(move |_| e.bump()),
        &scope,
    );

    let err = hook.execute().await.unwrap_err();
    assert!(matches!(err, RequestError::MissingParam { ref name, .. } if name == "id"));
    assert_eq!(errors.get(), 1);
}

#[tokio::test]
async fn test_cancel_suppresses_error_and_sets_aborted() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_secs(5)).await;

    let errors = Counter::default();
    let finishes = Counter::default();
    let (e, f) = (errors.clone(), finishes.clone());
    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new()
            .retry(3)
            .on_error(move |_| e.bump())
            .on_finish(move || f.bump()),
        &scope,
    );

    let task = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;
    assert!(hook.is_in_flight());

    hook.cancel();
    let err = task.await.unwrap().unwrap_err();

    assert!(err.is_cancelled());
    assert!(hook.aborted().get());
    assert!(hook.error().get().is_none(), "cancellation must not populate error");
    assert_eq!(errors.get(), 0);
    assert_eq!(finishes.get(), 1);
    assert!(hook.finished().get());
    assert!(!hook.loading().get());
    assert!(!hook.is_in_flight());
}

#[tokio::test]
async fn test_cancel_with_nothing_in_flight_is_noop() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::ZERO).await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new(), &scope);
    hook.cancel();
    assert!(!hook.aborted().get());

    hook.execute().await.expect("request should succeed");
    hook.cancel();
    assert!(!hook.aborted().get());
    assert_eq!(hook.data().get(), Some(Item { id: 1 }));
}

#[tokio::test]
async fn test_auto_cancel_aborts_previous_call() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_secs(5)).await;
    mount_item(&server, 2, Duration::ZERO).await;

    let finishes = Counter::default();
    let f = finishes.clone();
    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new().on_finish(move || f.bump()), &scope);

    let first = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;

    let second = hook
        .execute_with(RequestConfig::new().param("id", "2"))
        .await
        .expect("second call should succeed");
    let first = first.await.unwrap();

    assert_eq!(second, Item { id: 2 });
    assert!(first.unwrap_err().is_cancelled());
    assert_eq!(hook.data().get(), Some(Item { id: 2 }));
    assert!(!hook.aborted().get(), "superseded call must not flag the newer one");
    assert!(hook.error().get().is_none());
    assert!(!hook.loading().get());
    assert_eq!(finishes.get(), 1, "superseded call settles silently");
}

#[tokio::test]
async fn test_cancel_then_execute_leaves_state_to_newer_call() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_secs(5)).await;
    mount_item(&server, 2, Duration::from_millis(300)).await;

    let finishes = Counter::default();
    let f = finishes.clone();
    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new().on_finish(move || f.bump()), &scope);

    let first = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;

    // Cancel and restart in one poll so the newer call starts before the
    // cancelled one gets to settle.
    let second = tokio::spawn({
        let hook = hook.clone();
        async move {
            hook.cancel();
            hook.execute_with(RequestConfig::new().param("id", "2")).await
        }
    });

    let first = first.await.unwrap();
    assert!(first.unwrap_err().is_cancelled());
    assert!(hook.loading().get());
    assert!(!hook.finished().get(), "newer call is still loading");
    assert!(!hook.aborted().get(), "cancelled call must not flag the newer one");

    let second = second.await.unwrap().expect("newer call should succeed");
    assert_eq!(second, Item { id: 2 });
    assert_eq!(hook.data().get(), Some(Item { id: 2 }));
    assert!(hook.finished().get());
    assert!(!hook.aborted().get());
    assert!(!hook.loading().get());
    assert_eq!(finishes.get(), 1, "cancelled call settles silently");
}

#[tokio::test]
async fn test_cancel_during_retry_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let errors = Counter::default();
    let e = errors.clone();
    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new()
            .retry(3)
            .retry_delay(Duration::from_millis(500))
            .on_error(move |_| e.bump()),
        &scope,
    );

    let task = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;
    hook.cancel();

    let err = task.await.unwrap().unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert!(hook.aborted().get());
    assert!(hook.error().get().is_none());
    assert_eq!(errors.get(), 0);
    assert!(!hook.loading().get());
}

#[tokio::test]
async fn test_without_auto_cancel_calls_race() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_millis(300)).await;
    mount_item(&server, 2, Duration::ZERO).await;

    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new().auto_cancel_previous(false),
        &scope,
    );

    let slow = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;

    let fast = hook
        .execute_with(RequestConfig::new().param("id", "2"))
        .await
        .expect("fast call should succeed");
    assert_eq!(fast.id, 2);
    assert!(hook.loading().get(), "slow call is still in flight");

    let slow = slow.await.unwrap().expect("slow call should succeed");
    assert_eq!(slow.id, 1);
    assert_eq!(hook.data().get(), Some(Item { id: 1 }), "last to settle wins");
    assert!(!hook.loading().get());
}

#[tokio::test]
async fn test_unmount_cancels_in_flight_call() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_secs(5)).await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new(), &scope);

    let task = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;

    scope.unmount();
    let err = task.await.unwrap().unwrap_err();

    match err {
        RequestError::Cancelled { reason, .. } => assert!(reason.contains("unmounted")),
        other => panic!("Expected Cancelled, got: {other:?}"),
    }
    assert!(hook.aborted().get());
}

#[tokio::test]
async fn test_unmount_without_auto_cancel_lets_call_finish() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_millis(200)).await;

    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new().auto_cancel_on_unmount(false),
        &scope,
    );

    let task = tokio::spawn({
        let hook = hook.clone();
        async move { hook.execute().await }
    });
    hook.loading().wait_for(|loading| *loading).await;

    scope.unmount();
    let item = task.await.unwrap().expect("call should not be cancelled");
    assert_eq!(item.id, 1);
}

#[tokio::test]
async fn test_immediate_executes_once_on_creation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new().immediate(true), &scope);
    assert!(hook.loading().get(), "immediate call starts synchronously");

    hook.finished().wait_for(|finished| *finished).await;
    assert_eq!(hook.data().get(), Some(Item { id: 1 }));
}

#[test]
fn test_immediate_without_runtime_is_skipped() {
    let scope = Scope::new();
    let hook = UseRequest::<Item>::new(
        HttpClient::new(),
        "http://127.0.0.1:9/items/{id}",
        RequestConfig::new(),
        UseRequestOptions::new().immediate(true),
        &scope,
    );
    assert!(!hook.loading().get());

    let err = tokio_test::block_on(hook.execute()).unwrap_err();
    assert!(matches!(err, RequestError::MissingParam { .. }));
}

#[test]
fn test_immediate_call_settles_when_runtime_shuts_down() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let scope = Scope::new();

    let hook = {
        let _entered = runtime.enter();
        UseRequest::<Item>::new(
            HttpClient::new(),
            "http://127.0.0.1:9/items/1",
            RequestConfig::new(),
            UseRequestOptions::new().immediate(true),
            &scope,
        )
    };
    assert!(hook.loading().get());

    // The spawned call was never polled.
    drop(runtime);

    assert!(!hook.is_in_flight());
    assert!(!hook.loading().get());
    assert!(hook.aborted().get());
    assert!(hook.finished().get());
}

#[tokio::test]
async fn test_default_data_and_reset_on_execute() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = items_hook(
        &server,
        UseRequestOptions::new()
            .default_with(|| Item { id: 0 })
            .reset_on_execute(true),
        &scope,
    );
    assert_eq!(hook.data().get(), Some(Item { id: 0 }));

    hook.execute().await.expect("request should succeed");
    assert_eq!(hook.data().get(), Some(Item { id: 1 }));

    let err = hook
        .execute_with(RequestConfig::new().param("id", "2"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(hook.data().get(), Some(Item { id: 0 }), "data reset to default");
}

#[tokio::test]
async fn test_failed_call_keeps_previous_data_by_default() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::ZERO).await;
    Mock::given(method("GET"))
        .and(path("/items/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new(), &scope);

    hook.execute().await.expect("request should succeed");
    hook.execute_with(RequestConfig::new().param("id", "2"))
        .await
        .unwrap_err();

    assert_eq!(hook.data().get(), Some(Item { id: 1 }));
    assert_eq!(hook.error().get().and_then(|e| e.status()), Some(500));
}

#[tokio::test]
async fn test_dropped_execution_settles_as_aborted() {
    let server = MockServer::start().await;
    mount_item(&server, 1, Duration::from_secs(5)).await;

    let scope = Scope::new();
    let hook = items_hook(&server, UseRequestOptions::new(), &scope);

    let timed_out = tokio::time::timeout(Duration::from_millis(100), hook.execute()).await;
    assert!(timed_out.is_err());

    assert!(!hook.is_in_flight());
    assert!(!hook.loading().get());
    assert!(hook.aborted().get());
    assert!(hook.error().get().is_none());
}
