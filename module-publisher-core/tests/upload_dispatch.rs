use module_publisher_core::contract::{MockObjectStore, ObjectStore, UploadError, UploadTask};
use module_publisher_core::error::PublishError;
use module_publisher_core::upload::dispatch_uploads;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn task(key: &str) -> UploadTask {
    UploadTask {
        local_path: PathBuf::from(format!("/tmp/{key}")),
        key: key.to_string(),
    }
}

#[tokio::test]
async fn test_dispatch_returns_locations_in_task_order() {
    let mut store = MockObjectStore::new();
    store
        .expect_put_public()
        .times(3)
        .returning(|_, key| Ok(format!("https://cdn.example/{key}")));

    let tasks = vec![task("a"), task("b"), task("c")];
    let uploaded = dispatch_uploads(&store, &tasks, 2).await.unwrap();

    let locations: Vec<_> = uploaded.iter().map(|u| u.location.as_str()).collect();
    assert_eq!(
        locations,
        vec![
            "https://cdn.example/a",
            "https://cdn.example/b",
            "https://cdn.example/c"
        ]
    );
}

#[tokio::test]
async fn test_dispatch_aggregates_every_failure() {
    let mut store = MockObjectStore::new();
    store.expect_put_public().times(3).returning(|_, key| {
        if key == "b" {
            Ok("https://cdn.example/b".to_string())
        } else {
            Err(format!("denied {key}").into())
        }
    });

    let tasks = vec![task("a"), task("b"), task("c")];
    let err = dispatch_uploads(&store, &tasks, 1).await.unwrap_err();

    match &err {
        PublishError::Upload { failures } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].key, "a");
            assert_eq!(failures[0].message, "denied a");
            assert_eq!(failures[1].key, "c");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "2 upload(s) failed: a (denied a); c (denied c)");
}

#[tokio::test]
async fn test_dispatch_with_no_tasks_makes_no_calls() {
    let mut store = MockObjectStore::new();
    store.expect_put_public().times(0);
    let uploaded = dispatch_uploads(&store, &[], 4).await.unwrap();
    assert!(uploaded.is_empty());
}

/// Records the highest number of uploads observed in flight at once.
struct SlowStore {
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ObjectStore for SlowStore {
    async fn put_public(&self, _local_path: &Path, key: &str) -> Result<String, UploadError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("mem://{key}"))
    }
}

#[tokio::test]
async fn test_dispatch_respects_concurrency_limit() {
    let cases = [(0, 1), (1, 1), (3, 3)];
    for (concurrency, expected_peak) in cases {
        let peak = Arc::new(AtomicUsize::new(0));
        let store = SlowStore {
            in_flight: AtomicUsize::new(0),
            peak: peak.clone(),
        };
        let tasks: Vec<_> = (0..6).map(|i| task(&format!("k{i}"))).collect();

        let uploaded = dispatch_uploads(&store, &tasks, concurrency).await.unwrap();

        assert_eq!(uploaded.len(), 6);
        assert_eq!(
            peak.load(Ordering::SeqCst),
            expected_peak,
            "concurrency {concurrency}"
        );
    }
}
