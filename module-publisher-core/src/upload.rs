//! Pushing collected files to the object store as one bounded task group.

use crate::contract::{ObjectStore, UploadTask, UploadedObject};
use crate::error::{PublishError, Result, UploadFailure};
use futures::stream::{self, StreamExt};
use tracing::{error, info};

/// Uploads every task with at most `concurrency` requests in flight.
///
/// All tasks run to completion before the result is decided; failures are
/// collected and reported together. Nothing is retried.
pub async fn dispatch_uploads<O>(
    store: &O,
    tasks: &[UploadTask],
    concurrency: usize,
) -> Result<Vec<UploadedObject>>
where
    O: ObjectStore + ?Sized,
{
    let limit = concurrency.max(1);
    info!(tasks = tasks.len(), concurrency = limit, "Dispatching uploads");

    let outcomes: Vec<_> = stream::iter(tasks)
        .map(|task| async move {
            let outcome = store.put_public(&task.local_path, &task.key).await;
            (task, outcome)
        })
        .buffered(limit)
        .collect()
        .await;

    let mut uploaded = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (task, outcome) in outcomes {
        match outcome {
            Ok(location) => {
                info!(key = %task.key, location = %location, "Successfully uploaded");
                uploaded.push(UploadedObject {
                    key: task.key.clone(),
                    location,
                });
            }
            Err(e) => {
                error!(
                    key = %task.key,
                    path = %task.local_path.display(),
                    error = %e,
                    "Upload failed"
                );
                failures.push(UploadFailure {
                    key: task.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if failures.is_empty() {
        Ok(uploaded)
    } else {
        Err(PublishError::Upload { failures })
    }
}
