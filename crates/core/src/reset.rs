use crate::error::PipelineError;
use crate::models::ResetOutcome;
use crate::traits::VectorIndex;
use tracing::{error, info, warn};

async fn delete_if_present(store: &dyn VectorIndex) -> Result<ResetOutcome, PipelineError> {
    if !store.collection_exists().await? {
        warn!(collection = store.collection(), "collection is already empty or does not exist");
        return Ok(ResetOutcome::NothingToDelete);
    }

    store.delete_collection().await?;
    info!(collection = store.collection(), "previous vectors deleted");
    Ok(ResetOutcome::Deleted)
}

/// Deletes the whole collection. An absent collection is not an error.
pub async fn clear_collection(store: &dyn VectorIndex) -> Result<ResetOutcome, PipelineError> {
    let result = delete_if_present(store).await;

    if let Err(err) = &result {
        error!(collection = store.collection(), error = %err, "error deleting previous vectors");
    }
    result
}
