//! Bulk insertion of fetched responses

use crate::cache::storage::CacheStorage;
use crate::error::{OffgridError, OffgridResult};
use crate::http::RequestInfo;
use crate::network::Network;
use futures_util::future::try_join_all;
use tracing::debug;
use url::Url;

/// Fetch every target and store the responses in `bucket`.
///
/// All-or-nothing: the batch fails, and nothing is stored, if any target
/// cannot be turned into a request, cannot be fetched, or answers with a
/// non-2xx status. Returns the number of entries stored.
pub async fn add_all(
    storage: &dyn CacheStorage,
    network: &dyn Network,
    bucket: &str,
    base: &Url,
    targets: Vec<RequestInfo>,
) -> OffgridResult<usize> {
    let mut batch = Vec::with_capacity(targets.len());
    for target in targets {
        let key = target.cache_key();
        batch.push((key, target.into_request(base)?));
    }

    let responses = try_join_all(batch.iter().map(|(_, request)| network.fetch(request))).await?;

    for ((_, request), response) in batch.iter().zip(&responses) {
        if !response.ok() {
            return Err(OffgridError::PrecacheRejected {
                url: request.url_str().to_string(),
                status: response.status,
            });
        }
    }

    let count = batch.len();
    for ((key, _), response) in batch.into_iter().zip(responses) {
        debug!("Storing {} in {}", key, bucket);
        storage.put(bucket, key, response).await?;
    }

    Ok(count)
}
