//! The fetch-decode-publish pipeline
use std::sync::Arc;

use bon::Builder;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
    config::PetitionsConfig,
    errorhandling::LogAndSwallow,
    model::decode_envelope,
    store::{PublishOutcome, Store},
    transport::{HttpTransport, Transport, TransportError},
};

/// Fetches one page of petitions and publishes it to a [Store].
///
/// The store is injected, so whoever renders it keeps its own clone and
/// observes the replacements.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use petitions::{GetPetitions, Store};
/// use petitions::transport::StaticTransport;
///
/// let store = Store::new();
/// let transport = StaticTransport::new().with_body(
///     r#"{"results":[{"id":"1","title":"T","body":"B","signatureCount":5,"url":"https://x"}]}"#,
/// );
/// let pipeline = GetPetitions::builder()
///     .store(store.clone())
///     .transport(Arc::new(transport))
///     .build();
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// rt.block_on(pipeline.fetch_and_publish()).unwrap();
/// assert_eq!(store.petitions()[0].title, "T");
/// ```
#[derive(Builder, Clone)]
pub struct GetPetitions {
    store: Store,
    #[builder(default = Arc::new(HttpTransport::new()) as Arc<dyn Transport>)]
    transport: Arc<dyn Transport>,
    #[builder(default = default_endpoint())]
    endpoint: Url,
}

fn default_endpoint() -> Url {
    PetitionsConfig::default()
        .endpoint_url()
        .expect("Default endpoint is a valid URL")
}

impl GetPetitions {
    /// The store results are published to
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// URL every fetch requests
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch and publish in the background.
    ///
    /// The work is spawned onto the ambient tokio runtime and cannot be
    /// cancelled. Failures are logged and otherwise dropped, the store is
    /// left untouched in that case. Calling this outside of a tokio runtime
    /// logs an error and does nothing.
    pub fn fetch(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            error!("fetch called outside of a tokio runtime, no request was made");
            return;
        };
        let this = self.clone();
        handle.spawn(async move {
            this.fetch_and_publish()
                .await
                .log_and_swallow("Error fetching petitions");
        });
    }

    /// Issue exactly one GET, decode the body and publish the records.
    ///
    /// The status code of the response is not inspected. On error the store
    /// is left unchanged. If a fetch started after this one has already
    /// published, the result is dropped and [PublishOutcome::Stale] returned.
    pub async fn fetch_and_publish(&self) -> Result<PublishOutcome, FetchError> {
        let ticket = self.store.begin_fetch();
        debug!(endpoint = %self.endpoint, ?ticket, "Fetching petitions");
        let body = self.transport.get(&self.endpoint).await?;
        let petitions = decode_envelope(&body)?;
        let outcome = self.store.publish(ticket, petitions);
        match &outcome {
            PublishOutcome::Published(change) => {
                info!(
                    count = change.len,
                    version = change.version,
                    "Published petitions"
                )
            }
            PublishOutcome::Stale { current, .. } => {
                debug!(?ticket, ?current, "Fetch finished after a newer one")
            }
        }
        Ok(outcome)
    }
}

/// Errors which can occur in a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be completed
    #[error("Error requesting petitions")]
    Transport(#[from] TransportError),
    /// The body is not a valid envelope
    #[error("Error decoding petitions response")]
    Decode(#[from] serde_json::Error),
}
