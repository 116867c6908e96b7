//! Per-section generation.
//!
//! Each header is generated by its own request. Any number of requests may be
//! outstanding at once, for different headers or even the same one. Results are
//! merged into the [`ContentStore`] one key at a time, so completion order never
//! loses another header's text. For the same header the last response to
//! arrive wins.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::error::ComposeError;
use super::store::ContentStore;
use crate::client::{ClientError, GenerationService};

/// Request state of one header.
///
/// A failed attempt settles back to `Idle`; the failure itself is reported to
/// the caller and kept in [`SectionCoordinator::last_failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Idle,
    Generating,
    Completed,
}

impl SectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Completed => "completed",
        }
    }
}

/// Section generation response: bare text or an object carrying it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SectionPayload {
    Text(String),
    Object {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        content: Option<String>,
    },
}

impl SectionPayload {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Object { text, content } => text.filter(|t| !t.is_empty()).or(content),
        }
    }
}

/// Pull the section text out of a response payload.
fn extract_text(header: &str, payload: Value) -> Result<String, ComposeError> {
    serde_json::from_value::<SectionPayload>(payload)
        .ok()
        .and_then(SectionPayload::into_text)
        .ok_or_else(|| ComposeError::MalformedSection {
            header: header.to_string(),
        })
}

/// Bookkeeping for UI feedback. Not consulted for merge correctness.
#[derive(Debug, Default)]
struct RequestTable {
    /// Outstanding request count per header.
    in_flight: HashMap<String, usize>,
    completed: HashSet<String>,
    failures: HashMap<String, String>,
}

impl RequestTable {
    fn begin(&mut self, header: &str) {
        *self.in_flight.entry(header.to_string()).or_insert(0) += 1;
        self.failures.remove(header);
    }

    fn finish(&mut self, header: &str) {
        if let Some(count) = self.in_flight.get_mut(header) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(header);
            }
        }
    }

    fn state(&self, header: &str) -> SectionState {
        if self.in_flight.contains_key(header) {
            SectionState::Generating
        } else if self.completed.contains(header) {
            SectionState::Completed
        } else {
            SectionState::Idle
        }
    }
}

/// Drives section generation for one essay and merges results into its store.
pub struct SectionCoordinator {
    service: Arc<dyn GenerationService>,
    store: ContentStore,
    requests: Arc<Mutex<RequestTable>>,
}

impl SectionCoordinator {
    pub fn new(service: Arc<dyn GenerationService>, store: ContentStore) -> Self {
        Self {
            service,
            store,
            requests: Arc::new(Mutex::new(RequestTable::default())),
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn state(&self, header: &str) -> SectionState {
        self.requests
            .lock()
            .expect("request table lock poisoned")
            .state(header)
    }

    /// Headers with at least one request outstanding.
    pub fn generating(&self) -> BTreeSet<String> {
        self.requests
            .lock()
            .expect("request table lock poisoned")
            .in_flight
            .keys()
            .cloned()
            .collect()
    }

    /// Message of the header's last failed attempt, until it is retried.
    pub fn last_failure(&self, header: &str) -> Option<String> {
        self.requests
            .lock()
            .expect("request table lock poisoned")
            .failures
            .get(header)
            .cloned()
    }

    fn begin(&self, header: &str) {
        self.requests
            .lock()
            .expect("request table lock poisoned")
            .begin(header);
    }

    /// Generate `header` and merge the text into the store.
    ///
    /// Returns the generated text. On failure the store is left untouched and
    /// the header goes back to [`SectionState::Idle`].
    pub async fn generate(
        &self,
        essay_id: &str,
        header: &str,
        document_id: &str,
    ) -> Result<String, ComposeError> {
        self.begin(header);
        let outcome = request_section(self.service.as_ref(), essay_id, header, document_id).await;
        settle(&self.store, &self.requests, header, outcome)
    }

    /// Like [`generate`](Self::generate), but runs on its own task.
    ///
    /// The task holds only weak references to the store and request table: if
    /// the coordinator and every store handle are dropped before the response
    /// arrives, the response is discarded.
    pub fn spawn_generate(
        &self,
        essay_id: impl Into<String>,
        header: impl Into<String>,
        document_id: impl Into<String>,
    ) -> JoinHandle<Result<String, ComposeError>> {
        let essay_id = essay_id.into();
        let header = header.into();
        let document_id = document_id.into();
        self.begin(&header);

        let service = Arc::clone(&self.service);
        let store = self.store.downgrade();
        let requests = Arc::downgrade(&self.requests);

        tokio::spawn(async move {
            let outcome =
                request_section(service.as_ref(), &essay_id, &header, &document_id).await;
            match (store.upgrade(), requests.upgrade()) {
                (Some(store), Some(requests)) => settle(&store, &requests, &header, outcome),
                _ => {
                    tracing::debug!("Dropping late response for section {:?}", header);
                    Err(ComposeError::Detached { header })
                }
            }
        })
    }
}

async fn request_section(
    service: &dyn GenerationService,
    essay_id: &str,
    header: &str,
    document_id: &str,
) -> Result<String, ComposeError> {
    let payload = service
        .generate_section(essay_id, header, document_id)
        .await
        .map_err(|source: ClientError| ComposeError::Section {
            header: header.to_string(),
            source,
        })?;
    extract_text(header, payload)
}

/// Apply a finished request to the store and request table.
fn settle(
    store: &ContentStore,
    requests: &Mutex<RequestTable>,
    header: &str,
    outcome: Result<String, ComposeError>,
) -> Result<String, ComposeError> {
    if let Ok(ref text) = outcome {
        store.merge(header, text.clone());
    }

    let mut table = requests.lock().expect("request table lock poisoned");
    table.finish(header);
    match outcome {
        Ok(text) => {
            table.completed.insert(header.to_string());
            tracing::info!("Section {:?} generated ({} chars)", header, text.len());
            Ok(text)
        }
        Err(e) => {
            table.completed.remove(header);
            table.failures.insert(header.to_string(), e.to_string());
            tracing::warn!("Section {:?} failed: {}", header, e);
            Err(e)
        }
    }
}
