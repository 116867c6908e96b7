use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;

use super::assemble::assemble;
use super::coordinator::{SectionCoordinator, SectionState};
use super::error::ComposeError;
use super::export::{self, Clipboard, ExportArtifact};
use super::outline::{contains_header, normalize};
use super::progress::Progress;
use super::store::ContentStore;
use crate::client::GenerationService;
use crate::models::{Essay, OutlineEntry};

/// One editing session over an essay.
///
/// Holds the canonical outline and the content store, and routes section
/// generation through a [`SectionCoordinator`]. Nothing is persisted locally:
/// dropping the session drops its state, and responses still in flight for
/// spawned sections are discarded.
pub struct EssaySession {
    essay_id: String,
    document_id: String,
    topic: String,
    created_at: Option<DateTime<Utc>>,
    outline: Vec<OutlineEntry>,
    store: ContentStore,
    coordinator: SectionCoordinator,
    service: Arc<dyn GenerationService>,
}

impl EssaySession {
    /// Start a session from an essay snapshot.
    pub fn from_essay(service: Arc<dyn GenerationService>, essay: Essay) -> Self {
        let outline = normalize(&essay.outline);
        let store = ContentStore::from_snapshot(essay.content);
        let coordinator = SectionCoordinator::new(Arc::clone(&service), store.clone());
        Self {
            essay_id: essay.id,
            document_id: essay.doc_id,
            topic: essay.topic.unwrap_or_default(),
            created_at: essay.created_at,
            outline,
            store,
            coordinator,
            service,
        }
    }

    /// Generate an outline for `topic` and open a session on the new essay.
    pub async fn create(
        service: Arc<dyn GenerationService>,
        document_id: &str,
        topic: &str,
    ) -> Result<Self, ComposeError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ComposeError::EmptyTopic);
        }
        let mut essay = service.generate_outline(document_id, topic).await?;
        if essay.topic.as_deref().map_or(true, str::is_empty) {
            essay.topic = Some(topic.to_string());
        }
        let session = Self::from_essay(service, essay);
        tracing::info!(
            "Essay {} created with {} sections",
            session.essay_id,
            session.outline.len()
        );
        Ok(session)
    }

    /// Open a session on an existing essay.
    pub async fn open(
        service: Arc<dyn GenerationService>,
        essay_id: &str,
    ) -> Result<Self, ComposeError> {
        let essay = service.get_essay(essay_id).await?;
        Ok(Self::from_essay(service, essay))
    }

    /// Re-fetch the essay and adopt the server's snapshot.
    ///
    /// The outline is replaced; fetched content is merged into the store, so
    /// sections generated locally are kept.
    pub async fn reconcile(&mut self) -> Result<(), ComposeError> {
        let essay = self.service.get_essay(&self.essay_id).await?;
        self.outline = normalize(&essay.outline);
        if let Some(topic) = essay.topic.filter(|t| !t.is_empty()) {
            self.topic = topic;
        }
        self.store.merge_all(essay.content);
        tracing::debug!("Essay {} reconciled", self.essay_id);
        Ok(())
    }

    pub fn essay_id(&self) -> &str {
        &self.essay_id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn outline(&self) -> &[OutlineEntry] {
        &self.outline
    }

    pub fn has_outline(&self) -> bool {
        !self.outline.is_empty()
    }

    pub fn content(&self) -> &ContentStore {
        &self.store
    }

    pub fn section_text(&self, header: &str) -> Option<String> {
        self.store.get(header)
    }

    /// Recomputed from the current store on every call.
    pub fn progress(&self) -> Progress {
        Progress::measure(&self.outline, &self.store.snapshot())
    }

    pub fn state(&self, header: &str) -> SectionState {
        self.coordinator.state(header)
    }

    pub fn generating(&self) -> BTreeSet<String> {
        self.coordinator.generating()
    }

    pub fn last_failure(&self, header: &str) -> Option<String> {
        self.coordinator.last_failure(header)
    }

    /// Outline headers that have no text yet.
    pub fn missing_headers(&self) -> Vec<String> {
        let snapshot = self.store.snapshot();
        self.outline
            .iter()
            .filter(|entry| snapshot.get(&entry.header).map_or(true, String::is_empty))
            .map(|entry| entry.header.clone())
            .collect()
    }

    fn check_header(&self, header: &str) -> Result<(), ComposeError> {
        if contains_header(&self.outline, header) {
            Ok(())
        } else {
            Err(ComposeError::UnknownHeader(header.to_string()))
        }
    }

    /// Generate one section and merge it into the store.
    pub async fn generate_section(&self, header: &str) -> Result<String, ComposeError> {
        self.check_header(header)?;
        self.coordinator
            .generate(&self.essay_id, header, &self.document_id)
            .await
    }

    /// Generate one section on a background task.
    pub fn spawn_section(
        &self,
        header: &str,
    ) -> Result<JoinHandle<Result<String, ComposeError>>, ComposeError> {
        self.check_header(header)?;
        Ok(self
            .coordinator
            .spawn_generate(&self.essay_id, header, &self.document_id))
    }

    /// Generate several sections concurrently.
    ///
    /// Every header gets its own request; one failing does not affect the
    /// others. Results come back in the order of `headers`.
    pub async fn generate_sections(
        &self,
        headers: &[String],
    ) -> Vec<(String, Result<String, ComposeError>)> {
        let requests = headers.iter().map(|header| async move {
            (header.clone(), self.generate_section(header).await)
        });
        join_all(requests).await
    }

    /// Generate every section that has no text yet.
    pub async fn generate_missing(&self) -> Vec<(String, Result<String, ComposeError>)> {
        let missing = self.missing_headers();
        self.generate_sections(&missing).await
    }

    /// The essay as one markdown document.
    pub fn assemble(&self) -> String {
        assemble(&self.outline, &self.store.snapshot())
    }

    /// Put the assembled essay on the clipboard. With no outline that is the
    /// empty string, matching what [`Self::download`] writes.
    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> Result<(), ComposeError> {
        export::copy(&self.assemble(), clipboard)
    }

    pub fn download(&self) -> ExportArtifact {
        export::download(&self.topic, &self.assemble())
    }
}
