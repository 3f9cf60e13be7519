//! Annotation session
//!
//! One open document with its annotation set and the interaction state
//! machine:
//!
//! ```text
//! Idle --select--> Selecting --open_draft--> Drafting --commit--> Idle
//!   \                  |                        |
//!    `-----edit--------+-------> Editing -------+--commit/cancel--> Idle
//! ```
//!
//! The session is single-owner and driven one event at a time. Every change
//! to the annotation list replaces the whole list and is handed to the
//! persistence sink, which writes in the background.

use std::sync::Arc;

use crate::annotations::{Annotation, LocalStore, PersistSink, StorageKey};
use crate::engine::{
    check_overlap, compose, generate_feedback, map_selection, reconcile, reconcile_report,
    Composition, EngineError, ExportSettings, Reconciliation, RenderedDocument, RunId,
    Selection, TextRange,
};
use crate::engine::mapper::selection_for_range;
use crate::engine::reconcile::trim_whitespace;

/// A captured selection waiting for a comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    pub range: TextRange,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Selecting(PendingSelection),
    /// Comment entry open for a new annotation
    Drafting(PendingSelection),
    /// Comment entry open for an existing annotation
    Editing {
        id: String,
    },
}

/// What a state transition did to the annotation set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Added(String),
    Updated(String),
    Deleted(String),
    Cleared,
    /// The draft intersected an existing annotation and was discarded
    OverlapRejected { conflicting: String },
}

pub struct Session {
    markdown: String,
    share_code: Option<String>,
    key: StorageKey,
    document: RenderedDocument,
    annotations: Arc<[Annotation]>,
    state: SessionState,
    sink: Option<Arc<dyn PersistSink>>,
}

impl Session {
    /// Open a document with an existing annotation set.
    ///
    /// `markdown` is the source the storage key is derived from; `document`
    /// is its rendering.
    pub fn new(
        markdown: &str,
        document: RenderedDocument,
        share_code: Option<&str>,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            markdown: markdown.to_string(),
            share_code: share_code.map(|c| c.trim().to_uppercase()),
            key: StorageKey::for_document(markdown, share_code),
            document,
            annotations: annotations.into(),
            state: SessionState::Idle,
            sink: None,
        }
    }

    /// Open a document and load its annotations from the local store
    pub async fn open(
        store: &LocalStore<'_>,
        markdown: &str,
        document: RenderedDocument,
        share_code: Option<&str>,
    ) -> anyhow::Result<Self> {
        let key = StorageKey::for_document(markdown, share_code);
        let annotations = store.load_annotations(&key).await?;
        tracing::debug!("Opened {} with {} annotations", key, annotations.len());
        Ok(Self::new(markdown, document, share_code, annotations))
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn share_code(&self) -> Option<&str> {
        self.share_code.as_deref()
    }

    pub fn storage_key(&self) -> &StorageKey {
        &self.key
    }

    pub fn document(&self) -> &RenderedDocument {
        &self.document
    }

    pub fn annotations(&self) -> Arc<[Annotation]> {
        Arc::clone(&self.annotations)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Swap in a new rendering of the same source, e.g. after a layout
    /// change. Any selection in progress refers to the old runs and is
    /// dropped.
    pub fn replace_rendering(&mut self, document: RenderedDocument) {
        self.document = document;
        self.state = SessionState::Idle;
    }

    /// Capture a host selection. Collapsed, unmappable or whitespace-only
    /// selections return to idle. Ignored while a comment entry is open.
    pub fn select(&mut self, selection: &Selection) {
        if matches!(
            self.state,
            SessionState::Drafting(_) | SessionState::Editing { .. }
        ) {
            return;
        }

        let flat = self.document.flat();
        let captured = map_selection(&self.document, selection)
            .and_then(|range| trim_whitespace(flat, range));

        self.state = match captured {
            Some(range) => SessionState::Selecting(PendingSelection {
                range,
                text: flat.slice(range),
            }),
            None => {
                tracing::debug!(kind = EngineError::MappingFailed.kind(), "Selection discarded");
                SessionState::Idle
            }
        };
    }

    pub fn clear_selection(&mut self) {
        if matches!(self.state, SessionState::Selecting(_)) {
            self.state = SessionState::Idle;
        }
    }

    /// Open comment entry for the current selection
    pub fn open_draft(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            SessionState::Selecting(pending) => {
                self.state = SessionState::Drafting(pending);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Open comment entry for an existing annotation
    pub fn edit(&mut self, id: &str) -> bool {
        if matches!(
            self.state,
            SessionState::Drafting(_) | SessionState::Editing { .. }
        ) {
            return false;
        }
        if !self.annotations.iter().any(|a| a.id == id) {
            return false;
        }

        self.state = SessionState::Editing { id: id.to_string() };
        true
    }

    /// Route an interaction on the rendering (run + local offset) to the
    /// annotation under it
    pub fn activate(&mut self, run: RunId, offset: usize) -> Option<String> {
        let composition = self.render();
        let id = composition.annotations_at(run, offset).first()?.clone();
        self.edit(&id).then_some(id)
    }

    /// Selection covering the annotation being edited, so the host can
    /// reselect it
    pub fn editing_selection(&self) -> Option<Selection> {
        let SessionState::Editing { id } = &self.state else {
            return None;
        };
        let anchor = reconcile(&self.annotations, self.document.flat())
            .into_iter()
            .find(|anchor| &anchor.id == id)?;
        selection_for_range(&self.document, anchor.range())
    }

    /// Save the comment entry. An empty comment leaves the entry open.
    pub fn commit(&mut self, comment: &str) -> Option<SessionEvent> {
        let comment = comment.trim();
        if comment.is_empty() {
            return None;
        }

        match std::mem::take(&mut self.state) {
            SessionState::Drafting(pending) => {
                let anchors = reconcile(&self.annotations, self.document.flat());
                if let Err(err) = check_overlap(pending.range, &anchors) {
                    tracing::debug!(kind = err.kind(), "{}", err);
                    return match err {
                        EngineError::OverlapRejected { conflicting, .. } => {
                            Some(SessionEvent::OverlapRejected { conflicting })
                        }
                        _ => None,
                    };
                }

                let annotation = Annotation::new(&pending.text, comment, Some(pending.range));
                let id = annotation.id.clone();
                let mut next = self.annotations.to_vec();
                next.push(annotation);
                self.replace(next);
                Some(SessionEvent::Added(id))
            }
            SessionState::Editing { id } => {
                let next: Vec<Annotation> = self
                    .annotations
                    .iter()
                    .map(|a| {
                        if a.id == id {
                            a.with_comment(comment)
                        } else {
                            a.clone()
                        }
                    })
                    .collect();
                self.replace(next);
                Some(SessionEvent::Updated(id))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = SessionState::Idle;
    }

    pub fn delete(&mut self, id: &str) -> Option<SessionEvent> {
        if !self.annotations.iter().any(|a| a.id == id) {
            return None;
        }

        if matches!(&self.state, SessionState::Editing { id: editing } if editing == id) {
            self.state = SessionState::Idle;
        }

        let next = self
            .annotations
            .iter()
            .filter(|a| a.id != id)
            .cloned()
            .collect();
        self.replace(next);
        Some(SessionEvent::Deleted(id.to_string()))
    }

    pub fn clear_all(&mut self) -> SessionEvent {
        self.annotations = Arc::from(Vec::new());
        self.state = SessionState::Idle;
        if let Some(sink) = &self.sink {
            sink.remove(&self.key);
        }
        SessionEvent::Cleared
    }

    /// Highlights for the current state. The draft highlight is shown only
    /// while a new annotation's comment is being written.
    pub fn render(&self) -> Composition {
        let anchors = reconcile(&self.annotations, self.document.flat());
        let draft = match &self.state {
            SessionState::Drafting(pending) => Some(pending.range),
            _ => None,
        };
        compose(&self.document, &anchors, draft)
    }

    /// Anchors plus the annotations that cannot be placed in this rendering
    pub fn reconciliation(&self) -> Reconciliation {
        reconcile_report(&self.annotations, self.document.flat())
    }

    pub fn export(&self, settings: &ExportSettings) -> String {
        generate_feedback(&self.annotations, self.document.flat(), settings)
    }

    fn replace(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations.into();
        if let Some(sink) = &self.sink {
            sink.persist(&self.key, Arc::clone(&self.annotations));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::engine::{BoundaryPoint, SegmentStyle};

    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<(String, usize)>>,
        removed: Mutex<Vec<String>>,
    }

    impl PersistSink for RecordingSink {
        fn persist(&self, key: &StorageKey, annotations: Arc<[Annotation]>) {
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), annotations.len()));
        }

        fn remove(&self, key: &StorageKey) {
            self.removed.lock().unwrap().push(key.to_string());
        }
    }

    const TEXT: &str = "Hello world.\nGoodbye.";

    fn session() -> Session {
        Session::new(TEXT, RenderedDocument::from_text(TEXT), None, Vec::new())
    }

    fn selection(run: u32, from: usize, to: usize) -> Selection {
        Selection::new(
            BoundaryPoint::new(RunId(run), from),
            BoundaryPoint::new(RunId(run), to),
        )
    }

    fn add(session: &mut Session, sel: Selection, comment: &str) -> Option<SessionEvent> {
        session.select(&sel);
        session.open_draft();
        session.commit(comment)
    }

    #[test]
    fn test_end_to_end_feedback() {
        let mut session = session();

        let event = add(&mut session, selection(0, 6, 11), "greeting");
        assert!(matches!(event, Some(SessionEvent::Added(_))));
        assert_eq!(session.state(), &SessionState::Idle);

        let feedback = session.export(&ExportSettings {
            header: "## Feedback".to_string(),
            include_line_numbers: true,
        });
        assert!(feedback.starts_with("## Feedback\n\n### 1. Line 1\n\n> world\n\ngreeting\n"));
    }

    #[test]
    fn test_selection_is_trimmed_and_reversed() {
        let mut session = session();

        // Backwards drag over " world" including the leading space
        session.select(&Selection::new(
            BoundaryPoint::new(RunId(0), 11),
            BoundaryPoint::new(RunId(0), 5),
        ));

        assert_eq!(
            session.state(),
            &SessionState::Selecting(PendingSelection {
                range: TextRange::new(6, 11),
                text: "world".to_string(),
            })
        );
    }

    #[test]
    fn test_collapsed_or_blank_selection_is_idle() {
        let mut session = session();

        session.select(&selection(0, 3, 3));
        assert_eq!(session.state(), &SessionState::Idle);

        // Only the space between "Hello" and "world."
        session.select(&selection(0, 5, 6));
        assert_eq!(session.state(), &SessionState::Idle);

        session.select(&selection(7, 0, 1));
        assert_eq!(session.state(), &SessionState::Idle);
    }

    #[test]
    fn test_overlap_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = session().with_sink(sink.clone());

        let Some(SessionEvent::Added(first)) = add(&mut session, selection(0, 0, 5), "first")
        else {
            panic!("first annotation should be added");
        };

        let event = add(&mut session, selection(0, 3, 11), "second");
        assert_eq!(event, Some(SessionEvent::OverlapRejected { conflicting: first }));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(sink.writes.lock().unwrap().len(), 1);

        // Adjacent is fine
        let event = add(&mut session, selection(0, 6, 11), "third");
        assert!(matches!(event, Some(SessionEvent::Added(_))));
    }

    #[test]
    fn test_draft_highlight_only_while_drafting() {
        let mut session = session();

        session.select(&selection(1, 0, 7));
        assert!(session.render().highlighted().next().is_none());

        session.open_draft();
        let composition = session.render();
        let drafted: Vec<_> = composition.highlighted().collect();
        assert_eq!(drafted.len(), 1);
        assert_eq!(drafted[0].style(), SegmentStyle::Draft);
        assert_eq!(drafted[0].text, "Goodbye");

        session.cancel();
        assert!(session.render().highlighted().next().is_none());
    }

    #[test]
    fn test_empty_comment_keeps_draft_open() {
        let mut session = session();
        session.select(&selection(0, 0, 5));
        session.open_draft();

        assert_eq!(session.commit("   "), None);
        assert!(matches!(session.state(), SessionState::Drafting(_)));
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_edit_via_activation() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = session().with_sink(sink.clone());
        add(&mut session, selection(1, 0, 7), "bye");

        // Plain text activates nothing
        assert_eq!(session.activate(RunId(0), 2), None);

        let id = session.activate(RunId(1), 3).unwrap();
        assert_eq!(session.state(), &SessionState::Editing { id: id.clone() });
        assert_eq!(session.editing_selection(), Some(selection(1, 0, 7)));

        assert_eq!(
            session.commit("  farewell "),
            Some(SessionEvent::Updated(id.clone()))
        );
        let annotations = session.annotations();
        assert_eq!(annotations[0].comment, "farewell");
        assert_eq!(annotations[0].selected_text, "Goodbye");
        assert_eq!(sink.writes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_and_clear() {
        let sink = Arc::new(RecordingSink::default());
        let mut session = session().with_sink(sink.clone());
        let Some(SessionEvent::Added(id)) = add(&mut session, selection(0, 0, 5), "a") else {
            panic!("annotation should be added");
        };
        add(&mut session, selection(1, 0, 7), "b");

        assert!(session.edit(&id));
        assert_eq!(session.delete(&id), Some(SessionEvent::Deleted(id.clone())));
        assert_eq!(session.state(), &SessionState::Idle);
        assert_eq!(session.delete(&id), None);
        assert_eq!(session.annotations().len(), 1);

        assert_eq!(session.clear_all(), SessionEvent::Cleared);
        assert!(session.annotations().is_empty());
        assert_eq!(
            sink.removed.lock().unwrap().as_slice(),
            &[session.storage_key().to_string()]
        );
    }

    #[test]
    fn test_orphans_are_reported_not_dropped() {
        let mut lost = Annotation::new("not in this text", "gone", None);
        lost.id = "lost".to_string();
        let session = Session::new(
            TEXT,
            RenderedDocument::from_text(TEXT),
            Some("x7km3p"),
            vec![lost],
        );

        assert_eq!(session.storage_key().as_str(), "annotations_share_X7KM3P");
        let report = session.reconciliation();
        assert!(report.anchors.is_empty());
        assert_eq!(report.orphaned, vec!["lost".to_string()]);
        assert_eq!(session.annotations().len(), 1);
    }

    #[tokio::test]
    async fn test_open_loads_stored_annotations() {
        let pool = crate::db::memory_pool().await.unwrap();
        let store = LocalStore::new(&pool);
        let key = StorageKey::for_content(TEXT);
        let stored = Annotation::new("world", "saved", Some(TextRange::new(6, 11)));
        store.save_annotations(&key, &[stored.clone()]).await.unwrap();

        let session = Session::open(&store, TEXT, RenderedDocument::from_text(TEXT), None)
            .await
            .unwrap();

        let annotations = session.annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].id, stored.id);
        assert_eq!(annotations[0].range, stored.range);
        assert_eq!(session.render().highlighted().count(), 1);
    }
}
