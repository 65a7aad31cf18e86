//! Load lifecycle for one mounted remote document.
//!
//! Each locator value while mounted is one epoch. Every epoch runs a single
//! load task; its result is applied only if the epoch is still current and
//! the document is still mounted. Results from superseded epochs complete
//! over the wire and are then discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::error::LoadError;
use crate::pipeline::Pipeline;
use crate::request::ContentRequest;
use crate::state::{LoadState, View};

/// Observable state of a [`RemoteDocument`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Current epoch, starting at 1 on mount.
    pub epoch: u64,
    /// False once the document has been unmounted.
    pub mounted: bool,
    pub state: LoadState,
}

/// A mounted remote document and its load state.
///
/// Instances are independent: each owns its own state and shares nothing
/// with other instances except the [`Pipeline`] collaborators.
///
/// Dropping the document unmounts it.
pub struct RemoteDocument {
    request: ContentRequest,
    pipeline: Pipeline,
    runtime: Handle,
    tx: Arc<watch::Sender<Snapshot>>,
    finished: Arc<AtomicU64>,
}

impl RemoteDocument {
    /// Mount a document and start loading `request.locator`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn mount(request: ContentRequest, pipeline: Pipeline) -> Self {
        Self::mount_on(&Handle::current(), request, pipeline)
    }

    /// Mount a document whose load tasks run on `runtime`.
    ///
    /// If `runtime` shuts down before a load finishes, that epoch settles as
    /// `Failed` with the [`LoadError::Aborted`] reason.
    #[must_use]
    pub fn mount_on(runtime: &Handle, request: ContentRequest, pipeline: Pipeline) -> Self {
        let (tx, _) = watch::channel(Snapshot {
            epoch: 1,
            mounted: true,
            state: LoadState::Pending,
        });
        let document = Self {
            request,
            pipeline,
            runtime: runtime.clone(),
            tx: Arc::new(tx),
            finished: Arc::new(AtomicU64::new(0)),
        };
        document.start_epoch(1);
        document
    }

    /// Current request.
    #[must_use]
    pub fn request(&self) -> &ContentRequest {
        &self.request
    }

    /// Replace the request.
    ///
    /// A new epoch starts only when the locator changes. Transform and
    /// placeholder changes apply to the next epoch and to presentation.
    pub fn set_request(&mut self, request: ContentRequest) {
        let restart = request.locator != self.request.locator;
        self.request = request;
        if restart {
            self.restart();
        }
    }

    /// Point the document at a new locator.
    pub fn set_locator(&mut self, locator: impl Into<String>) {
        let locator = locator.into();
        if locator == self.request.locator {
            return;
        }
        self.request.locator = locator;
        self.restart();
    }

    /// Current load state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.tx.borrow().state.clone()
    }

    /// Current epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.tx.borrow().epoch
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.tx.borrow().mounted
    }

    /// Number of load tasks that have finished, including discarded ones.
    #[must_use]
    pub fn finished_loads(&self) -> u64 {
        self.finished.load(Ordering::Acquire)
    }

    /// Receiver notified on every applied state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Wait until the current epoch leaves `Pending` or the document is
    /// unmounted, and return the state at that point.
    pub async fn settled(&self) -> LoadState {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|snap| !snap.mounted || !snap.state.is_pending()).await {
            Ok(snap) => snap.state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Presentation for the current state.
    ///
    /// Rendering is all-or-nothing: content appears only once the whole
    /// document has loaded and parsed.
    #[must_use]
    pub fn view(&self) -> View {
        match self.state() {
            LoadState::Pending => View::Placeholder(self.request.placeholder.clone()),
            LoadState::Failed { reason } => View::Error(reason),
            LoadState::Ready { document } => {
                View::Content(self.pipeline.render(&self.request.locator, &document))
            }
        }
    }

    /// Stop applying results. Idempotent.
    pub fn unmount(&self) {
        self.tx.send_if_modified(|snap| {
            if !snap.mounted {
                return false;
            }
            snap.mounted = false;
            true
        });
    }

    fn restart(&mut self) {
        let mut next = None;
        self.tx.send_if_modified(|snap| {
            if !snap.mounted {
                return false;
            }
            snap.epoch += 1;
            snap.state = LoadState::Pending;
            next = Some(snap.epoch);
            true
        });

        match next {
            Some(epoch) => self.start_epoch(epoch),
            None => tracing::debug!(
                locator = %self.request.locator,
                "Ignoring locator change on unmounted document"
            ),
        }
    }

    fn start_epoch(&self, epoch: u64) {
        let pipeline = self.pipeline.clone();
        let transform = self.request.transform.clone();
        let locator = self.request.locator.clone();
        let settler = EpochSettler {
            tx: Arc::clone(&self.tx),
            finished: Arc::clone(&self.finished),
            locator: locator.clone(),
            epoch,
            settled: false,
        };

        tracing::debug!(%locator, epoch, "Starting load");

        self.runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                pipeline.load(&locator, transform.as_ref())
            })
            .await
            .map_err(LoadError::from)
            .and_then(|loaded| loaded);

            let state = match result {
                Ok(nodes) => LoadState::Ready {
                    document: Arc::new(nodes),
                },
                Err(e) => {
                    tracing::debug!(
                        locator = %settler.locator,
                        epoch,
                        error = %e,
                        "Load failed"
                    );
                    LoadState::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            settler.settle(state);
        });
    }
}

/// Applies the outcome of one epoch's load task exactly once.
///
/// A task dropped before completion (runtime shut down, or spawned onto a
/// runtime that is already gone) settles as [`LoadError::Aborted`], so
/// `settled()` never waits on a task that will not run.
struct EpochSettler {
    tx: Arc<watch::Sender<Snapshot>>,
    finished: Arc<AtomicU64>,
    locator: String,
    epoch: u64,
    settled: bool,
}

impl EpochSettler {
    fn settle(mut self, state: LoadState) {
        self.apply(state);
    }

    fn apply(&mut self, state: LoadState) {
        self.settled = true;
        let epoch = self.epoch;
        let applied = self.tx.send_if_modified(|snap| {
            if !snap.mounted || snap.epoch != epoch {
                return false;
            }
            snap.state = state;
            true
        });
        if applied {
            tracing::debug!(locator = %self.locator, epoch, "Load settled");
        } else {
            tracing::debug!(locator = %self.locator, epoch, "Discarding stale load result");
        }
        self.finished.fetch_add(1, Ordering::AcqRel);
    }
}

impl Drop for EpochSettler {
    fn drop(&mut self) {
        if !self.settled {
            tracing::debug!(locator = %self.locator, epoch = self.epoch, "Load task dropped");
            self.apply(LoadState::Failed {
                reason: LoadError::Aborted.to_string(),
            });
        }
    }
}

impl Drop for RemoteDocument {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    use mdpull_renderer::{BlockKind, Node, PlainHighlighter};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::FetchError;
    use crate::fetcher::Fetcher;
    use crate::transform::Transform;

    type Reply = Result<String, FetchError>;

    /// Fetcher whose responses are released by the test, per locator.
    struct GatedFetcher {
        gates: Mutex<HashMap<String, mpsc::Receiver<Reply>>>,
    }

    impl GatedFetcher {
        fn new(locators: &[&str]) -> (Arc<Self>, HashMap<String, mpsc::Sender<Reply>>) {
            let mut gates = HashMap::new();
            let mut senders = HashMap::new();
            for locator in locators {
                let (tx, rx) = mpsc::channel();
                gates.insert((*locator).to_owned(), rx);
                senders.insert((*locator).to_owned(), tx);
            }
            let fetcher = Arc::new(Self {
                gates: Mutex::new(gates),
            });
            (fetcher, senders)
        }
    }

    impl Fetcher for GatedFetcher {
        fn fetch(&self, locator: &str) -> Result<String, FetchError> {
            let gate = self.gates.lock().unwrap().remove(locator).unwrap();
            gate.recv().unwrap()
        }
    }

    fn pipeline(fetcher: Arc<dyn Fetcher>) -> Pipeline {
        Pipeline::new(fetcher, Arc::new(PlainHighlighter))
    }

    fn body(text: &'static str) -> Arc<dyn Fetcher> {
        Arc::new(move |_: &str| -> Result<String, FetchError> { Ok(text.to_owned()) })
    }

    async fn wait_finished(doc: &RemoteDocument, count: u64) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while doc.finished_loads() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    fn heading_text(state: &LoadState) -> String {
        let nodes = state.document().unwrap();
        let Node::Block(block) = &nodes[0] else {
            panic!("expected block");
        };
        block
            .events
            .iter()
            .filter_map(|e| match e {
                pulldown_cmark::Event::Text(t) => Some(t.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_load_on_stopped_runtime_settles_as_aborted() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let doc = RemoteDocument::mount_on(
            &handle,
            ContentRequest::new("mem://a"),
            pipeline(body("# Hi")),
        );

        assert_eq!(doc.finished_loads(), 1);
        assert_eq!(doc.state().reason(), Some("load task aborted"));
    }

    #[test]
    fn test_runtime_shutdown_mid_load_settles_as_aborted() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let (fetcher, gates) = GatedFetcher::new(&["mem://a"]);
        let doc = RemoteDocument::mount_on(
            runtime.handle(),
            ContentRequest::new("mem://a"),
            pipeline(fetcher),
        );
        runtime.block_on(tokio::task::yield_now());
        assert!(doc.state().is_pending());

        runtime.shutdown_background();

        assert_eq!(doc.finished_loads(), 1);
        assert_eq!(doc.state().reason(), Some("load task aborted"));
        gates["mem://a"].send(Ok("late".to_owned())).unwrap();
    }

    #[tokio::test]
    async fn test_mount_starts_pending() {
        let (fetcher, gates) = GatedFetcher::new(&["mem://a"]);
        let doc = RemoteDocument::mount(
            ContentRequest::new("mem://a").with_placeholder("Fetching README"),
            pipeline(fetcher),
        );

        assert!(doc.state().is_pending());
        assert_eq!(doc.epoch(), 1);
        assert_eq!(
            doc.view().html(),
            r#"<div class="mdpull-placeholder">Fetching README</div>"#
        );

        gates["mem://a"].send(Ok("text".to_owned())).unwrap();
        assert!(doc.settled().await.is_ready());
    }

    #[tokio::test]
    async fn test_ready_scenario() {
        let doc = RemoteDocument::mount(
            ContentRequest::new("https://example.com/README.md"),
            pipeline(body("# Title\n\n```js\nconsole.log(1)\n```")),
        );

        let state = doc.settled().await;

        let nodes = state.document().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].kind(), BlockKind::Heading(1));
        let Node::Code(code) = &nodes[1] else {
            panic!("expected code node");
        };
        assert_eq!(code.language.as_deref(), Some("js"));
        assert_eq!(code.display_text(), "console.log(1)");

        let View::Content(rendered) = doc.view() else {
            panic!("expected content");
        };
        assert_eq!(rendered.len(), nodes.len());
        assert_eq!(
            rendered.nodes[1].html,
            r#"<pre><code class="language-js">console.log(1)</code></pre>"#
        );
    }

    #[tokio::test]
    async fn test_not_found_fails_without_content() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(|_: &str| -> Result<String, FetchError> {
            Err(FetchError::Status { status: 404 })
        });
        let doc = RemoteDocument::mount(ContentRequest::new("mem://missing"), pipeline(fetcher));

        let state = doc.settled().await;

        assert_eq!(state.reason(), Some("Failed to fetch"));
        let view = doc.view();
        assert!(!view.is_content());
        assert_eq!(
            view.html(),
            r#"<div class="mdpull-error" role="alert">Failed to fetch</div>"#
        );
    }

    #[tokio::test]
    async fn test_stale_epoch_result_is_discarded() {
        let (fetcher, gates) = GatedFetcher::new(&["mem://a", "mem://b"]);
        let mut doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(fetcher));

        doc.set_locator("mem://b");
        assert_eq!(doc.epoch(), 2);

        gates["mem://b"].send(Ok("# B".to_owned())).unwrap();
        let state = doc.settled().await;
        assert_eq!(heading_text(&state), "B");

        gates["mem://a"].send(Ok("# A".to_owned())).unwrap();
        wait_finished(&doc, 2).await;

        assert_eq!(doc.epoch(), 2);
        assert_eq!(heading_text(&doc.state()), "B");
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let (fetcher, gates) = GatedFetcher::new(&["mem://a", "mem://b"]);
        let mut doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(fetcher));
        doc.set_locator("mem://b");

        gates["mem://a"]
            .send(Err(FetchError::Status { status: 500 }))
            .unwrap();
        wait_finished(&doc, 1).await;
        assert!(doc.state().is_pending());

        gates["mem://b"].send(Ok("ok".to_owned())).unwrap();
        assert!(doc.settled().await.is_ready());
    }

    #[tokio::test]
    async fn test_same_locator_keeps_epoch() {
        let mut doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(body("x")));
        doc.settled().await;

        doc.set_locator("mem://a");
        doc.set_request(ContentRequest::new("mem://a").with_placeholder("Wait"));

        assert_eq!(doc.epoch(), 1);
        assert!(doc.state().is_ready());
        assert_eq!(doc.request().placeholder, "Wait");
    }

    #[tokio::test]
    async fn test_transform_applied_before_parse() {
        let doc = RemoteDocument::mount(
            ContentRequest::new("mem://a").with_transform(Transform::new(str::to_uppercase)),
            pipeline(body("# hello")),
        );

        let state = doc.settled().await;

        assert_eq!(heading_text(&state), "HELLO");
    }

    #[tokio::test]
    async fn test_transform_panic_fails() {
        let doc = RemoteDocument::mount(
            ContentRequest::new("mem://a").with_transform(Transform::new(|_| panic!("bad input"))),
            pipeline(body("text")),
        );

        let state = doc.settled().await;

        assert_eq!(
            state.reason(),
            Some("transform or parser panicked: bad input")
        );
    }

    #[tokio::test]
    async fn test_unmount_prevents_late_update() {
        let (fetcher, gates) = GatedFetcher::new(&["mem://a"]);
        let doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(fetcher));
        let rx = doc.subscribe();

        doc.unmount();
        doc.unmount();
        gates["mem://a"].send(Ok("late".to_owned())).unwrap();
        wait_finished(&doc, 1).await;

        assert!(!doc.is_mounted());
        assert!(doc.state().is_pending());
        assert!(rx.borrow().state.is_pending());
        assert!(doc.settled().await.is_pending());
    }

    #[tokio::test]
    async fn test_unmounted_ignores_locator_change() {
        let mut doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(body("x")));
        doc.settled().await;
        doc.unmount();

        doc.set_locator("mem://b");

        assert_eq!(doc.epoch(), 1);
        assert!(doc.state().is_ready());
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let source =
            body("# Guide\n\nText with `code`.\n\n```bash\necho hi\n```\n\n- one\n- two\n");
        let first =
            RemoteDocument::mount(ContentRequest::new("mem://g"), pipeline(Arc::clone(&source)));
        let second = RemoteDocument::mount(ContentRequest::new("mem://g"), pipeline(source));
        first.settled().await;
        second.settled().await;

        let (View::Content(a), View::Content(b)) = (first.view(), second.view()) else {
            panic!("expected content");
        };
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
    }

    #[tokio::test]
    async fn test_subscribe_sees_transition() {
        let (fetcher, gates) = GatedFetcher::new(&["mem://a"]);
        let doc = RemoteDocument::mount(ContentRequest::new("mem://a"), pipeline(fetcher));
        let mut rx = doc.subscribe();

        gates["mem://a"].send(Ok("x".to_owned())).unwrap();
        rx.changed().await.unwrap();

        let snap = rx.borrow().clone();
        assert_eq!(snap.epoch, 1);
        assert!(snap.state.is_ready());
    }
}
