//! Remote markdown documents with an epoch-ordered load lifecycle.
//!
//! A [`RemoteDocument`] is mounted with a [`ContentRequest`] and a
//! [`Pipeline`]. It fetches the locator once, applies the optional
//! [`Transform`], parses the text, and exposes the result as a
//! [`LoadState`]:
//!
//! ```text
//! Pending ──fetch + parse ok──▶ Ready
//!    │
//!    └──fetch/transform/parse failed──▶ Failed
//! ```
//!
//! Changing the locator starts a new epoch. Results from older epochs and
//! results arriving after unmount are discarded.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mdpull_remote::{ContentRequest, HttpFetcher, Pipeline, RemoteDocument, Transform};
//! use mdpull_renderer::SyntectHighlighter;
//!
//! # async fn run() {
//! let pipeline = Pipeline::new(
//!     Arc::new(HttpFetcher::new()),
//!     Arc::new(SyntectHighlighter::new()),
//! );
//! let request = ContentRequest::new("https://example.com/README.md")
//!     .with_transform(Transform::strip_front_matter());
//!
//! let doc = RemoteDocument::mount(request, pipeline);
//! doc.settled().await;
//! println!("{}", doc.view().html());
//! # }
//! ```

mod document;
mod error;
mod fetcher;
mod pipeline;
mod request;
mod state;
mod transform;

pub use document::{RemoteDocument, Snapshot};
pub use error::{FETCH_FAILED, FetchError, LoadError, NETWORK_ERROR};
pub use fetcher::{DEFAULT_ACCEPT, Fetcher, HttpFetcher};
pub use pipeline::Pipeline;
pub use request::{ContentRequest, DEFAULT_PLACEHOLDER};
pub use state::{LoadState, View};
pub use transform::Transform;
