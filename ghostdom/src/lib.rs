//! Headless tree-mutation engine: a rendering backend that mirrors a
//! component framework's output as an in-memory document tree.
//!
//! ghostdom provides:
//! - **Node model**: arena-based `Element`/`Text` tree with stable `NodeId`
//!   handles and insertion-ordered attribute/property maps
//! - **Mutation engine**: the [`Renderer`] command surface - every supported
//!   operation mutates the tree synchronously, every unsupported capability
//!   fails loudly with a typed error
//! - **Snapshots**: deterministic structured (JSON) and textual dumps of the
//!   current tree
//!
//! # Example
//!
//! ```rust
//! use ghostdom::{HeadlessRenderer, Renderer, snapshot};
//!
//! let mut renderer = HeadlessRenderer::new();
//! let div = renderer.create_element("div", None).unwrap();
//! renderer.append_child(renderer.root(), div).unwrap();
//! let text = renderer.create_text("hi").unwrap();
//! renderer.append_child(div, text).unwrap();
//! renderer.set_attribute(div, "id", "x", None).unwrap();
//!
//! let tree = snapshot::to_text(renderer.document());
//! assert_eq!(tree, "<root>\n  <div id=\"x\">\n    TEXT: \"hi\"\n  </div>\n</root>\n");
//!
//! // Capabilities outside the contract fail at the call site.
//! assert!(renderer.create_comment("nope").is_err());
//! ```

mod tracing_macros;

pub mod dom;
pub mod renderer;
pub mod snapshot;

pub(crate) use tracing_macros::debug;

// Re-export the node model types at the crate root for convenience
pub use dom::{Document, ElementData, NodeId, NodeKind, View, ViewId};

// Re-export the engine and its contract
pub use renderer::{EventCallback, HeadlessRenderer, RenderError, Renderer};

// Re-export snapshot entry points
pub use snapshot::{SnapshotElement, SnapshotNode, TreeDump};
