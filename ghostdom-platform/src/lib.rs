//! Lifecycle and snapshot coordination for ghostdom.
//!
//! This crate is the glue between a host UI framework and the headless
//! rendering backend. It provides:
//! - [`HeadlessRendererFactory`] - the renderer-factory capability: every
//!   request for "a renderer for host element X" resolves to the one shared
//!   engine instance (X is ignored)
//! - [`StabilityEvents`] - the host's "application stable" notification
//!   stream at its boundary
//! - [`Platform`] - subscribes to stabilization exactly once at bootstrap
//!   and flushes a snapshot of the current tree to a diagnostic sink on
//!   every stabilization event
//!
//! Because all renderer requests share one engine, multiple concurrently
//! hosted component trees are not isolated from one another. That is a
//! documented limitation of this backend, not a bug.
//!
//! Sink-agnostic: snapshots are written to any `io::Write`, stderr by
//! default. Nothing is returned or stored; the coordinator keeps no history
//! of prior snapshots.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use ghostdom::{HeadlessRenderer, NodeId, snapshot};
use serde_json::Value;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::debug;

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

/// Shared handle to the process's single mutation engine.
///
/// `Rc<RefCell<_>>` encodes the concurrency model: strictly single-threaded,
/// cooperative, one command at a time.
pub type SharedRenderer = Rc<RefCell<HeadlessRenderer>>;

/// Group label the original platform brackets its console output with.
pub const DEFAULT_GROUP_LABEL: &str = "--";

/// Errors surfaced by platform lifecycle management.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// [`Platform::bootstrap`] was called on an already-bootstrapped
    /// platform. The stabilization subscription happens exactly once per
    /// run.
    #[error("platform has already been bootstrapped")]
    AlreadyBootstrapped,
}

/// The renderer-factory capability.
///
/// Holds the single engine instance created at construction and hands out
/// shared handles to it. An explicit context object - callers that want
/// process-wide singleton behavior construct one factory and pass it around;
/// there is no hidden global state.
#[derive(Debug)]
pub struct HeadlessRendererFactory {
    default_renderer: SharedRenderer,
}

impl HeadlessRendererFactory {
    /// Create the factory and its single engine instance.
    pub fn new() -> Self {
        Self {
            default_renderer: Rc::new(RefCell::new(HeadlessRenderer::new())),
        }
    }

    /// Resolve a renderer request for any host element. The host element is
    /// ignored: every request gets the same shared engine.
    pub fn create_renderer(&self, _host_element: Option<NodeId>) -> SharedRenderer {
        Rc::clone(&self.default_renderer)
    }

    /// The shared engine instance itself.
    pub fn default_renderer(&self) -> SharedRenderer {
        Rc::clone(&self.default_renderer)
    }
}

impl Default for HeadlessRendererFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// The host's "application stable" notification stream at its boundary.
///
/// The host emits after a batch of synchronous mutations has settled; no
/// mutation command is issued while subscribers run.
#[derive(Default)]
pub struct StabilityEvents {
    subscribers: Vec<Box<dyn FnMut()>>,
}

impl StabilityEvents {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every future stabilization event. There is
    /// no unsubscription; subscribers live as long as the stream.
    pub fn subscribe(&mut self, callback: impl FnMut() + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    /// Deliver a stabilization event to every subscriber in subscription
    /// order.
    pub fn emit(&mut self) {
        for subscriber in &mut self.subscribers {
            subscriber();
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for StabilityEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StabilityEvents")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Owns the renderer factory and flushes snapshots on stabilization.
pub struct Platform {
    factory: HeadlessRendererFactory,
    sink: Rc<RefCell<dyn Write>>,
    group_label: String,
    bootstrapped: bool,
}

impl Platform {
    /// Platform writing snapshots to stderr.
    pub fn new() -> Self {
        Self::with_sink(Rc::new(RefCell::new(io::stderr())))
    }

    /// Platform writing snapshots to the given sink.
    pub fn with_sink(sink: Rc<RefCell<dyn Write>>) -> Self {
        Self {
            factory: HeadlessRendererFactory::new(),
            sink,
            group_label: DEFAULT_GROUP_LABEL.to_owned(),
            bootstrapped: false,
        }
    }

    /// Override the group marker label snapshots are bracketed with.
    pub fn group_label(mut self, label: impl Into<String>) -> Self {
        self.group_label = label.into();
        self
    }

    /// The renderer factory all host renderer requests go through.
    pub fn factory(&self) -> &HeadlessRendererFactory {
        &self.factory
    }

    /// Subscribe the snapshot pass to the host's stabilization stream.
    ///
    /// Happens exactly once per run; a second call is an error, mirroring
    /// the host-module guard of the original platform.
    pub fn bootstrap(&mut self, events: &mut StabilityEvents) -> Result<(), PlatformError> {
        if self.bootstrapped {
            return Err(PlatformError::AlreadyBootstrapped);
        }

        let renderer = self.factory.default_renderer();
        let sink = Rc::clone(&self.sink);
        let label = self.group_label.clone();
        events.subscribe(move || {
            let renderer = renderer.borrow();
            let mut sink = sink.borrow_mut();
            if let Err(_e) = flush_snapshot(&mut *sink, &renderer, &label) {
                debug!(error = %_e, "snapshot flush failed");
            }
        });

        self.bootstrapped = true;
        debug!("platform bootstrapped, snapshot pass subscribed");
        Ok(())
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("factory", &self.factory)
            .field("group_label", &self.group_label)
            .field("bootstrapped", &self.bootstrapped)
            .finish_non_exhaustive()
    }
}

/// Write one snapshot of the renderer's current tree: the structured JSON
/// dump, then the textual serialization, bracketed by the group marker.
///
/// Output is deterministic - the same tree produces the same bytes.
pub fn flush_snapshot(
    out: &mut dyn Write,
    renderer: &HeadlessRenderer,
    group_label: &str,
) -> io::Result<()> {
    writeln!(out, "=== {group_label} ===")?;
    writeln!(out, "{}", snapshot::to_json_pretty(renderer.document()))?;
    write!(out, "{}", snapshot::to_text(renderer.document()))?;
    writeln!(out, "=== end {group_label} ===")?;
    Ok(())
}

/// Host-facing value sanitization.
///
/// A string value passes through unchanged; any other value is rendered as
/// its JSON text. A value that cannot be serialized yields `None`.
pub fn sanitize(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        other => serde_json::to_string(other).ok(),
    }
}
