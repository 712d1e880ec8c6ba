//! Cancellable fan-out of rendered variants to the current consumer.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{unbounded, Receiver};

use crate::category::CategoryKind;
use crate::collab::RasterImage;

/// One page of one variant, ready for display.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub unit: usize,
    pub page: usize,
    pub category: CategoryKind,
    pub generation: usize,
    pub image: RasterImage,
}

type Slot = Box<dyn Fn(RenderedVariant) + Send + Sync>;
type Notify = Box<dyn Fn() + Send + Sync>;

/// Per-category callbacks guarded by a cancellation flag.
///
/// The flag is checked under a lock right before each callback, but the
/// callback itself runs outside the lock: a `cancel` racing a dispatch that
/// already passed the check does not stop that last delivery.
pub struct OutputSink {
    cancelled: Mutex<bool>,
    local: Slot,
    background: Slot,
    global: Slot,
    done: Option<Notify>,
}

impl OutputSink {
    pub fn new<L, B, G>(local: L, background: B, global: G) -> Self
    where
        L: Fn(RenderedVariant) + Send + Sync + 'static,
        B: Fn(RenderedVariant) + Send + Sync + 'static,
        G: Fn(RenderedVariant) + Send + Sync + 'static,
    {
        Self {
            cancelled: Mutex::new(false),
            local: Box::new(local),
            background: Box::new(background),
            global: Box::new(global),
            done: None,
        }
    }

    /// Call `done` once the scheduler has finished servicing a task
    /// addressed to this sink.
    pub fn on_complete<F>(mut self, done: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.done = Some(Box::new(done));
        self
    }

    /// A sink that forwards each category into its own channel.
    pub fn channels() -> (Self, SinkReceivers) {
        let (local_tx, local) = unbounded();
        let (background_tx, background) = unbounded();
        let (global_tx, global) = unbounded();
        let (done_tx, done) = unbounded();
        let sink = Self::new(
            move |v| {
                let _ = local_tx.send(v);
            },
            move |v| {
                let _ = background_tx.send(v);
            },
            move |v| {
                let _ = global_tx.send(v);
            },
        )
        .on_complete(move || {
            let _ = done_tx.send(());
        });
        (
            sink,
            SinkReceivers {
                local,
                background,
                global,
                done,
            },
        )
    }

    /// A sink that drops everything.
    pub fn discard() -> Self {
        Self::new(|_| {}, |_| {}, |_| {})
    }

    /// Stop future deliveries.
    pub fn cancel(&self) {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_local(&self, variant: RenderedVariant) {
        self.forward(&self.local, variant);
    }

    pub fn add_background(&self, variant: RenderedVariant) {
        self.forward(&self.background, variant);
    }

    pub fn add_global(&self, variant: RenderedVariant) {
        self.forward(&self.global, variant);
    }

    /// Route `variant` to the channel of its category.
    pub fn dispatch(&self, variant: RenderedVariant) {
        match variant.category {
            CategoryKind::Local => self.add_local(variant),
            CategoryKind::Background => self.add_background(variant),
            CategoryKind::Global => self.add_global(variant),
        }
    }

    /// Signal that every variant of the serviced task has been dispatched.
    /// Skipped once cancelled.
    pub fn complete(&self) {
        if self.is_cancelled() {
            return;
        }
        if let Some(done) = &self.done {
            done();
        }
    }

    fn forward(&self, slot: &Slot, variant: RenderedVariant) {
        if self.is_cancelled() {
            return;
        }
        slot(variant);
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Receiving ends of [`OutputSink::channels`].
#[derive(Debug)]
pub struct SinkReceivers {
    pub local: Receiver<RenderedVariant>,
    pub background: Receiver<RenderedVariant>,
    pub global: Receiver<RenderedVariant>,
    /// One message per serviced task, after its last delivery.
    pub done: Receiver<()>,
}

/// The sink of the latest navigation action.
///
/// Installing a new sink cancels the previous one, so results of an
/// abandoned navigation are suppressed.
#[derive(Debug, Default)]
pub struct ActiveSink {
    current: Mutex<Option<Arc<OutputSink>>>,
}

impl ActiveSink {
    pub fn install(&self, sink: OutputSink) -> Arc<OutputSink> {
        let sink = Arc::new(sink);
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&sink));
        if let Some(previous) = previous {
            previous.cancel();
        }
        sink
    }

    pub fn current(&self) -> Option<Arc<OutputSink>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the current sink without installing a new one.
    pub fn cancel(&self) {
        if let Some(sink) = self.current.lock().unwrap_or_else(PoisonError::into_inner).take() {
            sink.cancel();
        }
    }
}
