//! Emitter trait for status events.

use std::sync::Arc;

use crate::events::StatusEvent;

/// Sink for [`StatusEvent`]s.
///
/// # Implementations
///
/// - [`StatusEventBus`](crate::events::StatusEventBus) fans events out to subscribers
/// - [`NoopEmitter`] discards everything
pub trait StatusEmitter: Send + Sync {
    /// Emit an event. Must not block.
    fn emit(&self, event: StatusEvent);
}

impl<T: StatusEmitter + ?Sized> StatusEmitter for Arc<T> {
    fn emit(&self, event: StatusEvent) {
        (**self).emit(event);
    }
}

/// Emitter for contexts with no listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    pub const fn new() -> Self {
        Self
    }
}

impl StatusEmitter for NoopEmitter {
    fn emit(&self, _event: StatusEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProcessKind;

    #[test]
    fn noop_emitter_accepts_events() {
        let emitter: Arc<dyn StatusEmitter> = Arc::new(NoopEmitter::new());
        emitter.emit(StatusEvent::stopped(ProcessKind::Relay, "Stopped"));
    }
}
