use crate::{CoreResult, capture::WorkerContext};

use tracing::debug;

/// Holds at most one capture worker context.
///
/// Both transitions are idempotent: `ensure` reuses a live context and
/// `teardown` on an empty slot does nothing.
#[derive(Default)]
pub(crate) struct WorkerSlot {
    context: Option<WorkerContext>,
}

impl WorkerSlot {
    /// Return the existing context, creating it with `spawn` if absent.
    pub(crate) fn ensure(
        &mut self,
        spawn: impl FnOnce() -> CoreResult<WorkerContext>,
    ) -> CoreResult<&WorkerContext> {
        let context = match self.context.take() {
            Some(context) => {
                debug!("Reusing capture worker context");
                context
            }
            None => spawn()?,
        };

        Ok(self.context.insert(context))
    }

    pub(crate) fn get(&self) -> Option<&WorkerContext> {
        self.context.as_ref()
    }

    /// Destroy the context if present.
    pub(crate) async fn teardown(&mut self) {
        match self.context.take() {
            Some(context) => context.shutdown().await,
            None => debug!("No capture worker context to tear down"),
        }
    }
}
