#[allow(clippy::module_inception)]
mod coordinator;
mod indicator;
mod session;
mod worker_slot;

pub(crate) use worker_slot::WorkerSlot;

pub use {
    coordinator::{Coordinator, CoordinatorHandle},
    indicator::IndicatorState,
    session::Session,
};
