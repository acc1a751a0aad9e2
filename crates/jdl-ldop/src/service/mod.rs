//! Workflows that drive JD calls and map their results onto entities.

pub mod pickup_order;
pub mod trace;

pub use pickup_order::{PickupOrderWorkflow, DEFAULT_CANCEL_REASON};
pub use trace::{map_trace_event, MappedTrace, TraceReconciler, TraceSync};
