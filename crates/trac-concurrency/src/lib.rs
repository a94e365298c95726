//! Minimal concurrency primitives shared by the streaming pipeline and the
//! data service: a fan-out `Hub` plus `fold`/`map`/`first` combinators for
//! building sink stages on top of it.

pub mod context;
pub mod hub;

pub use context::{BufferAllocator, ExecutionContext};
pub use hub::{first, fold, map, publish, publish_into, Hub};
