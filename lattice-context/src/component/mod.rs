//! Component Records
//!
//! The parts of a mounted component that the context system touches: a
//! stable identity, the teardown that runs when it leaves the tree, and the
//! queue it is handed to when it needs to render again.

mod id;
mod lifecycle;
mod queue;

pub use id::ComponentId;
pub use lifecycle::Component;
pub use queue::{DirtyQueue, RenderQueue};
