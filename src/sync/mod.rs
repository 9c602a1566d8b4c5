//! Thread-safe FIFO queues shared between the caller and the worker.
//!
//! | Queue | Consumer side | Used for |
//! |---|---|---|
//! | [`WaitQueue`] | blocks until an item arrives | inbound messages (caller → worker) |
//! | [`Queue`] | never blocks, drained until empty | outbound events (worker → bridge) |

pub mod queue;
pub mod wait_queue;

pub use queue::Queue;
pub use wait_queue::WaitQueue;
