//! Request/reply correlation.
//!
//! # Architecture
//!
//! ```text
//! caller ──send_command──► Transport ──► service
//!    │                                     │
//!    └──hook(token, cb)──► PendingRegistry │
//!                              ▲           │
//! poller ──poll()──► ReassemblyBuffer ◄────┘
//!                        │
//!                        ├── matched token   → callback(payload)
//!                        └── unmatched frame → UiSink
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | [`Correlator`], poll step, [`PendingReply`] |
//! | `reassembly` | Partial-frame buffer |
//! | `registry` | Pending request map with deadlines |

// ============================================================================
// Submodules
// ============================================================================

/// Correlator and poll loop.
pub mod core;

/// Partial-frame reassembly.
pub mod reassembly;

/// Pending request registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{
    Correlator, CorrelatorSettings, DEFAULT_MAX_FRAME_LEN, DEFAULT_POLL_INTERVAL,
    DEFAULT_READ_CHUNK, DEFAULT_REPLY_TIMEOUT, PendingReply, PollOutcome,
};
pub use reassembly::ReassemblyBuffer;
pub use registry::{PendingRegistry, ReplyCallback};
