//! `sl-station`: session coordinator for one security hub.
//!
//! A [`Station`] keeps a single encrypted session to its hub alive, merges
//! the parameters the hub reports, fans camera-info dumps out to attached
//! devices, and turns high-level intents ("arm the hub", "start a live
//! stream on this camera") into the wire command the hub's model and
//! firmware expect.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  intents   ┌───────────────┐  WireCommand  ┌──────────────────┐
//! │  your code   │──────────▶│    Station    │─────────────▶│ TransportSession │
//! │              │◀──────────│               │◀─────────────│   (P2P link)     │
//! └──────────────┘  events    │ CommandRouter │ TransportEvent└──────────────────┘
//!                             │ParameterStore │
//!                             │ReconnectSched.│──▶ CredentialCache ──▶ cloud
//!                             └───────────────┘
//! ```
//!
//! # Connection flow
//!
//! 1. Refresh the session key from the cloud if missing or expired
//! 2. Ask the [`TransportFactory`] for a session and run its handshake
//! 3. Pump the session's events; stale sessions' events are dropped
//! 4. On disconnect: reconnect after a stepped back-off delay
//! 5. `close()` cancels any pending reconnect

pub mod builder;
pub mod events;
pub mod params;
pub mod reconnect;
pub mod router;
pub mod station;
pub mod transport;
pub mod types;

// ── Re-exports for ergonomic imports ─────────────────────────────────

pub use builder::StationBuilder;
pub use events::{EventBus, EventKind, StationEvent, SubscriptionId};
pub use params::ParameterStore;
pub use reconnect::ReconnectScheduler;
pub use router::{CommandRouter, Intent, Rejection, RouteContext, RoutingThresholds, WatermarkSetting};
pub use station::Station;
pub use transport::{
    EventSink, KeyMaterial, SessionParams, TransportError, TransportFactory, TransportSession,
};
pub use types::{ConnectionState, IntentError, StationError};

// Re-export protocol types so callers rarely need sl-protocol directly.
pub use sl_protocol::{TransportEvent, WireCommand};
