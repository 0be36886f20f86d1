//! Player sessions for the Oinky party server.
//!
//! A [`Player`] is what the server knows about one live connection: a
//! random identity, a display name, the [`Link`](oinky_transport::Link)
//! to send through, and the inbound queue the read loop fills.
//!
//! The [`PlayerRegistry`] owns every `Player`. It is a plain map owned by
//! the coordinator, not shared state.
//!
//! ```text
//! Coordinator (above)   ← drains inbound queues, routes packets
//!     ↕
//! Session Layer (this crate)   ← who is connected, under what name
//!     ↕
//! Transport (below)   ← Link, ConnectionId
//! ```

mod error;
mod player;
mod registry;

pub use error::SessionError;
pub use player::Player;
pub use registry::{DEFAULT_NAMES, PlayerRegistry};
