//! Server configuration.

use oinky_protocol::{PORT, TICK_DURATION};
use oinky_tick::TickConfig;
use oinky_transport::LinkConfig;

/// Everything the server needs to know before it starts.
///
/// Nothing here is negotiated with clients; both sides are built
/// against the same protocol constants.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: every interface, port [`PORT`].
    pub bind_addr: String,

    /// Tick cadence of the coordinator loop. Default: [`TICK_DURATION`].
    pub tick: TickConfig,

    /// Per-connection queue sizes and frame limit.
    pub link: LinkConfig,

    /// Accepted connections waiting for the coordinator to pick them up.
    /// The accept loop pauses while this is full.
    pub accept_backlog: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{PORT}"),
            tick: TickConfig::with_interval(TICK_DURATION),
            link: LinkConfig::default(),
            accept_backlog: 100,
        }
    }
}
