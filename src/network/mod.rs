//! Network Module
//!
//! Client connection and the transport underneath it.
//!
//! ## Architecture
//! - One reader thread per TCP transport, forwarding chunks over a channel
//! - `Connection` is the only consumer of that channel
//! - One request in flight per connection

mod connection;
mod transport;

pub use connection::{connect, Connection, ConnectionState};
pub use transport::{
    Connector, EventSink, TcpConnector, TcpTransport, Transport, TransportEvent,
};
