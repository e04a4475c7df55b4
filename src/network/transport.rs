//! Transport
//!
//! The byte-stream seam underneath a `Connection`.
//!
//! A `Connector` opens a `Transport` and registers a sink for its events.
//! The transport reports the completed handshake with `Connected`, then
//! delivers every inbound read as a discrete `Data` chunk, and finally
//! `Closed` or `Failed` when the stream ends.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam::channel::Sender;

/// Size of a single socket read
const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Events a transport delivers to its sink
#[derive(Debug)]
pub enum TransportEvent {
    /// Handshake finished, the stream is usable
    Connected,

    /// One inbound chunk, exactly as read
    Data(Bytes),

    /// Peer closed the stream
    Closed,

    /// Reading failed
    Failed(io::Error),
}

/// Where a transport pushes its events
pub type EventSink = Sender<TransportEvent>;

/// Write half of an open duplex stream
pub trait Transport: Send {
    /// Write all bytes of one frame
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Close the stream; must be idempotent
    fn close(&mut self);
}

/// Opens transports
pub trait Connector {
    type Transport: Transport;

    /// Open a stream to `host:port`, giving up after `timeout`
    ///
    /// Running out of time is reported as `io::ErrorKind::TimedOut`.
    fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
        sink: EventSink,
    ) -> io::Result<Self::Transport>;
}

// =============================================================================
// TCP
// =============================================================================

/// Connector for plain TCP streams
///
/// Resolving `host` blocks in the system resolver and cannot be cut short;
/// its time counts against `timeout`, which then bounds each TCP attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = TcpTransport;

    fn open(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
        sink: EventSink,
    ) -> io::Result<TcpTransport> {
        let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "connect timeout out of range")
        })?;
        let stream = connect_any((host, port).to_socket_addrs()?, deadline)?;
        TcpTransport::start(stream, sink)
    }
}

/// Try each resolved address until one connects before `deadline`
fn connect_any(
    addrs: impl Iterator<Item = SocketAddr>,
    deadline: Instant,
) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "connect deadline passed",
            ));
        }

        match TcpStream::connect_timeout(&addr, remaining) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "host resolved to no addresses")
    }))
}

/// A TCP stream with a reader thread feeding the event sink
pub struct TcpTransport {
    /// Write side of the stream
    stream: TcpStream,

    /// Peer address for logging
    peer_addr: String,

    /// Reader thread, taken on close
    reader: Option<JoinHandle<()>>,

    closed: bool,
}

impl TcpTransport {
    /// Start the reader thread on a connected stream
    pub fn start(stream: TcpStream, sink: EventSink) -> io::Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let reader = thread::Builder::new()
            .name(format!("skyclient-reader-{}", peer_addr))
            .spawn(move || read_loop(read_stream, sink))?;

        Ok(Self {
            stream,
            peer_addr,
            reader: Some(reader),
            closed: false,
        })
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)?;
        self.stream.flush()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        // Unblocks the reader thread's pending read
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                tracing::debug!("Shutdown of {} failed: {}", self.peer_addr, e);
            }
        }

        if let Some(reader) = self.reader.take() {
            if reader.join().is_err() {
                tracing::warn!("Reader thread for {} panicked", self.peer_addr);
            }
        }

        tracing::debug!("Transport to {} closed", self.peer_addr);
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Forward every read to the sink until the stream ends or the sink is gone
fn read_loop(mut stream: TcpStream, sink: EventSink) {
    if sink.send(TransportEvent::Connected).is_err() {
        return;
    }

    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => {
                let _ = sink.send(TransportEvent::Closed);
                return;
            }
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if sink.send(TransportEvent::Data(chunk)).is_err() {
                    return;
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = sink.send(TransportEvent::Failed(e));
                return;
            }
        }
    }
}
