//! Connection
//!
//! Owns one transport and runs strictly one request at a time over it.
//!
//! ## Lifecycle
//! ```text
//! Idle ──connect──▶ Connecting ──handshake──▶ Ready ──close──▶ Closed
//!                        │                      │
//!                        └──timeout/error──▶ Faulted ◀──corrupt/timeout
//! ```
//! Only `Ready` accepts requests. A failed connect never leaves a usable
//! half-initialised connection behind.

use std::io;
use std::time::Instant;

use bytes::Bytes;
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError};

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::protocol::{
    convert_groups, decode_response, encode_batch, Query, QueryResult, ResponseBuffer,
};
use super::transport::{Connector, TcpConnector, Transport, TransportEvent};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, `connect` not yet called
    Idle,

    /// Opening the transport or waiting for the handshake
    Connecting,

    /// Accepting requests
    Ready,

    /// Closed by the caller or the peer
    Closed,

    /// Connect failed or the response stream can no longer be trusted
    Faulted,
}

/// Open a connection over TCP
///
/// Fails with `ConnectTimeout` if the transport cannot be opened and
/// handshaken within `config.connect_timeout_ms`.
pub fn connect(config: Config) -> Result<Connection> {
    let mut connection = Connection::new(config);
    connection.connect()?;
    Ok(connection)
}

/// A client connection to the server
///
/// Every request method takes `&mut self`, so calls on one connection are
/// serialised by the borrow checker. Share across threads behind a lock.
pub struct Connection<C: Connector = TcpConnector> {
    /// Endpoint and timeouts
    config: Config,

    /// Opens the transport on `connect`
    connector: C,

    state: ConnectionState,

    /// Present only while `Ready`
    transport: Option<C::Transport>,

    /// Event stream of the transport, present only while `Ready`
    events: Option<Receiver<TransportEvent>>,

    /// Inbound bytes not yet returned as a response
    buffer: ResponseBuffer,
}

impl Connection<TcpConnector> {
    /// Create an idle TCP connection
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> Connection<C> {
    /// Create an idle connection using a custom connector
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config,
            connector,
            state: ConnectionState::Idle,
            transport: None,
            events: None,
            buffer: ResponseBuffer::new(),
        }
    }

    /// Open the transport and wait for its handshake
    ///
    /// The whole connect timeout covers both steps: the handshake only gets
    /// what is left after opening. On any failure the transport is closed
    /// and the connection ends up `Faulted`.
    pub fn connect(&mut self) -> Result<()> {
        if self.state != ConnectionState::Idle {
            return Err(ClientError::NotReady(self.state));
        }
        self.config.validate()?;

        self.state = ConnectionState::Connecting;
        tracing::debug!(
            "Connecting to {}:{} (timeout {} ms)",
            self.config.host,
            self.config.port,
            self.config.connect_timeout_ms
        );

        match self.establish() {
            Ok((transport, events)) => {
                self.transport = Some(transport);
                self.events = Some(events);
                self.state = ConnectionState::Ready;
                tracing::debug!("Connected to {}:{}", self.config.host, self.config.port);
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Faulted;
                tracing::warn!(
                    "Connect to {}:{} failed: {}",
                    self.config.host,
                    self.config.port,
                    e
                );
                Err(e)
            }
        }
    }

    fn establish(&self) -> Result<(C::Transport, Receiver<TransportEvent>)> {
        let timeout = self.config.connect_timeout();
        let (sink, events) = unbounded();

        let started = Instant::now();
        let mut transport = match self.connector.open(
            &self.config.host,
            self.config.port,
            timeout,
            sink,
        ) {
            Ok(transport) => transport,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(self.connect_timeout()),
            Err(e) => return Err(e.into()),
        };

        let remaining = timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            transport.close();
            return Err(self.connect_timeout());
        }

        let handshake = match events.recv_timeout(remaining) {
            Ok(TransportEvent::Connected) => Ok(()),
            Ok(TransportEvent::Data(chunk)) => Err(ClientError::corruption(format!(
                "{} bytes received before handshake",
                chunk.len()
            ))),
            Ok(TransportEvent::Closed) => Err(ClientError::ConnectionClosed),
            Ok(TransportEvent::Failed(e)) => Err(e.into()),
            Err(RecvTimeoutError::Timeout) => Err(self.connect_timeout()),
            Err(RecvTimeoutError::Disconnected) => Err(ClientError::ConnectionClosed),
        };

        match handshake {
            Ok(()) => Ok((transport, events)),
            Err(e) => {
                transport.close();
                Err(e)
            }
        }
    }

    fn connect_timeout(&self) -> ClientError {
        ClientError::ConnectTimeout {
            host: self.config.host.clone(),
            port: self.config.port,
            timeout_ms: self.config.connect_timeout_ms,
        }
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Write one frame and return the next complete response
    ///
    /// Chunks are accumulated until the response's declared lengths are
    /// satisfied; anything after it is kept for the next call. If the stream
    /// breaks, corrupts or times out the connection is shut down.
    pub fn execute(&mut self, frame: &[u8]) -> Result<Bytes> {
        let result = self.round_trip(frame);
        if let Err(ref e) = result {
            match e {
                ClientError::NotReady(_) => {}
                ClientError::ConnectionClosed => self.shut_down(ConnectionState::Closed),
                _ => {
                    tracing::warn!("Request failed, dropping connection: {}", e);
                    self.shut_down(ConnectionState::Faulted);
                }
            }
        }
        result
    }

    fn round_trip(&mut self, frame: &[u8]) -> Result<Bytes> {
        let (transport, events) = match (self.transport.as_mut(), self.events.as_ref()) {
            (Some(transport), Some(events)) if self.state == ConnectionState::Ready => {
                (transport, events)
            }
            _ => return Err(ClientError::NotReady(self.state)),
        };

        transport.write_all(frame)?;
        tracing::trace!("Wrote {} byte frame", frame.len());

        loop {
            if let Some(response) = self.buffer.next_response()? {
                tracing::trace!(
                    "Received {} byte response ({} bytes left over)",
                    response.len(),
                    self.buffer.len()
                );
                return Ok(response);
            }

            let event = match self.config.read_timeout() {
                Some(timeout) => events.recv_timeout(timeout).map_err(|e| match e {
                    RecvTimeoutError::Timeout => {
                        ClientError::ReadTimeout(self.config.read_timeout_ms)
                    }
                    RecvTimeoutError::Disconnected => ClientError::ConnectionClosed,
                })?,
                None => events.recv().map_err(|_| ClientError::ConnectionClosed)?,
            };

            match event {
                TransportEvent::Data(chunk) => self.buffer.push(&chunk),
                TransportEvent::Connected => {}
                TransportEvent::Closed => return Err(ClientError::ConnectionClosed),
                TransportEvent::Failed(e) => return Err(e.into()),
            }
        }
    }

    /// Run a batch of queries
    ///
    /// Returns `QueryResult::Single` when the whole response holds exactly
    /// one value, otherwise one vector of values per response group.
    pub fn query(&mut self, batch: &[Query]) -> Result<QueryResult> {
        let frame = encode_batch(batch);
        let response = self.execute(frame.as_bytes())?;
        let groups = decode_response(&response)?;

        if groups.len() != batch.len() {
            tracing::warn!(
                "Sent {} queries but received {} response groups",
                batch.len(),
                groups.len()
            );
        }

        let values = convert_groups(&groups)?;
        Ok(QueryResult::collapse(values))
    }

    /// `SET key value`
    pub fn set(&mut self, key: &str, value: &str) -> Result<QueryResult> {
        self.query(&[Query::set(key, value)])
    }

    /// `GET key`
    pub fn get(&mut self, key: &str) -> Result<QueryResult> {
        self.query(&[Query::get(key)])
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Close the connection; later requests fail with `NotReady`
    pub fn close(&mut self) {
        if self.state != ConnectionState::Closed {
            self.shut_down(ConnectionState::Closed);
            tracing::debug!(
                "Connection to {}:{} closed",
                self.config.host,
                self.config.port
            );
        }
    }

    fn shut_down(&mut self, state: ConnectionState) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.events = None;
        self.buffer.clear();
        self.state = state;
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl<C: Connector> Drop for Connection<C> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }
}
