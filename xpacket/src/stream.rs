//! Connection stream with concurrent inbound and outbound pumps.
//!
//! A [`Stream`] owns one logical connection. The application pushes
//! packets with [`Stream::send`] and pulls them with [`Stream::recv`];
//! the pumps move them between the queues and the active transport.
//! The transport can be replaced at any time with
//! [`Stream::set_connection`] without losing queued packets, which is how
//! callers recover from a broken connection.
//!
//! I/O failures never surface as return values of the pumps. They are
//! handed to the callback installed with [`Stream::on_error`].
//!
//! # Example
//!
//! ```rust,no_run
//! use xpacket::{Packet, Stream};
//!
//! # async fn demo() -> xpacket::Result<()> {
//! let socket = tokio::net::TcpStream::connect("127.0.0.1:7878").await?;
//!
//! let stream = Stream::new(64);
//! stream.on_error(|err| eprintln!("{err}"));
//! stream.set_connection(socket);
//!
//! stream.send(Packet::new(1, b"ping".to_vec())).await?;
//! if let Some(reply) = stream.recv().await {
//!     println!("kind={} len={}", reply.kind(), reply.length());
//! }
//! stream.close().await
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::io::ReadHalf;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::channel::{Receiver, Sender};
use crate::config::StreamConfig;
use crate::core::Packet;
use crate::error::{Error, Result};
use crate::transport::{BoxTransport, Connection, ConnectionId, Transport};

/// An I/O failure together with the transport it happened on.
#[derive(Debug)]
pub struct IoError {
    /// Transport the failure happened on.
    pub connection: ConnectionId,
    /// The failure itself.
    pub error: Error,
}

impl IoError {
    /// Pairs `error` with the transport it came from.
    pub fn new(connection: ConnectionId, error: Error) -> Self {
        Self { connection, error }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.connection, self.error)
    }
}

type ErrorCallback = Arc<dyn Fn(IoError) + Send + Sync>;

pub(crate) type ActiveConnection = Option<Arc<Connection>>;

/// State shared between the stream handle and its pumps.
pub(crate) struct Shared {
    pub(crate) config: StreamConfig,
    pub(crate) connection: watch::Sender<ActiveConnection>,
    pub(crate) shutdown: CancellationToken,
    closed: AtomicBool,
    on_error: RwLock<ErrorCallback>,
}

impl Shared {
    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
        self.shutdown.cancel();
    }

    /// Hands `err` to the current callback.
    ///
    /// The callback is cloned out of the lock first, so a concurrent
    /// `on_error` may or may not see this report.
    pub(crate) fn report(&self, err: IoError) {
        log::warn!("I/O error on {}", err);
        let callback = self
            .on_error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        callback(err);
    }

    /// Shuts `connection` down, reporting a failure through the callback.
    pub(crate) async fn shut_down(&self, connection: &Connection) {
        log::debug!("Closing {}", connection.id());
        if let Err(error) = connection.shutdown().await {
            self.report(IoError::new(connection.id(), error));
        }
    }
}

/// One logical packet connection over a replaceable transport.
pub struct Stream {
    shared: Arc<Shared>,
    outgoing: mpsc::Sender<Packet>,
    incoming: tokio::sync::Mutex<mpsc::Receiver<Packet>>,
    incoming_tx: mpsc::Sender<Packet>,
    writer: Mutex<Option<JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Stream {
    /// Creates a stream whose queues hold up to `capacity` packets each.
    ///
    /// # Panics
    ///
    /// Must be called from within a tokio runtime, since the outbound
    /// pump is spawned right away.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(StreamConfig::default().with_capacity(capacity))
    }

    /// Creates a stream with explicit tunables.
    pub fn with_config(config: StreamConfig) -> Self {
        if config.capacity == 0 {
            log::debug!("Queue capacity 0 raised to 1");
        }
        let capacity = config.capacity.max(1);

        let (outgoing, outgoing_rx) = mpsc::channel(capacity);
        let (incoming_tx, incoming) = mpsc::channel(capacity);
        let (connection, _) = watch::channel(None);
        let on_error: ErrorCallback = Arc::new(|_: IoError| {});

        let shared = Arc::new(Shared {
            config,
            connection,
            shutdown: CancellationToken::new(),
            closed: AtomicBool::new(false),
            on_error: RwLock::new(on_error),
        });

        let writer = tokio::spawn(Sender::new(Arc::clone(&shared), outgoing_rx).run());

        Self {
            shared,
            outgoing,
            incoming: tokio::sync::Mutex::new(incoming),
            incoming_tx,
            writer: Mutex::new(Some(writer)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Makes `transport` the active connection and starts reading from it.
    ///
    /// Can be called repeatedly to hot-swap a broken connection. Reader
    /// pumps of earlier transports are left running until their transport
    /// fails or the stream closes.
    pub fn set_connection<T: Transport>(&self, transport: T) -> ConnectionId {
        let id = ConnectionId::next(&self.next_id);
        let (connection, reader) = Connection::attach(id, Box::new(transport));
        let connection = Arc::new(connection);

        if self.shared.is_closed() {
            log::debug!("Stream closed, shutting down {} right away", id);
            self.shut_down_detached(connection, reader);
            return id;
        }

        let previous = self.shared.connection.send_replace(Some(Arc::clone(&connection)));
        match previous {
            Some(previous) => log::debug!("Swapped connection {} for {}", previous.id(), id),
            None => log::debug!("Attached connection {}", id),
        }

        // The writer may have torn down the active connection between the
        // check above and the swap. Whoever takes it out of the slot shuts it down.
        if self.shared.is_closed() {
            let mut orphaned = None;
            self.shared.connection.send_if_modified(|active| {
                if active.as_ref().is_some_and(|c| c.id() == id) {
                    orphaned = active.take();
                    true
                } else {
                    false
                }
            });
            match orphaned {
                Some(connection) => self.shut_down_detached(connection, reader),
                None => drop(reader),
            }
            return id;
        }

        let receiver = Receiver::new(
            Arc::clone(&self.shared),
            id,
            reader,
            self.incoming_tx.clone(),
        );
        tokio::spawn(receiver.run());

        id
    }

    fn shut_down_detached(&self, connection: Arc<Connection>, reader: ReadHalf<BoxTransport>) {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            drop(reader);
            shared.shut_down(&connection).await;
        });
    }

    /// Id of the transport outbound packets currently go to.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.shared
            .connection
            .borrow()
            .as_ref()
            .map(|connection| connection.id())
    }

    /// Replaces the callback that receives I/O failures.
    ///
    /// It may be called from either pump concurrently and should return
    /// quickly.
    pub fn on_error<F>(&self, callback: F)
    where
        F: Fn(IoError) + Send + Sync + 'static,
    {
        *self
            .shared
            .on_error
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(callback);
    }

    /// Queues a packet for sending, waiting while the queue is full.
    pub async fn send(&self, packet: Packet) -> Result<()> {
        if self.shared.is_closed() {
            return Err(Error::Closed);
        }

        tokio::select! {
            biased;
            _ = self.shared.shutdown.cancelled() => Err(Error::Closed),
            sent = self.outgoing.send(packet) => sent.map_err(|_| Error::Closed),
        }
    }

    /// Handle to the outbound queue for producers in other tasks.
    pub fn outgoing(&self) -> mpsc::Sender<Packet> {
        self.outgoing.clone()
    }

    /// Next inbound packet.
    ///
    /// Returns `None` once the stream is closed and the queue is drained.
    pub async fn recv(&self) -> Option<Packet> {
        let mut incoming = self.incoming.lock().await;
        tokio::select! {
            biased;
            packet = incoming.recv() => packet,
            _ = self.shared.shutdown.cancelled() => incoming.try_recv().ok(),
        }
    }

    /// True once `close` was called or the stream was dropped.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stops both pumps and waits until the active transport is shut down.
    ///
    /// Calling it a second time returns [`Error::AlreadyClosed`].
    pub async fn close(&self) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(Error::AlreadyClosed)?;

        log::debug!("Closing stream");
        self.shared.mark_closed();
        writer.await?;
        Ok(())
    }
}

impl Drop for Stream {
    fn drop(&mut self) {
        self.shared.mark_closed();
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("connection", &self.connection())
            .field("closed", &self.is_closed())
            .finish()
    }
}
