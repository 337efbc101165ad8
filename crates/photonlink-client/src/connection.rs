//! ---
//! pl_section: "03-device-client"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "TCP device connection: reader/writer tasks and shared I/O state."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Arc;

use photonlink_cloud::DeviceEndpoint;
use photonlink_protocol::{EventKey, EventRouter, FrameDecoder, PinTable};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{ClientError, Rgb};

/// Subscriber callback for one read event key.
pub(crate) type ReadCallback = Box<dyn FnMut(u16) + Send>;

/// State shared between the controller facade and the reader task: the pin
/// table (inside the router), the subscription registry, and the small
/// caches the facade maintains. Exactly one writer at a time by
/// construction — the facade and the single reader task take turns on the
/// mutex.
pub(crate) struct IoState {
    pub(crate) router: EventRouter,
    pub(crate) handlers: HashMap<EventKey, Vec<ReadCallback>>,
    pub(crate) rgb: Option<Rgb>,
    pub(crate) sampling_interval: Option<u16>,
}

impl IoState {
    pub(crate) fn new() -> Self {
        Self {
            router: EventRouter::new(PinTable::new()),
            handlers: HashMap::new(),
            rgb: None,
            sampling_interval: None,
        }
    }
}

/// The persistent TCP link to the device.
///
/// Owns the socket through two spawned tasks: one writer draining a channel
/// of raw command buffers (fire-and-forget, no acknowledgement), and one
/// reader feeding received chunks through the frame decoder and router. The
/// reader loop is installed exactly once, no matter how many read
/// subscriptions are issued later.
pub(crate) struct DeviceConnection {
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl DeviceConnection {
    /// Open the socket against a resolved endpoint and start the I/O tasks.
    pub(crate) async fn open(
        endpoint: &DeviceEndpoint,
        io: Arc<Mutex<IoState>>,
    ) -> Result<Self, ClientError> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        info!(endpoint = %endpoint, "device socket established");

        let (read_half, mut write_half) = stream.into_split();
        let (outgoing, mut pending) = mpsc::unbounded_channel::<Vec<u8>>();

        let writer = tokio::spawn(async move {
            while let Some(buffer) = pending.recv().await {
                if let Err(err) = write_half.write_all(&buffer).await {
                    warn!(error = %err, "device write failed; dropping writer");
                    break;
                }
            }
        });
        let reader = tokio::spawn(read_loop(read_half, io));

        Ok(Self {
            outgoing,
            reader,
            writer,
        })
    }

    /// Queue a raw command buffer for the writer task. Fire-and-forget; the
    /// only failure is a torn-down link.
    pub(crate) fn write(&self, buffer: Vec<u8>) -> Result<(), ClientError> {
        self.outgoing
            .send(buffer)
            .map_err(|_| ClientError::ConnectionClosed)
    }
}

impl Drop for DeviceConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Single read loop for the connection: chunk in, frames out, events
/// dispatched to whatever handlers are registered at that moment. Frames are
/// dispatched in strict arrival order.
async fn read_loop(mut read_half: OwnedReadHalf, io: Arc<Mutex<IoState>>) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 512];

    loop {
        match read_half.read(&mut chunk).await {
            Ok(0) => {
                info!("device closed the connection");
                break;
            }
            Ok(received) => {
                let frames = decoder.feed(&chunk[..received]);
                if frames.is_empty() {
                    continue;
                }
                debug!(count = frames.len(), "decoded incoming frames");

                let mut io = io.lock().await;
                let IoState {
                    router, handlers, ..
                } = &mut *io;
                for frame in &frames {
                    let events = router.route(frame, |key| handlers.contains_key(&key));
                    for event in events {
                        if let Some(subscribers) = handlers.get_mut(&event.key) {
                            for handler in subscribers.iter_mut() {
                                handler(event.value);
                            }
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "device read failed; stopping reader");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photonlink_protocol::{wire, Pin};
    use tokio::net::TcpListener;
    use tokio::time::{timeout, Duration};

    async fn connected_pair() -> (DeviceConnection, Arc<Mutex<IoState>>, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let endpoint = DeviceEndpoint {
            host: addr.ip().to_string(),
            port: addr.port(),
        };
        let io = Arc::new(Mutex::new(IoState::new()));
        let connection = DeviceConnection::open(&endpoint, Arc::clone(&io))
            .await
            .unwrap();
        let (device, _) = listener.accept().await.unwrap();
        (connection, io, device)
    }

    #[tokio::test]
    async fn queued_buffers_reach_the_device_verbatim() {
        let (connection, _io, mut device) = connected_pair().await;

        connection.write(vec![wire::PIN_MODE, 0, 1]).unwrap();
        connection.write(vec![wire::DIGITAL_WRITE, 0, 1]).unwrap();

        let mut received = [0u8; 6];
        timeout(Duration::from_secs(1), device.read_exact(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, [wire::PIN_MODE, 0, 1, wire::DIGITAL_WRITE, 0, 1]);
    }

    #[tokio::test]
    async fn incoming_frames_are_dispatched_in_arrival_order() {
        let (_connection, io, mut device) = connected_pair().await;

        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        {
            let mut io = io.lock().await;
            let tx = seen_tx.clone();
            io.handlers
                .entry(EventKey::Digital(Pin::Digital(2)))
                .or_default()
                .push(Box::new(move |value| {
                    let _ = tx.send(value);
                }));
        }

        // Two digital-read frames for D2, split awkwardly across writes.
        let stream = [
            wire::DIGITAL_READ,
            2,
            1,
            0,
            wire::DIGITAL_READ,
            2,
            0,
            0,
        ];
        device.write_all(&stream[..3]).await.unwrap();
        device.write_all(&stream[3..]).await.unwrap();

        let first = timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        let second = timeout(Duration::from_secs(1), seen_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((first, second), (1, 0));
        assert_eq!(io.lock().await.router.table().value(2), 0);
    }

    #[tokio::test]
    async fn dropping_the_connection_tears_the_socket_down() {
        let (connection, _io, mut device) = connected_pair().await;
        drop(connection);

        let mut buffer = [0u8; 1];
        let read = timeout(Duration::from_secs(1), device.read(&mut buffer))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, 0, "device should observe EOF");
    }
}
