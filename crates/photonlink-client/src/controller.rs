//! ---
//! pl_section: "03-device-client"
//! pl_subsection: "module"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "DeviceController facade: pin configuration, writes, read subscriptions."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use std::sync::Arc;

use photonlink_cloud::DiscoveryClient;
use photonlink_protocol::{
    codec::to_seven_bit_pair, wire, EventKey, Pin, PinDescriptor, PinMode,
};
use tokio::sync::{watch, Mutex};
use tracing::info;

use crate::config::ControllerConfig;
use crate::connection::{DeviceConnection, IoState};
use crate::rgb::{Rgb, RgbInput};
use crate::Result;

/// Logic-high level for digital writes.
pub const HIGH: u8 = 1;
/// Logic-low level for digital writes.
pub const LOW: u8 = 0;

/// Lifecycle stages of a device link. `Ready` is terminal: there is no
/// closed state to re-enter and no reconnect path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Controller value requested, nothing resolved yet.
    Created,
    /// Cloud directory handshake in flight.
    Discovering,
    /// Endpoint resolved, TCP connect in flight.
    Connecting,
    /// Socket established, reader installed, commands accepted.
    Ready,
}

/// Sampling interval floor in milliseconds.
const MIN_SAMPLING_INTERVAL: u32 = 10;
/// Sampling interval ceiling: the largest value a 7-bit pair can carry.
const MAX_SAMPLING_INTERVAL: u32 = 16383;

/// Public facade over one cloud-registered device.
///
/// [`DeviceController::connect`] walks the whole lifecycle — discovery,
/// socket establishment, reader installation — and only returns once the
/// link is ready, so a `DeviceController` value is always usable. A failure
/// at either stage is the returned error and the controller never comes up;
/// there is no retry and no reconnect path.
pub struct DeviceController {
    config: ControllerConfig,
    connection: DeviceConnection,
    io: Arc<Mutex<IoState>>,
    lifecycle: watch::Sender<LinkState>,
}

impl std::fmt::Debug for DeviceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DeviceController {
    /// Resolve the device through the cloud directory and open the binary
    /// protocol link.
    pub async fn connect(config: ControllerConfig) -> Result<Self> {
        let (lifecycle, _keepalive) = watch::channel(LinkState::Created);

        lifecycle.send_replace(LinkState::Discovering);
        info!(device = %config.device_id, "resolving device endpoint");
        let discovery = DiscoveryClient::with_api_base(&config.api_base);
        let endpoint = discovery
            .resolve(&config.device_id, &config.access_token)
            .await?;

        lifecycle.send_replace(LinkState::Connecting);
        let io = Arc::new(Mutex::new(IoState::new()));
        let connection = DeviceConnection::open(&endpoint, Arc::clone(&io)).await?;
        lifecycle.send_replace(LinkState::Ready);
        info!(device = %config.device_id, "device link ready");

        Ok(Self {
            config,
            connection,
            io,
            lifecycle,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        config: ControllerConfig,
        connection: DeviceConnection,
        io: Arc<Mutex<IoState>>,
    ) -> Self {
        Self {
            config,
            connection,
            io,
            lifecycle: watch::channel(LinkState::Ready).0,
        }
    }

    /// Current lifecycle stage. Always [`LinkState::Ready`] on a controller
    /// obtained from [`connect`](Self::connect).
    pub fn state(&self) -> LinkState {
        *self.lifecycle.borrow()
    }

    /// Watch receiver over the lifecycle stage, for observers that want
    /// change notification rather than polling [`state`](Self::state).
    pub fn lifecycle(&self) -> watch::Receiver<LinkState> {
        self.lifecycle.subscribe()
    }

    /// Device identifier this controller was connected with.
    pub fn device_id(&self) -> &str {
        &self.config.device_id
    }

    /// Put `pin` into `mode`. The request is validated against the pin's
    /// capability set and rejected before any byte reaches the wire; on the
    /// wire PWM travels as OUTPUT while the descriptor records PWM.
    pub async fn pin_mode(&self, pin: Pin, mode: PinMode) -> Result<()> {
        let mut io = self.io.lock().await;
        io.router.table().validate_mode(pin, mode)?;
        io.router.table_mut().record_mode(pin.index(), mode);
        drop(io);

        self.connection
            .write(vec![wire::PIN_MODE, pin.index(), mode.wire_code()])
    }

    /// Write a digital level ([`HIGH`]/[`LOW`]) to `pin`. No mode check
    /// happens here; the pin must have been configured via
    /// [`pin_mode`](Self::pin_mode) beforehand.
    pub async fn digital_write(&self, pin: Pin, value: u8) -> Result<()> {
        self.write_pin(wire::DIGITAL_WRITE, pin, value).await
    }

    /// Write an analog (PWM) value to `pin`.
    pub async fn analog_write(&self, pin: Pin, value: u8) -> Result<()> {
        self.write_pin(wire::ANALOG_WRITE, pin, value).await
    }

    /// Write a servo position in degrees to `pin`.
    pub async fn servo_write(&self, pin: Pin, degrees: u8) -> Result<()> {
        self.write_pin(wire::SERVO_WRITE, pin, degrees).await
    }

    async fn write_pin(&self, action: u8, pin: Pin, value: u8) -> Result<()> {
        self.connection.write(vec![action, pin.index(), value])?;
        self.io
            .lock()
            .await
            .router
            .table_mut()
            .record_value(pin.index(), u16::from(value));
        Ok(())
    }

    /// Subscribe `handler` to digital readings of `pin` and ask the device
    /// for a continuous read. Handlers accumulate — they are never removed —
    /// and fire in frame-arrival order.
    pub async fn digital_read<F>(&self, pin: Pin, handler: F) -> Result<()>
    where
        F: FnMut(u16) + Send + 'static,
    {
        self.subscribe(EventKey::Digital(pin), handler).await;
        self.connection
            .write(vec![wire::REPORTING, pin.index(), wire::READ_DIGITAL])
    }

    /// Subscribe `handler` to analog readings of `pin` (values scaled to the
    /// 10-bit convention) and ask the device for a continuous read.
    pub async fn analog_read<F>(&self, pin: Pin, handler: F) -> Result<()>
    where
        F: FnMut(u16) + Send + 'static,
    {
        self.subscribe(EventKey::Analog(pin), handler).await;
        self.connection
            .write(vec![wire::REPORTING, pin.index(), wire::READ_ANALOG])
    }

    async fn subscribe<F>(&self, key: EventKey, handler: F)
    where
        F: FnMut(u16) + Send + 'static,
    {
        self.io
            .lock()
            .await
            .handlers
            .entry(key)
            .or_default()
            .push(Box::new(handler));
    }

    /// Set the on-board RGB LED. Accepts a channel triple, a `[u8; 3]`
    /// array, an [`Rgb`] struct, or a hex string with optional leading `#`;
    /// the resolved channels are cached and returned.
    pub async fn internal_rgb(&self, input: impl Into<RgbInput>) -> Result<Rgb> {
        let rgb = input.into().resolve()?;
        self.connection
            .write(vec![wire::INTERNAL_RGB, rgb.red, rgb.green, rgb.blue])?;
        self.io.lock().await.rgb = Some(rgb);
        Ok(rgb)
    }

    /// Last RGB state set through this controller, if any.
    pub async fn rgb(&self) -> Option<Rgb> {
        self.io.lock().await.rgb
    }

    /// Set the continuous-read sampling interval, clamped to 10–16383 ms and
    /// encoded as a 7-bit pair.
    pub async fn set_sampling_interval(&self, interval_ms: u32) -> Result<()> {
        let clamped = interval_ms.clamp(MIN_SAMPLING_INTERVAL, MAX_SAMPLING_INTERVAL) as u16;
        let pair = to_seven_bit_pair(clamped);
        self.connection
            .write(vec![wire::SAMPLE_INTERVAL, pair[0], pair[1]])?;
        self.io.lock().await.sampling_interval = Some(clamped);
        Ok(())
    }

    /// Last sampling interval set through this controller, if any.
    pub async fn sampling_interval(&self) -> Option<u16> {
        self.io.lock().await.sampling_interval
    }

    /// Snapshot of all 18 pin descriptors, live value cache included.
    pub async fn pins(&self) -> Vec<PinDescriptor> {
        self.io.lock().await.router.table().snapshot()
    }

    /// Last cached value for `pin`.
    pub async fn pin_value(&self, pin: Pin) -> u16 {
        self.io.lock().await.router.table().value(pin.index())
    }

    /// The firmware offers no reset command; present for API completeness.
    pub fn reset(&self) {}

    /// Stub: the link has no reconnect path. Dropping the controller tears
    /// the socket tasks down.
    pub fn close(&self) {}
}
