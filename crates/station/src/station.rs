//! The per-hub coordinator: owns the session lifecycle, applies inbound
//! transport events to local state and turns public intents into routed
//! wire commands.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use sl_cloud::CredentialCache;
use sl_domain::trace::TraceEvent;
use sl_domain::{
    now_millis, CapabilityOracle, CapabilitySet, GuardMode, HubSnapshot, ParamType, Parameter,
    ParameterDecoder, StationInfo, STATION_CHANNEL,
};
use sl_protocol::{CameraInfoSnapshot, TransportEvent};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::builder::StationBuilder;
use crate::events::{EventBus, EventKind, StationEvent, SubscriptionId};
use crate::params::ParameterStore;
use crate::reconnect::ReconnectScheduler;
use crate::router::{
    CommandRouter, DeviceTarget, Intent, Rejection, RouteContext, WatermarkSetting,
};
use crate::transport::{SessionParams, TransportFactory, TransportSession};
use crate::types::{ConnectionState, IntentError};

/// Coordinator for one hub.  Cheap to clone; clones share state.
///
/// Public intent methods never fail: a rejected or unsendable intent is
/// logged and dropped.  Use [`try_execute`](Self::try_execute) to observe
/// the outcome.
#[derive(Clone)]
pub struct Station {
    inner: Arc<Inner>,
}

/// Everything the builder hands over.
pub(crate) struct Parts {
    pub info: StationInfo,
    pub user_name: String,
    pub reconnect: ReconnectScheduler,
    pub router: CommandRouter,
    pub oracle: Arc<dyn CapabilityOracle>,
    pub decoder: Arc<dyn ParameterDecoder>,
    pub credentials: CredentialCache,
    pub factory: Arc<dyn TransportFactory>,
    pub event_capacity: usize,
}

struct Inner {
    info: RwLock<StationInfo>,
    station_caps: RwLock<CapabilitySet>,
    params: Mutex<ParameterStore>,
    credentials: AsyncMutex<CredentialCache>,
    link: Mutex<Link>,
    reconnect: Mutex<ReconnectScheduler>,
    events: EventBus,
    router: CommandRouter,
    oracle: Arc<dyn CapabilityOracle>,
    decoder: Arc<dyn ParameterDecoder>,
    factory: Arc<dyn TransportFactory>,
    user_name: String,
    /// Bumped by `close()`; timer-driven connects armed under an older
    /// value give up.
    close_epoch: AtomicU64,
}

/// The current session and the task pumping its events.
///
/// `generation` increases every time a session is installed or torn down;
/// events tagged with an older generation are dropped.
struct Link {
    state: ConnectionState,
    session: Option<Arc<dyn TransportSession>>,
    generation: u64,
    pump: Option<JoinHandle<()>>,
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

impl Station {
    pub fn builder(info: StationInfo) -> StationBuilder {
        StationBuilder::new(info)
    }

    pub(crate) fn from_parts(parts: Parts) -> Self {
        let station_caps = parts.oracle.classify(&parts.info.serial, &parts.info.model);
        Self {
            inner: Arc::new(Inner {
                info: RwLock::new(parts.info),
                station_caps: RwLock::new(station_caps),
                params: Mutex::new(ParameterStore::new()),
                credentials: AsyncMutex::new(parts.credentials),
                link: Mutex::new(Link {
                    state: ConnectionState::Disconnected,
                    session: None,
                    generation: 0,
                    pump: None,
                }),
                reconnect: Mutex::new(parts.reconnect),
                events: EventBus::new(parts.event_capacity),
                router: parts.router,
                oracle: parts.oracle,
                decoder: parts.decoder,
                factory: parts.factory,
                user_name: parts.user_name,
                close_epoch: AtomicU64::new(0),
            }),
        }
    }

    // ── Introspection ────────────────────────────────────────────────

    pub fn serial(&self) -> String {
        self.inner.info.read().serial.clone()
    }

    pub fn info(&self) -> StationInfo {
        self.inner.info.read().clone()
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.inner.station_caps.read().clone()
    }

    pub fn device_capabilities(&self, device_serial: &str) -> Option<CapabilitySet> {
        let info = self.inner.info.read();
        let dev = info.device(device_serial)?;
        Some(self.inner.oracle.classify(&dev.serial, &dev.model))
    }

    pub fn device_serial_for_channel(&self, channel: u8) -> Option<String> {
        self.inner
            .info
            .read()
            .device_serial_for_channel(channel)
            .map(str::to_owned)
    }

    pub fn parameter(&self, param_type: ParamType) -> Option<Parameter> {
        self.inner.params.lock().lookup(param_type).cloned()
    }

    pub fn parameters(&self) -> BTreeMap<ParamType, Parameter> {
        self.inner.params.lock().snapshot()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.link.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected_session().is_some()
    }

    /// Whether `device_serial` currently has a live stream running.
    /// `false` when not connected or the device is unknown.
    pub fn is_live_streaming(&self, device_serial: &str) -> bool {
        let Some(channel) = self.inner.info.read().device(device_serial).map(|d| d.channel) else {
            return false;
        };
        self.inner
            .connected_session()
            .is_some_and(|s| s.is_live_streaming(channel))
    }

    // ── Events ───────────────────────────────────────────────────────

    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&StationEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(kind, listener)
    }

    pub fn subscribe_all<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&StationEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe_all(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.events.unsubscribe(id)
    }

    /// Async stream of every event emitted from now on.
    pub fn events(&self) -> tokio::sync::broadcast::Receiver<StationEvent> {
        self.inner.events.receiver()
    }

    // ── State updates ────────────────────────────────────────────────

    /// Refresh the hub descriptor and merge the parameters reported by the
    /// cloud listing.
    ///
    /// A snapshot for a different serial is ignored.
    pub fn update_from_hub(&self, snapshot: HubSnapshot) {
        let HubSnapshot {
            station: info,
            parameters,
        } = snapshot;

        let owner = self.serial();
        if info.serial != owner {
            tracing::warn!(
                station = %owner,
                snapshot = %info.serial,
                "ignoring hub snapshot for another station"
            );
            return;
        }

        let caps = self.inner.oracle.classify(&info.serial, &info.model);
        *self.inner.info.write() = info;
        *self.inner.station_caps.write() = caps;

        let changes: Vec<(ParamType, Parameter)> = {
            let mut params = self.inner.params.lock();
            parameters
                .iter()
                .filter_map(|raw| {
                    params
                        .merge(&*self.inner.decoder, raw.param_type, &raw.value, raw.modified)
                        .map(|p| (raw.param_type, p))
                })
                .collect()
        };

        tracing::debug!(station = %owner, changed = changes.len(), "hub snapshot applied");
        for (param_type, p) in changes {
            self.inner.emit_param_changed(&owner, param_type, p);
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Open a new session, replacing any existing one.
    ///
    /// Never fails: handshake errors are logged and trigger the reconnect
    /// schedule.
    pub async fn connect(&self) {
        self.inner.connect(None).await;
    }

    /// Tear down the session and cancel any pending reconnect.
    pub async fn close(&self) {
        let inner = &self.inner;
        inner.close_epoch.fetch_add(1, Ordering::SeqCst);
        inner.reconnect.lock().cancel();

        let (session, was_up) = {
            let mut link = inner.link.lock();
            if let Some(pump) = link.pump.take() {
                pump.abort();
            }
            link.generation += 1;
            let was_up = link.state != ConnectionState::Disconnected;
            link.state = ConnectionState::Disconnected;
            (link.session.take(), was_up)
        };

        let Some(session) = session else {
            return;
        };
        session.close().await;

        let station = self.serial();
        tracing::info!(station = %station, "session closed");
        TraceEvent::SessionDisconnected {
            station: station.clone(),
            explicit: true,
        }
        .emit();
        if was_up {
            inner.events.emit(StationEvent::Disconnected { station });
        }
    }

    // ── Intents ──────────────────────────────────────────────────────

    pub async fn set_guard_mode(&self, mode: GuardMode) {
        self.execute(Intent::SetGuardMode(mode), None).await;
    }

    /// Same as [`set_guard_mode`](Self::set_guard_mode) for a raw wire
    /// value.  Values outside the known set are logged and dropped.
    pub async fn set_guard_mode_code(&self, code: i64) {
        match GuardMode::from_code(code) {
            Some(mode) => self.set_guard_mode(mode).await,
            None => self.report("set_guard_mode", None, &IntentError::InvalidGuardMode(code)),
        }
    }

    pub async fn get_camera_info(&self) {
        self.execute(Intent::GetCameraInfo, None).await;
    }

    pub async fn get_storage_info(&self) {
        self.execute(Intent::GetStorageInfo, None).await;
    }

    pub async fn reboot_hub(&self) {
        self.execute(Intent::RebootHub, None).await;
    }

    pub async fn set_status_led(&self, device_serial: &str, on: bool) {
        self.execute(Intent::SetStatusLed(on), Some(device_serial)).await;
    }

    pub async fn set_auto_night_vision(&self, device_serial: &str, on: bool) {
        self.execute(Intent::SetAutoNightVision(on), Some(device_serial)).await;
    }

    pub async fn set_anti_theft_detection(&self, device_serial: &str, on: bool) {
        self.execute(Intent::SetAntiTheftDetection(on), Some(device_serial)).await;
    }

    pub async fn set_watermark(&self, device_serial: &str, setting: WatermarkSetting) {
        self.execute(Intent::SetWatermark(setting), Some(device_serial)).await;
    }

    pub async fn enable_device(&self, device_serial: &str, enabled: bool) {
        self.execute(Intent::EnableDevice(enabled), Some(device_serial)).await;
    }

    pub async fn start_download(&self, path: &str, cipher_id: i64) {
        let intent = Intent::StartDownload {
            path: path.to_string(),
            cipher_id,
        };
        self.execute(intent, None).await;
    }

    pub async fn cancel_download(&self, device_serial: &str) {
        self.execute(Intent::CancelDownload, Some(device_serial)).await;
    }

    pub async fn start_livestream(&self, device_serial: &str) {
        self.execute(Intent::StartLivestream, Some(device_serial)).await;
    }

    pub async fn stop_livestream(&self, device_serial: &str) {
        self.execute(Intent::StopLivestream, Some(device_serial)).await;
    }

    /// Route and send `intent`, reporting why nothing was sent.
    pub async fn try_execute(
        &self,
        intent: Intent,
        device_serial: Option<&str>,
    ) -> Result<(), IntentError> {
        self.try_execute_at(intent, device_serial, None).await
    }

    /// `epoch` pins any implicit connect to the close epoch it was
    /// requested under.
    async fn try_execute_at(
        &self,
        intent: Intent,
        device_serial: Option<&str>,
        epoch: Option<u64>,
    ) -> Result<(), IntentError> {
        let inner = &self.inner;

        let (info, station_caps) = (inner.info.read().clone(), inner.station_caps.read().clone());
        let device = match device_serial {
            Some(sn) => Some(
                info.device(sn)
                    .cloned()
                    .ok_or_else(|| IntentError::UnknownDevice(sn.to_string()))?,
            ),
            None => None,
        };
        if intent.targets_device() && device.is_none() {
            return Err(Rejection::MissingDevice(intent.name()).into());
        }

        let session = if intent.connects_implicitly() {
            inner.ensure_connected(epoch).await?
        } else {
            inner.connected_session().ok_or(IntentError::NotConnected)?
        };

        if let Some(dev) = &device {
            match intent {
                Intent::StartLivestream if session.is_live_streaming(dev.channel) => {
                    return Err(IntentError::AlreadyStreaming(dev.channel));
                }
                Intent::StopLivestream if !session.is_live_streaming(dev.channel) => {
                    return Err(IntentError::NotStreaming(dev.channel));
                }
                _ => {}
            }
        }

        let key = intent.needs_public_key().then(|| session.public_key());
        if let (Intent::StartDownload { .. }, Some(key)) = (&intent, &key) {
            session.set_download_key(&key.pem);
        }

        let device_caps = device
            .as_ref()
            .map(|d| inner.oracle.classify(&d.serial, &d.model));
        let transaction = now_millis().to_string();
        let ctx = RouteContext {
            station: &info,
            station_caps: &station_caps,
            device: device
                .as_ref()
                .zip(device_caps.as_ref())
                .map(|(info, caps)| DeviceTarget { info, caps }),
            user_name: &inner.user_name,
            public_key: key.as_ref().map(|k| k.modulus.as_slice()),
            transaction: &transaction,
        };

        let commands = inner.router.route(&intent, &ctx)?;
        for command in commands {
            let (code, channel) = (command.command.code(), command.channel);
            session.send(command).await?;
            tracing::debug!(
                station = %info.serial,
                intent = intent.name(),
                command = code,
                channel,
                "command sent"
            );
            TraceEvent::CommandRouted {
                station: info.serial.clone(),
                intent: intent.name().into(),
                command: code,
                channel,
            }
            .emit();
        }
        Ok(())
    }

    async fn execute(&self, intent: Intent, device_serial: Option<&str>) {
        let name = intent.name();
        if let Err(e) = self.try_execute(intent, device_serial).await {
            self.report(name, device_serial, &e);
        }
    }

    fn report(&self, intent: &'static str, device: Option<&str>, err: &IntentError) {
        let station = self.serial();
        match err {
            IntentError::InvalidGuardMode(_) => {
                tracing::error!(station = %station, intent, error = %err, "intent rejected");
            }
            _ => {
                tracing::warn!(
                    station = %station,
                    intent,
                    device = device.unwrap_or("-"),
                    error = %err,
                    "intent not sent"
                );
            }
        }
        TraceEvent::CommandRejected {
            station,
            intent: intent.into(),
            reason: err.to_string(),
        }
        .emit();
    }
}

impl Inner {
    fn serial(&self) -> String {
        self.info.read().serial.clone()
    }

    fn connected_session(&self) -> Option<Arc<dyn TransportSession>> {
        self.link
            .lock()
            .session
            .as_ref()
            .filter(|s| s.is_connected())
            .cloned()
    }

    async fn ensure_connected(
        self: &Arc<Self>,
        epoch: Option<u64>,
    ) -> Result<Arc<dyn TransportSession>, IntentError> {
        if let Some(session) = self.connected_session() {
            return Ok(session);
        }
        tracing::debug!(station = %self.serial(), "not connected, connecting first");
        self.connect(epoch).await;
        self.connected_session().ok_or(IntentError::NotConnected)
    }

    fn closed_since(&self, epoch: u64) -> bool {
        self.close_epoch.load(Ordering::SeqCst) != epoch
    }

    /// `epoch` is the close epoch the attempt was requested under; `None`
    /// means now.  A `close()` after that point abandons the attempt.
    async fn connect(self: &Arc<Self>, epoch: Option<u64>) {
        let epoch = epoch.unwrap_or_else(|| self.close_epoch.load(Ordering::SeqCst));
        let params = {
            let info = self.info.read();
            SessionParams {
                station_serial: info.serial.clone(),
                p2p_did: info.p2p_did.clone(),
                dsk_key: String::new(),
                local_address: info.local_address.clone(),
            }
        };
        let station = params.station_serial.clone();

        let credential = self.credentials.lock().await.ensure_fresh().await;

        if self.closed_since(epoch) {
            tracing::debug!(station = %station, "connect superseded by close");
            return;
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let session = self.factory.create(
            SessionParams {
                dsk_key: credential.key,
                ..params
            },
            tx,
        );

        let (previous, generation) = {
            let mut link = self.link.lock();
            // close() bumps the epoch before taking this lock.
            if self.closed_since(epoch) {
                tracing::debug!(station = %station, "connect superseded by close");
                return;
            }
            if let Some(pump) = link.pump.take() {
                pump.abort();
            }
            link.generation += 1;
            link.state = ConnectionState::Connecting;
            link.pump = Some(spawn_pump(Arc::downgrade(self), link.generation, rx));
            (link.session.replace(session.clone()), link.generation)
        };

        tracing::info!(station = %station, generation, "connecting");
        TraceEvent::SessionConnecting {
            station: station.clone(),
            generation,
        }
        .emit();

        if let Some(previous) = previous {
            previous.close().await;
        }

        match session.connect().await {
            Ok(()) => {
                if self.link.lock().generation != generation {
                    tracing::debug!(
                        station = %station,
                        generation,
                        "session replaced during handshake"
                    );
                    session.close().await;
                }
            }
            Err(e) => {
                tracing::warn!(station = %station, error = %e, "handshake failed");
                self.handle_event(generation, TransportEvent::Disconnected);
            }
        }
    }

    fn handle_event(self: &Arc<Self>, generation: u64, event: TransportEvent) {
        if self.link.lock().generation != generation {
            tracing::trace!(generation, "dropping event from stale session");
            return;
        }
        let station = self.serial();

        match event {
            TransportEvent::Connected { address } => {
                self.link.lock().state = ConnectionState::Connected;
                self.reconnect.lock().on_connect_success();
                tracing::info!(station = %station, address = %address, "connected");
                TraceEvent::SessionConnected {
                    station: station.clone(),
                    address: address.clone(),
                }
                .emit();
                self.events.emit(StationEvent::Connected { station, address });
            }
            TransportEvent::Disconnected => {
                let session_alive = {
                    let mut link = self.link.lock();
                    link.state = ConnectionState::Disconnected;
                    link.session.is_some()
                };
                tracing::info!(station = %station, "disconnected");
                TraceEvent::SessionDisconnected {
                    station: station.clone(),
                    explicit: false,
                }
                .emit();
                self.events.emit(StationEvent::Disconnected {
                    station: station.clone(),
                });
                if session_alive {
                    self.schedule_reconnect(&station);
                }
            }
            TransportEvent::CommandResult(result) => {
                tracing::debug!(
                    station = %station,
                    command = result.command_type,
                    channel = result.channel,
                    return_code = result.return_code,
                    "command result"
                );
                self.events.emit(StationEvent::CommandResult(result));
            }
            TransportEvent::AlarmMode(mode) => self.on_alarm_mode(&station, mode),
            TransportEvent::CameraInfo(snapshot) => self.ingest_camera_info(&station, snapshot),
            TransportEvent::DownloadStarted(s) => self.events.emit(StationEvent::DownloadStarted(s)),
            TransportEvent::DownloadFinished(s) => {
                self.events.emit(StationEvent::DownloadFinished(s))
            }
            TransportEvent::LivestreamStarted(s) => {
                self.events.emit(StationEvent::LivestreamStarted(s))
            }
            TransportEvent::LivestreamStopped(s) => {
                self.events.emit(StationEvent::LivestreamStopped(s))
            }
            TransportEvent::WifiRssi { channel, rssi } => {
                let owner = if channel == STATION_CHANNEL {
                    Some(station)
                } else {
                    self.info
                        .read()
                        .device_serial_for_channel(channel)
                        .map(str::to_owned)
                };
                match owner {
                    Some(owner) => self.events.emit(StationEvent::RssiChanged { owner, rssi }),
                    None => tracing::debug!(channel, "rssi for unknown channel"),
                }
            }
        }
    }

    /// Every alarm-mode report is announced, even when the stored schedule
    /// mode already holds that value.
    fn on_alarm_mode(self: &Arc<Self>, station: &str, mode: i64) {
        let p = Parameter {
            value: Value::from(mode),
            modified: now_millis(),
        };
        self.params
            .lock()
            .merge_value(ParamType::SCHEDULE_MODE, p.value.clone(), p.modified);
        self.emit_param_changed(station, ParamType::SCHEDULE_MODE, p);
        spawn_camera_info_refresh(
            Station {
                inner: Arc::clone(self),
            },
            self.close_epoch.load(Ordering::SeqCst),
        );
    }

    /// Split a camera-info dump: channel 255 entries merge into the
    /// station's own parameters, every other known channel becomes one
    /// bundle per device holding exactly its entries (the last entry of a
    /// type wins).  Entries for unknown channels are dropped.
    fn ingest_camera_info(&self, station: &str, snapshot: CameraInfoSnapshot) {
        let now = now_millis();
        let info = self.info.read().clone();
        let mut own_changes = Vec::new();
        let mut bundles: BTreeMap<String, BTreeMap<ParamType, Parameter>> = BTreeMap::new();

        {
            let mut params = self.params.lock();
            for entry in &snapshot.params {
                if entry.channel == STATION_CHANNEL {
                    if let Some(p) =
                        params.merge(&*self.decoder, entry.param_type, &entry.value, now)
                    {
                        own_changes.push((entry.param_type, p));
                    }
                } else if let Some(serial) = info.device_serial_for_channel(entry.channel) {
                    let p = Parameter {
                        value: self.decoder.decode(entry.param_type, &entry.value),
                        modified: now,
                    };
                    bundles
                        .entry(serial.to_owned())
                        .or_default()
                        .insert(entry.param_type, p);
                } else {
                    tracing::trace!(
                        channel = entry.channel,
                        param = %entry.param_type,
                        "camera info for unknown channel"
                    );
                }
            }
        }

        tracing::debug!(
            station = %station,
            own = own_changes.len(),
            devices = bundles.len(),
            "camera info applied"
        );

        for (param_type, p) in own_changes {
            self.emit_param_changed(station, param_type, p);
        }
        for (device, parameters) in bundles {
            self.events
                .emit(StationEvent::DeviceParametersUpdated { device, parameters });
        }
    }

    fn emit_param_changed(&self, owner: &str, param_type: ParamType, p: Parameter) {
        self.events.emit(StationEvent::ParameterChanged {
            owner: owner.to_string(),
            param_type,
            value: p.value,
            modified: p.modified,
        });
    }

    fn schedule_reconnect(self: &Arc<Self>, station: &str) {
        let weak = Arc::downgrade(self);
        let epoch = self.close_epoch.load(Ordering::SeqCst);

        let armed = self.reconnect.lock().on_disconnect(move |timer| async move {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let fired = inner.reconnect.lock().take_fired(timer);
            if !fired {
                return;
            }
            inner.connect(Some(epoch)).await;
        });

        match armed {
            Some(delay) => {
                let delay_ms = delay.as_millis() as u64;
                tracing::info!(station = %station, delay_ms, "reconnect scheduled");
                TraceEvent::ReconnectScheduled {
                    station: station.to_string(),
                    delay_ms,
                }
                .emit();
            }
            None => tracing::debug!(station = %station, "reconnect already pending"),
        }
    }
}

// ── helpers ──────────────────────────────────────────────────────────

fn spawn_pump(
    inner: Weak<Inner>,
    generation: u64,
    mut rx: mpsc::UnboundedReceiver<TransportEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            inner.handle_event(generation, event);
        }
    })
}

/// Fire-and-forget parameter refresh after the hub reports a mode change.
/// Gives up if the station was closed after `epoch`.
fn spawn_camera_info_refresh(station: Station, epoch: u64) {
    tokio::spawn(async move {
        if station.inner.closed_since(epoch) {
            return;
        }
        if let Err(e) = station
            .try_execute_at(Intent::GetCameraInfo, None, Some(epoch))
            .await
        {
            station.report(Intent::GetCameraInfo.name(), None, &e);
        }
    });
}
