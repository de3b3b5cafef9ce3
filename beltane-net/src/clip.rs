//! Clip-engine streaming client.
//!
//! Maintains one duplex command connection plus two independent
//! long-lived subscriptions — a fine-grained per-slot stream and a
//! coarser matrix stream. Each subscription runs on its own thread,
//! blocking on the next engine message, applying it to the [`ClipGrid`]
//! and letting the grid republish it as a bus event.
//!
//! On connection loss the grid is marked stale (contents retained) and
//! the thread reconnects with doubling backoff. Every (re)connect sends
//! `Subscribe { snapshot: true }` so a full snapshot lands before any
//! further incremental update. Trigger commands are one-way fire
//! requests; the effect is observed later on the slot stream.

use std::io::{self, BufReader};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use beltane_core::ClipGrid;
use beltane_types::SlotAddr;

use crate::framing::{read_message, write_message};
use crate::protocol::{
    parse_matrix_document, parse_slot_document, EngineEvent, EngineRequest, MatrixUpdate,
    SlotField, SlotUpdate, StreamKind,
};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);
const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(30);

pub struct ClipClient {
    addr: String,
    grid: Arc<ClipGrid>,
    running: Arc<AtomicBool>,
    command: Arc<Mutex<Option<TcpStream>>>,
    /// Live sockets, registered so `stop` can unblock their readers.
    sockets: Arc<Mutex<Vec<TcpStream>>>,
    reconnect_delay: Duration,
    threads: Vec<JoinHandle<()>>,
}

impl ClipClient {
    pub fn new(addr: &str, grid: Arc<ClipGrid>) -> Self {
        Self {
            addr: addr.to_string(),
            grid,
            running: Arc::new(AtomicBool::new(true)),
            command: Arc::new(Mutex::new(None)),
            sockets: Arc::new(Mutex::new(Vec::new())),
            reconnect_delay: RECONNECT_DELAY,
            threads: Vec::new(),
        }
    }

    /// Spawn the command maintainer and both subscription threads.
    pub fn start(&mut self) {
        for kind in [StreamKind::Slots, StreamKind::Matrix] {
            let config = StreamConfig {
                kind,
                addr: self.addr.clone(),
                reconnect_delay: self.reconnect_delay,
            };
            let grid = self.grid.clone();
            let running = self.running.clone();
            let sockets = self.sockets.clone();
            let name = match kind {
                StreamKind::Slots => "clip-slots",
                StreamKind::Matrix => "clip-matrix",
            };
            let handle = thread::Builder::new()
                .name(name.into())
                .spawn(move || stream_worker(config, grid, running, sockets))
                .expect("failed to spawn clip stream thread");
            self.threads.push(handle);
        }

        let addr = self.addr.clone();
        let running = self.running.clone();
        let command = self.command.clone();
        let sockets = self.sockets.clone();
        let handle = thread::Builder::new()
            .name("clip-command".into())
            .spawn(move || command_maintainer(addr, command, running, sockets))
            .expect("failed to spawn clip command thread");
        self.threads.push(handle);

        info!(target: "clip", "clip engine client started for {}", self.addr);
    }

    /// Establish the command connection synchronously. The background
    /// maintainer does this automatically; calling it directly is only
    /// needed when triggers must work before the maintainer's first
    /// attempt lands.
    pub fn connect_command(&self) -> io::Result<()> {
        let stream = TcpStream::connect(&self.addr)?;
        register_socket(&self.sockets, &stream);
        *self.command.lock().expect("command lock") = Some(stream);
        Ok(())
    }

    pub fn is_command_connected(&self) -> bool {
        self.command.lock().expect("command lock").is_some()
    }

    // --- Triggers (one-way) ---

    pub fn trigger_slot(&self, column: u32, row: u32) {
        self.send(EngineRequest::TriggerSlot { column, row });
    }

    pub fn stop_slot(&self, column: u32, row: u32) {
        self.send(EngineRequest::StopSlot { column, row });
    }

    /// Play every clip in a scene row.
    pub fn trigger_scene(&self, row: u32) {
        self.send(EngineRequest::TriggerRow { row });
    }

    /// Stop every clip in a column.
    pub fn stop_column(&self, column: u32) {
        self.send(EngineRequest::StopColumn { column });
    }

    /// Stop every clip in the matrix.
    pub fn stop_all(&self) {
        self.send(EngineRequest::StopMatrix);
    }

    fn send(&self, request: EngineRequest) {
        let mut guard = self.command.lock().expect("command lock");
        let Some(stream) = guard.as_mut() else {
            warn!(target: "clip", "engine not connected, dropping {:?}", request);
            return;
        };
        if let Err(e) = write_message(stream, &request) {
            warn!(target: "clip", "command write failed ({}), reconnecting", e);
            // Drop the socket; the maintainer re-establishes it.
            *guard = None;
        }
    }

    /// Stop all threads and close every connection. Safe to call once;
    /// readers unwind on their next blocking-read return.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for socket in self.sockets.lock().expect("socket lock").drain(..) {
            let _ = socket.shutdown(Shutdown::Both);
        }
        *self.command.lock().expect("command lock") = None;
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        info!(target: "clip", "clip engine client stopped");
    }
}

impl Drop for ClipClient {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for socket in self.sockets.lock().expect("socket lock").drain(..) {
            let _ = socket.shutdown(Shutdown::Both);
        }
    }
}

struct StreamConfig {
    kind: StreamKind,
    addr: String,
    reconnect_delay: Duration,
}

fn register_socket(sockets: &Arc<Mutex<Vec<TcpStream>>>, stream: &TcpStream) {
    if let Ok(clone) = stream.try_clone() {
        sockets.lock().expect("socket lock").push(clone);
    }
}

fn command_maintainer(
    addr: String,
    command: Arc<Mutex<Option<TcpStream>>>,
    running: Arc<AtomicBool>,
    sockets: Arc<Mutex<Vec<TcpStream>>>,
) {
    let mut delay = RECONNECT_DELAY;
    while running.load(Ordering::Relaxed) {
        let connected = command.lock().expect("command lock").is_some();
        if connected {
            delay = RECONNECT_DELAY;
            sleep_interruptible(Duration::from_millis(500), &running);
            continue;
        }
        match TcpStream::connect(&addr) {
            Ok(stream) => {
                register_socket(&sockets, &stream);
                *command.lock().expect("command lock") = Some(stream);
                info!(target: "clip", "command channel connected to {}", addr);
                delay = RECONNECT_DELAY;
            }
            Err(e) => {
                debug!(target: "clip", "command connect failed: {}", e);
                sleep_interruptible(delay, &running);
                delay = (delay * 2).min(RECONNECT_DELAY_MAX);
            }
        }
    }
}

fn stream_worker(
    config: StreamConfig,
    grid: Arc<ClipGrid>,
    running: Arc<AtomicBool>,
    sockets: Arc<Mutex<Vec<TcpStream>>>,
) {
    let mut delay = config.reconnect_delay;
    while running.load(Ordering::Relaxed) {
        match TcpStream::connect(&config.addr) {
            Ok(stream) => {
                register_socket(&sockets, &stream);
                info!(target: "clip", "{:?} stream connected", config.kind);
                let result = run_session(stream, &config, &grid, &running);
                if config.kind == StreamKind::Slots {
                    grid.set_connected(false);
                }
                match result {
                    Ok(()) => debug!(target: "clip", "{:?} stream closed", config.kind),
                    Err(e) if running.load(Ordering::Relaxed) => {
                        warn!(target: "clip", "{:?} stream error: {}, reconnecting", config.kind, e)
                    }
                    Err(_) => {}
                }
                delay = config.reconnect_delay;
            }
            Err(e) => {
                debug!(target: "clip", "{:?} connect failed: {}", config.kind, e);
            }
        }
        if !running.load(Ordering::Relaxed) {
            break;
        }
        sleep_interruptible(delay, &running);
        delay = (delay * 2).min(RECONNECT_DELAY_MAX);
    }
    debug!(target: "clip", "{:?} stream thread exiting", config.kind);
}

/// One connected session: subscribe with a snapshot request, then apply
/// messages until the connection drops or shutdown is signaled.
fn run_session(
    stream: TcpStream,
    config: &StreamConfig,
    grid: &ClipGrid,
    running: &AtomicBool,
) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    write_message(
        &mut writer,
        &EngineRequest::Subscribe {
            stream: config.kind,
            snapshot: true,
        },
    )?;
    if config.kind == StreamKind::Slots {
        grid.set_connected(true);
    }

    let mut reader = BufReader::new(stream);
    loop {
        if !running.load(Ordering::Relaxed) {
            return Ok(());
        }
        let event: EngineEvent = read_message(&mut reader)?;
        match event {
            EngineEvent::SlotUpdates(updates) => apply_slot_updates(grid, updates),
            EngineEvent::MatrixUpdates(updates) => {
                if apply_matrix_updates(grid, updates) {
                    // Everything changed: ask for a fresh snapshot
                    // before trusting further incrementals.
                    write_message(
                        &mut writer,
                        &EngineRequest::Subscribe {
                            stream: config.kind,
                            snapshot: true,
                        },
                    )?;
                }
            }
            EngineEvent::Pong => {}
            EngineEvent::Shutdown => return Ok(()),
        }
    }
}

fn apply_slot_updates(grid: &ClipGrid, updates: Vec<SlotUpdate>) {
    for update in updates {
        let addr = SlotAddr::new(update.column, update.row);
        match update.update {
            SlotField::PlayState(wire) => {
                grid.set_slot_play_state(addr, wire.to_slot_state());
            }
            SlotField::PersistentData(data) => match parse_slot_document(&data) {
                Some((has_content, name)) => grid.set_slot_content(addr, has_content, name),
                None => debug!(target: "clip", "undecodable slot document for {:?}", addr),
            },
        }
    }
}

/// Apply a batch of matrix updates. Track lists land first so the id →
/// name map is as fresh as possible when the layout is applied (name
/// lookups themselves stay lazy). Returns true when the engine asked
/// for a full refetch.
fn apply_matrix_updates(grid: &ClipGrid, updates: Vec<MatrixUpdate>) -> bool {
    let mut needs_snapshot = false;

    for update in &updates {
        if let MatrixUpdate::TrackList(tracks) = update {
            grid.apply_track_list(
                tracks
                    .iter()
                    .map(|t| (t.id.clone(), t.name.clone()))
                    .collect(),
            );
        }
    }

    for update in updates {
        match update {
            MatrixUpdate::TrackList(_) => {}
            MatrixUpdate::Tempo(bpm) => grid.set_tempo(bpm),
            MatrixUpdate::CompletePersistentData(data) => match parse_matrix_document(&data) {
                Some(layout) => {
                    grid.apply_matrix_layout(layout.columns, layout.rows, layout.content)
                }
                None => debug!(target: "clip", "undecodable matrix document"),
            },
            MatrixUpdate::EverythingHasChanged => {
                grid.mark_full_refresh();
                needs_snapshot = true;
            }
        }
    }

    needs_snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{TrackRef, WirePlayState};
    use beltane_core::EventBus;
    use beltane_types::SlotPlayState;
    use std::net::TcpListener;
    use std::time::Instant;

    fn grid() -> Arc<ClipGrid> {
        let bus = EventBus::new();
        // The bus handle outlives the bus for publish purposes; events
        // are simply dropped once the receiver is gone.
        let grid = Arc::new(ClipGrid::new(bus.handle()));
        std::mem::forget(bus);
        grid
    }

    fn wait_until(timeout: Duration, mut pred: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if pred() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn slot_playing(column: u32, row: u32) -> EngineEvent {
        EngineEvent::SlotUpdates(vec![SlotUpdate {
            column,
            row,
            update: SlotField::PlayState(WirePlayState::Playing),
        }])
    }

    #[test]
    fn reconnect_requests_snapshot_before_incrementals() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let grid = grid();
        let running = Arc::new(AtomicBool::new(true));
        let sockets = Arc::new(Mutex::new(Vec::new()));

        let config = StreamConfig {
            kind: StreamKind::Slots,
            addr,
            reconnect_delay: Duration::from_millis(20),
        };
        let worker = {
            let grid = grid.clone();
            let running = running.clone();
            let sockets = sockets.clone();
            thread::spawn(move || stream_worker(config, grid, running, sockets))
        };

        // First session: must open with a snapshot subscription.
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let request: EngineRequest = read_message(&mut reader).unwrap();
        assert_eq!(
            request,
            EngineRequest::Subscribe {
                stream: StreamKind::Slots,
                snapshot: true
            }
        );
        let mut writer = stream.try_clone().unwrap();
        write_message(&mut writer, &slot_playing(1, 2)).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            grid.slot(SlotAddr::new(1, 2)).play_state == SlotPlayState::Playing
        }));
        assert!(!grid.is_stale());

        // Kill the connection: grid goes stale but keeps its contents.
        stream.shutdown(Shutdown::Both).unwrap();
        drop(stream);
        assert!(wait_until(Duration::from_secs(2), || grid.is_stale()));
        assert_eq!(
            grid.slot(SlotAddr::new(1, 2)).play_state,
            SlotPlayState::Playing
        );

        // Second session: a fresh snapshot subscription arrives before
        // any incremental is accepted.
        let (stream2, _) = listener.accept().unwrap();
        let mut reader2 = BufReader::new(stream2.try_clone().unwrap());
        let request: EngineRequest = read_message(&mut reader2).unwrap();
        assert_eq!(
            request,
            EngineRequest::Subscribe {
                stream: StreamKind::Slots,
                snapshot: true
            }
        );
        let mut writer2 = stream2.try_clone().unwrap();
        write_message(&mut writer2, &slot_playing(3, 4)).unwrap();
        assert!(wait_until(Duration::from_secs(2), || {
            grid.slot(SlotAddr::new(3, 4)).play_state == SlotPlayState::Playing
        }));

        running.store(false, Ordering::Relaxed);
        for socket in sockets.lock().unwrap().drain(..) {
            let _ = socket.shutdown(Shutdown::Both);
        }
        drop(stream2);
        worker.join().unwrap();
    }

    #[test]
    fn matrix_batch_resolves_names_regardless_of_order() {
        let grid = grid();
        let doc = r#"{"columns": [{"clip_play_settings": {"track": "t-9"}, "slots": []}], "rows": []}"#;
        // Persistent data listed before the track list in the same batch.
        let needs_snapshot = apply_matrix_updates(
            &grid,
            vec![
                MatrixUpdate::CompletePersistentData(doc.to_string()),
                MatrixUpdate::TrackList(vec![TrackRef {
                    id: "t-9".to_string(),
                    name: "Keys".to_string(),
                }]),
            ],
        );
        assert!(!needs_snapshot);
        assert_eq!(grid.column_name(0), "Keys");
    }

    #[test]
    fn everything_changed_requests_snapshot() {
        let grid = grid();
        assert!(apply_matrix_updates(
            &grid,
            vec![MatrixUpdate::EverythingHasChanged]
        ));
    }

    #[test]
    fn triggers_are_one_way_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let client = ClipClient::new(&addr, grid());
        client.connect_command().unwrap();
        let (server, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(server);

        client.trigger_slot(5, 2);
        let request: EngineRequest = read_message(&mut reader).unwrap();
        assert_eq!(request, EngineRequest::TriggerSlot { column: 5, row: 2 });

        client.trigger_scene(3);
        let request: EngineRequest = read_message(&mut reader).unwrap();
        assert_eq!(request, EngineRequest::TriggerRow { row: 3 });

        client.stop_all();
        let request: EngineRequest = read_message(&mut reader).unwrap();
        assert_eq!(request, EngineRequest::StopMatrix);
    }

    #[test]
    fn trigger_without_connection_is_dropped() {
        let client = ClipClient::new("127.0.0.1:1", grid());
        // No connection: must not panic or block.
        client.trigger_slot(0, 0);
        assert!(!client.is_command_connected());
    }
}

fn sleep_interruptible(total: Duration, running: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() {
        if !running.load(Ordering::Relaxed) {
            return;
        }
        let chunk = remaining.min(Duration::from_millis(100));
        thread::sleep(chunk);
        remaining -= chunk;
    }
}
