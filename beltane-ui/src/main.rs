//! Beltane — grid-controller bridge for a DAW and clip engine.
//!
//! A single long-running foreground process: connects the surface,
//! starts the OSC feedback listener and the clip-engine streams, and
//! runs the cooperative control loop that dispatches input, reacts to
//! state changes, and renders the display at a fixed cadence.

mod draw;
mod global;
mod modes;

use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use beltane_core::{ClipGrid, Config, DawState, EventBus, ScaleState};
use beltane_net::osc::Steps;
use beltane_net::{ClipClient, FeedbackListener, OscClient};
use beltane_surface::{
    ButtonLeds, DisplayFrame, DisplayLink, NoGlyphs, NullDisplayLink, PadGrid, Surface,
};
use beltane_types::{ClipChange, Event, StateChange, Topic};

use global::GlobalState;
use modes::{Ctx, ModeController, RenderCtx};

/// Cleared by the signal handler; every loop checks it.
static RUNNING: AtomicBool = AtomicBool::new(true);

#[cfg(unix)]
fn install_signal_handlers() {
    extern "C" fn handle(_sig: libc::c_int) {
        RUNNING.store(false, Ordering::Relaxed);
    }
    let handler: extern "C" fn(libc::c_int) = handle;
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        libc::signal(libc::SIGTERM, handler as libc::sighandler_t);
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

fn init_logging(verbose: bool) {
    use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("beltane")
        .join("beltane.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .unwrap_or_else(|_| File::create("/tmp/beltane.log").expect("Cannot create log file"));

    WriteLogger::init(log_level, LogConfig::default(), log_file)
        .expect("Failed to initialize logger");

    info!("beltane starting (log level: {:?})", log_level);
}

fn fatal(message: &str) -> ! {
    eprintln!("beltane: {}", message);
    log::error!("{}", message);
    std::process::exit(1);
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);
    install_signal_handlers();

    let config = Config::load();

    let bus = EventBus::new();
    let state = Arc::new(DawState::new(bus.handle()));
    let grid = Arc::new(ClipGrid::new(bus.handle()));

    // Connection transitions are worth a log line regardless of mode.
    bus.subscribe(Topic::ClipStateChanged, "clip-status", |event| {
        if let Event::ClipStateChanged(ClipChange::Connection { connected }) = event {
            if *connected {
                info!("clip engine online");
            } else {
                warn!("clip engine offline — session view goes stale");
            }
        }
    });

    // Outbound DAW commands.
    let steps = Steps {
        volume: config.volume_step(),
        pan: config.pan_step(),
        param: config.param_step(),
    };
    let daw = match OscClient::new(&config.daw_addr(), steps) {
        Ok(client) => client,
        Err(e) => fatal(&format!("could not open OSC socket: {}", e)),
    };

    // Inbound DAW feedback. A bound port is a hard requirement.
    let mut feedback = match FeedbackListener::start(config.listen_port(), state.clone()) {
        Ok(listener) => listener,
        Err(e) => fatal(&format!(
            "could not bind feedback port {}: {}",
            config.listen_port(),
            e
        )),
    };

    // Clip engine streams reconnect on their own; a missing engine just
    // leaves session mode empty.
    let mut clips = ClipClient::new(&config.clip_engine_addr(), grid.clone());
    clips.start();

    // The surface is required at startup.
    let surface = match Surface::connect(bus.handle()) {
        Ok(surface) => surface,
        Err(e) => fatal(&e),
    };

    let mut pads = PadGrid::new(surface.sink());
    let mut leds = ButtonLeds::new(surface.sink());
    let mut scale = ScaleState::default();
    leds.init_defaults();

    let mut controller = ModeController::new();
    let mut globals = GlobalState::default();

    {
        let mut ctx = Ctx {
            state: &state,
            grid: &grid,
            daw: &daw,
            clips: &clips,
            pads: &mut pads,
            leds: &mut leds,
            scale: &mut scale,
        };
        controller.enter_initial(&mut ctx);
        let transport = state.transport();
        ctx.leds
            .set_transport_state(transport.playing, transport.recording);
    }

    // Display pipeline. The USB transport is an external collaborator;
    // without one, frames are composed and dropped.
    let mut link: Box<dyn DisplayLink> = Box::new(NullDisplayLink);
    let glyphs = NoGlyphs;
    let mut frame = DisplayFrame::new();
    let frame_interval = Duration::from_millis(1000 / config.fps() as u64);
    let mut last_render = Instant::now() - frame_interval;

    info!(
        "ready — OSC to {}, feedback on :{}, clip engine at {}, {} fps",
        daw.daw_addr(),
        feedback.port(),
        config.clip_engine_addr(),
        config.fps()
    );

    while RUNNING.load(Ordering::Relaxed) {
        // Dispatch a batch of pending bus events.
        let events = bus.poll(Duration::from_millis(2));
        if !events.is_empty() {
            let mut ctx = Ctx {
                state: &state,
                grid: &grid,
                daw: &daw,
                clips: &clips,
                pads: &mut pads,
                leds: &mut leds,
                scale: &mut scale,
            };
            for event in &events {
                dispatch_event(event, &mut controller, &mut globals, &mut ctx);
            }
        }

        // Fixed-cadence render tick.
        if last_render.elapsed() >= frame_interval {
            last_render = Instant::now();
            frame.clear(draw::BG);
            let render_ctx = RenderCtx {
                state: &state,
                grid: &grid,
                scale: &scale,
                glyphs: &glyphs,
            };
            controller.render(&render_ctx, &mut frame);
            link.push_frame(&frame.encode());
        }
    }

    info!("shutting down");

    // Stop producers before tearing down outputs, so nothing writes
    // into a half-dead runtime. Input first, then the listeners.
    drop(surface);
    feedback.stop();
    clips.stop();

    // Leave the hardware blanked.
    pads.invalidate();
    pads.clear();
    leds.clear_all();
    frame.clear((0, 0, 0));
    link.push_frame(&frame.encode());

    info!("shutdown complete");
}

fn dispatch_event(
    event: &Event,
    controller: &mut ModeController,
    globals: &mut GlobalState,
    ctx: &mut Ctx,
) {
    match event {
        Event::ButtonPressed { button } => {
            if global::handle_button(globals, controller, ctx, *button) {
                return;
            }
            if !controller.on_button(ctx, *button) {
                debug!("unhandled button: {:?}", button);
            }
        }
        Event::ButtonReleased { button } => {
            global::handle_button_released(globals, *button);
        }
        Event::PadPressed { row, col, velocity } => {
            controller.on_pad_pressed(ctx, *row, *col, *velocity);
        }
        Event::PadReleased { row, col } => {
            controller.on_pad_released(ctx, *row, *col);
        }
        Event::Aftertouch { row, col, pressure } => {
            controller.on_aftertouch(ctx, *row, *col, *pressure);
        }
        Event::ChannelPressure { pressure } => {
            ctx.daw.channel_pressure(0, *pressure);
        }
        Event::EncoderRotated { encoder, delta } => {
            controller.on_encoder(ctx, *encoder, *delta);
        }
        Event::Touchstrip { value } => {
            // 14-bit strip position → normalized pitch bend
            ctx.daw.pitch_bend(0, *value as f32 / 16383.0);
        }
        Event::StateChanged(change) => {
            // Transport LEDs follow playback in every mode.
            if matches!(change, StateChange::Transport) {
                let transport = ctx.state.transport();
                ctx.leds
                    .set_transport_state(transport.playing, transport.recording);
            }
            controller.on_state_changed(ctx, change);
        }
        Event::ClipStateChanged(change) => {
            controller.on_clip_changed(ctx, change);
        }
    }
}
