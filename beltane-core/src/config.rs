//! TOML configuration loading.
//!
//! Defaults are embedded at build time; a user config at
//! `~/.config/beltane/config.toml` merges over them field-wise, and
//! `BELTANE_*` environment variables override both. A malformed user
//! config is logged and ignored rather than refusing to start.

use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    osc: OscConfig,
    #[serde(default)]
    clip_engine: ClipEngineConfig,
    #[serde(default)]
    display: DisplayConfig,
    #[serde(default)]
    input: InputConfig,
}

#[derive(Deserialize, Default)]
struct OscConfig {
    daw_ip: Option<String>,
    daw_port: Option<u16>,
    listen_port: Option<u16>,
}

#[derive(Deserialize, Default)]
struct ClipEngineConfig {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Deserialize, Default)]
struct DisplayConfig {
    fps: Option<u32>,
}

#[derive(Deserialize, Default)]
struct InputConfig {
    volume_step: Option<f32>,
    pan_step: Option<f32>,
    param_step: Option<f32>,
}

pub struct Config {
    osc: OscConfig,
    clip_engine: ClipEngineConfig,
    display: DisplayConfig,
    input: InputConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        apply_env_overrides(&mut base);

        Config {
            osc: base.osc,
            clip_engine: base.clip_engine,
            display: base.display,
            input: base.input,
        }
    }

    /// Parse from a TOML string (defaults merged underneath). Used by
    /// tests; `load` is the production path.
    pub fn from_toml(contents: &str) -> Result<Self, String> {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");
        let user: ConfigFile = toml::from_str(contents).map_err(|e| e.to_string())?;
        merge(&mut base, user);
        Ok(Config {
            osc: base.osc,
            clip_engine: base.clip_engine,
            display: base.display,
            input: base.input,
        })
    }

    pub fn daw_addr(&self) -> String {
        format!(
            "{}:{}",
            self.osc.daw_ip.as_deref().unwrap_or("127.0.0.1"),
            self.osc.daw_port.unwrap_or(8000)
        )
    }

    pub fn listen_port(&self) -> u16 {
        self.osc.listen_port.unwrap_or(9000)
    }

    pub fn clip_engine_addr(&self) -> String {
        format!(
            "{}:{}",
            self.clip_engine.host.as_deref().unwrap_or("127.0.0.1"),
            self.clip_engine.port.unwrap_or(7700)
        )
    }

    /// Display refresh rate, clamped to something the hardware can do.
    pub fn fps(&self) -> u32 {
        self.display.fps.unwrap_or(30).clamp(1, 60)
    }

    pub fn volume_step(&self) -> f32 {
        self.input.volume_step.unwrap_or(0.015)
    }

    pub fn pan_step(&self) -> f32 {
        self.input.pan_step.unwrap_or(0.02)
    }

    pub fn param_step(&self) -> f32 {
        self.input.param_step.unwrap_or(0.01)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("beltane").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.osc.daw_ip.is_some() {
        base.osc.daw_ip = user.osc.daw_ip;
    }
    if user.osc.daw_port.is_some() {
        base.osc.daw_port = user.osc.daw_port;
    }
    if user.osc.listen_port.is_some() {
        base.osc.listen_port = user.osc.listen_port;
    }
    if user.clip_engine.host.is_some() {
        base.clip_engine.host = user.clip_engine.host;
    }
    if user.clip_engine.port.is_some() {
        base.clip_engine.port = user.clip_engine.port;
    }
    if user.display.fps.is_some() {
        base.display.fps = user.display.fps;
    }
    if user.input.volume_step.is_some() {
        base.input.volume_step = user.input.volume_step;
    }
    if user.input.pan_step.is_some() {
        base.input.pan_step = user.input.pan_step;
    }
    if user.input.param_step.is_some() {
        base.input.param_step = user.input.param_step;
    }
}

fn apply_env_overrides(config: &mut ConfigFile) {
    if let Ok(ip) = std::env::var("BELTANE_OSC_IP") {
        config.osc.daw_ip = Some(ip);
    }
    if let Some(port) = env_port("BELTANE_OSC_PORT") {
        config.osc.daw_port = Some(port);
    }
    if let Some(port) = env_port("BELTANE_LISTEN_PORT") {
        config.osc.listen_port = Some(port);
    }
    if let Ok(host) = std::env::var("BELTANE_CLIP_HOST") {
        config.clip_engine.host = Some(host);
    }
    if let Some(port) = env_port("BELTANE_CLIP_PORT") {
        config.clip_engine.port = Some(port);
    }
    if let Ok(fps) = std::env::var("BELTANE_FPS") {
        match fps.parse() {
            Ok(fps) => config.display.fps = Some(fps),
            Err(_) => log::warn!(target: "config", "ignoring non-numeric BELTANE_FPS={}", fps),
        }
    }
}

fn env_port(name: &str) -> Option<u16> {
    let value = std::env::var(name).ok()?;
    match value.parse() {
        Ok(port) => Some(port),
        Err(_) => {
            log::warn!(target: "config", "ignoring non-numeric {}={}", name, value);
            None
        }
    }
}
