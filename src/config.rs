// src/config.rs

use crate::error::ConfigError;
use serde::Deserialize;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 8050;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Track list compiled into the binary.
static BUILTIN_TRACKS_YAML: &str = include_str!("../tracks.yaml");

/// One survey track: its legend label and the wide CSV it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackSource {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TrackManifest {
    tracks: Vec<TrackSource>,
}

/// Parse a `tracks:` YAML document, keeping the listed order.
pub fn parse_tracks(yaml: &str) -> Result<Vec<TrackSource>, ConfigError> {
    let manifest: TrackManifest = serde_yaml::from_str(yaml)?;
    if manifest.tracks.is_empty() {
        return Err(ConfigError::NoTracks);
    }
    Ok(manifest.tracks)
}

pub fn builtin_tracks() -> Result<Vec<TrackSource>, ConfigError> {
    parse_tracks(BUILTIN_TRACKS_YAML)
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    pub debug: bool,
}

impl Settings {
    pub fn from_env(debug: bool) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), debug)
    }

    /// Build settings from an arbitrary variable source; `PORT` is the only key read.
    pub fn from_lookup<F>(lookup: F, debug: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            host: DEFAULT_HOST,
            port,
            debug,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
