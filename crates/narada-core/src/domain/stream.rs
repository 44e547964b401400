//! Viewer stream entries and relay endpoint URLs.

use serde::{Deserialize, Serialize};

/// Transport a viewer uses to play a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamType {
    Hls,
    Rtsp,
    Rtmp,
    Webrtc,
}

/// One configured stream in the control panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEntry {
    pub id: String,
    /// Relay path name, e.g. `drone`.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(rename = "type")]
    pub stream_type: StreamType,
    pub url: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub position: u32,
}

const fn enabled_by_default() -> bool {
    true
}

/// Streams seeded into an empty configuration.
pub fn default_streams(hls_base: &str) -> Vec<StreamEntry> {
    vec![StreamEntry {
        id: "1".to_string(),
        name: "drone".to_string(),
        display_name: "Drone Live".to_string(),
        stream_type: StreamType::Hls,
        url: StreamEndpoints::hls_url(hls_base, "drone"),
        enabled: true,
        position: 0,
    }]
}

/// Playback URLs the relay serves for one stream name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEndpoints {
    pub hls: String,
    pub rtsp: String,
    pub rtmp: String,
}

impl StreamEndpoints {
    /// Derive every endpoint for `name` from the relay base URLs.
    pub fn for_stream(name: &str, hls_base: &str, rtsp_base: &str, rtmp_base: &str) -> Self {
        Self {
            hls: Self::hls_url(hls_base, name),
            rtsp: join(rtsp_base, name),
            rtmp: join(rtmp_base, name),
        }
    }

    fn hls_url(base: &str, name: &str) -> String {
        format!("{}/index.m3u8", join(base, name))
    }
}

fn join(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}
