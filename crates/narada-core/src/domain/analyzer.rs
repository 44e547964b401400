//! Analyzer tuning parameters and their command-line rendering.
//!
//! Every field is optional. An absent field is never forwarded, so the
//! analyzer's own default applies; a present field is forwarded exactly once.

use serde::{Deserialize, Serialize};

/// User-adjustable parameters forwarded to the analyzer as flags.
///
/// Field names match the analyzer's flag names and the persisted preset
/// documents, so they stay `snake_case` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Detection mode (`standard`, `multiscale`, `traffic`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Half-precision inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fp16: Option<bool>,
    /// Input downscale factor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Detection confidence threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// GPU selector, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_id: Option<String>,
    /// Frame queue depth.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiscale: Option<bool>,
    /// Run detection every N frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detect_interval: Option<u32>,
    /// Tracker drift tolerance in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_drift: Option<f64>,
    /// Comma-separated multiscale factors, e.g. `0.75,1.0,1.25`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_scales: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms_nms_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_thickness: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_fps: Option<u32>,
    /// Output bitrate, e.g. `5000k`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_bitrate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_preset: Option<String>,
    /// Output width; zero means "keep source".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_width: Option<u32>,
    /// Output height; zero means "keep source".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_height: Option<u32>,
    /// Optional recording sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    /// Open a local preview window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
}

/// Fixed endpoints the analyzer reads from and publishes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerEndpoints {
    pub source: String,
    pub stream_out: String,
}

impl AnalyzerConfig {
    /// Render the config flags, in the order the analyzer documents them.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = ArgList::default();

        args.text("--mode", self.mode.as_deref());
        args.switch("--fp16", self.fp16);
        args.value("--scale", self.scale);
        args.value("--threshold", self.threshold);
        args.text("--gpu_id", self.gpu_id.as_deref());
        args.value("--queue_size", self.queue_size);
        args.toggle("--track", self.track);
        args.toggle("--multiscale", self.multiscale);
        args.value("--detect_interval", self.detect_interval);
        args.value("--max_drift", self.max_drift);
        args.text("--ms_scales", self.ms_scales.as_deref());
        args.value("--ms_threshold", self.ms_threshold);
        args.value("--ms_nms_radius", self.ms_nms_radius);
        args.text("--overlay_style", self.overlay_style.as_deref());
        args.value("--box_size", self.box_size);
        args.value("--box_thickness", self.box_thickness);
        args.value("--stream_fps", self.stream_fps);
        args.text("--stream_bitrate", self.stream_bitrate.as_deref());
        args.text("--stream_codec", self.stream_codec.as_deref());
        args.text("--stream_preset", self.stream_preset.as_deref());
        args.value("--stream_width", self.stream_width.filter(|w| *w > 0));
        args.value("--stream_height", self.stream_height.filter(|h| *h > 0));
        args.text("--out", self.out.as_deref());
        args.switch("--show", self.show);

        args.0
    }

    /// Full analyzer argument list: script, model, endpoints, then config flags.
    pub fn launch_args(&self, script: &str, model: &str, endpoints: &AnalyzerEndpoints) -> Vec<String> {
        let mut args = vec![
            script.to_string(),
            "--pre".to_string(),
            model.to_string(),
            "--source".to_string(),
            endpoints.source.clone(),
            "--stream_out".to_string(),
            endpoints.stream_out.clone(),
            "--json_output".to_string(),
        ];
        args.extend(self.to_args());
        args
    }
}

#[derive(Default)]
struct ArgList(Vec<String>);

impl ArgList {
    fn value<T: ToString>(&mut self, flag: &str, value: Option<T>) {
        if let Some(value) = value {
            self.0.push(flag.to_string());
            self.0.push(value.to_string());
        }
    }

    fn text(&mut self, flag: &str, value: Option<&str>) {
        self.value(flag, value.filter(|v| !v.is_empty()));
    }

    /// Bare flag, present only when enabled.
    fn switch(&mut self, flag: &str, enabled: Option<bool>) {
        if enabled == Some(true) {
            self.0.push(flag.to_string());
        }
    }

    /// Python-style boolean value.
    fn toggle(&mut self, flag: &str, value: Option<bool>) {
        self.value(flag, value.map(|v| if v { "True" } else { "False" }));
    }
}
