//! `narada streams ...`

use std::time::Duration;

use narada_core::{StreamEntry, StreamType};
use narada_runtime::{NaradaRuntime, probe_stream};

use crate::bootstrap::CliContext;
use crate::commands::StreamCommand;
use crate::error::CliError;
use crate::presentation::{print_separator, truncate_string};

pub async fn execute(ctx: &CliContext, command: StreamCommand) -> Result<(), CliError> {
    let runtime = ctx.runtime();
    let streams = runtime.streams();
    match command {
        StreamCommand::List { enabled } => {
            let entries = if enabled {
                streams.enabled()?
            } else {
                streams.load()?
            };
            print_table(&entries);
        }
        StreamCommand::Add {
            id,
            name,
            display_name,
            stream_type,
            url,
            disabled,
        } => {
            let stream_type = StreamType::from(stream_type);
            let url = match url {
                Some(url) => url,
                None => default_url(runtime, &name, stream_type)?,
            };
            let entry = streams.add(StreamEntry {
                id,
                display_name: if display_name.is_empty() {
                    name.clone()
                } else {
                    display_name
                },
                name,
                stream_type,
                url,
                enabled: !disabled,
                position: 0,
            })?;
            println!("Added stream {} at position {}: {}", entry.id, entry.position, entry.url);
        }
        StreamCommand::Toggle { id, off } => {
            let mut entry = streams.get(&id)?;
            entry.enabled = !off;
            streams.update(entry)?;
            println!("Stream {id} {}", if off { "disabled" } else { "enabled" });
        }
        StreamCommand::Delete { id } => {
            streams.delete(&id)?;
            println!("Deleted stream {id}");
        }
        StreamCommand::Urls { name } => {
            let endpoints = runtime.stream_endpoints(&name);
            println!("HLS   {}", endpoints.hls);
            println!("RTSP  {}", endpoints.rtsp);
            println!("RTMP  {}", endpoints.rtmp);
        }
        StreamCommand::Probe { url, timeout } => {
            let report = probe_stream(&url, Duration::from_secs(timeout)).await?;
            println!("{url}: {}", report.message);
            if !report.success {
                return Err(CliError::Service(report.message));
            }
        }
    }
    Ok(())
}

fn default_url(
    runtime: &NaradaRuntime,
    name: &str,
    stream_type: StreamType,
) -> Result<String, CliError> {
    let endpoints = runtime.stream_endpoints(name);
    match stream_type {
        StreamType::Hls => Ok(endpoints.hls),
        StreamType::Rtsp => Ok(endpoints.rtsp),
        StreamType::Rtmp => Ok(endpoints.rtmp),
        StreamType::Webrtc => Err(CliError::Arguments(
            "--url is required for webrtc streams".to_string(),
        )),
    }
}

fn type_label(stream_type: StreamType) -> &'static str {
    match stream_type {
        StreamType::Hls => "hls",
        StreamType::Rtsp => "rtsp",
        StreamType::Rtmp => "rtmp",
        StreamType::Webrtc => "webrtc",
    }
}

fn print_table(entries: &[StreamEntry]) {
    println!(
        "{:<4} {:<8} {:<16} {:<14} {:<3} URL",
        "POS", "ID", "NAME", "DISPLAY", "ON"
    );
    print_separator(96);
    for entry in entries {
        println!(
            "{:<4} {:<8} {:<16} {:<14} {:<3} {} ({})",
            entry.position,
            truncate_string(&entry.id, 8),
            truncate_string(&entry.name, 16),
            truncate_string(&entry.display_name, 14),
            if entry.enabled { "yes" } else { "no" },
            entry.url,
            type_label(entry.stream_type),
        );
    }
}
