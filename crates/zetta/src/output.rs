use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use zetta_frame::{packet_type, Frame};
use zetta_link::LinkStats;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    event: &'static str,
    frame_type: u8,
    type_name: &'static str,
    len: usize,
    crc: String,
    payload: String,
    payload_hex: String,
    source: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct EncodedOutput {
    event: &'static str,
    frame_type: u8,
    type_name: &'static str,
    len: usize,
    crc: String,
    wire_size: usize,
    wire: String,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    event: &'static str,
    source: &'a str,
    #[serde(flatten)]
    stats: &'a LinkStats,
}

pub fn print_frame(frame: &Frame, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                event: "frame-received",
                frame_type: frame.frame_type(),
                type_name: packet_type::type_name(frame.frame_type()),
                len: frame.len(),
                crc: byte_hex(frame.crc()),
                payload: payload_preview(frame.payload()),
                payload_hex: hex::encode(frame.payload()),
                source,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "LEN", "CRC", "SOURCE", "PAYLOAD"])
                .add_row(vec![
                    type_label(frame.frame_type()),
                    frame.len().to_string(),
                    byte_hex(frame.crc()),
                    source.to_string(),
                    payload_preview(frame.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type={} len={} crc={} source={} payload={}",
                type_label(frame.frame_type()),
                frame.len(),
                byte_hex(frame.crc()),
                source,
                payload_preview(frame.payload())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.payload());
        }
    }
}

/// Print an encoded frame; `wire` holds its bytes in transmission order.
pub fn print_encoded(frame: &Frame, wire: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EncodedOutput {
                event: "frame-encoded",
                frame_type: frame.frame_type(),
                type_name: packet_type::type_name(frame.frame_type()),
                len: frame.len(),
                crc: byte_hex(frame.crc()),
                wire_size: wire.len(),
                wire: hex::encode(wire),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "LEN", "CRC", "WIRE"])
                .add_row(vec![
                    type_label(frame.frame_type()),
                    frame.len().to_string(),
                    byte_hex(frame.crc()),
                    spaced_hex(wire),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", spaced_hex(wire)),
        OutputFormat::Raw => print_raw(wire),
    }
}

pub fn print_stats(stats: &LinkStats, source: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatsOutput {
            event: "link-stats",
            source,
            stats,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COUNTER", "VALUE"]);
            for (name, value) in stats_rows(stats) {
                table.add_row(vec![name.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let line: Vec<String> = stats_rows(stats)
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!("{}", line.join(" "));
        }
        // Raw output carries payload bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Uppercase hex with a space between bytes, e.g. `AA 01 02`.
pub fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn stats_rows(stats: &LinkStats) -> [(&'static str, u64); 8] {
    [
        ("frames_sent", stats.frames_sent),
        ("frames_received", stats.frames_received),
        ("bytes_received", stats.bytes_received),
        ("noise_bytes", stats.noise_bytes),
        ("crc_errors", stats.crc_errors),
        ("frame_errors", stats.frame_errors),
        ("tx_errors", stats.tx_errors),
        ("timeouts", stats.timeouts),
    ]
}

fn type_label(frame_type: u8) -> String {
    format!("{} ({})", frame_type, packet_type::type_name(frame_type))
}

fn byte_hex(byte: u8) -> String {
    format!("{byte:#04x}")
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
