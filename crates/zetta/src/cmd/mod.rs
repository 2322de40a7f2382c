use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use zetta_frame::{FrameConfig, Integrity, PacketType, DEFAULT_MAX_PAYLOAD};

use crate::exit::{io_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod endpoint;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one frame and print its wire bytes.
    Encode(EncodeArgs),
    /// Decode frames from hex, a file or stdin.
    Decode(DecodeArgs),
    /// Send frames to a socket or device.
    Send(SendArgs),
    /// Listen and print received frames.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Integrity functions selectable from the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum IntegrityKind {
    /// CRC-8, polynomial 0x07, initial value 0x00.
    Crc8,
    /// CRC-8, polynomial 0x07, initial value 0xFF, as used by host tools
    /// that preset the register.
    #[value(name = "crc8-ff")]
    Crc8Ff,
    /// CRC-32/MPEG-2 as computed by MCU CRC peripherals, low byte on the wire.
    #[value(name = "crc32-mpeg2")]
    Crc32Mpeg2,
}

impl Integrity for IntegrityKind {
    fn compute(&self, data: &[u8]) -> u32 {
        match self {
            IntegrityKind::Crc8 => zetta_frame::Crc8.compute(data),
            IntegrityKind::Crc8Ff => zetta_frame::Crc8Ff.compute(data),
            IntegrityKind::Crc32Mpeg2 => zetta_frame::Crc32Mpeg2.compute(data),
        }
    }
}

/// Wire format options shared by every frame-handling command.
#[derive(Args, Debug, Clone)]
pub struct WireArgs {
    /// Start delimiter (decimal or 0x-prefixed hex).
    #[arg(long, value_name = "BYTE", default_value = "0xAA", value_parser = parse_byte)]
    pub start_byte: u8,
    /// Stop delimiter (decimal or 0x-prefixed hex).
    #[arg(long, value_name = "BYTE", default_value = "0xBC", value_parser = parse_byte)]
    pub stop_byte: u8,
    /// Maximum payload length in bytes.
    #[arg(long, value_name = "LEN", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: u8,
    /// Send a zero integrity byte and do not verify received ones.
    #[arg(long)]
    pub no_crc: bool,
    /// Integrity function.
    #[arg(long, value_enum, default_value = "crc8")]
    pub integrity: IntegrityKind,
    /// Let a rejected start delimiter open a new frame.
    #[arg(long)]
    pub rescan: bool,
}

impl WireArgs {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            start_byte: self.start_byte,
            stop_byte: self.stop_byte,
            max_payload_size: self.max_payload,
            crc_enabled: !self.no_crc,
            rescan_rejected_byte: self.rescan,
        }
    }
}

/// Payload source for outbound frames. No source means an empty payload.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// UTF-8 string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex payload, e.g. "0102" or "01 02".
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(text) = &self.hex {
            return parse_hex(text).map_err(|err| CliError::new(USAGE, format!("--hex: {err}")));
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        Ok(Vec::new())
    }
}

/// Where the link's bytes come from and go to.
#[derive(Args, Debug, Clone)]
pub struct EndpointArgs {
    /// Unix socket path, TCP address with --tcp, or device path with --device.
    pub target: String,
    /// Treat TARGET as a TCP address (host:port).
    #[arg(long, conflicts_with = "device")]
    pub tcp: bool,
    /// Treat TARGET as a serial device or file opened read/write.
    #[arg(long)]
    pub device: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Packet type: ack, publish, subscribe or a number.
    #[arg(
        long = "type",
        short = 't',
        value_name = "TYPE",
        default_value = "publish",
        value_parser = parse_type
    )]
    pub frame_type: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire bytes as hex. Reads stdin when neither --hex nor --file is given.
    #[arg(long, conflicts_with = "file")]
    pub hex: Option<String>,
    /// Read wire bytes from file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Fail if any byte was rejected, not only when nothing decodes.
    #[arg(long)]
    pub strict: bool,
    #[command(flatten)]
    pub wire: WireArgs,
}

impl DecodeArgs {
    pub fn input(&self) -> CliResult<Vec<u8>> {
        if let Some(text) = &self.hex {
            return parse_hex(text).map_err(|err| CliError::new(USAGE, format!("--hex: {err}")));
        }
        if let Some(path) = &self.file {
            return fs::read(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
        }
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .map_err(|err| io_error("failed reading stdin", err))?;
        Ok(bytes)
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Packet type: ack, publish, subscribe or a number.
    #[arg(
        long = "type",
        short = 't',
        value_name = "TYPE",
        default_value = "publish",
        value_parser = parse_type
    )]
    pub frame_type: u8,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Send the frame this many times.
    #[arg(long, default_value_t = 1)]
    pub count: usize,
    /// Wait for one frame in reply and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the reply (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub wait_timeout: Duration,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,
    /// Only print frames of these types (comma-separated).
    #[arg(long, value_delimiter = ',', value_parser = parse_type)]
    pub types: Option<Vec<u8>>,
    /// Exit after receiving N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Reply to every printed frame with an empty ACK frame.
    #[arg(long)]
    pub ack: bool,
    /// Discard a partial frame after this much silence (e.g. 100ms).
    #[arg(long, value_parser = parse_duration)]
    pub idle_timeout: Option<Duration>,
    /// Print link counters when the listener exits.
    #[arg(long)]
    pub stats: bool,
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a byte given as decimal or `0x`-prefixed hex.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u8::from_str_radix(digits, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("expected a byte value (0-255 or 0x00-0xff), got {input:?}"))
}

/// Parse a packet type by name or number.
pub fn parse_type(input: &str) -> Result<u8, String> {
    let named = [PacketType::Ack, PacketType::Publish, PacketType::Subscribe]
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(input.trim()));
    match named {
        Some(kind) => Ok(kind.as_u8()),
        None => parse_byte(input),
    }
}

/// Parse hex, ignoring whitespace, `:` and `,` separators.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != ',')
        .collect();
    let compact = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(&compact);
    hex::decode(compact)
}

/// Parse durations such as `5s`, `250ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
