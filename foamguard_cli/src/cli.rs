//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use foamguard_core::CommandChannel;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Config path used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "etc/foamguard.toml";

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "foamguard", version, about = "Reservoir foam and level pump controller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Log and report as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Inbound command channel, as named on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ChannelArg {
    /// JSON body of the local web API
    Web,
    /// JSON control frame of the push channel
    Push,
    /// Text line from the messaging bot
    Bot,
    /// Text line from the operator console
    Console,
}

impl From<ChannelArg> for CommandChannel {
    fn from(c: ChannelArg) -> Self {
        match c {
            ChannelArg::Web => CommandChannel::Web,
            ChannelArg::Push => CommandChannel::Push,
            ChannelArg::Bot => CommandChannel::Bot,
            ChannelArg::Console => CommandChannel::Console,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop; stdin lines are console commands
    #[command(
        long_about = "Run the control loop against the configured backend.\n\nEach stdin line is a console command (e.g. `pump.on`, `threshold.set 70`, `help`). The lines `shutdown` and `resume` act as the panel shutdown button.\n\nPush snapshots are written to stdout as JSON lines. External log rows go to channels.log_csv when set. Messaging reports go to the log. With --listen or web.listen set, `GET /status` and `POST /control` feed the web channel."
    )]
    Run {
        /// Stop after this many milliseconds (default: until Ctrl-C)
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
        /// Serve the local web API on this address (overrides web.listen)
        #[arg(long, value_name = "ADDR")]
        listen: Option<std::net::SocketAddr>,
    },
    /// Normalize one payload and print the canonical command
    Normalize {
        /// Channel the payload arrived on
        #[arg(long, value_enum)]
        channel: ChannelArg,
        /// Raw payload (JSON for web/push, text for bot/console)
        payload: String,
    },
    /// Validate config, build the backend and take one sample
    SelfCheck,
}
