use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the configured endpoint until interrupted
    Run {
        #[arg(long, help = "Connector properties file")]
        config: PathBuf,

        #[arg(long, help = "Log directory, defaults to ~/.httpsource/state")]
        state_dir: Option<PathBuf>,
    },
    /// Check a configuration without polling
    Validate {
        #[arg(long, help = "Connector properties file")]
        config: PathBuf,
    },
    /// Inspect or reset committed offsets
    Offset {
        #[command(subcommand)]
        command: OffsetCommand,
    },
}

#[derive(Subcommand)]
pub enum OffsetCommand {
    Show {
        #[arg(long, help = "Connector properties file")]
        config: PathBuf,

        #[arg(long, help = "Log directory, defaults to ~/.httpsource/state")]
        state_dir: Option<PathBuf>,

        #[arg(long, help = "Print offsets as JSON instead of a table")]
        json: bool,
    },
    /// Forget the committed offset of a worker so it restarts from the
    /// configured initial offset
    Reset {
        #[arg(long, help = "Connector properties file")]
        config: PathBuf,

        #[arg(long, help = "Log directory, defaults to ~/.httpsource/state")]
        state_dir: Option<PathBuf>,

        #[arg(long, default_value = "worker-0")]
        worker: String,
    },
}
