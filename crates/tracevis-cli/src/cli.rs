use std::io::Write;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::Result;
use crate::render::{ClassifyArgs, RenderArgs, run_classify, run_render};

#[derive(Debug, Parser)]
#[command(
    name = "tracevis",
    about = "Replay recorded PEG parse traces as nested, collapsible boxes",
    version
)]
pub struct Cli {
    /// Raise log verbosity (`-v` debug, `-vv` trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build the box tree, apply toggles and print the layout.
    Render(RenderArgs),

    /// Print the visibility decision for every trace node.
    Classify(ClassifyArgs),
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// Install a stderr subscriber. Safe to call more than once.
pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Render(args) => run_render(&args, out),
        Commands::Classify(args) => run_classify(&args, out),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, default_directive};

    #[test]
    fn render_flags_parse() {
        let cli = Cli::parse_from([
            "tracevis",
            "-vv",
            "render",
            "--trace",
            "t.json",
            "--toggle",
            "0",
            "--toggle",
            "0/2",
            "--settle",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Render(args) = cli.command else {
            panic!("expected render");
        };
        assert_eq!(args.toggles, vec!["0", "0/2"]);
        assert!(args.settle);
        assert!(!args.json);
        assert_eq!(args.frame_ms, 16);
    }

    #[test]
    fn classify_requires_trace() {
        assert!(Cli::try_parse_from(["tracevis", "classify"]).is_err());
    }

    #[test]
    fn verbosity_maps_to_directive() {
        assert_eq!(default_directive(0), "warn");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(5), "trace");
    }
}
