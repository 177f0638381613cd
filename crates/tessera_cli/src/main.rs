//! Tessera CLI: the command-line front end of the hierarchical CGRA placer.
//!
//! Provides `tessera place` to place a packed netlist on a board and
//! `tessera serve` to run the remote detailed-placement endpoint.

#![warn(missing_docs)]

mod inputs;
mod output;
mod place;
mod serve;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tessera_config::ClusterCount;
use tracing::Level;

/// Tessera, a hierarchical placer for coarse-grained reconfigurable arrays.
#[derive(Parser, Debug)]
#[command(name = "tessera", version, about = "Tessera CGRA Placer")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `tessera.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Place a packed netlist on a board.
    Place(PlaceArgs),
    /// Serve detailed placement jobs over HTTP.
    Serve(ServeArgs),
}

/// Arguments for the `tessera place` subcommand.
#[derive(Parser, Debug)]
pub struct PlaceArgs {
    /// Packed netlist file, e.g. `harris.packed.json`.
    #[arg(short, long)]
    pub input: String,

    /// Netlist embedding file, e.g. `harris.emb`.
    #[arg(short, long)]
    pub embedding: String,

    /// Placement result file, e.g. `harris.place`.
    #[arg(short, long)]
    pub output: String,

    /// Board architecture file.
    #[arg(short = 'c', long = "cgra")]
    pub arch: String,

    /// Treat registers as ordinary compute blocks.
    #[arg(long)]
    pub no_reg_fold: bool,

    /// Placement seed (overrides the config file).
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Remote detailed-placement endpoint, e.g. `http://host:8080`.
    #[arg(short, long)]
    pub url: Option<String>,

    /// Initial cluster count: a number, `auto`, or `kernels` to count the
    /// kernels named in the packed netlist.
    #[arg(long, value_name = "N|auto|kernels")]
    pub clusters: Option<ClusterCount>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `tessera serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Maximum level for the log subscriber.
    fn log_level(&self) -> Level {
        if self.quiet {
            Level::ERROR
        } else if self.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    tracing_subscriber::fmt()
        .with_max_level(global.log_level())
        .with_ansi(global.color)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Place(ref args) => place::run(args, &global),
        Command::Serve(ref args) => serve::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_args(cli: Cli) -> PlaceArgs {
        match cli.command {
            Command::Place(args) => args,
            _ => panic!("expected Place command"),
        }
    }

    #[test]
    fn parse_place_required() {
        let cli = Cli::parse_from([
            "tessera", "place", "-i", "d.json", "-e", "d.emb", "-o", "d.place", "-c", "b.toml",
        ]);
        let args = place_args(cli);
        assert_eq!(args.input, "d.json");
        assert_eq!(args.embedding, "d.emb");
        assert_eq!(args.output, "d.place");
        assert_eq!(args.arch, "b.toml");
        assert!(!args.no_reg_fold);
        assert!(args.seed.is_none());
        assert!(args.url.is_none());
        assert!(args.clusters.is_none());
        assert_eq!(args.format, ReportFormat::Text);
    }

    #[test]
    fn parse_place_overrides() {
        let cli = Cli::parse_from([
            "tessera",
            "place",
            "--input",
            "d.json",
            "--embedding",
            "d.emb",
            "--output",
            "d.place",
            "--cgra",
            "b.toml",
            "--no-reg-fold",
            "-s",
            "42",
            "-u",
            "http://worker:8080",
            "--clusters",
            "3",
            "--format",
            "json",
        ]);
        let args = place_args(cli);
        assert!(args.no_reg_fold);
        assert_eq!(args.seed, Some(42));
        assert_eq!(args.url.as_deref(), Some("http://worker:8080"));
        assert_eq!(args.clusters, Some(ClusterCount::Fixed(3)));
        assert_eq!(args.format, ReportFormat::Json);
    }

    #[test]
    fn parse_cluster_count_keywords() {
        let base = [
            "tessera", "place", "-i", "d.json", "-e", "d.emb", "-o", "d.place", "-c", "b.toml",
        ];
        let cli = Cli::parse_from(base.iter().copied().chain(["--clusters", "kernels"]));
        assert_eq!(place_args(cli).clusters, Some(ClusterCount::Kernels));
        let cli = Cli::parse_from(base.iter().copied().chain(["--clusters", "auto"]));
        assert_eq!(place_args(cli).clusters, Some(ClusterCount::Auto));
        let result = Cli::try_parse_from(base.iter().copied().chain(["--clusters", "lots"]));
        assert!(result.is_err());
    }

    #[test]
    fn parse_place_missing_input_fails() {
        let result = Cli::try_parse_from(["tessera", "place", "-e", "d.emb"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_serve_default_bind() {
        let cli = Cli::parse_from(["tessera", "serve"]);
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind, "127.0.0.1:8080"),
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "tessera",
            "--quiet",
            "--color",
            "never",
            "--config",
            "/etc/tessera.toml",
            "serve",
            "--bind",
            "0.0.0.0:9000",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config.as_deref(), Some("/etc/tessera.toml"));
    }

    #[test]
    fn log_level_follows_flags() {
        let global = |quiet, verbose| GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        };
        assert_eq!(global(false, false).log_level(), Level::WARN);
        assert_eq!(global(false, true).log_level(), Level::DEBUG);
        assert_eq!(global(true, true).log_level(), Level::ERROR);
    }
}
