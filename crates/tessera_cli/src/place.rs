//! `tessera place`: the end-to-end placement pipeline.
//!
//! 1. Load `tessera.toml` (or defaults) and apply command-line overrides
//! 2. Build the board from the architecture file
//! 3. Read the packed netlist and embedding
//! 4. Run hierarchical placement
//! 5. Render diagnostics
//! 6. Write the placement file and print a summary

use std::error::Error;
use std::path::Path;

use tessera_config::{ClusterCount, PlacerConfig};
use tessera_diagnostics::{DiagnosticRenderer, DiagnosticSink, JsonRenderer, TerminalRenderer};
use tessera_place::{place_design, Design};

use crate::{inputs, output, GlobalArgs, PlaceArgs, ReportFormat};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

/// Runs the `tessera place` command.
///
/// Returns exit code 0 on success. Any failure is returned as an error and
/// leaves no placement file behind.
pub fn run(args: &PlaceArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let mut config = load_placer_config(global.config.as_deref())?;
    apply_overrides(&mut config, args);

    let board = tessera_arch::load_board(Path::new(&args.arch))?;
    let packed = inputs::load_packed(Path::new(&args.input))?;
    let embedding = inputs::load_embedding(Path::new(&args.embedding))?;
    let design = Design {
        netlist: packed.to_netlist(),
        embedding,
        fixed: packed.fixed.clone(),
        names: packed.id_to_name.clone(),
    };

    if !global.quiet {
        eprintln!(
            "   Placing {} blocks on {} ({}x{}) with seed {}",
            design.blocks().len(),
            board.name(),
            board.width(),
            board.height(),
            config.placer.seed
        );
    }

    let sink = DiagnosticSink::new();
    let executor = tessera_place::executor_for(&config);
    let outcome = place_design(&design, &board, &config, executor.as_ref(), &sink);
    render_diagnostics(&sink, args.format, global);
    let result = outcome?;

    let inputs = format!("{} {}", args.input, args.embedding);
    output::write_placement(
        Path::new(&args.output),
        &result.placement,
        &packed,
        &board,
        &inputs,
    )?;

    if !global.quiet {
        eprintln!(
            "   Finished: {} cluster(s){}, wirelength {}, written to {}",
            result.clusters_used,
            if result.fallback { " (flat fallback)" } else { "" },
            result.wirelength,
            args.output
        );
    }
    Ok(0)
}

/// Loads the placer configuration.
///
/// An explicit path must exist; otherwise `tessera.toml` in the working
/// directory is used when present, and defaults when not.
pub fn load_placer_config(path: Option<&str>) -> Result<PlacerConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(tessera_config::load_config(Path::new(path))?),
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            Ok(tessera_config::load_config(Path::new(DEFAULT_CONFIG_FILE))?)
        }
        None => Ok(PlacerConfig::default()),
    }
}

/// Applies command-line flags on top of the file configuration.
fn apply_overrides(config: &mut PlacerConfig, args: &PlaceArgs) {
    if let Some(seed) = args.seed {
        config.placer.seed = seed;
    }
    if args.no_reg_fold {
        config.placer.fold_registers = false;
    }
    if let Some(clusters) = args.clusters {
        config.placer.clusters = clusters;
    }
    if let Some(url) = &args.url {
        config.remote.url = Some(url.clone());
    }
}

fn render_diagnostics(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) {
    let diagnostics = sink.diagnostics();
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                if global.quiet && !diag.severity.is_error() {
                    continue;
                }
                eprint!("{}", renderer.render(diag));
            }
        }
        ReportFormat::Json => {
            for diag in &diagnostics {
                println!("{}", JsonRenderer.render(diag));
            }
        }
    }
}
