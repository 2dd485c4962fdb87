use std::path::PathBuf;

use clap::Parser;
use parker_transit::scenario::{self, load_scenario};

/// Solve the self-consistent Parker wind and ionization structure of a scenario.
#[derive(Parser, Debug)]
#[command(author, version, about = "Parker wind structure solver")]
struct Cli {
    /// Scenario manifest (YAML, TOML, or a directory of TOML files)
    #[arg(long)]
    scenario: PathBuf,

    /// Scenario name when the manifest holds several (defaults to the first)
    #[arg(long)]
    name: Option<String>,

    /// Structure CSV output path (`-` for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,

    /// Optional JSON diagnostics sidecar
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Keep the last iterate when the structure iteration does not converge
    #[arg(long, default_value_t = false)]
    accept_unconverged: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_scenario(&cli.scenario, cli.name.as_deref())?;

    let solution = scenario::solve_structure(&config, cli.accept_unconverged)?;
    scenario::write_structure_csv(&cli.output, &solution)?;

    if let Some(path) = &cli.diagnostics {
        let diagnostics = scenario::diagnostics(&config, &solution, None);
        scenario::write_diagnostics_json(path, &diagnostics)?;
    }
    if !solution.diagnostics.converged {
        log::warn!(
            "structure written from an unconverged iterate (residual {:.3e})",
            solution.diagnostics.residual
        );
    }
    Ok(())
}
