use std::path::PathBuf;

use clap::Parser;
use parker_transit::scenario::{self, load_scenario};

/// Compute the line transmission spectrum (and optionally the light curve) of a scenario.
#[derive(Parser, Debug)]
#[command(author, version, about = "Transit transmission spectrum generator")]
struct Cli {
    /// Scenario manifest (YAML, TOML, or a directory of TOML files)
    #[arg(long)]
    scenario: PathBuf,

    /// Scenario name when the manifest holds several (defaults to the first)
    #[arg(long)]
    name: Option<String>,

    /// Transmission spectrum CSV output path (`-` for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,

    /// Optional phase-resolved light curve CSV
    #[arg(long)]
    light_curve: Option<PathBuf>,

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
    let spectrum = scenario::transmission(&config, &solution)?;
    scenario::write_spectrum_csv(&cli.output, &spectrum)?;

    if let Some(path) = &cli.light_curve {
        let curve = scenario::light_curve(&config, &solution)?;
        scenario::write_light_curve_csv(path, &curve)?;
    }
    if let Some(path) = &cli.diagnostics {
        let diagnostics = scenario::diagnostics(&config, &solution, Some(&spectrum));
        scenario::write_diagnostics_json(path, &diagnostics)?;
    }
    Ok(())
}
