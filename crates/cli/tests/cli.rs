use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

const SCENARIO: &str = "
- name: cli-hot-jupiter
  planet:
    mass_jupiter: 0.69
    radius_jupiter: 1.38
    orbital_distance_au: 0.047
  star:
    radius_solar: 1.16
  wind:
    temperature_k: 9000.0
    normalization:
      type: mass_loss_rate
      g_s: 1.0e10
  grid:
    points: 60
  spectrum:
    type: flat
    flux: 1.0
    min_angstrom: 100.0
    max_angstrom: 911.0
    points: 100
  transit:
    wavelength_points: 11
    chord_points: 20
    impact_points: 8
    disk_tolerance: 5.0e-2
    max_refinements: 3
    cutoff_planet_radii: 5.0
    map_grid_size: 41
    phases: [-1.0, 0.0, 1.0]
";

fn scenario_file() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scenario.yaml");
    fs::write(&path, SCENARIO).unwrap();
    (dir, path)
}

fn data_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

#[test]
fn parker_writes_structure_and_diagnostics() {
    let (dir, scenario) = scenario_file();
    let output = dir.path().join("structure.csv");
    let diagnostics = dir.path().join("diag/structure.json");

    Command::cargo_bin("parker")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--output")
        .arg(&output)
        .arg("--diagnostics")
        .arg(&diagnostics)
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("radius_cm,density_g_cm3,velocity_cm_s"));
    assert_eq!(data_rows(&output).len(), 60);

    let json = fs::read_to_string(&diagnostics).unwrap();
    assert!(json.contains("\"scenario\": \"cli-hot-jupiter\""));
    assert!(json.contains("\"converged\": true"));
    assert!(!json.contains("\"transit\""));
}

#[test]
fn parker_streams_to_stdout_by_default() {
    let (_dir, scenario) = scenario_file();
    Command::cargo_bin("parker")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--name")
        .arg("CLI-HOT-JUPITER")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("radius_cm,"));
}

#[test]
fn transit_writes_spectrum_and_light_curve() {
    let (dir, scenario) = scenario_file();
    let output = dir.path().join("spectrum.csv");
    let curve = dir.path().join("light_curve.csv");
    let diagnostics = dir.path().join("transit.json");

    Command::cargo_bin("transit")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--output")
        .arg(&output)
        .arg("--light-curve")
        .arg(&curve)
        .arg("--diagnostics")
        .arg(&diagnostics)
        .assert()
        .success();

    let spectrum = fs::read_to_string(&output).unwrap();
    assert!(spectrum.starts_with("wavelength_angstrom,absorption,transit_depth"));
    assert_eq!(data_rows(&output).len(), 11);

    let light_curve = fs::read_to_string(&curve).unwrap();
    assert!(light_curve.starts_with("phase,wavelength_angstrom,relative_flux"));
    assert_eq!(data_rows(&curve).len(), 3 * 11);

    let json = fs::read_to_string(&diagnostics).unwrap();
    assert!(json.contains("\"transit\""));
    assert!(json.contains("\"peak_absorption\""));
}

#[test]
fn unconverged_structure_fails_unless_accepted() {
    let dir = tempdir().unwrap();
    let scenario = dir.path().join("short.yaml");
    fs::write(
        &scenario,
        SCENARIO.replace("  grid:\n", "  solver:\n    max_iterations: 2\n  grid:\n"),
    )
    .unwrap();
    let output = dir.path().join("structure.csv");

    Command::cargo_bin("parker")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("did not converge"));

    Command::cargo_bin("parker")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--output")
        .arg(&output)
        .arg("--accept-unconverged")
        .assert()
        .success();
    assert_eq!(data_rows(&output).len(), 60);
}

#[test]
fn missing_manifest_is_reported() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("transit")
        .unwrap()
        .arg("--scenario")
        .arg(dir.path().join("absent.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read configuration"));
}

#[test]
fn unknown_scenario_name_is_reported() {
    let (_dir, scenario) = scenario_file();
    Command::cargo_bin("parker")
        .unwrap()
        .arg("--scenario")
        .arg(&scenario)
        .arg("--name")
        .arg("nowhere")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scenario 'nowhere'"));
}
