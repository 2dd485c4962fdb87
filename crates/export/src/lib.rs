//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod structure {
    use std::io::{self, Write};

    const HEADER: &str = "radius_cm,density_g_cm3,velocity_cm_s,temperature_k,mach,mean_molecular_weight,electron_density_cm3,f_hi,f_hii,f_hei,f_heii,f_heiii,column_hi_cm2,column_hei_cm2,column_heii_cm2,pressure_dyn_cm2";

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One radius of a converged atmosphere.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Record {
        pub radius_cm: f64,
        pub density_g_cm3: f64,
        pub velocity_cm_s: f64,
        pub temperature_k: f64,
        pub mach: f64,
        pub mean_molecular_weight: f64,
        pub electron_density_cm3: f64,
        /// H I, H II, He I, He II, He III.
        pub fractions: [f64; 5],
        /// H I, He I, He II.
        pub columns_cm2: [f64; 3],
        pub pressure_dyn_cm2: f64,
    }

    impl Record {
        /// Serialize the record to CSV, matching the header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            let [hi, hii, hei, heii, heiii] = self.fractions;
            let [c_hi, c_hei, c_heii] = self.columns_cm2;
            writeln!(
                writer,
                "{:.6e},{:.6e},{:.6e},{:.3},{:.6},{:.6},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e},{:.6e}",
                self.radius_cm,
                self.density_g_cm3,
                self.velocity_cm_s,
                self.temperature_k,
                self.mach,
                self.mean_molecular_weight,
                self.electron_density_cm3,
                hi,
                hii,
                hei,
                heii,
                heiii,
                c_hi,
                c_hei,
                c_heii,
                self.pressure_dyn_cm2,
            )
        }
    }
}

pub mod spectrum {
    use std::io::{self, Write};

    const HEADER: &str = "wavelength_angstrom,absorption,transit_depth";

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Record {
        pub wavelength_angstrom: f64,
        pub absorption: f64,
        pub transit_depth: f64,
    }

    impl Record {
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{:.5},{:.8e},{:.8e}",
                self.wavelength_angstrom, self.absorption, self.transit_depth
            )
        }
    }
}

pub mod light_curve {
    use std::io::{self, Write};

    /// Long-format CSV: one row per phase and wavelength.
    pub fn write(
        writer: &mut dyn Write,
        phases: &[f64],
        wavelength_angstrom: &[f64],
        flux: &[Vec<f64>],
    ) -> io::Result<()> {
        writeln!(writer, "phase,wavelength_angstrom,relative_flux")?;
        for (phase, row) in phases.iter().zip(flux) {
            for (w, f) in wavelength_angstrom.iter().zip(row) {
                writeln!(writer, "{:.5},{:.5},{:.10}", phase, w, f)?;
            }
        }
        Ok(())
    }
}

pub mod diagnostics {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::io::{self, Write};

    /// Summary of a structure solve, written as a JSON sidecar.
    #[derive(Debug, Clone, Serialize, PartialEq)]
    pub struct Diagnostics {
        pub scenario: String,
        pub generated_utc: String,
        pub converged: bool,
        pub iterations: usize,
        /// Absent when only one pass ran, so no residual was measured.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub residual: Option<f64>,
        /// Residuals of the passes that had a predecessor to compare with.
        pub residual_history: Vec<f64>,
        pub sonic_radius_cm: f64,
        pub sonic_radius_planet_radii: f64,
        pub sonic_in_domain: bool,
        pub sound_speed_cm_s: f64,
        pub mass_loss_rate_g_s: f64,
        pub mean_molecular_weight: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub transit: Option<TransitSummary>,
    }

    #[derive(Debug, Clone, Serialize, PartialEq)]
    pub struct TransitSummary {
        pub planet_disk_depth: f64,
        pub peak_absorption: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub peak_wavelength_angstrom: Option<f64>,
        pub impact_points: usize,
        pub refinements: usize,
    }

    pub fn write_json(writer: &mut dyn Write, diagnostics: &Diagnostics) -> io::Result<()> {
        to_writer_pretty(&mut *writer, diagnostics)?;
        writeln!(writer)
    }
}
