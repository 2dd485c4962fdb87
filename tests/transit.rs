use std::sync::Arc;

use parker_transit::transit::{
    SpectralLine, TransitError, TransitGeometry, TransitMap, TransmissionEngine,
    TransmissionSettings,
};
use parker_transit::{AtmosphericStructure, Composition, IonizationState, RadialGrid};

const RP: f64 = 1.0e10;
const RSTAR: f64 = 7.0e10;

fn atmosphere(hi_density_at_base: f64) -> (AtmosphericStructure, IonizationState) {
    let grid = Arc::new(RadialGrid::geometric(RP, 10.0 * RP, 80).unwrap());
    let composition = Composition::Hydrogen;
    let density = grid
        .radii()
        .iter()
        .map(|&r| composition.mass_density(hi_density_at_base * (r / RP).powi(-3)))
        .collect();
    let points = grid.len();
    let atmosphere = AtmosphericStructure {
        grid,
        density_g_cm3: density,
        velocity_cm_s: vec![1.0e6; points],
        temperature_k: vec![8000.0; points],
        composition,
    };
    (atmosphere, composition.neutral_state(points))
}

fn geometry(cutoff_radius_cm: Option<f64>) -> TransitGeometry {
    TransitGeometry {
        planet_radius_cm: RP,
        stellar_radius_cm: RSTAR,
        cutoff_radius_cm,
    }
}

/// Fixed quadrature so that spectra of different atmospheres are directly comparable.
fn fixed_engine() -> TransmissionEngine {
    let settings = TransmissionSettings {
        chord_points: 40,
        impact_points: 16,
        max_refinements: 0,
        ..TransmissionSettings::default()
    };
    TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap()
}

#[test]
fn empty_atmosphere_only_shows_the_planet_disk() {
    let engine = fixed_engine();
    let (atm, state) = atmosphere(0.0);
    let wavelengths = engine.wavelength_grid(21);
    let spectrum = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap();
    let disk = (RP / RSTAR).powi(2);
    assert_eq!(spectrum.planet_disk_depth, disk);
    for point in &spectrum.points {
        assert_eq!(point.absorption, 0.0);
        assert_eq!(point.transit_depth, disk);
    }
}

#[test]
fn thin_absorption_scales_linearly_with_density() {
    let engine = fixed_engine();
    let wavelengths = engine.wavelength_grid(21);
    let (thin, state) = atmosphere(1.0e-6);
    let (thicker, _) = atmosphere(2.0e-6);
    let a = engine
        .spectrum(&thin, &state, &geometry(None), &wavelengths)
        .unwrap();
    let b = engine
        .spectrum(&thicker, &state, &geometry(None), &wavelengths)
        .unwrap();
    for (p, q) in a.points.iter().zip(&b.points) {
        assert!(p.absorption > 0.0);
        let ratio = q.absorption / p.absorption;
        assert!((ratio - 2.0).abs() < 1e-6, "ratio {ratio} at {}", p.wavelength_angstrom);
    }
}

#[test]
fn absorption_peaks_at_line_centre() {
    let engine = fixed_engine();
    let wavelengths = engine.wavelength_grid(21);
    let (atm, state) = atmosphere(1.0e4);
    let spectrum = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap();
    let centre = spectrum.points[10].absorption;
    assert_eq!(spectrum.peak_absorption(), centre);
    assert!(spectrum.points[0].absorption < centre);
    assert!(spectrum.points[20].absorption < centre);
}

#[test]
fn saturated_line_stays_below_the_envelope_area() {
    let engine = fixed_engine();
    let wavelengths = engine.wavelength_grid(21);
    let (atm, state) = atmosphere(1.0e14);
    let (weaker, _) = atmosphere(1.0e10);
    let dense = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap();
    let light = engine
        .spectrum(&weaker, &state, &geometry(None), &wavelengths)
        .unwrap();

    let envelope = ((10.0 * RP).powi(2) - RP * RP) / (RSTAR * RSTAR);
    for (d, l) in dense.points.iter().zip(&light.points) {
        assert!(d.absorption <= envelope * (1.0 + 1e-12));
        assert!(d.absorption >= l.absorption);
    }
    assert!(dense.points[10].absorption > 0.8 * envelope);
}

#[test]
fn refinement_tightens_the_disk_quadrature() {
    let settings = TransmissionSettings {
        chord_points: 40,
        impact_points: 8,
        disk_tolerance: 1.0e-2,
        max_refinements: 6,
        ..TransmissionSettings::default()
    };
    let engine = TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap();
    let (atm, state) = atmosphere(1.0e4);
    let wavelengths = engine.wavelength_grid(11);
    let spectrum = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap();
    assert!(spectrum.refinements >= 1);
    let mut expected = 8;
    for _ in 0..spectrum.refinements {
        expected = 2 * expected - 1;
    }
    assert_eq!(spectrum.impact_points, expected);
}

#[test]
fn unreachable_tolerance_reports_divergence() {
    let settings = TransmissionSettings {
        chord_points: 20,
        impact_points: 8,
        disk_tolerance: 1.0e-15,
        max_refinements: 1,
        ..TransmissionSettings::default()
    };
    let engine = TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap();
    let (atm, state) = atmosphere(1.0e-2);
    let wavelengths = engine.wavelength_grid(5);
    let err = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap_err();
    match err {
        TransitError::DiskIntegrationDiverged {
            refinements,
            relative_change,
            ..
        } => {
            assert_eq!(refinements, 1);
            assert!(relative_change > 1.0e-15);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn chords_beyond_the_cutoff_are_transparent() {
    let engine = fixed_engine();
    let (atm, state) = atmosphere(1.0e8);
    let wavelengths = [1215.67];
    let cutoff = 5.0 * RP;
    let map = engine
        .optical_depth_map(&atm, &state, &geometry(Some(cutoff)), &wavelengths, 16)
        .unwrap();
    assert_eq!(map.cutoff_radius_cm, cutoff);
    assert_eq!(map.impact_cm[0], RP);
    assert_eq!(*map.impact_cm.last().unwrap(), cutoff);
    assert_eq!(map.tau.last().unwrap()[0], 0.0);
    assert_eq!(map.at(6.0 * RP, 0), 0.0);
    assert_eq!(map.at(cutoff, 0), 0.0);
    assert_eq!(map.at(0.5 * RP, 0), map.tau[0][0]);
    assert!(map.tau[0][0] > map.tau[5][0]);
    assert!(map.at(2.0 * RP, 0) > 0.0);
}

#[test]
fn invalid_requests_are_rejected() {
    assert!(matches!(
        TransmissionEngine::new(Vec::new(), TransmissionSettings::default()),
        Err(TransitError::NoLines)
    ));

    let engine = fixed_engine();
    let (atm, state) = atmosphere(1.0e4);
    let err = engine
        .spectrum(&atm, &state, &geometry(None), &[1300.0])
        .unwrap_err();
    assert!(matches!(
        err,
        TransitError::WavelengthOutOfRange { wavelength_angstrom } if wavelength_angstrom == 1300.0
    ));

    for cutoff in [0.5 * RP, 20.0 * RP] {
        let err = engine
            .spectrum(&atm, &state, &geometry(Some(cutoff)), &[1215.67])
            .unwrap_err();
        assert!(matches!(err, TransitError::InvalidGeometry(_)));
    }

    let short = Composition::Hydrogen.neutral_state(3);
    assert!(matches!(
        engine.spectrum(&atm, &short, &geometry(None), &[1215.67]),
        Err(TransitError::Domain(_))
    ));
}

#[test]
fn helium_line_sees_nothing_in_pure_hydrogen() {
    let engine = TransmissionEngine::new(
        vec![SpectralLine::helium_ii_304()],
        TransmissionSettings {
            chord_points: 20,
            impact_points: 8,
            max_refinements: 0,
            ..TransmissionSettings::default()
        },
    )
    .unwrap();
    let (atm, state) = atmosphere(1.0e10);
    let spectrum = engine
        .spectrum(&atm, &state, &geometry(None), &[303.78])
        .unwrap();
    assert_eq!(spectrum.points[0].absorption, 0.0);
}

#[test]
fn light_curve_is_flat_out_of_transit_and_dips_in_transit() {
    let engine = fixed_engine();
    let (atm, state) = atmosphere(1.0e8);
    let geometry = geometry(Some(2.0 * RP));
    let map = TransitMap::new(201).unwrap();
    assert!((map.total_flux() - 1.0).abs() < 1e-10);

    let wavelengths = [1215.67, 1219.0];
    let phases = [-2.0, -0.2, 0.0, 0.2, 2.0];
    let curve = engine
        .light_curve(&atm, &state, &geometry, &wavelengths, &map, 0.0, &phases)
        .unwrap();
    assert_eq!(curve.flux.len(), phases.len());

    let disk = (RP / RSTAR).powi(2);
    for j in 0..wavelengths.len() {
        let flux = curve.at_wavelength(j);
        assert!((flux[0] - 1.0).abs() < 1e-10);
        assert!((flux[4] - 1.0).abs() < 1e-10);
        assert!((flux[1] - flux[3]).abs() < 1e-12);
        assert!(flux[2] < 1.0 - 0.5 * disk);
    }
    // the thin wing only shows the planet; the saturated core the whole envelope
    let wing = curve.flux[2][1];
    assert!((wing - (1.0 - disk)).abs() < 0.5 * disk);
    let envelope = 4.0 * disk;
    assert!((curve.flux[2][0] - (1.0 - envelope)).abs() < 0.5 * disk);
    assert!(curve.flux[2][0] < wing);
}

#[test]
fn opaque_planet_blocks_its_disk_area() {
    let engine = fixed_engine();
    let (atm, state) = atmosphere(0.0);
    let map = TransitMap::new(201).unwrap();
    let curve = engine
        .light_curve(&atm, &state, &geometry(None), &[1215.67], &map, 0.0, &[0.0])
        .unwrap();
    let depth = 1.0 - curve.flux[0][0];
    let expected = (RP / RSTAR).powi(2);
    assert!(
        (depth - expected).abs() < 0.1 * expected,
        "depth {depth}, expected {expected}"
    );
}

#[test]
fn light_curve_rejects_bad_geometry() {
    let engine = fixed_engine();
    let (atm, state) = atmosphere(1.0e4);
    let map = TransitMap::new(51).unwrap();
    let err = engine
        .light_curve(&atm, &state, &geometry(None), &[1215.67], &map, -0.1, &[0.0])
        .unwrap_err();
    assert!(matches!(err, TransitError::InvalidGeometry(_)));
    assert!(TransitMap::new(2).is_err());
}

#[test]
fn opaque_gas_at_the_cutoff_is_reported_with_its_radius() {
    let settings = TransmissionSettings {
        chord_points: 20,
        impact_points: 8,
        disk_tolerance: 1.0e-15,
        max_refinements: 1,
        ..TransmissionSettings::default()
    };
    let engine = TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap();
    let (atm, state) = atmosphere(1.0e8);
    let wavelengths = engine.wavelength_grid(5);
    let err = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap_err();
    match err {
        TransitError::OpaqueCutoff {
            cutoff_radius_cm,
            optical_depth,
            wavelength_angstrom,
        } => {
            assert_eq!(cutoff_radius_cm, atm.grid.outer());
            assert!(optical_depth > settings.edge_optical_depth);
            assert!(wavelengths.contains(&wavelength_angstrom));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn truncated_saturated_envelope_still_refines() {
    let settings = TransmissionSettings {
        chord_points: 40,
        impact_points: 8,
        disk_tolerance: 1.0e-2,
        max_refinements: 5,
        ..TransmissionSettings::default()
    };
    let engine = TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap();
    let (atm, state) = atmosphere(1.0e8);
    let wavelengths = engine.wavelength_grid(11);
    let map = engine
        .optical_depth_map(&atm, &state, &geometry(None), &wavelengths, 8)
        .unwrap();
    // the outermost interior chord is still opaque at line centre
    assert!(map.tau[6][5] > 100.0);

    let spectrum = engine
        .spectrum(&atm, &state, &geometry(None), &wavelengths)
        .unwrap();
    assert!(spectrum.refinements <= 3, "{} refinements", spectrum.refinements);
    let envelope = ((10.0 * RP).powi(2) - RP * RP) / (RSTAR * RSTAR);
    assert!(spectrum.points[5].absorption > 0.9 * envelope);
}

#[test]
fn light_curve_uses_the_refined_impact_grid() {
    let settings = TransmissionSettings {
        chord_points: 30,
        impact_points: 8,
        disk_tolerance: 1.0e-2,
        max_refinements: 5,
        ..TransmissionSettings::default()
    };
    let engine = TransmissionEngine::new(vec![SpectralLine::lyman_alpha()], settings).unwrap();
    let (atm, state) = atmosphere(1.0e4);
    let geometry = geometry(Some(5.0 * RP));
    let wavelengths = engine.wavelength_grid(5);
    let spectrum = engine
        .spectrum(&atm, &state, &geometry, &wavelengths)
        .unwrap();
    assert!(spectrum.refinements >= 1);

    let map = TransitMap::new(51).unwrap();
    let curve = engine
        .light_curve(&atm, &state, &geometry, &wavelengths, &map, 0.0, &[-1.0, 0.0])
        .unwrap();
    assert_eq!(curve.impact_points, spectrum.impact_points);
    assert!(curve.impact_points > 8);
    assert!((curve.flux[0][2] - 1.0).abs() < 1e-10);
    assert!(curve.flux[1][2] < 1.0);
}
