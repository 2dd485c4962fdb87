use std::sync::Arc;

use parker_transit::ionization::{
    AtomicData, BalanceSettings, IonizationBalanceSolver, IonizationError, StandardAtomicData,
    StellarSpectrum,
};
use parker_transit::{AtmosphericStructure, Composition, DomainError, Ion, RadialGrid};

const T_GAS: f64 = 8000.0;

/// Flat EUV irradiance of 1 erg s⁻¹ cm⁻² Å⁻¹ between 100 and 911 Å.
fn euv() -> StellarSpectrum {
    StellarSpectrum::flat(100.0, 911.0, 200, 1.0).unwrap()
}

fn atmosphere(
    composition: Composition,
    points: usize,
    hydrogen_density: impl Fn(f64) -> f64,
) -> AtmosphericStructure {
    let grid = Arc::new(RadialGrid::geometric(1.0e10, 1.0e11, points).unwrap());
    let density = grid
        .radii()
        .iter()
        .map(|&r| composition.mass_density(hydrogen_density(r)))
        .collect();
    AtmosphericStructure {
        grid: Arc::clone(&grid),
        density_g_cm3: density,
        velocity_cm_s: vec![1.0e5; points],
        temperature_k: vec![T_GAS; points],
        composition,
    }
}

fn steep_profile(r: f64) -> f64 {
    1.0e12 * (r / 1.0e10).powi(-4)
}

fn solver(spectrum: &StellarSpectrum, composition: Composition) -> IonizationBalanceSolver {
    IonizationBalanceSolver::new(
        spectrum,
        Arc::new(StandardAtomicData::default()),
        composition,
        BalanceSettings::default(),
    )
    .unwrap()
}

#[test]
fn no_ionizing_flux_leaves_gas_neutral() {
    // entirely longward of the Lyman edge
    let spectrum = StellarSpectrum::flat(1300.0, 2000.0, 50, 10.0).unwrap();
    let composition = Composition::HydrogenHelium { he_to_h: 0.1 };
    let atm = atmosphere(composition, 60, steep_profile);
    let solution = solver(&spectrum, composition).solve(&atm).unwrap();

    assert_eq!(solution.state, composition.neutral_state(60));
    assert!(solution.electron_density_cm3.iter().all(|ne| *ne == 0.0));
    assert!(
        solution
            .photoionization_rate_s
            .iter()
            .all(|rates| rates.iter().all(|g| *g == 0.0))
    );
}

#[test]
fn optically_thin_outer_cell_matches_quadratic_balance() {
    let composition = Composition::Hydrogen;
    let n = 1.0e6;
    let atm = atmosphere(composition, 20, |_| n);
    let spectrum = euv();
    let solver = solver(&spectrum, composition);
    let solution = solver.solve(&atm).unwrap();

    let outer = atm.grid.len() - 1;
    let gamma = solver.table().rates([0.0; 3])[0];
    let alpha = StandardAtomicData::default().recombination_coefficient(Ion::HII, T_GAS);
    let k = gamma / (n * alpha);
    let x = 0.5 * (-k + (k * k + 4.0 * k).sqrt());
    let got = solution.state.fraction(Ion::HII, outer);
    assert!((got - x).abs() < 1e-9, "x = {got}, expected {x}");
    assert_eq!(solution.photoionization_rate_s[outer][0], gamma);
    assert_eq!(solution.column_density_cm2[outer], [0.0; 3]);
}

#[test]
fn stage_fractions_are_normalised_with_helium() {
    let composition = Composition::HydrogenHelium { he_to_h: 0.1 };
    let atm = atmosphere(composition, 80, steep_profile);
    let solution = solver(&euv(), composition).solve(&atm).unwrap();

    assert!(solution.state.max_normalization_error() < 1e-12);
    for i in 0..atm.grid.len() {
        for ion in Ion::ALL {
            let f = solution.state.fraction(ion, i);
            assert!((0.0..=1.0).contains(&f), "{ion:?} fraction {f} at {i}");
        }
        // charge neutrality
        let n_h = atm.hydrogen_density(i);
        let expected = n_h * solution.state.electrons_per_hydrogen(i);
        let ne = solution.electron_density_cm3[i];
        assert!(
            (ne - expected).abs() <= 1e-9 * n_h,
            "n_e = {ne}, expected {expected} at {i}"
        );
    }
}

#[test]
fn columns_grow_inward_and_shield_the_base() {
    let composition = Composition::Hydrogen;
    let atm = atmosphere(composition, 100, steep_profile);
    let solution = solver(&euv(), composition).solve(&atm).unwrap();

    let columns = &solution.column_density_cm2;
    for i in 0..columns.len() - 1 {
        assert!(columns[i][0] >= columns[i + 1][0]);
        assert!(solution.photoionization_rate_s[i][0] <= solution.photoionization_rate_s[i + 1][0]);
    }
    let outer = columns.len() - 1;
    assert!(solution.state.fraction(Ion::HII, outer) > 0.5);
    assert!(solution.state.fraction(Ion::HI, 0) > 0.98);
    for i in 0..outer {
        assert!(
            solution.state.fraction(Ion::HII, i)
                <= solution.state.fraction(Ion::HII, i + 1) + 1e-12
        );
    }
}

#[test]
fn huge_columns_stay_finite() {
    let composition = Composition::HydrogenHelium { he_to_h: 0.08 };
    let atm = atmosphere(composition, 60, |_| 1.0e18);
    let solution = solver(&euv(), composition).solve(&atm).unwrap();

    assert!(solution.column_density_cm2[0][0] > 1.0e28);
    for rates in &solution.photoionization_rate_s {
        assert!(rates.iter().all(|g| g.is_finite() && *g >= 0.0));
    }
    assert!(solution.state.fraction(Ion::HI, 0) > 0.999);
    assert!(solution.state.max_normalization_error() < 1e-12);
}

#[test]
fn brighter_star_ionizes_more() {
    let composition = Composition::Hydrogen;
    let atm = atmosphere(composition, 60, steep_profile);
    let faint = solver(&euv(), composition).solve(&atm).unwrap();
    let bright_spectrum = euv().scaled(100.0).unwrap();
    let bright = solver(&bright_spectrum, composition).solve(&atm).unwrap();
    for i in 0..atm.grid.len() {
        assert!(bright.state.fraction(Ion::HII, i) >= faint.state.fraction(Ion::HII, i));
    }
    assert!(bright.state.fraction(Ion::HII, 30) > faint.state.fraction(Ion::HII, 30));
}

#[test]
fn composition_mismatch_is_rejected() {
    let atm = atmosphere(Composition::Hydrogen, 20, steep_profile);
    let solver = solver(&euv(), Composition::HydrogenHelium { he_to_h: 0.1 });
    let err = solver.solve(&atm).unwrap_err();
    assert!(matches!(
        err,
        IonizationError::Domain(DomainError::CompositionMismatch(_))
    ));
}

#[test]
fn negative_density_is_rejected() {
    let composition = Composition::Hydrogen;
    let mut atm = atmosphere(composition, 20, steep_profile);
    atm.density_g_cm3[5] = -1.0;
    let err = solver(&euv(), composition).solve(&atm).unwrap_err();
    assert!(matches!(
        err,
        IonizationError::Domain(DomainError::NonPhysicalAt { .. })
    ));
}

#[test]
fn spectrum_rescales_with_distance() {
    let spectrum = euv();
    let closer = spectrum.at_distance(2.0, 1.0).unwrap();
    for (near, far) in closer.flux().iter().zip(spectrum.flux()) {
        assert!((near - 4.0 * far).abs() < 1e-12 * near);
    }
    assert!(StellarSpectrum::new(vec![500.0, 400.0], vec![1.0, 1.0]).is_err());
    assert!(StellarSpectrum::new(vec![400.0, 500.0], vec![1.0, -1.0]).is_err());
}

#[test]
fn resampling_interpolates_and_zero_fills() {
    let spectrum = StellarSpectrum::new(vec![100.0, 200.0, 300.0], vec![1.0, 3.0, 5.0]).unwrap();
    let resampled = spectrum.resample(&[50.0, 150.0, 250.0, 400.0]).unwrap();
    assert_eq!(resampled.flux(), &[0.0, 2.0, 4.0, 0.0]);
    assert_eq!(resampled.wavelength_angstrom(), &[50.0, 150.0, 250.0, 400.0]);

    // trapezoid over the bins that end below the cutoff
    assert!((spectrum.integrated_flux_below(911.8) - 600.0).abs() < 1e-12);
    assert!((spectrum.integrated_flux_below(250.0) - 200.0).abs() < 1e-12);
}

#[test]
fn helium_mass_is_shared_by_mixture_and_ions() {
    use parker_transit::constants::M_H;

    let composition = Composition::HydrogenHelium { he_to_h: 0.1 };
    let per_hydrogen = composition.mass_per_hydrogen() * M_H;
    let from_ions = Ion::HI.mass_g() + 0.1 * Ion::HeI.mass_g();
    assert!((per_hydrogen - from_ions).abs() < 1e-12 * per_hydrogen);
    assert_eq!(Ion::HeII.mass_g(), Ion::HeI.mass_g());

    // neutral gas: mass per nucleus over particles per nucleus
    let neutral = composition.neutral_state(4);
    let expected = from_ions / (1.1 * M_H);
    assert!((neutral.mean_molecular_weight(2) - expected).abs() < 1e-12);
}
