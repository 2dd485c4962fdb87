use std::sync::Arc;

use parker_transit::RadialGrid;
use parker_transit::constants::{G, K_B, M_EARTH, M_H};
use parker_transit::hydro::{
    Branch, MolecularWeight, Normalization, ParkerWindSolver, TemperatureProfile, WindError,
    WindParameters, dimensionless_velocity, sonic_radius, sound_speed,
};

const T_WIND: f64 = 9000.0;

fn earth_params(normalization: Normalization) -> WindParameters {
    WindParameters {
        planet_mass_g: M_EARTH,
        temperature: TemperatureProfile::Isothermal {
            temperature_k: T_WIND,
        },
        molecular_weight: MolecularWeight::Uniform(1.0),
        normalization,
    }
}

fn base_density() -> Normalization {
    Normalization::BaseDensity {
        radius_cm: 2.0e8,
        density_g_cm3: 1.0e10 * M_H,
    }
}

fn grid(inner: f64, outer: f64, points: usize) -> Arc<RadialGrid> {
    Arc::new(RadialGrid::geometric(inner, outer, points).unwrap())
}

fn residual(u: f64, lambda: f64) -> f64 {
    u * u - (u * u).ln() - (4.0 * lambda.ln() + 4.0 / lambda - 3.0)
}

#[test]
fn dimensionless_velocity_matches_reference_roots() {
    // reference roots from an independent bisection of u² − ln u² = 4 ln λ + 4/λ − 3
    let table = [
        (0.25, 0.024_061_991_778_852_61),
        (0.5, 0.348_951_607_563_859_7),
        (0.75, 0.714_682_364_134_020_2),
        (0.9, 0.894_743_358_458_248_6),
        (1.1, 1.095_242_010_566_474),
        (1.5, 1.401_071_756_820_753_4),
        (2.0, 1.674_345_757_248_721_5),
        (4.0, 2.278_676_618_695_341),
        (10.0, 2.963_642_819_169_469),
    ];
    for (lambda, expected) in table {
        let (u, branch) = dimensionless_velocity(lambda, 1e-14, 200).unwrap();
        assert!(
            (u - expected).abs() < 1e-4 * expected,
            "λ = {lambda}: u = {u}, expected {expected}"
        );
        let want = if lambda < 1.0 {
            Branch::Subsonic
        } else {
            Branch::Supersonic
        };
        assert_eq!(branch, want);
    }
}

#[test]
fn dimensionless_velocity_satisfies_relation_on_both_branches() {
    for lambda in [0.05, 0.2, 0.6, 0.99, 1.01, 3.0, 30.0, 300.0] {
        let (u, _) = dimensionless_velocity(lambda, 1e-14, 200).unwrap();
        let rhs = 4.0 * lambda.ln() + 4.0 / lambda - 3.0;
        assert!(
            residual(u, lambda).abs() < 1e-9 * rhs.max(1.0),
            "λ = {lambda}: residual {}",
            residual(u, lambda)
        );
    }
}

#[test]
fn sonic_point_is_exactly_sonic() {
    let (u, branch) = dimensionless_velocity(1.0, 1e-14, 200).unwrap();
    assert_eq!(u, 1.0);
    assert_eq!(branch, Branch::Sonic);
}

#[test]
fn earth_mass_wind_regression() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 400);
    let wind = solver.solve(&g, &earth_params(base_density()), None).unwrap();

    let cs = 861_673.182_624_812_9;
    let rs = 268_426_208.750_946_8;
    let mdot = 5_134_039_620.531_464;
    assert!((wind.sonic.sound_speed_cm_s - cs).abs() < 1e-9 * cs);
    assert!((wind.sonic.radius_cm - rs).abs() < 1e-9 * rs);
    assert!(
        (wind.mass_loss_rate_g_s - mdot).abs() < 1e-6 * mdot,
        "mdot = {}",
        wind.mass_loss_rate_g_s
    );
    assert!(wind.sonic_in_domain);
    assert!((wind.mean_molecular_weight - 1.0).abs() < 1e-12);

    let pressure = wind.pressure_profile();
    assert_eq!(pressure.len(), 400);
    for (i, p) in pressure.iter().enumerate() {
        assert!((p - wind.density_g_cm3[i] * cs * cs).abs() < 1e-9 * p);
    }
    assert!(pressure.windows(2).all(|w| w[1] < w[0]));
    let sonic = wind.sonic;
    assert!(
        (sonic.pressure_dyn_cm2 - sonic.density_g_cm3 * cs * cs).abs()
            < 1e-9 * sonic.pressure_dyn_cm2
    );
}

#[test]
fn sonic_radius_follows_sound_speed() {
    let cs = sound_speed(T_WIND, 0.6).unwrap();
    assert!((cs * cs - K_B * T_WIND / (0.6 * M_H)).abs() < 1e-9 * cs * cs);
    let rs = sonic_radius(M_EARTH, cs);
    let expected = G * M_EARTH / (2.0 * cs * cs);
    assert!((rs - expected).abs() < 1e-12 * expected);
    assert!(sound_speed(-1.0, 1.0).is_err());
    assert!(sound_speed(T_WIND, 0.0).is_err());
}

#[test]
fn mass_flux_is_conserved() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 200);
    let wind = solver
        .solve(
            &g,
            &earth_params(Normalization::MassLossRate { g_s: 1.0e10 }),
            None,
        )
        .unwrap();
    let structure = wind.to_structure(parker_transit::Composition::Hydrogen);
    let flux = structure.mass_flux_profile();
    let reference = 1.0e10 / (4.0 * std::f64::consts::PI);
    for (i, f) in flux.iter().enumerate() {
        assert!(
            (f - reference).abs() < 1e-10 * reference,
            "mass flux drifts at index {i}: {f}"
        );
    }
}

#[test]
fn velocity_is_monotonic_with_a_single_sonic_crossing() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 400);
    let wind = solver.solve(&g, &earth_params(base_density()), None).unwrap();

    for pair in wind.velocity_cm_s.windows(2) {
        assert!(pair[1] > pair[0]);
    }
    let mach = wind.mach_profile();
    let crossings = mach
        .windows(2)
        .filter(|w| (w[0] - 1.0).signum() != (w[1] - 1.0).signum())
        .count();
    assert_eq!(crossings, 1);

    // geometric grid from 2e8 to 2e10 in 400 points has r_s between indices 25 and 26
    assert_eq!(wind.segments.len(), 2);
    assert_eq!(wind.segments[0].branch, Branch::Subsonic);
    assert_eq!(wind.segments[0].indices, 0..26);
    assert_eq!(wind.segments[1].branch, Branch::Supersonic);
    assert_eq!(wind.segments[1].indices, 26..400);
    for i in wind.segments[0].indices.clone() {
        assert!(mach[i] < 1.0);
    }
    for i in wind.segments[1].indices.clone() {
        assert!(mach[i] > 1.0);
    }
}

#[test]
fn density_decreases_outward() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 100);
    let wind = solver.solve(&g, &earth_params(base_density()), None).unwrap();
    assert!((wind.density_g_cm3[0] - 1.0e10 * M_H).abs() < 1e-9 * 1.0e10 * M_H);
    for pair in wind.density_g_cm3.windows(2) {
        assert!(pair[1] < pair[0]);
    }
}

#[test]
fn uniform_profiles_reproduce_isothermal_closure() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 120);
    let normalization = Normalization::MassLossRate { g_s: 1.0e10 };
    let isothermal = solver.solve(&g, &earth_params(normalization), None).unwrap();

    let mut tabulated = earth_params(normalization);
    tabulated.temperature = TemperatureProfile::Tabulated {
        temperature_k: vec![T_WIND; g.len()],
    };
    tabulated.molecular_weight = MolecularWeight::Profile(vec![1.0; g.len()]);
    let profiled = solver
        .solve(&g, &tabulated, Some(&isothermal.velocity_cm_s))
        .unwrap();

    let rel = |a: f64, b: f64| (a - b).abs() / b.abs();
    assert!(rel(profiled.sonic.radius_cm, isothermal.sonic.radius_cm) < 1e-12);
    assert!(rel(profiled.mean_molecular_weight, 1.0) < 1e-12);
}

#[test]
fn lighter_gas_moves_the_sonic_point_inward() {
    let solver = ParkerWindSolver::default();
    let g = grid(1.0e8, 2.0e10, 120);
    let neutral = solver
        .solve(&g, &earth_params(base_density()), None)
        .unwrap();
    let mut ionized_params = earth_params(base_density());
    ionized_params.molecular_weight = MolecularWeight::Uniform(0.5);
    let ionized = solver.solve(&g, &ionized_params, None).unwrap();
    let expected = 0.5 * neutral.sonic.radius_cm;
    assert!((ionized.sonic.radius_cm - expected).abs() < 1e-12 * expected);
    assert!(ionized.sonic.sound_speed_cm_s > neutral.sonic.sound_speed_cm_s);
}

#[test]
fn sonic_point_below_the_grid_is_rejected() {
    let solver = ParkerWindSolver::default();
    let g = grid(5.0e8, 5.0e10, 50);
    let err = solver
        .solve(&g, &earth_params(base_density()), None)
        .unwrap_err();
    match err {
        WindError::NoTransonicSolution {
            sonic_radius_cm,
            inner_radius_cm,
        } => {
            assert!(sonic_radius_cm < inner_radius_cm);
            assert_eq!(inner_radius_cm, 5.0e8);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn sonic_point_beyond_the_grid_leaves_a_subsonic_wind() {
    let solver = ParkerWindSolver::default();
    let g = grid(1.0e8, 2.0e8, 40);
    let wind = solver
        .solve(&g, &earth_params(Normalization::MassLossRate { g_s: 1.0e9 }), None)
        .unwrap();
    assert!(!wind.sonic_in_domain);
    assert!(wind.mach_profile().iter().all(|u| *u < 1.0));
    assert_eq!(wind.segments[0].indices, 0..40);
    assert!(wind.segments[1].indices.is_empty());
}

#[test]
fn invalid_inputs_are_reported_as_domain_errors() {
    let solver = ParkerWindSolver::default();
    let g = grid(2.0e8, 2.0e10, 50);

    let mut params = earth_params(base_density());
    params.planet_mass_g = 0.0;
    assert!(matches!(
        solver.solve(&g, &params, None),
        Err(WindError::Domain(_))
    ));

    let mut params = earth_params(base_density());
    params.temperature = TemperatureProfile::Isothermal {
        temperature_k: -10.0,
    };
    assert!(matches!(
        solver.solve(&g, &params, None),
        Err(WindError::Domain(_))
    ));

    let mut params = earth_params(base_density());
    params.molecular_weight = MolecularWeight::Profile(vec![1.0; 3]);
    assert!(matches!(
        solver.solve(&g, &params, None),
        Err(WindError::Domain(_))
    ));

    let params = earth_params(Normalization::MassLossRate { g_s: -1.0 });
    assert!(matches!(
        solver.solve(&g, &params, None),
        Err(WindError::Domain(_))
    ));

    assert!(RadialGrid::new(vec![1.0]).is_err());
    assert!(RadialGrid::new(vec![1.0, 1.0, 2.0]).is_err());
    assert!(RadialGrid::new(vec![-1.0, 2.0]).is_err());
}
