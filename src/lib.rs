//! Parker wind and transit spectrum toolkit.
//!
//! The solver crates are re-exported under short names; [`scenario`] wires a
//! scenario manifest through the structure iteration and the radiative
//! transfer so that front-ends (the CLI binaries, tests) share one pipeline.

pub mod scenario;

pub use wind_config as config;
pub use wind_core::{constants, units};
pub use wind_core::{
    AtmosphericStructure, Composition, DomainError, Ion, IonizationState, RadialGrid,
};
pub use wind_export as export;
pub use wind_hydro as hydro;
pub use wind_ionization as ionization;
pub use wind_structure as structure;
pub use wind_transit as transit;

