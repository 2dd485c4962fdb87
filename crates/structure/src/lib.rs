//! Structure façade crate coupling the wind and ionization solvers.

pub mod iteration;

pub use facade::*;
pub use wind_hydro as hydro;
pub use wind_ionization as ionization;

mod facade;
