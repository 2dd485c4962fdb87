//! Re-exported APIs for consumers of the structure crate.

pub use crate::iteration::{
    ConvergenceState, IterationSettings, NonConvergence, StructureDiagnostics, StructureError,
    StructureIterator, StructureProblem, StructureSolution,
};
pub use wind_hydro::{
    Branch, MolecularWeight, Normalization, ParkerWindSolver, SolverSettings, TemperatureProfile,
    WindError, WindParameters, WindSolution,
};
pub use wind_ionization::{
    AtomicData, BalanceSettings, IonizationBalanceSolver, IonizationError, IonizationSolution,
    StandardAtomicData, StellarSpectrum,
};
