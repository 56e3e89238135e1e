//! The `modeinterp` crate interpolates per-mode quantities, like phonon
//! eigenvalues and eigenvectors, stored on the vertices of a mesh, keeping
//! modes consistently ordered and respecting the point symmetry of the system.
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod io;
pub mod modes;
pub mod num;
pub mod symmetry;

pub use error::{ModeError, Result};
pub use interpolation::{fip, InterpolatorConfig, ModeInterpolator};
pub use modes::{
    cost::{CostSpec, ScalarCost, VectorCost},
    permutation::EqualModeSearch,
    rotation::RotatesLike,
    LayoutKind, ModeLayout,
};
pub use symmetry::{GammaTable, PointSymmetry, SymmetryMapping, TrivialGammaTable};
