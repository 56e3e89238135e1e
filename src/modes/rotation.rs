//! Transformation of mode data under point symmetry operations.

use super::{LayoutKind, ModeLayout};
use crate::{
    error::{ModeError, Result},
    geometry::{Dim3, Matrix3},
    interpolation::fip,
    num::ModeScalar,
    symmetry::{GammaTable, PointSymmetry, SymmetryMapping},
};
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// How the vectors and matrices of mode data transform under a symmetry operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum RotatesLike {
    /// Ordinary real-space quantities, transformed by `W`.
    #[default]
    Real,
    /// Quantities expressed in the reciprocal basis, transformed by `(W^-1)^T`.
    Reciprocal,
    /// Pseudovectors and pseudotensors, transformed by `det(W) W`.
    Axial,
    /// Phonon eigenvectors, transformed by `W` and additionally permuted
    /// and phased according to a Gamma table.
    Gamma,
}

impl RotatesLike {
    /// Decodes the integer code of a rotation behaviour.
    ///
    /// # Errors
    ///
    /// Returns an error if the code does not correspond to any behaviour.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(Self::Real),
            1 => Ok(Self::Reciprocal),
            2 => Ok(Self::Axial),
            3 => Ok(Self::Gamma),
            _ => Err(ModeError::UnknownRotatesLike(code)),
        }
    }

    /// Integer code of the rotation behaviour.
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for RotatesLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Real => "real",
            Self::Reciprocal => "reciprocal",
            Self::Axial => "axial",
            Self::Gamma => "Gamma",
        })
    }
}

/// Rule for transforming the vectors and matrices of a single mode.
///
/// Source and target blocks hold the flattened vectors (3 elements each)
/// or matrices (9 elements each, row-major) of one mode.
pub trait RotationRule<T: ModeScalar>: Sync {
    /// Whether applying the given operation leaves all data unchanged.
    fn leaves_unchanged(&self, _operation: usize) -> bool {
        false
    }

    /// Writes the transformed vectors of `source` into `target`.
    fn rotate_vectors(&self, representative: usize, operation: usize, source: &[T], target: &mut [T]);

    /// Writes the transformed matrices of `source` into `target`.
    fn rotate_matrices(&self, representative: usize, operation: usize, source: &[T], target: &mut [T]);
}

/// Applies `matrix` to the 3-vector `source`, writing the result into `target`.
fn transform_vector<T: ModeScalar>(matrix: &Matrix3<fip>, source: &[T], target: &mut [T]) {
    for row in Dim3::slice() {
        target[row.num()] = Dim3::slice().iter().fold(T::zero(), |sum, &column| {
            sum + source[column.num()].scaled(matrix.element(row, column))
        });
    }
}

/// Computes `R M R^T` for the row-major 3x3 matrix `source`, writing the result into `target`.
fn transform_matrix<T: ModeScalar>(matrix: &Matrix3<fip>, source: &[T], target: &mut [T]) {
    for i in Dim3::slice() {
        for j in Dim3::slice() {
            let mut sum = T::zero();
            for k in Dim3::slice() {
                for l in Dim3::slice() {
                    let factor = matrix.element(i, k) * matrix.element(j, l);
                    if factor != 0.0 {
                        sum = sum + source[3 * k.num() + l.num()].scaled(factor);
                    }
                }
            }
            target[3 * i.num() + j.num()] = sum;
        }
    }
}

/// Rotation rule for quantities that transform with a single matrix per operation.
#[derive(Clone, Debug)]
pub struct GeometricRule {
    matrices: Vec<Matrix3<fip>>,
    identities: Vec<bool>,
}

impl GeometricRule {
    /// Creates the rule for the given rotation behaviour, precomputing the
    /// matrix used for each operation.
    ///
    /// For `Gamma` only the geometric part `W` is applied; the permutation and
    /// phases of elements require a `GammaRule`.
    pub fn new(rotates_like: RotatesLike, symmetry: &PointSymmetry) -> Self {
        let matrices: Vec<_> = symmetry
            .operations()
            .iter()
            .map(|op| match rotates_like {
                RotatesLike::Real | RotatesLike::Gamma => *op.matrix(),
                RotatesLike::Reciprocal => *op.reciprocal_matrix(),
                RotatesLike::Axial => op.axial_matrix(),
            })
            .collect();
        let identities = matrices.iter().map(Matrix3::is_identity).collect();
        Self {
            matrices,
            identities,
        }
    }

    /// Matrix applied for the given operation.
    pub fn matrix(&self, operation: usize) -> &Matrix3<fip> {
        &self.matrices[operation]
    }
}

impl<T: ModeScalar> RotationRule<T> for GeometricRule {
    fn leaves_unchanged(&self, operation: usize) -> bool {
        self.identities[operation]
    }

    fn rotate_vectors(&self, _representative: usize, operation: usize, source: &[T], target: &mut [T]) {
        let matrix = &self.matrices[operation];
        source
            .chunks_exact(3)
            .zip(target.chunks_exact_mut(3))
            .for_each(|(source, target)| transform_vector(matrix, source, target));
    }

    fn rotate_matrices(&self, _representative: usize, operation: usize, source: &[T], target: &mut [T]) {
        let matrix = &self.matrices[operation];
        source
            .chunks_exact(9)
            .zip(target.chunks_exact_mut(9))
            .for_each(|(source, target)| transform_matrix(matrix, source, target));
    }
}

/// Rotation rule for phonon eigenvector-like quantities.
///
/// Element `k` of a mode is rotated by `W`, multiplied by the phase given by
/// the Gamma table and moved to the element the table maps `k` to.
pub struct GammaRule<'a> {
    matrices: Vec<Matrix3<fip>>,
    table: &'a dyn GammaTable,
}

impl<'a> GammaRule<'a> {
    /// Creates a new Gamma rotation rule for data with the given layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the table moves any vector or matrix beyond the
    /// number of vectors or matrices per mode.
    pub fn new(
        symmetry: &PointSymmetry,
        table: &'a dyn GammaTable,
        layout: &ModeLayout,
    ) -> Result<Self> {
        for operation in 0..symmetry.len() {
            for count in [layout.vector_count(), layout.matrix_count()] {
                for element in 0..count {
                    let target = table.rotated_element(operation, element);
                    if target >= count {
                        return Err(ModeError::GammaElementOutOfRange {
                            operation,
                            element,
                            target,
                            count,
                        });
                    }
                }
            }
        }
        Ok(Self {
            matrices: symmetry.rotation_matrices(),
            table,
        })
    }
}

impl<'a, T: ModeScalar> RotationRule<T> for GammaRule<'a> {
    fn rotate_vectors(&self, representative: usize, operation: usize, source: &[T], target: &mut [T]) {
        let matrix = &self.matrices[operation];
        for (element, source) in source.chunks_exact(3).enumerate() {
            let moved_to = self.table.rotated_element(operation, element);
            let phase = self.table.phase(representative, operation, element);
            let target = &mut target[3 * moved_to..3 * (moved_to + 1)];
            transform_vector(matrix, source, target);
            target.iter_mut().for_each(|value| *value = value.phased(phase));
        }
    }

    fn rotate_matrices(&self, representative: usize, operation: usize, source: &[T], target: &mut [T]) {
        let matrix = &self.matrices[operation];
        for (element, source) in source.chunks_exact(9).enumerate() {
            let moved_to = self.table.rotated_element(operation, element);
            let phase = self.table.phase(representative, operation, element);
            let target = &mut target[9 * moved_to..9 * (moved_to + 1)];
            transform_matrix(matrix, source, target);
            target.iter_mut().for_each(|value| *value = value.phased(phase));
        }
    }
}

/// Creates the rotation rule for data with the given element type, layout
/// and rotation behaviour.
///
/// # Errors
///
/// Returns an error if Gamma rotation is requested for real data, without
/// a Gamma table, or with a table inconsistent with the layout.
pub fn rotation_rule<'a, T: ModeScalar>(
    rotates_like: RotatesLike,
    mapping: &SymmetryMapping<'a>,
    layout: &ModeLayout,
) -> Result<Box<dyn RotationRule<T> + 'a>> {
    match rotates_like {
        RotatesLike::Gamma => {
            if !T::IS_COMPLEX {
                return Err(ModeError::GammaRequiresComplex);
            }
            let table = mapping.gamma_table().ok_or(ModeError::MissingGammaTable)?;
            Ok(Box::new(GammaRule::new(mapping.symmetry(), table, layout)?))
        }
        _ => Ok(Box::new(GeometricRule::new(rotates_like, mapping.symmetry()))),
    }
}

/// Scratch storage for rotating the data of one vertex.
///
/// Each worker thread owns one workspace for the duration of its items.
#[derive(Clone, Debug)]
pub struct RotationWorkspace<T> {
    source: Vec<T>,
}

impl<T: ModeScalar> RotationWorkspace<T> {
    /// Creates a new workspace for vertices with `elements_per_point` elements.
    pub fn new(elements_per_point: usize) -> Self {
        Self {
            source: Vec::with_capacity(elements_per_point),
        }
    }
}

/// Transforms the data of a single vertex in place.
///
/// # Parameters
///
/// - `rule`: Rotation rule to apply.
/// - `layout`: Element layout of each mode.
/// - `kind`: Interpretation of the data shape.
/// - `representative`: Index of the irreducible vertex the data belongs to.
/// - `operation`: Index of the symmetry operation to apply.
/// - `row`: Data of all modes at the vertex, one block of `layout.branch_span()` per mode.
/// - `workspace`: Scratch storage.
///
/// # Returns
///
/// Whether any value changed.
pub fn rotate_row<T, R>(
    rule: &R,
    layout: &ModeLayout,
    kind: LayoutKind,
    representative: usize,
    operation: usize,
    row: &mut [T],
    workspace: &mut RotationWorkspace<T>,
) -> bool
where
    T: ModeScalar,
    R: RotationRule<T> + ?Sized,
{
    if rule.leaves_unchanged(operation) {
        return false;
    }
    let span = layout.branch_span();
    if span == 0 || layout.vector_count() + layout.matrix_count() == 0 {
        return false;
    }
    workspace.source.clear();
    workspace.source.extend_from_slice(row);

    for (source, target) in workspace
        .source
        .chunks_exact(span)
        .zip(row.chunks_exact_mut(span))
    {
        match kind {
            LayoutKind::PureVector => rule.rotate_vectors(representative, operation, source, target),
            LayoutKind::PureMatrix => {
                rule.rotate_matrices(representative, operation, source, target)
            }
            LayoutKind::Mixed => {
                let vectors = layout.vector_range();
                let matrices = layout.matrix_range();
                rule.rotate_vectors(
                    representative,
                    operation,
                    &source[vectors.clone()],
                    &mut target[vectors],
                );
                rule.rotate_matrices(
                    representative,
                    operation,
                    &source[matrices.clone()],
                    &mut target[matrices],
                );
            }
        }
    }
    row != workspace.source.as_slice()
}
