//! Point symmetry operations and the maps relating mesh vertices to
//! their symmetry-irreducible representatives.

use crate::{
    error::{ModeError, Result},
    geometry::Matrix3,
    interpolation::fip,
};
use num::Complex;
use std::fmt;

/// Determinants smaller than this in magnitude indicate a singular operation.
const SINGULARITY_TOLERANCE: fip = 1e-10;

/// Largest element-wise deviation for two operation matrices to be considered equal.
const MATRIX_MATCH_TOLERANCE: fip = 1e-8;

/// A rotation or rotoinversion of a point group, expressed in the basis of
/// the vectors it acts on.
#[derive(Clone, Debug, PartialEq)]
pub struct SymmetryOperation {
    matrix: Matrix3<fip>,
    reciprocal_matrix: Matrix3<fip>,
    determinant: fip,
}

impl SymmetryOperation {
    /// Creates a new symmetry operation from its matrix, or returns `None`
    /// if the matrix is singular.
    pub fn new(matrix: Matrix3<fip>) -> Option<Self> {
        let inverse = matrix.inverse(SINGULARITY_TOLERANCE)?;
        Some(Self {
            matrix,
            reciprocal_matrix: inverse.transposed(),
            determinant: matrix.determinant(),
        })
    }

    /// Matrix `W` of the operation.
    pub fn matrix(&self) -> &Matrix3<fip> {
        &self.matrix
    }

    /// Matrix `(W^-1)^T` acting on quantities expressed in the reciprocal basis.
    pub fn reciprocal_matrix(&self) -> &Matrix3<fip> {
        &self.reciprocal_matrix
    }

    /// Computes the inverse `W^-1` of the operation matrix.
    pub fn inverse(&self) -> Matrix3<fip> {
        self.reciprocal_matrix.transposed()
    }

    /// Computes the matrix `det(W) W` acting on axial vectors.
    pub fn axial_matrix(&self) -> Matrix3<fip> {
        self.matrix.scaled(self.determinant.signum())
    }

    pub fn determinant(&self) -> fip {
        self.determinant
    }

    /// Whether the operation preserves handedness.
    pub fn is_proper(&self) -> bool {
        self.determinant > 0.0
    }

    /// Whether the operation leaves all vectors unchanged.
    pub fn is_identity(&self) -> bool {
        self.matrix.is_identity()
    }

    fn matches(&self, matrix: &Matrix3<fip>) -> bool {
        self.matrix
            .to_flat()
            .iter()
            .zip(matrix.to_flat().iter())
            .all(|(a, b)| (a - b).abs() <= MATRIX_MATCH_TOLERANCE)
    }
}

/// An ordered list of point symmetry operations.
#[derive(Clone, Debug, PartialEq)]
pub struct PointSymmetry {
    operations: Vec<SymmetryOperation>,
}

impl PointSymmetry {
    /// Creates a new point symmetry from the given operation matrices.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the matrices is singular.
    pub fn from_matrices<I>(matrices: I) -> Result<Self>
    where
        I: IntoIterator<Item = Matrix3<fip>>,
    {
        let operations = matrices
            .into_iter()
            .enumerate()
            .map(|(idx, matrix)| {
                SymmetryOperation::new(matrix).ok_or(ModeError::SingularOperation(idx))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { operations })
    }

    /// Creates a point symmetry holding only the identity operation.
    pub fn trivial() -> Self {
        Self {
            operations: vec![SymmetryOperation {
                matrix: Matrix3::identity(),
                reciprocal_matrix: Matrix3::identity(),
                determinant: 1.0,
            }],
        }
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the operation with the given index, if it exists.
    pub fn get(&self, idx: usize) -> Option<&SymmetryOperation> {
        self.operations.get(idx)
    }

    pub fn operations(&self) -> &[SymmetryOperation] {
        &self.operations
    }

    /// Collects the operation matrices in order.
    pub fn rotation_matrices(&self) -> Vec<Matrix3<fip>> {
        self.operations.iter().map(|op| op.matrix).collect()
    }

    /// Finds the index of the operation whose matrix matches the given one.
    pub fn find(&self, matrix: &Matrix3<fip>) -> Option<usize> {
        self.operations.iter().position(|op| op.matches(matrix))
    }

    /// Finds the index of the identity operation.
    pub fn identity_index(&self) -> Option<usize> {
        self.find(&Matrix3::identity())
    }

    /// Finds the index of the operation equal to applying operation `second`
    /// after operation `first`, i.e. with matrix `W_second W_first`.
    ///
    /// Returns `None` if either index is out of range or if the product
    /// is not part of the point symmetry.
    pub fn compose(&self, second: usize, first: usize) -> Option<usize> {
        let product = self.get(second)?.matrix() * self.get(first)?.matrix();
        self.find(&product)
    }
}

impl fmt::Display for PointSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_proper = self.operations.iter().filter(|op| op.is_proper()).count();
        write!(
            f,
            "{} operations ({} proper, {} improper)",
            self.len(),
            n_proper,
            self.len() - n_proper
        )
    }
}

/// Lookup of how symmetry operations permute and phase the elements of
/// each mode, for quantities that rotate like phonon eigenvectors.
///
/// Element indices refer to the vectors (or matrices) within a single mode.
pub trait GammaTable: Sync {
    /// Index of the element that element `element` is moved to by operation `operation`.
    fn rotated_element(&self, operation: usize, element: usize) -> usize;

    /// Phase factor acquired by element `element` when operation `operation`
    /// is applied at irreducible vertex `vertex`.
    fn phase(&self, vertex: usize, operation: usize, element: usize) -> Complex<fip>;
}

/// Gamma table that keeps every element in place with a unit phase.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrivialGammaTable;

impl GammaTable for TrivialGammaTable {
    fn rotated_element(&self, _operation: usize, element: usize) -> usize {
        element
    }

    fn phase(&self, _vertex: usize, _operation: usize, _element: usize) -> Complex<fip> {
        Complex::new(1.0, 0.0)
    }
}

/// Relation between the vertices of a mesh and the symmetry operations
/// that produce their data from that of irreducible representative vertices.
#[derive(Clone, Copy)]
pub struct SymmetryMapping<'a> {
    symmetry: &'a PointSymmetry,
    representatives: &'a [usize],
    operations: &'a [usize],
    gamma_table: Option<&'a dyn GammaTable>,
}

impl<'a> SymmetryMapping<'a> {
    /// Creates a new symmetry mapping.
    ///
    /// # Parameters
    ///
    /// - `symmetry`: Ordered point symmetry operations.
    /// - `representatives`: Index of the irreducible vertex representing each vertex.
    /// - `operations`: Index of the operation taking each representative to its vertex.
    pub fn new(
        symmetry: &'a PointSymmetry,
        representatives: &'a [usize],
        operations: &'a [usize],
    ) -> Self {
        Self {
            symmetry,
            representatives,
            operations,
            gamma_table: None,
        }
    }

    /// Returns a copy of the mapping using the given Gamma table.
    pub fn with_gamma_table(mut self, gamma_table: &'a dyn GammaTable) -> Self {
        self.gamma_table = Some(gamma_table);
        self
    }

    pub fn symmetry(&self) -> &'a PointSymmetry {
        self.symmetry
    }

    pub fn representatives(&self) -> &'a [usize] {
        self.representatives
    }

    pub fn operations(&self) -> &'a [usize] {
        self.operations
    }

    pub fn gamma_table(&self) -> Option<&'a dyn GammaTable> {
        self.gamma_table
    }

    /// Number of vertices covered by the mapping.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Checks that the mapping covers `vertices` vertices and only refers
    /// to existing operations.
    ///
    /// # Errors
    ///
    /// Returns an error if a map has the wrong length or an operation
    /// index is out of range.
    pub fn validate(&self, vertices: usize) -> Result<()> {
        if self.representatives.len() != vertices {
            return Err(ModeError::MappingLengthMismatch {
                what: "representative indices",
                expected: vertices,
                found: self.representatives.len(),
            });
        }
        if self.operations.len() != vertices {
            return Err(ModeError::MappingLengthMismatch {
                what: "operation indices",
                expected: vertices,
                found: self.operations.len(),
            });
        }
        let count = self.symmetry.len();
        match self.operations.iter().find(|&&index| index >= count) {
            Some(&index) => Err(ModeError::OperationOutOfRange { index, count }),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::Debug for SymmetryMapping<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetryMapping")
            .field("symmetry", &self.symmetry)
            .field("representatives", &self.representatives)
            .field("operations", &self.operations)
            .field("has_gamma_table", &self.gamma_table.is_some())
            .finish()
    }
}
