//! Per-mode element layouts and the components operating on mode blocks.
//!
//! Each mesh vertex stores the same number of modes, and each mode owns a
//! contiguous block of `branch_span` raw elements: first its scalars, then the
//! components of its 3-vectors, then the components of its 3x3 matrices.

pub mod cost;
pub mod permutation;
pub mod rotation;

use crate::error::{ModeError, Result};
use std::{fmt, ops::Range};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Number of raw elements of each element type owned by a single mode.
///
/// Counts are in raw scalar units, so a vector contributes 3 elements
/// and a matrix 9. A layout with all counts zero is unset and will be
/// inferred from the shape of the data it describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct ModeLayout {
    scalars: usize,
    vector_elements: usize,
    matrix_elements: usize,
}

/// How the elements of mode data can be interpreted from its shape alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutKind {
    /// Scalars, vectors and matrices described by a `ModeLayout` (1- to 3-D data).
    Mixed,
    /// Only 3-vectors, shape `(P, B, V, 3)`.
    PureVector,
    /// Only 3x3 matrices, shape `(P, B, M, 3, 3)`.
    PureMatrix,
}

impl ModeLayout {
    /// Creates a new layout from raw element counts per mode.
    ///
    /// # Errors
    ///
    /// If the vector or matrix element counts are not multiples of 3 or 9.
    pub fn new(scalars: usize, vector_elements: usize, matrix_elements: usize) -> Result<Self> {
        if vector_elements % 3 != 0 {
            return Err(ModeError::VectorElementCount(vector_elements));
        }
        if matrix_elements % 9 != 0 {
            return Err(ModeError::MatrixElementCount(matrix_elements));
        }
        Ok(Self {
            scalars,
            vector_elements,
            matrix_elements,
        })
    }

    /// Creates a new layout from the number of scalars, vectors and matrices per mode.
    pub fn from_counts(scalars: usize, vectors: usize, matrices: usize) -> Self {
        Self {
            scalars,
            vector_elements: 3 * vectors,
            matrix_elements: 9 * matrices,
        }
    }

    /// Creates an unset layout, to be inferred from the data shape.
    pub fn unset() -> Self {
        Self::default()
    }

    /// Whether no element counts have been specified.
    pub fn is_unset(&self) -> bool {
        self.branch_span() == 0
    }

    /// Number of scalars per mode.
    pub fn scalar_count(&self) -> usize {
        self.scalars
    }

    /// Number of 3-vectors per mode.
    pub fn vector_count(&self) -> usize {
        self.vector_elements / 3
    }

    /// Number of 3x3 matrices per mode.
    pub fn matrix_count(&self) -> usize {
        self.matrix_elements / 9
    }

    /// Number of raw vector components per mode.
    pub fn vector_elements(&self) -> usize {
        self.vector_elements
    }

    /// Number of raw matrix components per mode.
    pub fn matrix_elements(&self) -> usize {
        self.matrix_elements
    }

    /// Total number of raw elements per mode.
    pub fn branch_span(&self) -> usize {
        self.scalars + self.vector_elements + self.matrix_elements
    }

    /// Range of the scalars within a mode block.
    pub fn scalar_range(&self) -> Range<usize> {
        0..self.scalars
    }

    /// Range of the vector components within a mode block.
    pub fn vector_range(&self) -> Range<usize> {
        self.scalars..self.scalars + self.vector_elements
    }

    /// Range of the matrix components within a mode block.
    pub fn matrix_range(&self) -> Range<usize> {
        let start = self.scalars + self.vector_elements;
        start..start + self.matrix_elements
    }

    /// Validates the layout against the given data shape, inferring any
    /// unset counts, and returns the resulting layout.
    ///
    /// Admissible shapes are
    ///
    /// - `(P,)`: one scalar per point.
    /// - `(P, X)`: `X / branch_span` modes per point.
    /// - `(P, B, Y)`: `B` modes of `Y = branch_span` elements.
    /// - `(P, B, V, 3)`: `B` modes of `V` vectors.
    /// - `(P, B, M, 3, 3)`: `B` modes of `M` matrices.
    ///
    /// # Errors
    ///
    /// If the shape is not one of the above or disagrees with the layout.
    pub fn inferred_for_shape(self, shape: &[usize]) -> Result<Self> {
        let mut layout = self;
        let span = layout.branch_span();
        match shape.len() {
            1 => {
                if span == 0 {
                    layout.scalars = 1;
                } else if span > 1 {
                    return Err(ModeError::ScalarPerPoint(span));
                }
            }
            2 => {
                if span == 0 {
                    layout.scalars = shape[1];
                }
                let span = layout.branch_span();
                if span == 0 || shape[1] % span != 0 {
                    return Err(ModeError::NonIntegerModeCount {
                        elements: shape[1],
                        span,
                    });
                }
            }
            3 => {
                if span == 0 {
                    layout.scalars = shape[2];
                }
                if shape[2] != layout.branch_span() {
                    return Err(ModeError::LayoutMismatch {
                        expected: layout.branch_span(),
                        found: shape[2],
                    });
                }
            }
            4 => {
                if shape[3] != 3 {
                    return Err(ModeError::NotVectorsOrMatrices {
                        dimensions: 4,
                        kind: "3-vectors",
                        shape: shape.to_vec(),
                    });
                }
                if span == 0 {
                    layout.vector_elements = 3 * shape[2];
                }
                layout.require_pure(3 * shape[2], 0, "3-vectors")?;
            }
            5 => {
                if shape[3] != 3 || shape[4] != 3 {
                    return Err(ModeError::NotVectorsOrMatrices {
                        dimensions: 5,
                        kind: "matrices",
                        shape: shape.to_vec(),
                    });
                }
                if span == 0 {
                    layout.matrix_elements = 9 * shape[2];
                }
                layout.require_pure(0, 9 * shape[2], "matrices")?;
            }
            _ => return Err(ModeError::UnsupportedShape(shape.to_vec())),
        }
        if layout.branch_span() == 0 {
            return Err(ModeError::EmptyModes);
        }
        Ok(layout)
    }

    fn require_pure(
        &self,
        vector_elements: usize,
        matrix_elements: usize,
        kind: &'static str,
    ) -> Result<()> {
        if self.branch_span() != vector_elements + matrix_elements {
            Err(ModeError::LayoutMismatch {
                expected: self.branch_span(),
                found: vector_elements + matrix_elements,
            })
        } else if self.vector_elements != vector_elements
            || self.matrix_elements != matrix_elements
        {
            Err(ModeError::NotPureLayout {
                kind,
                scalars: self.scalars,
                vector_elements: self.vector_elements,
                matrix_elements: self.matrix_elements,
            })
        } else {
            Ok(())
        }
    }

    /// Number of modes per point for data of the given shape described by this layout.
    ///
    /// Only for 2-D data does the mode count depend on the layout,
    /// since the second axis then holds all elements of all modes.
    pub fn branches_for_shape(&self, shape: &[usize]) -> usize {
        let mut branches = if shape.len() > 1 { shape[1] } else { 1 };
        if shape.len() == 2 {
            let span = self.branch_span();
            if span > 0 {
                branches /= span;
            }
        }
        branches
    }
}

impl fmt::Display for ModeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            (self.scalar_count(), "scalar"),
            (self.vector_count(), "vector"),
            (self.matrix_count(), "matrix"),
        ]
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, name)| format!("{} {}", count, name))
        .collect();

        match parts.split_last() {
            None => f.write_str("no elements"),
            Some((last, [])) => write!(f, "{}", last),
            Some((last, init)) => write!(f, "{} and {}", init.join(", "), last),
        }?;

        let n_elements = self.scalar_count() + self.vector_count() + self.matrix_count();
        match n_elements {
            0 => Ok(()),
            1 => f.write_str(" element"),
            _ => f.write_str(" elements"),
        }
    }
}

impl LayoutKind {
    /// Determines the kind of layout implied by the given data shape.
    ///
    /// # Errors
    ///
    /// If the shape has no valid interpretation.
    pub fn of_shape(shape: &[usize]) -> Result<Self> {
        match shape.len() {
            5 if shape[3] == 3 && shape[4] == 3 => Ok(Self::PureMatrix),
            4 if shape[3] == 3 => Ok(Self::PureVector),
            1..=3 => Ok(Self::Mixed),
            _ => Err(ModeError::UnsupportedShape(shape.to_vec())),
        }
    }

    /// Whether the data holds only vectors or only matrices.
    pub fn is_pure(self) -> bool {
        !matches!(self, Self::Mixed)
    }
}
