//! Dissimilarity costs between modes.

use super::{LayoutKind, ModeLayout};
use crate::{
    error::{ModeError, Result},
    interpolation::fip,
    num::ModeScalar,
};
use std::fmt;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Distance measure used for blocks of scalars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum ScalarCost {
    /// Sum of the magnitudes of the element-wise differences.
    #[default]
    AbsoluteSum,
    /// Euclidean norm of the element-wise differences.
    Euclidean,
}

/// Distance measure used for blocks of vector or matrix components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum VectorCost {
    /// Euclidean norm of the difference `|a - b|`.
    Distance,
    /// One minus the normalized real inner product.
    InverseProduct,
    /// Angle between the vectors.
    Angle,
    /// Hermitian angle, insensitive to a global phase.
    HermitianAngle,
    /// Squared sine of the Hermitian angle, near zero for collinear vectors.
    #[default]
    SinSquaredHermitianAngle,
}

/// Selection of distance measures and the relative weight of each element type.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CostSpec {
    /// Distance measure for scalars.
    pub scalar: ScalarCost,
    /// Distance measure for vectors and matrices.
    pub vector: VectorCost,
    /// Multiplicative weights for scalar, vector and matrix distances.
    pub weights: [fip; 3],
}

impl ScalarCost {
    /// Selects a scalar distance from its integer code.
    ///
    /// Unknown codes select the default.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Euclidean,
            _ => Self::AbsoluteSum,
        }
    }

    /// Computes the distance between two equally long blocks of scalars.
    pub fn distance<T: ModeScalar>(self, a: &[T], b: &[T]) -> fip {
        let differences = a.iter().zip(b).map(|(&x, &y)| x - y);
        match self {
            Self::AbsoluteSum => differences.map(ModeScalar::magnitude).sum(),
            Self::Euclidean => differences.map(ModeScalar::norm_sqr).sum::<fip>().sqrt(),
        }
    }
}

impl fmt::Display for ScalarCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AbsoluteSum => "sum of absolute differences",
            Self::Euclidean => "Euclidean distance",
        })
    }
}

impl VectorCost {
    /// Selects a vector distance from its integer code.
    ///
    /// Unknown codes select the default.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Distance,
            2 => Self::InverseProduct,
            3 => Self::Angle,
            4 => Self::HermitianAngle,
            _ => Self::SinSquaredHermitianAngle,
        }
    }

    /// Computes the distance between two equally long flattened vector blocks.
    pub fn distance<T: ModeScalar>(self, a: &[T], b: &[T]) -> fip {
        match self {
            Self::Distance => a
                .iter()
                .zip(b)
                .map(|(&x, &y)| (x - y).norm_sqr())
                .sum::<fip>()
                .sqrt(),
            Self::InverseProduct => {
                1.0 - Self::normalized_product(a, b).map_or(1.0, |p| p.real.clamp(-1.0, 1.0))
            }
            Self::Angle => Self::normalized_product(a, b)
                .map_or(0.0, |p| p.real.clamp(-1.0, 1.0).acos()),
            Self::HermitianAngle => Self::normalized_product(a, b)
                .map_or(0.0, |p| p.magnitude.clamp(0.0, 1.0).acos()),
            Self::SinSquaredHermitianAngle => Self::normalized_product(a, b).map_or(0.0, |p| {
                let cos_theta = p.magnitude.clamp(0.0, 1.0);
                1.0 - cos_theta * cos_theta
            }),
        }
    }

    /// Computes the Hermitian inner product `sum(conj(a)*b)` divided by the
    /// norms of both blocks, or `None` if both blocks are zero.
    ///
    /// A single zero block is treated as orthogonal to the other.
    fn normalized_product<T: ModeScalar>(a: &[T], b: &[T]) -> Option<NormalizedProduct> {
        let norm_a = a.iter().map(|x| x.norm_sqr()).sum::<fip>().sqrt();
        let norm_b = b.iter().map(|x| x.norm_sqr()).sum::<fip>().sqrt();
        if norm_a == 0.0 && norm_b == 0.0 {
            return None;
        }
        if norm_a == 0.0 || norm_b == 0.0 {
            return Some(NormalizedProduct {
                real: 0.0,
                magnitude: 0.0,
            });
        }
        let product = a
            .iter()
            .zip(b)
            .fold(T::zero(), |sum, (&x, &y)| sum + x.conjugate() * y);
        let norm = norm_a * norm_b;
        Some(NormalizedProduct {
            real: product.real_part() / norm,
            magnitude: product.magnitude() / norm,
        })
    }
}

struct NormalizedProduct {
    real: fip,
    magnitude: fip,
}

impl fmt::Display for VectorCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "vector distance",
            Self::InverseProduct => "1 - vector product",
            Self::Angle => "vector angle",
            Self::HermitianAngle => "Hermitian angle",
            Self::SinSquaredHermitianAngle => "sin**2(Hermitian angle)",
        })
    }
}

impl CostSpec {
    pub const DEFAULT_WEIGHTS: [fip; 3] = [1.0, 1.0, 1.0];

    /// Creates a new cost specification with unit weights.
    pub fn new(scalar: ScalarCost, vector: VectorCost) -> Self {
        Self {
            scalar,
            vector,
            weights: Self::DEFAULT_WEIGHTS,
        }
    }

    /// Creates a new cost specification from integer distance codes.
    pub fn from_codes(scalar_code: u32, vector_code: u32) -> Self {
        Self::new(
            ScalarCost::from_code(scalar_code),
            VectorCost::from_code(vector_code),
        )
    }

    /// Returns a copy of the specification with the given element type weights.
    pub fn with_weights(mut self, weights: [fip; 3]) -> Self {
        self.weights = weights;
        self
    }

    /// Checks that all weights are finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        if self
            .weights
            .iter()
            .all(|weight| weight.is_finite() && *weight >= 0.0)
        {
            Ok(())
        } else {
            Err(ModeError::InvalidCostWeights(self.weights))
        }
    }

    /// Computes the weighted dissimilarity between two mode blocks of
    /// `layout.branch_span()` elements each.
    pub fn mode_cost<T: ModeScalar>(
        &self,
        layout: &ModeLayout,
        kind: LayoutKind,
        a: &[T],
        b: &[T],
    ) -> fip {
        let [scalar_weight, vector_weight, matrix_weight] = self.weights;
        match kind {
            LayoutKind::PureVector => vector_weight * self.vector.distance(a, b),
            LayoutKind::PureMatrix => matrix_weight * self.vector.distance(a, b),
            LayoutKind::Mixed => {
                let mut cost = 0.0;
                if layout.scalar_count() > 0 {
                    let range = layout.scalar_range();
                    cost += scalar_weight * self.scalar.distance(&a[range.clone()], &b[range]);
                }
                if layout.vector_count() > 0 {
                    let range = layout.vector_range();
                    cost += vector_weight * self.vector.distance(&a[range.clone()], &b[range]);
                }
                if layout.matrix_count() > 0 {
                    let range = layout.matrix_range();
                    cost += matrix_weight * self.vector.distance(&a[range.clone()], &b[range]);
                }
                cost
            }
        }
    }
}

impl Default for CostSpec {
    fn default() -> Self {
        Self::new(ScalarCost::default(), VectorCost::default())
    }
}
