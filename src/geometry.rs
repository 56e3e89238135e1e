//! Geometric utility objects.

use crate::num::BFloat;
use std::ops::{Index, Mul};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "for-testing")]
use approx::{AbsDiffEq, RelativeEq};

/// Denotes the x-, y- or z-dimension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Dim3 {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Dim3 {
    /// Creates an array for iterating over the x-, y- and z-dimensions.
    pub fn slice() -> [Self; 3] {
        [Self::X, Self::Y, Self::Z]
    }

    /// Returns the number of the dimension.
    pub fn num(self) -> usize {
        self as usize
    }
}

use Dim3::{X, Y, Z};

/// Represents any quantity with three dimensional components.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct In3D<T>([T; 3]);

impl<T> In3D<T> {
    /// Creates a new 3D quantity given the three components.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self([x, y, z])
    }

    /// Creates a new 3D quantity by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> T,
    {
        Self::new(
            create_component(X),
            create_component(Y),
            create_component(Z),
        )
    }
}

impl<T> Index<Dim3> for In3D<T> {
    type Output = T;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim as usize]
    }
}

#[cfg(feature = "for-testing")]
impl<T> AbsDiffEq for In3D<T>
where
    T: AbsDiffEq,
    T::Epsilon: Copy,
{
    type Epsilon = <T as AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        T::abs_diff_eq(&self[X], &other[X], epsilon)
            && T::abs_diff_eq(&self[Y], &other[Y], epsilon)
            && T::abs_diff_eq(&self[Z], &other[Z], epsilon)
    }
}

#[cfg(feature = "for-testing")]
impl<T> RelativeEq for In3D<T>
where
    T: RelativeEq,
    T::Epsilon: Copy,
{
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        T::relative_eq(&self[X], &other[X], epsilon, max_relative)
            && T::relative_eq(&self[Y], &other[Y], epsilon, max_relative)
            && T::relative_eq(&self[Z], &other[Z], epsilon, max_relative)
    }
}

#[cfg(feature = "for-testing")]
macro_rules! impl_abs_diff_eq_3d {
    ($T:ident <$F:ident>, $INNER:ty) => {
        impl<$F> AbsDiffEq for $T<$F>
        where
            $F: BFloat + AbsDiffEq,
            $F::Epsilon: Copy,
        {
            type Epsilon = <In3D<$INNER> as AbsDiffEq>::Epsilon;

            fn default_epsilon() -> Self::Epsilon {
                In3D::<$INNER>::default_epsilon()
            }

            fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
                In3D::<$INNER>::abs_diff_eq(&self.0, &other.0, epsilon)
            }
        }
    };
}

#[cfg(feature = "for-testing")]
macro_rules! impl_relative_eq_3d {
    ($T:ident <$F:ident>, $INNER:ty) => {
        impl<$F> RelativeEq for $T<$F>
        where
            $F: BFloat + RelativeEq,
            $F::Epsilon: Copy,
        {
            fn default_max_relative() -> Self::Epsilon {
                In3D::<$INNER>::default_max_relative()
            }

            fn relative_eq(
                &self,
                other: &Self,
                epsilon: Self::Epsilon,
                max_relative: Self::Epsilon,
            ) -> bool {
                In3D::<$INNER>::relative_eq(&self.0, &other.0, epsilon, max_relative)
            }
        }
    };
}

/// A 3D vector.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Vec3<F>(In3D<F>);

impl<F: BFloat> Vec3<F> {
    /// Creates a new 3D vector given the three components.
    pub fn new(x: F, y: F, z: F) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new 3D vector by evaluating the given component
    /// constructor for each dimension.
    pub fn with_each_component<C>(create_component: C) -> Self
    where
        C: Fn(Dim3) -> F,
    {
        Self(In3D::with_each_component(create_component))
    }

    /// Computes the dot product of the vector with another vector.
    pub fn dot(&self, other: &Self) -> F {
        self[X] * other[X] + self[Y] * other[Y] + self[Z] * other[Z]
    }

    /// Computes the cross product of the vector with another vector.
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self[Y] * other[Z] - self[Z] * other[Y],
            self[Z] * other[X] - self[X] * other[Z],
            self[X] * other[Y] - self[Y] * other[X],
        )
    }
}

impl<F: BFloat> Index<Dim3> for Vec3<F> {
    type Output = F;
    fn index(&self, dim: Dim3) -> &Self::Output {
        &self.0[dim]
    }
}

#[cfg(feature = "for-testing")]
impl_abs_diff_eq_3d!(Vec3<F>, F);

#[cfg(feature = "for-testing")]
impl_relative_eq_3d!(Vec3<F>, F);

/// A 3x3 matrix stored as three row vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Matrix3<F>(In3D<Vec3<F>>);

impl<F: BFloat> Matrix3<F> {
    /// Creates a new matrix from the three given rows.
    pub fn from_rows(x: Vec3<F>, y: Vec3<F>, z: Vec3<F>) -> Self {
        Self(In3D::new(x, y, z))
    }

    /// Creates a new matrix from a row-major nested array.
    pub fn from_array(rows: [[F; 3]; 3]) -> Self {
        Self::with_each_element(|row, column| rows[row.num()][column.num()])
    }

    /// Creates a new matrix by evaluating the given element constructor
    /// for each row and column.
    pub fn with_each_element<C>(create_element: C) -> Self
    where
        C: Fn(Dim3, Dim3) -> F,
    {
        Self(In3D::with_each_component(|row| {
            Vec3::with_each_component(|column| create_element(row, column))
        }))
    }

    /// Creates a new identity matrix.
    pub fn identity() -> Self {
        Self::with_each_element(|row, column| {
            if row == column {
                F::one()
            } else {
                F::zero()
            }
        })
    }

    /// Returns the element in the given row and column.
    pub fn element(&self, row: Dim3, column: Dim3) -> F {
        self[row][column]
    }

    /// Returns the elements in row-major order.
    pub fn to_flat(&self) -> [F; 9] {
        [
            self[X][X], self[X][Y], self[X][Z], //
            self[Y][X], self[Y][Y], self[Y][Z], //
            self[Z][X], self[Z][Y], self[Z][Z],
        ]
    }

    /// Computes the transpose of the matrix.
    pub fn transposed(&self) -> Self {
        Self::with_each_element(|row, column| self[column][row])
    }

    /// Computes the determinant of the matrix.
    pub fn determinant(&self) -> F {
        self[X].dot(&self[Y].cross(&self[Z]))
    }

    /// Computes the inverse of the matrix, or returns `None` if the
    /// determinant is zero to within the given tolerance.
    pub fn inverse(&self, tolerance: F) -> Option<Self> {
        let determinant = self.determinant();
        if determinant.abs() <= tolerance {
            return None;
        }
        // Columns of the adjugate are the cross products of pairs of rows
        let adjugate_transposed = Self::from_rows(
            self[Y].cross(&self[Z]),
            self[Z].cross(&self[X]),
            self[X].cross(&self[Y]),
        );
        Some(adjugate_transposed.transposed().scaled(determinant.recip()))
    }

    /// Multiplies each element with the given factor.
    pub fn scaled(&self, factor: F) -> Self {
        Self::with_each_element(|row, column| self[row][column] * factor)
    }

    /// Whether the matrix is exactly the identity matrix.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }
}

impl<F: BFloat> Index<Dim3> for Matrix3<F> {
    type Output = Vec3<F>;
    fn index(&self, row: Dim3) -> &Self::Output {
        &self.0[row]
    }
}

impl<'a, F: BFloat> Mul<&'a Matrix3<F>> for &'a Matrix3<F> {
    type Output = Matrix3<F>;
    fn mul(self, other: Self) -> Self::Output {
        Matrix3::with_each_element(|row, column| {
            Dim3::slice()
                .iter()
                .fold(F::zero(), |sum, &k| sum + self[row][k] * other[k][column])
        })
    }
}

impl<'a, F: BFloat> Mul<&'a Vec3<F>> for &'a Matrix3<F> {
    type Output = Vec3<F>;
    fn mul(self, vector: &'a Vec3<F>) -> Self::Output {
        Vec3::with_each_component(|row| self[row].dot(vector))
    }
}

#[cfg(feature = "for-testing")]
impl_abs_diff_eq_3d!(Matrix3<F>, Vec3<F>);

#[cfg(feature = "for-testing")]
impl_relative_eq_3d!(Matrix3<F>, Vec3<F>);
