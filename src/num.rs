//! Utilities related to numbers.

use crate::interpolation::fip;
use num::{self, Complex};
use std::{
    fmt,
    ops::{Add, Mul, Sub},
};

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat: Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug {}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Element type that can be stored per mode in mode data.
///
/// Implemented for real (`f32`, `f64`) and complex (`Complex<f32>`, `Complex<f64>`)
/// values. All derived quantities (magnitudes, costs, weights) use `fip` precision.
pub trait ModeScalar:
    Copy
    + Send
    + Sync
    + PartialEq
    + fmt::Debug
    + num::Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + 'static
{
    /// Whether values carry an imaginary part.
    const IS_COMPLEX: bool;

    /// Machine epsilon of the underlying floating point type.
    const EPSILON: fip;

    /// Creates a value from a real number.
    fn from_real(value: fip) -> Self;

    /// Returns the real part of the value.
    fn real_part(self) -> fip;

    /// Returns the complex conjugate of the value.
    fn conjugate(self) -> Self;

    /// Returns the squared magnitude of the value.
    fn norm_sqr(self) -> fip;

    /// Returns the magnitude of the value.
    fn magnitude(self) -> fip {
        self.norm_sqr().sqrt()
    }

    /// Multiplies the value with a real factor.
    fn scaled(self, factor: fip) -> Self;

    /// Multiplies the value with a complex phase factor.
    ///
    /// Real types keep only the real part of the product.
    fn phased(self, phase: Complex<fip>) -> Self;
}

macro_rules! impl_real_mode_scalar {
    ($F:ty) => {
        impl ModeScalar for $F {
            const IS_COMPLEX: bool = false;
            const EPSILON: fip = <$F>::EPSILON as fip;

            fn from_real(value: fip) -> Self {
                value as $F
            }

            fn real_part(self) -> fip {
                self as fip
            }

            fn conjugate(self) -> Self {
                self
            }

            fn norm_sqr(self) -> fip {
                (self as fip) * (self as fip)
            }

            fn magnitude(self) -> fip {
                (self as fip).abs()
            }

            fn scaled(self, factor: fip) -> Self {
                ((self as fip) * factor) as $F
            }

            fn phased(self, phase: Complex<fip>) -> Self {
                self.scaled(phase.re)
            }
        }
    };
}

macro_rules! impl_complex_mode_scalar {
    ($F:ty) => {
        impl ModeScalar for Complex<$F> {
            const IS_COMPLEX: bool = true;
            const EPSILON: fip = <$F>::EPSILON as fip;

            fn from_real(value: fip) -> Self {
                Complex::new(value as $F, 0.0)
            }

            fn real_part(self) -> fip {
                self.re as fip
            }

            fn conjugate(self) -> Self {
                self.conj()
            }

            fn norm_sqr(self) -> fip {
                Complex::<$F>::norm_sqr(&self) as fip
            }

            fn scaled(self, factor: fip) -> Self {
                Complex::new(
                    ((self.re as fip) * factor) as $F,
                    ((self.im as fip) * factor) as $F,
                )
            }

            fn phased(self, phase: Complex<fip>) -> Self {
                let product = Complex::new(self.re as fip, self.im as fip) * phase;
                Complex::new(product.re as $F, product.im as $F)
            }
        }
    };
}

impl_real_mode_scalar!(f32);
impl_real_mode_scalar!(f64);
impl_complex_mode_scalar!(f32);
impl_complex_mode_scalar!(f64);

/// Whether two values are equal to within a fixed relative tolerance of
/// `100` machine epsilons. Values that are both close to zero are compared
/// with the same tolerance in absolute terms.
pub fn approx_scalar_eq<T: ModeScalar>(a: T, b: T) -> bool {
    let tolerance = 100.0 * T::EPSILON;
    let difference = (a - b).magnitude();
    if a.magnitude() <= tolerance && b.magnitude() <= tolerance {
        difference < tolerance
    } else {
        difference < tolerance * (a + b).magnitude()
    }
}

/// Whether two equally long blocks of values are element-wise approximately equal.
pub fn approx_block_eq<T: ModeScalar>(a: &[T], b: &[T]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).all(|(&x, &y)| approx_scalar_eq(x, y))
}
