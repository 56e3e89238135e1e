#![allow(dead_code)]

use approx::assert_abs_diff_eq;
use modeinterp::{
    fip, geometry::Matrix3, num::ModeScalar, ModeInterpolator, PointSymmetry, SymmetryMapping,
};
use ndarray::{ArrayD, IxDyn};
use num::Complex;

#[macro_export]
macro_rules! def_composition_test {
    (fn $name:ident($rotates_like:expr, $shape:expr, $layout:expr)) => {
        #[test]
        fn $name() {
            let symmetry = common::hexagonal_symmetry();
            let values = common::sample_values(&$shape);
            let interpolator =
                modeinterp::ModeInterpolator::new(values.clone(), $layout, $rotates_like).unwrap();

            for first in 0..symmetry.len() {
                let once = common::rotated(&interpolator, &values, &symmetry, first);
                for second in 0..symmetry.len() {
                    let combined = symmetry.compose(second, first).unwrap();
                    common::assert_all_close(
                        &common::rotated(&interpolator, &once, &symmetry, second),
                        &common::rotated(&interpolator, &values, &symmetry, combined),
                    );
                }
            }
        }
    };
}

/// Powers of a sixfold rotation about the c-axis of a hexagonal lattice,
/// expressed in the lattice basis, followed by their inversions.
pub fn hexagonal_symmetry() -> PointSymmetry {
    let sixfold = Matrix3::from_array([[1.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
    let mut rotations = vec![Matrix3::identity()];
    for _ in 1..6 {
        let next = &sixfold * rotations.last().unwrap();
        rotations.push(next);
    }
    let inversions: Vec<_> = rotations.iter().map(|rotation| rotation.scaled(-1.0)).collect();
    PointSymmetry::from_matrices(rotations.into_iter().chain(inversions)).unwrap()
}

/// Deterministic, irregular values of the given shape.
pub fn sample_values(shape: &[usize]) -> ArrayD<fip> {
    let n: usize = shape.iter().product();
    let values = (0..n)
        .map(|idx| (1.37 * idx as fip + 0.3).sin() + 0.05 * idx as fip)
        .collect();
    ArrayD::from_shape_vec(IxDyn(shape), values).unwrap()
}

/// Complex values of the given shape with irregular phases.
pub fn sample_complex_values(shape: &[usize]) -> ArrayD<Complex<fip>> {
    sample_values(shape).mapv(|value| Complex::from_polar(1.0 + value.abs(), 2.1 * value))
}

/// Transforms every row of `values` by the same symmetry operation.
pub fn rotated<T: ModeScalar>(
    interpolator: &ModeInterpolator<T>,
    values: &ArrayD<T>,
    symmetry: &PointSymmetry,
    operation: usize,
) -> ArrayD<T> {
    let n_points = values.shape()[0];
    let representatives: Vec<usize> = (0..n_points).collect();
    let operations = vec![operation; n_points];
    let mapping = SymmetryMapping::new(symmetry, &representatives, &operations);
    let mut values = values.clone();
    interpolator.rotate_in_place(&mut values, &mapping).unwrap();
    values
}

pub fn assert_all_close<T: ModeScalar>(a: &ArrayD<T>, b: &ArrayD<T>) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!((*x - *y).magnitude(), 0.0, epsilon = 1e-10);
    }
}

pub fn assert_slices_close<T: ModeScalar>(a: &[T], b: &[T]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_abs_diff_eq!((*x - *y).magnitude(), 0.0, epsilon = 1e-10);
    }
}
