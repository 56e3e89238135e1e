mod common;

use approx::assert_abs_diff_eq;
use modeinterp::{
    fip, geometry::Matrix3, CostSpec, EqualModeSearch, GammaTable, InterpolatorConfig,
    LayoutKind, ModeError, ModeInterpolator, ModeLayout, PointSymmetry, RotatesLike,
    SymmetryMapping, TrivialGammaTable,
};
use ndarray::{array, s, Array4, Axis, Ix4};
use num::Complex;

#[test]
fn midpoint_of_scalar_modes_is_exact() {
    let data = array![[1.0, 2.0], [1.0, 2.0], [5.0, 6.0], [5.0, 6.0]].into_dyn();
    let interpolator =
        ModeInterpolator::new(data, ModeLayout::from_counts(1, 0, 0), RotatesLike::Real).unwrap();
    assert_eq!(interpolator.branches(), 2);

    let mut output = [0.0; 2];
    interpolator
        .interpolate_at(&[(0, 0.5), (2, 0.5)], None, &mut output)
        .unwrap();
    assert_eq!(output, [3.0, 4.0]);
}

#[test]
fn all_shapes_infer_their_layouts() {
    let cases = [
        (vec![5], ModeLayout::from_counts(1, 0, 0), 1),
        (vec![5, 6], ModeLayout::from_counts(2, 0, 0), 3),
        (vec![5, 4, 7], ModeLayout::from_counts(7, 0, 0), 4),
        (vec![5, 4, 2, 3], ModeLayout::from_counts(0, 2, 0), 4),
        (vec![5, 4, 2, 3, 3], ModeLayout::from_counts(0, 0, 2), 4),
    ];
    for (shape, layout, branches) in cases {
        let values = common::sample_values(&shape);
        let explicit = ModeInterpolator::new(values.clone(), layout, RotatesLike::Real).unwrap();
        assert_eq!(explicit.element_layout(), &layout);
        assert_eq!(explicit.branches(), branches);
        assert_eq!(
            explicit.elements_per_point() * explicit.points(),
            values.len()
        );
        if shape.len() != 2 {
            let inferred =
                ModeInterpolator::new(values, ModeLayout::unset(), RotatesLike::Real).unwrap();
            assert_eq!(inferred.element_layout(), &layout);
            assert_eq!(inferred.branches(), branches);
        }
    }
    assert!(matches!(
        ModeInterpolator::new(
            common::sample_values(&[1, 1, 1, 1, 1, 1]),
            ModeLayout::unset(),
            RotatesLike::Real
        ),
        Err(ModeError::UnsupportedShape(_))
    ));
}

#[test]
fn identity_operation_leaves_data_unchanged() {
    let symmetry = common::hexagonal_symmetry();
    let identity = symmetry.identity_index().unwrap();
    let representatives = [0, 1];
    let operations = [identity, identity];
    let mapping = SymmetryMapping::new(&symmetry, &representatives, &operations);

    let values = common::sample_values(&[2, 3, 13]);
    for rotates_like in [RotatesLike::Real, RotatesLike::Reciprocal, RotatesLike::Axial] {
        let interpolator = ModeInterpolator::new(
            values.clone(),
            ModeLayout::from_counts(1, 1, 1),
            rotates_like,
        )
        .unwrap();
        let mut rotated = values.clone();
        assert!(!interpolator.rotate_in_place(&mut rotated, &mapping).unwrap());
        assert_eq!(rotated, values);
    }

    let table = TrivialGammaTable;
    let mapping = mapping.with_gamma_table(&table);
    let values = common::sample_complex_values(&[2, 3, 2, 3]);
    let interpolator =
        ModeInterpolator::new(values.clone(), ModeLayout::unset(), RotatesLike::Gamma).unwrap();
    let mut rotated = values.clone();
    assert!(!interpolator.rotate_in_place(&mut rotated, &mapping).unwrap());
    assert_eq!(rotated, values);
}

def_composition_test!(
    fn real_vectors_compose(RotatesLike::Real, [2, 2, 2, 3], ModeLayout::unset())
);
def_composition_test!(
    fn reciprocal_vectors_compose(RotatesLike::Reciprocal, [2, 2, 2, 3], ModeLayout::unset())
);
def_composition_test!(
    fn axial_vectors_compose(RotatesLike::Axial, [2, 2, 2, 3], ModeLayout::unset())
);
def_composition_test!(
    fn real_matrices_compose(RotatesLike::Real, [2, 2, 1, 3, 3], ModeLayout::unset())
);
def_composition_test!(
    fn reciprocal_matrices_compose(RotatesLike::Reciprocal, [2, 2, 1, 3, 3], ModeLayout::unset())
);
def_composition_test!(
    fn axial_mixed_data_composes(
        RotatesLike::Axial,
        [2, 2, 13],
        ModeLayout::from_counts(1, 1, 1)
    )
);
def_composition_test!(
    fn reciprocal_mixed_data_composes(
        RotatesLike::Reciprocal,
        [3, 26],
        ModeLayout::from_counts(1, 1, 1)
    )
);

#[test]
fn axial_vectors_flip_under_improper_operations() {
    let symmetry = common::hexagonal_symmetry();
    let values = common::sample_values(&[2, 3, 2, 3]);
    let real = ModeInterpolator::new(values.clone(), ModeLayout::unset(), RotatesLike::Real)
        .unwrap();
    let axial = ModeInterpolator::new(values.clone(), ModeLayout::unset(), RotatesLike::Axial)
        .unwrap();

    for (idx, operation) in symmetry.operations().iter().enumerate() {
        let real_rotated = common::rotated(&real, &values, &symmetry, idx);
        let axial_rotated = common::rotated(&axial, &values, &symmetry, idx);
        if operation.is_proper() {
            common::assert_all_close(&axial_rotated, &real_rotated);
        } else {
            common::assert_all_close(&axial_rotated, &real_rotated.mapv(|value| -value));
        }
    }
}

#[test]
fn permuted_modes_are_recovered_with_zero_cost() {
    let values = common::sample_values(&[1, 4, 2, 3])
        .into_dimensionality::<Ix4>()
        .unwrap();
    // Mode `permutation[mode]` at the first vertex is stored as mode `mode` at the second
    let permutation = [2, 0, 3, 1];
    let mut data = Array4::zeros((2, 4, 2, 3));
    data.slice_mut(s![0, .., .., ..])
        .assign(&values.slice(s![0, .., .., ..]));
    for (mode, &source) in permutation.iter().enumerate() {
        data.slice_mut(s![1, mode, .., ..])
            .assign(&values.slice(s![0, source, .., ..]));
    }

    for vector_cost in [1, 2, 4, 5] {
        let mut interpolator = ModeInterpolator::new(
            data.clone().into_dyn(),
            ModeLayout::unset(),
            RotatesLike::Real,
        )
        .unwrap();
        interpolator
            .set_cost_spec(CostSpec::from_codes(0, vector_cost))
            .unwrap();
        let resolved = interpolator.resolve_permutation(0, 1).unwrap();
        let costs = interpolator.cost_matrix(0, 1).unwrap();
        for (mode, &matched) in resolved.iter().enumerate() {
            assert_eq!(permutation[matched], mode);
            assert_abs_diff_eq!(costs[[mode, matched]], 0.0, epsilon = 1e-6);
        }
    }
}

#[test]
fn complex_modes_match_regardless_of_global_phase() {
    let values = common::sample_complex_values(&[1, 3, 2, 3])
        .into_dimensionality::<Ix4>()
        .unwrap();
    let mut data = Array4::zeros((2, 3, 2, 3));
    data.slice_mut(s![0, .., .., ..])
        .assign(&values.slice(s![0, .., .., ..]));
    let phase = Complex::from_polar(1.0, 1.2);
    for (mode, source) in [1, 2, 0].into_iter().enumerate() {
        data.slice_mut(s![1, mode, .., ..])
            .assign(&values.slice(s![0, source, .., ..]).mapv(|value| value * phase));
    }
    let interpolator =
        ModeInterpolator::new(data.into_dyn(), ModeLayout::unset(), RotatesLike::Gamma).unwrap();
    assert_eq!(interpolator.resolve_permutation(0, 1).unwrap(), vec![2, 0, 1]);
}

#[test]
fn degenerate_modes_are_never_reordered() {
    // Modes 0 and 1 are equal at the first vertex, so the swap at the second
    // vertex is ambiguous and must not be resolved.
    let data = array![[[1.0], [1.0], [4.0]], [[1.5], [0.5], [4.0]]].into_dyn();
    let interpolator = ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap();
    assert!(interpolator.any_equal_modes(0).unwrap());
    assert_eq!(interpolator.resolve_permutation(0, 1).unwrap(), vec![0, 1, 2]);

    // Equal modes beyond the searched offset are not detected
    let data = array![[[1.0], [2.0], [1.0]], [[2.0], [1.0], [3.0]]].into_dyn();
    let config = InterpolatorConfig {
        equal_mode_search: EqualModeSearch::WithinOffset(1),
        ..InterpolatorConfig::default()
    };
    let interpolator =
        ModeInterpolator::with_config(data, ModeLayout::unset(), RotatesLike::Real, config)
            .unwrap();
    assert!(!interpolator.any_equal_modes(0).unwrap());
    assert_ne!(interpolator.resolve_permutation(0, 1).unwrap(), vec![0, 1, 2]);
}

#[test]
fn identical_vertices_are_reproduced_exactly() {
    let row = [0.3, 2.7, 3.0];
    let data = array![[[0.3], [2.7], [3.0]], [[0.3], [2.7], [3.0]]].into_dyn();
    let interpolator = ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap();
    assert_eq!(interpolator.branches(), 3);

    let mut output = [0.0; 3];
    for k in 0..1000 {
        let weight = k as fip / 1000.0;
        for reference in [None, Some(1)] {
            interpolator
                .interpolate_at(&[(0, weight), (1, 1.0 - weight)], reference, &mut output)
                .unwrap();
            assert_eq!(output, row, "weight {}", weight);
        }
    }
}

#[test]
fn interpolation_is_linear_in_weights() {
    let data = common::sample_values(&[4, 3, 2, 3]);
    let interpolator = ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap();
    let vertices = [3, 0, 2];
    let interpolate = |weights: [fip; 3]| {
        let contributions: Vec<_> = vertices.iter().copied().zip(weights).collect();
        let mut output = vec![0.0; interpolator.elements_per_point()];
        interpolator
            .interpolate_at(&contributions, None, &mut output)
            .unwrap();
        output
    };

    let first = interpolate([0.2, 0.5, 0.3]);
    let second = interpolate([0.6, 0.1, 0.3]);
    let alpha = 0.25;
    let mixed = interpolate([
        alpha * 0.2 + (1.0 - alpha) * 0.6,
        alpha * 0.5 + (1.0 - alpha) * 0.1,
        0.3,
    ]);
    let expected: Vec<_> = first
        .iter()
        .zip(&second)
        .map(|(a, b)| alpha * a + (1.0 - alpha) * b)
        .collect();
    common::assert_slices_close(&mixed, &expected);
}

#[test]
fn batched_interpolation_runs_in_parallel() {
    let data = common::sample_values(&[6, 2, 5]);
    let interpolator = ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap();
    let queries: Vec<Vec<(usize, fip)>> = (0..50)
        .map(|query| {
            let weight = (query as fip) / 50.0;
            vec![(query % 6, weight), ((query + 1) % 6, 1.0 - weight)]
        })
        .collect();
    let values = interpolator.interpolate_pairs_batch(&queries).unwrap();
    assert_eq!(values.shape(), &[50, 2, 5]);

    let row = values.index_axis(Axis(0), 17);
    let mut output = [0.0; 10];
    interpolator
        .interpolate_at(&queries[17], None, &mut output)
        .unwrap();
    assert_eq!(row.iter().copied().collect::<Vec<_>>(), output.to_vec());

    assert!(matches!(
        interpolator.interpolate_at_batch(&[vec![0, 1], vec![2]], &[vec![0.5, 0.5], vec![]]),
        Err(ModeError::WeightCountMismatch { query: 1, .. })
    ));
}

#[test]
fn gamma_rotation_requires_complex_data() {
    let symmetry = common::hexagonal_symmetry();
    let table = TrivialGammaTable;
    let representatives = [0];
    let operations = [1];
    let mapping =
        SymmetryMapping::new(&symmetry, &representatives, &operations).with_gamma_table(&table);

    let values = common::sample_values(&[1, 2, 1, 3]);
    let interpolator =
        ModeInterpolator::new(values.clone(), ModeLayout::unset(), RotatesLike::Gamma).unwrap();
    let mut rotated = values.clone();
    assert_eq!(
        interpolator.rotate_in_place(&mut rotated, &mapping),
        Err(ModeError::GammaRequiresComplex)
    );
    assert_eq!(rotated, values);
}

/// Two atoms exchanged by every improper operation, with phases that
/// vanish at the first irreducible vertex.
struct ExchangingAtoms {
    symmetry: PointSymmetry,
}

impl GammaTable for ExchangingAtoms {
    fn rotated_element(&self, operation: usize, element: usize) -> usize {
        if self.symmetry.operations()[operation].is_proper() {
            element
        } else {
            1 - element
        }
    }

    fn phase(&self, vertex: usize, operation: usize, element: usize) -> Complex<fip> {
        Complex::from_polar(1.0, 0.1 * (vertex * (operation + element + 1)) as fip)
    }
}

#[test]
fn gamma_expansion_moves_and_phases_atoms() {
    let symmetry = common::hexagonal_symmetry();
    let table = ExchangingAtoms {
        symmetry: symmetry.clone(),
    };
    let values = common::sample_complex_values(&[2, 3, 2, 3]);
    let interpolator =
        ModeInterpolator::new(values.clone(), ModeLayout::unset(), RotatesLike::Gamma).unwrap();
    assert_eq!(interpolator.layout_kind(), LayoutKind::PureVector);

    let inversion = symmetry
        .operations()
        .iter()
        .position(|operation| operation.matrix() == &Matrix3::identity().scaled(-1.0))
        .unwrap();
    let representatives = [0, 1, 1];
    let operations = [0, 2, inversion];
    let mapping =
        SymmetryMapping::new(&symmetry, &representatives, &operations).with_gamma_table(&table);
    let expanded = interpolator
        .expand_to_vertices(&mapping)
        .unwrap()
        .into_dimensionality::<Ix4>()
        .unwrap();
    assert_eq!(expanded.dim(), (3, 3, 2, 3));
    let values = values.into_dimensionality::<Ix4>().unwrap();

    // Inversion negates each atom's displacement and exchanges the atoms
    for mode in 0..3 {
        for atom in 0..2 {
            let phase = table.phase(1, inversion, atom);
            let expected = values
                .slice(s![1, mode, atom, ..])
                .mapv(|value| -value * phase);
            let found = expanded.slice(s![2, mode, 1 - atom, ..]).to_owned();
            common::assert_slices_close(
                found.as_slice().unwrap(),
                expected.as_slice().unwrap(),
            );
        }
    }
    common::assert_slices_close(
        expanded.slice(s![0, .., .., ..]).to_owned().as_slice().unwrap(),
        values.slice(s![0, .., .., ..]).to_owned().as_slice().unwrap(),
    );
}
