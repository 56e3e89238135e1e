//! Interpolation of per-mode data stored on the vertices of a mesh.

pub mod expansion;
pub mod query;

use crate::{
    error::{ModeError, Result},
    io::Verbosity,
    modes::{
        cost::{CostSpec, ScalarCost, VectorCost},
        permutation::{optimal_permutation_into, EqualModeSearch, QueryWorkspace},
        rotation::RotatesLike,
        LayoutKind, ModeLayout,
    },
    num::ModeScalar,
};
use ndarray::{Array2, ArrayD, ArrayViewMut2, IxDyn};
use std::{fmt, mem};

/// Floating-point precision to use for interpolation weights and costs.
#[allow(non_camel_case_types)]
pub type fip = f64;

/// Configuration parameters for mode interpolators.
#[derive(Clone, Debug)]
pub struct InterpolatorConfig {
    /// Measure of dissimilarity between modes at different vertices.
    pub cost: CostSpec,
    /// How to look for degenerate modes before resolving permutations.
    pub equal_mode_search: EqualModeSearch,
    /// Whether to print status messages and progress bars.
    pub verbosity: Verbosity,
}

impl InterpolatorConfig {
    pub const DEFAULT_COST: CostSpec = CostSpec {
        scalar: ScalarCost::AbsoluteSum,
        vector: VectorCost::SinSquaredHermitianAngle,
        weights: CostSpec::DEFAULT_WEIGHTS,
    };
    pub const DEFAULT_EQUAL_MODE_SEARCH: EqualModeSearch = EqualModeSearch::AllPairs;

    /// Checks that the configuration parameters are valid.
    ///
    /// # Errors
    ///
    /// Returns an error if any cost weight is negative or not finite.
    pub fn validate(&self) -> Result<()> {
        self.cost.validate()
    }
}

impl Default for InterpolatorConfig {
    fn default() -> Self {
        InterpolatorConfig {
            cost: Self::DEFAULT_COST,
            equal_mode_search: Self::DEFAULT_EQUAL_MODE_SEARCH,
            verbosity: Verbosity::default(),
        }
    }
}

/// Container of per-mode data on mesh vertices, able to interpolate the
/// data while keeping modes consistently ordered and to transform it
/// under symmetry operations.
///
/// The data array has one of the shapes
///
/// - `(P,)`
/// - `(P, X)`
/// - `(P, B, Y)`
/// - `(P, B, V, 3)`
/// - `(P, B, M, 3, 3)`
///
/// where `P` is the number of vertices and `B` the number of modes.
#[derive(Clone, Debug)]
pub struct ModeInterpolator<T: ModeScalar> {
    data: ArrayD<T>,
    layout: ModeLayout,
    kind: LayoutKind,
    rotates_like: RotatesLike,
    config: InterpolatorConfig,
}

impl<T: ModeScalar> ModeInterpolator<T> {
    /// Creates a new interpolator for the given data using the default configuration.
    ///
    /// # Parameters
    ///
    /// - `data`: Array of per-vertex mode data.
    /// - `layout`: Element layout of each mode (may be unset to infer it from the shape).
    /// - `rotates_like`: How vectors and matrices in the data transform.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape of the data is not admissible or
    /// inconsistent with the layout.
    pub fn new(data: ArrayD<T>, layout: ModeLayout, rotates_like: RotatesLike) -> Result<Self> {
        Self::with_config(data, layout, rotates_like, InterpolatorConfig::default())
    }

    /// Creates a new interpolator for the given data with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, or if the shape of the
    /// data is not admissible or inconsistent with the layout.
    pub fn with_config(
        data: ArrayD<T>,
        layout: ModeLayout,
        rotates_like: RotatesLike,
        config: InterpolatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (data, layout, kind) = Self::validated(data, layout)?;
        Ok(Self {
            data,
            layout,
            kind,
            rotates_like,
            config,
        })
    }

    /// Creates a placeholder interpolator holding zeros for `branches` modes
    /// of a single scalar at each of `points` vertices.
    pub fn zeroed(points: usize, branches: usize) -> Self {
        Self {
            data: ArrayD::zeros(IxDyn(&[points, branches])),
            layout: ModeLayout::from_counts(1, 0, 0),
            kind: LayoutKind::Mixed,
            rotates_like: RotatesLike::Real,
            config: InterpolatorConfig::default(),
        }
    }

    fn validated(data: ArrayD<T>, layout: ModeLayout) -> Result<(ArrayD<T>, ModeLayout, LayoutKind)> {
        let layout = layout.inferred_for_shape(data.shape())?;
        let kind = LayoutKind::of_shape(data.shape())?;
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok((data, layout, kind))
    }

    /// Replaces the stored data, layout and rotation behaviour.
    ///
    /// The interpolator is left unchanged if the new data is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape of the data is not admissible or
    /// inconsistent with the layout.
    pub fn replace_data(
        &mut self,
        data: ArrayD<T>,
        layout: ModeLayout,
        rotates_like: RotatesLike,
    ) -> Result<()> {
        let (data, layout, kind) = Self::validated(data, layout)?;
        self.data = data;
        self.layout = layout;
        self.kind = kind;
        self.rotates_like = rotates_like;
        Ok(())
    }

    /// Replaces the stored data, inferring the layout from its shape and
    /// resetting the rotation behaviour to `Real`.
    pub fn replace_data_with_inferred_layout(&mut self, data: ArrayD<T>) -> Result<()> {
        self.replace_data(data, ModeLayout::unset(), RotatesLike::Real)
    }

    /// Returns a reference to the stored data array.
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Returns the element layout of each mode.
    pub fn element_layout(&self) -> &ModeLayout {
        &self.layout
    }

    pub fn layout_kind(&self) -> LayoutKind {
        self.kind
    }

    /// Whether the data holds only 3-vectors or only 3x3 matrices.
    pub fn is_pure_vector_or_matrix(&self) -> bool {
        self.kind.is_pure()
    }

    pub fn rotates_like(&self) -> RotatesLike {
        self.rotates_like
    }

    /// Sets how vectors and matrices in the data transform, returning the previous behaviour.
    pub fn set_rotates_like(&mut self, rotates_like: RotatesLike) -> RotatesLike {
        mem::replace(&mut self.rotates_like, rotates_like)
    }

    pub fn config(&self) -> &InterpolatorConfig {
        &self.config
    }

    /// Replaces the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the new configuration is invalid, in which case
    /// the current one is kept.
    pub fn set_config(&mut self, config: InterpolatorConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Replaces the cost specification used when resolving permutations.
    ///
    /// # Errors
    ///
    /// Returns an error if any weight is negative or not finite, in which
    /// case the current specification is kept.
    pub fn set_cost_spec(&mut self, cost: CostSpec) -> Result<()> {
        cost.validate()?;
        if self.config.verbosity.print_messages() {
            println!(
                "Selecting {} for scalars and {} for vectors and matrices",
                cost.scalar, cost.vector
            );
        }
        self.config.cost = cost;
        Ok(())
    }

    /// Number of vertices.
    pub fn points(&self) -> usize {
        self.data.shape()[0]
    }

    /// Number of modes per vertex.
    pub fn branches(&self) -> usize {
        self.layout.branches_for_shape(self.data.shape())
    }

    /// Number of raw elements per mode.
    pub fn branch_span(&self) -> usize {
        self.layout.branch_span()
    }

    /// Number of raw elements stored for each vertex.
    pub fn elements_per_point(&self) -> usize {
        self.data.shape()[1..].iter().product()
    }

    /// Number of bytes of data stored for each vertex.
    pub fn bytes_per_point(&self) -> usize {
        self.elements_per_point() * mem::size_of::<T>()
    }

    fn flat_data(&self) -> Result<&[T]> {
        self.data.as_slice().ok_or(ModeError::NonContiguousData)
    }

    fn check_vertex(&self, index: usize) -> Result<()> {
        let count = self.points();
        if index < count {
            Ok(())
        } else {
            Err(ModeError::VertexOutOfRange { index, count })
        }
    }

    /// Returns the data of all modes at the given vertex.
    fn vertex_data<'a>(&self, flat: &'a [T], vertex: usize) -> &'a [T] {
        let n = self.elements_per_point();
        &flat[vertex * n..(vertex + 1) * n]
    }

    /// Adds the cost of pairing each mode at the vertex with data `a` with
    /// each mode at the vertex with data `b` to the given cost matrix.
    fn accumulate_costs(&self, a: &[T], b: &[T], mut costs: ArrayViewMut2<fip>) {
        let span = self.branch_span();
        let cost = &self.config.cost;
        for ((i, j), entry) in costs.indexed_iter_mut() {
            *entry += cost.mode_cost(
                &self.layout,
                self.kind,
                &a[i * span..(i + 1) * span],
                &b[j * span..(j + 1) * span],
            );
        }
    }

    /// Adds the costs of pairing the modes at vertex `a` with the modes at
    /// vertex `b` to a `B x B` cost matrix.
    ///
    /// Entry `[i, j]` receives the cost of pairing mode `i` at `a` with mode `j` at `b`.
    /// Costs from several quantities defined on the same vertices can be
    /// accumulated into the same matrix before resolving a permutation.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is out of range or the cost matrix
    /// has the wrong shape.
    pub fn add_cost(&self, a: usize, b: usize, costs: ArrayViewMut2<fip>) -> Result<()> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        let branches = self.branches();
        if costs.dim() != (branches, branches) {
            return Err(ModeError::OutputSizeMismatch {
                expected: branches * branches,
                found: costs.len(),
            });
        }
        let flat = self.flat_data()?;
        self.accumulate_costs(
            self.vertex_data(flat, a),
            self.vertex_data(flat, b),
            costs,
        );
        Ok(())
    }

    /// Computes the `B x B` matrix of costs for pairing the modes at vertex
    /// `a` with the modes at vertex `b`.
    pub fn cost_matrix(&self, a: usize, b: usize) -> Result<Array2<fip>> {
        let branches = self.branches();
        let mut costs = Array2::zeros((branches, branches));
        self.add_cost(a, b, costs.view_mut())?;
        Ok(costs)
    }

    /// Whether any two modes at the given vertex are approximately equal.
    pub fn any_equal_modes(&self, vertex: usize) -> Result<bool> {
        self.check_vertex(vertex)?;
        let flat = self.flat_data()?;
        Ok(self.has_equal_modes(self.vertex_data(flat, vertex)))
    }

    fn has_equal_modes(&self, modes: &[T]) -> bool {
        self.config
            .equal_mode_search
            .any_equal(modes, self.branches(), self.branch_span())
    }

    /// Finds the permutation of the modes at `vertex` best matching the
    /// modes at `reference`.
    ///
    /// # Returns
    ///
    /// A vector where entry `i` is the mode at `vertex` corresponding to
    /// mode `i` at `reference`. The identity is returned if either vertex
    /// has degenerate modes, or if reordering would not lower the cost.
    pub fn resolve_permutation(&self, reference: usize, vertex: usize) -> Result<Vec<usize>> {
        self.check_vertex(reference)?;
        self.check_vertex(vertex)?;
        let flat = self.flat_data()?;
        let mut workspace = QueryWorkspace::new(self.branches());
        self.resolve_permutation_into(
            self.vertex_data(flat, reference),
            self.vertex_data(flat, vertex),
            &mut workspace,
        );
        Ok(workspace.permutation)
    }

    /// Writes the permutation of the modes in `modes` best matching the
    /// modes in `reference_modes` into the workspace.
    fn resolve_permutation_into(
        &self,
        reference_modes: &[T],
        modes: &[T],
        workspace: &mut QueryWorkspace,
    ) {
        let branches = self.branches();
        if self.has_equal_modes(reference_modes) || self.has_equal_modes(modes) {
            workspace.permutation.clear();
            workspace.permutation.extend(0..branches);
            return;
        }
        workspace.costs.fill(0.0);
        self.accumulate_costs(reference_modes, modes, workspace.costs.view_mut());
        optimal_permutation_into(
            workspace.costs.view(),
            &mut workspace.solver,
            &mut workspace.permutation,
        );
    }
}

impl<T: ModeScalar> fmt::Display for ModeInterpolator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for size in self.data.shape() {
            write!(f, "{} ", size)?;
        }
        write!(f, "}} data")?;
        let branches = self.branches();
        if branches > 0 {
            write!(
                f,
                " with {} mode{}",
                branches,
                if branches > 1 { "s" } else { "" }
            )?;
        }
        if !self.layout.is_unset() {
            write!(f, " of {}", self.layout)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::{array, Array};

    fn two_scalar_modes() -> ModeInterpolator<f64> {
        let data = array![[1.0, 2.0], [2.0, 1.0], [5.0, 6.0], [5.0, 5.0]].into_dyn();
        ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap()
    }

    #[test]
    fn construction_infers_layout() {
        let interpolator = two_scalar_modes();
        assert_eq!(interpolator.points(), 4);
        assert_eq!(interpolator.branches(), 1);
        assert_eq!(interpolator.branch_span(), 2);
        assert_eq!(interpolator.bytes_per_point(), 16);
        assert!(!interpolator.is_pure_vector_or_matrix());

        let data = Array::<f64, _>::zeros((3, 2, 4, 3)).into_dyn();
        let interpolator =
            ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Axial).unwrap();
        assert_eq!(interpolator.branches(), 2);
        assert_eq!(interpolator.layout_kind(), LayoutKind::PureVector);
        assert_eq!(interpolator.element_layout().vector_count(), 4);
        assert_eq!(interpolator.rotates_like(), RotatesLike::Axial);
    }

    #[test]
    fn summaries_describe_data() {
        let interpolator = ModeInterpolator::new(
            Array::<f64, _>::zeros((4, 2)).into_dyn(),
            ModeLayout::from_counts(1, 0, 0),
            RotatesLike::Real,
        )
        .unwrap();
        assert_eq!(
            interpolator.to_string(),
            "{ 4 2 } data with 2 modes of 1 scalar element"
        );
        assert_eq!(
            ModeInterpolator::<f64>::zeroed(3, 1).to_string(),
            "{ 3 1 } data with 1 mode of 1 scalar element"
        );
    }

    #[test]
    fn failed_replacement_keeps_data() {
        let mut interpolator = two_scalar_modes();
        let invalid = Array::<f64, _>::zeros((2, 2, 2, 2)).into_dyn();
        assert!(interpolator
            .replace_data(invalid, ModeLayout::unset(), RotatesLike::Gamma)
            .is_err());
        assert_eq!(interpolator.data().shape(), &[4, 2]);
        assert_eq!(interpolator.rotates_like(), RotatesLike::Real);

        let valid = Array::<f64, _>::zeros((2, 3, 1, 3, 3)).into_dyn();
        interpolator.replace_data_with_inferred_layout(valid).unwrap();
        assert_eq!(interpolator.layout_kind(), LayoutKind::PureMatrix);
        assert_eq!(interpolator.branches(), 3);
    }

    #[test]
    fn transposed_data_is_stored_in_standard_layout() {
        let data = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]].reversed_axes().into_dyn();
        let interpolator =
            ModeInterpolator::new(data, ModeLayout::unset(), RotatesLike::Real).unwrap();
        assert!(interpolator.data().is_standard_layout());
        assert_eq!(interpolator.data().as_slice().unwrap(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn invalid_cost_specs_are_rejected() {
        let mut interpolator = two_scalar_modes();
        let invalid = CostSpec::default().with_weights([-1.0, 1.0, 1.0]);
        assert!(interpolator.set_cost_spec(invalid).is_err());
        assert_eq!(interpolator.config().cost, CostSpec::default());

        let euclidean = CostSpec::new(ScalarCost::Euclidean, VectorCost::Angle);
        interpolator.set_cost_spec(euclidean).unwrap();
        assert_eq!(interpolator.config().cost, euclidean);
    }

    #[test]
    fn cost_matrices_pair_modes() {
        let data = array![[0.0, 10.0], [10.0, 1.0]].into_dyn();
        let interpolator = ModeInterpolator::new(
            data,
            ModeLayout::from_counts(1, 0, 0),
            RotatesLike::Real,
        )
        .unwrap();
        let costs = interpolator.cost_matrix(0, 1).unwrap();
        assert_eq!(costs, array![[10.0, 1.0], [0.0, 9.0]]);
        assert_eq!(interpolator.resolve_permutation(0, 1).unwrap(), vec![1, 0]);

        let mut accumulated = Array2::zeros((2, 2));
        interpolator.add_cost(0, 1, accumulated.view_mut()).unwrap();
        interpolator.add_cost(0, 1, accumulated.view_mut()).unwrap();
        assert_eq!(accumulated, &costs * 2.0);

        assert!(matches!(
            interpolator.add_cost(0, 2, accumulated.view_mut()),
            Err(ModeError::VertexOutOfRange { index: 2, count: 2 })
        ));
        assert!(interpolator
            .add_cost(0, 1, Array2::zeros((3, 3)).view_mut())
            .is_err());
    }

    #[test]
    fn degenerate_modes_keep_identity() {
        let data = array![[1.0, 1.0, 3.0], [3.0, 1.0, 2.0]].into_dyn();
        let interpolator = ModeInterpolator::new(
            data,
            ModeLayout::from_counts(1, 0, 0),
            RotatesLike::Real,
        )
        .unwrap();
        assert!(interpolator.any_equal_modes(0).unwrap());
        assert!(!interpolator.any_equal_modes(1).unwrap());
        assert_eq!(interpolator.resolve_permutation(0, 1).unwrap(), vec![0, 1, 2]);
    }
}
