//! Symmetry transformation of mode data and expansion of irreducible data
//! to all vertices of a mesh.

use super::ModeInterpolator;
use crate::{
    error::{ModeError, Result},
    modes::rotation::{rotate_row, rotation_rule, RotationWorkspace},
    num::ModeScalar,
    symmetry::SymmetryMapping,
};
use indicatif::ParallelProgressIterator;
use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;

impl<T: ModeScalar> ModeInterpolator<T> {
    /// Transforms mode data in place by applying the symmetry operation
    /// associated with each of its vertices.
    ///
    /// Row `v` of `values` is transformed by operation `mapping.operations()[v]`,
    /// according to how the stored data rotates. Scalars are left unchanged.
    ///
    /// # Parameters
    ///
    /// - `values`: Array shaped like the stored data apart from the first axis.
    /// - `mapping`: Operation and representative vertex for each row of `values`.
    ///
    /// # Returns
    ///
    /// Whether any value changed.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` has the wrong shape, if the mapping does not
    /// cover all rows, or if the rotation behaviour cannot be applied to the data.
    pub fn rotate_in_place(
        &self,
        values: &mut ArrayD<T>,
        mapping: &SymmetryMapping<'_>,
    ) -> Result<bool> {
        let expected_shape = &self.data.shape()[1..];
        if values.ndim() != self.data.ndim() || &values.shape()[1..] != expected_shape {
            return Err(ModeError::ShapeMismatch {
                expected: expected_shape.to_vec(),
                found: values.shape().to_vec(),
            });
        }
        let n_vertices = values.shape()[0];
        mapping.validate(n_vertices)?;
        let rule = rotation_rule::<T>(self.rotates_like, mapping, &self.layout)?;

        let n_elements = self.elements_per_point();
        if n_vertices == 0 || n_elements == 0 {
            return Ok(false);
        }
        if !values.is_standard_layout() {
            *values = values.as_standard_layout().into_owned();
        }
        let buffer = values
            .as_slice_mut()
            .ok_or(ModeError::NonContiguousData)?;

        let layout = &self.layout;
        let kind = self.kind;
        let representatives = mapping.representatives();
        let operations = mapping.operations();
        let changed = buffer
            .par_chunks_mut(n_elements)
            .enumerate()
            .progress_with(self.config.verbosity.create_progress_bar(n_vertices))
            .map_init(
                || RotationWorkspace::new(n_elements),
                |workspace, (vertex, row)| {
                    rotate_row(
                        rule.as_ref(),
                        layout,
                        kind,
                        representatives[vertex],
                        operations[vertex],
                        row,
                        workspace,
                    )
                },
            )
            .reduce(|| false, |a, b| a || b);
        Ok(changed)
    }

    /// Creates the data for every vertex of a mesh from the stored data of
    /// the irreducible vertices.
    ///
    /// Row `v` of the result is the data of irreducible vertex
    /// `mapping.representatives()[v]` transformed by operation
    /// `mapping.operations()[v]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping is inconsistent, refers to
    /// irreducible vertices that are not stored, or if the rotation
    /// behaviour cannot be applied to the data.
    pub fn expand_to_vertices(&self, mapping: &SymmetryMapping<'_>) -> Result<ArrayD<T>> {
        let n_vertices = mapping.len();
        mapping.validate(n_vertices)?;
        let representatives = mapping.representatives();
        if let Some(&index) = representatives.iter().find(|&&index| index >= self.points()) {
            return Err(ModeError::VertexOutOfRange {
                index,
                count: self.points(),
            });
        }
        if self.config.verbosity.print_messages() {
            println!(
                "Expanding {} irreducible points to {} vertices",
                self.points(),
                n_vertices
            );
        }

        let mut shape = self.data.shape().to_vec();
        shape[0] = n_vertices;
        let mut values = ArrayD::zeros(IxDyn(&shape));

        let n_elements = self.elements_per_point();
        if n_vertices > 0 && n_elements > 0 {
            let flat = self.flat_data()?;
            values
                .as_slice_mut()
                .ok_or(ModeError::NonContiguousData)?
                .par_chunks_mut(n_elements)
                .zip(representatives.par_iter())
                .for_each(|(row, &representative)| {
                    row.copy_from_slice(self.vertex_data(flat, representative))
                });
        }
        self.rotate_in_place(&mut values, mapping)?;
        Ok(values)
    }

    /// Creates a new interpolator holding the data for every vertex of a mesh,
    /// expanded from the stored data of the irreducible vertices.
    ///
    /// See [`expand_to_vertices`](Self::expand_to_vertices).
    pub fn expanded(&self, mapping: &SymmetryMapping<'_>) -> Result<Self> {
        let data = self.expand_to_vertices(mapping)?;
        Ok(Self {
            data,
            layout: self.layout,
            kind: self.kind,
            rotates_like: self.rotates_like,
            config: self.config.clone(),
        })
    }
}
