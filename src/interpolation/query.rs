//! Evaluation of interpolated mode data at query points.

use super::{fip, ModeInterpolator};
use crate::{
    error::{ModeError, Result},
    modes::permutation::QueryWorkspace,
    num::ModeScalar,
};
use indicatif::ParallelProgressIterator;
use ndarray::{ArrayD, IxDyn};
use rayon::prelude::*;

impl<T: ModeScalar> ModeInterpolator<T> {
    /// Computes the interpolated data of all modes for a single query.
    ///
    /// Modes at every contributing vertex are reordered to match the modes
    /// at the reference vertex before being blended, so that
    /// `output[mode] = sum_v w_v * data[v][perm_v[mode]]`.
    ///
    /// # Parameters
    ///
    /// - `contributions`: Index and weight of each contributing vertex.
    /// - `reference`: Vertex whose mode ordering is used (defaults to the first contributing vertex).
    /// - `output`: Buffer of `elements_per_point()` values to write the result into.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no contributing vertices, if any vertex
    /// index is out of range or if the output buffer has the wrong size.
    pub fn interpolate_at(
        &self,
        contributions: &[(usize, fip)],
        reference: Option<usize>,
        output: &mut [T],
    ) -> Result<()> {
        let mut workspace = QueryWorkspace::new(self.branches());
        self.interpolate_query(
            0,
            contributions.iter().copied(),
            reference,
            output,
            &mut workspace,
        )
    }

    /// Computes the interpolated data for a batch of queries, each given by
    /// a list of vertex indices and a list of corresponding weights.
    ///
    /// # Returns
    ///
    /// An array with one row per query, shaped like the stored data apart
    /// from the first axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of vertex and weight lists differ, if
    /// the lists of any query differ in length, or if any query is invalid.
    pub fn interpolate_at_batch(
        &self,
        vertex_lists: &[Vec<usize>],
        weight_lists: &[Vec<fip>],
    ) -> Result<ArrayD<T>> {
        if vertex_lists.len() != weight_lists.len() {
            return Err(ModeError::MappingLengthMismatch {
                what: "weight lists",
                expected: vertex_lists.len(),
                found: weight_lists.len(),
            });
        }
        if let Some((query, (vertices, weights))) = vertex_lists
            .iter()
            .zip(weight_lists)
            .enumerate()
            .find(|(_, (vertices, weights))| vertices.len() != weights.len())
        {
            return Err(ModeError::WeightCountMismatch {
                query,
                vertices: vertices.len(),
                weights: weights.len(),
            });
        }
        self.interpolate_batch(vertex_lists.len(), |query| {
            vertex_lists[query]
                .iter()
                .copied()
                .zip(weight_lists[query].iter().copied())
        })
    }

    /// Computes the interpolated data for a batch of queries, each given by
    /// a list of vertex indices paired with weights.
    ///
    /// # Returns
    ///
    /// An array with one row per query, shaped like the stored data apart
    /// from the first axis.
    pub fn interpolate_pairs_batch(&self, queries: &[Vec<(usize, fip)>]) -> Result<ArrayD<T>> {
        self.interpolate_batch(queries.len(), |query| queries[query].iter().copied())
    }

    fn interpolate_batch<C, I>(&self, n_queries: usize, contributions: C) -> Result<ArrayD<T>>
    where
        C: Fn(usize) -> I + Sync,
        I: ExactSizeIterator<Item = (usize, fip)> + Clone,
    {
        let mut shape = self.data.shape().to_vec();
        shape[0] = n_queries;
        let mut values = ArrayD::zeros(IxDyn(&shape));

        let n_elements = self.elements_per_point();
        if n_queries == 0 || n_elements == 0 {
            return Ok(values);
        }
        let verbosity = &self.config.verbosity;
        if verbosity.print_messages() {
            println!(
                "Interpolating {} modes at {} query points",
                self.branches(),
                n_queries
            );
        }

        let buffer = values
            .as_slice_mut()
            .ok_or(ModeError::NonContiguousData)?;
        let branches = self.branches();
        buffer
            .par_chunks_mut(n_elements)
            .enumerate()
            .progress_with(verbosity.create_progress_bar(n_queries))
            .try_for_each_init(
                || QueryWorkspace::new(branches),
                |workspace, (query, output)| {
                    self.interpolate_query(query, contributions(query), None, output, workspace)
                },
            )?;
        Ok(values)
    }

    fn interpolate_query<I>(
        &self,
        query: usize,
        contributions: I,
        reference: Option<usize>,
        output: &mut [T],
        workspace: &mut QueryWorkspace,
    ) -> Result<()>
    where
        I: ExactSizeIterator<Item = (usize, fip)> + Clone,
    {
        let n_elements = self.elements_per_point();
        if output.len() != n_elements {
            return Err(ModeError::OutputSizeMismatch {
                expected: n_elements,
                found: output.len(),
            });
        }
        let first_vertex = match contributions.clone().next() {
            Some((vertex, _)) => vertex,
            None => return Err(ModeError::EmptyQuery(query)),
        };
        for (vertex, _) in contributions.clone() {
            self.check_vertex(vertex)?;
        }
        let reference = reference.unwrap_or(first_vertex);
        self.check_vertex(reference)?;

        let flat = self.flat_data()?;
        if contributions.len() == 1 {
            output.copy_from_slice(self.vertex_data(flat, first_vertex));
            return Ok(());
        }

        // Blend differences from the reference data, so that vertices holding
        // the same data as the reference reproduce it exactly
        let span = self.branch_span();
        let reference_modes = self.vertex_data(flat, reference);
        let total_weight: fip = contributions.clone().map(|(_, weight)| weight).sum();
        output
            .iter_mut()
            .zip(reference_modes)
            .for_each(|(value, &reference_value)| *value = reference_value.scaled(total_weight));

        for (vertex, weight) in contributions {
            if vertex == reference {
                continue;
            }
            let modes = self.vertex_data(flat, vertex);
            self.resolve_permutation_into(reference_modes, modes, workspace);
            for (mode, (target, reference_block)) in output
                .chunks_exact_mut(span)
                .zip(reference_modes.chunks_exact(span))
                .enumerate()
            {
                let source_mode = workspace.permutation[mode];
                let source = &modes[source_mode * span..(source_mode + 1) * span];
                target
                    .iter_mut()
                    .zip(source.iter().zip(reference_block))
                    .for_each(|(value, (&contribution, &reference_value))| {
                        *value = *value + (contribution - reference_value).scaled(weight)
                    });
            }
        }
        Ok(())
    }
}
