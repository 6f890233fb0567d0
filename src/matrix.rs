/**
 * CfReco
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::time::Instant;

use fnv::FnvHashSet;
use tracing::{debug, info};

use crate::error::{RecoError, RecoResult};
use crate::stats::{ColumnOrder, DataDictionary};
use crate::types::{self, DenseMatrix, DenseVector, Interaction, ItemRatingCounts, SparseMatrix,
    SparseVector};
use crate::utils;

/// A trained, read-only model: the mean-centered and popularity-normalized rating matrix together
/// with the column order it was built against.
#[derive(Clone, Debug)]
pub struct Model {
    pub normalized: DenseMatrix,
    pub item_rating_counts: ItemRatingCounts,
    pub columns: ColumnOrder,
    pub user_ids: Vec<u64>,
    pub user_means: DenseVector,
}

impl Model {

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_items(&self) -> usize {
        self.columns.len()
    }

    pub fn version(&self) -> u64 {
        self.columns.version()
    }
}

/// A query user's ratings laid out in a model's column order and centered by their own mean.
#[derive(Clone, Debug, PartialEq)]
pub struct CenteredQuery {
    pub row: DenseVector,
    pub mean: f64,
    pub rated_columns: Vec<usize>,
    pub num_dropped: usize,
}

pub fn build(interactions: &[Interaction]) -> RecoResult<Model> {
    build_versioned(interactions, 0)
}

/// Pivots the interactions into a rating matrix, centers every row by its user's mean, counts
/// the remaining non-zero ratings per item and divides every column by that count.
pub fn build_versioned(interactions: &[Interaction], version: u64) -> RecoResult<Model> {

    let training_start = Instant::now();

    let data_dict = DataDictionary::from(interactions, version);

    info!(
        "Found {} interactions between {} users and {} items.",
        data_dict.num_interactions(),
        data_dict.num_users(),
        data_dict.num_items(),
    );

    let mut ratings = pivot(interactions, &data_dict)?;

    let user_means: DenseVector = ratings.iter_mut()
        .map(center)
        .collect();

    let item_rating_counts = count_ratings(&ratings, data_dict.num_items());

    let cold_items = item_rating_counts.iter().filter(|count| **count == 0).count();
    debug!("{} items without a non-zero centered rating", cold_items);

    let normalized = normalize(&ratings, &item_rating_counts);

    let (user_ids, columns) = data_dict.into_parts();

    info!(
        "Built model version {} in {}ms",
        version,
        utils::to_millis(training_start.elapsed()),
    );

    Ok(Model { normalized, item_rating_counts, columns, user_ids, user_means })
}

/// Places every interaction into the cell of its user and item. Cells without an interaction
/// stay absent. A second rating for the same cell is rejected.
pub fn pivot(interactions: &[Interaction], data_dict: &DataDictionary) -> RecoResult<SparseMatrix> {

    let mut ratings = types::new_sparse_matrix(data_dict.num_users());

    for interaction in interactions.iter() {

        if !interaction.rating.is_finite() {
            return Err(RecoError::MalformedInput(format!(
                "rating {} of user {} for item {} is not a finite number",
                interaction.rating, interaction.user_id, interaction.item_id)));
        }

        let (row, column) = match (data_dict.user_index(interaction.user_id),
                                   data_dict.item_index(interaction.item_id)) {
            (Some(row), Some(column)) => (row, column),
            _ => return Err(RecoError::MalformedInput(format!(
                "user {} or item {} missing from the data dictionary",
                interaction.user_id, interaction.item_id))),
        };

        if ratings[row].insert(column, interaction.rating).is_some() {
            return Err(RecoError::DuplicateInteraction {
                user_id: interaction.user_id,
                item_id: interaction.item_id,
            });
        }
    }

    Ok(ratings)
}

/// Mean over the present cells only, `None` for a row without any.
pub fn mean(row: &SparseVector) -> Option<f64> {
    if row.is_empty() {
        None
    } else {
        Some(row.values().sum::<f64>() / row.len() as f64)
    }
}

/// Subtracts the row mean from every present cell and returns the mean. Absent cells stay absent.
pub fn center(row: &mut SparseVector) -> f64 {
    let row_mean = mean(row).unwrap_or(0.0);
    for rating in row.values_mut() {
        *rating -= row_mean;
    }
    row_mean
}

/// Counts the present cells per column which are still non-zero after centering.
pub fn count_ratings(centered: &SparseMatrix, num_items: usize) -> ItemRatingCounts {
    let mut counts = vec![0; num_items];
    for row in centered.iter() {
        for (column, rating) in row.iter() {
            if *rating != 0.0 {
                counts[*column] += 1;
            }
        }
    }
    counts
}

/// Division which yields zero for a zero count instead of NaN or infinity.
#[inline]
pub fn safe_divide(value: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        value / count as f64
    }
}

/// Densifies the centered rows, absent cells become zero, and divides each column by its count.
pub fn normalize(centered: &SparseMatrix, item_rating_counts: &ItemRatingCounts) -> DenseMatrix {
    centered.iter()
        .map(|row| {
            let mut dense = types::new_dense_vector(item_rating_counts.len());
            for (column, rating) in row.iter() {
                dense[*column] = safe_divide(*rating, item_rating_counts[*column]);
            }
            dense
        })
        .collect()
}

/// Lays out a single user's ratings in the given column order and centers them the same way
/// training rows are centered. Items unknown to the column order cannot be scored and are dropped.
pub fn project_and_center(
    ratings: &[(u64, f64)],
    columns: &ColumnOrder,
) -> RecoResult<CenteredQuery> {

    if ratings.is_empty() {
        return Err(RecoError::MalformedInput("the query contains no ratings".to_string()));
    }

    let mut seen_items = FnvHashSet::default();
    let mut projected = types::new_sparse_vector(ratings.len());
    let mut num_dropped = 0;

    for &(item_id, rating) in ratings.iter() {

        if !rating.is_finite() {
            return Err(RecoError::MalformedInput(
                format!("rating {} for item {} is not a finite number", rating, item_id)));
        }

        if !seen_items.insert(item_id) {
            // Queries come from a single synthetic user, we report the placeholder id 0
            return Err(RecoError::DuplicateInteraction { user_id: 0, item_id });
        }

        match columns.column(item_id) {
            Some(column) => { projected.insert(column, rating); },
            None => {
                debug!("Dropping rating for item {} which is unknown to the model", item_id);
                num_dropped += 1;
            }
        }
    }

    let query_mean = match mean(&projected) {
        Some(projected_mean) => projected_mean,
        None => ratings.iter().map(|&(_, rating)| rating).sum::<f64>() / ratings.len() as f64,
    };

    let mut row = types::new_dense_vector(columns.len());
    for (column, rating) in projected.iter() {
        row[*column] = rating - query_mean;
    }

    let mut rated_columns: Vec<usize> = projected.keys().cloned().collect();
    rated_columns.sort_unstable();

    Ok(CenteredQuery { row, mean: query_mean, rated_columns, num_dropped })
}
