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

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::NEG_INFINITY;

use crate::types::{self, DenseMatrix, DenseVector};

/// Result type used to find the top-n predicted columns via a binary heap
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ScoredItem {
    pub column: usize,
    pub score: f64,
}

/// Ordering for our max-heap, which has to keep the worst of the current top-n on top. Higher
/// scores and, among equal scores, lower columns order first. Note that we must use a special
/// implementation here as there is no total order on floating point numbers.
fn cmp_reverse(scored_item_a: &ScoredItem, scored_item_b: &ScoredItem) -> Ordering {
    let by_score = match scored_item_a.score.partial_cmp(&scored_item_b.score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        Some(Ordering::Equal) => Ordering::Equal,
        None => Ordering::Equal
    };

    by_score.then(scored_item_a.column.cmp(&scored_item_b.column))
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Estimates centered ratings for every column the query has not rated, as the similarity
/// weighted average over all reference rows with a non-negative similarity to the query. Rated
/// columns are passed through unchanged. Without any weight, the estimate is zero.
pub fn predict(
    query_row: &[f64],
    similarities: &[f64],
    reference_rows: &DenseMatrix,
) -> DenseVector {

    let mut weighted_sums = types::new_dense_vector(query_row.len());
    let mut sum_of_weights = 0.0;

    for (reference_row, similarity) in reference_rows.iter().zip(similarities.iter()) {
        // Negative neighbors are excluded, not down-weighted
        if *similarity >= 0.0 {
            sum_of_weights += similarity.abs();

            if *similarity != 0.0 {
                for (weighted_sum, rating) in weighted_sums.iter_mut().zip(reference_row.iter()) {
                    *weighted_sum += similarity * rating;
                }
            }
        }
    }

    query_row.iter()
        .zip(weighted_sums.iter())
        .map(|(query_rating, weighted_sum)| {
            if *query_rating != 0.0 {
                *query_rating
            } else if sum_of_weights != 0.0 {
                weighted_sum / sum_of_weights
            } else {
                0.0
            }
        })
        .collect()
}

/// Runs `predict`, masks every column the query rated with negative infinity and returns the
/// `n` highest scored columns, best first. Equal scores are ordered by column.
pub fn top_n(
    query_row: &[f64],
    similarities: &[f64],
    reference_rows: &DenseMatrix,
    n: usize,
) -> Vec<ScoredItem> {

    let rated_columns: Vec<usize> = query_row.iter()
        .enumerate()
        .filter(|(_, rating)| **rating != 0.0)
        .map(|(column, _)| column)
        .collect();

    top_n_excluding(query_row, similarities, reference_rows, n, &rated_columns)
}

/// Like `top_n`, but masks exactly the given columns. A rating equal to the user's mean centers
/// to zero, so callers which know the rated items pass them here.
pub fn top_n_excluding(
    query_row: &[f64],
    similarities: &[f64],
    reference_rows: &DenseMatrix,
    n: usize,
    rated_columns: &[usize],
) -> Vec<ScoredItem> {

    if n == 0 {
        return Vec::new();
    }

    let mut predictions = predict(query_row, similarities, reference_rows);

    for column in rated_columns.iter() {
        predictions[*column] = NEG_INFINITY;
    }

    let mut heap = BinaryHeap::with_capacity(n.min(predictions.len()));

    for (column, score) in predictions.into_iter().enumerate() {

        let scored_item = ScoredItem { column, score };

        if heap.len() < n {
            heap.push(scored_item);
        } else if let Some(mut top) = heap.peek_mut() {
            if scored_item < *top {
                *top = scored_item;
            }
        }
    }

    heap.into_sorted_vec()
}

#[cfg(test)]
mod tests {

    use std::collections::BinaryHeap;
    use std::f64::NEG_INFINITY;

    use crate::predict;
    use crate::predict::ScoredItem;

    fn close_enough_to(value: f64, expected: f64) -> bool {
        (value - expected).abs() < 1e-12
    }

    #[test]
    fn scored_item_ordering_reversed() {
        let item_a = ScoredItem { column: 1, score: 0.5 };
        let item_b = ScoredItem { column: 2, score: 1.5 };
        let item_c = ScoredItem { column: 3, score: 0.3 };
        let item_d = ScoredItem { column: 0, score: 0.5 };

        assert!(item_a > item_b);
        assert!(item_a < item_c);
        assert!(item_b < item_c);
        assert!(item_d < item_a);
    }

    #[test]
    fn heap_keeps_worst_on_top() {
        let mut heap = BinaryHeap::new();
        heap.push(ScoredItem { column: 0, score: 2.0 });
        heap.push(ScoredItem { column: 1, score: -1.0 });
        heap.push(ScoredItem { column: 2, score: 0.5 });

        assert_eq!(heap.peek().unwrap().column, 1);
    }

    #[test]
    fn weighted_average_of_non_negative_neighbors() {
        let query = vec![1.0, 0.0, 0.0];
        let references = vec![
            vec![1.0, 2.0, 0.0],
            vec![1.0, 4.0, 1.0],
            vec![-1.0, 100.0, 100.0],
        ];
        let similarities = vec![0.5, 0.25, -0.9];

        let predictions = predict::predict(&query, &similarities, &references);

        assert_eq!(predictions[0], 1.0);
        assert!(close_enough_to(predictions[1], (0.5 * 2.0 + 0.25 * 4.0) / 0.75));
        assert!(close_enough_to(predictions[2], (0.25 * 1.0) / 0.75));
    }

    #[test]
    fn no_weight_predicts_zero() {
        let query = vec![1.0, 0.0];
        let references = vec![vec![1.0, 3.0], vec![-1.0, 2.0]];

        let all_negative = predict::predict(&query, &[-0.5, -0.1], &references);
        assert_eq!(all_negative, vec![1.0, 0.0]);

        let all_zero = predict::predict(&query, &[0.0, 0.0], &references);
        assert_eq!(all_zero, vec![1.0, 0.0]);

        let nobody = predict::predict(&query, &[], &Vec::new());
        assert_eq!(nobody, vec![1.0, 0.0]);
    }

    #[test]
    fn top_n_masks_rated_columns() {
        let query = vec![0.0, 1.0, 0.0, 0.0];
        let references = vec![vec![0.5, 9.0, 0.1, 0.3]];

        let top = predict::top_n(&query, &[1.0], &references, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].column, 0);
        assert!(close_enough_to(top[0].score, 0.5));
        assert_eq!(top[1].column, 3);
        assert!(close_enough_to(top[1].score, 0.3));
    }

    #[test]
    fn top_n_beyond_unrated_columns_reaches_masked_ones() {
        let query = vec![0.0, -1.0, 1.0];
        let references = vec![vec![0.2, 0.0, 0.0]];

        let top = predict::top_n(&query, &[1.0], &references, 5);

        assert_eq!(top.len(), 3);
        assert_eq!(top[0].column, 0);
        assert_eq!(top[1], ScoredItem { column: 1, score: NEG_INFINITY });
        assert_eq!(top[2], ScoredItem { column: 2, score: NEG_INFINITY });
    }

    #[test]
    fn ties_are_broken_by_column() {
        let query = vec![0.0; 5];
        let references = vec![vec![0.1, 0.3, 0.3, 0.1, 0.3]];

        let top = predict::top_n(&query, &[1.0], &references, 4);

        let columns: Vec<usize> = top.iter().map(|scored_item| scored_item.column).collect();
        assert_eq!(columns, vec![1, 2, 4, 0]);
    }

    #[test]
    fn explicit_masks_cover_mean_ratings() {
        // The first column was rated exactly at the user's mean
        let query = vec![0.0, 0.0, 0.0];
        let references = vec![vec![0.9, 0.1, 0.2]];

        let unmasked = predict::top_n(&query, &[1.0], &references, 1);
        assert_eq!(unmasked[0].column, 0);

        let masked = predict::top_n_excluding(&query, &[1.0], &references, 1, &[0]);
        assert_eq!(masked[0].column, 2);
    }

    #[test]
    fn top_n_larger_than_the_catalog() {
        let query = vec![0.0, 1.0, 0.0];
        let references = vec![vec![0.4, 0.0, 0.6]];

        let top = predict::top_n(&query, &[1.0], &references, usize::max_value());

        let columns: Vec<usize> = top.iter().map(|scored_item| scored_item.column).collect();
        assert_eq!(columns, vec![2, 0, 1]);
    }

    #[test]
    fn top_zero() {
        let query = vec![0.0, 0.0];
        assert!(predict::top_n(&query, &[1.0], &vec![vec![1.0, 1.0]], 0).is_empty());
    }
}
