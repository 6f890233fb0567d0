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

use crate::types::{DenseMatrix, DenseVector};

#[inline(always)]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline(always)]
pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Cosine of the angle between two vectors, zero if either of them has no length.
pub fn cosine(a: &[f64], b: &[f64]) -> f64 {
    cosine_with_norms(a, norm(a), b, norm(b))
}

#[inline(always)]
fn cosine_with_norms(a: &[f64], norm_a: f64, b: &[f64], norm_b: f64) -> f64 {
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        // Round off can push parallel vectors slightly outside of [-1, 1]
        (dot(a, b) / (norm_a * norm_b)).max(-1.0).min(1.0)
    }
}

/// Cosine similarities of every query row to every reference row, one output row per query row.
pub fn similarity(query_rows: &[DenseVector], reference_rows: &[DenseVector]) -> DenseMatrix {

    let reference_norms: Vec<f64> = reference_rows.iter()
        .map(|row| norm(row))
        .collect();

    query_rows.iter()
        .map(|query_row| similarities_to(query_row, reference_rows, &reference_norms))
        .collect()
}

/// Similarities of a single query row, used when rows are scored one at a time.
pub fn row_similarity(query_row: &[f64], reference_rows: &[DenseVector]) -> DenseVector {
    let reference_norms: Vec<f64> = reference_rows.iter()
        .map(|row| norm(row))
        .collect();

    similarities_to(query_row, reference_rows, &reference_norms)
}

fn similarities_to(
    query_row: &[f64],
    reference_rows: &[DenseVector],
    reference_norms: &[f64],
) -> DenseVector {

    let query_norm = norm(query_row);

    reference_rows.iter()
        .zip(reference_norms.iter())
        .map(|(reference_row, reference_norm)| {
            cosine_with_norms(query_row, query_norm, reference_row, *reference_norm)
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use crate::similarity;

    fn close_enough_to(value: f64, expected: f64) -> bool {
        (value - expected).abs() < 1e-12
    }

    #[test]
    fn cosine() {
        assert!(close_enough_to(similarity::cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
        assert!(close_enough_to(similarity::cosine(&[1.0, 1.0], &[2.0, 2.0]), 1.0));
        assert!(close_enough_to(similarity::cosine(&[1.0, 1.0], &[-1.0, -1.0]), -1.0));
        assert!(close_enough_to(similarity::cosine(&[1.0, 0.0], &[1.0, 1.0]), 0.5_f64.sqrt()));
    }

    #[test]
    fn symmetric_and_bounded() {
        let a = [0.3, -1.2, 0.0, 2.5];
        let b = [-0.7, 0.4, 1.1, 0.9];

        let ab = similarity::cosine(&a, &b);
        let ba = similarity::cosine(&b, &a);

        assert!(close_enough_to(ab, ba));
        assert!(ab >= -1.0 && ab <= 1.0);
        assert!(similarity::cosine(&a, &a) <= 1.0);
    }

    #[test]
    fn zero_vectors_are_similar_to_nothing() {
        assert_eq!(similarity::cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(similarity::cosine(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
        assert_eq!(similarity::cosine(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn similarity_matrix_shape() {
        let queries = vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
        let references = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![-2.0, 0.0, 0.0]];

        let similarities = similarity::similarity(&queries, &references);

        assert_eq!(similarities.len(), 2);
        assert_eq!(similarities[0], vec![1.0, 0.0, -1.0]);
        assert_eq!(similarities[1], vec![0.0, 0.0, 0.0]);
        assert_eq!(similarity::row_similarity(&queries[0], &references), similarities[0]);
    }
}
