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

use fnv::FnvHashMap;
use serde_derive::Deserialize;

/// One observed rating of an item by a user. The `book_id` alias matches the column name of the
/// interaction files we ingest.
#[derive(Deserialize, Clone, Copy, PartialEq, Debug)]
pub struct Interaction {
    pub user_id: u64,
    #[serde(alias = "book_id")]
    pub item_id: u64,
    pub rating: f64,
}

impl Interaction {
    pub fn new(user_id: u64, item_id: u64, rating: f64) -> Self {
        Interaction { user_id, item_id, rating }
    }
}

pub type DenseVector = Vec<f64>;
pub type DenseMatrix = Vec<DenseVector>;

/// Known cells of a rating row, keyed by column index. Absent cells are simply not present.
pub type SparseVector = FnvHashMap<usize, f64>;
pub type SparseMatrix = Vec<SparseVector>;

/// Per column, the number of users with a non-zero centered rating.
pub type ItemRatingCounts = Vec<u32>;

pub fn new_dense_vector(dimensions: usize) -> DenseVector {
    vec![0.0; dimensions]
}

pub fn new_sparse_vector(capacity: usize) -> SparseVector {
    FnvHashMap::with_capacity_and_hasher(capacity, Default::default())
}

pub fn new_sparse_matrix(num_rows: usize) -> SparseMatrix {
    vec![new_sparse_vector(0); num_rows]
}
