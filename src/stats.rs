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

use crate::types::Interaction;

/// The fixed mapping between item identifiers and matrix columns. Every vector that is compared
/// against a trained matrix must be laid out in this order. Items are sorted by identifier, so
/// the same interaction set always yields the same columns.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnOrder {
    item_ids: Vec<u64>,
    columns: FnvHashMap<u64, usize>,
    version: u64,
}

impl ColumnOrder {

    pub fn new(mut item_ids: Vec<u64>, version: u64) -> Self {
        item_ids.sort_unstable();
        item_ids.dedup();

        let columns = item_ids.iter()
            .enumerate()
            .map(|(column, item_id)| (*item_id, column))
            .collect();

        ColumnOrder { item_ids, columns, version }
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    /// The training pass this order belongs to.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn column(&self, item_id: u64) -> Option<usize> {
        self.columns.get(&item_id).cloned()
    }

    pub fn item_id(&self, column: usize) -> u64 {
        self.item_ids[column]
    }

    pub fn item_ids(&self) -> &[u64] {
        &self.item_ids
    }
}

/// Row and column indexes for a set of interactions.
pub struct DataDictionary {
    user_ids: Vec<u64>,
    user_dict: FnvHashMap<u64, usize>,
    columns: ColumnOrder,
    num_interactions: u64,
}

impl DataDictionary {

    pub fn num_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn num_items(&self) -> usize {
        self.columns.len()
    }

    pub fn num_interactions(&self) -> u64 {
        self.num_interactions
    }

    pub fn user_index(&self, user_id: u64) -> Option<usize> {
        self.user_dict.get(&user_id).cloned()
    }

    pub fn item_index(&self, item_id: u64) -> Option<usize> {
        self.columns.column(item_id)
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.user_ids
    }

    pub fn columns(&self) -> &ColumnOrder {
        &self.columns
    }

    /// Consumes the dictionary, the column order outlives it as part of the trained model.
    pub fn into_parts(self) -> (Vec<u64>, ColumnOrder) {
        (self.user_ids, self.columns)
    }
}

impl DataDictionary {

    pub fn from(interactions: &[Interaction], version: u64) -> Self {

        let mut user_ids: Vec<u64> = interactions.iter()
            .map(|interaction| interaction.user_id)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let user_dict = user_ids.iter()
            .enumerate()
            .map(|(row, user_id)| (*user_id, row))
            .collect();

        let item_ids: Vec<u64> = interactions.iter()
            .map(|interaction| interaction.item_id)
            .collect();

        DataDictionary {
            user_ids,
            user_dict,
            columns: ColumnOrder::new(item_ids, version),
            num_interactions: interactions.len() as u64,
        }
    }
}
