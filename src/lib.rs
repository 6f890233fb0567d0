/*
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

//! User-user collaborative filtering on explicit ratings. Historical ratings are turned into a
//! mean-centered, popularity-normalized user-item matrix, and new users are matched against its
//! rows by cosine similarity to predict ratings for the items they have not rated yet.

pub mod catalog;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod matrix;
pub mod predict;
pub mod recommend;
pub mod similarity;
pub mod stats;
pub mod types;
pub mod utils;


pub use crate::catalog::{BookCatalog, Catalog, ItemMetadata};
pub use crate::error::{RecoError, RecoResult};
pub use crate::evaluate::{evaluate, Evaluation, EvaluationOptions, EvaluationQuery};
pub use crate::matrix::Model;
pub use crate::recommend::{Recommendation, Recommender, DEFAULT_NUM_RECOMMENDATIONS};
pub use crate::types::Interaction;
