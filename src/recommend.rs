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

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_derive::Serialize;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::RecoResult;
use crate::matrix::{self, Model};
use crate::predict;
use crate::similarity;
use crate::types::Interaction;
use crate::utils;

pub const DEFAULT_NUM_RECOMMENDATIONS: usize = 20;

/// A recommended item with its presentation fields. Field names will be used in JSON.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub item_id: u64,
    pub external_code: String,
    pub title: String,
    pub predicted_rating: f64,
    pub model_version: u64,
}

/// The recommendation engine. Requests read an immutable snapshot of the trained model, a
/// retraining pass builds a complete new model and swaps it in, so readers never observe a
/// partially built matrix.
pub struct Recommender {
    model: RwLock<Arc<Model>>,
    retraining: Mutex<()>,
}

impl Recommender {

    pub fn new(interactions: &[Interaction]) -> RecoResult<Self> {
        let model = matrix::build(interactions)?;
        Ok(Recommender::from_model(model))
    }

    pub fn from_model(model: Model) -> Self {
        Recommender { model: RwLock::new(Arc::new(model)), retraining: Mutex::new(()) }
    }

    /// The currently loaded model. Requests in flight keep using their snapshot after a retrain.
    pub fn snapshot(&self) -> Arc<Model> {
        Arc::clone(&self.model.read())
    }

    /// Replaces the loaded model with one built from scratch on the given interactions. The
    /// previous model stays in place if the build fails. Retraining passes run one at a time,
    /// requests keep reading the current model meanwhile.
    pub fn retrain(&self, interactions: &[Interaction]) -> RecoResult<u64> {
        let _retraining = self.retraining.lock();

        let next_version = self.snapshot().version() + 1;
        let model = matrix::build_versioned(interactions, next_version)?;

        let mut current = self.model.write();
        *current = Arc::new(model);

        Ok(next_version)
    }

    /// Recommends up to `n` items the query user has not rated, best first, with predicted
    /// ratings on the user's own scale rounded to two decimals.
    pub fn recommend<C: Catalog + ?Sized>(
        &self,
        ratings: &[(u64, f64)],
        n: usize,
        catalog: &C,
    ) -> RecoResult<Vec<Recommendation>> {

        let model = self.snapshot();
        let query = matrix::project_and_center(ratings, &model.columns)?;

        if query.num_dropped > 0 {
            debug!("{} of {} query ratings cannot be scored", query.num_dropped, ratings.len());
        }

        let similarities = similarity::row_similarity(&query.row, &model.normalized);
        let top = predict::top_n_excluding(
            &query.row, &similarities, &model.normalized, n, &query.rated_columns);

        let recommendations = top.into_iter()
            // Masked columns only show up once all unrated ones are taken
            .filter(|scored_item| scored_item.score.is_finite())
            .map(|scored_item| {
                let item_id = model.columns.item_id(scored_item.column);
                let metadata = catalog.describe(item_id);

                Recommendation {
                    item_id,
                    external_code: metadata.external_code,
                    title: metadata.title,
                    predicted_rating: utils::round_to(scored_item.score + query.mean, 2),
                    model_version: model.version(),
                }
            })
            .collect();

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {

    use std::sync::Arc;
    use std::thread;

    use fnv::FnvHashSet;

    use crate::catalog::{BookCatalog, UNKNOWN_CODE, UNKNOWN_TITLE};
    use crate::recommend::Recommender;
    use crate::types::Interaction;

    fn interactions() -> Vec<Interaction> {
        vec![
            Interaction::new(1, 1, 5.0),
            Interaction::new(1, 2, 3.0),
            Interaction::new(2, 1, 4.0),
            Interaction::new(2, 3, 2.0),
        ]
    }

    fn library() -> Vec<Interaction> {
        let mut interactions = Vec::new();
        for user in 0..20_u64 {
            for item in 0..12_u64 {
                if (user + item) % 3 != 0 {
                    let rating = 1.0 + ((user * 7 + item * 3) % 5) as f64;
                    interactions.push(Interaction::new(user, item, rating));
                }
            }
        }
        interactions
    }

    #[test]
    fn small_scenario() {
        let recommender = Recommender::new(&interactions()).unwrap();

        let recommendations = recommender
            .recommend(&[(1, 5.0)], 10, &BookCatalog::new())
            .unwrap();

        let items: FnvHashSet<u64> = recommendations.iter()
            .map(|recommendation| recommendation.item_id)
            .collect();

        assert_eq!(recommendations.len(), 2);
        assert!(items.contains(&2));
        assert!(items.contains(&3));

        for recommendation in recommendations.iter() {
            assert!(recommendation.predicted_rating.is_finite());
            assert_eq!(recommendation.title, UNKNOWN_TITLE);
            assert_eq!(recommendation.external_code, UNKNOWN_CODE);
        }
    }

    #[test]
    fn rated_items_are_never_recommended() {
        let recommender = Recommender::new(&library()).unwrap();
        let query = vec![(0, 5.0), (4, 1.0), (7, 3.0), (11, 4.0)];

        let recommendations = recommender.recommend(&query, 100, &BookCatalog::new()).unwrap();

        assert_eq!(recommendations.len(), 8);
        for recommendation in recommendations.iter() {
            assert!(query.iter().all(|&(item, _)| item != recommendation.item_id));
        }
    }

    #[test]
    fn exactly_n_sorted_descending() {
        let recommender = Recommender::new(&library()).unwrap();
        let query = vec![(1, 2.0), (2, 5.0), (3, 4.0)];

        let recommendations = recommender.recommend(&query, 5, &BookCatalog::new()).unwrap();

        assert_eq!(recommendations.len(), 5);
        for pair in recommendations.windows(2) {
            assert!(pair[0].predicted_rating >= pair[1].predicted_rating);
        }
    }

    #[test]
    fn uniform_ratings_stay_on_the_users_scale() {
        let recommender = Recommender::new(&library()).unwrap();
        let query = vec![(0, 5.0), (1, 5.0), (2, 5.0)];

        let recommendations = recommender.recommend(&query, 4, &BookCatalog::new()).unwrap();

        // A constant query centers to the zero vector, so there is no residual left to add
        assert_eq!(recommendations.len(), 4);
        for recommendation in recommendations.iter() {
            assert_eq!(recommendation.predicted_rating, 5.0);
        }
    }

    #[test]
    fn unknown_items_are_dropped() {
        let recommender = Recommender::new(&interactions()).unwrap();

        let recommendations = recommender
            .recommend(&[(1, 5.0), (999, 1.0)], 10, &BookCatalog::new())
            .unwrap();

        assert_eq!(recommendations.len(), 2);
        assert!(recommendations.iter().all(|recommendation| recommendation.item_id != 1));
    }

    #[test]
    fn metadata_is_attached() {
        let recommender = Recommender::new(&interactions()).unwrap();

        let mut catalog = BookCatalog::new();
        catalog.insert(2, 200, Some("Dune"), Some("0441013597"));

        let recommendations = recommender.recommend(&[(1, 5.0)], 10, &catalog).unwrap();

        let dune = recommendations.iter()
            .find(|recommendation| recommendation.item_id == 2)
            .unwrap();

        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.external_code, "0441013597");
    }

    #[test]
    fn retraining_swaps_the_model() {
        let recommender = Recommender::new(&interactions()).unwrap();
        let before = recommender.snapshot();

        let version = recommender.retrain(&library()).unwrap();

        assert_eq!(version, 1);
        assert_eq!(before.version(), 0);
        assert_eq!(before.num_items(), 3);
        assert_eq!(recommender.snapshot().version(), 1);
        assert_eq!(recommender.snapshot().num_items(), 12);
    }

    #[test]
    fn recommendations_carry_the_model_version() {
        let recommender = Recommender::new(&interactions()).unwrap();

        let before = recommender.recommend(&[(1, 5.0)], 10, &BookCatalog::new()).unwrap();
        assert!(before.iter().all(|recommendation| recommendation.model_version == 0));

        recommender.retrain(&library()).unwrap();

        let after = recommender.recommend(&[(1, 5.0)], 10, &BookCatalog::new()).unwrap();
        assert!(!after.is_empty());
        assert!(after.iter().all(|recommendation| recommendation.model_version == 1));
    }

    #[test]
    fn huge_n_returns_every_unrated_item() {
        let recommender = Recommender::new(&library()).unwrap();
        let query = vec![(0, 5.0), (1, 2.0)];

        let recommendations = recommender
            .recommend(&query, usize::max_value(), &BookCatalog::new())
            .unwrap();

        assert_eq!(recommendations.len(), 10);
    }

    #[test]
    fn concurrent_retraining_assigns_distinct_versions() {
        let recommender = Arc::new(Recommender::new(&interactions()).unwrap());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let recommender = Arc::clone(&recommender);
                thread::spawn(move || recommender.retrain(&library()).unwrap())
            })
            .collect();

        let mut versions: Vec<u64> = workers.into_iter()
            .map(|worker| worker.join().unwrap())
            .collect();
        versions.sort_unstable();

        assert_eq!(versions, vec![1, 2, 3, 4]);
        assert_eq!(recommender.snapshot().version(), 4);
    }

    #[test]
    fn failed_retraining_keeps_the_model() {
        let recommender = Recommender::new(&interactions()).unwrap();

        let mut broken = interactions();
        broken.push(Interaction::new(1, 1, 2.0));

        assert!(recommender.retrain(&broken).is_err());
        assert_eq!(recommender.snapshot().version(), 0);
    }

    #[test]
    fn empty_query_is_malformed() {
        let recommender = Recommender::new(&interactions()).unwrap();
        let failure = recommender.recommend(&[], 10, &BookCatalog::new()).unwrap_err();
        assert!(failure.is_client_error());
    }
}
