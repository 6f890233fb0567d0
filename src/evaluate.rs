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

use fnv::{FnvHashMap, FnvHashSet};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng, XorShiftRng};
use scoped_pool::Pool;
use tracing::info;

use crate::error::{RecoError, RecoResult};
use crate::matrix::{self, Model};
use crate::predict;
use crate::recommend::Recommender;
use crate::similarity;
use crate::types::Interaction;
use crate::utils;

/// Which ratings of a test user are used as the query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EvaluationQuery {
    /// The held-out ratings themselves, hits are held-out items in the top-n.
    HeldOutRatings,
    /// The user's ratings from the training split, the held-out items are the ground truth.
    TrainingHistory,
}

#[derive(Clone, Debug)]
pub struct EvaluationOptions {
    pub test_fraction: f64,
    pub seed: u32,
    pub top_n: usize,
    pub num_threads: usize,
    pub query: EvaluationQuery,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        EvaluationOptions {
            test_fraction: 0.2,
            seed: 42,
            top_n: 100,
            num_threads: num_cpus::get(),
            query: EvaluationQuery::HeldOutRatings,
        }
    }
}

/// Hits summed over all test users. `hits` is the raw count, `hit_rate` normalizes it by the
/// number of held-out items that could have been hit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub hits: usize,
    pub ground_truth: usize,
    pub users_evaluated: usize,
}

impl Evaluation {

    pub fn hit_rate(&self) -> f64 {
        if self.ground_truth == 0 {
            0.0
        } else {
            self.hits as f64 / self.ground_truth as f64
        }
    }

    fn add(&mut self, other: &Evaluation) {
        self.hits += other.hits;
        self.ground_truth += other.ground_truth;
        self.users_evaluated += other.users_evaluated;
    }
}

/// A test user's held-out ratings and, if present, their ratings from the training split.
struct TestUser {
    held_out: Vec<(u64, f64)>,
    history: Vec<(u64, f64)>,
}

/// Randomly moves a `test_fraction` share of the interactions (rounded up) into a test split.
/// The same seed always yields the same split. Both splits have to be non-empty.
pub fn split(
    interactions: &[Interaction],
    test_fraction: f64,
    seed: u32,
) -> RecoResult<(Vec<Interaction>, Vec<Interaction>)> {

    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(RecoError::InvalidEvaluation(
            format!("test fraction {} must lie strictly between 0 and 1", test_fraction)));
    }

    let mut seen = FnvHashSet::default();
    for interaction in interactions.iter() {
        if !seen.insert((interaction.user_id, interaction.item_id)) {
            return Err(RecoError::DuplicateInteraction {
                user_id: interaction.user_id,
                item_id: interaction.item_id,
            });
        }
    }

    let num_test = (interactions.len() as f64 * test_fraction).ceil() as usize;

    if num_test == 0 || num_test >= interactions.len() {
        return Err(RecoError::InvalidEvaluation(format!(
            "{} interactions cannot be split into non-empty train and test sets",
            interactions.len())));
    }

    // XorShift must not be seeded with all zeros, the constant words rule that out
    let mut rng: XorShiftRng = SeedableRng::from_seed([0x193a_6754, 0xa8a7_d469, 0x9783_0e05, seed]);

    let mut indices: Vec<usize> = (0..interactions.len()).collect();
    rng.shuffle(&mut indices);

    let test = indices[..num_test].iter().map(|index| interactions[*index]).collect();
    let train = indices[num_test..].iter().map(|index| interactions[*index]).collect();

    Ok((train, test))
}

/// Splits the interactions, retrains the recommender on the training split and counts how many
/// held-out items show up in the top-n of their users. The recommender keeps the model trained on
/// the training split afterwards.
pub fn evaluate(
    recommender: &Recommender,
    interactions: &[Interaction],
    options: &EvaluationOptions,
) -> RecoResult<Evaluation> {

    let (train, test) = split(interactions, options.test_fraction, options.seed)?;

    info!("Training on {} interactions, testing on {}", train.len(), test.len());

    recommender.retrain(&train)?;
    let model = recommender.snapshot();

    let test_users = group_by_user(&train, &test);

    let evaluation_start = Instant::now();

    let totals = Mutex::new(Evaluation::default());
    let pool = Pool::new(options.num_threads.max(1));

    pool.scoped(|scope| {
        for test_user in test_users.iter() {

            let model = &model;
            let totals = &totals;

            scope.execute(move || {
                if let Some(outcome) = score(test_user, model, options) {
                    totals.lock().add(&outcome);
                }
            });
        }
    });

    pool.shutdown();

    let evaluation = totals.into_inner();

    info!(
        "{} hits for {} held-out ratings of {} users (hit rate {:.4}), {}ms evaluation time",
        evaluation.hits,
        evaluation.ground_truth,
        evaluation.users_evaluated,
        evaluation.hit_rate(),
        utils::to_millis(evaluation_start.elapsed()),
    );

    Ok(evaluation)
}

fn group_by_user(train: &[Interaction], test: &[Interaction]) -> Vec<TestUser> {

    let mut held_out: FnvHashMap<u64, Vec<(u64, f64)>> = FnvHashMap::default();
    for interaction in test.iter() {
        held_out.entry(interaction.user_id)
            .or_insert_with(Vec::new)
            .push((interaction.item_id, interaction.rating));
    }

    let mut histories: FnvHashMap<u64, Vec<(u64, f64)>> = FnvHashMap::default();
    for interaction in train.iter() {
        if held_out.contains_key(&interaction.user_id) {
            histories.entry(interaction.user_id)
                .or_insert_with(Vec::new)
                .push((interaction.item_id, interaction.rating));
        }
    }

    let mut user_ids: Vec<u64> = held_out.keys().cloned().collect();
    user_ids.sort_unstable();

    user_ids.into_iter()
        .map(|user_id| TestUser {
            held_out: held_out.remove(&user_id).unwrap_or_default(),
            history: histories.remove(&user_id).unwrap_or_default(),
        })
        .collect()
}

/// Scores a single test user, `None` if the user has nothing that could be hit.
fn score(test_user: &TestUser, model: &Model, options: &EvaluationOptions) -> Option<Evaluation> {
    match options.query {
        EvaluationQuery::HeldOutRatings => score_held_out(test_user, model, options.top_n),
        EvaluationQuery::TrainingHistory => score_history(test_user, model, options.top_n),
    }
}

fn score_held_out(test_user: &TestUser, model: &Model, top_n: usize) -> Option<Evaluation> {

    let query = matrix::project_and_center(&test_user.held_out, &model.columns).ok()?;

    // Held-out ratings at the user's mean center to zero and do not count
    let true_columns: FnvHashSet<usize> = query.row.iter()
        .enumerate()
        .filter(|(_, rating)| **rating != 0.0)
        .map(|(column, _)| column)
        .collect();

    if true_columns.is_empty() {
        return None;
    }

    let similarities = similarity::row_similarity(&query.row, &model.normalized);
    let top = predict::top_n(&query.row, &similarities, &model.normalized, top_n);

    let hits = top.iter()
        .filter(|scored_item| true_columns.contains(&scored_item.column))
        .count();

    Some(Evaluation { hits, ground_truth: true_columns.len(), users_evaluated: 1 })
}

fn score_history(test_user: &TestUser, model: &Model, top_n: usize) -> Option<Evaluation> {

    if test_user.history.is_empty() {
        return None;
    }

    let true_columns: FnvHashSet<usize> = test_user.held_out.iter()
        .filter_map(|&(item_id, _)| model.columns.column(item_id))
        .collect();

    if true_columns.is_empty() {
        return None;
    }

    let query = matrix::project_and_center(&test_user.history, &model.columns).ok()?;
    let similarities = similarity::row_similarity(&query.row, &model.normalized);
    let top = predict::top_n_excluding(
        &query.row, &similarities, &model.normalized, top_n, &query.rated_columns);

    let hits = top.iter()
        .filter(|scored_item| scored_item.score.is_finite())
        .filter(|scored_item| true_columns.contains(&scored_item.column))
        .count();

    Some(Evaluation { hits, ground_truth: true_columns.len(), users_evaluated: 1 })
}
