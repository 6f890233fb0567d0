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

use std::env;
use std::process;

use getopts::Options;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cfreco::io;
use cfreco::{evaluate, EvaluationOptions, EvaluationQuery, RecoResult, Recommender};

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cfreco=info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let defaults = EvaluationOptions::default();

    let mut opts = Options::new();
    opts.optopt("i", "interactions", "Interactions to evaluate on (required). A CSV file with a \
        header and a user_id,book_id,rating triple per line.", "PATH");
    opts.optopt("f", "test-fraction", "Share of the interactions to hold out (optional, defaults \
        to 0.2).", "FRACTION");
    opts.optopt("s", "seed", "Seed for the random split (optional, defaults to 42).", "NUMBER");
    opts.optopt("n", "top-n", "Number of predicted items per test user (optional, defaults to \
        100).", "NUMBER");
    opts.optopt("t", "threads", "Number of threads for scoring test users (optional, defaults to \
        the number of CPUs).", "NUMBER");
    opts.optflag("", "history", "Query with the test users' training ratings instead of their \
        held-out ratings.");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let interactions_path = match matches.opt_str("i") {
        Some(interactions_path) => interactions_path,
        None => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an interactions file via --interactions."),
        ),
    };

    let parsed = matches.opt_get_default("f", defaults.test_fraction)
        .map_err(|failure| format!("Problem with option 'f': {}", failure))
        .and_then(|test_fraction| matches.opt_get_default("s", defaults.seed)
            .map_err(|failure| format!("Problem with option 's': {}", failure))
            .map(|seed| (test_fraction, seed)))
        .and_then(|(test_fraction, seed)| matches.opt_get_default("n", defaults.top_n)
            .map_err(|failure| format!("Problem with option 'n': {}", failure))
            .map(|top_n| (test_fraction, seed, top_n)))
        .and_then(|(test_fraction, seed, top_n)| matches.opt_get_default("t", defaults.num_threads)
            .map_err(|failure| format!("Problem with option 't': {}", failure))
            .map(|num_threads| (test_fraction, seed, top_n, num_threads)));

    let (test_fraction, seed, top_n, num_threads) = match parsed {
        Ok(values) => values,
        Err(hint) => return print_usage_and_exit(&program, opts, Some(&hint)),
    };

    let query = if matches.opt_present("history") {
        EvaluationQuery::TrainingHistory
    } else {
        EvaluationQuery::HeldOutRatings
    };

    let options = EvaluationOptions { test_fraction, seed, top_n, num_threads, query };

    if let Err(failure) = run_evaluation(&interactions_path, &options) {
        error!("Evaluation failed: {}", failure);
        process::exit(if failure.is_client_error() { 2 } else { 1 });
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
    process::exit(2);
}

fn run_evaluation(interactions_path: &str, options: &EvaluationOptions) -> RecoResult<()> {

    info!("Reading interactions from {}", interactions_path);
    let interactions = io::read_interactions(interactions_path)?;

    let recommender = Recommender::new(&interactions)?;
    let evaluation = evaluate(&recommender, &interactions, options)?;

    println!("hits\t{}", evaluation.hits);
    println!("ground_truth\t{}", evaluation.ground_truth);
    println!("users\t{}", evaluation.users_evaluated);
    println!("hit_rate\t{:.4}", evaluation.hit_rate());

    Ok(())
}
