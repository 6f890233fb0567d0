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

use getopts::{Matches, Options};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cfreco::io;
use cfreco::{BookCatalog, Catalog, RecoResult, Recommender, DEFAULT_NUM_RECOMMENDATIONS};

fn main() {

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cfreco=info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "interactions", "Historical interactions (required). A CSV file with a \
        header and a user_id,book_id,rating triple per line.", "PATH");
    opts.optopt("q", "query", "Ratings of the user to recommend for (required). A JSON file with \
        either a list of {user_id, book_id, rating} objects or an object holding such a list \
        under `user_ratings`.", "PATH");
    opts.optopt("m", "book-id-map", "Mapping from internal to best book ids (optional, CSV with \
        columns book_id_csv,book_id).", "PATH");
    opts.optopt("w", "book-works", "Book works with titles (optional, CSV with columns \
        best_book_id,work_id,original_title).", "PATH");
    opts.optopt("s", "isbn", "ISBNs of books (optional, CSV with columns book_id,isbn).", "PATH");
    opts.optopt("n", "num-recommendations", "Number of books to recommend (optional, defaults \
        to 20).", "NUMBER");
    opts.optopt("o", "outputfile", "Output file name (optional, output will be written to stdout \
        by default).", "PATH");
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

    let (interactions_path, query_path) = match (matches.opt_str("i"), matches.opt_str("q")) {
        (Some(interactions_path), Some(query_path)) => (interactions_path, query_path),
        _ => return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an interactions file via --interactions and a query via --query."),
        ),
    };

    let n: usize = match matches.opt_get_default("n", DEFAULT_NUM_RECOMMENDATIONS) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if let Err(failure) = recommend(&interactions_path, &query_path, n, &matches) {
        let kind = if failure.is_client_error() { "Invalid input" } else { "Recommendation failed" };
        error!("{}: {}", kind, failure);
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

fn load_catalog(matches: &Matches) -> RecoResult<BookCatalog> {
    match (matches.opt_str("m"), matches.opt_str("w"), matches.opt_str("s")) {
        (Some(book_id_map), Some(book_works), Some(isbn)) =>
            BookCatalog::from_csv_files(&book_id_map, &book_works, &isbn),
        (None, None, None) => {
            info!("No catalog files given, recommendations will carry placeholder metadata");
            Ok(BookCatalog::new())
        },
        _ => Err(cfreco::RecoError::MalformedInput(
            "the catalog needs all of --book-id-map, --book-works and --isbn".to_string())),
    }
}

fn recommend(
    interactions_path: &str,
    query_path: &str,
    n: usize,
    matches: &Matches,
) -> RecoResult<()> {

    info!("Reading interactions from {}", interactions_path);
    let interactions = io::read_interactions(interactions_path)?;

    let catalog = load_catalog(matches)?;
    let recommender = Recommender::new(&interactions)?;

    let new_user_ratings = io::read_query_file(query_path)?;

    eprintln!("Books you have rated:");
    for (item_id, rating) in new_user_ratings.iter() {
        let metadata = catalog.describe(*item_id);
        eprintln!("ISBN: {}, Title: {}, Rating: {}", metadata.external_code, metadata.title, rating);
    }

    let recommendations = recommender.recommend(&new_user_ratings, n, &catalog)?;

    info!("Writing {} recommendations", recommendations.len());
    io::write_recommendations(&recommendations, matches.opt_str("o"))?;

    Ok(())
}
