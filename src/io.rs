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

use std::fs::File;
use std::io::prelude::*;
use std::io::stdout;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::Value;

use crate::error::{RecoError, RecoResult};
use crate::recommend::Recommendation;
use crate::types::Interaction;

/// Reads a CSV input file. We expect a header line and comma separated fields.
pub fn csv_reader(file: &str) -> Result<csv::Reader<File>, csv::Error> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .from_path(file)
}

/// Deserializes every record of a CSV file, fields are matched by header name.
pub fn read_records<T: DeserializeOwned>(file: &str) -> RecoResult<Vec<T>> {
    let mut reader = csv_reader(file)?;
    let mut records = Vec::new();

    for record in reader.deserialize() {
        records.push(record?);
    }

    Ok(records)
}

/// Reads the historical interactions, one `user_id,book_id,rating` triple per line.
pub fn read_interactions(file: &str) -> RecoResult<Vec<Interaction>> {
    read_records(file)
}

/// A single rating in a recommendation request.
#[derive(Deserialize, Debug)]
struct RatingTriple {
    user_id: u64,
    #[serde(alias = "book_id")]
    item_id: u64,
    rating: f64,
}

/// Parses a recommendation request, either `{"user_ratings": [...]}` or a bare list of
/// `{user_id, book_id, rating}` objects which all belong to the same user.
pub fn read_query<R: Read>(reader: R) -> RecoResult<Vec<(u64, f64)>> {

    let request: Value = serde_json::from_reader(reader)
        .map_err(|failure| RecoError::MalformedInput(failure.to_string()))?;

    let user_ratings = match request {
        Value::Object(mut fields) => fields.remove("user_ratings")
            .ok_or_else(|| RecoError::MalformedInput("missing field `user_ratings`".to_string()))?,
        list @ Value::Array(_) => list,
        _ => return Err(RecoError::MalformedInput(
            "expected a list of ratings or an object with `user_ratings`".to_string())),
    };

    let triples: Vec<RatingTriple> = serde_json::from_value(user_ratings)
        .map_err(|failure| RecoError::MalformedInput(failure.to_string()))?;

    if let Some(first) = triples.first() {
        if let Some(other) = triples.iter().find(|triple| triple.user_id != first.user_id) {
            return Err(RecoError::MalformedInput(format!(
                "ratings of more than one user in a single request ({} and {})",
                first.user_id, other.user_id)));
        }
    }

    Ok(triples.into_iter().map(|triple| (triple.item_id, triple.rating)).collect())
}

pub fn read_query_file(file: &str) -> RecoResult<Vec<(u64, f64)>> {
    read_query(File::open(&Path::new(file))?)
}

/// Output the recommendations as a JSON list. If a `recommendations_path` is supplied, we write
/// to a file at the specified path, otherwise, we output to stdout.
pub fn write_recommendations(
    recommendations: &[Recommendation],
    recommendations_path: Option<String>,
) -> RecoResult<()> {

    let mut out: Box<dyn Write> = match recommendations_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout())
    };

    serde_json::to_writer_pretty(&mut out, recommendations)?;
    writeln!(out)?;

    Ok(())
}
