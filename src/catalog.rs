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
use tracing::{info, warn};

use crate::error::RecoResult;
use crate::io;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_CODE: &str = "Unknown ISBN";

/// Display fields for an item, with sentinels in place of anything the catalog does not know.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemMetadata {
    pub title: String,
    pub external_code: String,
}

/// Looks up presentation metadata for internal item identifiers. A miss never fails a
/// recommendation, it only degrades the presentation fields.
pub trait Catalog {

    fn title(&self, item_id: u64) -> Option<&str>;

    fn external_code(&self, item_id: u64) -> Option<&str>;

    fn describe(&self, item_id: u64) -> ItemMetadata {
        let title = match self.title(item_id) {
            Some(title) => title.to_string(),
            None => {
                warn!("No title found for item {}", item_id);
                UNKNOWN_TITLE.to_string()
            }
        };

        let external_code = match self.external_code(item_id) {
            Some(code) => code.to_string(),
            None => {
                warn!("No external code found for item {}", item_id);
                UNKNOWN_CODE.to_string()
            }
        };

        ItemMetadata { title, external_code }
    }
}

#[derive(Deserialize, Debug)]
struct BookIdMapping {
    book_id_csv: u64,
    book_id: u64,
}

#[derive(Deserialize, Debug)]
struct BookWork {
    best_book_id: u64,
    original_title: Option<String>,
}

#[derive(Deserialize, Debug)]
struct BookIsbn {
    book_id: u64,
    isbn: Option<String>,
}

/// Book metadata. Internal item ids are mapped to the id of the best edition of a book, which
/// in turn keys the title and the ISBN.
#[derive(Default, Debug)]
pub struct BookCatalog {
    best_book_ids: FnvHashMap<u64, u64>,
    titles: FnvHashMap<u64, String>,
    isbns: FnvHashMap<u64, String>,
}

impl BookCatalog {

    pub fn new() -> Self {
        Default::default()
    }

    /// Reads the id mapping (`book_id_csv,book_id`), the works (`best_book_id,original_title`)
    /// and the ISBNs (`book_id,isbn`) once, lookups never touch the files again.
    pub fn from_csv_files(
        book_id_map_path: &str,
        book_works_path: &str,
        isbn_path: &str,
    ) -> RecoResult<Self> {

        let mut catalog = BookCatalog::new();

        for mapping in io::read_records::<BookIdMapping>(book_id_map_path)? {
            catalog.best_book_ids.insert(mapping.book_id_csv, mapping.book_id);
        }

        for work in io::read_records::<BookWork>(book_works_path)? {
            if let Some(title) = non_empty(work.original_title) {
                // The first work listed for a book wins
                catalog.titles.entry(work.best_book_id).or_insert(title);
            }
        }

        for book in io::read_records::<BookIsbn>(isbn_path)? {
            if let Some(isbn) = non_empty(book.isbn) {
                catalog.isbns.entry(book.book_id).or_insert(isbn);
            }
        }

        info!(
            "Loaded catalog with {} mapped items, {} titles and {} ISBNs",
            catalog.best_book_ids.len(),
            catalog.titles.len(),
            catalog.isbns.len(),
        );

        Ok(catalog)
    }

    pub fn insert(&mut self, item_id: u64, best_book_id: u64, title: Option<&str>, isbn: Option<&str>) {
        self.best_book_ids.insert(item_id, best_book_id);

        if let Some(title) = non_empty(title.map(String::from)) {
            self.titles.insert(best_book_id, title);
        }

        if let Some(isbn) = non_empty(isbn.map(String::from)) {
            self.isbns.insert(best_book_id, isbn);
        }
    }

    pub fn best_book_id(&self, item_id: u64) -> Option<u64> {
        self.best_book_ids.get(&item_id).cloned()
    }
}

impl Catalog for BookCatalog {

    fn title(&self, item_id: u64) -> Option<&str> {
        self.best_book_id(item_id)
            .and_then(|best_book_id| self.titles.get(&best_book_id))
            .map(|title| title.as_str())
    }

    fn external_code(&self, item_id: u64) -> Option<&str> {
        self.best_book_id(item_id)
            .and_then(|best_book_id| self.isbns.get(&best_book_id))
            .map(|isbn| isbn.as_str())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
