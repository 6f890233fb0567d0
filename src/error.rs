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

use thiserror::Error;

pub type RecoResult<T> = Result<T, RecoError>;

#[derive(Error, Debug)]
pub enum RecoError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Duplicate rating for user {user_id} and item {item_id}")]
    DuplicateInteraction { user_id: u64, item_id: u64 },

    #[error("Invalid evaluation setup: {0}")]
    InvalidEvaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecoError {

    /// Whether the caller sent something we cannot work with, as opposed to us failing to read
    /// or write our own data.
    pub fn is_client_error(&self) -> bool {
        match self {
            RecoError::MalformedInput(_)
            | RecoError::DuplicateInteraction { .. }
            | RecoError::InvalidEvaluation(_) => true,
            RecoError::Io(_) | RecoError::Csv(_) | RecoError::Serialization(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::RecoError;

    #[test]
    fn client_and_system_errors_are_distinguished() {
        assert!(RecoError::MalformedInput("missing rating".to_string()).is_client_error());
        assert!(RecoError::DuplicateInteraction { user_id: 1, item_id: 2 }.is_client_error());
        assert!(RecoError::InvalidEvaluation("no test rows".to_string()).is_client_error());

        let unreadable = std::io::Error::new(std::io::ErrorKind::NotFound, "interactions.csv");
        assert!(!RecoError::from(unreadable).is_client_error());
    }

    #[test]
    fn duplicate_message_names_the_pair() {
        let error = RecoError::DuplicateInteraction { user_id: 7, item_id: 300 };
        assert_eq!(error.to_string(), "Duplicate rating for user 7 and item 300");
    }
}
