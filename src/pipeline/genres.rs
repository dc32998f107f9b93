use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::Movie;

/// Bag-of-words genre counts over the movie catalog
///
/// One row per catalog movie in catalog order, one column per vocabulary
/// token in alphabetical order. Values count how often a token occurs in
/// the movie's genre string (in practice 0 or 1).
#[derive(Debug, Clone, PartialEq)]
pub struct GenreFeatures {
    vocabulary: Vec<String>,
    movie_ids: Vec<u32>,
    counts: Vec<u32>,
}

impl GenreFeatures {
    /// Learns the vocabulary from the catalog and counts token occurrences
    ///
    /// Tokens are lowercased alphanumeric-or-underscore runs of at least
    /// two characters, so "Sci-Fi" contributes "sci" and "fi" and the
    /// pipe delimiter never reaches the vocabulary. When the vocabulary
    /// exceeds `max_features`, the most frequent tokens are kept (count
    /// descending, token ascending on ties).
    pub fn fit(movies: &[Movie], max_features: usize) -> Self {
        let tokenized: Vec<Vec<String>> = movies
            .iter()
            .map(|m| m.genre_list().flat_map(tokenize).collect())
            .collect();

        // 1. Count term frequency across the whole catalog
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        for tokens in &tokenized {
            for token in tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
            }
        }

        // 2. Cap the vocabulary, then fix the column order alphabetically
        let mut by_freq: Vec<(String, usize)> = term_freq.into_iter().collect();
        by_freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        by_freq.truncate(max_features);
        let mut vocabulary: Vec<String> = by_freq.into_iter().map(|(token, _)| token).collect();
        vocabulary.sort();

        let column: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(idx, token)| (token.as_str(), idx))
            .collect();

        // 3. Fill the count matrix row by row in catalog order
        let width = vocabulary.len();
        let mut counts = vec![0u32; movies.len() * width];
        for (row, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = column.get(token.as_str()) {
                    counts[row * width + col] += 1;
                }
            }
        }

        GenreFeatures {
            vocabulary,
            movie_ids: movies.iter().map(|m| m.movie_id).collect(),
            counts,
        }
    }

    /// Rebuilds the table from persisted parts, validating the shape
    pub fn from_parts(
        vocabulary: Vec<String>,
        movie_ids: Vec<u32>,
        counts: Vec<u32>,
    ) -> AppResult<Self> {
        if counts.len() != vocabulary.len() * movie_ids.len() {
            return Err(AppError::Data(format!(
                "genre feature table shape mismatch: {} counts for {} movies x {} tokens",
                counts.len(),
                movie_ids.len(),
                vocabulary.len()
            )));
        }
        Ok(GenreFeatures {
            vocabulary,
            movie_ids,
            counts,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn movie_ids(&self) -> &[u32] {
        &self.movie_ids
    }

    pub fn n_movies(&self) -> usize {
        self.movie_ids.len()
    }

    /// Column position of a vocabulary token, if present
    pub fn column_of(&self, token: &str) -> Option<usize> {
        self.vocabulary.binary_search_by(|t| t.as_str().cmp(token)).ok()
    }

    /// Count row for the movie at `row` in catalog order
    pub fn counts_row(&self, row: usize) -> &[u32] {
        let width = self.vocabulary.len();
        &self.counts[row * width..(row + 1) * width]
    }
}

/// Lowercases and extracts alphanumeric-or-underscore runs of length >= 2
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().take(2).count() == 2)
        .map(str::to_string)
        .collect()
}
