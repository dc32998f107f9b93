use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::Movie;
use crate::recommend::ModelContext;

/// A single recommended catalog row
///
/// `predicted_score` is present only for collaborative results; genre and
/// popularity fallbacks carry no score.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub movie: Movie,
    pub predicted_score: Option<f64>,
}

/// Scores movies against the loaded model
pub struct Recommender<'a> {
    model: &'a ModelContext,
}

impl<'a> Recommender<'a> {
    pub fn new(model: &'a ModelContext) -> Self {
        Self { model }
    }

    /// Collaborative recommendations for a known user
    ///
    /// Unknown users get an empty result, which the caller treats as a
    /// signal to fall back, not as an error. Scores every movie in the
    /// model as the dot product of the user's factor row with the movie's
    /// component column, then keeps the top `top_n` in descending order
    /// with ties going to the lower movie index.
    pub fn recommend_by_user(&self, user_id: u32, top_n: usize) -> Vec<Recommendation> {
        let Some(user_row) = self.model.user_index.index_of(user_id) else {
            return Vec::new();
        };

        let rank = self.model.rank();
        let n_movies = self.model.movie_index.len();
        let mut scores: Vec<(usize, f64)> = Vec::with_capacity(n_movies);
        for col in 0..n_movies {
            let mut score = 0.0;
            for k in 0..rank {
                score += self.model.user_factors[(user_row, k)]
                    * self.model.item_components[(k, col)];
            }
            scores.push((col, score));
        }

        // Stable descending sort keeps the lower movie index on ties.
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scores.truncate(top_n);

        let mut results = Vec::with_capacity(scores.len());
        let mut missing = 0usize;
        for (col, score) in scores {
            let movie = self
                .model
                .movie_index
                .id_at(col)
                .and_then(|id| self.model.movie_by_id(id));
            match movie {
                Some(movie) => results.push(Recommendation {
                    movie: movie.clone(),
                    predicted_score: Some(score),
                }),
                None => missing += 1,
            }
        }
        if missing > 0 {
            tracing::warn!(missing, "Scored movies absent from the catalog were skipped");
        }
        results
    }

    /// Content-based recommendations over the genre feature table
    ///
    /// Requested genre names are lowercased and matched against the
    /// vocabulary exactly; names that match nothing are dropped, and if
    /// none survive the result is empty. Movies are ranked by the sum of
    /// their counts over the selected columns, zero-score movies are
    /// excluded, and the selected rows come back in catalog order (the
    /// ranking picks the rows but does not order the output).
    pub fn recommend_by_genre(&self, genres: &[String], top_n: usize) -> Vec<Recommendation> {
        let features = &self.model.genre_features;
        let columns: Vec<usize> = genres
            .iter()
            .filter_map(|g| features.column_of(&g.to_lowercase()))
            .collect();
        if columns.is_empty() {
            return Vec::new();
        }

        let mut scores: Vec<(usize, u32)> = Vec::with_capacity(features.n_movies());
        for row in 0..features.n_movies() {
            let counts = features.counts_row(row);
            let score: u32 = columns.iter().map(|&col| counts[col]).sum();
            scores.push((row, score));
        }
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        let selected: HashSet<u32> = scores
            .iter()
            .filter(|(_, score)| *score > 0)
            .take(top_n)
            .filter_map(|(row, _)| features.movie_ids().get(*row).copied())
            .collect();

        self.model
            .catalog
            .iter()
            .filter(|movie| selected.contains(&movie.movie_id))
            .map(|movie| Recommendation {
                movie: movie.clone(),
                predicted_score: None,
            })
            .collect()
    }

    /// Head of the catalog in storage order
    ///
    /// Stands in for a popularity ranking; the catalog carries no
    /// popularity signal, so the first rows serve as the cold-start
    /// default.
    pub fn popular_head(&self, top_n: usize) -> Vec<Recommendation> {
        self.model
            .catalog
            .iter()
            .take(top_n)
            .map(|movie| Recommendation {
                movie: movie.clone(),
                predicted_score: None,
            })
            .collect()
    }
}
