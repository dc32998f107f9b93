use crate::error::{AppError, AppResult};
use crate::recommend::{ModelContext, Recommendation, Recommender};

pub const MSG_USER_NOT_FOUND: &str =
    "User ID not found. Showing recommendations by genre instead.";
pub const MSG_INVALID_USER_ID: &str =
    "Invalid User ID. Showing recommendations by genre instead.";
pub const MSG_NO_GENRE_MATCHES: &str = "No matching movies found for the selected genres.";
pub const MSG_POPULAR_FALLBACK: &str = "Showing top popular movies.";

/// Which stage of the fallback chain produced the final result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    UserBased,
    GenreBased,
    PopularHead,
    NoMatch,
}

/// Final result of one recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<Recommendation>,
    /// Human-readable note about which fallback fired; empty when the
    /// first attempted stage succeeded
    pub message: String,
    pub stage: FallbackStage,
}

/// Parses the submitted user id field, which arrives as free-form text
fn parse_user_id(raw: &str) -> AppResult<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| AppError::InvalidInput(format!("User ID must be a number, got '{}'", raw)))
}

/// Runs the user -> genre -> catalog-head fallback chain for one request
///
/// The chain short-circuits at the first stage with a non-empty result.
/// A missing or invalid user id is recovered locally with a message, not
/// surfaced as an error. The genre stage only runs when the request
/// carried a genre string, and the catalog head only when it did not, so
/// a genre request that matches nothing yields an empty result with an
/// explanatory message rather than an unrelated popularity list.
pub fn recommend_with_fallback(
    model: &ModelContext,
    user_id: Option<&str>,
    genres: Option<&str>,
    top_n: usize,
) -> RecommendationOutcome {
    let recommender = Recommender::new(model);
    let mut recommendations = Vec::new();
    let mut message = String::new();
    let mut stage = FallbackStage::NoMatch;

    // 1. User stage, attempted only when a user id was submitted
    let user_raw = user_id.unwrap_or("");
    if !user_raw.is_empty() {
        match parse_user_id(user_raw) {
            Ok(uid) => {
                recommendations = recommender.recommend_by_user(uid, top_n);
                if recommendations.is_empty() {
                    tracing::debug!(user_id = uid, "User not in model, falling back");
                    message = MSG_USER_NOT_FOUND.to_string();
                } else {
                    stage = FallbackStage::UserBased;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected user id, falling back");
                message = MSG_INVALID_USER_ID.to_string();
            }
        }
    }

    // 2. Genre stage, attempted only when genres were submitted
    let genres_raw = genres.unwrap_or("");
    let genres_supplied = !genres_raw.is_empty();
    if recommendations.is_empty() && genres_supplied {
        let requested: Vec<String> = genres_raw
            .split(',')
            .map(|g| g.trim().to_string())
            .collect();
        recommendations = recommender.recommend_by_genre(&requested, top_n);
        if recommendations.is_empty() {
            message = MSG_NO_GENRE_MATCHES.to_string();
        } else {
            stage = FallbackStage::GenreBased;
        }
    }

    // 3. Catalog head, the cold-start default when no genres were given
    if recommendations.is_empty() && !genres_supplied {
        recommendations = recommender.popular_head(top_n);
        message = MSG_POPULAR_FALLBACK.to_string();
        stage = FallbackStage::PopularHead;
    }

    RecommendationOutcome {
        recommendations,
        message,
        stage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdIndex, Movie};
    use crate::pipeline::genres::GenreFeatures;
    use nalgebra::DMatrix;

    fn movie(movie_id: u32, title: &str, genres: &str) -> Movie {
        Movie {
            movie_id,
            title: title.to_string(),
            genres: genres.to_string(),
        }
    }

    /// Same shape as the engine fixture: user 1 prefers movie 30, user 2
    /// prefers movie 20.
    fn fixture_model() -> ModelContext {
        let catalog = vec![
            movie(10, "A", "Action|Comedy"),
            movie(20, "B", "Drama"),
            movie(30, "C", "Action|Sci-Fi"),
        ];
        let genre_features = GenreFeatures::fit(&catalog, 1000);
        ModelContext::new(
            DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]),
            DMatrix::from_row_slice(2, 3, &[1.0, 0.0, 2.0, 0.0, 3.0, 1.0]),
            IdIndex::from_first_occurrence(vec![1, 2]),
            IdIndex::from_first_occurrence(vec![10, 20, 30]),
            genre_features,
            catalog,
        )
        .unwrap()
    }

    #[test]
    fn test_known_user_short_circuits_the_chain() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some("1"), Some("Drama"), 10);
        assert_eq!(outcome.stage, FallbackStage::UserBased);
        assert_eq!(outcome.message, "");
        assert_eq!(outcome.recommendations[0].movie.movie_id, 30);
    }

    #[test]
    fn test_unknown_user_falls_back_to_genres() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some("999"), Some("Action"), 10);
        assert_eq!(outcome.stage, FallbackStage::GenreBased);
        assert_eq!(outcome.message, MSG_USER_NOT_FOUND);
        let ids: Vec<u32> = outcome
            .recommendations
            .iter()
            .map(|r| r.movie.movie_id)
            .collect();
        assert_eq!(ids, vec![10, 30]);
    }

    #[test]
    fn test_invalid_user_falls_back_to_genres() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some("abc"), Some("Action"), 10);
        assert_eq!(outcome.stage, FallbackStage::GenreBased);
        assert_eq!(outcome.message, MSG_INVALID_USER_ID);
        assert!(!outcome.recommendations.is_empty());
    }

    #[test]
    fn test_unknown_user_without_genres_shows_popular() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some("999"), None, 10);
        assert_eq!(outcome.stage, FallbackStage::PopularHead);
        assert_eq!(outcome.message, MSG_POPULAR_FALLBACK);
        assert_eq!(outcome.recommendations.len(), 3);
        assert_eq!(outcome.recommendations[0].movie.movie_id, 10);
    }

    #[test]
    fn test_empty_form_shows_popular() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some(""), Some(""), 10);
        assert_eq!(outcome.stage, FallbackStage::PopularHead);
        assert_eq!(outcome.message, MSG_POPULAR_FALLBACK);
    }

    #[test]
    fn test_unmatched_genres_do_not_reach_popular() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, None, Some("Romance"), 10);
        assert_eq!(outcome.stage, FallbackStage::NoMatch);
        assert_eq!(outcome.message, MSG_NO_GENRE_MATCHES);
        assert!(outcome.recommendations.is_empty());
    }

    #[test]
    fn test_whitespace_user_id_counts_as_invalid() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, Some("  "), Some("Action"), 10);
        assert_eq!(outcome.message, MSG_INVALID_USER_ID);
        assert_eq!(outcome.stage, FallbackStage::GenreBased);
    }

    #[test]
    fn test_parse_user_id_trims_whitespace() {
        assert_eq!(parse_user_id(" 42 ").unwrap(), 42);
        assert!(matches!(
            parse_user_id("abc"),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_genre_list_is_comma_separated_and_trimmed() {
        let model = fixture_model();
        let outcome = recommend_with_fallback(&model, None, Some("Action , Drama"), 10);
        assert_eq!(outcome.stage, FallbackStage::GenreBased);
        assert_eq!(outcome.message, "");
        let ids: Vec<u32> = outcome
            .recommendations
            .iter()
            .map(|r| r.movie.movie_id)
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_top_n_limits_every_stage() {
        let model = fixture_model();
        let popular = recommend_with_fallback(&model, None, None, 2);
        assert_eq!(popular.recommendations.len(), 2);

        let by_user = recommend_with_fallback(&model, Some("1"), None, 2);
        assert_eq!(by_user.recommendations.len(), 2);
    }
}
