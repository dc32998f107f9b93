use serde::{Deserialize, Serialize};

/// A single rating event from the interactions CSV
///
/// Extra columns in the input (e.g. a timestamp) are ignored during
/// deserialization; only the three fields below are required.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    /// Raw user id as it appears in the input data
    #[serde(rename = "userId")]
    pub user_id: u32,
    /// Raw movie id as it appears in the input data
    #[serde(rename = "movieId")]
    pub movie_id: u32,
    /// Rating value (e.g. 0.5 to 5.0 on the MovieLens scale)
    pub rating: f64,
}
