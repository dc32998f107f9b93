use serde::{Deserialize, Serialize};

/// A catalog entry from the movies CSV
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Raw movie id as it appears in the input data
    #[serde(rename = "movieId")]
    pub movie_id: u32,
    /// Display title, typically with a release year suffix
    pub title: String,
    /// Pipe-delimited genre string (e.g. "Action|Comedy")
    pub genres: String,
}

impl Movie {
    /// Iterates over the raw genre tokens of the pipe-delimited field
    pub fn genre_list(&self) -> impl Iterator<Item = &str> {
        self.genres.split('|').filter(|g| !g.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_quoted_title() {
        let data = "movieId,title,genres\n10,\"Heat, The (1995)\",Action|Crime|Thriller\n";
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let movies: Vec<Movie> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(movies[0].movie_id, 10);
        assert_eq!(movies[0].title, "Heat, The (1995)");
        assert_eq!(movies[0].genres, "Action|Crime|Thriller");
    }

    #[test]
    fn test_genre_list_splits_on_pipe() {
        let movie = Movie {
            movie_id: 1,
            title: "Toy Story (1995)".to_string(),
            genres: "Adventure|Animation|Children".to_string(),
        };
        let genres: Vec<&str> = movie.genre_list().collect();
        assert_eq!(genres, vec!["Adventure", "Animation", "Children"]);
    }

    #[test]
    fn test_genre_list_single_token() {
        let movie = Movie {
            movie_id: 2,
            title: "B".to_string(),
            genres: "Drama".to_string(),
        };
        assert_eq!(movie.genre_list().count(), 1);
    }
}
