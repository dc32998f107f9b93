use crate::recommend::{ModelContext, RecommendationOutcome};

const STYLE: &str = "<style>\n\
    body { font-family: sans-serif; margin: 2rem auto; max-width: 48rem; }\n\
    form { margin-bottom: 1rem; }\n\
    label { display: block; margin-top: 0.5rem; }\n\
    input { width: 100%; max-width: 24rem; }\n\
    button { margin-top: 0.75rem; }\n\
    .hint { color: #666; font-size: 0.9rem; }\n\
    .message { background: #fff3cd; padding: 0.5rem; }\n\
    table { border-collapse: collapse; width: 100%; }\n\
    th, td { border: 1px solid #ccc; padding: 0.3rem 0.5rem; text-align: left; }\n\
    </style>\n";

/// Renders the single recommendation page
///
/// With no outcome the page is just the empty form (the GET view); with
/// an outcome it also shows the fallback message and the result table.
/// The predicted rating column only appears for collaborative results.
pub fn render(model: &ModelContext, outcome: Option<&RecommendationOutcome>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Movie Recommendations</title>\n");
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n<h1>Movie Recommendations</h1>\n");

    html.push_str(
        "<form method=\"post\" action=\"/\">\n\
         <label for=\"user_id\">User ID</label>\n\
         <input type=\"text\" id=\"user_id\" name=\"user_id\">\n\
         <label for=\"genres\">Genres (comma-separated)</label>\n\
         <input type=\"text\" id=\"genres\" name=\"genres\">\n\
         <button type=\"submit\">Recommend</button>\n\
         </form>\n",
    );

    let vocabulary = model.genre_features.vocabulary();
    if !vocabulary.is_empty() {
        html.push_str(&format!(
            "<p class=\"hint\">Known genres: {}</p>\n",
            escape(&vocabulary.join(", "))
        ));
    }

    if let Some(outcome) = outcome {
        if !outcome.message.is_empty() {
            html.push_str(&format!(
                "<p class=\"message\">{}</p>\n",
                escape(&outcome.message)
            ));
        }
        if !outcome.recommendations.is_empty() {
            let show_scores = outcome
                .recommendations
                .iter()
                .any(|r| r.predicted_score.is_some());
            html.push_str("<table>\n<tr><th>Movie ID</th><th>Title</th><th>Genres</th>");
            if show_scores {
                html.push_str("<th>Predicted rating</th>");
            }
            html.push_str("</tr>\n");
            for rec in &outcome.recommendations {
                html.push_str(&format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td>",
                    rec.movie.movie_id,
                    escape(&rec.movie.title),
                    escape(&rec.movie.genres)
                ));
                if show_scores {
                    match rec.predicted_score {
                        Some(score) => html.push_str(&format!("<td>{:.3}</td>", score)),
                        None => html.push_str("<td></td>"),
                    }
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</table>\n");
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Escapes text for embedding in HTML element content and attributes
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
