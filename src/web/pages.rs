// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

use crate::html::escape;
use engine::{BookDetail, RatedBook};

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto}\
table{border-collapse:collapse;width:100%}td,th{border-bottom:1px solid #ddd;padding:.4rem;text-align:left}\
.review{border-bottom:1px solid #eee;padding:.5rem 0}.error{color:#b00}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        STYLE,
        body
    )
}

pub fn average_label(average: Option<f64>) -> String {
    match average {
        Some(average) => format!("{:.2}", average),
        None => "No ratings".into(),
    }
}

pub fn index(books: &[RatedBook]) -> String {
    let mut rows = String::new();
    for rated in books {
        rows.push_str(&format!(
            "<tr><td><a href=\"/books/{id}\">{title}</a></td><td>{author}</td><td>{average}</td></tr>\n",
            id = rated.book.id,
            title = escape(&rated.book.title),
            author = escape(&rated.book.author),
            average = average_label(rated.average),
        ));
    }

    let body = format!(
        "<h1>Books</h1>\n<table>\n<tr><th>Title</th><th>Author</th><th>Average rating</th></tr>\n{}</table>",
        rows
    );

    layout("Books", &body)
}

pub fn book_detail(detail: &BookDetail) -> String {
    let book = &detail.book;

    let mut reviews = String::new();
    for review in &detail.reviews {
        reviews.push_str(&format!(
            "<div class=\"review\"><strong>{rating}/5</strong> <small>{date}</small><p>{text}</p></div>\n",
            rating = review.rating,
            date = review.created_at.format("%Y-%m-%d"),
            text = escape(review.review_text.as_deref().unwrap_or_default()),
        ));
    }

    if reviews.is_empty() {
        reviews.push_str("<p>No reviews yet.</p>\n");
    }

    let body = format!(
        r#"<p><a href="/">&larr; All books</a></p>
<h1>{title}</h1>
<p>Author: {author}</p>
<p>Average rating: {average}</p>
<h2>Reviews</h2>
{reviews}
<h2>Leave a review</h2>
<form id="review">
<label>Rating (1-5) <input name="rating" type="number" min="1" max="5" required></label><br>
<textarea name="review_text" rows="4" cols="50"></textarea><br>
<button type="submit">Send</button>
<p class="error" id="review-error"></p>
</form>
<script>
document.getElementById("review").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const form = new FormData(event.target);
  const response = await fetch("/books/{id}/review", {{
    method: "POST",
    headers: {{"Content-Type": "application/json"}},
    body: JSON.stringify({{rating: form.get("rating"), review_text: form.get("review_text")}}),
  }});
  if (response.ok) {{
    location.reload();
  }} else {{
    const payload = await response.json();
    document.getElementById("review-error").textContent = payload.error;
  }}
}});
</script>"#,
        id = book.id,
        title = escape(&book.title),
        author = escape(&book.author),
        average = average_label(detail.average),
        reviews = reviews,
    );

    layout(&book.title, &body)
}

pub fn not_found() -> String {
    layout("Not found", "<h1>Page not found</h1>\n<p><a href=\"/\">Back to the books</a></p>")
}

pub fn internal_error() -> String {
    layout("Error", "<h1>Internal server error</h1>")
}
