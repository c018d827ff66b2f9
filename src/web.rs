// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

//! HTTP front end.
//!
//! Endpoints:
//!   GET  /                  → books with their average rating (HTML)
//!   GET  /books/:id         → book detail with its reviews (HTML)
//!   POST /books/:id/review  → add a review, JSON body `{rating, review_text}`

pub mod pages;

use anyhow::Error;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use controller::Controller;
use engine::{parse_rating, Engine, ErrorKind, Failure};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub review_text: Option<String>,
}

pub fn router<C>(engine: Arc<Engine<C>>) -> Router
where
    C: Controller + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(index::<C>))
        .route("/books/:id", get(book_detail::<C>))
        .route("/books/:id/review", post(add_review::<C>))
        .fallback(not_found)
        .with_state(engine)
}

pub async fn serve<C>(engine: Arc<Engine<C>>, bind: &str) -> Result<(), Error>
where
    C: Controller + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Couldn't listen for ctrl-c: {}", e);
    }
}

// Storage calls block, keep them off the async workers
async fn blocking<C, T, F>(engine: &Arc<Engine<C>>, f: F) -> Result<T, Error>
where
    C: Controller + Send + Sync + 'static,
    T: Send + 'static,
    F: FnOnce(&Engine<C>) -> Result<T, Error> + Send + 'static,
{
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || f(&engine)).await?
}

/// Accepts a JSON integer, an integral float or a string holding an integer
pub fn rating_from_json(value: Option<&Value>) -> Result<i64, ErrorKind> {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|float| float.fract() == 0.0)
                    .map(|float| float as i64)
            })
            .ok_or_else(|| ErrorKind::RatingNotANumber(number.to_string())),
        Some(Value::String(raw)) => parse_rating(raw),
        other => Err(ErrorKind::RatingNotANumber(
            other.map(Value::to_string).unwrap_or_default(),
        )),
    }
}

fn page_not_found(path: &str) -> Response {
    log::warn!("404 - Page not found: {}", path);
    (StatusCode::NOT_FOUND, Html(pages::not_found())).into_response()
}

fn page_error(e: Error, uri: &Uri, doing: &str) -> Response {
    match Failure::of(&e) {
        Failure::NotFound(_) => page_not_found(uri.path()),
        _ => {
            log::error!("Error while {}: {:?}", doing, e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(pages::internal_error())).into_response()
        }
    }
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn not_found(uri: Uri) -> Response {
    page_not_found(uri.path())
}

async fn index<C>(State(engine): State<Arc<Engine<C>>>, uri: Uri) -> Response
where
    C: Controller + Send + Sync + 'static,
{
    match blocking(&engine, |engine| engine.books_with_average()).await {
        Ok(books) => Html(pages::index(&books)).into_response(),
        Err(e) => page_error(e, &uri, "loading the list of books"),
    }
}

async fn book_detail<C>(
    State(engine): State<Arc<Engine<C>>>,
    Path(id): Path<String>,
    uri: Uri,
) -> Response
where
    C: Controller + Send + Sync + 'static,
{
    let id: i32 = match id.parse() {
        Ok(id) => id,
        Err(_) => return page_not_found(uri.path()),
    };

    match blocking(&engine, move |engine| engine.book_detail(id)).await {
        Ok(detail) => Html(pages::book_detail(&detail)).into_response(),
        Err(e) => page_error(e, &uri, &format!("loading book({})", id)),
    }
}

async fn add_review<C>(
    State(engine): State<Arc<Engine<C>>>,
    Path(id): Path<String>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> Response
where
    C: Controller + Send + Sync + 'static,
{
    let book_id: i32 = match id.parse() {
        Ok(id) => id,
        Err(_) => return json_error(StatusCode::NOT_FOUND, "Book not found"),
    };

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            log::warn!("Invalid review body for book({}): {}", book_id, rejection);
            return json_error(StatusCode::BAD_REQUEST, "Request body must be a JSON object");
        }
    };

    let rating = match rating_from_json(request.rating.as_ref()) {
        Ok(rating) => rating,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let review_text = request.review_text;
    let added = blocking(&engine, move |engine| {
        engine.add_review(book_id, rating, review_text)
    })
    .await;

    match added {
        Ok(review) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Review added",
                "review": {
                    "id": review.id,
                    "book_id": review.book_id,
                    "rating": review.rating,
                    "review_text": review.review_text,
                    "created_at": review.created_at.format("%Y-%m-%d").to_string(),
                }
            })),
        )
            .into_response(),

        Err(e) => match Failure::of(&e) {
            Failure::Validation(message) => json_error(StatusCode::BAD_REQUEST, &message),
            Failure::NotFound(_) => json_error(StatusCode::NOT_FOUND, "Book not found"),
            Failure::Internal => {
                log::error!("Error while adding a review for book({}): {:?}", book_id, e);
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        },
    }
}
