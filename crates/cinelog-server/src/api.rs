//! HTTP API: router, request/response types, and handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{Method, StatusCode},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use cinelog_store::{
    Actor, Database, Genre, Movie, MovieChanges, MovieWithRating, Review, StoreError, User,
};

use crate::auth::require_auth;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath};
use crate::password;
use crate::token::{Claims, TokenService, TOKEN_SCHEME};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub tokens: Arc<TokenService>,
}

/// Build the application router.
///
/// Gating map: movie/review creation and listing require a token; the
/// per-id movie routes (get, update, delete) do not.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let gated = Router::new()
        .route("/movies", post(create_movie).get(list_movies))
        .route("/reviews", post(create_review).get(list_reviews))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route(
            "/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .merge(gated)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SignupRequest {
    username: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct SigninRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct SignupResponse {
    success: bool,
    msg: &'static str,
}

#[derive(Serialize)]
struct SigninResponse {
    success: bool,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMovieRequest {
    title: Option<String>,
    release_date: Option<i32>,
    genre: Option<String>,
    actors: Option<Vec<Actor>>,
    image_url: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UpdateMovieRequest {
    title: Option<String>,
    release_date: Option<i32>,
    genre: Option<String>,
    actors: Option<Vec<Actor>>,
    /// An absent field keeps the stored URL; an explicit `null` clears it.
    #[serde(default, deserialize_with = "double_option")]
    image_url: Option<Option<String>>,
}

/// Deserialize a field where absence and JSON `null` mean different
/// things: absent stays `None`, `null` becomes `Some(None)`.
fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize)]
struct ListMoviesQuery {
    reviews: Option<String>,
}

#[derive(Serialize)]
struct MovieResponse {
    success: bool,
    message: &'static str,
    movie: Movie,
}

#[derive(Serialize)]
struct GetMovieResponse {
    success: bool,
    movie: Movie,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MovieListing {
    Plain(Vec<Movie>),
    WithRatings(Vec<MovieWithRating>),
}

#[derive(Serialize)]
struct MoviesResponse {
    success: bool,
    movies: MovieListing,
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateReviewRequest {
    movie_id: Option<Uuid>,
    username: Option<String>,
    review: Option<String>,
    rating: Option<i32>,
}

#[derive(Serialize)]
struct ReviewResponse {
    success: bool,
    message: &'static str,
    review: Review,
}

#[derive(Serialize)]
struct ReviewsResponse {
    success: bool,
    reviews: Vec<Review>,
}

// ---------------------------------------------------------------------------
// Auth handlers
// ---------------------------------------------------------------------------

async fn signup(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let (username, password) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::MissingCredentials),
    };

    let user = User {
        id: Uuid::new_v4(),
        name: req.name,
        username,
        password_hash: password::hash_password(&password),
        created_at: Utc::now(),
    };

    state.db.lock().await.create_user(&user).map_err(|e| match e {
        StoreError::DuplicateUsername => ApiError::DuplicateUser,
        other => ApiError::internal("Failed to create user.", other),
    })?;

    info!(username = %user.username, "new user signed up");
    Ok(Json(SignupResponse {
        success: true,
        msg: "Successfully created new user.",
    }))
}

async fn signin(
    State(state): State<AppState>,
    AppJson(req): AppJson<SigninRequest>,
) -> Result<Json<SigninResponse>, ApiError> {
    let user = state
        .db
        .lock()
        .await
        .find_user_by_username(&req.username)
        .map_err(|e| ApiError::internal("Failed to look up user.", e))?
        // Unknown usernames fail the same way as wrong passwords.
        .ok_or(ApiError::AuthenticationFailed)?;

    if !password::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::AuthenticationFailed);
    }

    let token = state.tokens.issue(&Claims {
        id: user.id,
        username: user.username.clone(),
    });

    info!(username = %user.username, "user signed in");
    Ok(Json(SigninResponse {
        success: true,
        token: format!("{TOKEN_SCHEME} {token}"),
    }))
}

// ---------------------------------------------------------------------------
// Movie handlers
// ---------------------------------------------------------------------------

async fn create_movie(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateMovieRequest>,
) -> Result<(StatusCode, Json<MovieResponse>), ApiError> {
    let (Some(title), Some(release_date), Some(genre), Some(actors)) =
        (req.title, req.release_date, req.genre, req.actors)
    else {
        return Err(ApiError::Validation("Missing required fields.".into()));
    };

    let genre = parse_genre(&genre)?;
    validate_release_year(release_date)?;

    let movie = Movie {
        id: Uuid::new_v4(),
        title,
        release_date,
        genre,
        actors,
        image_url: req.image_url,
        created_at: Utc::now(),
    };

    state
        .db
        .lock()
        .await
        .create_movie(&movie)
        .map_err(|e| ApiError::internal("Failed to create movie.", e))?;

    info!(id = %movie.id, title = %movie.title, "movie created");
    Ok((
        StatusCode::CREATED,
        Json(MovieResponse {
            success: true,
            message: "Movie created successfully.",
            movie,
        }),
    ))
}

async fn get_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<GetMovieResponse>, ApiError> {
    let movie = state.db.lock().await.get_movie(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("Movie not found."),
        other => ApiError::internal("Failed to retrieve movie.", other),
    })?;

    Ok(Json(GetMovieResponse {
        success: true,
        movie,
    }))
}

async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListMoviesQuery>,
) -> Result<Json<MoviesResponse>, ApiError> {
    let db = state.db.lock().await;

    // With ?reviews=true each movie carries the mean of its review
    // ratings and the list is sorted by descending mean; otherwise the
    // plain unfiltered list is returned.
    let movies = if query.reviews.as_deref() == Some("true") {
        let listed = db
            .list_movies_with_ratings()
            .map_err(|e| ApiError::internal("Failed to retrieve movies.", e))?;
        MovieListing::WithRatings(listed)
    } else {
        let listed = db
            .list_movies()
            .map_err(|e| ApiError::internal("Failed to retrieve movies.", e))?;
        MovieListing::Plain(listed)
    };

    Ok(Json(MoviesResponse {
        success: true,
        movies,
    }))
}

async fn update_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<UpdateMovieRequest>,
) -> Result<Json<MovieResponse>, ApiError> {
    let genre = req.genre.as_deref().map(parse_genre).transpose()?;
    if let Some(year) = req.release_date {
        validate_release_year(year)?;
    }

    let changes = MovieChanges {
        title: req.title,
        release_date: req.release_date,
        genre,
        actors: req.actors,
        image_url: req.image_url,
    };

    let movie = state
        .db
        .lock()
        .await
        .update_movie(id, &changes)
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Movie not found."),
            other => ApiError::internal("Failed to update movie.", other),
        })?;

    info!(id = %movie.id, "movie updated");
    Ok(Json(MovieResponse {
        success: true,
        message: "Movie updated successfully.",
        movie,
    }))
}

async fn delete_movie(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .db
        .lock()
        .await
        .delete_movie(id)
        .map_err(|e| ApiError::internal("Failed to delete movie.", e))?;

    if !deleted {
        return Err(ApiError::NotFound("Movie not found."));
    }

    info!(%id, "movie deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Movie deleted successfully.",
    }))
}

// ---------------------------------------------------------------------------
// Review handlers
// ---------------------------------------------------------------------------

async fn create_review(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let (Some(movie_id), Some(username), Some(review_text), Some(rating)) =
        (req.movie_id, req.username, req.review, req.rating)
    else {
        return Err(ApiError::Validation("Missing required fields.".into()));
    };

    validate_rating(rating)?;

    // The movie id is a soft reference: existence is not checked.
    let review = Review {
        id: Uuid::new_v4(),
        movie_id,
        username,
        review: review_text,
        rating,
        created_at: Utc::now(),
    };

    state
        .db
        .lock()
        .await
        .create_review(&review)
        .map_err(|e| ApiError::internal("Failed to create review.", e))?;

    info!(id = %review.id, movie_id = %review.movie_id, rating, "review created");
    Ok((
        StatusCode::CREATED,
        Json(ReviewResponse {
            success: true,
            message: "Review created successfully.",
            review,
        }),
    ))
}

async fn list_reviews(
    State(state): State<AppState>,
) -> Result<Json<ReviewsResponse>, ApiError> {
    let reviews = state
        .db
        .lock()
        .await
        .list_reviews()
        .map_err(|e| ApiError::internal("Failed to retrieve reviews.", e))?;

    Ok(Json(ReviewsResponse {
        success: true,
        reviews,
    }))
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn parse_genre(raw: &str) -> Result<Genre, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::Validation(format!("Unknown genre: {raw}.")))
}

fn validate_release_year(year: i32) -> Result<(), ApiError> {
    if (1900..=2100).contains(&year) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Release year must lie between 1900 and 2100.".into(),
        ))
    }
}

fn validate_rating(rating: i32) -> Result<(), ApiError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Rating must be between 1 and 5.".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Serving
// ---------------------------------------------------------------------------

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("api.db")).unwrap();
        let state = AppState {
            db: Arc::new(Mutex::new(db)),
            tokens: Arc::new(TokenService::new(&[7u8; 32])),
        };
        (dir, state)
    }

    fn bearer(state: &AppState) -> String {
        let token = state.tokens.issue(&Claims {
            id: Uuid::new_v4(),
            username: "tester".into(),
        });
        format!("{TOKEN_SCHEME} {token}")
    }

    fn request(method: &str, uri: &str, body: Option<Value>, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        match body {
            Some(v) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn sample_movie_body() -> Value {
        json!({
            "title": "The Matrix",
            "releaseDate": 1999,
            "genre": "Science Fiction",
            "actors": [
                { "actorName": "Keanu Reeves", "characterName": "Neo" },
            ],
        })
    }

    #[tokio::test]
    async fn signup_then_signin_round_trip() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/signup",
                Some(json!({"username": "alice", "password": "hunter2", "name": "Alice"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["msg"], "Successfully created new user.");

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/signin",
                Some(json!({"username": "alice", "password": "hunter2"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let token = body["token"].as_str().unwrap();
        assert!(token.starts_with("JWT "));
    }

    #[tokio::test]
    async fn signin_token_opens_gated_routes() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        send(
            &app,
            request(
                "POST",
                "/signup",
                Some(json!({"username": "alice", "password": "hunter2"})),
                None,
            ),
        )
        .await;
        let (_, body) = send(
            &app,
            request(
                "POST",
                "/signin",
                Some(json!({"username": "alice", "password": "hunter2"})),
                None,
            ),
        )
        .await;
        let token = body["token"].as_str().unwrap().to_string();

        // The issued token, scheme prefix included, passes the gate.
        let (status, body) =
            send(&app, request("GET", "/movies", None, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let signup = || {
            request(
                "POST",
                "/signup",
                Some(json!({"username": "bob", "password": "pw"})),
                None,
            )
        };

        let (status, _) = send(&app, signup()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, signup()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "A user with that username already exists.");
    }

    #[tokio::test]
    async fn signup_without_password_is_rejected() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            request("POST", "/signup", Some(json!({"username": "carol"})), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["msg"],
            "Please include both username and password to signup."
        );
    }

    #[tokio::test]
    async fn wrong_password_yields_no_token() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        send(
            &app,
            request(
                "POST",
                "/signup",
                Some(json!({"username": "dave", "password": "right"})),
                None,
            ),
        )
        .await;

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/signin",
                Some(json!({"username": "dave", "password": "wrong"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["msg"], "Authentication failed.");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn unknown_username_yields_authentication_failure() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/signin",
                Some(json!({"username": "nobody", "password": "pw"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn gated_route_without_header_never_runs_handler() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let (status, body) = send(
            &app,
            request("POST", "/movies", Some(sample_movie_body()), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["msg"], "No token provided.");

        // Nothing was persisted.
        let (_, body) = send(&app, request("GET", "/movies", None, Some(&auth))).await;
        assert_eq!(body["movies"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn bad_token_fails_verification() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        for auth in ["JWT garbage", "schemeless-token"] {
            let (status, body) =
                send(&app, request("GET", "/movies", None, Some(auth))).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["msg"], "Failed to authenticate token.");
        }
    }

    #[tokio::test]
    async fn create_movie_with_missing_field_persists_nothing() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let mut body = sample_movie_body();
        body.as_object_mut().unwrap().remove("genre");

        let (status, response) =
            send(&app, request("POST", "/movies", Some(body), Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["success"], false);
        assert_eq!(response["message"], "Missing required fields.");

        let (_, listed) = send(&app, request("GET", "/movies", None, Some(&auth))).await;
        assert_eq!(listed["movies"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn create_movie_validates_genre_and_year() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let mut body = sample_movie_body();
        body["genre"] = json!("Musical");
        let (status, _) =
            send(&app, request("POST", "/movies", Some(body), Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut body = sample_movie_body();
        body["releaseDate"] = json!(1850);
        let (status, _) =
            send(&app, request("POST", "/movies", Some(body), Some(&auth))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn movie_crud_round_trip() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let (status, created) = send(
            &app,
            request("POST", "/movies", Some(sample_movie_body()), Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["movie"]["id"].as_str().unwrap().to_string();

        // Read back by id (ungated route).
        let (status, fetched) =
            send(&app, request("GET", &format!("/movies/{id}"), None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["movie"]["title"], "The Matrix");
        assert_eq!(fetched["movie"]["releaseDate"], 1999);
        assert_eq!(fetched["movie"]["genre"], "Science Fiction");
        assert_eq!(fetched["movie"]["actors"], created["movie"]["actors"]);

        // Partial update (ungated route).
        let (status, updated) = send(
            &app,
            request(
                "PUT",
                &format!("/movies/{id}"),
                Some(json!({"title": "The Matrix Reloaded"})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["movie"]["title"], "The Matrix Reloaded");
        assert_eq!(updated["movie"]["releaseDate"], 1999);

        // Delete succeeds once, then the id is gone.
        let (status, body) =
            send(&app, request("DELETE", &format!("/movies/{id}"), None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Movie deleted successfully.");

        let (status, body) =
            send(&app, request("DELETE", &format!("/movies/{id}"), None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie not found.");
    }

    #[tokio::test]
    async fn extractor_failures_carry_the_envelope() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        // Malformed JSON body.
        let req = Request::builder()
            .method("POST")
            .uri("/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["message"].is_string());

        // Missing content type.
        let req = Request::builder()
            .method("POST")
            .uri("/signup")
            .body(Body::from(r#"{"username":"a","password":"b"}"#))
            .unwrap();
        let (_, body) = send(&app, req).await;
        assert_eq!(body["success"], false);

        // Non-UUID path segment.
        let (status, body) =
            send(&app, request("GET", "/movies/not-a-uuid", None, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn update_clears_image_url_on_explicit_null() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let mut body = sample_movie_body();
        body["imageUrl"] = json!("https://example.com/poster.jpg");
        let (_, created) =
            send(&app, request("POST", "/movies", Some(body), Some(&auth))).await;
        let id = created["movie"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["movie"]["imageUrl"], "https://example.com/poster.jpg");

        // Omitting the field keeps the stored URL.
        let (_, updated) = send(
            &app,
            request(
                "PUT",
                &format!("/movies/{id}"),
                Some(json!({"title": "Renamed"})),
                None,
            ),
        )
        .await;
        assert_eq!(updated["movie"]["imageUrl"], "https://example.com/poster.jpg");

        // An explicit null clears it.
        let (status, updated) = send(
            &app,
            request(
                "PUT",
                &format!("/movies/{id}"),
                Some(json!({"imageUrl": null})),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(updated["movie"].get("imageUrl").is_none());
    }

    #[tokio::test]
    async fn get_unknown_movie_is_not_found() {
        let (_dir, state) = test_state();
        let app = build_router(state);

        let uri = format!("/movies/{}", Uuid::new_v4());
        let (status, body) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie not found.");
    }

    #[tokio::test]
    async fn listing_with_reviews_flag_aggregates_ratings() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        let (_, rated) = send(
            &app,
            request("POST", "/movies", Some(sample_movie_body()), Some(&auth)),
        )
        .await;
        let rated_id = rated["movie"]["id"].as_str().unwrap().to_string();

        let mut other = sample_movie_body();
        other["title"] = json!("Stalker");
        send(&app, request("POST", "/movies", Some(other), Some(&auth))).await;

        for rating in [3, 5] {
            let (status, _) = send(
                &app,
                request(
                    "POST",
                    "/reviews",
                    Some(json!({
                        "movieId": rated_id,
                        "username": "critic",
                        "review": "solid",
                        "rating": rating,
                    })),
                    Some(&auth),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(
            &app,
            request("GET", "/movies?reviews=true", None, Some(&auth)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let movies = body["movies"].as_array().unwrap();
        assert_eq!(movies.len(), 2);

        // Mean of {3, 5} is 4; the rated movie sorts first and the
        // unrated movie carries a null average, not zero.
        assert_eq!(movies[0]["id"], rated_id.as_str());
        assert_eq!(movies[0]["avgRating"], json!(4.0));
        assert!(movies[1]["avgRating"].is_null());
    }

    #[tokio::test]
    async fn listing_without_flag_returns_plain_list() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        send(
            &app,
            request("POST", "/movies", Some(sample_movie_body()), Some(&auth)),
        )
        .await;

        let (status, body) = send(&app, request("GET", "/movies", None, Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);

        let movies = body["movies"].as_array().unwrap();
        assert_eq!(movies.len(), 1);
        assert!(movies[0].get("avgRating").is_none());
    }

    #[tokio::test]
    async fn review_validation_and_listing() {
        let (_dir, state) = test_state();
        let auth = bearer(&state);
        let app = build_router(state);

        // Missing fields.
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/reviews",
                Some(json!({"username": "critic"})),
                Some(&auth),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields.");

        // Out-of-range rating.
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/reviews",
                Some(json!({
                    "movieId": Uuid::new_v4(),
                    "username": "critic",
                    "review": "off the charts",
                    "rating": 6,
                })),
                Some(&auth),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // A valid review referencing a nonexistent movie id is accepted
        // (soft reference).
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/reviews",
                Some(json!({
                    "movieId": Uuid::new_v4(),
                    "username": "critic",
                    "review": "fine",
                    "rating": 5,
                })),
                Some(&auth),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, request("GET", "/reviews", None, Some(&auth))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    }
}
