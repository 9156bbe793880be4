//! Domain model structs persisted in the catalog database.
//!
//! Wire names follow the public API convention (camelCase), so these
//! structs serialize directly into response envelopes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. The password hash is never serialized to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Optional human-readable display name.
    pub name: Option<String>,
    /// Login name, globally unique.
    pub username: String,
    /// Salted password hash, `hex(salt)$hex(digest)`.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Movie
// ---------------------------------------------------------------------------

/// The fixed set of accepted movie genres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Mystery,
    Thriller,
    Western,
    #[serde(rename = "Science Fiction")]
    ScienceFiction,
}

impl Genre {
    /// Canonical string form, as stored in SQLite and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::Western => "Western",
            Genre::ScienceFiction => "Science Fiction",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Action" => Ok(Genre::Action),
            "Adventure" => Ok(Genre::Adventure),
            "Comedy" => Ok(Genre::Comedy),
            "Drama" => Ok(Genre::Drama),
            "Fantasy" => Ok(Genre::Fantasy),
            "Horror" => Ok(Genre::Horror),
            "Mystery" => Ok(Genre::Mystery),
            "Thriller" => Ok(Genre::Thriller),
            "Western" => Ok(Genre::Western),
            "Science Fiction" => Ok(Genre::ScienceFiction),
            other => Err(format!("unknown genre: {other}")),
        }
    }
}

/// An actor credit embedded in a movie record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_name: String,
    pub character_name: String,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Unique movie identifier.
    pub id: Uuid,
    /// Title, indexed for lookup.
    pub title: String,
    /// Release year, must lie in [1900, 2100].
    pub release_date: i32,
    /// One of the fixed genre set.
    pub genre: Genre,
    /// Ordered actor credits, stored as a JSON column.
    pub actors: Vec<Actor>,
    /// Optional poster URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

/// A movie joined with the mean rating over its reviews.
///
/// `avg_rating` is `None` for movies with no reviews; such movies sort
/// after every rated movie in the aggregation listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieWithRating {
    #[serde(flatten)]
    pub movie: Movie,
    pub avg_rating: Option<f64>,
}

/// A partial movie update. `None` fields keep their stored values.
///
/// `image_url` is doubly optional so an update can clear the URL
/// (`Some(None)`) as well as replace it (`Some(Some(url))`).
#[derive(Debug, Clone, Default)]
pub struct MovieChanges {
    pub title: Option<String>,
    pub release_date: Option<i32>,
    pub genre: Option<Genre>,
    pub actors: Option<Vec<Actor>>,
    pub image_url: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A rating record. `movie_id` is a soft reference: existence of the
/// referenced movie is not enforced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique review identifier.
    pub id: Uuid,
    /// The movie this review refers to.
    pub movie_id: Uuid,
    /// Reviewer name, free-form (not matched against users).
    pub username: String,
    /// Free-text review body.
    pub review: String,
    /// Integer rating in [1, 5].
    pub rating: i32,
    /// When the review was created.
    pub created_at: DateTime<Utc>,
}
