//! CRUD operations for [`Movie`] records, including the rating
//! aggregation used by the catalog listing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Actor, Genre, Movie, MovieChanges, MovieWithRating};

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new movie. Actor credits are stored as a JSON column.
    pub fn create_movie(&self, movie: &Movie) -> Result<()> {
        let actors_json = serde_json::to_string(&movie.actors)?;
        self.conn().execute(
            "INSERT INTO movies (id, title, release_date, genre, actors, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                movie.id.to_string(),
                movie.title,
                movie.release_date,
                movie.genre.as_str(),
                actors_json,
                movie.image_url,
                movie.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single movie by UUID.
    pub fn get_movie(&self, id: Uuid) -> Result<Movie> {
        self.conn()
            .query_row(
                "SELECT id, title, release_date, genre, actors, image_url, created_at
                 FROM movies
                 WHERE id = ?1",
                params![id.to_string()],
                row_to_movie,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List all movies, ordered by creation date descending.
    pub fn list_movies(&self) -> Result<Vec<Movie>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, title, release_date, genre, actors, image_url, created_at
             FROM movies
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_movie)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// List all movies joined with the mean rating over their reviews,
    /// ordered by descending mean.
    ///
    /// A movie with no reviews carries a `NULL` average (never zero);
    /// SQLite sorts `NULL` last under `DESC`, so unrated movies trail
    /// every rated one.
    pub fn list_movies_with_ratings(&self) -> Result<Vec<MovieWithRating>> {
        let mut stmt = self.conn().prepare(
            "SELECT m.id, m.title, m.release_date, m.genre, m.actors, m.image_url, m.created_at,
                    AVG(r.rating) AS avg_rating
             FROM movies m
             LEFT JOIN reviews r ON r.movie_id = m.id
             GROUP BY m.id
             ORDER BY avg_rating DESC",
        )?;

        let rows = stmt.query_map([], |row| {
            let movie = row_to_movie(row)?;
            let avg_rating: Option<f64> = row.get(7)?;
            Ok(MovieWithRating { movie, avg_rating })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update to a movie by UUID and return the updated
    /// record. Fails with [`StoreError::NotFound`] if no record matches.
    pub fn update_movie(&self, id: Uuid, changes: &MovieChanges) -> Result<Movie> {
        let mut movie = self.get_movie(id)?;

        if let Some(title) = &changes.title {
            movie.title = title.clone();
        }
        if let Some(release_date) = changes.release_date {
            movie.release_date = release_date;
        }
        if let Some(genre) = changes.genre {
            movie.genre = genre;
        }
        if let Some(actors) = &changes.actors {
            movie.actors = actors.clone();
        }
        if let Some(image_url) = &changes.image_url {
            movie.image_url = image_url.clone();
        }

        let actors_json = serde_json::to_string(&movie.actors)?;
        self.conn().execute(
            "UPDATE movies
             SET title = ?2, release_date = ?3, genre = ?4, actors = ?5, image_url = ?6
             WHERE id = ?1",
            params![
                id.to_string(),
                movie.title,
                movie.release_date,
                movie.genre.as_str(),
                actors_json,
                movie.image_url,
            ],
        )?;

        Ok(movie)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a movie by UUID. Returns `true` if a row was deleted.
    ///
    /// Reviews referencing the movie are left in place (soft reference).
    pub fn delete_movie(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM movies WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Movie`].
fn row_to_movie(row: &rusqlite::Row<'_>) -> rusqlite::Result<Movie> {
    let id_str: String = row.get(0)?;
    let title: String = row.get(1)?;
    let release_date: i32 = row.get(2)?;
    let genre_str: String = row.get(3)?;
    let actors_json: String = row.get(4)?;
    let image_url: Option<String> = row.get(5)?;
    let created_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let genre = Genre::from_str(&genre_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            e.into(),
        )
    })?;

    let actors: Vec<Actor> = serde_json::from_str(&actors_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Movie {
        id,
        title,
        release_date,
        genre,
        actors,
        image_url,
        created_at,
    })
}
