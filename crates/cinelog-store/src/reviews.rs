//! CRUD operations for [`Review`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Review;

impl Database {
    /// Insert a new review.
    ///
    /// The referenced movie id is not checked for existence: reviews hold
    /// a soft reference only.
    pub fn create_review(&self, review: &Review) -> Result<()> {
        self.conn().execute(
            "INSERT INTO reviews (id, movie_id, username, review, rating, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.id.to_string(),
                review.movie_id.to_string(),
                review.username,
                review.review,
                review.rating,
                review.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// List every review, ordered by creation date descending.
    pub fn list_reviews(&self) -> Result<Vec<Review>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, movie_id, username, review, rating, created_at
             FROM reviews
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_review)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

/// Map a `rusqlite::Row` to a [`Review`].
fn row_to_review(row: &rusqlite::Row<'_>) -> rusqlite::Result<Review> {
    let id_str: String = row.get(0)?;
    let movie_id_str: String = row.get(1)?;
    let username: String = row.get(2)?;
    let review: String = row.get(3)?;
    let rating: i32 = row.get(4)?;
    let created_str: String = row.get(5)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let movie_id = Uuid::parse_str(&movie_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Review {
        id,
        movie_id,
        username,
        review,
        rating,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn create_and_list_reviews() {
        let (_dir, db) = open_test_db();
        let movie_id = Uuid::new_v4();

        let review = Review {
            id: Uuid::new_v4(),
            movie_id,
            username: "critic".into(),
            review: "slow but rewarding".into(),
            rating: 4,
            created_at: Utc::now(),
        };
        db.create_review(&review).unwrap();

        let listed = db.list_reviews().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], review);
    }

    #[test]
    fn review_survives_without_matching_movie() {
        let (_dir, db) = open_test_db();

        // Soft reference: the movie does not exist and that is fine.
        let review = Review {
            id: Uuid::new_v4(),
            movie_id: Uuid::new_v4(),
            username: "ghost".into(),
            review: "reviewing the void".into(),
            rating: 1,
            created_at: Utc::now(),
        };
        db.create_review(&review).unwrap();
        assert_eq!(db.list_reviews().unwrap().len(), 1);
    }
}
