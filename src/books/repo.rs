use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Book record. `author_id` is set once at creation and never updated; the
/// URL columns always hold durable remote locations, never local paths.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub author_id: Uuid,
    pub cover_image_url: String,
    pub file_url: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const BOOK_COLUMNS: &str =
    "id, title, genre, author_id, cover_image_url, file_url, created_at, updated_at";

impl Book {
    /// Insert a new book. The caller must guarantee both URLs are durable
    /// (already uploaded) before calling.
    pub async fn create(
        db: &PgPool,
        title: &str,
        genre: &str,
        author_id: Uuid,
        cover_image_url: &str,
        file_url: &str,
    ) -> Result<Book, sqlx::Error> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, genre, author_id, cover_image_url, file_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(genre)
        .bind(author_id)
        .bind(cover_image_url)
        .bind(file_url)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Partial update: `None` preserves the stored value. `author_id` is
    /// deliberately absent from the SET list.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        genre: Option<&str>,
        cover_image_url: Option<&str>,
        file_url: Option<&str>,
    ) -> Result<Option<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                genre = COALESCE($3, genre),
                cover_image_url = COALESCE($4, cover_image_url),
                file_url = COALESCE($5, file_url),
                updated_at = now()
            WHERE id = $1
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(genre)
        .bind(cover_image_url)
        .bind(file_url)
        .fetch_optional(db)
        .await
    }

    /// Unfiltered, unpaginated list; ordering is stable for an unmutated
    /// dataset.
    pub async fn list(db: &PgPool) -> Result<Vec<Book>, sqlx::Error> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            SELECT {BOOK_COLUMNS}
            FROM books
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .fetch_all(db)
        .await
    }

    /// Returns false when the id did not exist.
    pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
