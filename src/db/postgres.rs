use chrono::Utc;
use pgvector::Vector;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

use crate::{
    db::{CatalogStore, CatalogWriter},
    error::{AppError, AppResult},
    models::{Candidate, EmbeddingModel, Movie, MovieId},
};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const MOVIE_COLUMNS: &str = "m.movie_id, m.english_title, m.original_title, m.overview, \
     m.genres, m.keywords, m.runtime, m.vote_average, m.vote_count, \
     m.poster_path, m.backdrop_path";

/// Row shape of the `movies` table
///
/// `genres` and `keywords` are text columns holding JSON-encoded lists.
#[derive(Debug, FromRow)]
struct MovieRow {
    movie_id: i32,
    english_title: String,
    original_title: Option<String>,
    overview: Option<String>,
    genres: Option<String>,
    keywords: Option<String>,
    runtime: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<i32>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            movie_id: row.movie_id,
            english_title: row.english_title,
            original_title: row.original_title,
            overview: row.overview,
            genres: parse_string_list(row.movie_id, "genres", row.genres.as_deref()),
            keywords: parse_string_list(row.movie_id, "keywords", row.keywords.as_deref()),
            runtime: row.runtime,
            vote_average: row.vote_average.unwrap_or(0.0),
            vote_count: row.vote_count.unwrap_or(0) as i64,
            poster_path: row.poster_path,
            backdrop_path: row.backdrop_path,
        }
    }
}

/// Decodes a JSON list column; null, blank or malformed values become empty
fn parse_string_list(movie_id: MovieId, column: &str, raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(movie_id, column, error = %e, "Ignoring malformed list column");
            Vec::new()
        }
    }
}

/// Statement writing one model's vector for a movie
///
/// `embedding_ada_002` is NOT NULL, so only that column may create the row;
/// the other models update a row that already exists.
fn store_embedding_sql(model: EmbeddingModel) -> String {
    match model {
        EmbeddingModel::Ada002 => format!(
            "INSERT INTO movie_embedding_openai (movie_id, {col}, embedding_updated_at) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (movie_id) DO UPDATE \
             SET {col} = EXCLUDED.{col}, embedding_updated_at = EXCLUDED.embedding_updated_at",
            col = model.column(),
        ),
        EmbeddingModel::Small3 | EmbeddingModel::Large3 => format!(
            "UPDATE movie_embedding_openai \
             SET {col} = $2, embedding_updated_at = $3 \
             WHERE movie_id = $1",
            col = model.column(),
        ),
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    distance: f64,
}

/// Movie catalog backed by Postgres and pgvector
///
/// Expects the `movies` table and a `movie_embedding_openai` table keyed by
/// `movie_id` with one `vector` column per [`EmbeddingModel`], of which only
/// `embedding_ada_002` is NOT NULL. Table creation and vector indexes are
/// managed outside this crate; `tests/fixtures/catalog_schema.sql` mirrors them.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalog {
    async fn nearest(
        &self,
        model: EmbeddingModel,
        query: &[f32],
        exclude: &[MovieId],
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Candidate>> {
        // Column names come from a closed enum, never from caller input.
        let sql = format!(
            "SELECT {columns}, (e.{col} <=> $1)::float8 AS distance \
             FROM movies m \
             JOIN movie_embedding_openai e ON e.movie_id = m.movie_id \
             WHERE e.{col} IS NOT NULL AND NOT (m.movie_id = ANY($2)) \
             ORDER BY distance ASC, COALESCE(m.vote_count, 0) DESC, m.movie_id ASC \
             OFFSET $3 LIMIT $4",
            columns = MOVIE_COLUMNS,
            col = model.column(),
        );

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(Vector::from(query.to_vec()))
            .bind(exclude)
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            model = %model,
            offset,
            limit,
            rows = rows.len(),
            "Nearest-neighbour query completed"
        );

        Ok(rows
            .into_iter()
            .map(|row| Candidate {
                movie: row.movie.into(),
                distance: row.distance,
            })
            .collect())
    }

    async fn find_movie(&self, movie_id: MovieId) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM movies m WHERE m.movie_id = $1", MOVIE_COLUMNS);
        let row = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Movie::from))
    }

    async fn stored_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
    ) -> AppResult<Option<Vec<f32>>> {
        let sql = format!(
            "SELECT {} FROM movie_embedding_openai WHERE movie_id = $1",
            model.column()
        );
        let row: Option<(Option<Vector>,)> = sqlx::query_as(&sql)
            .bind(movie_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(|(vector,)| vector).map(|v| v.to_vec()))
    }
}

#[async_trait::async_trait]
impl CatalogWriter for PgCatalog {
    async fn movies_missing_embeddings(
        &self,
        model: EmbeddingModel,
        after: Option<MovieId>,
        limit: u32,
    ) -> AppResult<Vec<Movie>> {
        let sql = format!(
            "SELECT {columns} FROM movies m \
             LEFT JOIN movie_embedding_openai e ON e.movie_id = m.movie_id \
             WHERE e.{col} IS NULL AND m.movie_id > $1 \
             ORDER BY m.movie_id ASC \
             LIMIT $2",
            columns = MOVIE_COLUMNS,
            col = model.column(),
        );
        let rows = sqlx::query_as::<_, MovieRow>(&sql)
            .bind(after.unwrap_or(MovieId::MIN))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn store_embedding(
        &self,
        movie_id: MovieId,
        model: EmbeddingModel,
        embedding: &[f32],
    ) -> AppResult<()> {
        let result = sqlx::query(&store_embedding_sql(model))
            .bind(movie_id)
            .bind(Vector::from(embedding.to_vec()))
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "movie {} has no embedding row; {} vectors require an existing {} row",
                movie_id,
                model,
                EmbeddingModel::Ada002
            )));
        }
        Ok(())
    }
}
