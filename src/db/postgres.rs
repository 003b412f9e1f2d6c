// src/db/postgres.rs
// DOCUMENTATION: PostgreSQL-backed GopherStore - all SQL queries
// PURPOSE: Create the schema and map each store operation onto one statement

use crate::db::GopherStore;
use crate::errors::GopherError;
use crate::models::{ContentHash, Gopher, Rating};
use async_trait::async_trait;
use sqlx::PgPool;

pub const DEFAULT_GOPHERS_TABLE: &str = "gophers";
pub const DEFAULT_RATINGS_TABLE: &str = "ratings";

/// Longest identifier PostgreSQL keeps without truncating
const MAX_IDENTIFIER_LEN: usize = 63;

/// Appended to the ratings table name to name its hash index
const INDEX_SUFFIX: &str = "_hash_idx";

/// Names of the two tables owned by the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub gophers: String,
    pub ratings: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            gophers: DEFAULT_GOPHERS_TABLE.to_string(),
            ratings: DEFAULT_RATINGS_TABLE.to_string(),
        }
    }
}

impl TableNames {
    pub fn validate(&self) -> Result<(), GopherError> {
        quote_identifier(&self.gophers)?;
        quote_identifier(&self.ratings)?;
        // The ratings index name must fit in an identifier too
        if self.ratings.len() + INDEX_SUFFIX.len() > MAX_IDENTIFIER_LEN {
            return Err(GopherError::ValidationError(format!(
                "ratings table name {:?} is too long, at most {} bytes are allowed",
                self.ratings,
                MAX_IDENTIFIER_LEN - INDEX_SUFFIX.len()
            )));
        }
        if self.gophers == self.ratings {
            return Err(GopherError::ValidationError(format!(
                "gophers and ratings tables must differ, both are {:?}",
                self.gophers
            )));
        }
        Ok(())
    }
}

/// Quote a table name for interpolation into SQL text
/// DOCUMENTATION: Only plain identifiers are accepted, so quoting can never
/// be escaped out of
pub fn quote_identifier(name: &str) -> Result<String, GopherError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid_start || !valid_rest || name.len() > MAX_IDENTIFIER_LEN {
        return Err(GopherError::ValidationError(format!(
            "invalid table name {:?}",
            name
        )));
    }

    Ok(format!("\"{}\"", name))
}

/// SQL text for every statement, rendered once with the quoted table names
#[derive(Debug, Clone)]
struct Statements {
    create_gophers: String,
    create_ratings: String,
    create_ratings_index: String,
    insert_gopher: String,
    select_gopher: String,
    list_hashes: String,
    count_gophers: String,
    average_rating: String,
    insert_rating: String,
}

impl Statements {
    fn new(tables: &TableNames) -> Result<Self, GopherError> {
        tables.validate()?;
        let gophers = quote_identifier(&tables.gophers)?;
        let ratings = quote_identifier(&tables.ratings)?;
        let ratings_index = quote_identifier(&format!("{}{}", tables.ratings, INDEX_SUFFIX))?;

        Ok(Self {
            create_gophers: format!(
                "CREATE TABLE IF NOT EXISTS {gophers} (
                    hash BYTEA PRIMARY KEY CHECK (octet_length(hash) = 32),
                    raw BYTEA NOT NULL
                )"
            ),
            create_ratings: format!(
                "CREATE TABLE IF NOT EXISTS {ratings} (
                    hash BYTEA NOT NULL,
                    rating SMALLINT NOT NULL CHECK (rating BETWEEN 0 AND 5)
                )"
            ),
            create_ratings_index: format!(
                "CREATE INDEX IF NOT EXISTS {ratings_index} ON {ratings} (hash)"
            ),
            insert_gopher: format!(
                "INSERT INTO {gophers} (hash, raw) VALUES ($1, $2) ON CONFLICT (hash) DO NOTHING"
            ),
            select_gopher: format!("SELECT raw FROM {gophers} WHERE hash = $1"),
            list_hashes: format!("SELECT hash FROM {gophers} ORDER BY hash LIMIT $1 OFFSET $2"),
            count_gophers: format!("SELECT COUNT(hash) FROM {gophers}"),
            average_rating: format!(
                "SELECT COALESCE(ROUND(AVG(rating)), 0)::INT4 FROM {ratings} WHERE hash = $1"
            ),
            insert_rating: format!("INSERT INTO {ratings} (hash, rating) VALUES ($1, $2)"),
        })
    }
}

/// GopherStore on top of a PostgreSQL pool
pub struct PgGopherStore {
    pool: PgPool,
    sql: Statements,
}

impl PgGopherStore {
    /// Create the store, creating both tables if they are missing
    /// DOCUMENTATION: Schema creation runs in a single transaction
    pub async fn with_tables(pool: PgPool, tables: TableNames) -> Result<Self, GopherError> {
        let sql = Statements::new(&tables)?;

        let mut tx = pool.begin().await.map_err(|e| {
            log::error!("Failed to begin schema transaction: {}", e);
            GopherError::PersistenceError(e.to_string())
        })?;

        for statement in [&sql.create_gophers, &sql.create_ratings, &sql.create_ratings_index] {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    log::error!("Failed to create schema: {}", e);
                    GopherError::PersistenceError(e.to_string())
                })?;
        }

        tx.commit().await.map_err(|e| {
            log::error!("Failed to commit schema: {}", e);
            GopherError::PersistenceError(e.to_string())
        })?;

        log::info!(
            "Schema ready (gophers table {:?}, ratings table {:?})",
            tables.gophers,
            tables.ratings
        );
        Ok(Self { pool, sql })
    }
}

#[async_trait]
impl GopherStore for PgGopherStore {
    async fn save(&self, gopher: &Gopher) -> Result<(), GopherError> {
        sqlx::query(&self.sql.insert_gopher)
            .bind(gopher.hash().as_bytes().as_slice())
            .bind(gopher.raw())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to save gopher {}: {}", gopher.hash(), e);
                GopherError::PersistenceError(e.to_string())
            })?;

        Ok(())
    }

    async fn load(&self, hash: &ContentHash) -> Result<Option<Gopher>, GopherError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(&self.sql.select_gopher)
            .bind(hash.as_bytes().as_slice())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to load gopher {}: {}", hash, e);
                GopherError::PersistenceError(e.to_string())
            })?;

        Ok(row.map(|(raw,)| Gopher::new(raw)))
    }

    async fn list(&self, start: u32, count: u32) -> Result<Vec<ContentHash>, GopherError> {
        let rows: Vec<(Vec<u8>,)> = sqlx::query_as(&self.sql.list_hashes)
            .bind(i64::from(count))
            .bind(i64::from(start))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list gophers: {}", e);
                GopherError::PersistenceError(e.to_string())
            })?;

        rows.iter()
            .map(|(hash,)| ContentHash::from_slice(hash))
            .collect()
    }

    async fn count(&self) -> Result<i64, GopherError> {
        let row: Option<(i64,)> = sqlx::query_as(&self.sql.count_gophers)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to count gophers: {}", e);
                GopherError::PersistenceError(e.to_string())
            })?;

        row.map(|(count,)| count).ok_or_else(|| {
            GopherError::PersistenceError("no count response from database".to_string())
        })
    }

    async fn rating(&self, hash: &ContentHash) -> Result<Rating, GopherError> {
        let row: Option<(i32,)> = sqlx::query_as(&self.sql.average_rating)
            .bind(hash.as_bytes().as_slice())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch rating for {}: {}", hash, e);
                GopherError::PersistenceError(e.to_string())
            })?;

        match row {
            Some((average,)) => Rating::new(i64::from(average)),
            None => Ok(Rating::NONE),
        }
    }

    async fn rate(&self, hash: &ContentHash, rating: i64) -> Result<(), GopherError> {
        let rating = Rating::new(rating)?;

        sqlx::query(&self.sql.insert_rating)
            .bind(hash.as_bytes().as_slice())
            .bind(i16::from(rating.stars()))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                log::error!("Failed to rate gopher {}: {}", hash, e);
                GopherError::PersistenceError(e.to_string())
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("gophers").unwrap(), "\"gophers\"");
        assert_eq!(quote_identifier("_ratings_2").unwrap(), "\"_ratings_2\"");
    }

    #[test]
    fn test_quote_identifier_rejects_injection() {
        assert!(quote_identifier("").is_err());
        assert!(quote_identifier("1gophers").is_err());
        assert!(quote_identifier("gophers; DROP TABLE ratings").is_err());
        assert!(quote_identifier("go\"phers").is_err());
        assert!(quote_identifier("gophers`").is_err());
        assert!(quote_identifier(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_table_names_must_differ() {
        let tables = TableNames {
            gophers: "same".into(),
            ratings: "same".into(),
        };
        assert!(tables.validate().is_err());
        assert!(TableNames::default().validate().is_ok());
    }

    #[test]
    fn test_ratings_name_leaves_room_for_index() {
        let fits = TableNames {
            gophers: "gophers".into(),
            ratings: "r".repeat(54),
        };
        assert!(fits.validate().is_ok());
        let sql = Statements::new(&fits).unwrap();
        assert!(sql
            .create_ratings_index
            .contains(&format!("\"{}_hash_idx\"", "r".repeat(54))));

        let too_long = TableNames {
            gophers: "gophers".into(),
            ratings: "r".repeat(55),
        };
        assert!(too_long.validate().is_err());
        assert!(Statements::new(&too_long).is_err());
    }

    #[test]
    fn test_statements_use_quoted_tables() {
        let sql = Statements::new(&TableNames {
            gophers: "pics".into(),
            ratings: "stars".into(),
        })
        .unwrap();

        assert!(sql.insert_gopher.starts_with("INSERT INTO \"pics\""));
        assert!(sql.insert_rating.starts_with("INSERT INTO \"stars\""));
        assert!(sql.create_ratings_index.contains("\"stars_hash_idx\""));
        assert!(sql.list_hashes.contains("ORDER BY hash"));
    }

    /// Connect to the database named by GOPHER_STORER_TEST_DATABASE_URL
    async fn test_store() -> PgGopherStore {
        let url = std::env::var("GOPHER_STORER_TEST_DATABASE_URL")
            .expect("GOPHER_STORER_TEST_DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database");

        // Fresh tables per run so tests don't see each other's rows
        let suffix = ContentHash::of(format!("{:?}", std::time::SystemTime::now()).as_bytes())
            .to_hex();
        let tables = TableNames {
            gophers: format!("gophers_{}", &suffix[..12]),
            ratings: format!("ratings_{}", &suffix[..12]),
        };
        PgGopherStore::with_tables(pool, tables)
            .await
            .expect("create schema")
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn test_postgres_round_trip() {
        let store = test_store().await;
        let gopher = Gopher::new(b"GIF89a postgres gopher".to_vec());

        store.save(&gopher).await.unwrap();
        store.save(&gopher).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.load(&gopher.hash()).await.unwrap(), Some(gopher.clone()));
        assert_eq!(store.list(0, 200).await.unwrap(), vec![gopher.hash()]);
        assert!(store
            .load(&ContentHash::of(b"missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn test_postgres_rating_average() {
        let store = test_store().await;
        let hash = ContentHash::of(b"rated in postgres");

        assert_eq!(store.rating(&hash).await.unwrap(), Rating::NONE);
        store.rate(&hash, 1).await.unwrap();
        store.rate(&hash, 5).await.unwrap();
        assert_eq!(store.rating(&hash).await.unwrap(), Rating::THREE);

        store.rate(&hash, 5).await.unwrap();
        store.rate(&hash, 4).await.unwrap();
        // 15 / 4 = 3.75
        assert_eq!(store.rating(&hash).await.unwrap(), Rating::FOUR);

        assert!(store.rate(&hash, 9).await.is_err());
    }
}
