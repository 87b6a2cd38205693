//! SQLite-backed metadata catalog

use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use shelf_core::{CatalogAsset, Error, FolderPath, MediaType, MetadataCatalog, NewAsset, Result};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS assets (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        url TEXT NOT NULL,
        folder TEXT NOT NULL,
        type TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS assets_owner_folder ON assets (owner_id, folder)",
];

const COLUMNS: &str = "id, owner_id, name, url, folder, type, created_at";

#[derive(FromRow)]
struct AssetRow {
    id: String,
    owner_id: String,
    name: String,
    url: String,
    folder: String,
    #[sqlx(rename = "type")]
    media_type: String,
    created_at: String,
}

impl TryFrom<AssetRow> for CatalogAsset {
    type Error = Error;

    fn try_from(row: AssetRow) -> Result<Self> {
        let created_at = row
            .created_at
            .parse::<jiff::Timestamp>()
            .map_err(|e| Error::Catalog(format!("asset {}: bad created_at: {e}", row.id)))?;
        Ok(CatalogAsset {
            folder: FolderPath::normalize(&row.folder)?,
            media_type: row.media_type.parse().unwrap_or(MediaType::Other),
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            url: row.url,
            created_at,
        })
    }
}

/// Media catalog stored in a SQLite database
#[derive(Clone)]
pub struct SqliteCatalog {
    db: SqlitePool,
}

impl SqliteCatalog {
    /// Open the database at `url` and create the schema if needed
    ///
    /// In-memory databases live in a single connection that is never
    /// recycled, since every new connection would start empty.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let db = options.connect(url).await.map_err(catalog_error)?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&db)
                .await
                .map_err(catalog_error)?;
        }
        tracing::debug!(%url, "catalog ready");
        Ok(Self { db })
    }

    async fn fetch(&self, sql: &str, binds: &[&str]) -> Result<Vec<CatalogAsset>> {
        let mut query = sqlx::query_as::<_, AssetRow>(sql);
        for value in binds {
            query = query.bind(*value);
        }
        let rows = query.fetch_all(&self.db).await.map_err(catalog_error)?;
        rows.into_iter().map(CatalogAsset::try_from).collect()
    }

    async fn update(&self, sql: &str, value: &str, id: &str) -> Result<()> {
        let result = sqlx::query(sql)
            .bind(value)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(catalog_error)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("asset {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataCatalog for SqliteCatalog {
    async fn list_folder(&self, owner_id: &str, folder: &FolderPath) -> Result<Vec<CatalogAsset>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM assets WHERE owner_id = ? AND folder = ? ORDER BY name"
        );
        self.fetch(&sql, &[owner_id, folder.as_str()]).await
    }

    async fn list_subtree(
        &self,
        owner_id: &str,
        folder: &FolderPath,
    ) -> Result<Vec<CatalogAsset>> {
        if folder.is_root() {
            let sql =
                format!("SELECT {COLUMNS} FROM assets WHERE owner_id = ? ORDER BY folder, name");
            return self.fetch(&sql, &[owner_id]).await;
        }

        let prefix = folder.as_prefix();
        let length = prefix.chars().count().to_string();
        let sql = format!(
            "SELECT {COLUMNS} FROM assets
             WHERE owner_id = ? AND (folder = ? OR substr(folder, 1, CAST(? AS INTEGER)) = ?)
             ORDER BY folder, name"
        );
        self.fetch(&sql, &[owner_id, folder.as_str(), &length, &prefix])
            .await
    }

    async fn insert(&self, asset: NewAsset) -> Result<CatalogAsset> {
        let row = CatalogAsset {
            id: Uuid::new_v4().to_string(),
            owner_id: asset.owner_id,
            name: asset.name,
            url: asset.url,
            folder: asset.folder,
            media_type: asset.media_type,
            created_at: jiff::Timestamp::now(),
        };

        let sql = format!("INSERT INTO assets ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)");
        sqlx::query(&sql)
            .bind(&row.id)
            .bind(&row.owner_id)
            .bind(&row.name)
            .bind(&row.url)
            .bind(row.folder.as_str())
            .bind(row.media_type.as_str())
            .bind(row.created_at.to_string())
            .execute(&self.db)
            .await
            .map_err(catalog_error)?;

        tracing::debug!(id = %row.id, folder = %row.folder, "inserted asset");
        Ok(row)
    }

    async fn rename(&self, id: &str, name: &str) -> Result<()> {
        self.update("UPDATE assets SET name = ? WHERE id = ?", name, id)
            .await
    }

    async fn relocate(&self, id: &str, folder: &FolderPath) -> Result<()> {
        self.update("UPDATE assets SET folder = ? WHERE id = ?", folder.as_str(), id)
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM assets WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(catalog_error)?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("asset {id}")));
        }
        Ok(())
    }
}

fn catalog_error(err: sqlx::Error) -> Error {
    Error::Catalog(err.to_string())
}
