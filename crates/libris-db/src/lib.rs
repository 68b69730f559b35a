// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use libris_app::{Book, BookId};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

pub const APP_NAME: &str = "libris";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "books",
    &[
        "id",
        "title",
        "author",
        "category",
        "is_read",
        "is_favorite",
        "created_at",
    ],
)];

const DEMO_BOOKS: &[(&str, &str, &str, bool, bool)] = &[
    ("The Left Hand of Darkness", "Ursula K. Le Guin", "Sci-Fi", true, true),
    ("The Name of the Rose", "Umberto Eco", "Mystery", true, false),
    ("Pachinko", "Min Jin Lee", "Fiction", false, false),
    ("Thinking, Fast and Slow", "Daniel Kahneman", "Nonfiction", true, false),
    ("Piranesi", "Susanna Clarke", "Fantasy", false, true),
    ("The Three-Body Problem", "Liu Cixin", "Sci-Fi", true, false),
    ("Braiding Sweetgrass", "Robin Wall Kimmerer", "", false, false),
    ("A Memory Called Empire", "Arkady Martine", "Sci-Fi", false, false),
];

/// Field values for an insert. `id` and `created_at` are assigned by the
/// database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub is_read: bool,
    pub is_favorite: bool,
}

/// Replacement values for every mutable field of an existing book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookChanges {
    pub title: String,
    pub author: String,
    pub category: String,
    pub is_read: bool,
    pub is_favorite: bool,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    /// Idempotent startup: create the schema on a fresh database, validate it
    /// on an existing one.
    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }
        Ok(())
    }

    pub fn seed_demo_data(&self) -> Result<()> {
        for (title, author, category, is_read, is_favorite) in DEMO_BOOKS {
            self.create_book(&NewBook {
                title: (*title).to_owned(),
                author: (*author).to_owned(),
                category: (*category).to_owned(),
                is_read: *is_read,
                is_favorite: *is_favorite,
            })?;
        }
        Ok(())
    }

    pub fn create_book(&self, new_book: &NewBook) -> Result<BookId> {
        self.conn
            .execute(
                "
                INSERT INTO books (title, author, category, is_read, is_favorite)
                VALUES (?, ?, ?, ?, ?)
                ",
                params![
                    new_book.title,
                    new_book.author,
                    new_book.category,
                    i64::from(new_book.is_read),
                    i64::from(new_book.is_favorite),
                ],
            )
            .context("insert book")?;

        Ok(BookId::new(self.conn.last_insert_rowid()))
    }

    pub fn update_book(&self, book_id: BookId, changes: &BookChanges) -> Result<()> {
        let rows_affected = self
            .conn
            .execute(
                "
                UPDATE books
                SET
                  title = ?,
                  author = ?,
                  category = ?,
                  is_read = ?,
                  is_favorite = ?
                WHERE id = ?
                ",
                params![
                    changes.title,
                    changes.author,
                    changes.category,
                    i64::from(changes.is_read),
                    i64::from(changes.is_favorite),
                    book_id.get(),
                ],
            )
            .context("update book")?;
        if rows_affected == 0 {
            bail!(
                "book {} not found -- reload the list and retry",
                book_id.get()
            );
        }
        Ok(())
    }

    pub fn delete_book(&self, book_id: BookId) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM books WHERE id = ?", params![book_id.get()])
            .context("delete book")?;
        if rows_affected == 0 {
            bail!(
                "book {} not found -- reload the list and retry",
                book_id.get()
            );
        }
        Ok(())
    }

    pub fn get_book(&self, book_id: BookId) -> Result<Book> {
        self.conn
            .query_row(
                "
                SELECT id, title, author, category, is_read, is_favorite, created_at
                FROM books
                WHERE id = ?
                ",
                params![book_id.get()],
                map_book_row,
            )
            .with_context(|| format!("load book {}", book_id.get()))
    }

    /// Full reload: every book, newest first.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, title, author, category, is_read, is_favorite, created_at
                FROM books
                ORDER BY id DESC
                ",
            )
            .context("prepare books query")?;
        let rows = stmt.query_map([], map_book_row).context("query books")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect books")
    }

    pub fn count_books(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .context("count books")
    }
}

fn map_book_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
    // Legacy rows may hold NULL categories; the app itself always writes a
    // string, possibly empty.
    let category: Option<String> = row.get(3)?;
    let is_read: i64 = row.get(4)?;
    let is_favorite: i64 = row.get(5)?;
    let created_at_raw: String = row.get(6)?;

    Ok(Book {
        id: BookId::new(row.get(0)?),
        title: row.get(1)?,
        author: row.get(2)?,
        category: category.unwrap_or_default(),
        is_read: is_read != 0,
        is_favorite: is_favorite != 0,
        created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
    })
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("LIBRIS_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set LIBRIS_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("libris.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a libris-compatible database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; use a libris-compatible database",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(value);
    }

    // SQLite's datetime('now') emits "YYYY-MM-DD HH:MM:SS" in UTC.
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Ok(value.assume_utc());
    }

    bail!("unsupported datetime format {raw:?}")
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
