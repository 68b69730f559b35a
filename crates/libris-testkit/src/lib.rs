// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Deterministic fixtures for tests. Every helper is a pure function of its
//! index so assertions can predict exact field values.

use anyhow::{Context, Result};
use libris_app::{Book, BookId};
use rusqlite::{Connection, params};
use time::macros::datetime;
use time::OffsetDateTime;

const TITLES: &[&str] = &[
    "The Dispossessed",
    "Invisible Cities",
    "The Remains of the Day",
    "Stories of Your Life",
    "The Master and Margarita",
    "Kindred",
    "The Shadow of the Wind",
    "Cloud Atlas",
];

const AUTHORS: &[&str] = &[
    "Ursula K. Le Guin",
    "Italo Calvino",
    "Kazuo Ishiguro",
    "Ted Chiang",
    "Mikhail Bulgakov",
    "Octavia E. Butler",
    "Carlos Ruiz Zafon",
    "David Mitchell",
];

// Index 3 is deliberately empty so fixtures cover the uncategorized case.
const CATEGORIES: &[&str] = &[
    "Sci-Fi",
    "Fiction",
    "Fiction",
    "",
    "Classics",
    "Sci-Fi",
    "Mystery",
    "Fiction",
];

pub fn sample_title(index: usize) -> &'static str {
    TITLES[index % TITLES.len()]
}

pub fn sample_author(index: usize) -> &'static str {
    AUTHORS[index % AUTHORS.len()]
}

pub fn sample_category(index: usize) -> &'static str {
    CATEGORIES[index % CATEGORIES.len()]
}

pub fn sample_is_read(index: usize) -> bool {
    index % 2 == 0
}

pub fn sample_is_favorite(index: usize) -> bool {
    index % 3 == 0
}

/// A fixed instant for tests that compare timestamps.
pub fn fixed_timestamp() -> OffsetDateTime {
    datetime!(2026-01-15 09:30:00 UTC)
}

/// An in-memory [`Book`] with index-derived fields, for tests that never
/// touch a database.
pub fn sample_book(index: usize) -> Book {
    Book {
        id: BookId::new(index as i64 + 1),
        title: sample_title(index).to_owned(),
        author: sample_author(index).to_owned(),
        category: sample_category(index).to_owned(),
        is_read: sample_is_read(index),
        is_favorite: sample_is_favorite(index),
        created_at: fixed_timestamp(),
    }
}

/// Inserts `count` fixture rows directly, bypassing the store. Useful for
/// seeding a schema that the test then reads back through the public API.
pub fn insert_sample_books(conn: &Connection, count: usize) -> Result<()> {
    for index in 0..count {
        conn.execute(
            "
            INSERT INTO books (title, author, category, is_read, is_favorite)
            VALUES (?, ?, ?, ?, ?)
            ",
            params![
                sample_title(index),
                sample_author(index),
                sample_category(index),
                i64::from(sample_is_read(index)),
                i64::from(sample_is_favorite(index)),
            ],
        )
        .with_context(|| format!("insert fixture book {index}"))?;
    }
    Ok(())
}
