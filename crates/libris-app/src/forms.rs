// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

use crate::Book;

/// Editable form draft for a book. Text fields hold raw keyboard input and
/// are trimmed at submit time; the trimmed values are what get persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookFormInput {
    pub title: String,
    pub author: String,
    pub category: String,
    pub is_read: bool,
    pub is_favorite: bool,
}

impl BookFormInput {
    pub fn from_book(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            category: book.category.clone(),
            is_read: book.is_read,
            is_favorite: book.is_favorite,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("title is required -- enter a title and retry");
        }
        if self.author.trim().is_empty() {
            bail!("author is required -- enter an author and retry");
        }
        Ok(())
    }

    pub fn trimmed_title(&self) -> &str {
        self.title.trim()
    }

    pub fn trimmed_author(&self) -> &str {
        self.author.trim()
    }

    pub fn trimmed_category(&self) -> &str {
        self.category.trim()
    }
}
