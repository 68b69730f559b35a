// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use libris_app::{Book, BookFormInput, BookId};
use libris_db::{BookChanges, NewBook, Store};

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl libris_tui::AppRuntime for DbRuntime<'_> {
    fn load_books(&mut self) -> Result<Vec<Book>> {
        self.store.list_books()
    }

    fn add_book(&mut self, input: &BookFormInput) -> Result<BookId> {
        input.validate()?;
        self.store.create_book(&NewBook {
            title: input.trimmed_title().to_owned(),
            author: input.trimmed_author().to_owned(),
            category: input.trimmed_category().to_owned(),
            is_read: input.is_read,
            is_favorite: input.is_favorite,
        })
    }

    fn update_book(&mut self, book_id: BookId, input: &BookFormInput) -> Result<()> {
        input.validate()?;
        self.store.update_book(
            book_id,
            &BookChanges {
                title: input.trimmed_title().to_owned(),
                author: input.trimmed_author().to_owned(),
                category: input.trimmed_category().to_owned(),
                is_read: input.is_read,
                is_favorite: input.is_favorite,
            },
        )
    }

    fn delete_book(&mut self, book_id: BookId) -> Result<()> {
        self.store.delete_book(book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use libris_app::BookFormInput;
    use libris_db::Store;
    use libris_tui::AppRuntime;

    fn draft(title: &str, author: &str) -> BookFormInput {
        BookFormInput {
            title: title.to_owned(),
            author: author.to_owned(),
            category: String::new(),
            is_read: false,
            is_favorite: false,
        }
    }

    #[test]
    fn add_then_load_round_trips_through_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = DbRuntime::new(&store);

        let id = runtime.add_book(&draft("  Dune  ", "Frank Herbert"))?;
        let books = runtime.load_books()?;
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, id);
        assert_eq!(books[0].title, "Dune");
        Ok(())
    }

    #[test]
    fn add_rejects_invalid_input_before_touching_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = DbRuntime::new(&store);

        let error = runtime
            .add_book(&draft("", "Frank Herbert"))
            .expect_err("blank title should fail");
        assert!(error.to_string().contains("title is required"));
        assert!(runtime.load_books()?.is_empty());
        Ok(())
    }

    #[test]
    fn update_and_delete_flow_through_the_store() -> Result<()> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        let mut runtime = DbRuntime::new(&store);

        let id = runtime.add_book(&draft("Dune", "Frank Herbert"))?;
        runtime.update_book(id, &draft("Dune Messiah", "Frank Herbert"))?;
        assert_eq!(runtime.load_books()?[0].title, "Dune Messiah");

        runtime.delete_book(id)?;
        assert!(runtime.load_books()?.is_empty());
        Ok(())
    }
}
