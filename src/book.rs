use crate::error::{Rejection, Result};
use crate::field::{Isbn, Keywords, Text};
use crate::store::RecordStore;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, Deserialize)]
pub struct Book {
    isbn: Isbn,
    name: Text,
    author: Text,
    keywords: Keywords,
    price: f64,
    quantity: u32,
}

impl Book {
    pub fn new(isbn: Isbn) -> Book {
        Book {
            isbn,
            ..Default::default()
        }
    }

    pub fn isbn(&self) -> &Isbn {
        &self.isbn
    }

    pub fn name(&self) -> &Text {
        &self.name
    }

    pub fn author(&self) -> &Text {
        &self.author
    }

    pub fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

struct Listing<'a>(&'a Book);

impl Serialize for Listing<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let book = self.0;
        let mut row = serializer.serialize_struct("Book", 6)?;
        row.serialize_field("isbn", book.isbn.as_str())?;
        row.serialize_field("name", book.name.as_str())?;
        row.serialize_field("author", book.author.as_str())?;
        row.serialize_field("keyword", book.keywords.as_str())?;
        row.serialize_field("price", &format!("{:.2}", book.price))?;
        row.serialize_field("quantity", &book.quantity)?;
        row.end()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    All,
    Isbn(Isbn),
    Name(Text),
    Author(Text),
    Keyword(Text),
}

/// Fields to overwrite on the selected book. `None` leaves a field alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changes {
    pub isbn: Option<Isbn>,
    pub name: Option<Text>,
    pub author: Option<Text>,
    pub keywords: Option<Keywords>,
    pub price: Option<f64>,
}

pub struct Catalog {
    books: RecordStore<Book>,
}

impl Catalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Catalog> {
        Ok(Catalog {
            books: RecordStore::open(path)?,
        })
    }

    pub fn get(&self, index: usize) -> Option<&Book> {
        self.books.get(index)
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn matching<F>(&self, pred: F) -> Vec<usize>
    where
        F: Fn(&Book) -> bool,
    {
        self.books
            .records()
            .iter()
            .enumerate()
            .filter(|(_, book)| pred(book))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn position(&self, isbn: &Isbn) -> Option<usize> {
        self.books
            .records()
            .iter()
            .position(|book| book.isbn == *isbn)
    }

    pub fn find_by_isbn(&self, isbn: &Isbn) -> Vec<usize> {
        self.matching(|book| book.isbn == *isbn)
    }

    pub fn find_by_name(&self, name: &Text) -> Vec<usize> {
        self.matching(|book| book.name == *name)
    }

    pub fn find_by_author(&self, author: &Text) -> Vec<usize> {
        self.matching(|book| book.author == *author)
    }

    /// Books with `keyword` as one whole segment of their keyword list.
    pub fn find_by_keyword(&self, keyword: &str) -> Vec<usize> {
        self.matching(|book| book.keywords.contains(keyword))
    }

    /// Books passing `filter`, ordered by ISBN.
    pub fn list(&self, filter: &Filter) -> Vec<&Book> {
        let indices = match filter {
            Filter::All => (0..self.books.len()).collect(),
            Filter::Isbn(isbn) => self.find_by_isbn(isbn),
            Filter::Name(name) => self.find_by_name(name),
            Filter::Author(author) => self.find_by_author(author),
            Filter::Keyword(keyword) => self.find_by_keyword(keyword.as_str()),
        };
        let mut books: Vec<&Book> = indices.into_iter().filter_map(|i| self.books.get(i)).collect();
        books.sort_by(|a, b| a.isbn.cmp(&b.isbn));
        books
    }

    pub fn display<W: Write>(&self, filter: &Filter, out: &mut W) -> Result<()> {
        let books = self.list(filter);
        // a filtered miss still prints one empty line
        if books.is_empty() {
            if *filter != Filter::All {
                writeln!(out)?;
            }
            return Ok(());
        }

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(out);
        for book in books {
            wtr.serialize(Listing(book))?;
        }
        wtr.flush()?;

        Ok(())
    }

    pub fn select(&mut self, isbn: &Isbn) -> Result<usize> {
        if let Some(idx) = self.position(isbn) {
            return Ok(idx);
        }

        let idx = self.books.push(Book::new(isbn.clone()));
        self.books.save()?;
        log::info!("created book {}", isbn);
        Ok(idx)
    }

    /// Applies `changes` to the book at `index`.
    ///
    /// `changes.keywords` must already be validated; see [`Keywords::new`].
    pub fn modify(&mut self, index: usize, changes: Changes) -> Result<()> {
        if self.books.get(index).is_none() {
            return Err(Rejection::UnknownBook.into());
        }
        if let Some(isbn) = &changes.isbn {
            if self.position(isbn).is_some_and(|other| other != index) {
                return Err(Rejection::DuplicateIsbn.into());
            }
        }

        let book = self.books.get_mut(index).ok_or(Rejection::UnknownBook)?;
        if let Some(isbn) = changes.isbn {
            book.isbn = isbn;
        }
        if let Some(name) = changes.name {
            book.name = name;
        }
        if let Some(author) = changes.author {
            book.author = author;
        }
        if let Some(keywords) = changes.keywords {
            book.keywords = keywords;
        }
        if let Some(price) = changes.price {
            book.price = price;
        }
        self.books.save()
    }

    pub fn import(&mut self, index: usize, quantity: u32, total_cost: f64) -> Result<()> {
        if quantity == 0 {
            return Err(Rejection::NonPositiveQuantity.into());
        }
        if total_cost.is_nan() || total_cost <= 0.0 {
            return Err(Rejection::NonPositiveCost.into());
        }
        let book = self.books.get_mut(index).ok_or(Rejection::UnknownBook)?;
        book.quantity = book
            .quantity
            .checked_add(quantity)
            .ok_or(Rejection::StockOverflow)?;
        self.books.save()
    }

    pub fn buy(&mut self, isbn: &Isbn, quantity: u32) -> Result<f64> {
        if quantity == 0 {
            return Err(Rejection::NonPositiveQuantity.into());
        }
        let idx = self.position(isbn).ok_or(Rejection::UnknownBook)?;
        let book = self.books.get_mut(idx).ok_or(Rejection::UnknownBook)?;
        if quantity > book.quantity {
            return Err(Rejection::InsufficientStock.into());
        }

        book.quantity -= quantity;
        let total = book.price * f64::from(quantity);
        self.books.save()?;
        Ok(total)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn isbn(s: &str) -> Isbn {
        Isbn::new(s).unwrap()
    }

    fn text(s: &str) -> Text {
        Text::new(s).unwrap()
    }

    fn base_catalog() -> (TempDir, Catalog) {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(dir.path().join("books.dat")).unwrap();
        (dir, catalog)
    }

    fn add_book(catalog: &mut Catalog, code: &str, author: &str, keywords: &str) -> usize {
        let idx = catalog.select(&isbn(code)).unwrap();
        catalog
            .modify(
                idx,
                Changes {
                    name: Some(text(&format!("Book {}", code))),
                    author: Some(text(author)),
                    keywords: Some(Keywords::new(keywords).unwrap()),
                    price: Some(10.0),
                    ..Default::default()
                },
            )
            .unwrap();
        idx
    }

    fn rejection<T: std::fmt::Debug>(result: Result<T>) -> Rejection {
        match result {
            Err(Error::Invalid(rejection)) => rejection,
            other => panic!("expected a rejection, got {:?}", other),
        }
    }

    fn shown(catalog: &Catalog, filter: &Filter) -> String {
        let mut out = Vec::new();
        catalog.display(filter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn select_creates_once() {
        let (_dir, mut catalog) = base_catalog();
        let first = catalog.select(&isbn("978-0-000")).unwrap();
        let again = catalog.select(&isbn("978-0-000")).unwrap();
        assert_eq!(first, again);
        assert_eq!(catalog.len(), 1);

        let book = catalog.get(first).unwrap();
        assert_eq!(book.price(), 0.0);
        assert_eq!(book.quantity(), 0);
        assert!(book.name().is_empty());
    }

    #[test]
    fn find_by_fields() {
        let (_dir, mut catalog) = base_catalog();
        let a = add_book(&mut catalog, "1", "Le Guin", "fantasy|sea");
        let b = add_book(&mut catalog, "2", "Le Guin", "science fiction");
        let c = add_book(&mut catalog, "3", "Banks", "science fiction|space");

        assert_eq!(catalog.find_by_isbn(&isbn("2")), vec![b]);
        assert_eq!(catalog.find_by_name(&text("Book 3")), vec![c]);
        assert_eq!(catalog.find_by_author(&text("Le Guin")), vec![a, b]);
        assert_eq!(catalog.find_by_keyword("science fiction"), vec![b, c]);
        assert!(catalog.find_by_keyword("science").is_empty());
    }

    #[test]
    fn listing_is_ordered_by_isbn() {
        let (_dir, mut catalog) = base_catalog();
        add_book(&mut catalog, "9", "Banks", "space");
        add_book(&mut catalog, "10", "Banks", "space");
        add_book(&mut catalog, "5", "Banks", "space");
        add_book(&mut catalog, "7", "Other", "space");

        let isbns: Vec<&str> = catalog
            .list(&Filter::Author(text("Banks")))
            .iter()
            .map(|b| b.isbn().as_str())
            .collect();
        assert_eq!(isbns, vec!["10", "5", "9"]);
    }

    #[test]
    fn display_format() {
        let (_dir, mut catalog) = base_catalog();
        add_book(&mut catalog, "b", "Banks", "space|ships");
        catalog.select(&isbn("a")).unwrap();

        assert_eq!(
            shown(&catalog, &Filter::All),
            "a\t\t\t\t0.00\t0\nb\tBook b\tBanks\tspace|ships\t10.00\t0\n"
        );
    }

    #[test]
    fn display_empty_results() {
        let (_dir, catalog) = base_catalog();
        assert_eq!(shown(&catalog, &Filter::All), "");
        assert_eq!(shown(&catalog, &Filter::Keyword(text("none"))), "\n");
    }

    #[test]
    fn modify_partial_update() {
        let (_dir, mut catalog) = base_catalog();
        let idx = add_book(&mut catalog, "1", "Banks", "space");
        catalog
            .modify(
                idx,
                Changes {
                    price: Some(12.5),
                    ..Default::default()
                },
            )
            .unwrap();

        let book = catalog.get(idx).unwrap();
        assert_eq!(book.price(), 12.5);
        assert_eq!(book.author().as_str(), "Banks");
        assert_eq!(book.keywords().as_str(), "space");
    }

    #[test]
    fn modify_isbn_collision() {
        let (_dir, mut catalog) = base_catalog();
        let a = add_book(&mut catalog, "1", "Banks", "space");
        add_book(&mut catalog, "2", "Banks", "space");
        let before = catalog.get(a).unwrap().clone();

        let changes = Changes {
            isbn: Some(isbn("2")),
            name: Some(text("Renamed")),
            ..Default::default()
        };
        assert_eq!(rejection(catalog.modify(a, changes)), Rejection::DuplicateIsbn);
        assert_eq!(catalog.get(a).unwrap(), &before);

        // keeping its own ISBN is not a collision
        let changes = Changes {
            isbn: Some(isbn("1")),
            ..Default::default()
        };
        assert!(catalog.modify(a, changes).is_ok());
    }

    #[test]
    fn import_and_buy_keep_stock_non_negative() {
        let (_dir, mut catalog) = base_catalog();
        let idx = add_book(&mut catalog, "1", "Banks", "space");

        assert_eq!(
            rejection(catalog.import(idx, 0, 5.0)),
            Rejection::NonPositiveQuantity
        );
        assert_eq!(
            rejection(catalog.import(idx, 3, 0.0)),
            Rejection::NonPositiveCost
        );
        catalog.import(idx, 3, 15.0).unwrap();

        assert_eq!(
            rejection(catalog.buy(&isbn("1"), 4)),
            Rejection::InsufficientStock
        );
        assert_eq!(catalog.get(idx).unwrap().quantity(), 3);

        assert_eq!(catalog.buy(&isbn("1"), 2).unwrap(), 20.0);
        assert_eq!(catalog.get(idx).unwrap().quantity(), 1);
        assert_eq!(rejection(catalog.buy(&isbn("1"), 0)), Rejection::NonPositiveQuantity);
        assert_eq!(rejection(catalog.buy(&isbn("9"), 1)), Rejection::UnknownBook);
    }

    #[test]
    fn import_overflow() {
        let (_dir, mut catalog) = base_catalog();
        let idx = catalog.select(&isbn("1")).unwrap();
        catalog.import(idx, u32::MAX, 1.0).unwrap();
        assert_eq!(
            rejection(catalog.import(idx, 1, 1.0)),
            Rejection::StockOverflow
        );
    }

    #[test]
    fn books_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.dat");
        let mut catalog = Catalog::open(&path).unwrap();
        let idx = add_book(&mut catalog, "1", "Banks", "space");
        catalog.import(idx, 7, 1.0).unwrap();
        drop(catalog);

        let catalog = Catalog::open(&path).unwrap();
        let book = catalog.get(0).unwrap();
        assert_eq!(book.quantity(), 7);
        assert_eq!(book.price(), 10.0);
        assert_eq!(book.keywords().as_str(), "space");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 212);
    }
}
