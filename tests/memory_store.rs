//! In-Memory Store Integration Tests
//!
//! Copy counting, removal down to zero, and the shared CatalogStore contract.

use bookshelf::{Book, CatalogStore, Isbn, MemoryStore};

fn hamlet() -> Book {
    Book::new(
        Isbn::parse("9788027237142").unwrap(),
        "Hamlet",
        "William Shakespeare",
    )
}

fn siddhartha() -> Book {
    Book::new(
        Isbn::parse("9781438279336").unwrap(),
        "Siddhartha",
        "Hermann Hesse",
    )
}

#[test]
fn test_same_isbn_twice() {
    let store = MemoryStore::new();

    store.insert(hamlet()).unwrap();
    let copies = store.insert(hamlet()).unwrap();

    assert_eq!(copies, 2);
    assert_eq!(store.count(&hamlet().isbn).unwrap(), 2);
    assert_eq!(store.distinct_count().unwrap(), 1);
}

#[test]
fn test_two_isbns() {
    let store = MemoryStore::new();

    store.insert(hamlet()).unwrap();
    store.insert(siddhartha()).unwrap();

    assert_eq!(store.distinct_count().unwrap(), 2);

    let mut isbns = store.isbns().unwrap();
    isbns.sort();
    let mut expected = vec![hamlet().isbn, siddhartha().isbn];
    expected.sort();
    assert_eq!(isbns, expected);
}

#[test]
fn test_remove_down_to_zero() {
    let store = MemoryStore::new();
    let isbn = hamlet().isbn;

    for _ in 0..3 {
        store.insert(hamlet()).unwrap();
    }

    assert_eq!(store.remove(&isbn).unwrap(), 2);
    assert_eq!(store.remove(&isbn).unwrap(), 1);
    assert_eq!(store.remove(&isbn).unwrap(), 0);

    assert_eq!(store.count(&isbn).unwrap(), 0);
    assert!(!store.isbns().unwrap().contains(&isbn));

    // Absent key stays a no-op, no underflow
    assert_eq!(store.remove(&isbn).unwrap(), 0);
    assert_eq!(store.count(&isbn).unwrap(), 0);
}

#[test]
fn test_concurrent_inserts_are_counted() {
    let store = std::sync::Arc::new(MemoryStore::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..25 {
                    store.insert(hamlet()).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.count(&hamlet().isbn).unwrap(), 200);
    assert_eq!(store.distinct_count().unwrap(), 1);
}

/// Exercise a backend through the shared trait only
fn exercise<S: CatalogStore>(store: &S) -> (usize, usize) {
    store.insert(&hamlet()).unwrap();
    store.insert(&hamlet()).unwrap();
    store.insert(&siddhartha()).unwrap();
    (store.size().unwrap(), store.distinct_count().unwrap())
}

#[test]
fn test_backends_agree_through_trait() {
    let memory = MemoryStore::new();
    let sqlite = bookshelf::SqliteLibrary::open_in_memory().unwrap();

    assert_eq!(exercise(&memory), (3, 2));
    assert_eq!(exercise(&sqlite), (3, 2));

    assert_eq!(CatalogStore::copies(&memory, &hamlet().isbn).unwrap(), 2);
    assert_eq!(CatalogStore::copies(&sqlite, &hamlet().isbn).unwrap(), 2);

    assert_eq!(CatalogStore::title_like(&memory, "iddh").unwrap().len(), 1);
    assert_eq!(CatalogStore::title_like(&sqlite, "iddh").unwrap().len(), 1);

    CatalogStore::erase(&memory, &siddhartha().isbn).unwrap();
    assert_eq!(CatalogStore::distinct_count(&memory).unwrap(), 1);
}

/// Run the same searches through the trait, returning hit counts
fn search_counts<S: CatalogStore>(store: &S, needles: &[&str]) -> Vec<(usize, usize)> {
    needles
        .iter()
        .map(|needle| {
            (
                store.title_like(needle).unwrap().len(),
                store.author_like(needle).unwrap().len(),
            )
        })
        .collect()
}

#[test]
fn test_backends_search_with_same_case_rule() {
    let memory = MemoryStore::new();
    let sqlite = bookshelf::SqliteLibrary::open_in_memory().unwrap();

    exercise(&memory);
    exercise(&sqlite);

    let needles = ["william", "WILLIAM", "hAmLeT", "IDDH", "hesse", "nobody"];
    let memory_counts = search_counts(&memory, &needles);
    let sqlite_counts = search_counts(&sqlite, &needles);

    // Memory holds one entry per ISBN, SQLite one row per copy
    let distinct: Vec<(usize, usize)> = sqlite_counts
        .iter()
        .map(|&(title, author)| (title.min(1), author.min(1)))
        .collect();
    assert_eq!(memory_counts, distinct);

    assert_eq!(CatalogStore::author_like(&memory, "william").unwrap().len(), 1);
    assert_eq!(CatalogStore::author_like(&sqlite, "william").unwrap().len(), 2);
}
