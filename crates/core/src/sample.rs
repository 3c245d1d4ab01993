//! Bundled sample book
//!
//! Used when no book file is supplied, and as a fixture in tests.

use crate::types::{AudioRef, Book, BookId, CoverRef, KeyPoint, KeyPointId};

const SAMPLE_BOOK_ID: u64 = 1;
const SAMPLE_BASE_ID: u64 = 173308550;

const SAMPLE_TITLES: [&str; 5] = [
    "Why small habits compound",
    "Make it obvious",
    "Make it attractive",
    "Make it easy",
    "Make it satisfying",
];

/// Returns the bundled five key point summary
pub fn sample_book() -> Book {
    let key_points = SAMPLE_TITLES
        .iter()
        .enumerate()
        .map(|(index, title)| {
            let number = index as u64 + 1;
            KeyPoint::new(
                KeyPointId::new(SAMPLE_BASE_ID * 10 + number),
                index as u32,
                *title,
                AudioRef::new(format!("raw/keypoint_{}_{}", SAMPLE_BASE_ID, number)),
            )
        })
        .collect();

    Book::new(
        BookId::new(SAMPLE_BOOK_ID),
        "Atomic Habits",
        CoverRef::new(format!("raw/logo_{}", SAMPLE_BASE_ID)),
        key_points,
    )
}
