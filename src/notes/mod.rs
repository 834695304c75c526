//! Notes module for Tagnotes
//!
//! Provides tag sanitization, per-tag note persistence, tag extraction,
//! relevance selection, and note composition.

mod book;
mod composer;
mod extractor;
mod record;
mod sanitize;
mod selector;
mod store;
mod window;

pub use book::Notebook;
pub use composer::{NoteComposer, NO_PREVIOUS_NOTE};
pub use extractor::{TagExtractor, MAX_TAG_CHARS};
pub use record::NoteRecord;
pub use sanitize::{sanitize_tag, FALLBACK_TAG, MAX_KEY_CHARS};
pub use selector::{RelevanceSelector, NONE_SENTINEL};
pub use store::{FileNoteStore, NoteStore};
pub use window::{cap_words, trailing_window, word_count};
