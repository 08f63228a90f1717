//! Bionic reading for HTML documents.
//!
//! Bolds the leading half of every word in readable text near the viewport,
//! and can restore the page to its original text at any time.

pub mod app;

pub use app::{
    BionicConfig, BionicError, BionicPage, BionicTransformer, Command, Document, JsonPreferenceStore,
    MemoryPreferenceStore, PageEvent, Phase, PreferenceStore, Result, UserOptions,
};
