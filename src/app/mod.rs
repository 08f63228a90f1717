//! Application layer - organized by Clean Architecture principles.
//!
//! # Structure
//!
//! - `domain/` - Core data structures (Document, BionicConfig, Commands, RenderState)
//! - `controllers/` - Orchestration (RenderController, ToggleController, Debouncer)
//! - `services/` - Business operations (eligibility, bionic transform, scanner, style, markup)
//! - `infrastructure/` - External integrations (preference storage, logging, error)
//! - `state.rs` - Per-page coordinator

pub mod controllers;
pub mod domain;
pub mod infrastructure;
pub mod services;
pub mod state;

// Re-exports for convenient external access
pub use controllers::render::{RenderController, RenderReport};
pub use controllers::toggle::ToggleController;
pub use domain::{BionicConfig, Command, Document, NodeId, PageEvent, Phase, RenderState, RootStrategy};
pub use infrastructure::error::{BionicError, Result};
pub use infrastructure::preferences::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore, UserOptions};
pub use services::BionicTransformer;
pub use state::BionicPage;
