//! Domain layer - core data structures and types.
//!
//! This module contains the fundamental domain models:
//! - The arena document and its layout model
//! - Engine configuration and reserved tag names
//! - Commands and page events
//! - Render state

pub mod document;
pub mod messages;
pub mod render_state;
pub mod settings;

pub use document::{Document, NodeId, NodeKind, Rect, Viewport};
pub use messages::{Command, InboundMessage, MessageResponse, PageEvent, PageEventKind};
pub use render_state::{Phase, RenderState};
pub use settings::{BionicConfig, LayoutMetrics, RootStrategy, EXT_NAME, FONT_TAG, WORD_TAG};
