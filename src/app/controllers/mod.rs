//! Controllers layer - orchestration and coordination.
//!
//! This module contains controllers that coordinate between
//! domain models, services, and the page:
//! - Debounced render passes
//! - The on/off toggle state machine

pub mod debounce;
pub mod render;
pub mod toggle;
