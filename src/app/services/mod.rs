//! Services layer - business operations and utilities.
//!
//! This module contains business logic and operations:
//! - Eligibility filtering of text nodes
//! - The bionic text transform
//! - Tree scanning and root resolution
//! - Style injection
//! - Wrapping and sanitizing transformed units
//! - HTML and Markdown loading

pub mod bionic;
pub mod eligibility;
pub mod markup;
pub mod scanner;
pub mod style;
pub mod units;

pub use bionic::BionicTransformer;
pub use eligibility::{Decision, EligibilityFilter, RejectReason};
pub use style::StyleWrite;
