//! Page type and layout.
//!
//! This module contains [`Page`], the raw 4KB data container every frame
//! owns and every block transfer moves.

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
