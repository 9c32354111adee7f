//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Pairwise file comparison by size, modification time and content hash
//! - Name-keyed duplicate resolution across one or two scanned trees

pub mod comparator;
pub mod resolver;

pub use comparator::{Criterion, FileComparator, MetadataComparator};
pub use resolver::{resolve, Resolver, RootTag};
