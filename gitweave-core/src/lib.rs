//! gitweave core library: record predicates, normalization, and edge derivation.
//!
//! Commit records arrive already parsed ([`types::CommitRecord`]). The
//! [`log::CommitLog`] collection filters them with [`predicate`] functions,
//! annotates them with [`date`] and [`domain`] helpers, and turns them into
//! network edges and nodes via [`edges`]. Writers in [`export`] serialize the
//! result.

pub mod classify;
pub mod config;
pub mod date;
pub mod domain;
pub mod edges;
pub mod error;
pub mod export;
pub mod frequency;
pub mod log;
pub mod predicate;
pub mod stat;
pub mod types;
