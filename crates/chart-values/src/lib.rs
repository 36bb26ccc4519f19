//! Chart values reconciliation and basic-form synthesis.
//!
//! This crate is the engine behind a deployment form: it keeps a YAML values
//! document in sync with a form generated from the chart's values schema,
//! and carries a user's customizations forward when they switch between
//! chart versions or upgrade a deployed release.
//!
//! The pieces, bottom up:
//!
//! - [`path`] / [`document`]: a path-addressed editor over immutable YAML
//!   document snapshots.
//! - [`schema`] / [`form`]: synthesis of an ordered field list from a
//!   restricted JSON Schema fragment and the current document.
//! - [`modification`]: structural diff between two documents, and replay of
//!   such a diff onto a different base.
//! - [`session`]: the state machine tying it all together across version
//!   changes, user edits and restore actions.
//! - [`repository`]: the async fetch interface the surrounding console
//!   implements.

pub mod document;
pub mod form;
pub mod modification;
pub mod path;
pub mod repository;
pub mod schema;
pub mod session;
