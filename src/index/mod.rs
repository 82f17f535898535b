//! Search index subsystem
//!
//! The index is a derived, eventually consistent copy of the repository: it
//! answers queries with object ids and denormalized fields, never with full
//! objects.
//!
//! # Contents
//!
//! - `query`: the backend query algebra and its textual rendering
//! - `search`: the [`SearchIndex`] interface the engine calls
//! - `fields`: the read-side field names the translator depends on
//! - `memory`: an in-memory implementation of [`SearchIndex`]

mod errors;
pub mod fields;
mod memory;
mod query;
mod search;

pub use errors::{IndexError, IndexResult};
pub use memory::{IndexedDocument, MemoryIndex};
pub use query::{escape_term, unescape_term, BackendQuery, Clause, IndexValue, Occur};
pub use search::{SearchHit, SearchIndex, SearchRequest, SearchResponse, SortField};
