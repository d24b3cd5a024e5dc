//! # Core Module
//!
//! The stateless foundation of the design loop: data models, threshold filters,
//! the append-only metrics ledger, the on-disk directory layout and
//! sequence-level checks.
//!
//! ## Architecture
//!
//! - **Data Model** ([`models`]) - Trajectory specs, sequence candidates and the metric bundles
//!   reported by external collaborators
//! - **Filtering** ([`filters`]) - Per-column constraints grouped into the initial and final filters
//! - **Persistence** ([`ledger`]) - Fixed-schema CSV tables keyed by design name
//! - **Directory Layout** ([`layout`]) - The named artifact directories of a run, doubling as the
//!   deduplication index
//! - **Sequence Analysis** ([`sequence`]) - Molecular weight, extinction and design notes
//! - **File I/O** ([`io`]) - FASTA output of candidate sequences

pub mod filters;
pub mod io;
pub mod layout;
pub mod ledger;
pub mod models;
pub mod sequence;
