//! # BindLoop Core Library
//!
//! A resumable control loop for generative binder design: it samples design
//! trajectories, redesigns their sequences, scores every candidate against
//! threshold filters and persists the outcome until a target number of designs
//! is accepted or a trajectory budget runs out.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models, filter constraints, the
//!   append-only metrics ledger and the design directory layout.
//!
//! - **[`engine`]: The Logic Core.** The trajectory scheduler, the sequence-redesign
//!   sub-loop, termination and deduplication against on-disk state, and the
//!   collaborator traits through which structure generation, prediction and
//!   relaxation are reached.
//!
//! - **[`workflows`]: The Public API.** A single entry point that runs a complete
//!   design campaign from a [`engine::config::DesignConfig`].

pub mod core;
pub mod engine;
pub mod workflows;
