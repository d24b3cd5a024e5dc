//! # Engine Module
//!
//! The stateful layer that drives a design run against persisted state.
//!
//! ## Overview
//!
//! The [`scheduler`] owns the outer loop. On every iteration it asks the
//! [`termination`] policy whether to stop, samples a new trajectory
//! ([`sampling`]), skips it if [`dedup`] finds prior artifacts, and otherwise
//! generates, relaxes and scores it ([`scoring`]) before handing the backbone
//! to the sequence-redesign sub-loop ([`redesign`]). Once the quota of accepted
//! designs is met, [`ranking`] orders them.
//!
//! All external models are reached through the traits in [`collaborators`].
//! Configuration lives in [`config`], errors in [`error`] and progress
//! events in [`progress`].

pub mod collaborators;
pub mod config;
pub mod dedup;
pub mod error;
pub mod progress;
pub mod ranking;
pub mod redesign;
pub mod sampling;
pub mod scheduler;
pub mod scoring;
pub mod termination;
