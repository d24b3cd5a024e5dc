//! # Core Models Module
//!
//! This module contains the plain data structures exchanged between the design
//! loop and its external collaborators.
//!
//! ## Overview
//!
//! The models describe what is known about a design at each stage of its
//! lifecycle. They carry no behaviour beyond naming conventions and simple
//! accessors, and they are designed to:
//!
//! - **Name designs deterministically** - The same sampled parameters always yield the same name
//! - **Tolerate partial results** - Every confidence metric is optional with a defined default
//! - **Serialize cleanly** - All collaborator-facing types round-trip through JSON
//!
//! ## Key Components
//!
//! - [`design`] - Sampled trajectory parameters and redesigned sequence candidates
//! - [`metrics`] - Confidence metrics, termination signals and structural scores
//!
//! ## Usage
//!
//! ```ignore
//! use bindloop::core::models::design::TrajectorySpec;
//!
//! let spec = TrajectorySpec::new("PDL1", 72, 4242, 0.0, "A", None);
//! assert_eq!(spec.design_name(), "PDL1_l72_s4242");
//! ```

pub mod design;
pub mod metrics;
