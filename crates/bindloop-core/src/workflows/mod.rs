//! # Workflows Module
//!
//! Top-level entry points that tie the `engine` and `core` layers together.
//!
//! - **Design Workflow** ([`design`]) - Prepares the design directory and ledger, runs the
//!   scheduler until the quota or the trajectory budget is reached, and ranks the accepted designs.

pub mod design;
