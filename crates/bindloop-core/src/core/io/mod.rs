//! Output formats for sequence candidates.

pub mod fasta;
