use crate::core::models::design::SequenceCandidate;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes one record per candidate, headed by its design name.
pub fn write_fasta<W: Write>(writer: &mut W, candidates: &[SequenceCandidate]) -> io::Result<()> {
    for candidate in candidates {
        writeln!(writer, ">{}", candidate.design_name())?;
        writeln!(writer, "{}", candidate.sequence)?;
    }
    Ok(())
}

pub fn write_fasta_file(path: &Path, candidates: &[SequenceCandidate]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_fasta(&mut writer, candidates)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn candidate(index: usize, sequence: &str) -> SequenceCandidate {
        SequenceCandidate {
            parent_design_name: "PDL1_l72_s7".to_string(),
            index,
            sequence: sequence.to_string(),
            score: 0.9,
        }
    }

    #[test]
    fn writes_header_and_sequence_lines() {
        let mut buffer = Vec::new();
        write_fasta(&mut buffer, &[candidate(0, "MKV"), candidate(1, "WWA")]).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, ">PDL1_l72_s7_mpnn_0\nMKV\n>PDL1_l72_s7_mpnn_1\nWWA\n");
    }

    #[test]
    fn file_variant_creates_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("PDL1_l72_s7.fasta");
        write_fasta_file(&path, &[candidate(0, "MKV")]).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().starts_with(">PDL1"));
    }
}
