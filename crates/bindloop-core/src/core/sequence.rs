//! Sequence-level checks attached to every scored design as free-text notes.

use std::collections::BTreeSet;

const WATER_MASS: f64 = 18.01524;
const TRP_EXTINCTION: f64 = 5500.0;
const TYR_EXTINCTION: f64 = 1490.0;
/// Reduced extinction per mg/mL at or below which a design is hard to quantify at 280 nm.
pub const LOW_ABSORPTION_THRESHOLD: f64 = 2.0;

fn residue_mass(aa: char) -> Option<f64> {
    let mass = match aa {
        'A' => 89.0932,
        'C' => 121.1582,
        'D' => 133.1027,
        'E' => 147.1293,
        'F' => 165.1891,
        'G' => 75.0666,
        'H' => 155.1546,
        'I' => 131.1729,
        'K' => 146.1876,
        'L' => 131.1729,
        'M' => 149.2113,
        'N' => 132.1179,
        'O' => 255.3134,
        'P' => 115.1305,
        'Q' => 146.1445,
        'R' => 174.201,
        'S' => 105.0926,
        'T' => 119.1192,
        'U' => 168.0532,
        'V' => 117.1463,
        'W' => 204.2252,
        'Y' => 181.1885,
        _ => return None,
    };
    Some(mass)
}

/// Average molecular weight of a protein sequence in Daltons.
///
/// Unknown residue letters are skipped.
pub fn molecular_weight(sequence: &str) -> f64 {
    let masses: Vec<f64> = sequence
        .chars()
        .filter_map(|c| residue_mass(c.to_ascii_uppercase()))
        .collect();
    if masses.is_empty() {
        return 0.0;
    }
    masses.iter().sum::<f64>() - (masses.len() - 1) as f64 * WATER_MASS
}

/// Molar extinction coefficient at 280 nm with all cysteines reduced.
pub fn extinction_coefficient(sequence: &str) -> f64 {
    let upper = sequence.to_ascii_uppercase();
    let trp = upper.matches('W').count() as f64;
    let tyr = upper.matches('Y').count() as f64;
    trp * TRP_EXTINCTION + tyr * TYR_EXTINCTION
}

/// Extinction per mg/mL, rounded to two decimals.
pub fn absorption_per_mg(sequence: &str) -> f64 {
    let kda = round_to(molecular_weight(sequence) / 1000.0, 2);
    if kda <= 0.0 {
        return 0.0;
    }
    round_to(extinction_coefficient(sequence) / kda * 0.01, 2)
}

/// Parses a comma-separated residue list such as `"C, m"` into upper-case letters.
pub fn parse_omitted(omit_aas: &str) -> BTreeSet<char> {
    omit_aas
        .split(',')
        .filter_map(|aa| aa.trim().chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Builds the note string of a design.
///
/// # Arguments
///
/// * `sequence` - The binder sequence.
/// * `relaxed_clashes` - Clash count of the relaxed structure, if it was relaxed.
/// * `omitted` - Residues that should not appear in the design.
///
/// # Return
///
/// Space-separated notes, empty when nothing is worth flagging.
pub fn design_notes(sequence: &str, relaxed_clashes: Option<u32>, omitted: &BTreeSet<char>) -> String {
    let mut notes = Vec::new();

    if relaxed_clashes.is_some_and(|c| c > 0) {
        notes.push("Relaxed structure contains clashes.".to_string());
    }

    let upper = sequence.to_ascii_uppercase();
    for aa in omitted {
        if upper.contains(*aa) {
            notes.push(format!("Contains: {}!", aa));
        }
    }

    let absorption = absorption_per_mg(sequence);
    if absorption <= LOW_ABSORPTION_THRESHOLD {
        notes.push(format!(
            "Absorption value is {}, consider adding tryptophane to design.",
            absorption
        ));
    }

    notes.join(" ")
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molecular_weight_subtracts_one_water_per_bond() {
        let single = molecular_weight("G");
        assert!((single - 75.0666).abs() < 1e-9);

        let dipeptide = molecular_weight("GA");
        assert!((dipeptide - (75.0666 + 89.0932 - WATER_MASS)).abs() < 1e-9);
        assert_eq!(molecular_weight(""), 0.0);
    }

    #[test]
    fn extinction_counts_tryptophan_and_tyrosine() {
        assert_eq!(extinction_coefficient("AWWY"), 2.0 * 5500.0 + 1490.0);
        assert_eq!(extinction_coefficient("AAAA"), 0.0);
    }

    #[test]
    fn notes_flag_clashes_omitted_residues_and_low_absorption() {
        let omitted = parse_omitted("C, m");
        let notes = design_notes("ACDEFGHIKLMN", Some(2), &omitted);

        assert!(notes.starts_with("Relaxed structure contains clashes."));
        assert!(notes.contains("Contains: C!"));
        assert!(notes.contains("Contains: M!"));
        assert!(notes.contains("Absorption value is 0"));
    }

    #[test]
    fn well_behaved_sequence_has_no_notes() {
        let notes = design_notes("WWWWAAAA", Some(0), &BTreeSet::new());
        assert_eq!(notes, "");
    }

    #[test]
    fn parse_omitted_ignores_blanks() {
        let omitted = parse_omitted("C,, ");
        assert_eq!(omitted.into_iter().collect::<Vec<_>>(), vec!['C']);
    }
}
