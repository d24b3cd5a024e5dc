/// Column every table is keyed by.
pub const DESIGN_COLUMN: &str = "design";

/// The fixed, ordered column set of a ledger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl Schema {
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

const TRAJECTORY_COLUMNS: &[&str] = &[
    DESIGN_COLUMN,
    "protocol",
    "length",
    "seed",
    "helicity",
    "target_hotspot",
    "sequence",
    "interface_residues",
    "plddt",
    "ptm",
    "i_ptm",
    "pae",
    "i_pae",
    "i_plddt",
    "ss_plddt",
    "unrelaxed_clashes",
    "relaxed_clashes",
    "binder_score",
    "surface_hydrophobicity",
    "interface_sc",
    "interface_packstat",
    "interface_dG",
    "interface_dSASA",
    "interface_dG_SASA_ratio",
    "interface_hb_bb_sc",
    "interface_hb_sc_sc",
    "interface_hb_bb_bb_longrange",
    "interface_hb_bb_bb_shortrange",
    "binder_helix",
    "binder_sheet",
    "binder_loop",
    "interface_helix",
    "interface_sheet",
    "interface_loop",
    "notes",
    "helix_probability",
    "target_rmsd",
    "trajectory_time",
    "termination",
];

const DESIGN_COLUMNS: &[&str] = &[
    DESIGN_COLUMN,
    "protocol",
    "length",
    "seed",
    "helicity",
    "target_hotspot",
    "sequence",
    "interface_residues",
    "mpnn_score",
    "plddt",
    "ptm",
    "i_ptm",
    "pae",
    "i_pae",
    "i_plddt",
    "ss_plddt",
    "unrelaxed_clashes",
    "relaxed_clashes",
    "binder_score",
    "surface_hydrophobicity",
    "interface_sc",
    "interface_packstat",
    "interface_dG",
    "interface_dSASA",
    "interface_dG_SASA_ratio",
    "interface_hb_bb_sc",
    "interface_hb_sc_sc",
    "interface_hb_bb_bb_longrange",
    "interface_hb_bb_bb_shortrange",
    "binder_helix",
    "binder_sheet",
    "binder_loop",
    "interface_helix",
    "interface_sheet",
    "interface_loop",
    "monomer_plddt",
    "monomer_ptm",
    "monomer_pae",
    "binder_rmsd",
    "interface_rmsd",
    "target_rmsd",
    "notes",
    "helix_probability",
];

const FAILURE_COLUMNS: &[&str] = &[
    DESIGN_COLUMN,
    "stage",
    "metric",
    "observed",
    "constraint",
    "reason",
];

/// One row per generated trajectory.
pub const TRAJECTORY: Schema = Schema {
    name: "trajectory",
    columns: TRAJECTORY_COLUMNS,
};

/// One row per validated sequence candidate.
pub const DESIGN: Schema = Schema {
    name: "design",
    columns: DESIGN_COLUMNS,
};

/// One row per accepted candidate; rows are copies of [`DESIGN`] rows.
pub const ACCEPTED: Schema = Schema {
    name: "accepted",
    columns: DESIGN_COLUMNS,
};

/// One row per rejection, for after-the-fact rejection statistics.
pub const FAILURE: Schema = Schema {
    name: "failure",
    columns: FAILURE_COLUMNS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_schema_is_keyed_by_design_first() {
        for schema in [TRAJECTORY, DESIGN, ACCEPTED, FAILURE] {
            assert_eq!(schema.columns[0], DESIGN_COLUMN, "{}", schema.name);
        }
    }

    #[test]
    fn column_names_are_unique() {
        for schema in [TRAJECTORY, DESIGN, FAILURE] {
            let unique: HashSet<_> = schema.columns.iter().collect();
            assert_eq!(unique.len(), schema.columns.len(), "{}", schema.name);
        }
    }

    #[test]
    fn accepted_rows_share_the_design_columns() {
        assert_eq!(ACCEPTED.columns, DESIGN.columns);
        assert!(DESIGN.contains("interface_dG"));
        assert!(!TRAJECTORY.contains("mpnn_score"));
    }
}
