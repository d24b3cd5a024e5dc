use super::defaults::DefaultsConfig;
use super::file::{
    ADVANCED_KEYS, FileAdvancedSettings, FileTargetSettings, FileTrajectoryBudget, read_filters,
    read_json,
};
use super::models::AppConfig;
use crate::cli::{RunArgs, StatusArgs};
use crate::error::{CliError, Result};
use bindloop::engine::config::{AdvancedSettings, DesignConfigBuilder, HelicityPolicy};
use std::path::PathBuf;
use tracing::{debug, warn};

pub fn build_config(args: &RunArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let target = FileTargetSettings::from_file(&args.settings)?;
    let (min_length, max_length) = target.length_range()?;

    let (advanced_path, advanced_value) = match &args.advanced {
        Some(path) => (path.clone(), read_json::<serde_json::Value>(path)?),
        None => (PathBuf::from("<defaults>"), serde_json::json!({})),
    };
    let advanced_value = apply_set_values(advanced_value, &args.set_values)?;
    let advanced_file = FileAdvancedSettings::from_value(&advanced_value, &advanced_path)?;

    let filters = match &args.filters {
        Some(path) => read_filters(path)?,
        None => {
            warn!("No filters file given; every candidate will pass the final filters.");
            Default::default()
        }
    };

    let backend_command = split_command(
        args.backend
            .as_deref()
            .or(advanced_file.backend_command.as_deref())
            .unwrap_or(&defaults.backend_command),
    )?;
    let advanced = merge_advanced(advanced_file, &defaults.advanced)?;

    let design = DesignConfigBuilder::new()
        .design_path(target.design_path)
        .binder_name(target.binder_name)
        .starting_pdb(target.starting_pdb)
        .chains(target.chains)
        .target_hotspot_residues(target.target_hotspot_residues)
        .lengths(min_length, max_length)
        .number_of_final_designs(target.number_of_final_designs)
        .advanced(advanced)
        .filters(filters)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?backend_command, seed = ?args.seed, "Configuration assembled.");
    Ok(AppConfig {
        design,
        backend_command,
        backend_settings: advanced_value,
        seed: args.seed,
    })
}

/// The design directory named by `status` arguments, directly or via a target settings file.
pub fn resolve_design_path(args: &StatusArgs) -> Result<PathBuf> {
    match (&args.design_path, &args.settings) {
        (Some(path), _) => Ok(path.clone()),
        (None, Some(settings)) => Ok(FileTargetSettings::from_file(settings)?.design_path),
        (None, None) => Err(CliError::Argument(
            "either --design-path or --settings is required".to_string(),
        )),
    }
}

fn merge_advanced(file: FileAdvancedSettings, defaults: &AdvancedSettings) -> Result<AdvancedSettings> {
    let helicity = merge_helicity(&file, defaults.helicity);
    let max_trajectories = match file.max_trajectories {
        None => defaults.max_trajectories,
        Some(FileTrajectoryBudget::Limit(n)) => Some(n),
        Some(FileTrajectoryBudget::Toggle(false)) => None,
        Some(FileTrajectoryBudget::Toggle(true)) => {
            return Err(CliError::Config(
                "`max_trajectories` must be false or a number of trajectories".to_string(),
            ));
        }
    };

    Ok(AdvancedSettings {
        design_protocol: file
            .design_algorithm
            .unwrap_or_else(|| defaults.design_protocol.clone()),
        helicity,
        max_trajectories,
        max_mpnn_sequences: file.max_mpnn_sequences.unwrap_or(defaults.max_mpnn_sequences),
        num_seqs: file.num_seqs.unwrap_or(defaults.num_seqs),
        sampling_temp: file.sampling_temp.unwrap_or(defaults.sampling_temp),
        enable_mpnn: file.enable_mpnn.unwrap_or(defaults.enable_mpnn),
        stop_after_mpnn_generation: file
            .stop_after_mpnn_generation
            .unwrap_or(defaults.stop_after_mpnn_generation),
        save_mpnn_fasta: file.save_mpnn_fasta.unwrap_or(defaults.save_mpnn_fasta),
        remove_unrelaxed_trajectory: file
            .remove_unrelaxed_trajectory
            .unwrap_or(defaults.remove_unrelaxed_trajectory),
        remove_unrelaxed_complex: file
            .remove_unrelaxed_complex
            .unwrap_or(defaults.remove_unrelaxed_complex),
        remove_binder_monomer: file
            .remove_binder_monomer
            .unwrap_or(defaults.remove_binder_monomer),
        omit_aas: file.omit_aas.unwrap_or_else(|| defaults.omit_aas.clone()),
        binder_chain: file
            .binder_chain
            .unwrap_or_else(|| defaults.binder_chain.clone()),
    })
}

/// `random_helicity` wins over `helicity_range`, which wins over a fixed `weights_helicity`.
fn merge_helicity(file: &FileAdvancedSettings, default: HelicityPolicy) -> HelicityPolicy {
    if file.random_helicity == Some(true) {
        return HelicityPolicy::RandomBiased;
    }
    if let Some([min, max]) = file.helicity_range {
        return HelicityPolicy::Uniform { min, max };
    }
    file.weights_helicity
        .map(HelicityPolicy::Fixed)
        .unwrap_or(default)
}

fn split_command(command: &str) -> Result<Vec<String>> {
    let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        return Err(CliError::Argument("backend command must not be empty".to_string()));
    }
    Ok(parts)
}

/// Applies `KEY=VALUE` overrides to the advanced settings document. Values are
/// read as JSON when they parse as JSON, and as plain strings otherwise.
fn apply_set_values(mut value: serde_json::Value, set_values: &[String]) -> Result<serde_json::Value> {
    if set_values.is_empty() {
        return Ok(value);
    }
    let map = value.as_object_mut().ok_or_else(|| {
        CliError::Config("advanced settings must be a JSON object".to_string())
    })?;
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };
        if !ADVANCED_KEYS.contains(&key) {
            return Err(CliError::Config(format!(
                "Unsupported configuration key for --set: '{}'",
                key
            )));
        }
        let parsed = serde_json::from_str(value_str)
            .unwrap_or_else(|_| serde_json::Value::String(value_str.to_string()));
        map.insert(key.to_string(), parsed);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const TARGET: &str = r#"{
        "design_path": "/designs/pdl1",
        "binder_name": "PDL1",
        "starting_pdb": "/inputs/pdl1.pdb",
        "chains": "A",
        "target_hotspot_residues": "",
        "lengths": [65, 150],
        "number_of_final_designs": 100
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let args = ["bindloop", "run"].iter().chain(extra.iter());
        match Cli::parse_from(args).command {
            Commands::Run(args) => args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn target_settings_alone_build_with_defaults() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);

        let config = build_config(&run_args(&["-s", target.to_str().unwrap()])).unwrap();

        assert_eq!(config.design.target.lengths, (65, 150));
        assert_eq!(config.design.target.target_hotspot_residues, None);
        assert_eq!(config.design.advanced, AdvancedSettings::default());
        assert_eq!(config.backend_command, vec!["bindloop-backend".to_string()]);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn advanced_file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);
        let advanced = write(
            &dir,
            "advanced.json",
            r#"{"design_algorithm": "3stage", "max_trajectories": 40, "random_helicity": true,
                "omit_AAs": "C,M", "backend_command": "python3 serve.py", "use_multimer_design": true}"#,
        );

        let config = build_config(&run_args(&[
            "-s",
            target.to_str().unwrap(),
            "-a",
            advanced.to_str().unwrap(),
        ]))
        .unwrap();

        let advanced = &config.design.advanced;
        assert_eq!(advanced.design_protocol, "3stage");
        assert_eq!(advanced.max_trajectories, Some(40));
        assert_eq!(advanced.helicity, HelicityPolicy::RandomBiased);
        assert_eq!(advanced.omit_aas, "C,M");
        assert_eq!(config.backend_command, vec!["python3", "serve.py"]);
        assert_eq!(config.backend_settings["use_multimer_design"], true);
    }

    #[test]
    fn set_values_and_backend_flag_take_precedence() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);
        let advanced = write(
            &dir,
            "advanced.json",
            r#"{"max_trajectories": 40, "backend_command": "from-file"}"#,
        );

        let config = build_config(&run_args(&[
            "-s",
            target.to_str().unwrap(),
            "-a",
            advanced.to_str().unwrap(),
            "--backend",
            "from-cli --gpu 0",
            "--seed",
            "7",
            "-S",
            "max_trajectories=false",
            "-S",
            "omit_AAs=C,W",
        ]))
        .unwrap();

        assert_eq!(config.design.advanced.max_trajectories, None);
        assert_eq!(config.design.advanced.omit_aas, "C,W");
        assert_eq!(config.backend_command, vec!["from-cli", "--gpu", "0"]);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn unsupported_set_key_is_rejected() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);

        let result = build_config(&run_args(&[
            "-s",
            target.to_str().unwrap(),
            "-S",
            "not_a_setting=1",
        ]));

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("not_a_setting")));
    }

    #[test]
    fn malformed_set_value_is_rejected() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);

        let result = build_config(&run_args(&["-s", target.to_str().unwrap(), "-S", "num_seqs"]));

        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn enabled_budget_without_a_number_is_rejected() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);

        let result = build_config(&run_args(&[
            "-s",
            target.to_str().unwrap(),
            "-S",
            "max_trajectories=true",
        ]));

        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_design_settings_surface_as_config_errors() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", &TARGET.replace("100", "0"));

        let result = build_config(&run_args(&["-s", target.to_str().unwrap()]));

        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("number_of_final_designs")));
    }

    #[test]
    fn helicity_range_maps_to_uniform_policy() {
        let file = FileAdvancedSettings {
            helicity_range: Some([-1.0, 0.5]),
            weights_helicity: Some(-0.3),
            ..Default::default()
        };
        assert_eq!(
            merge_helicity(&file, HelicityPolicy::default()),
            HelicityPolicy::Uniform { min: -1.0, max: 0.5 }
        );

        let fixed = FileAdvancedSettings {
            weights_helicity: Some(-0.3),
            ..Default::default()
        };
        assert_eq!(merge_helicity(&fixed, HelicityPolicy::default()), HelicityPolicy::Fixed(-0.3));
    }

    #[test]
    fn status_design_path_resolves_from_settings_file() {
        let dir = tempdir().unwrap();
        let target = write(&dir, "target.json", TARGET);

        let args = StatusArgs {
            design_path: None,
            settings: Some(target),
        };
        assert_eq!(resolve_design_path(&args).unwrap(), PathBuf::from("/designs/pdl1"));

        let direct = StatusArgs {
            design_path: Some(PathBuf::from("/elsewhere")),
            settings: None,
        };
        assert_eq!(resolve_design_path(&direct).unwrap(), PathBuf::from("/elsewhere"));
    }
}
