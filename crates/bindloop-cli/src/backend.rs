//! Collaborators served by an external program.
//!
//! Every call spawns the configured command with the operation name appended
//! as its last argument, writes one JSON envelope to its stdin and reads one
//! JSON response from its stdout:
//!
//! ```text
//! stdin:  {"operation": "predict_complex", "settings": {...}, "request": {...}}
//! stdout: {"metrics": {...}, "structure_path": "..."}
//! ```
//!
//! Predictions answer `null` when the model produced nothing. A non-zero exit
//! status fails the call with the program's stderr.

use bindloop::core::models::design::SequenceCandidate;
use bindloop::core::models::metrics::{
    InterfaceAnalysis, Prediction, SecondaryStructure, TrajectoryResult,
};
use bindloop::engine::collaborators::{
    CollaboratorError, GenerationRequest, PredictionRequest, RedesignRequest, SequenceRedesigner,
    StructureAnalyzer, StructureGenerator, StructurePredictor,
};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, instrument, trace};

#[derive(Serialize)]
struct Envelope<'a, Req> {
    operation: &'a str,
    settings: &'a serde_json::Value,
    request: &'a Req,
}

#[derive(Serialize)]
struct RelaxRequest<'a> {
    input: &'a Path,
    output: &'a Path,
}

#[derive(Serialize)]
struct StructureRequest<'a> {
    structure: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    binder_chain: Option<&'a str>,
}

#[derive(Serialize)]
struct RmsdRequest<'a> {
    mobile: &'a Path,
    reference: &'a Path,
    chains: &'a str,
}

pub struct ProcessBackend {
    program: String,
    args: Vec<String>,
    settings: serde_json::Value,
}

impl ProcessBackend {
    /// `command` holds the program followed by its leading arguments.
    pub fn new(command: &[String], settings: serde_json::Value) -> Result<Self, CollaboratorError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| CollaboratorError::Unavailable {
                name: "backend".to_string(),
                reason: "no backend command configured".to_string(),
            })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            settings,
        })
    }

    #[instrument(skip_all, name = "backend_call", fields(operation = operation))]
    fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, CollaboratorError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let envelope = serde_json::to_vec(&Envelope {
            operation,
            settings: &self.settings,
            request,
        })
        .map_err(|e| CollaboratorError::Protocol {
            operation: operation.to_string(),
            message: format!("cannot encode request: {}", e),
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    CollaboratorError::Unavailable {
                        name: self.program.clone(),
                        reason: e.to_string(),
                    }
                }
                _ => CollaboratorError::Failed {
                    operation: operation.to_string(),
                    message: format!("cannot start '{}': {}", self.program, e),
                },
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&envelope)
                .map_err(|e| CollaboratorError::Failed {
                    operation: operation.to_string(),
                    message: format!("cannot write request: {}", e),
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| CollaboratorError::Failed {
                operation: operation.to_string(),
                message: format!("cannot read response: {}", e),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(CollaboratorError::Failed {
                operation: operation.to_string(),
                message: format!("backend exited with {}: {}", output.status, stderr.trim()),
            });
        }
        if !stderr.trim().is_empty() {
            debug!(stderr = %stderr.trim(), "Backend diagnostics");
        }
        trace!(bytes = output.stdout.len(), "Backend response received.");

        serde_json::from_slice(&output.stdout).map_err(|e| CollaboratorError::Protocol {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

impl StructureGenerator for ProcessBackend {
    fn generate(&self, request: &GenerationRequest) -> Result<TrajectoryResult, CollaboratorError> {
        self.call("generate", request)
    }
}

impl SequenceRedesigner for ProcessBackend {
    fn redesign(&self, request: &RedesignRequest) -> Result<Vec<SequenceCandidate>, CollaboratorError> {
        self.call("redesign", request)
    }
}

impl StructurePredictor for ProcessBackend {
    fn predict_complex(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError> {
        self.call("predict_complex", request)
    }

    fn predict_binder(&self, request: &PredictionRequest) -> Result<Option<Prediction>, CollaboratorError> {
        self.call("predict_binder", request)
    }
}

impl StructureAnalyzer for ProcessBackend {
    fn relax(&self, input: &Path, output: &Path) -> Result<(), CollaboratorError> {
        self.call::<_, IgnoredAny>("relax", &RelaxRequest { input, output })?;
        Ok(())
    }

    fn clash_count(&self, structure: &Path) -> Result<u32, CollaboratorError> {
        self.call(
            "clash_count",
            &StructureRequest {
                structure,
                binder_chain: None,
            },
        )
    }

    fn secondary_structure(
        &self,
        structure: &Path,
        binder_chain: &str,
    ) -> Result<SecondaryStructure, CollaboratorError> {
        self.call(
            "secondary_structure",
            &StructureRequest {
                structure,
                binder_chain: Some(binder_chain),
            },
        )
    }

    fn interface_scores(
        &self,
        structure: &Path,
        binder_chain: &str,
    ) -> Result<InterfaceAnalysis, CollaboratorError> {
        self.call(
            "interface_scores",
            &StructureRequest {
                structure,
                binder_chain: Some(binder_chain),
            },
        )
    }

    fn target_rmsd(
        &self,
        structure: &Path,
        reference: &Path,
        target_chains: &str,
    ) -> Result<f64, CollaboratorError> {
        self.call(
            "target_rmsd",
            &RmsdRequest {
                mobile: structure,
                reference,
                chains: target_chains,
            },
        )
    }

    fn binder_rmsd(
        &self,
        complex: &Path,
        monomer: &Path,
        binder_chain: &str,
    ) -> Result<f64, CollaboratorError> {
        self.call(
            "binder_rmsd",
            &RmsdRequest {
                mobile: complex,
                reference: monomer,
                chains: binder_chain,
            },
        )
    }

    fn interface_rmsd(
        &self,
        trajectory: &Path,
        complex: &Path,
        binder_chain: &str,
    ) -> Result<f64, CollaboratorError> {
        self.call(
            "interface_rmsd",
            &RmsdRequest {
                mobile: complex,
                reference: trajectory,
                chains: binder_chain,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script_backend(script: &str) -> ProcessBackend {
        let command = vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        ProcessBackend::new(&command, serde_json::json!({"use_multimer_design": true})).unwrap()
    }

    fn prediction_request() -> PredictionRequest {
        PredictionRequest {
            design_name: "PDL1_l72_s1_mpnn1".to_string(),
            sequence: "MKV".to_string(),
            starting_pdb: PathBuf::from("/inputs/pdl1.pdb"),
            target_chains: "A".to_string(),
            output_path: PathBuf::from("/tmp/out.pdb"),
        }
    }

    #[test]
    fn empty_command_is_unavailable() {
        let result = ProcessBackend::new(&[], serde_json::Value::Null);
        assert!(matches!(result, Err(CollaboratorError::Unavailable { .. })));
    }

    #[test]
    fn missing_program_is_unavailable() {
        let backend = ProcessBackend::new(
            &["bindloop-backend-that-does-not-exist".to_string()],
            serde_json::Value::Null,
        )
        .unwrap();

        let result = backend.clash_count(Path::new("x.pdb"));
        assert!(matches!(result, Err(CollaboratorError::Unavailable { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn response_is_decoded_from_stdout() {
        let backend = script_backend("cat > /dev/null; echo 7");
        assert_eq!(backend.clash_count(Path::new("x.pdb")).unwrap(), 7);
    }

    #[cfg(unix)]
    #[test]
    fn operation_name_is_passed_as_last_argument() {
        // With `sh -c`, the first argument after the script becomes `$0`.
        let backend = script_backend(r#"cat > /dev/null; printf '%s' "$0" | wc -c"#);
        let length: f64 = backend
            .target_rmsd(Path::new("a.pdb"), Path::new("b.pdb"), "A")
            .unwrap();
        assert_eq!(length, "target_rmsd".len() as f64);
    }

    #[cfg(unix)]
    #[test]
    fn envelope_carries_settings_and_request() {
        let backend = script_backend(
            r#"input=$(cat); case "$input" in *use_multimer_design*PDL1_l72_s1_mpnn1*) echo null;; *) exit 3;; esac"#,
        );
        assert_eq!(backend.predict_complex(&prediction_request()).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn prediction_is_decoded_when_present() {
        let backend = script_backend(
            r#"cat > /dev/null; echo '{"metrics": {"plddt": 0.91}, "structure_path": "/tmp/out.pdb"}'"#,
        );
        let prediction = backend.predict_binder(&prediction_request()).unwrap().unwrap();
        assert_eq!(prediction.structure_path, PathBuf::from("/tmp/out.pdb"));
        assert_eq!(prediction.metrics.plddt, Some(0.91));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_reports_stderr() {
        let backend = script_backend("cat > /dev/null; echo 'model weights missing' >&2; exit 2");
        match backend.relax(Path::new("in.pdb"), Path::new("out.pdb")) {
            Err(CollaboratorError::Failed { operation, message }) => {
                assert_eq!(operation, "relax");
                assert!(message.contains("model weights missing"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn malformed_response_is_a_protocol_error() {
        let backend = script_backend("cat > /dev/null; echo not-json");
        let result = backend.secondary_structure(Path::new("x.pdb"), "B");
        assert!(matches!(result, Err(CollaboratorError::Protocol { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn relax_accepts_any_json_acknowledgement() {
        let backend = script_backend(r#"cat > /dev/null; echo '{"ok": true}'"#);
        backend.relax(Path::new("in.pdb"), Path::new("out.pdb")).unwrap();
    }
}
