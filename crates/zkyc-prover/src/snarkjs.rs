//! Groth16 backend that shells out to the `snarkjs` CLI.
//!
//! Each call works in its own scratch directory under the system temp dir,
//! removed when the call returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use uuid::Uuid;

use zkyc_core::{
    BackendError, CircuitId, CircuitInputs, CircuitProver, FieldElement, Groth16Proof,
    PredicateKind, ProofVerifier, ProverOutput, VerificationKey,
};

use crate::assembler::circuit_of;

/// Compiled artifacts for one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitArtifacts {
    /// Witness generator (`<circuit>.wasm`).
    pub wasm: PathBuf,
    /// Proving key (`<circuit>_final.zkey`).
    pub zkey: PathBuf,
    /// Verification key (`verification_key.json`).
    pub vkey: PathBuf,
}

/// State-equality artifacts compiled for one required state code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCircuitArtifacts {
    pub required_state: u32,
    #[serde(flatten)]
    pub artifacts: CircuitArtifacts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsConfig {
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    pub age_threshold: CircuitArtifacts,
    /// One compiled circuit per offered state. States without an entry
    /// cannot be requested.
    #[serde(default)]
    pub state_equality: Vec<StateCircuitArtifacts>,
}

fn default_binary() -> PathBuf {
    PathBuf::from("snarkjs")
}

impl SnarkjsConfig {
    pub fn artifacts(&self, circuit: CircuitId) -> Result<&CircuitArtifacts, BackendError> {
        match (circuit.kind, circuit.required_state) {
            (PredicateKind::AgeThreshold, _) => Ok(&self.age_threshold),
            (PredicateKind::StateEquality, Some(state)) => self
                .state_equality
                .iter()
                .find(|entry| entry.required_state == state)
                .map(|entry| &entry.artifacts)
                .ok_or_else(|| BackendError::MissingArtifact(format!("no artifacts for {}", circuit))),
            (PredicateKind::StateEquality, None) => Err(BackendError::MissingArtifact(
                "state-equality circuit without a required state".into(),
            )),
        }
    }

    /// Every circuit with configured artifacts.
    pub fn circuits(&self) -> Vec<CircuitId> {
        std::iter::once(CircuitId::age_threshold())
            .chain(
                self.state_equality
                    .iter()
                    .map(|entry| CircuitId::state_equality(entry.required_state)),
            )
            .collect()
    }
}

pub struct SnarkjsBackend {
    config: SnarkjsConfig,
}

impl SnarkjsBackend {
    pub fn new(config: SnarkjsConfig) -> Self {
        Self { config }
    }

    /// Read a circuit's `verification_key.json`.
    pub fn load_verification_key(&self, circuit: CircuitId) -> Result<VerificationKey, BackendError> {
        let path = &self.config.artifacts(circuit)?.vkey;
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BackendError::MissingArtifact(format!("{}: {}", path.display(), e)))?;
        let key: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Malformed(format!("{}: {}", path.display(), e)))?;
        Ok(VerificationKey::new(circuit, key))
    }

    pub fn load_verification_keys(&self) -> Result<Vec<VerificationKey>, BackendError> {
        self.config
            .circuits()
            .into_iter()
            .map(|circuit| self.load_verification_key(circuit))
            .collect()
    }

    fn ensure_exists(path: &Path) -> Result<(), BackendError> {
        if path.exists() {
            Ok(())
        } else {
            Err(BackendError::MissingArtifact(path.display().to_string()))
        }
    }

    async fn run(&self, args: &[&OsStr]) -> Result<String, BackendError> {
        let output = Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Process(format!(
                "snarkjs exited with {}: {}{}",
                output.status,
                stderr.trim(),
                stdout.trim()
            )));
        }
        Ok(stdout)
    }

    async fn prove_in(
        &self,
        dir: &Path,
        kind: PredicateKind,
        inputs: &CircuitInputs,
    ) -> Result<ProverOutput, BackendError> {
        let circuit = circuit_of(kind, inputs)?;
        let artifacts = self.config.artifacts(circuit)?;
        Self::ensure_exists(&artifacts.wasm)?;
        Self::ensure_exists(&artifacts.zkey)?;

        let input_path = dir.join("input.json");
        let witness_path = dir.join("witness.wtns");
        let proof_path = dir.join("proof.json");
        let public_path = dir.join("public.json");

        // The required state is compiled into the circuit, not a witness input.
        let mut inputs = inputs.clone();
        inputs.remove("requiredState");
        let input_json = serde_json::to_vec(&inputs)
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        tokio::fs::write(&input_path, input_json).await?;

        // A witness failure means the inputs violate a constraint.
        self.run(&[
            OsStr::new("wtns"),
            OsStr::new("calculate"),
            artifacts.wasm.as_os_str(),
            input_path.as_os_str(),
            witness_path.as_os_str(),
        ])
        .await
        .map_err(|e| match e {
            BackendError::Process(msg) => BackendError::Unsatisfied(msg),
            other => other,
        })?;

        self.run(&[
            OsStr::new("groth16"),
            OsStr::new("prove"),
            artifacts.zkey.as_os_str(),
            witness_path.as_os_str(),
            proof_path.as_os_str(),
            public_path.as_os_str(),
        ])
        .await?;

        let proof: Groth16Proof = read_json(&proof_path).await?;
        let public_signals: Vec<FieldElement> = read_json(&public_path).await?;
        Ok(ProverOutput {
            proof,
            public_signals,
        })
    }

    async fn verify_in(
        &self,
        dir: &Path,
        key: &VerificationKey,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool, BackendError> {
        let vkey_path = dir.join("verification_key.json");
        let public_path = dir.join("public.json");
        let proof_path = dir.join("proof.json");
        write_json(&vkey_path, &key.key).await?;
        write_json(&public_path, &public_signals).await?;
        write_json(&proof_path, proof).await?;

        let output = Command::new(&self.config.binary)
            .args([
                OsStr::new("groth16"),
                OsStr::new("verify"),
                vkey_path.as_os_str(),
                public_path.as_os_str(),
                proof_path.as_os_str(),
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;
        parse_verify_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}

/// snarkjs prints `OK!` and exits zero for a valid proof. A rejected proof
/// logs `Invalid proof` on either stream. Anything else is a tool failure.
pub fn parse_verify_output(success: bool, stdout: &str, stderr: &str) -> Result<bool, BackendError> {
    if stdout.contains("Invalid proof") || stderr.contains("Invalid proof") {
        return Ok(false);
    }
    if success && stdout.contains("OK!") {
        return Ok(true);
    }
    Err(BackendError::Process(format!(
        "unexpected verifier output (success: {}): {} {}",
        success,
        stdout.trim(),
        stderr.trim()
    )))
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, BackendError> {
    let raw = tokio::fs::read(path).await?;
    serde_json::from_slice(&raw)
        .map_err(|e| BackendError::Malformed(format!("{}: {}", path.display(), e)))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), BackendError> {
    let raw = serde_json::to_vec(value).map_err(|e| BackendError::Malformed(e.to_string()))?;
    tokio::fs::write(path, raw).await?;
    Ok(())
}

async fn scratch_dir() -> Result<PathBuf, BackendError> {
    let dir = std::env::temp_dir().join(format!("zkyc-snarkjs-{}", Uuid::now_v7()));
    tokio::fs::create_dir_all(&dir).await?;
    Ok(dir)
}

async fn cleanup(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        tracing::warn!(dir = %dir.display(), error = %e, "Failed to remove snarkjs scratch dir");
    }
}

#[async_trait]
impl CircuitProver for SnarkjsBackend {
    async fn prove(
        &self,
        kind: PredicateKind,
        inputs: &CircuitInputs,
    ) -> Result<ProverOutput, BackendError> {
        let dir = scratch_dir().await?;
        let result = self.prove_in(&dir, kind, inputs).await;
        cleanup(&dir).await;
        if let Err(ref e) = result {
            tracing::warn!(kind = %kind, error = %e, "snarkjs proving failed");
        }
        result
    }

    fn backend_id(&self) -> &str {
        "snarkjs"
    }
}

#[async_trait]
impl ProofVerifier for SnarkjsBackend {
    async fn verify(
        &self,
        key: &VerificationKey,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool, BackendError> {
        let dir = scratch_dir().await?;
        let result = self.verify_in(&dir, key, public_signals, proof).await;
        cleanup(&dir).await;
        result
    }

    fn backend_id(&self) -> &str {
        "snarkjs"
    }
}
