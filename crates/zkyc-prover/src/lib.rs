//! zkyc Prover — witness assembly and proving backends
//!
//! Builds the flat input mapping each circuit expects from a holder's private
//! opening, runs a [`zkyc_core::CircuitProver`], and checks the returned
//! public signals against the request before submission. Two backends ship:
//! an in-process development backend and a `snarkjs` process backend.

pub mod age;
pub mod assembler;
pub mod dev_backend;
pub mod snarkjs;
pub mod state;

pub use age::{age_on, compute_age};
pub use assembler::{
    check_output, circuit_of, required_inputs, validate_inputs, ProofRequest, WitnessAssembler,
};
pub use dev_backend::DevelopmentBackend;
pub use snarkjs::{CircuitArtifacts, SnarkjsBackend, SnarkjsConfig, StateCircuitArtifacts};
