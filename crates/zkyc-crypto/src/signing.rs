//! Ed25519 keys and signed API envelopes.
//!
//! An account id is bound to a key: it is the last 20 bytes of the BLAKE3
//! hash of the verifying key. Calls that act for an account travel inside a
//! [`SignedEnvelope`], and the account they act for is whoever signed it.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use zkyc_core::AccountId;

use crate::error::CryptoError;

/// Prefix mixed into every signed message.
const SIGNING_DOMAIN: &[u8] = b"zkyc-api-v1\0";

/// Action names a payload is signed for, one per mutating endpoint.
pub mod actions {
    pub const ISSUE: &str = "credentials.issue";
    pub const REVOKE: &str = "credentials.revoke";
    pub const REQUEST: &str = "requests.create";
}

fn decode_fixed<const N: usize>(hex_str: &str, what: &str) -> Result<[u8; N], CryptoError> {
    let bytes = hex::decode(hex_str.trim().trim_start_matches("0x"))
        .map_err(|e| CryptoError::InvalidInput(format!("invalid {} hex: {}", what, e)))?;
    bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidInput(format!("{} must be {} bytes, got {}", what, N, bytes.len()))
    })
}

/// Ed25519 signing key.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// The seed is used directly as the Ed25519 private key.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        Ok(Self::from_seed(&decode_fixed::<32>(hex_str, "secret key")?))
    }

    /// Hex of the private seed. Keep it out of logs.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// The account this key acts for.
    pub fn account(&self) -> AccountId {
        self.public_key().account()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.signing_key.sign(message),
        }
    }
}

/// Ed25519 verifying key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = decode_fixed::<32>(hex_str, "public key")?;
        let verifying_key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CryptoError::InvalidInput(format!("invalid public key: {}", e)))?;
        Ok(Self { verifying_key })
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    pub fn account(&self) -> AccountId {
        let digest = blake3::hash(self.as_bytes());
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest.as_bytes()[12..]);
        AccountId(id)
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        self.verifying_key
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Ed25519 signature (64 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes = decode_fixed::<64>(hex_str, "signature")?;
        Ok(Self {
            inner: ed25519_dalek::Signature::from_bytes(&bytes),
        })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// What a caller signs: the body plus the action it is meant for and a
/// nonce and timestamp for replay protection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPayload<T> {
    pub action: String,
    pub nonce: u64,
    pub signed_at: DateTime<Utc>,
    pub body: T,
}

impl<T> SignedPayload<T> {
    /// Fresh nonce, signed now.
    pub fn new(action: &str, body: T) -> Self {
        Self {
            action: action.to_string(),
            nonce: OsRng.next_u64(),
            signed_at: Utc::now(),
            body,
        }
    }
}

/// Wire form of a signed call. The signature covers `payload` byte for
/// byte, so the server never re-serializes before checking it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// JSON of a [`SignedPayload`].
    pub payload: String,
    pub public_key: String,
    pub signature: String,
}

/// A verified envelope and the account that signed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opened<T> {
    pub signer: AccountId,
    pub payload: SignedPayload<T>,
}

fn signing_message(payload: &str) -> Vec<u8> {
    let mut message = Vec::with_capacity(SIGNING_DOMAIN.len() + payload.len());
    message.extend_from_slice(SIGNING_DOMAIN);
    message.extend_from_slice(payload.as_bytes());
    message
}

impl SignedEnvelope {
    pub fn seal<T: Serialize>(
        keypair: &KeyPair,
        payload: &SignedPayload<T>,
    ) -> Result<Self, CryptoError> {
        let payload = serde_json::to_string(payload)
            .map_err(|e| CryptoError::InvalidInput(format!("unserializable payload: {}", e)))?;
        let signature = keypair.sign(&signing_message(&payload));
        Ok(Self {
            payload,
            public_key: keypair.public_key().to_hex(),
            signature: signature.to_hex(),
        })
    }

    /// Account of the key the envelope claims, before any check.
    pub fn claimed_signer(&self) -> Result<AccountId, CryptoError> {
        Ok(PublicKey::from_hex(&self.public_key)?.account())
    }

    /// Check the signature, then decode the payload.
    pub fn open<T: DeserializeOwned>(&self) -> Result<Opened<T>, CryptoError> {
        let key = PublicKey::from_hex(&self.public_key)?;
        let signature = Signature::from_hex(&self.signature)?;
        key.verify(&signing_message(&self.payload), &signature)?;
        let payload = serde_json::from_str(&self.payload)
            .map_err(|e| CryptoError::InvalidInput(format!("malformed payload: {}", e)))?;
        Ok(Opened {
            signer: key.account(),
            payload,
        })
    }
}
