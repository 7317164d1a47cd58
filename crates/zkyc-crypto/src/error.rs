use zkyc_core::ProtocolError;

/// Commitment derivation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid birth date: {0}")]
    InvalidDate(String),

    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

impl From<CryptoError> for ProtocolError {
    fn from(e: CryptoError) -> Self {
        ProtocolError::InvalidInput(e.to_string())
    }
}

impl From<zkyc_core::FieldError> for CryptoError {
    fn from(e: zkyc_core::FieldError) -> Self {
        CryptoError::InvalidInput(e.to_string())
    }
}
