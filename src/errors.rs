//! Unified error types for the school manager.
//!
//! Every core operation returns [`Result`]. Domain failures carry a Spanish,
//! user-facing message and map onto the callable error codes through
//! [`Error::code`]; infrastructure failures (database, I/O, configuration)
//! are wrapped transparently.

use sea_orm::DbErr;
use thiserror::Error;

/// Failures of the credential store, mirroring the managed-auth error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Another account already uses the email.
    #[error("Este correo ya está registrado")]
    EmailAlreadyExists,
    /// The email is malformed.
    #[error("Correo electrónico inválido")]
    InvalidEmail,
    /// The password does not meet the policy.
    #[error("La contraseña debe tener al menos {min_length} caracteres")]
    InvalidPassword { min_length: usize },
    /// No credential exists for the user.
    #[error("Usuario no encontrado")]
    UserNotFound,
    /// Email and password do not match.
    #[error("Correo o contraseña incorrectos")]
    WrongPassword,
}

impl CredentialError {
    /// The managed-auth style code (e.g. `auth/email-already-exists`).
    #[must_use]
    pub const fn auth_code(self) -> &'static str {
        match self {
            Self::EmailAlreadyExists => "auth/email-already-exists",
            Self::InvalidEmail => "auth/invalid-email",
            Self::InvalidPassword { .. } => "auth/invalid-password",
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
        }
    }
}

/// Errors produced by the school manager.
#[derive(Debug, Error)]
pub enum Error {
    /// No authenticated caller.
    #[error("Usuario no autenticado")]
    Unauthenticated,

    /// The caller is authenticated but not allowed to perform the action.
    #[error("{message}")]
    PermissionDenied { message: String },

    /// A referenced record does not exist (or belongs to another tenant).
    #[error("{message}")]
    NotFound { message: String },

    /// Input failed validation.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// A uniqueness constraint would be violated.
    #[error("{message}")]
    AlreadyExists { message: String },

    /// The system is not in a state that allows the operation.
    #[error("{message}")]
    FailedPrecondition { message: String },

    /// An unexpected failure with a friendly message.
    #[error("{message}")]
    Internal { message: String },

    /// Sign-up, sign-in or password change was rejected.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Builds a [`Error::PermissionDenied`].
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Builds a [`Error::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Builds a [`Error::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Builds a [`Error::AlreadyExists`].
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Builds a [`Error::FailedPrecondition`].
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            message: message.into(),
        }
    }

    /// Builds a [`Error::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The callable error code for this error.
    ///
    /// Infrastructure errors all collapse to `internal`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied { .. } => "permission-denied",
            Self::NotFound { .. } => "not-found",
            Self::InvalidArgument { .. } => "invalid-argument",
            Self::AlreadyExists { .. } => "already-exists",
            Self::FailedPrecondition { .. } => "failed-precondition",
            Self::Credential(c) => match c {
                CredentialError::EmailAlreadyExists => "already-exists",
                CredentialError::InvalidEmail | CredentialError::InvalidPassword { .. } => {
                    "invalid-argument"
                }
                CredentialError::UserNotFound => "not-found",
                CredentialError::WrongPassword => "unauthenticated",
            },
            Self::Internal { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Config { .. }
            | Self::EnvVar(_)
            | Self::Serialization(_) => "internal",
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Infrastructure details are replaced by a generic message so that
    /// database or filesystem internals never reach the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_)
            | Self::Io(_)
            | Self::Config { .. }
            | Self::EnvVar(_)
            | Self::Serialization(_) => "Error interno del servidor".to_string(),
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Error::Unauthenticated.code(), "unauthenticated");
        assert_eq!(Error::permission_denied("x").code(), "permission-denied");
        assert_eq!(Error::not_found("x").code(), "not-found");
        assert_eq!(Error::invalid("x").code(), "invalid-argument");
        assert_eq!(Error::precondition("x").code(), "failed-precondition");
        assert_eq!(
            Error::Database(DbErr::Custom("boom".into())).code(),
            "internal"
        );
    }

    #[test]
    fn test_credential_codes() {
        let err = Error::from(CredentialError::EmailAlreadyExists);
        assert_eq!(err.code(), "already-exists");
        assert_eq!(err.to_string(), "Este correo ya está registrado");

        let err = Error::from(CredentialError::InvalidPassword { min_length: 6 });
        assert_eq!(err.code(), "invalid-argument");
        assert_eq!(
            err.to_string(),
            "La contraseña debe tener al menos 6 caracteres"
        );
        assert_eq!(
            CredentialError::UserNotFound.auth_code(),
            "auth/user-not-found"
        );
    }

    #[test]
    fn test_public_message_hides_infrastructure() {
        let err = Error::Database(DbErr::Custom("table missing".into()));
        assert_eq!(err.public_message(), "Error interno del servidor");

        let err = Error::invalid("La fecha es inválida");
        assert_eq!(err.public_message(), "La fecha es inválida");
    }
}
