use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use openssl::error::ErrorStack;

/// The numeric codes attached to every diagnostic report. These are stable and
/// operators search the error log for them, so never renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum ErrorCode {
    SslInit = 5113,
    PrivateKeyPassword = 5143,
    SslCipherOrCurve = 5511,
    DiffieHellmanMissing = 5603,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self.into()
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// A failure raised by the TLS library or by reading a file it was pointed at.
///
/// An error with no detail is one the library raised without anything on its
/// error queue. Those are reported with a generic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryError {
    detail: Option<String>,
}

impl LibraryError {
    pub fn new(detail: impl Into<String>) -> Self {
        LibraryError {
            detail: Some(detail.into()),
        }
    }

    pub fn unclassified() -> Self {
        LibraryError { detail: None }
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_unclassified(&self) -> bool {
        self.detail.is_none()
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => f.write_str(detail),
            None => f.write_str("unclassified TLS library error"),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<ErrorStack> for LibraryError {
    fn from(err: ErrorStack) -> Self {
        if err.errors().is_empty() {
            LibraryError::unclassified()
        } else {
            LibraryError::new(err.to_string())
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::new(err.to_string())
    }
}

/// The stage at which building a TLS context was abandoned. The diagnostic for
/// the failure has already been reported by the time a caller sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    ContextAllocation,
    CertificateNotSet,
    CipherList,
    DiffieHellman,
    Certificate,
    CertificateChain,
    PrivateKey,
}

impl InitError {
    /// The code of the diagnostic that was reported for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            InitError::CipherList => ErrorCode::SslCipherOrCurve,
            InitError::ContextAllocation
            | InitError::CertificateNotSet
            | InitError::DiffieHellman
            | InitError::Certificate
            | InitError::CertificateChain
            | InitError::PrivateKey => ErrorCode::SslInit,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            InitError::ContextAllocation => "The TLS library could not allocate a context.",
            InitError::CertificateNotSet => "No certificate is configured for this listener.",
            InitError::CipherList => "The configured cipher list matched no usable ciphers.",
            InitError::DiffieHellman => "The Diffie-Hellman parameter file could not be loaded.",
            InitError::Certificate => "The certificate file could not be loaded.",
            InitError::CertificateChain => "The certificate chain could not be loaded.",
            InitError::PrivateKey => "The private key file could not be loaded.",
        }
    }
}

impl Display for InitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({}) - {}", self, self.code(), self.message())
    }
}

impl std::error::Error for InitError {}

/// Failures while reading or checking the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    UnknownCertificate {
        address: String,
        port: u16,
        certificate: String,
    },
    DuplicateCertificate(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "unable to read config: {}", err),
            ConfigError::Parse(err) => write!(f, "unable to parse config: {}", err),
            ConfigError::UnknownCertificate {
                address,
                port,
                certificate,
            } => write!(
                f,
                "listener {}:{} refers to certificate '{}' which is not defined",
                address, port, certificate
            ),
            ConfigError::DuplicateCertificate(name) => {
                write!(f, "certificate '{}' is defined more than once", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::UnknownCertificate { .. } | ConfigError::DuplicateCertificate(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[test]
fn test_initerror_as_nice_string() {
    assert_eq!(
        InitError::CipherList.to_string(),
        "CipherList (5511) - The configured cipher list matched no usable ciphers.".to_string()
    );
    assert_eq!(
        InitError::CertificateNotSet.to_string(),
        "CertificateNotSet (5113) - No certificate is configured for this listener.".to_string()
    );
}

#[test]
fn test_error_codes_are_stable() {
    assert_eq!(ErrorCode::SslInit.as_u32(), 5113);
    assert_eq!(ErrorCode::PrivateKeyPassword.as_u32(), 5143);
    assert_eq!(ErrorCode::SslCipherOrCurve.as_u32(), 5511);
    assert_eq!(ErrorCode::DiffieHellmanMissing.as_u32(), 5603);
    assert_eq!(ErrorCode::try_from(5603).ok(), Some(ErrorCode::DiffieHellmanMissing));
}

#[test]
fn test_library_error_from_empty_stack() {
    assert!(LibraryError::unclassified().is_unclassified());
    assert!(!LibraryError::new("bad pem").is_unclassified());
    assert_eq!(LibraryError::new("bad pem").detail(), Some("bad pem"));
}
