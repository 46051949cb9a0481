//! The seam between policy and the TLS library.
//!
//! [`TlsContext`] lists the handful of library calls that building a context
//! needs. The production binding is `openssl::ssl::SslContextBuilder` (see
//! `native.rs`); tests use a recording fake.

use std::path::Path;

use crate::diagnostics::{DiagnosticReport, DiagnosticSink, Severity};
use crate::error::{ErrorCode, LibraryError};
use crate::options::ProtocolOptions;

/// Curves we are willing to use for ephemeral ECDH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedCurve {
    /// NIST P-256
    Prime256v1,
}

pub trait TlsContext {
    /// An allocated EC key. Dropping it releases the key.
    type EcKey;

    /// Add `options` to the context's option set.
    fn apply_options(&mut self, options: ProtocolOptions);

    fn apply_cipher_list(&mut self, cipher_list: &str) -> Result<(), LibraryError>;

    fn allocate_ec_key(&mut self, curve: NamedCurve) -> Result<Self::EcKey, LibraryError>;

    fn install_tmp_ecdh(&mut self, key: &Self::EcKey) -> Result<(), LibraryError>;

    fn load_tmp_dh_file(&mut self, path: &Path) -> Result<(), LibraryError>;

    fn load_certificate_file(&mut self, path: &Path) -> Result<(), LibraryError>;

    fn load_certificate_chain_file(&mut self, path: &Path) -> Result<(), LibraryError>;

    /// Load a PEM private key. Should the key be encrypted, the passphrase is
    /// requested from `passphrase`, and nowhere else.
    fn load_private_key_file(
        &mut self,
        path: &Path,
        passphrase: &PassphraseRefusal<'_>,
    ) -> Result<(), LibraryError>;
}

/// The passphrase source handed to private key loading. We do not support
/// encrypted private keys, so every request is reported and answered with an
/// empty passphrase, which makes the load fail.
pub struct PassphraseRefusal<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> PassphraseRefusal<'a> {
    pub(crate) const ORIGIN: &'static str = "SslContextInitializer::passphrase";

    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        PassphraseRefusal { sink }
    }

    pub fn passphrase(&self) -> String {
        self.sink.report(DiagnosticReport::new(
            Severity::High,
            ErrorCode::PrivateKeyPassword,
            Self::ORIGIN,
            "The private key file has a password. maild does not support this.",
        ));
        String::new()
    }
}

/// Answers whether an optional file is there at all.
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
