//! Builds the TLS policy of a context, for listeners and for outbound
//! connections.
//!
//! A server context goes through these steps, stopping at the first hard
//! failure:
//!
//! 1. protocol options
//! 2. ephemeral ECDH curve (soft, reported only)
//! 3. cipher list
//! 4. DH parameters from `dh2048.pem` (a missing file is soft, a broken one is not)
//! 5. leaf certificate
//! 6. certificate chain from the same file
//! 7. private key, refusing encrypted keys
//!
//! A client context only takes steps 1 and 3.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::certificate::CertificateRecord;
use crate::config::TlsConfigProvider;
use crate::context::{FileProbe, LocalFs, PassphraseRefusal, TlsContext};
use crate::diagnostics::{DiagnosticReport, DiagnosticSink, Severity};
use crate::ecdh::enable_elliptic_curve_crypto;
use crate::error::{ErrorCode, InitError, LibraryError};
use crate::options::{normalise_cipher_list, protocol_options};

pub const DH_PARAMETERS_FILE: &str = "dh2048.pem";

const INIT_SERVER: &str = "SslContextInitializer::init_server";
const SET_CIPHER_LIST: &str = "SslContextInitializer::set_cipher_list";

static LOCAL_FS: LocalFs = LocalFs;

/// Which side of a connection a context is being built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsRole {
    Server,
    Client,
}

/// The directory holding the running binary, where `dh2048.pem` is shipped.
pub fn bin_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Applies the configured TLS policy to contexts. Holds only shared read
/// access to its collaborators, so one initializer can serve every listener.
pub struct SslContextInitializer<'a> {
    config: &'a dyn TlsConfigProvider,
    sink: &'a dyn DiagnosticSink,
    files: &'a dyn FileProbe,
    dh_directory: PathBuf,
}

impl<'a> SslContextInitializer<'a> {
    pub fn new(config: &'a dyn TlsConfigProvider, sink: &'a dyn DiagnosticSink) -> Self {
        SslContextInitializer {
            config,
            sink,
            files: &LOCAL_FS,
            dh_directory: bin_directory(),
        }
    }

    pub fn with_file_probe(mut self, files: &'a dyn FileProbe) -> Self {
        self.files = files;
        self
    }

    pub fn with_dh_directory(mut self, dh_directory: impl Into<PathBuf>) -> Self {
        self.dh_directory = dh_directory.into();
        self
    }

    pub fn dh_parameters_path(&self) -> PathBuf {
        self.dh_directory.join(DH_PARAMETERS_FILE)
    }

    pub(crate) fn report(
        &self,
        severity: Severity,
        code: ErrorCode,
        origin: &'static str,
        message: String,
    ) {
        self.sink
            .report(DiagnosticReport::new(severity, code, origin, message));
    }

    /// Configure a context for accepting connections on `address`:`port`. The
    /// address and port only appear in diagnostics.
    ///
    /// On error the context is partially configured and must be thrown away.
    pub fn init_server<C: TlsContext>(
        &self,
        context: &mut C,
        certificate: Option<&dyn CertificateRecord>,
        address: &str,
        port: u16,
    ) -> Result<(), InitError> {
        let Some(certificate) = certificate else {
            self.report(
                Severity::High,
                ErrorCode::SslInit,
                INIT_SERVER,
                format!(
                    "Error initializing SSL. Certificate not set. Address: {}, Port: {}",
                    address, port
                ),
            );
            return Err(InitError::CertificateNotSet);
        };

        debug!(%address, %port, "initialising server TLS context");

        self.set_context_options(context);
        enable_elliptic_curve_crypto(context, self.sink);
        self.set_cipher_list(context)?;
        self.set_dh_parameters(context, address, port)?;

        let certificate_file = certificate.certificate_file();
        let private_key_file = certificate.private_key_file();

        trace!(path = %certificate_file.display(), "loading certificate");
        context
            .load_certificate_file(certificate_file)
            .map_err(|err| {
                self.report(
                    Severity::High,
                    ErrorCode::SslInit,
                    INIT_SERVER,
                    format!(
                        "Failed to load certificate file. Path: {}, Address: {}, Port: {}, Error: {}",
                        certificate_file.display(),
                        address,
                        port,
                        err
                    ),
                );
                InitError::Certificate
            })?;

        context
            .load_certificate_chain_file(certificate_file)
            .map_err(|err| {
                self.report(
                    Severity::High,
                    ErrorCode::SslInit,
                    INIT_SERVER,
                    format!(
                        "Failed to load certificate chain from certificate file. Path: {}, Address: {}, Port: {}, Error: {}",
                        certificate_file.display(),
                        address,
                        port,
                        err
                    ),
                );
                InitError::CertificateChain
            })?;

        trace!(path = %private_key_file.display(), "loading private key");
        let refusal = PassphraseRefusal::new(self.sink);
        context
            .load_private_key_file(private_key_file, &refusal)
            .map_err(|err| {
                self.report_private_key_failure(private_key_file, address, port, &err);
                InitError::PrivateKey
            })?;

        debug!(%address, %port, "server TLS context ready");
        Ok(())
    }

    /// Configure a context for outbound connections.
    pub fn init_client<C: TlsContext>(&self, context: &mut C) -> Result<(), InitError> {
        self.set_context_options(context);
        self.set_cipher_list(context)
    }

    /// Run the construction path for `role`. A client never presents a
    /// certificate, so `certificate` is ignored for [`TlsRole::Client`].
    pub fn init<C: TlsContext>(
        &self,
        role: TlsRole,
        context: &mut C,
        certificate: Option<&dyn CertificateRecord>,
        address: &str,
        port: u16,
    ) -> Result<(), InitError> {
        match role {
            TlsRole::Server => self.init_server(context, certificate, address, port),
            TlsRole::Client => self.init_client(context),
        }
    }

    fn report_private_key_failure(
        &self,
        private_key_file: &Path,
        address: &str,
        port: u16,
        err: &LibraryError,
    ) {
        let message = if err.is_unclassified() {
            "Error initializing SSL".to_string()
        } else {
            format!(
                "Failed to load private key file. Path: {}, Address: {}, Port: {}, Error: {}",
                private_key_file.display(),
                address,
                port,
                err
            )
        };
        self.report(Severity::High, ErrorCode::SslInit, INIT_SERVER, message);
    }

    fn set_context_options<C: TlsContext>(&self, context: &mut C) {
        let options = protocol_options(self.config);
        trace!(?options, "applying protocol options");
        context.apply_options(options);
    }

    fn set_cipher_list<C: TlsContext>(&self, context: &mut C) -> Result<(), InitError> {
        let normalised = normalise_cipher_list(&self.config.cipher_list());
        let cipher_list = normalised.trim();

        if cipher_list.is_empty() {
            trace!("no cipher list configured, using library defaults");
            return Ok(());
        }

        context.apply_cipher_list(cipher_list).map_err(|err| {
            debug!(?err, %cipher_list, "cipher list rejected");
            self.report(
                Severity::Medium,
                ErrorCode::SslCipherOrCurve,
                SET_CIPHER_LIST,
                "Failed to set SSL ciphers".to_string(),
            );
            InitError::CipherList
        })
    }

    fn set_dh_parameters<C: TlsContext>(
        &self,
        context: &mut C,
        address: &str,
        port: u16,
    ) -> Result<(), InitError> {
        let dh_file = self.dh_parameters_path();

        if !self.files.exists(&dh_file) {
            self.report(
                Severity::Critical,
                ErrorCode::DiffieHellmanMissing,
                INIT_SERVER,
                format!(
                    "Unable to enable Diffie-Hellman key agreement. The required file {} does not exist.",
                    dh_file.display()
                ),
            );
            return Ok(());
        }

        context.load_tmp_dh_file(&dh_file).map_err(|err| {
            self.report(
                Severity::High,
                ErrorCode::SslInit,
                INIT_SERVER,
                format!(
                    "Failed to set SSL context options. Address: {}, Port: {}, Error: {}",
                    address, port, err
                ),
            );
            InitError::DiffieHellman
        })
    }
}
