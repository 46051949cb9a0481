use std::path::{Path, PathBuf};

use serde::Deserialize;

/// A certificate as held by the certificate repository. Context building only
/// ever reads the two paths.
pub trait CertificateRecord {
    /// PEM file holding the leaf certificate, optionally followed by the
    /// intermediates.
    fn certificate_file(&self) -> &Path;

    fn private_key_file(&self) -> &Path;
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SslCertificate {
    pub name: String,
    pub certificate_file: PathBuf,
    pub private_key_file: PathBuf,
}

impl SslCertificate {
    pub fn new(
        name: impl Into<String>,
        certificate_file: impl Into<PathBuf>,
        private_key_file: impl Into<PathBuf>,
    ) -> Self {
        SslCertificate {
            name: name.into(),
            certificate_file: certificate_file.into(),
            private_key_file: private_key_file.into(),
        }
    }
}

impl CertificateRecord for SslCertificate {
    fn certificate_file(&self) -> &Path {
        &self.certificate_file
    }

    fn private_key_file(&self) -> &Path {
        &self.private_key_file
    }
}
