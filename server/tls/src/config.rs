//! The TLS settings of the mail server as read from `maild.toml`.
//!
//! Only the parts that shape a TLS context live here. Everything else the
//! server is configured with belongs to the service that owns the listeners.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use sketching::LogLevel;

use crate::certificate::SslCertificate;
use crate::error::ConfigError;
use crate::options::ProtocolVersion;

/// Read access to the TLS related configuration. Implementations are shared by
/// every context build, possibly from several threads at once.
pub trait TlsConfigProvider: Send + Sync {
    /// The raw cipher list as configured, before any normalisation.
    fn cipher_list(&self) -> String;

    fn protocol_enabled(&self, version: ProtocolVersion) -> bool;
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProtocolSettings {
    /// SSL 3.0. Broken, off unless someone really asks for it.
    #[serde(default)]
    pub sslv3: bool,
    #[serde(default = "default_true")]
    pub tlsv1_0: bool,
    #[serde(default = "default_true")]
    pub tlsv1_1: bool,
    #[serde(default = "default_true")]
    pub tlsv1_2: bool,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        ProtocolSettings {
            sslv3: false,
            tlsv1_0: true,
            tlsv1_1: true,
            tlsv1_2: true,
        }
    }
}

impl ProtocolSettings {
    pub fn enabled(&self, version: ProtocolVersion) -> bool {
        match version {
            ProtocolVersion::Ssl30 => self.sslv3,
            ProtocolVersion::Tls10 => self.tlsv1_0,
            ProtocolVersion::Tls11 => self.tlsv1_1,
            ProtocolVersion::Tls12 => self.tlsv1_2,
        }
    }

    pub fn set_enabled(&mut self, version: ProtocolVersion, enabled: bool) {
        match version {
            ProtocolVersion::Ssl30 => self.sslv3 = enabled,
            ProtocolVersion::Tls10 => self.tlsv1_0 = enabled,
            ProtocolVersion::Tls11 => self.tlsv1_1 = enabled,
            ProtocolVersion::Tls12 => self.tlsv1_2 = enabled,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TlsSettings {
    /// An OpenSSL cipher list. Empty means the library defaults.
    #[serde(default)]
    pub cipher_list: String,
    #[serde(default)]
    pub protocols: ProtocolSettings,
}

impl TlsConfigProvider for TlsSettings {
    fn cipher_list(&self) -> String {
        self.cipher_list.clone()
    }

    fn protocol_enabled(&self, version: ProtocolVersion) -> bool {
        self.protocols.enabled(version)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ListenerConfig {
    pub address: String,
    pub port: u16,
    /// Name of a `[[certificate]]` entry.
    pub certificate: Option<String>,
}

/// The TLS section of the server configuration.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub tls: TlsSettings,
    /// Where `dh2048.pem` is looked for. Defaults to the directory of the
    /// running binary.
    pub dh_directory: Option<PathBuf>,
    /// The log level, one of info, debug, trace. Defaults to "info" if not set.
    pub log_level: Option<LogLevel>,
    #[serde(default, rename = "certificate")]
    pub certificates: Vec<SslCertificate>,
    #[serde(default, rename = "listener")]
    pub listeners: Vec<ListenerConfig>,
}

impl ServerConfig {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let mut contents = String::new();
        File::open(config_path.as_ref())
            .and_then(|mut f| f.read_to_string(&mut contents))
            .map_err(|e| {
                eprintln!(
                    "Unable to read config file {} - {:?}",
                    config_path.as_ref().display(),
                    e
                );
                e
            })?;

        contents.parse()
    }

    /// Every listener's certificate must exist, and names must be unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (idx, cert) in self.certificates.iter().enumerate() {
            if self.certificates[..idx]
                .iter()
                .any(|other| other.name == cert.name)
            {
                return Err(ConfigError::DuplicateCertificate(cert.name.clone()));
            }
        }

        for listener in self.listeners.iter() {
            if let Some(name) = listener.certificate.as_ref() {
                if self.certificate(name).is_none() {
                    return Err(ConfigError::UnknownCertificate {
                        address: listener.address.clone(),
                        port: listener.port,
                        certificate: name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn certificate(&self, name: &str) -> Option<&SslCertificate> {
        self.certificates.iter().find(|cert| cert.name == name)
    }
}

impl FromStr for ServerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: ServerConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}
