//! TLS context policy for maild listeners and outbound connections.
//!
//! This crate decides which protocol versions, ciphers and ephemeral key
//! exchange parameters a context uses, and loads the certificate and private key
//! a listener presents. Handshakes, peer verification and certificate renewal
//! happen elsewhere.
//!
//! ```ignore
//! let sink = TracingSink;
//! let initializer = SslContextInitializer::new(&config.tls, &sink);
//! let context = build_server_context(&initializer, &listener, &config.certificates)?;
//! ```

#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]

pub mod certificate;
pub mod config;
pub mod context;
pub mod devcert;
pub mod diagnostics;
mod ecdh;
pub mod error;
pub mod initializer;
pub mod listener;
mod native;
pub mod options;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::certificate::{CertificateRecord, SslCertificate};
    pub use crate::config::{ListenerConfig, ServerConfig, TlsConfigProvider, TlsSettings};
    pub use crate::context::{FileProbe, LocalFs, TlsContext};
    pub use crate::diagnostics::{
        DiagnosticReport, DiagnosticSink, MemorySink, Severity, TeeSink, TracingSink,
    };
    pub use crate::error::{ConfigError, ErrorCode, InitError, LibraryError};
    pub use crate::initializer::{SslContextInitializer, TlsRole};
    pub use crate::listener::{build_client_context, build_server_context};
    pub use crate::options::{ProtocolOptions, ProtocolVersion};
}

pub use native::to_ssl_options;
