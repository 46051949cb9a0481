//! Fresh OpenSSL contexts for listeners and outbound connections.

use openssl::ssl::{SslContext, SslContextBuilder, SslMethod};

use crate::certificate::{CertificateRecord, SslCertificate};
use crate::config::ListenerConfig;
use crate::diagnostics::Severity;
use crate::error::{ErrorCode, InitError};
use crate::initializer::SslContextInitializer;

fn new_builder(
    initializer: &SslContextInitializer<'_>,
    origin: &'static str,
) -> Result<SslContextBuilder, InitError> {
    SslContext::builder(SslMethod::tls()).map_err(|err| {
        initializer.report(
            Severity::High,
            ErrorCode::SslInit,
            origin,
            format!("Error initializing SSL. Error: {}", err),
        );
        InitError::ContextAllocation
    })
}

/// Build the server context for one listener. The listener's certificate is
/// looked up by name in `certificates`; a listener without one fails the same
/// way as one whose certificate went missing from the repository.
pub fn build_server_context(
    initializer: &SslContextInitializer<'_>,
    listener: &ListenerConfig,
    certificates: &[SslCertificate],
) -> Result<SslContext, InitError> {
    let mut builder = new_builder(initializer, "build_server_context")?;

    let certificate = listener
        .certificate
        .as_ref()
        .and_then(|name| certificates.iter().find(|cert| &cert.name == name))
        .map(|cert| cert as &dyn CertificateRecord);

    initializer.init_server(&mut builder, certificate, &listener.address, listener.port)?;
    Ok(builder.build())
}

pub fn build_client_context(
    initializer: &SslContextInitializer<'_>,
) -> Result<SslContext, InitError> {
    let mut builder = new_builder(initializer, "build_client_context")?;
    initializer.init_client(&mut builder)?;
    Ok(builder.build())
}
