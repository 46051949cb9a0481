use tracing::debug;

use crate::context::{NamedCurve, TlsContext};
use crate::diagnostics::{DiagnosticReport, DiagnosticSink, Severity};
use crate::error::ErrorCode;

const ORIGIN: &str = "SslContextInitializer::enable_elliptic_curve_crypto";

/// Install P-256 as the context's ephemeral ECDH curve. Failures are reported
/// and otherwise ignored, a context without it still works.
pub(crate) fn enable_elliptic_curve_crypto<C: TlsContext>(
    context: &mut C,
    sink: &dyn DiagnosticSink,
) {
    let key = match context.allocate_ec_key(NamedCurve::Prime256v1) {
        Ok(key) => key,
        Err(err) => {
            debug!(?err, "EC key allocation failed");
            sink.report(DiagnosticReport::new(
                Severity::Medium,
                ErrorCode::SslCipherOrCurve,
                ORIGIN,
                "Failed to enable TLS EC",
            ));
            return;
        }
    };

    if let Err(err) = context.install_tmp_ecdh(&key) {
        sink.report(DiagnosticReport::new(
            Severity::Medium,
            ErrorCode::SslCipherOrCurve,
            ORIGIN,
            format!("Failed to enable TLS EC. set_tmp_ecdh returned {}", err),
        ));
    }
    // key is dropped, and so released, here on both paths.
}
