//! [`TlsContext`] for OpenSSL context builders.

use std::fs;
use std::path::Path;

use openssl::dh::Dh;
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Params};
use openssl::ssl::{SslContextBuilder, SslFiletype, SslOptions};

use crate::context::{NamedCurve, PassphraseRefusal, TlsContext};
use crate::error::LibraryError;
use crate::options::ProtocolOptions;

const OPTION_MAP: [(ProtocolOptions, SslOptions); 8] = [
    (ProtocolOptions::ALL_BUG_WORKAROUNDS, SslOptions::ALL),
    (ProtocolOptions::SINGLE_DH_USE, SslOptions::SINGLE_DH_USE),
    (ProtocolOptions::SINGLE_ECDH_USE, SslOptions::SINGLE_ECDH_USE),
    (ProtocolOptions::NO_SSLV2, SslOptions::NO_SSLV2),
    (ProtocolOptions::NO_SSLV3, SslOptions::NO_SSLV3),
    (ProtocolOptions::NO_TLSV1, SslOptions::NO_TLSV1),
    (ProtocolOptions::NO_TLSV1_1, SslOptions::NO_TLSV1_1),
    (ProtocolOptions::NO_TLSV1_2, SslOptions::NO_TLSV1_2),
];

pub fn to_ssl_options(options: ProtocolOptions) -> SslOptions {
    OPTION_MAP
        .iter()
        .filter(|(flag, _)| options.contains(*flag))
        .fold(SslOptions::empty(), |acc, (_, native)| acc | *native)
}

fn curve_nid(curve: NamedCurve) -> Nid {
    match curve {
        NamedCurve::Prime256v1 => Nid::X9_62_PRIME256V1,
    }
}

impl TlsContext for SslContextBuilder {
    type EcKey = EcKey<Params>;

    fn apply_options(&mut self, options: ProtocolOptions) {
        SslContextBuilder::set_options(self, to_ssl_options(options));
    }

    fn apply_cipher_list(&mut self, cipher_list: &str) -> Result<(), LibraryError> {
        SslContextBuilder::set_cipher_list(self, cipher_list).map_err(LibraryError::from)
    }

    fn allocate_ec_key(&mut self, curve: NamedCurve) -> Result<Self::EcKey, LibraryError> {
        let group = EcGroup::from_curve_name(curve_nid(curve))?;
        EcKey::from_group(&group).map_err(LibraryError::from)
    }

    fn install_tmp_ecdh(&mut self, key: &Self::EcKey) -> Result<(), LibraryError> {
        SslContextBuilder::set_tmp_ecdh(self, key).map_err(LibraryError::from)
    }

    fn load_tmp_dh_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        let pem = fs::read(path)?;
        let dh = Dh::params_from_pem(&pem)?;
        SslContextBuilder::set_tmp_dh(self, &dh).map_err(LibraryError::from)
    }

    fn load_certificate_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        SslContextBuilder::set_certificate_file(self, path, SslFiletype::PEM)
            .map_err(LibraryError::from)
    }

    fn load_certificate_chain_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        SslContextBuilder::set_certificate_chain_file(self, path).map_err(LibraryError::from)
    }

    fn load_private_key_file(
        &mut self,
        path: &Path,
        passphrase: &PassphraseRefusal<'_>,
    ) -> Result<(), LibraryError> {
        let pem = fs::read(path)?;
        let key = PKey::private_key_from_pem_callback(&pem, |buf| {
            let secret = passphrase.passphrase();
            let len = secret.len().min(buf.len());
            buf[..len].copy_from_slice(&secret.as_bytes()[..len]);
            Ok(len)
        })?;
        SslContextBuilder::set_private_key(self, &key)?;
        // Catch a key that doesn't belong to the certificate now, not at the
        // first handshake.
        SslContextBuilder::check_private_key(self).map_err(LibraryError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_mapping_covers_every_flag() {
        assert_eq!(to_ssl_options(ProtocolOptions::empty()), SslOptions::empty());
        assert!(to_ssl_options(ProtocolOptions::NO_TLSV1_1).contains(SslOptions::NO_TLSV1_1));
        assert!(!to_ssl_options(ProtocolOptions::NO_TLSV1_1).contains(SslOptions::NO_TLSV1_2));
        let every = to_ssl_options(ProtocolOptions::all());
        for (_, native) in OPTION_MAP {
            assert!(every.contains(native));
        }
    }
}
