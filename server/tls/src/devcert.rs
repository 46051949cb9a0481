//! Throwaway certificate material for development and for tests. A P-256 CA
//! signs a leaf for the given domain. Never use these in production.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use openssl::dh::Dh;
use openssl::ec::{EcGroup, EcKey};
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::symm::Cipher;
use openssl::x509::extension::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectAlternativeName,
    SubjectKeyIdentifier,
};
use openssl::x509::{X509Name, X509NameBuilder, X509};
use openssl::{asn1, bn, hash, pkey};
use tracing::{debug, error};

use crate::initializer::DH_PARAMETERS_FILE;

const CA_VALID_DAYS: u32 = 30;
const CERT_VALID_DAYS: u32 = 5;

pub const CERTIFICATE_FILE: &str = "cert.pem";
pub const CHAIN_FILE: &str = "chain.pem";
pub const PRIVATE_KEY_FILE: &str = "key.pem";
pub const CA_FILE: &str = "ca.pem";

/// The files written by [`DevCertificate::write`].
#[derive(Debug, Clone)]
pub struct DevCertificatePaths {
    /// Leaf followed by the CA, suitable as a listener certificate file.
    pub chain: PathBuf,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub ca: PathBuf,
}

pub struct DevCertificate {
    ca_cert: X509,
    key: pkey::PKey<pkey::Private>,
    cert: X509,
}

fn new_p256_key() -> Result<pkey::PKey<pkey::Private>, ErrorStack> {
    let ecgroup = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let eckey = EcKey::generate(&ecgroup)?;
    pkey::PKey::from_ec_key(eckey)
}

fn dev_name(common_name: &str) -> Result<X509Name, ErrorStack> {
    let mut x509_name = X509NameBuilder::new()?;
    x509_name.append_entry_by_text("O", "maild")?;
    x509_name.append_entry_by_text("CN", common_name)?;
    x509_name.append_entry_by_text("OU", "Development and Evaluation - NOT FOR PRODUCTION")?;
    Ok(x509_name.build())
}

fn serial(value: u32) -> Result<asn1::Asn1Integer, ErrorStack> {
    bn::BigNum::from_u32(value).and_then(|serial| serial.to_asn1_integer())
}

impl DevCertificate {
    /// Build a CA and a leaf certificate for `domain_name` signed by it.
    pub fn generate(domain_name: &str) -> Result<Self, ErrorStack> {
        let ca_key = new_p256_key()?;
        let ca_name = dev_name("maild Generated CA")?;

        let mut ca_builder = X509::builder()?;
        // Yes, 2 actually means 3 here ...
        ca_builder.set_version(2)?;
        let ca_serial = serial(1)?;
        ca_builder.set_serial_number(&ca_serial)?;
        ca_builder.set_subject_name(&ca_name)?;
        ca_builder.set_issuer_name(&ca_name)?;
        let not_before = asn1::Asn1Time::days_from_now(0)?;
        ca_builder.set_not_before(&not_before)?;
        let not_after = asn1::Asn1Time::days_from_now(CA_VALID_DAYS)?;
        ca_builder.set_not_after(&not_after)?;
        ca_builder.append_extension(BasicConstraints::new().critical().ca().pathlen(0).build()?)?;
        ca_builder.append_extension(
            KeyUsage::new()
                .critical()
                .key_cert_sign()
                .crl_sign()
                .build()?,
        )?;
        let subject_key_identifier =
            SubjectKeyIdentifier::new().build(&ca_builder.x509v3_context(None, None))?;
        ca_builder.append_extension(subject_key_identifier)?;
        ca_builder.set_pubkey(&ca_key)?;
        ca_builder.sign(&ca_key, hash::MessageDigest::sha256())?;
        let ca_cert = ca_builder.build();

        let key = new_p256_key()?;
        let mut cert_builder = X509::builder()?;
        cert_builder.set_version(2)?;
        let cert_serial = serial(2)?;
        cert_builder.set_serial_number(&cert_serial)?;
        cert_builder.set_pubkey(&key)?;
        let cert_name = dev_name(domain_name)?;
        cert_builder.set_subject_name(&cert_name)?;
        cert_builder.set_issuer_name(ca_cert.subject_name())?;
        let not_before = asn1::Asn1Time::days_from_now(0)?;
        cert_builder.set_not_before(&not_before)?;
        let not_after = asn1::Asn1Time::days_from_now(CERT_VALID_DAYS)?;
        cert_builder.set_not_after(&not_after)?;
        cert_builder.append_extension(BasicConstraints::new().build()?)?;
        cert_builder.append_extension(
            KeyUsage::new()
                .critical()
                .digital_signature()
                .key_encipherment()
                .build()?,
        )?;
        cert_builder.append_extension(ExtendedKeyUsage::new().server_auth().build()?)?;
        let subject_key_identifier = SubjectKeyIdentifier::new()
            .build(&cert_builder.x509v3_context(Some(&ca_cert), None))?;
        cert_builder.append_extension(subject_key_identifier)?;
        let auth_key_identifier = AuthorityKeyIdentifier::new()
            .keyid(false)
            .issuer(false)
            .build(&cert_builder.x509v3_context(Some(&ca_cert), None))?;
        cert_builder.append_extension(auth_key_identifier)?;
        let subject_alt_name = SubjectAlternativeName::new()
            .dns(domain_name)
            .build(&cert_builder.x509v3_context(Some(&ca_cert), None))?;
        cert_builder.append_extension(subject_alt_name)?;
        cert_builder.sign(&ca_key, hash::MessageDigest::sha256())?;
        let cert = cert_builder.build();

        debug!(%domain_name, "generated development certificate");
        Ok(DevCertificate { ca_cert, key, cert })
    }

    pub fn certificate(&self) -> &X509 {
        &self.cert
    }

    /// Write the key, leaf, chain and CA as PEM into `dir`. With a passphrase
    /// the private key is written encrypted.
    pub fn write(
        &self,
        dir: impl AsRef<Path>,
        passphrase: Option<&[u8]>,
    ) -> Result<DevCertificatePaths, std::io::Error> {
        let dir = dir.as_ref();
        let paths = DevCertificatePaths {
            chain: dir.join(CHAIN_FILE),
            certificate: dir.join(CERTIFICATE_FILE),
            private_key: dir.join(PRIVATE_KEY_FILE),
            ca: dir.join(CA_FILE),
        };

        let key_pem = match passphrase {
            Some(passphrase) => self
                .key
                .private_key_to_pem_pkcs8_passphrase(Cipher::aes_256_cbc(), passphrase),
            None => self.key.private_key_to_pem_pkcs8(),
        }
        .map_err(|e| {
            error!(err = ?e, "Failed to convert key to PEM");
            std::io::Error::other(e)
        })?;

        let cert_pem = self.cert.to_pem().map_err(|e| {
            error!(err = ?e, "Failed to convert cert to PEM");
            std::io::Error::other(e)
        })?;
        let ca_pem = self.ca_cert.to_pem().map_err(|e| {
            error!(err = ?e, "Failed to convert CA cert to PEM");
            std::io::Error::other(e)
        })?;

        let mut chain_pem = cert_pem.clone();
        chain_pem.extend_from_slice(&ca_pem);

        write_file(&paths.private_key, &key_pem)?;
        write_file(&paths.certificate, &cert_pem)?;
        write_file(&paths.chain, &chain_pem)?;
        write_file(&paths.ca, &ca_pem)?;
        Ok(paths)
    }
}

/// Write a 2048 bit DH parameter file (the RFC 3526 group) as `dh2048.pem`.
pub fn write_dh_parameters(dir: impl AsRef<Path>) -> Result<PathBuf, std::io::Error> {
    let path = dir.as_ref().join(DH_PARAMETERS_FILE);
    let pem = bn::BigNum::get_rfc3526_prime_2048()
        .and_then(|prime| Ok((prime, bn::BigNum::from_u32(2)?)))
        .and_then(|(prime, generator)| Dh::from_pqg(prime, None, generator))
        .and_then(|dh| dh.params_to_pem())
        .map_err(|e| {
            error!(err = ?e, "Failed to build DH parameters");
            std::io::Error::other(e)
        })?;
    write_file(&path, &pem)?;
    Ok(path)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), std::io::Error> {
    fs::File::create(path)
        .and_then(|mut file| file.write_all(contents))
        .map_err(|e| {
            error!(err = ?e, "Failed to create {:?}", path);
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_leaf_is_signed_by_ca() {
        let dev = DevCertificate::generate("mx.example.com").expect("generate");
        let ca_key = dev.ca_cert.public_key().expect("ca public key");
        assert!(dev.certificate().verify(&ca_key).expect("verify"));
    }

    #[test]
    fn test_generated_serials_and_validity() {
        let dev = DevCertificate::generate("mx.example.com").expect("generate");

        let serial = |cert: &X509| {
            cert.serial_number()
                .to_bn()
                .and_then(|bn| bn.to_dec_str().map(|s| s.to_string()))
                .expect("serial")
        };
        assert_eq!(serial(&dev.ca_cert), "1");
        assert_eq!(serial(dev.certificate()), "2");

        let leaf = dev.certificate();
        assert!(leaf.not_before() < leaf.not_after());
        assert!(dev.ca_cert.not_after() > leaf.not_after());
        assert_eq!(
            leaf.issuer_name().to_der().expect("issuer der"),
            dev.ca_cert.subject_name().to_der().expect("subject der")
        );
    }

    #[test]
    fn test_write_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dev = DevCertificate::generate("mx.example.com").expect("generate");
        let paths = dev.write(dir.path(), None).expect("write");

        let chain = fs::read(&paths.chain).expect("chain");
        let chain = X509::stack_from_pem(&chain).expect("parse chain");
        assert_eq!(chain.len(), 2);

        let key = fs::read(&paths.private_key).expect("key");
        assert!(pkey::PKey::private_key_from_pem(&key).is_ok());

        let dh = write_dh_parameters(dir.path()).expect("dh");
        let dh = fs::read(dh).expect("read dh");
        assert!(Dh::params_from_pem(&dh).is_ok());
    }

    #[test]
    fn test_encrypted_key_needs_passphrase() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dev = DevCertificate::generate("mx.example.com").expect("generate");
        let paths = dev.write(dir.path(), Some(b"hunter22".as_slice())).expect("write");

        let key = fs::read(&paths.private_key).expect("key");
        assert!(pkey::PKey::private_key_from_pem_passphrase(&key, b"hunter22").is_ok());
        assert!(pkey::PKey::private_key_from_pem_passphrase(&key, b"wrong").is_err());
    }
}
