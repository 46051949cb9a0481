//! A [`TlsContext`] that records what was asked of it, for unit tests.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::{FileProbe, NamedCurve, PassphraseRefusal, TlsContext};
use crate::error::LibraryError;
use crate::options::ProtocolOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ApplyOptions(ProtocolOptions),
    ApplyCipherList(String),
    AllocateEcKey,
    InstallTmpEcdh,
    LoadTmpDhFile(PathBuf),
    LoadCertificateFile(PathBuf),
    LoadCertificateChainFile(PathBuf),
    LoadPrivateKeyFile(PathBuf),
}

impl Call {
    /// True for the steps only a server context takes.
    pub(crate) fn is_server_only(&self) -> bool {
        !matches!(self, Call::ApplyOptions(_) | Call::ApplyCipherList(_))
    }
}

#[derive(Default)]
pub(crate) struct RecordingContext {
    pub calls: Vec<Call>,
    pub reject_cipher_list: bool,
    pub fail_ec_allocation: bool,
    pub fail_ec_install: bool,
    pub fail_dh: bool,
    pub fail_certificate: bool,
    pub fail_chain: bool,
    pub fail_private_key: Option<LibraryError>,
    /// Behave as if the key file were encrypted: ask for the passphrase, then
    /// fail as the library would with an empty one.
    pub encrypted_private_key: bool,
    pub ec_allocated: Rc<Cell<usize>>,
    pub ec_released: Rc<Cell<usize>>,
}

impl RecordingContext {
    pub(crate) fn ec_keys_allocated(&self) -> usize {
        self.ec_allocated.get()
    }

    pub(crate) fn ec_keys_released(&self) -> usize {
        self.ec_released.get()
    }

    fn fail_if(fail: bool, what: &str) -> Result<(), LibraryError> {
        if fail {
            Err(LibraryError::new(format!("{}: no start line", what)))
        } else {
            Ok(())
        }
    }
}

pub(crate) struct FakeEcKey {
    released: Rc<Cell<usize>>,
}

impl Drop for FakeEcKey {
    fn drop(&mut self) {
        self.released.set(self.released.get() + 1);
    }
}

impl TlsContext for RecordingContext {
    type EcKey = FakeEcKey;

    fn apply_options(&mut self, options: ProtocolOptions) {
        self.calls.push(Call::ApplyOptions(options));
    }

    fn apply_cipher_list(&mut self, cipher_list: &str) -> Result<(), LibraryError> {
        self.calls.push(Call::ApplyCipherList(cipher_list.to_string()));
        Self::fail_if(self.reject_cipher_list, "no cipher match")
    }

    fn allocate_ec_key(&mut self, _curve: NamedCurve) -> Result<Self::EcKey, LibraryError> {
        self.calls.push(Call::AllocateEcKey);
        if self.fail_ec_allocation {
            return Err(LibraryError::unclassified());
        }
        self.ec_allocated.set(self.ec_allocated.get() + 1);
        Ok(FakeEcKey {
            released: self.ec_released.clone(),
        })
    }

    fn install_tmp_ecdh(&mut self, _key: &Self::EcKey) -> Result<(), LibraryError> {
        self.calls.push(Call::InstallTmpEcdh);
        Self::fail_if(self.fail_ec_install, "set_tmp_ecdh")
    }

    fn load_tmp_dh_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        self.calls.push(Call::LoadTmpDhFile(path.to_path_buf()));
        Self::fail_if(self.fail_dh, "dh params")
    }

    fn load_certificate_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        self.calls.push(Call::LoadCertificateFile(path.to_path_buf()));
        Self::fail_if(self.fail_certificate, "certificate")
    }

    fn load_certificate_chain_file(&mut self, path: &Path) -> Result<(), LibraryError> {
        self.calls.push(Call::LoadCertificateChainFile(path.to_path_buf()));
        Self::fail_if(self.fail_chain, "certificate chain")
    }

    fn load_private_key_file(
        &mut self,
        path: &Path,
        passphrase: &PassphraseRefusal<'_>,
    ) -> Result<(), LibraryError> {
        self.calls.push(Call::LoadPrivateKeyFile(path.to_path_buf()));
        if self.encrypted_private_key {
            let secret = passphrase.passphrase();
            if secret.is_empty() {
                return Err(LibraryError::new("bad decrypt"));
            }
        }
        match self.fail_private_key.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub(crate) struct FixedProbe(pub bool);

impl FileProbe for FixedProbe {
    fn exists(&self, _path: &Path) -> bool {
        self.0
    }
}
