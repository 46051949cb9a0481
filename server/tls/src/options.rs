//! Protocol version policy and cipher list handling.

use std::fmt;

use bitflags::bitflags;

use crate::config::TlsConfigProvider;

/// The protocol versions an operator may switch on or off. SSL 2.0 is not in
/// this list as it is never allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolVersion {
    Ssl30,
    Tls10,
    Tls11,
    Tls12,
}

impl ProtocolVersion {
    pub const ALL: [ProtocolVersion; 4] = [
        ProtocolVersion::Ssl30,
        ProtocolVersion::Tls10,
        ProtocolVersion::Tls11,
        ProtocolVersion::Tls12,
    ];

    /// The option bit that switches this version off.
    pub fn disable_flag(self) -> ProtocolOptions {
        match self {
            ProtocolVersion::Ssl30 => ProtocolOptions::NO_SSLV3,
            ProtocolVersion::Tls10 => ProtocolOptions::NO_TLSV1,
            ProtocolVersion::Tls11 => ProtocolOptions::NO_TLSV1_1,
            ProtocolVersion::Tls12 => ProtocolOptions::NO_TLSV1_2,
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolVersion::Ssl30 => "SSLv3",
            ProtocolVersion::Tls10 => "TLSv1.0",
            ProtocolVersion::Tls11 => "TLSv1.1",
            ProtocolVersion::Tls12 => "TLSv1.2",
        })
    }
}

bitflags! {
    /// Library independent view of the context options we set. The native
    /// binding maps each flag onto its own option bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtocolOptions: u32 {
        /// Enable the library's bundle of interoperability workarounds.
        const ALL_BUG_WORKAROUNDS = 1 << 0;
        const SINGLE_DH_USE = 1 << 1;
        const SINGLE_ECDH_USE = 1 << 2;
        const NO_SSLV2 = 1 << 3;
        const NO_SSLV3 = 1 << 4;
        const NO_TLSV1 = 1 << 5;
        const NO_TLSV1_1 = 1 << 6;
        const NO_TLSV1_2 = 1 << 7;
    }
}

impl ProtocolOptions {
    /// Always set, whatever the configuration says.
    pub const BASELINE: ProtocolOptions = ProtocolOptions::ALL_BUG_WORKAROUNDS
        .union(ProtocolOptions::SINGLE_DH_USE)
        .union(ProtocolOptions::NO_SSLV2)
        .union(ProtocolOptions::SINGLE_ECDH_USE);

    /// All of the bits an operator can influence.
    pub const VERSION_TOGGLES: ProtocolOptions = ProtocolOptions::NO_SSLV3
        .union(ProtocolOptions::NO_TLSV1)
        .union(ProtocolOptions::NO_TLSV1_1)
        .union(ProtocolOptions::NO_TLSV1_2);
}

/// Work out the option set for a context from the configured version toggles.
pub fn protocol_options(config: &dyn TlsConfigProvider) -> ProtocolOptions {
    ProtocolVersion::ALL
        .into_iter()
        .filter(|version| !config.protocol_enabled(*version))
        .fold(ProtocolOptions::BASELINE, |options, version| {
            options | version.disable_flag()
        })
}

/// Strip carriage returns, newlines and spaces. Cipher lists are often wrapped
/// over several lines in the config file.
pub fn normalise_cipher_list(cipher_list: &str) -> String {
    cipher_list
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | ' '))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TlsSettings;

    fn settings_with(disabled: &[ProtocolVersion]) -> TlsSettings {
        let mut settings = TlsSettings::default();
        settings.protocols.sslv3 = true;
        for version in disabled {
            settings.protocols.set_enabled(*version, false);
        }
        settings
    }

    #[test]
    fn test_all_enabled_keeps_baseline_only() {
        let options = protocol_options(&settings_with(&[]));
        assert_eq!(options, ProtocolOptions::BASELINE);
        assert!(options.contains(ProtocolOptions::NO_SSLV2));
        assert!(!options.intersects(ProtocolOptions::VERSION_TOGGLES));
    }

    #[test]
    fn test_each_toggle_sets_only_its_bit() {
        for version in ProtocolVersion::ALL {
            let options = protocol_options(&settings_with(&[version]));
            assert_eq!(
                options & ProtocolOptions::VERSION_TOGGLES,
                version.disable_flag(),
                "disabling {} set the wrong bits",
                version
            );
            assert!(options.contains(ProtocolOptions::BASELINE));
        }
    }

    #[test]
    fn test_all_disabled() {
        let options = protocol_options(&settings_with(&ProtocolVersion::ALL));
        assert_eq!(
            options,
            ProtocolOptions::BASELINE | ProtocolOptions::VERSION_TOGGLES
        );
    }

    #[test]
    fn test_default_settings_refuse_sslv3() {
        let options = protocol_options(&TlsSettings::default());
        assert_eq!(
            options & ProtocolOptions::VERSION_TOGGLES,
            ProtocolOptions::NO_SSLV3
        );
    }

    #[test]
    fn test_normalise_cipher_list() {
        assert_eq!(
            normalise_cipher_list("ECDHE-RSA-AES128-GCM-SHA256:\r\n  ECDHE-RSA-AES256-GCM-SHA384 "),
            "ECDHE-RSA-AES128-GCM-SHA256:ECDHE-RSA-AES256-GCM-SHA384"
        );
        assert_eq!(normalise_cipher_list(" \r\n \n"), "");
        // Tabs are not ours to remove, the library decides what they mean.
        assert_eq!(normalise_cipher_list("HIGH\t"), "HIGH\t");
    }

    #[test]
    fn test_normalise_cipher_list_is_idempotent() {
        for input in [
            "",
            "HIGH:!aNULL",
            " HIGH :\r\n!MD5 ",
            "\n\n\n",
            "ECDHE-ECDSA-AES256-GCM-SHA384:\r\nECDHE-RSA-AES256-GCM-SHA384",
        ] {
            let once = normalise_cipher_list(input);
            assert_eq!(normalise_cipher_list(&once), once);
        }
    }
}
