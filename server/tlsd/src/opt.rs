#[derive(Debug, Args)]
struct CommonOpt {
    /// Path to the server's configuration file.
    #[clap(short, long = "config", env = "MAILD_CONFIG")]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DevCertOpt {
    /// The DNS name the leaf certificate is issued for.
    #[clap(short, long, default_value = "localhost")]
    domain: String,
    /// Directory the PEM files are written to. It must already exist.
    #[clap(short, long)]
    output: PathBuf,
    /// Also write a dh2048.pem next to the certificate.
    #[clap(long, action)]
    dh: bool,
    /// Encrypt the private key with this passphrase. maild refuses such keys,
    /// this only exists to check that it does.
    #[clap(long, env = "MAILD_DEV_KEY_PASSPHRASE")]
    passphrase: Option<String>,
}

#[derive(Debug, Subcommand)]
enum MaildTlsOpt {
    #[clap(name = "configtest")]
    /// Build the TLS context of every configured listener, and one outbound
    /// context, without opening any sockets.
    ConfigTest(CommonOpt),
    #[clap(name = "gen-dev-cert")]
    /// Create a throwaway CA and certificate. These are for testing and
    /// evaluation only, never use them in production!
    GenDevCert(DevCertOpt),
}

#[derive(Debug, Parser)]
#[command(name = "maild_tlsd")]
struct MaildTlsParser {
    #[command(subcommand)]
    commands: MaildTlsOpt,
}
