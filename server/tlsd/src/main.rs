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

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use maild_tls::devcert::{write_dh_parameters, DevCertificate};
use maild_tls::initializer::bin_directory;
use maild_tls::prelude::*;
use sketching::tracing::{debug, error, info};
use sketching::LogLevel;

include!("./opt.rs");

const DEFAULT_CONFIG_PATH: &str = "/etc/maild/maild.toml";

/// Build every context the configuration describes. Each report raised on the
/// way is handed to `sink`. Returns how many contexts failed to build.
fn check_contexts(config: &ServerConfig, sink: &dyn DiagnosticSink) -> usize {
    let mut initializer = SslContextInitializer::new(&config.tls, sink);
    if let Some(dh_directory) = config.dh_directory.as_ref() {
        initializer = initializer.with_dh_directory(dh_directory);
    }
    debug!(dh_file = %initializer.dh_parameters_path().display());

    let mut failures = 0;
    for listener in config.listeners.iter() {
        match build_server_context(&initializer, listener, &config.certificates) {
            Ok(_) => info!(address = %listener.address, port = %listener.port, "listener context ok"),
            Err(err) => {
                error!(address = %listener.address, port = %listener.port, ?err, "listener context failed");
                failures += 1;
            }
        }
    }

    match build_client_context(&initializer) {
        Ok(_) => info!("client context ok"),
        Err(err) => {
            error!(?err, "client context failed");
            failures += 1;
        }
    }
    failures
}

fn config_test(config: &ServerConfig) -> ExitCode {
    let memory = MemorySink::new();
    let sink = TeeSink::new(&TracingSink, &memory);

    let failures = check_contexts(config, &sink);

    for report in memory.take() {
        println!("{}", report);
    }

    if failures == 0 {
        println!(
            "{} listener(s) and the client context are ok",
            config.listeners.len()
        );
        ExitCode::SUCCESS
    } else {
        println!("{} context(s) failed to build", failures);
        ExitCode::FAILURE
    }
}

fn gen_dev_cert(opt: &DevCertOpt) -> ExitCode {
    let dev = match DevCertificate::generate(&opt.domain) {
        Ok(dev) => dev,
        Err(err) => {
            error!(?err, "Failed to generate development certificate");
            return ExitCode::FAILURE;
        }
    };

    let passphrase = opt.passphrase.as_ref().map(|p| p.as_bytes());
    let paths = match dev.write(&opt.output, passphrase) {
        Ok(paths) => paths,
        Err(err) => {
            error!(?err, output = %opt.output.display(), "Failed to write development certificate");
            return ExitCode::FAILURE;
        }
    };

    println!("certificate_file = \"{}\"", paths.chain.display());
    println!("private_key_file = \"{}\"", paths.private_key.display());
    println!("ca = \"{}\"", paths.ca.display());

    if opt.dh {
        match write_dh_parameters(&opt.output) {
            Ok(path) => {
                debug!(path = %path.display(), "wrote DH parameters");
                println!("dh_directory = \"{}\"", opt.output.display());
            }
            Err(err) => {
                error!(?err, "Failed to write DH parameters");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let opt = MaildTlsParser::parse();

    match &opt.commands {
        MaildTlsOpt::GenDevCert(dopt) => {
            if let Err(err) = sketching::init_logging(LogLevel::default()) {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }
            gen_dev_cert(dopt)
        }
        MaildTlsOpt::ConfigTest(copt) => {
            let cfg_path = copt
                .config_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

            if !cfg_path.exists() {
                eprintln!(
                    "Refusing to run - config file {} does not exist",
                    cfg_path.display()
                );
                return ExitCode::FAILURE;
            }

            let config = match ServerConfig::new(&cfg_path) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Config Parse failure {}", e);
                    return ExitCode::FAILURE;
                }
            };

            if let Err(err) = sketching::init_logging(config.log_level.unwrap_or_default()) {
                eprintln!("{}", err);
                return ExitCode::FAILURE;
            }

            debug!(config = %cfg_path.display(), bin = %bin_directory().display());
            config_test(&config)
        }
    }
}
