use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rsa_keymgt::common::config::KeygenConfig;
use rsa_keymgt::{encode, generate, KeyMgtError, KeyRef, KeyRole};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = match KeygenConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Generate a new RSA key pair
    info!(bits = config.bits, "Generating RSA key pair");
    let pair = match generate(config.bits) {
        Ok(pair) => pair,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Each key is written independently; one failure does not stop the other
    let mut failed = false;
    for key in [KeyRef::from(pair.public_key()), KeyRef::from(pair.private_key())] {
        match write_key_file(&config.out_dir, key) {
            Ok(path) => info!("Key file created {}", path.display()),
            Err(e) => {
                error!(role = %key.role(), "{}", e);
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Creates `<dir>/<canonical name>` and PEM encodes `key` into it.
fn write_key_file(dir: &Path, key: KeyRef<'_>) -> rsa_keymgt::Result<PathBuf> {
    let name = key.role().canonical_name();
    let path = dir.join(name);
    let mut file = create_key_file(&path, key.role())
        .map_err(|source| KeyMgtError::IoWriteFailed { name, source })?;
    encode(&key, &mut file)?;
    Ok(path)
}

fn create_key_file(path: &Path, role: KeyRole) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if role == KeyRole::Private {
            options.mode(0o600);
        }
    }
    #[cfg(not(unix))]
    let _ = role;

    options.open(path)
}
