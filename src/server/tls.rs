//! Builds the rustls configuration shared by the control channel (AUTH TLS) and the data
//! channels (PROT P).

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// FtpsConfig shows how TLS security is configured for the server or a particular channel.
#[derive(Clone)]
pub(crate) enum FtpsConfig {
    Off,
    Building { certs_file: PathBuf, key_file: PathBuf },
    On { tls_config: Arc<ServerConfig> },
}

impl FtpsConfig {
    /// Materializes the rustls config, reading the PEM files if that hasn't happened yet.
    pub fn materialize(&mut self) -> io::Result<()> {
        if let FtpsConfig::Building { certs_file, key_file } = self {
            let tls_config = new_config(certs_file.as_path(), key_file.as_path())?;
            *self = FtpsConfig::On { tls_config };
        }
        Ok(())
    }

    pub fn config(&self) -> Option<Arc<ServerConfig>> {
        match self {
            FtpsConfig::On { tls_config } => Some(Arc::clone(tls_config)),
            _ => None,
        }
    }
}

impl fmt::Debug for FtpsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpsConfig::Off => write!(f, "Off"),
            FtpsConfig::Building { .. } => write!(f, "Building"),
            FtpsConfig::On { .. } => write!(f, "On"),
        }
    }
}

pub(crate) fn new_config<P: AsRef<Path>>(certs_file: P, key_file: P) -> io::Result<Arc<ServerConfig>> {
    let certs = load_certs(certs_file)?;
    let key = load_private_key(key_file)?;
    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    Ok(Arc::new(config))
}

fn load_certs<P: AsRef<Path>>(filename: P) -> io::Result<Vec<CertificateDer<'static>>> {
    let cert_file = File::open(filename)?;
    let mut reader = BufReader::new(cert_file);
    rustls_pemfile::certs(&mut reader).collect()
}

fn load_private_key<P: AsRef<Path>>(filename: P) -> io::Result<PrivateKeyDer<'static>> {
    let key_file = File::open(filename)?;
    let mut reader = BufReader::new(key_file);
    rustls_pemfile::private_key(&mut reader)?.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no private key found in key file"))
}
