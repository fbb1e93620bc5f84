use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_DATA_PATH: &str = "data/patients.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_path = env::var("PATIENT_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                warn!("PATIENT_DATA_PATH not set, using default {}", DEFAULT_DATA_PATH);
                PathBuf::from(DEFAULT_DATA_PATH)
            });

        let host = env::var("HOST")
            .unwrap_or_else(|_| {
                warn!("HOST not set, using default {}", DEFAULT_HOST);
                DEFAULT_HOST.to_string()
            });

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse::<u16>().unwrap_or_else(|_| {
                warn!("PORT value {:?} is not a valid port, using default {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            Err(_) => {
                warn!("PORT not set, using default {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        Self {
            data_path,
            host,
            port,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
