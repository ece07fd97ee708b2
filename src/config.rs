use crate::infrastructure::server_impl::connection::ConnectionSettings;
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 4221;

#[derive(Debug, Clone, Parser)]
#[command(version, about = "HTTP/1.1 server with a pattern router over raw TCP")]
pub struct ServerConfig {
    /// Address to bind on.
    #[arg(long, env = "SERVER_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// The port the server is hosted on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Idle time after which the bytes read so far are handled as the request.
    #[arg(long, env = "READ_TIMEOUT_MS", default_value_t = 300)]
    pub read_timeout_ms: u64,

    /// Bytes requested per socket read.
    #[arg(long, env = "BUFFER_SIZE", default_value_t = 1024)]
    pub buffer_size: usize,

    /// PostgreSQL connection string. Users are kept in memory when unset.
    #[arg(long, env = "DB_URL")]
    pub db_url: Option<String>,

    #[arg(long, env = "DB_POOL_SIZE", default_value_t = 8)]
    pub db_pool_size: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            buffer_size: self.buffer_size,
        }
    }
}
