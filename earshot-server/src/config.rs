use crate::directory::DEFAULT_MAX_DISTANCE;
use clap::Parser;
use earshot_core::IceServerConfig;
use std::net::SocketAddr;

/// Coordinator settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "earshot-server", about = "Proximity voice signaling coordinator")]
pub struct ServerConfig {
    /// Address the WebSocket endpoint listens on.
    #[arg(long, env = "EARSHOT_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Proximity threshold in world units.
    #[arg(long, env = "EARSHOT_MAX_DISTANCE", default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_distance: f64,

    /// STUN/TURN urls handed to clients after they connect.
    #[arg(
        long = "ice-server",
        env = "EARSHOT_ICE_SERVERS",
        value_delimiter = ',',
        default_value = "stun:stun.l.google.com:19302"
    )]
    pub ice_servers: Vec<String>,

    /// Capacity of the coordinator command queue.
    #[arg(long, env = "EARSHOT_COMMAND_BUFFER", default_value_t = 256)]
    pub command_buffer: usize,
}

impl ServerConfig {
    pub fn ice_server_configs(&self) -> Vec<IceServerConfig> {
        if self.ice_servers.is_empty() {
            return Vec::new();
        }
        vec![IceServerConfig {
            urls: self.ice_servers.clone(),
            username: None,
            credential: None,
        }]
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_distance: DEFAULT_MAX_DISTANCE,
            ice_servers: vec!["stun:stun.l.google.com:19302".to_owned()],
            command_buffer: 256,
        }
    }
}
