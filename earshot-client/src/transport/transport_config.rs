use earshot_core::IceServerConfig;

/// WebRTC settings (STUN/TURN, local audio track).
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub audio_clock_rate: u32,
    pub audio_channels: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                username: None,
                credential: None,
            }],
            audio_clock_rate: 48000,
            audio_channels: 2,
        }
    }
}
