use std::time::Duration;

/// Client-side mesh settings.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// How long a peer may take to reach `Connected` before the attempt is
    /// treated as failed.
    pub negotiation_timeout: Duration,

    /// How long `join` waits for the coordinator's welcome.
    pub welcome_timeout: Duration,

    /// Upper bound on waiting for peer sessions to close during leave.
    pub close_timeout: Duration,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Duration::from_secs(15),
            welcome_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(2),
        }
    }
}
