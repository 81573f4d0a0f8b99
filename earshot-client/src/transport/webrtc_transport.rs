use crate::media::{LocalAudio, RemoteAudio};
use crate::transport::transport::{SdpKind, TransportFactory, TransportSession};
use crate::transport::transport_config::TransportConfig;
use crate::transport::transport_event::TransportEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use earshot_core::{IceServerConfig, ParticipantId};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Opens one `RTCPeerConnection` per remote peer, all sending the same local
/// Opus track.
pub struct WebRtcTransportFactory {
    ice_servers: RwLock<Vec<IceServerConfig>>,
    local_track: Arc<TrackLocalStaticSample>,
}

impl WebRtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        let local_track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: config.audio_clock_rate,
                channels: config.audio_channels,
                sdp_fmtp_line: String::new(),
                rtcp_feedback: vec![],
            },
            "voice".to_owned(),
            "earshot".to_owned(),
        ));

        Self {
            ice_servers: RwLock::new(config.ice_servers),
            local_track,
        }
    }

    /// The track the capture pipeline writes encoded samples into.
    pub fn local_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.local_track)
    }

    fn current_ice_servers(&self) -> Vec<IceServerConfig> {
        match self.ice_servers.read() {
            Ok(servers) => servers.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create_session(
        &self,
        peer_id: ParticipantId,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn TransportSession>> {
        let session = WebRtcSession::new(
            peer_id,
            self.current_ice_servers(),
            self.local_track(),
            events,
        )
        .await?;
        Ok(Box::new(session))
    }

    fn configure_ice(&self, ice_servers: &[IceServerConfig]) {
        info!("Using {} ICE server entries from coordinator", ice_servers.len());
        match self.ice_servers.write() {
            Ok(mut servers) => *servers = ice_servers.to_vec(),
            Err(poisoned) => *poisoned.into_inner() = ice_servers.to_vec(),
        }
    }
}

pub struct WebRtcSession {
    pub peer_id: ParticipantId,
    peer_connection: Arc<RTCPeerConnection>,
    local_track: Arc<TrackLocalStaticSample>,
}

impl WebRtcSession {
    /// Builds the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        peer_id: ParticipantId,
        ice_servers: Vec<IceServerConfig>,
        local_track: Arc<TrackLocalStaticSample>,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state for {}: {:?}", peer_id, s);
                    match s {
                        RTCPeerConnectionState::Connected => {
                            let _ = tx.send(TransportEvent::MediaFlowing(peer_id)).await;
                        }
                        RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                            let _ = tx
                                .send(TransportEvent::Failed(peer_id, format!("{:?}", s)))
                                .await;
                        }
                        _ => {}
                    }
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(peer_id, str_candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();

                Box::pin(async move {
                    debug!("Remote audio track from {}", peer_id);
                    let audio = RemoteAudio {
                        stream_id: format!("remote-{}", peer_id),
                        track: Some(track),
                    };
                    let _ = tx.send(TransportEvent::RemoteMedia(peer_id, audio)).await;
                })
            },
        ));

        Ok(Self {
            peer_id,
            peer_connection,
            local_track,
        })
    }
}

#[async_trait]
impl TransportSession for WebRtcSession {
    async fn add_local_audio(&self, audio: &LocalAudio) -> Result<()> {
        debug!(
            "Attaching local stream {} to session with {}",
            audio.stream_id, self.peer_id
        );
        self.peer_connection
            .add_track(Arc::clone(&self.local_track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add local audio track")?;
        Ok(())
    }

    async fn create_offer(&self) -> Result<String> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(&self, kind: SdpKind, sdp: String) -> Result<()> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate_json: String) -> Result<()> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_str(&candidate_json).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}
