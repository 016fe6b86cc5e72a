use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::AppError;

use super::types::{
    IdentityWireResponse, MetadataWire, RawSession, SessionContent, SessionMedia, SessionPlayer,
    SessionUser, SessionsWireResponse, SessionSnapshot,
};

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub host: String,
    pub port: u16,
    pub token: String,
    pub use_ssl: bool,
    pub ignore_ssl_errors: bool,
    pub timeout: Duration,
}

impl UpstreamConfig {
    fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// Single-instance HTTP client against the upstream media server.
///
/// Construction never touches the network - connectivity failures surface
/// on the first `fetch_sessions`/`terminate_session`/`server_identity` call,
/// not at startup.
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    identity: Arc<RwLock<Option<String>>>,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.ignore_ssl_errors)
            .build()
            .map_err(AppError::Upstream)?;

        Ok(Self { http, config, identity: Arc::new(RwLock::new(None)) })
    }

    /// Fetches and normalizes the current set of active playback sessions.
    /// Malformed entries (missing user id or machine id) are skipped and
    /// logged at debug rather than failing the whole snapshot.
    pub async fn fetch_sessions(&self) -> Result<SessionSnapshot, AppError> {
        let url = format!("{}/status/sessions", self.config.base_url());

        let response = tokio::time::timeout(
            self.config.timeout,
            self.http
                .get(&url)
                .header("X-Plex-Token", &self.config.token)
                .header("Accept", "application/json")
                .send(),
        )
        .await
        .map_err(|_| AppError::Internal("upstream fetch_sessions timed out".into()))??;

        let wire: SessionsWireResponse = response.json().await?;

        let mut sessions = Vec::with_capacity(wire.media_container.metadata.len());
        for entry in wire.media_container.metadata {
            match normalize(entry) {
                Some(session) => sessions.push(session),
                None => debug!("skipping session with missing user id or machine id"),
            }
        }

        Ok(SessionSnapshot { sessions })
    }

    /// Issues a stop-stream command. `reason` is surfaced to the end user
    /// by the upstream server; it is URL-encoded before being sent.
    pub async fn terminate_session(&self, session_id: &str, reason: &str) -> Result<(), AppError> {
        let encoded_reason: String = url_encode(reason);
        let url = format!(
            "{}/status/sessions/terminate?sessionId={session_id}&reason={encoded_reason}",
            self.config.base_url()
        );

        let response = tokio::time::timeout(
            self.config.timeout,
            self.http.get(&url).header("X-Plex-Token", &self.config.token).send(),
        )
        .await
        .map_err(|_| AppError::Internal(format!("terminate_session({session_id}) timed out")))??;

        if !response.status().is_success() {
            warn!(status = %response.status(), session_id, "upstream rejected terminate_session");
            return Err(AppError::Upstream(response.error_for_status().unwrap_err()));
        }

        Ok(())
    }

    /// Returns the upstream server's machine identifier, cached after the
    /// first successful lookup.
    pub async fn server_identity(&self) -> Result<String, AppError> {
        if let Some(id) = self.identity.read().await.clone() {
            return Ok(id);
        }

        let url = format!("{}/identity", self.config.base_url());
        let response = tokio::time::timeout(
            self.config.timeout,
            self.http.get(&url).header("X-Plex-Token", &self.config.token).send(),
        )
        .await
        .map_err(|_| AppError::Internal("upstream server_identity timed out".into()))??;

        let wire: IdentityWireResponse = response.json().await?;
        let id = wire.media_container.machine_identifier;

        *self.identity.write().await = Some(id.clone());
        Ok(id)
    }
}

fn normalize(entry: MetadataWire) -> Option<RawSession> {
    let user_wire = entry.user?;
    let player_wire = entry.player?;

    let user_id = user_wire.id?;
    let machine_id = player_wire.machine_identifier?;

    if user_id.is_empty() || machine_id.is_empty() {
        return None;
    }

    let session_key = entry.session_key.unwrap_or_default();
    let session_id = entry.session.and_then(|s| s.id).unwrap_or_else(|| session_key.clone());
    let media = entry.media.into_iter().next().unwrap_or_default();

    Some(RawSession {
        session_key,
        session_id,
        user: SessionUser { id: user_id, name: user_wire.title.unwrap_or_default(), thumb: user_wire.thumb },
        player: SessionPlayer {
            machine_id,
            platform: player_wire.platform,
            product: player_wire.product,
            version: player_wire.version,
            address: player_wire.address.unwrap_or_default(),
            state: player_wire.state,
            title: player_wire.title,
        },
        media: SessionMedia {
            resolution: media.resolution,
            bitrate: media.bitrate,
            container: media.container,
            video_codec: media.video_codec,
            audio_codec: media.audio_codec,
        },
        content: SessionContent {
            title: entry.title,
            grandparent_title: entry.grandparent_title,
            parent_title: entry.parent_title,
            year: entry.year,
            duration: entry.duration,
            view_offset: entry.view_offset,
            media_type: entry.media_type,
            thumb: entry.thumb,
            art: entry.art,
            rating_key: entry.rating_key,
            parent_rating_key: entry.parent_rating_key,
        },
    })
}

fn url_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_reserved_characters() {
        assert_eq!(url_encode("too many streams"), "too%20many%20streams");
        assert_eq!(url_encode("a&b=c"), "a%26b%3Dc");
    }

    #[test]
    fn url_encode_is_identity_for_unreserved_characters() {
        assert_eq!(url_encode("abcXYZ019-_.~"), "abcXYZ019-_.~");
    }
}
