use serde::Deserialize;

/// Normalized view of `GET /status/sessions`, independent of the upstream
/// server's own (XML- or JSON-shaped) response body.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub sessions: Vec<RawSession>,
}

#[derive(Debug, Clone)]
pub struct RawSession {
    pub session_key: String,
    pub session_id: String,
    pub user: SessionUser,
    pub player: SessionPlayer,
    pub media: SessionMedia,
    pub content: SessionContent,
}

#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: String,
    pub name: String,
    pub thumb: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionPlayer {
    pub machine_id: String,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub address: String,
    pub state: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionMedia {
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContent {
    pub title: Option<String>,
    pub grandparent_title: Option<String>,
    pub parent_title: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<i64>,
    pub view_offset: Option<i64>,
    pub media_type: Option<String>,
    pub thumb: Option<String>,
    pub art: Option<String>,
    pub rating_key: Option<String>,
    pub parent_rating_key: Option<String>,
}

// ---------------------------------------------------------------------
// Raw wire shapes for the upstream's JSON `MediaContainer` response.
// Field names follow the upstream server's own casing, not ours.
// ---------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct SessionsWireResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: MediaContainerWire,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct MediaContainerWire {
    #[serde(rename = "Metadata", default)]
    pub metadata: Vec<MetadataWire>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MetadataWire {
    #[serde(rename = "sessionKey")]
    pub session_key: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "grandparentTitle")]
    pub grandparent_title: Option<String>,
    #[serde(rename = "parentTitle")]
    pub parent_title: Option<String>,
    pub year: Option<i32>,
    pub duration: Option<i64>,
    #[serde(rename = "viewOffset")]
    pub view_offset: Option<i64>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub thumb: Option<String>,
    pub art: Option<String>,
    #[serde(rename = "ratingKey")]
    pub rating_key: Option<String>,
    #[serde(rename = "parentRatingKey")]
    pub parent_rating_key: Option<String>,
    #[serde(rename = "User")]
    pub user: Option<UserWire>,
    #[serde(rename = "Player")]
    pub player: Option<PlayerWire>,
    #[serde(rename = "Session")]
    pub session: Option<SessionIdWire>,
    #[serde(rename = "Media", default)]
    pub media: Vec<MediaWire>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserWire {
    pub id: Option<String>,
    pub title: Option<String>,
    pub thumb: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PlayerWire {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: Option<String>,
    pub platform: Option<String>,
    pub product: Option<String>,
    pub version: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SessionIdWire {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct MediaWire {
    pub resolution: Option<String>,
    pub bitrate: Option<i64>,
    pub container: Option<String>,
    #[serde(rename = "videoCodec")]
    pub video_codec: Option<String>,
    #[serde(rename = "audioCodec")]
    pub audio_codec: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct IdentityWireResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: IdentityContainerWire,
}

#[derive(Debug, Deserialize)]
pub(super) struct IdentityContainerWire {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: String,
}
