use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{GameKind, Role, RoomPhase, Status};

/// Shared shape for LOGIN_REQ and REGISTER_REQ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Generic `{status, msg}` acknowledgement used by most response types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: Status,
    #[serde(default)]
    pub msg: String,
}

impl StatusReply {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            msg: String::new(),
        }
    }

    pub fn ok_with(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            msg: msg.into(),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            msg: msg.into(),
        }
    }
}

/// UPLOAD_INIT: declared metadata for an incoming bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadInitRequest {
    pub name: String,
    pub version: String,
    pub size: u64,
    pub checksum: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
    pub min_players: u32,
    pub max_players: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRemoveRequest {
    pub name: String,
}

/// One catalogue row as returned by GAME_LIST_RESP and DEV_MY_GAMES_RESP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: u32,
    pub name: String,
    pub version: String,
    pub min_players: u32,
    pub max_players: u32,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameListReply {
    pub status: Status,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyGamesReply {
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub game_name: String,
}

/// DOWNLOAD_INIT: stream header, or an error refusal when `status` is not ok.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadInitReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
}

impl DownloadInitReply {
    pub fn ok(size: u64, checksum: String, version: String, game_name: String) -> Self {
        Self {
            status: Status::Ok,
            msg: String::new(),
            size: Some(size),
            checksum: Some(checksum),
            version: Some(version),
            game_name: Some(game_name),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            msg: msg.into(),
            size: None,
            checksum: None,
            version: None,
            game_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCreateRequest {
    pub room_name: String,
    pub game_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomJoinRequest {
    pub room_id: u32,
}

/// Full room snapshot included in responses and status broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub id: u32,
    pub name: String,
    pub game_id: u32,
    pub game_name: String,
    pub host: String,
    pub members: Vec<String>,
    pub min_players: u32,
    pub max_players: u32,
    pub status: RoomPhase,
}

/// ROOM_CREATE_RESP / ROOM_JOIN_RESP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomSnapshot>,
}

impl RoomReply {
    pub fn ok(room: RoomSnapshot) -> Self {
        Self {
            status: Status::Ok,
            msg: String::new(),
            room: Some(room),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            msg: msg.into(),
            room: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomListReply {
    pub rooms: Vec<RoomSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatusUpdate {
    pub room: RoomSnapshot,
}

/// GAME_LAUNCH_EVENT: where the spawned game server is reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub server_ip: String,
    pub port: u16,
    pub game_id: u32,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateRequest {
    pub game_name: String,
    pub score: i64,
    #[serde(default)]
    pub comment: String,
}

/// READY_CHECK_REQ: asks a member to confirm it holds this exact version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyCheckRequest {
    pub game_name: String,
    pub version: String,
}

/// READY_CHECK_RESP from a member; `msg` explains a non-ok status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyCheckResponse {
    pub status: Status,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartFail {
    pub msg: String,
}

/// FORCE_LOGOUT: the account was bound to a newer session. The client closes
/// its own connection on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceLogoutNotice {
    pub msg: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailRequest {
    pub game_name: String,
}

/// One stored review, as persisted and as served by GAME_DETAIL_RESP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub user: String,
    pub score: i64,
    pub comment: String,
    pub time: DateTime<Utc>,
}

/// GAME_DETAIL_RESP success payload. Errors are sent as a bare `{status, msg}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailReply {
    pub status: Status,
    pub name: String,
    pub version: String,
    pub owner: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: GameKind,
    pub min_players: u32,
    pub max_players: u32,
    pub avg_score: f64,
    pub reviews: Vec<Review>,
    pub has_played: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub description: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginListReply {
    pub plugins: Vec<PluginDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDownloadRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDownloadReply {
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// ROOM_CHAT inbound payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub msg: String,
}

/// ROOM_CHAT outbound fanout payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub user: String,
    pub msg: String,
}
