use serde::{Deserialize, Serialize};

/// Fixed message type codes carried in the frame header.
///
/// The numeric values are part of the wire contract shared with the player and
/// developer front-ends and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MsgType {
    LoginReq = 1,
    LoginResp = 2,
    RegisterReq = 3,
    RegisterResp = 4,

    UploadInit = 10,
    UploadData = 11,
    UploadEnd = 12,
    GameRemoveReq = 13,
    GameRemoveResp = 14,

    GameListReq = 20,
    GameListResp = 21,
    DownloadReq = 22,
    DownloadInit = 23,
    DownloadData = 24,
    DownloadEnd = 25,

    RoomCreateReq = 30,
    RoomCreateResp = 31,
    RoomListReq = 32,
    RoomListResp = 33,
    RoomJoinReq = 34,
    RoomJoinResp = 35,
    RoomLeaveReq = 36,
    RoomStatusUpdate = 37,
    GameStartCmd = 38,
    GameLaunchEvent = 39,
    GameRateReq = 40,
    GameRateResp = 41,

    DevMyGamesReq = 50,
    DevMyGamesResp = 51,

    ReadyCheckReq = 60,
    ReadyCheckResp = 61,
    GameStartFail = 62,

    ForceLogout = 70,

    GameDetailReq = 80,
    GameDetailResp = 81,

    PluginListReq = 90,
    PluginListResp = 91,
    PluginDownloadReq = 92,
    PluginDownloadResp = 93,

    RoomChat = 95,
}

impl MsgType {
    /// Map a raw header byte back to a known message type.
    pub fn from_code(code: u8) -> Option<Self> {
        let ty = match code {
            1 => Self::LoginReq,
            2 => Self::LoginResp,
            3 => Self::RegisterReq,
            4 => Self::RegisterResp,
            10 => Self::UploadInit,
            11 => Self::UploadData,
            12 => Self::UploadEnd,
            13 => Self::GameRemoveReq,
            14 => Self::GameRemoveResp,
            20 => Self::GameListReq,
            21 => Self::GameListResp,
            22 => Self::DownloadReq,
            23 => Self::DownloadInit,
            24 => Self::DownloadData,
            25 => Self::DownloadEnd,
            30 => Self::RoomCreateReq,
            31 => Self::RoomCreateResp,
            32 => Self::RoomListReq,
            33 => Self::RoomListResp,
            34 => Self::RoomJoinReq,
            35 => Self::RoomJoinResp,
            36 => Self::RoomLeaveReq,
            37 => Self::RoomStatusUpdate,
            38 => Self::GameStartCmd,
            39 => Self::GameLaunchEvent,
            40 => Self::GameRateReq,
            41 => Self::GameRateResp,
            50 => Self::DevMyGamesReq,
            51 => Self::DevMyGamesResp,
            60 => Self::ReadyCheckReq,
            61 => Self::ReadyCheckResp,
            62 => Self::GameStartFail,
            70 => Self::ForceLogout,
            80 => Self::GameDetailReq,
            81 => Self::GameDetailResp,
            90 => Self::PluginListReq,
            91 => Self::PluginListResp,
            92 => Self::PluginDownloadReq,
            93 => Self::PluginDownloadResp,
            95 => Self::RoomChat,
            _ => return None,
        };
        Some(ty)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Upload and download data chunks carry raw bytes instead of JSON.
    pub fn is_binary(self) -> bool {
        matches!(self, Self::UploadData | Self::DownloadData)
    }
}

/// Account role. The same username may exist in both roles and identifies two
/// distinct accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Developer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Developer => "developer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a bundled game presents itself on the player's machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Cli,
    Gui,
}

/// Room lifecycle phase. A `Playing` room is bound to a live game child; when
/// the child exits the room reverts to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    #[default]
    Waiting,
    Playing,
}

/// Outcome marker carried by every acknowledgement payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_type_codes_round_trip() {
        for code in 0u8..=255 {
            if let Some(ty) = MsgType::from_code(code) {
                assert_eq!(ty.code(), code);
            }
        }
    }

    #[test]
    fn wire_codes_are_fixed() {
        assert_eq!(MsgType::LoginReq.code(), 1);
        assert_eq!(MsgType::UploadInit.code(), 10);
        assert_eq!(MsgType::GameListReq.code(), 20);
        assert_eq!(MsgType::RoomCreateReq.code(), 30);
        assert_eq!(MsgType::GameStartCmd.code(), 38);
        assert_eq!(MsgType::DevMyGamesReq.code(), 50);
        assert_eq!(MsgType::ReadyCheckReq.code(), 60);
        assert_eq!(MsgType::ForceLogout.code(), 70);
        assert_eq!(MsgType::GameDetailReq.code(), 80);
        assert_eq!(MsgType::PluginListReq.code(), 90);
        assert_eq!(MsgType::RoomChat.code(), 95);
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert_eq!(MsgType::from_code(0), None);
        assert_eq!(MsgType::from_code(99), None);
        assert_eq!(MsgType::from_code(255), None);
    }

    #[test]
    fn only_data_chunks_are_binary() {
        assert!(MsgType::UploadData.is_binary());
        assert!(MsgType::DownloadData.is_binary());
        assert!(!MsgType::UploadInit.is_binary());
        assert!(!MsgType::DownloadEnd.is_binary());
    }

    #[test]
    fn role_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Player).unwrap(), "\"player\"");
        let role: Role = serde_json::from_str("\"developer\"").unwrap();
        assert_eq!(role, Role::Developer);
    }
}
