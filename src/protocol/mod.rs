//! Wire protocol: framing, message type codes, and payload shapes.
//!
//! Every message on every connection is a single frame: a 4-byte big-endian
//! length `L`, a 1-byte message type, and `L - 1` payload bytes. Payloads are
//! UTF-8 JSON objects except for the upload/download data chunks, which carry
//! raw bytes.

pub mod frame;
pub mod messages;
pub mod types;

pub use frame::{Frame, FrameCodec, FrameError, DEFAULT_MAX_FRAME_LEN};

pub use messages::{
    ChatBroadcast, ChatMessage, DetailReply, DetailRequest, DownloadInitReply, DownloadRequest,
    ForceLogoutNotice, GameListReply, GameRemoveRequest, GameSummary, LaunchEvent, LoginRequest,
    MyGamesReply,
    PluginDescriptor, PluginDownloadReply, PluginDownloadRequest, PluginListReply, RateRequest,
    ReadyCheckRequest, ReadyCheckResponse, Review, RoomCreateRequest, RoomJoinRequest,
    RoomListReply, RoomReply, RoomSnapshot, RoomStatusUpdate, StartFail, StatusReply,
    UploadInitRequest,
};

pub use types::{GameKind, MsgType, Role, RoomPhase, Status};
