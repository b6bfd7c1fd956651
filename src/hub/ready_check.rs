//! Pre-launch ready check: GAME_START_CMD opens a window in which every room
//! member must confirm it holds the exact game version. All-ok hands off to
//! the launch worker; any failure or a timeout broadcasts GAME_START_FAIL.

use std::collections::HashSet;
use std::time::Duration;

use super::{ConnId, Hub, HubEvent};
use crate::protocol::{
    Frame, MsgType, ReadyCheckRequest, ReadyCheckResponse, Role, RoomPhase, StartFail,
};

/// Open response-collection window for one start attempt.
#[derive(Debug)]
pub struct ReadyCheck {
    pub version: String,
    /// Snapshot of the member count when the window opened.
    pub target: usize,
    pub all_ok: bool,
    pub first_failure: Option<String>,
    responded: HashSet<String>,
    /// Set once the window has closed (all responses in) while the launch
    /// worker runs; late or duplicate responses are ignored.
    pub closed: bool,
    pub seq: u64,
}

impl ReadyCheck {
    pub fn new(version: String, target: usize, seq: u64) -> Self {
        Self {
            version,
            target,
            all_ok: true,
            first_failure: None,
            responded: HashSet::new(),
            closed: false,
            seq,
        }
    }

    /// Record one member's response. Duplicate responses from the same
    /// username are ignored. Returns true when this response was counted.
    pub fn record(&mut self, username: &str, ok: bool, msg: &str) -> bool {
        if self.closed || !self.responded.insert(username.to_string()) {
            return false;
        }
        if !ok {
            self.all_ok = false;
            if self.first_failure.is_none() {
                self.first_failure = Some(format!("{username}: {msg}"));
            }
        }
        true
    }

    pub fn complete(&self) -> bool {
        self.responded.len() >= self.target
    }
}

impl Hub {
    /// GAME_START_CMD. Errors go back to the originating frame only; nothing
    /// is broadcast until the window resolves.
    pub(crate) fn handle_game_start(&mut self, conn: ConnId) {
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            self.fail_start_to(conn, "Player account required");
            return;
        };
        let Some(room_id) = self.rooms.room_of(&caller) else {
            self.fail_start_to(conn, "You are not in a room");
            return;
        };

        let timeout = Duration::from_secs(self.config.server.ready_check_timeout_secs);
        let events = self.events_tx.clone();

        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        if room.host != caller {
            self.fail_start_to(conn, "Only the host can start the game");
            return;
        }
        if room.phase != RoomPhase::Waiting {
            self.fail_start_to(conn, "Game already in progress");
            return;
        }
        if room.ready_check.is_some() {
            self.fail_start_to(conn, "A ready check is already pending");
            return;
        }
        if (room.members.len() as u32) < room.min_players {
            self.fail_start_to(conn, "Not enough players to start");
            return;
        }

        let game_id = room.game_id;
        let Some((_, game)) = self.catalog.get_by_id(game_id) else {
            self.fail_start_to(conn, "Game no longer available");
            return;
        };
        let version = game.latest_version.clone();
        let game_name = room.game_name.clone();

        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let seq = room.next_seq();
        room.ready_check = Some(ReadyCheck::new(version.clone(), room.members.len(), seq));
        let members = room.members.clone();

        tracing::info!(
            room_id,
            host = %caller,
            game = %game_name,
            %version,
            members = members.len(),
            "Ready check opened"
        );

        let request = Frame::json(
            MsgType::ReadyCheckReq,
            &ReadyCheckRequest {
                game_name,
                version,
            },
        );
        self.broadcast_to_members(&members, &request);

        // Expiry timer; the sequence number keeps a stale timer from touching
        // a later attempt.
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = events.send(HubEvent::ReadyCheckExpired { room_id, seq });
        });
    }

    pub(crate) async fn handle_ready_check_resp(&mut self, conn: ConnId, frame: &Frame) {
        let Some(resp) = self.parse_or_close::<ReadyCheckResponse>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            return;
        };
        let Some(room_id) = self.rooms.room_of(&caller) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let Some(check) = room.ready_check.as_mut() else {
            return;
        };

        if !check.record(&caller, resp.status.is_ok(), &resp.msg) {
            return;
        }
        tracing::debug!(room_id, member = %caller, ok = resp.status.is_ok(), "Ready check response");

        if !check.complete() {
            return;
        }
        check.closed = true;

        if check.all_ok {
            tracing::info!(room_id, "Ready check passed, launching");
            self.begin_launch(room_id);
        } else {
            let msg = check
                .first_failure
                .clone()
                .unwrap_or_else(|| "Ready check failed".to_string());
            self.abort_start(room_id, msg);
        }
    }

    /// Timer event for a window that never filled.
    pub(crate) fn handle_ready_check_expired(&mut self, room_id: u32, seq: u64) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        let stale = room
            .ready_check
            .as_ref()
            .map_or(true, |check| check.seq != seq || check.closed);
        if stale {
            return;
        }
        tracing::warn!(room_id, "Ready check timed out");
        self.abort_start(room_id, "Ready check timed out".to_string());
    }

    /// Close the window, broadcast GAME_START_FAIL, leave the room waiting.
    pub(crate) fn abort_start(&mut self, room_id: u32, msg: String) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.ready_check = None;
        let members = room.members.clone();
        tracing::info!(room_id, %msg, "Game start failed");
        self.broadcast_to_members(&members, &Frame::json(MsgType::GameStartFail, &StartFail { msg }));
    }

    /// Error reply for an invalid GAME_START_CMD, sent to the requester only.
    fn fail_start_to(&self, conn: ConnId, msg: &str) {
        self.send(
            conn,
            Frame::json(
                MsgType::GameStartFail,
                &StartFail {
                    msg: msg.to_string(),
                },
            ),
        );
    }
}
