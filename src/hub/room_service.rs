//! Room request handlers: CREATE, LIST, JOIN, LEAVE, and the status
//! broadcasts that follow every membership change.

use super::rooms::LeaveOutcome;
use super::{ConnId, Hub};
use crate::protocol::{
    Frame, MsgType, Role, RoomCreateRequest, RoomJoinRequest, RoomListReply, RoomReply,
};

impl Hub {
    pub(crate) async fn handle_room_create(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<RoomCreateRequest>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::RoomCreateResp,
                    &RoomReply::error("Player account required"),
                ),
            );
            return;
        };

        let Some((game_name, game)) = self.catalog.get_by_id(req.game_id) else {
            self.send(
                conn,
                Frame::json(MsgType::RoomCreateResp, &RoomReply::error("Game not found")),
            );
            return;
        };
        let (game_name, min_players, max_players) =
            (game_name.clone(), game.min_players, game.max_players);

        let (room_id, prior) = self.rooms.create(
            req.room_name,
            req.game_id,
            game_name,
            min_players,
            max_players,
            caller.clone(),
        );
        self.settle_departure(prior);

        tracing::info!(player = %caller, room_id, game_id = req.game_id, "Room created");

        let reply = match self.rooms.get(room_id) {
            Some(room) => RoomReply::ok(room.snapshot()),
            None => RoomReply::error("Room not found"),
        };
        self.send(conn, Frame::json(MsgType::RoomCreateResp, &reply));
        self.broadcast_room_status(room_id);
    }

    pub(crate) fn handle_room_list(&mut self, conn: ConnId) {
        if self.identity(conn).is_none() {
            self.send(
                conn,
                Frame::json(MsgType::RoomListResp, &RoomListReply { rooms: vec![] }),
            );
            return;
        }
        let reply = RoomListReply {
            rooms: self.rooms.iter().map(|r| r.snapshot()).collect(),
        };
        self.send(conn, Frame::json(MsgType::RoomListResp, &reply));
    }

    pub(crate) async fn handle_room_join(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<RoomJoinRequest>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::RoomJoinResp,
                    &RoomReply::error("Player account required"),
                ),
            );
            return;
        };

        match self.rooms.join(req.room_id, &caller) {
            Ok((admitted, prior)) => {
                self.settle_departure(prior);
                let reply = match self.rooms.get(req.room_id) {
                    Some(room) => RoomReply::ok(room.snapshot()),
                    None => RoomReply::error("Room not found"),
                };
                self.send(conn, Frame::json(MsgType::RoomJoinResp, &reply));
                if admitted {
                    tracing::info!(player = %caller, room_id = req.room_id, "Player joined room");
                    self.broadcast_room_status(req.room_id);
                }
            }
            Err(e) => {
                self.send(
                    conn,
                    Frame::json(MsgType::RoomJoinResp, &RoomReply::error(e.to_string())),
                );
            }
        }
    }

    pub(crate) async fn handle_room_leave(&mut self, conn: ConnId) {
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            return;
        };
        let outcome = self.rooms.leave(&caller);
        if let Some(ref left) = outcome {
            tracing::info!(player = %caller, room_id = left.room_id, "Player left room");
        }
        self.settle_departure(outcome);
    }

    /// Post-departure effects for whichever room the player vacated.
    pub(crate) fn settle_departure(&mut self, outcome: Option<LeaveOutcome>) {
        if let Some(outcome) = outcome {
            if outcome.destroyed {
                self.stop_room_child(outcome.room_id);
            } else {
                self.broadcast_room_status(outcome.room_id);
            }
        }
    }
}
