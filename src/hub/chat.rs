//! Room chat relay: fan a member's message out to the whole room, sender
//! included. Messages from players outside any room are dropped.

use super::{ConnId, Hub};
use crate::protocol::{ChatBroadcast, ChatMessage, Frame, MsgType, Role};

impl Hub {
    pub(crate) async fn handle_chat(&mut self, conn: ConnId, frame: &Frame) {
        let Some(chat) = self.parse_or_close::<ChatMessage>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            return;
        };
        let Some(room_id) = self.rooms.room_of(&caller) else {
            tracing::debug!(player = %caller, "Chat from player outside any room, dropped");
            return;
        };
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };

        let fanout = Frame::json(
            MsgType::RoomChat,
            &ChatBroadcast {
                user: caller,
                msg: chat.msg,
            },
        );
        self.broadcast_to_members(&room.members.clone(), &fanout);
    }
}
