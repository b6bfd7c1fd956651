//! Catalogue request handlers: LIST, DETAIL, RATE, MY_GAMES, REMOVE.

use chrono::Utc;

use super::{ConnId, Hub};
use crate::protocol::{
    DetailRequest, Frame, GameListReply, GameRemoveRequest, MsgType, MyGamesReply, RateRequest,
    Role, Status, StatusReply,
};
use crate::store::StoreError;

impl Hub {
    pub(crate) fn handle_game_list(&mut self, conn: ConnId) {
        if self.identity(conn).is_none() {
            self.send(
                conn,
                Frame::json(MsgType::GameListResp, &StatusReply::error("Not logged in")),
            );
            return;
        }
        let reply = GameListReply {
            status: Status::Ok,
            games: self.catalog.list(),
        };
        self.send(conn, Frame::json(MsgType::GameListResp, &reply));
    }

    pub(crate) async fn handle_game_detail(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<DetailRequest>(conn, frame).await else {
            return;
        };
        let Some((_, caller)) = self.identity(conn).cloned() else {
            self.send(
                conn,
                Frame::json(MsgType::GameDetailResp, &StatusReply::error("Not logged in")),
            );
            return;
        };

        match self.catalog.detail(&req.game_name, &caller) {
            Ok(detail) => self.send(conn, Frame::json(MsgType::GameDetailResp, &detail)),
            Err(e) => self.send(
                conn,
                Frame::json(MsgType::GameDetailResp, &StatusReply::error(e.to_string())),
            ),
        }
    }

    pub(crate) async fn handle_rate(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<RateRequest>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Player) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::GameRateResp,
                    &StatusReply::error("Player account required"),
                ),
            );
            return;
        };

        let reply = match self
            .catalog
            .rate(&req.game_name, &caller, req.score, req.comment, Utc::now())
        {
            Ok(()) => {
                self.persist_catalog();
                tracing::info!(player = %caller, game = %req.game_name, score = req.score, "Review recorded");
                StatusReply::ok_with("Review recorded")
            }
            Err(e) => StatusReply::error(e.to_string()),
        };
        self.send(conn, Frame::json(MsgType::GameRateResp, &reply));
    }

    pub(crate) fn handle_my_games(&mut self, conn: ConnId) {
        let Some(caller) = self.authed_as(conn, Role::Developer) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::DevMyGamesResp,
                    &StatusReply::error("Developer account required"),
                ),
            );
            return;
        };
        let reply = MyGamesReply {
            games: self.catalog.owned_by(&caller),
        };
        self.send(conn, Frame::json(MsgType::DevMyGamesResp, &reply));
    }

    pub(crate) async fn handle_game_remove(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<GameRemoveRequest>(conn, frame).await else {
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Developer) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::GameRemoveResp,
                    &StatusReply::error("Developer account required"),
                ),
            );
            return;
        };

        // Refuse while any room references the game, before touching the
        // catalogue.
        let game_id = self.catalog.get(&req.name).map(|game| game.id);
        let reply = match game_id {
            None => StatusReply::error(StoreError::GameNotFound.to_string()),
            Some(id) if self.rooms.references_game(id) => {
                StatusReply::error(StoreError::GameInUse.to_string())
            }
            Some(_) => match self.catalog.remove(&req.name, &caller) {
                Ok(removed) => {
                    self.persist_catalog();
                    tracing::info!(
                        developer = %caller,
                        game = %req.name,
                        id = removed.id,
                        "Game removed from catalogue (archives retained)"
                    );
                    StatusReply::ok_with("Game removed")
                }
                Err(e) => StatusReply::error(e.to_string()),
            },
        };
        self.send(conn, Frame::json(MsgType::GameRemoveResp, &reply));
    }
}
