//! Session management: REGISTER, LOGIN, and duplicate-login eviction.

use super::{ConnId, Hub};
use crate::protocol::{ForceLogoutNotice, Frame, LoginRequest, MsgType, StatusReply};

impl Hub {
    pub(crate) async fn handle_register(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<LoginRequest>(conn, frame).await else {
            return;
        };

        let reply = match self.users.register(req.role, &req.username, &req.password) {
            Ok(()) => {
                self.persist_users();
                tracing::info!(%conn, role = %req.role, username = %req.username, "Account registered");
                StatusReply::ok_with("Registration successful")
            }
            Err(e) => StatusReply::error(e.to_string()),
        };
        self.send(conn, Frame::json(MsgType::RegisterResp, &reply));
    }

    pub(crate) async fn handle_login(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<LoginRequest>(conn, frame).await else {
            return;
        };

        if let Err(e) = self.users.verify(req.role, &req.username, &req.password) {
            self.send(
                conn,
                Frame::json(MsgType::LoginResp, &StatusReply::error(e.to_string())),
            );
            return;
        }

        let key = (req.role, req.username.clone());

        // Evict any session already bound to this account. The old connection
        // is told to go away but not closed by the hub; once its binding is
        // cleared, anything further it sends is refused as unauthenticated.
        if let Some(old_conn) = self.sessions.remove(&key) {
            if old_conn != conn {
                if let Some(old) = self.conns.get_mut(&old_conn) {
                    old.identity = None;
                }
                self.send(
                    old_conn,
                    Frame::json(
                        MsgType::ForceLogout,
                        &ForceLogoutNotice {
                            msg: "Logged in from another location".to_string(),
                        },
                    ),
                );
                tracing::info!(
                    %old_conn,
                    role = %req.role,
                    username = %req.username,
                    "Evicted prior session on duplicate login"
                );
            }
        }

        // Release whatever this connection was previously logged in as.
        if let Some(state) = self.conns.get_mut(&conn) {
            if let Some(prev) = state.identity.take() {
                if prev != key {
                    self.sessions.remove(&prev);
                }
            }
            state.identity = Some(key.clone());
        }
        self.sessions.insert(key, conn);

        tracing::info!(%conn, role = %req.role, username = %req.username, "Login successful");
        self.send(
            conn,
            Frame::json(MsgType::LoginResp, &StatusReply::ok_with("Login successful")),
        );
    }
}
