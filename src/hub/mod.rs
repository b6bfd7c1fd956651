//! The hub: a single state-owning task fed by one event channel.
//!
//! All mutation of users, games, rooms, sessions, and upload state happens
//! here, serialised through [`HubEvent`]s. Connection tasks only decode frames
//! and forward them; workers (bundle extraction, child spawn, archive
//! streaming) receive plain snapshots and report back through the same
//! channel. Outbound frames are enqueued on per-connection senders, so each
//! connection sees its frames in emission order.

pub mod catalog_service;
pub mod chat;
pub mod download;
pub mod launch;
pub mod plugins;
pub mod ready_check;
pub mod room_service;
pub mod rooms;
pub mod session;
pub mod upload;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::Config;
use crate::protocol::{Frame, MsgType, Role, RoomStatusUpdate};
use crate::store::{snapshot, Catalog, UserStore};

use launch::{LaunchSuccess, RunningChild};
use rooms::Rooms;
use upload::UploadState;

/// Opaque connection identifier, assigned at accept time.
pub type ConnId = Uuid;

/// Everything that can wake the hub.
#[derive(Debug)]
pub enum HubEvent {
    Connected {
        conn: ConnId,
        addr: SocketAddr,
        tx: mpsc::UnboundedSender<Frame>,
    },
    Inbound {
        conn: ConnId,
        frame: Frame,
    },
    Disconnected {
        conn: ConnId,
    },
    /// A launch worker finished (successfully or not) for a start attempt.
    LaunchFinished {
        room_id: u32,
        seq: u64,
        outcome: Result<LaunchSuccess, String>,
    },
    /// The game child bound to a room exited.
    ChildExited {
        room_id: u32,
        seq: u64,
    },
    /// A ready-check window hit its timeout.
    ReadyCheckExpired {
        room_id: u32,
        seq: u64,
    },
}

pub(crate) struct ConnState {
    pub addr: SocketAddr,
    pub tx: mpsc::UnboundedSender<Frame>,
    /// Bound account, if the connection has logged in.
    pub identity: Option<(Role, String)>,
    /// In-flight upload, if any. Exists only between UPLOAD_INIT and
    /// UPLOAD_END.
    pub upload: Option<UploadState>,
}

pub struct Hub {
    pub(crate) config: Arc<Config>,
    pub(crate) users: UserStore,
    pub(crate) catalog: Catalog,
    pub(crate) conns: HashMap<ConnId, ConnState>,
    /// Singleton session binding per (role, username).
    pub(crate) sessions: HashMap<(Role, String), ConnId>,
    pub(crate) rooms: Rooms,
    /// Live game children keyed by room id.
    pub(crate) running: HashMap<u32, RunningChild>,
    /// Cloned into workers so results flow back into the event loop.
    pub(crate) events_tx: mpsc::UnboundedSender<HubEvent>,
}

impl Hub {
    pub fn new(
        config: Arc<Config>,
        users: UserStore,
        catalog: Catalog,
        events_tx: mpsc::UnboundedSender<HubEvent>,
    ) -> Self {
        Self {
            config,
            users,
            catalog,
            conns: HashMap::new(),
            sessions: HashMap::new(),
            rooms: Rooms::new(),
            running: HashMap::new(),
            events_tx,
        }
    }

    /// Drive the hub until every event sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HubEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::info!("Hub event channel closed, shutting down");
    }

    pub async fn handle_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::Connected { conn, addr, tx } => {
                tracing::info!(%conn, %addr, "Client connected");
                self.conns.insert(
                    conn,
                    ConnState {
                        addr,
                        tx,
                        identity: None,
                        upload: None,
                    },
                );
            }
            HubEvent::Inbound { conn, frame } => self.handle_inbound(conn, frame).await,
            HubEvent::Disconnected { conn } => self.cleanup_connection(conn).await,
            HubEvent::LaunchFinished {
                room_id,
                seq,
                outcome,
            } => self.handle_launch_finished(room_id, seq, outcome),
            HubEvent::ChildExited { room_id, seq } => self.handle_child_exited(room_id, seq),
            HubEvent::ReadyCheckExpired { room_id, seq } => {
                self.handle_ready_check_expired(room_id, seq);
            }
        }
    }

    async fn handle_inbound(&mut self, conn: ConnId, frame: Frame) {
        if !self.conns.contains_key(&conn) {
            // Raced with an eviction or cleanup; the socket is on its way out.
            return;
        }

        let Some(ty) = frame.msg_type() else {
            tracing::warn!(%conn, kind = frame.kind, "Unknown message type, closing connection");
            self.cleanup_connection(conn).await;
            return;
        };

        match ty {
            MsgType::LoginReq => self.handle_login(conn, &frame).await,
            MsgType::RegisterReq => self.handle_register(conn, &frame).await,

            MsgType::UploadInit => self.handle_upload_init(conn, &frame).await,
            MsgType::UploadData => self.handle_upload_data(conn, &frame).await,
            MsgType::UploadEnd => self.handle_upload_end(conn).await,
            MsgType::GameRemoveReq => self.handle_game_remove(conn, &frame).await,

            MsgType::GameListReq => self.handle_game_list(conn),
            MsgType::GameDetailReq => self.handle_game_detail(conn, &frame).await,
            MsgType::GameRateReq => self.handle_rate(conn, &frame).await,
            MsgType::DevMyGamesReq => self.handle_my_games(conn),
            MsgType::DownloadReq => self.handle_download(conn, &frame).await,

            MsgType::RoomCreateReq => self.handle_room_create(conn, &frame).await,
            MsgType::RoomListReq => self.handle_room_list(conn),
            MsgType::RoomJoinReq => self.handle_room_join(conn, &frame).await,
            MsgType::RoomLeaveReq => self.handle_room_leave(conn).await,

            MsgType::GameStartCmd => self.handle_game_start(conn),
            MsgType::ReadyCheckResp => self.handle_ready_check_resp(conn, &frame).await,

            MsgType::RoomChat => self.handle_chat(conn, &frame).await,
            MsgType::PluginListReq => self.handle_plugin_list(conn),
            MsgType::PluginDownloadReq => self.handle_plugin_download(conn, &frame).await,

            // Server-to-client types arriving inbound are a protocol
            // violation, same as an unknown code.
            _ => {
                tracing::warn!(%conn, ?ty, "Unexpected inbound message type, closing connection");
                self.cleanup_connection(conn).await;
            }
        }
    }

    /// Release everything a connection holds: pending upload, session
    /// binding, room membership. Dropping the sender ends the writer side,
    /// which closes the socket.
    pub(crate) async fn cleanup_connection(&mut self, conn: ConnId) {
        let Some(state) = self.conns.remove(&conn) else {
            return;
        };

        if let Some(upload) = state.upload {
            upload.discard().await;
        }

        if let Some((role, username)) = state.identity {
            if self.sessions.get(&(role, username.clone())) == Some(&conn) {
                self.sessions.remove(&(role, username.clone()));
            }
            if role == Role::Player {
                self.remove_player_from_rooms(&username);
            }
            tracing::info!(%conn, addr = %state.addr, %role, %username, "Session released");
        } else {
            tracing::debug!(%conn, addr = %state.addr, "Connection closed");
        }
    }

    /// Take a player out of the room table and emit the follow-up effects
    /// (child teardown for a destroyed room, status broadcast otherwise).
    pub(crate) fn remove_player_from_rooms(&mut self, username: &str) {
        let outcome = self.rooms.leave(username);
        self.settle_departure(outcome);
    }

    /// Kill the child bound to a room, if one is running. The waiter task
    /// reports the exit, which is ignored once the room is gone.
    pub(crate) fn stop_room_child(&mut self, room_id: u32) {
        if let Some(child) = self.running.remove(&room_id) {
            tracing::info!(room_id, "Terminating game child for destroyed room");
            child.kill();
        }
    }

    /// Parse a JSON payload; a malformed payload closes the connection per
    /// protocol policy and yields `None`.
    pub(crate) async fn parse_or_close<T: DeserializeOwned>(
        &mut self,
        conn: ConnId,
        frame: &Frame,
    ) -> Option<T> {
        match frame.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(%conn, error = %e, "Malformed payload, closing connection");
                self.cleanup_connection(conn).await;
                None
            }
        }
    }

    pub(crate) fn identity(&self, conn: ConnId) -> Option<&(Role, String)> {
        self.conns.get(&conn).and_then(|c| c.identity.as_ref())
    }

    /// The bound username when the connection is logged in with `role`.
    pub(crate) fn authed_as(&self, conn: ConnId, role: Role) -> Option<String> {
        match self.identity(conn) {
            Some((r, name)) if *r == role => Some(name.clone()),
            _ => None,
        }
    }

    pub(crate) fn send(&self, conn: ConnId, frame: Frame) {
        if let Some(state) = self.conns.get(&conn) {
            let _ = state.tx.send(frame);
        }
    }

    /// Route a frame to a logged-in player by username.
    pub(crate) fn send_to_player(&self, username: &str, frame: Frame) {
        if let Some(conn) = self.sessions.get(&(Role::Player, username.to_string())) {
            self.send(*conn, frame);
        }
    }

    pub(crate) fn broadcast_to_members(&self, members: &[String], frame: &Frame) {
        for member in members {
            self.send_to_player(member, frame.clone());
        }
    }

    /// Send the full room snapshot to every member. Fires after every
    /// membership or status change.
    pub(crate) fn broadcast_room_status(&self, room_id: u32) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let frame = Frame::json(
            MsgType::RoomStatusUpdate,
            &RoomStatusUpdate {
                room: room.snapshot(),
            },
        );
        self.broadcast_to_members(&room.members.clone(), &frame);
    }

    /// Read access to the catalogue, for inspection and tooling.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Mutable catalogue access, for recovery tooling and test setup.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub(crate) fn persist_users(&self) {
        let path = self.config.storage.users_path();
        if let Err(e) = snapshot::save_json(&path, &self.users) {
            tracing::error!(error = %e, path = %path.display(), "Failed to write users snapshot");
        }
    }

    pub(crate) fn persist_catalog(&self) {
        let path = self.config.storage.games_path();
        if let Err(e) = snapshot::save_json(&path, &self.catalog) {
            tracing::error!(error = %e, path = %path.display(), "Failed to write games snapshot");
        }
    }
}
