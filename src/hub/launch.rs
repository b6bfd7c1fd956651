//! Launch worker and child supervision: extract the bundle, allocate a port,
//! spawn the game server, and watch it until exit.
//!
//! Workers never touch hub state. They receive a plain [`LaunchRequest`]
//! snapshot and report back through the event channel; a waiter task owns the
//! spawned child and posts [`HubEvent::ChildExited`] the moment it dies.

use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use super::{Hub, HubEvent};
use crate::manifest::{BundleManifest, ManifestError};
use crate::protocol::{Frame, LaunchEvent, MsgType, RoomPhase, StartFail};

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to prepare session directory: {0}")]
    Prepare(#[source] std::io::Error),
    #[error("failed to open archive: {0}")]
    OpenArchive(#[source] std::io::Error),
    #[error("failed to extract archive: {0}")]
    Extract(#[from] zip::result::ZipError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("no free port available: {0}")]
    Port(#[source] std::io::Error),
    #[error("failed to spawn game server: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("extraction task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Everything the worker needs, snapshotted from hub state.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub room_id: u32,
    pub seq: u64,
    pub game_id: u32,
    pub game_name: String,
    pub version: String,
    pub archive_path: PathBuf,
    pub session_dir: PathBuf,
}

/// Successful spawn, reported back to the hub.
#[derive(Debug)]
pub struct LaunchSuccess {
    pub port: u16,
    /// Version actually extracted and launched.
    pub version: String,
    kill: oneshot::Sender<()>,
}

/// Hub-side handle for a live child.
#[derive(Debug)]
pub struct RunningChild {
    pub seq: u64,
    pub port: u16,
    kill: Option<oneshot::Sender<()>>,
}

impl RunningChild {
    pub fn kill(mut self) {
        if let Some(kill) = self.kill.take() {
            let _ = kill.send(());
        }
    }
}

impl Hub {
    /// Hand a passed ready check off to the launch worker.
    pub(crate) fn begin_launch(&mut self, room_id: u32) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };
        let seq = room.launch_seq;
        let game_id = room.game_id;
        let game_name = room.game_name.clone();

        let archive = self.catalog.get(&game_name).and_then(|game| {
            game.latest()
                .map(|entry| (game.latest_version.clone(), entry.archive_path.clone()))
        });
        let Some((version, archive_path)) = archive else {
            self.abort_start(room_id, "Game archive no longer available".to_string());
            return;
        };

        let request = LaunchRequest {
            room_id,
            seq,
            game_id,
            game_name,
            version,
            archive_path: PathBuf::from(archive_path),
            session_dir: self.config.storage.session_dir(room_id),
        };
        spawn_launch_worker(self.events_tx.clone(), request);
    }

    pub(crate) fn handle_launch_finished(
        &mut self,
        room_id: u32,
        seq: u64,
        outcome: Result<LaunchSuccess, String>,
    ) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            // Room emptied while the worker ran; reap the orphan child.
            if let Ok(success) = outcome {
                let _ = success.kill.send(());
            }
            return;
        };
        if room.launch_seq != seq {
            if let Ok(success) = outcome {
                let _ = success.kill.send(());
            }
            return;
        }
        room.ready_check = None;

        match outcome {
            Ok(success) => {
                room.phase = RoomPhase::Playing;
                let members = room.members.clone();
                let game_id = room.game_id;
                let game_name = room.game_name.clone();
                let version = success.version.clone();
                let port = success.port;

                self.running.insert(
                    room_id,
                    RunningChild {
                        seq,
                        port,
                        kill: Some(success.kill),
                    },
                );

                // Launching counts as playing for every member present now.
                self.catalog
                    .record_play(&game_name, members.iter().map(String::as_str));
                self.persist_catalog();

                tracing::info!(room_id, port, game = %game_name, "Game launched");
                let event = Frame::json(
                    MsgType::GameLaunchEvent,
                    &LaunchEvent {
                        server_ip: self.config.public_addr.clone(),
                        port,
                        game_id,
                        version,
                    },
                );
                self.broadcast_to_members(&members, &event);
                self.broadcast_room_status(room_id);
            }
            Err(msg) => {
                let members = room.members.clone();
                tracing::warn!(room_id, %msg, "Launch failed");
                self.broadcast_to_members(
                    &members,
                    &Frame::json(MsgType::GameStartFail, &StartFail { msg }),
                );
            }
        }
    }

    /// The child for `room_id` exited on its own (or was killed). Revert the
    /// room to waiting and tell the members.
    pub(crate) fn handle_child_exited(&mut self, room_id: u32, seq: u64) {
        let current = self
            .running
            .get(&room_id)
            .is_some_and(|child| child.seq == seq);
        if !current {
            return;
        }
        self.running.remove(&room_id);

        if let Some(room) = self.rooms.get_mut(room_id) {
            tracing::info!(room_id, "Game child exited, room back to waiting");
            room.phase = RoomPhase::Waiting;
            self.broadcast_room_status(room_id);
        }
    }
}

fn spawn_launch_worker(events: mpsc::UnboundedSender<HubEvent>, request: LaunchRequest) {
    tokio::spawn(async move {
        let room_id = request.room_id;
        let seq = request.seq;
        let outcome = match run_launch(&request).await {
            Ok((port, mut child)) => {
                let (kill_tx, kill_rx) = oneshot::channel();
                let waiter_events = events.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        status = child.wait() => {
                            tracing::debug!(room_id, ?status, "Game child exited");
                        }
                        _ = kill_rx => {
                            if let Err(e) = child.kill().await {
                                tracing::warn!(room_id, error = %e, "Failed to kill game child");
                            }
                        }
                    }
                    let _ = waiter_events.send(HubEvent::ChildExited { room_id, seq });
                });
                Ok(LaunchSuccess {
                    port,
                    version: request.version.clone(),
                    kill: kill_tx,
                })
            }
            Err(e) => Err(e.to_string()),
        };
        let _ = events.send(HubEvent::LaunchFinished {
            room_id,
            seq,
            outcome,
        });
    });
}

async fn run_launch(request: &LaunchRequest) -> Result<(u16, tokio::process::Child), LaunchError> {
    let session_dir = request.session_dir.clone();
    let archive_path = request.archive_path.clone();

    // Extraction is blocking zip work; keep it off the runtime threads.
    let manifest: BundleManifest = tokio::task::spawn_blocking(move || {
        prepare_session_dir(&session_dir)?;
        extract_archive(&archive_path, &session_dir)?;
        Ok::<_, LaunchError>(BundleManifest::load_from_dir(&session_dir)?)
    })
    .await??;

    let port = allocate_port().map_err(LaunchError::Port)?;

    let (program, args) = manifest
        .execution
        .server_cmd
        .split_first()
        .ok_or(LaunchError::Manifest(ManifestError::EmptyServerCmd))?;

    let child = Command::new(program)
        .args(args)
        .arg("--port")
        .arg(port.to_string())
        .current_dir(&request.session_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(LaunchError::Spawn)?;

    tracing::info!(
        room_id = request.room_id,
        game = %request.game_name,
        version = %request.version,
        port,
        %program,
        "Game server spawned"
    );
    Ok((port, child))
}

/// Wipe and recreate the room-scoped extraction directory.
fn prepare_session_dir(dir: &std::path::Path) -> Result<(), LaunchError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(LaunchError::Prepare(e)),
    }
    std::fs::create_dir_all(dir).map_err(LaunchError::Prepare)
}

fn extract_archive(archive: &std::path::Path, dest: &std::path::Path) -> Result<(), LaunchError> {
    let file = std::fs::File::open(archive).map_err(LaunchError::OpenArchive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    zip.extract(dest)?;
    Ok(())
}

/// Ask the OS for an ephemeral port by binding port 0 and reading back the
/// assignment. The probe socket is closed before the child binds; the brief
/// race is accepted.
fn allocate_port() -> std::io::Result<u16> {
    let probe = std::net::TcpListener::bind(("0.0.0.0", 0))?;
    Ok(probe.local_addr()?.port())
}
