//! Chunked bundle upload: UPLOAD_INIT reserves per-connection state,
//! UPLOAD_DATA appends to a temp file, UPLOAD_END verifies the MD5 and
//! commits the archive plus catalogue metadata atomically.

use std::path::PathBuf;

use md5::{Digest, Md5};
use tokio::io::AsyncWriteExt;

use super::{ConnId, Hub};
use crate::protocol::{Frame, MsgType, Role, StatusReply, UploadInitRequest};

/// In-flight upload bound to one connection.
pub(crate) struct UploadState {
    file: tokio::fs::File,
    tmp_path: PathBuf,
    final_path: PathBuf,
    declared: UploadInitRequest,
    hasher: Md5,
    received: u64,
}

impl std::fmt::Debug for UploadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadState")
            .field("name", &self.declared.name)
            .field("version", &self.declared.version)
            .field("received", &self.received)
            .finish()
    }
}

impl UploadState {
    /// Drop the partial file. Called on disconnect and on replaced uploads.
    pub(crate) async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.tmp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    path = %self.tmp_path.display(),
                    error = %e,
                    "Failed to remove partial upload"
                );
            }
        }
    }
}

impl Hub {
    pub(crate) async fn handle_upload_init(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<UploadInitRequest>(conn, frame).await else {
            return;
        };

        let Some(caller) = self.authed_as(conn, Role::Developer) else {
            self.send(
                conn,
                Frame::json(
                    MsgType::UploadEnd,
                    &StatusReply::error("Developer account required"),
                ),
            );
            return;
        };

        if req.min_players > req.max_players {
            self.send(
                conn,
                Frame::json(
                    MsgType::UploadEnd,
                    &StatusReply::error("min_players exceeds max_players"),
                ),
            );
            return;
        }

        // A fresh INIT supersedes any upload already open on this connection.
        if let Some(prev) = self
            .conns
            .get_mut(&conn)
            .and_then(|state| state.upload.take())
        {
            tracing::warn!(%conn, "Discarding superseded upload");
            prev.discard().await;
        }

        let final_path = self.config.storage.archive_path(&req.name, &req.version);
        let tmp_path = final_path.with_extension("zip.part");

        let open_result = async {
            if let Some(parent) = final_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::File::create(&tmp_path).await
        }
        .await;

        let file = match open_result {
            Ok(file) => file,
            Err(e) => {
                tracing::error!(%conn, error = %e, "Failed to open upload temp file");
                self.send(
                    conn,
                    Frame::json(
                        MsgType::UploadEnd,
                        &StatusReply::error("Server storage error"),
                    ),
                );
                return;
            }
        };

        tracing::info!(
            %conn,
            developer = %caller,
            game = %req.name,
            version = %req.version,
            declared_size = req.size,
            "Upload started"
        );

        if let Some(state) = self.conns.get_mut(&conn) {
            state.upload = Some(UploadState {
                file,
                tmp_path,
                final_path,
                declared: req,
                hasher: Md5::new(),
                received: 0,
            });
        }
    }

    /// Append a raw chunk. Any failure here closes the connection; there is
    /// no per-chunk acknowledgement to carry an error.
    pub(crate) async fn handle_upload_data(&mut self, conn: ConnId, frame: &Frame) {
        if self.authed_as(conn, Role::Developer).is_none() {
            // Covers evicted sessions whose binding has been cleared.
            tracing::warn!(%conn, "UPLOAD_DATA from unauthenticated connection, closing");
            self.cleanup_connection(conn).await;
            return;
        }
        let Some(state) = self.conns.get_mut(&conn) else {
            return;
        };
        let Some(upload) = state.upload.as_mut() else {
            tracing::warn!(%conn, "UPLOAD_DATA without an open upload, closing connection");
            self.cleanup_connection(conn).await;
            return;
        };

        upload.hasher.update(&frame.body);
        upload.received += frame.body.len() as u64;
        if let Err(e) = upload.file.write_all(&frame.body).await {
            tracing::error!(%conn, error = %e, "Failed to append upload chunk, closing connection");
            self.cleanup_connection(conn).await;
        }
    }

    pub(crate) async fn handle_upload_end(&mut self, conn: ConnId) {
        let Some(upload) = self
            .conns
            .get_mut(&conn)
            .and_then(|state| state.upload.take())
        else {
            self.send(
                conn,
                Frame::json(MsgType::UploadEnd, &StatusReply::error("No upload in progress")),
            );
            return;
        };
        let Some(caller) = self.authed_as(conn, Role::Developer) else {
            upload.discard().await;
            self.send(
                conn,
                Frame::json(
                    MsgType::UploadEnd,
                    &StatusReply::error("Developer account required"),
                ),
            );
            return;
        };

        let UploadState {
            mut file,
            tmp_path,
            final_path,
            declared,
            hasher,
            received,
        } = upload;

        if let Err(e) = file.flush().await {
            tracing::error!(%conn, error = %e, "Failed to flush upload");
        }
        drop(file);

        let computed = hex::encode(hasher.finalize());
        if !computed.eq_ignore_ascii_case(&declared.checksum) {
            tracing::warn!(
                %conn,
                game = %declared.name,
                %computed,
                declared = %declared.checksum,
                "Upload checksum mismatch"
            );
            let _ = tokio::fs::remove_file(&tmp_path).await;
            self.send(
                conn,
                Frame::json(MsgType::UploadEnd, &StatusReply::error("checksum mismatch")),
            );
            return;
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            tracing::error!(%conn, error = %e, "Failed to commit archive");
            let _ = tokio::fs::remove_file(&tmp_path).await;
            self.send(
                conn,
                Frame::json(MsgType::UploadEnd, &StatusReply::error("Server storage error")),
            );
            return;
        }

        // Catalogue commit happens after the rename; a rejected re-upload by a
        // non-owner leaves the renamed archive on disk but the catalogue
        // untouched.
        let archive_path = final_path.to_string_lossy().into_owned();
        match self.catalog.commit_upload(&caller, &declared, archive_path) {
            Ok(()) => {
                self.persist_catalog();
                tracing::info!(
                    %conn,
                    developer = %caller,
                    game = %declared.name,
                    version = %declared.version,
                    bytes = received,
                    "Upload committed"
                );
                self.send(
                    conn,
                    Frame::json(MsgType::UploadEnd, &StatusReply::ok_with("Upload successful")),
                );
            }
            Err(e) => {
                self.send(
                    conn,
                    Frame::json(MsgType::UploadEnd, &StatusReply::error(e.to_string())),
                );
            }
        }
    }
}
