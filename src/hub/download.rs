//! Archive download: DOWNLOAD_INIT header, ordered DOWNLOAD_DATA chunks, and
//! a terminating DOWNLOAD_END, streamed by a worker off the hub task.

use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;

use super::{ConnId, Hub};
use crate::protocol::{DownloadInitReply, DownloadRequest, Frame, MsgType};

impl Hub {
    pub(crate) async fn handle_download(&mut self, conn: ConnId, frame: &Frame) {
        let Some(req) = self.parse_or_close::<DownloadRequest>(conn, frame).await else {
            return;
        };
        if self.identity(conn).is_none() {
            self.send(
                conn,
                Frame::json(
                    MsgType::DownloadInit,
                    &DownloadInitReply::error("Not logged in"),
                ),
            );
            return;
        }

        let resolved = self.catalog.get(&req.game_name).and_then(|game| {
            game.latest().map(|entry| {
                (
                    game.latest_version.clone(),
                    entry.checksum.clone(),
                    PathBuf::from(&entry.archive_path),
                )
            })
        });
        let Some((version, checksum, path)) = resolved else {
            self.send(
                conn,
                Frame::json(
                    MsgType::DownloadInit,
                    &DownloadInitReply::error("Game not found"),
                ),
            );
            return;
        };

        let Some(tx) = self.conns.get(&conn).map(|c| c.tx.clone()) else {
            return;
        };
        let chunk_size = self.config.server.download_chunk_size;
        let game_name = req.game_name;
        tracing::info!(%conn, game = %game_name, %version, "Download started");

        // The streamer owns a clone of the connection's sender, so its frames
        // keep their relative order; a dropped receiver just ends the stream.
        tokio::spawn(async move {
            stream_archive(tx, chunk_size, game_name, version, checksum, path).await;
        });
    }
}

async fn stream_archive(
    tx: mpsc::UnboundedSender<Frame>,
    chunk_size: usize,
    game_name: String,
    version: String,
    checksum: String,
    path: PathBuf,
) {
    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to open archive");
            let _ = tx.send(Frame::json(
                MsgType::DownloadInit,
                &DownloadInitReply::error("Archive unavailable"),
            ));
            return;
        }
    };
    let size = match file.metadata().await {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Failed to stat archive");
            let _ = tx.send(Frame::json(
                MsgType::DownloadInit,
                &DownloadInitReply::error("Archive unavailable"),
            ));
            return;
        }
    };

    let init = DownloadInitReply::ok(size, checksum, version, game_name);
    if tx.send(Frame::json(MsgType::DownloadInit, &init)).is_err() {
        return;
    }

    let mut buf = vec![0u8; chunk_size];
    loop {
        match file.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&buf[..n]);
                if tx
                    .send(Frame::binary(MsgType::DownloadData, chunk))
                    .is_err()
                {
                    // Client went away mid-stream.
                    return;
                }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Archive read failed mid-stream");
                return;
            }
        }
    }
    let _ = tx.send(Frame::empty(MsgType::DownloadEnd));
}
