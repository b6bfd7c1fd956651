//! TCP listener and per-connection tasks.
//!
//! Each accepted socket gets one task that owns both halves of the framed
//! stream: inbound frames are forwarded to the hub as events, outbound frames
//! are drained from the connection's queue in FIFO order. The hub closes a
//! connection by dropping its sender, which ends the task and the socket.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::hub::{ConnId, HubEvent};
use crate::protocol::FrameCodec;

/// Accept connections until the listener fails or the hub goes away.
pub async fn serve(
    listener: TcpListener,
    events: mpsc::UnboundedSender<HubEvent>,
    max_frame_len: usize,
) -> anyhow::Result<()> {
    loop {
        let (socket, addr) = listener.accept().await?;
        let conn: ConnId = Uuid::new_v4();
        let events = events.clone();
        tokio::spawn(async move {
            connection_task(conn, socket, addr, events, max_frame_len).await;
        });
    }
}

async fn connection_task(
    conn: ConnId,
    socket: TcpStream,
    addr: std::net::SocketAddr,
    events: mpsc::UnboundedSender<HubEvent>,
    max_frame_len: usize,
) {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    if events
        .send(HubEvent::Connected {
            conn,
            addr,
            tx: out_tx,
        })
        .is_err()
    {
        return;
    }

    let mut framed = Framed::new(socket, FrameCodec::new(max_frame_len));
    loop {
        tokio::select! {
            inbound = framed.next() => match inbound {
                Some(Ok(frame)) => {
                    if events.send(HubEvent::Inbound { conn, frame }).is_err() {
                        break;
                    }
                }
                Some(Err(e)) => {
                    tracing::warn!(%conn, %addr, error = %e, "Closing connection on frame error");
                    break;
                }
                None => break,
            },
            outbound = out_rx.recv() => match outbound {
                Some(frame) => {
                    if framed.send(frame).await.is_err() {
                        break;
                    }
                }
                // The hub dropped this connection's sender.
                None => break,
            },
        }
    }

    let _ = events.send(HubEvent::Disconnected { conn });
}
