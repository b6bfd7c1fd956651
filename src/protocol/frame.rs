use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

use super::types::MsgType;

/// Default cap on the declared frame length (type byte + payload).
///
/// Upload and download chunks are far smaller than this; anything larger is a
/// corrupt or hostile peer and the connection is closed.
pub const DEFAULT_MAX_FRAME_LEN: usize = 8 * 1024 * 1024;

const HEADER_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame declared zero length")]
    EmptyFrame,
    #[error("frame length {len} exceeds cap {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("payload for type {0} is not valid JSON: {1}")]
    Json(u8, #[source] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A single decoded wire frame: the raw type byte plus the payload bytes.
///
/// The type byte is kept raw here so an unknown code can be surfaced to the
/// dispatcher (which closes the connection) instead of being dropped inside
/// the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: u8,
    pub body: Bytes,
}

impl Frame {
    /// Build a frame with a JSON-encoded payload.
    pub fn json<T: Serialize>(kind: MsgType, payload: &T) -> Frame {
        // Serializing our own payload structs cannot fail.
        let body = serde_json::to_vec(payload).unwrap_or_else(|_| b"{}".to_vec());
        Frame {
            kind: kind.code(),
            body: Bytes::from(body),
        }
    }

    /// Build a frame carrying an empty JSON object.
    pub fn empty(kind: MsgType) -> Frame {
        Frame {
            kind: kind.code(),
            body: Bytes::from_static(b"{}"),
        }
    }

    /// Build a frame carrying raw bytes (upload/download data chunks).
    pub fn binary(kind: MsgType, body: Bytes) -> Frame {
        Frame {
            kind: kind.code(),
            body,
        }
    }

    pub fn msg_type(&self) -> Option<MsgType> {
        MsgType::from_code(self.kind)
    }

    /// Decode the payload as JSON into a typed request.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, FrameError> {
        serde_json::from_slice(&self.body).map_err(|e| FrameError::Json(self.kind, e))
    }
}

/// Length-prefixed frame codec: `u32_be length | u8 type | length-1 payload`.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&src[..HEADER_LEN]);
        let declared = u32::from_be_bytes(len_bytes) as usize;

        if declared == 0 {
            return Err(FrameError::EmptyFrame);
        }
        if declared > self.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                len: declared,
                max: self.max_frame_len,
            });
        }

        if src.len() < HEADER_LEN + declared {
            src.reserve(HEADER_LEN + declared - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let mut data = src.split_to(declared);
        let kind = data.get_u8();

        Ok(Some(Frame {
            kind,
            body: data.freeze(),
        }))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        let len = 1 + frame.body.len();
        if len > self.max_frame_len {
            return Err(FrameError::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        dst.reserve(HEADER_LEN + len);
        dst.put_u32(len as u32);
        dst.put_u8(frame.kind);
        dst.extend_from_slice(&frame.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Ping {
        msg: String,
    }

    fn encode_to_buf(frame: Frame) -> BytesMut {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        codec.encode(frame, &mut buf).unwrap();
        buf
    }

    #[test]
    fn round_trip_json_frame() {
        let frame = Frame::json(
            MsgType::LoginResp,
            &Ping {
                msg: "hello".into(),
            },
        );
        let mut buf = encode_to_buf(frame.clone());

        let mut codec = FrameCodec::default();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoded.msg_type(), Some(MsgType::LoginResp));
        let ping: Ping = decoded.parse().unwrap();
        assert_eq!(ping.msg, "hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn round_trip_binary_frame() {
        let payload = Bytes::from_static(&[0x00, 0xff, 0x10, 0x7f]);
        let frame = Frame::binary(MsgType::UploadData, payload.clone());
        let mut buf = encode_to_buf(frame);

        let mut codec = FrameCodec::default();
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded.kind, MsgType::UploadData.code());
        assert_eq!(decoded.body, payload);
    }

    #[test]
    fn partial_header_yields_none() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&[0u8, 0, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn partial_body_yields_none_then_frame() {
        let full = encode_to_buf(Frame::empty(MsgType::GameListReq));
        let mut codec = FrameCodec::default();

        let mut buf = BytesMut::from(&full[..full.len() - 1]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&full[full.len() - 1..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.msg_type(), Some(MsgType::GameListReq));
    }

    #[test]
    fn zero_length_frame_is_an_error() {
        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 0][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::EmptyFrame)
        ));
    }

    #[test]
    fn oversized_frame_is_an_error() {
        let mut codec = FrameCodec::new(16);
        let mut buf = BytesMut::new();
        buf.put_u32(17);
        buf.put_u8(MsgType::UploadData.code());
        assert!(matches!(
            codec.decode(&mut buf),
            Err(FrameError::FrameTooLarge { len: 17, max: 16 })
        ));
    }

    #[test]
    fn unknown_type_byte_survives_decoding() {
        let mut buf = encode_to_buf(Frame {
            kind: 99,
            body: Bytes::from_static(b"{}"),
        });
        let mut codec = FrameCodec::default();
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.kind, 99);
        assert_eq!(frame.msg_type(), None);
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut buf = encode_to_buf(Frame::empty(MsgType::RoomListReq));
        buf.extend_from_slice(&encode_to_buf(Frame::empty(MsgType::RoomLeaveReq)));

        let mut codec = FrameCodec::default();
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.msg_type(), Some(MsgType::RoomListReq));
        assert_eq!(second.msg_type(), Some(MsgType::RoomLeaveReq));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }
}
