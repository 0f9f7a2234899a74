//! Reading and writing length-prefixed frames.
//!
//! Every Kafka request and response travels as an `INT32` size followed by
//! that many bytes. The helpers here move whole frames over any tokio
//! reader or writer so the codec always sees complete, in-memory buffers.
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::CodecConfig;
use crate::error::{Error, Result};

/// Read one frame, length prefix included, so it can be inspected and
/// forwarded as is.
///
/// The size is checked against `max_size` before anything is allocated.
pub async fn read_frame<R>(reader: &mut R, max_size: usize) -> Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    let size = reader
        .read_i32()
        .await
        .map_err(|e| Error::IoError(e.kind()))?;
    if size < 0 || size as usize > max_size {
        tracing::error!("ERROR: Rejecting frame of {} bytes, max {}", size, max_size);
        return Err(Error::FrameTooLarge {
            size: size as i64,
            max: max_size,
        });
    }

    let size = size as usize;
    let mut buf = BytesMut::zeroed(4 + size);
    buf[..4].copy_from_slice(&(size as i32).to_be_bytes());
    reader
        .read_exact(&mut buf[4..])
        .await
        .map_err(|e| Error::IoError(e.kind()))?;
    tracing::trace!("Read frame of {} bytes", size);
    Ok(buf)
}

/// Read a client request frame, bounded by `config.max_request_size`.
pub async fn read_request<R>(reader: &mut R, config: &CodecConfig) -> Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader, config.max_request_size).await
}

/// Read a broker response frame, bounded by `config.max_response_size`.
pub async fn read_response<R>(reader: &mut R, config: &CodecConfig) -> Result<BytesMut>
where
    R: AsyncRead + Unpin,
{
    read_frame(reader, config.max_response_size).await
}

/// Write `payload` behind its length prefix.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let framed = frame(payload)?;
    tracing::trace!("Sending bytes {}", framed.len());
    writer
        .write_all(&framed)
        .await
        .map_err(|e| Error::IoError(e.kind()))?;
    writer.flush().await.map_err(|e| Error::IoError(e.kind()))
}

/// `payload` behind its length prefix, in memory.
pub fn frame(payload: &[u8]) -> Result<Bytes> {
    let size = i32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
        size: payload.len() as i64,
        max: i32::MAX as usize,
    })?;
    let mut buf = BytesMut::with_capacity(4 + payload.len());
    buf.put_i32(size);
    buf.put_slice(payload);
    Ok(buf.freeze())
}
