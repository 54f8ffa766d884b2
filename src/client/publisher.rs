//! Ingest publisher
//!
//! Writes an FLV byte stream to the relay's raw TCP ingest port. The relay
//! expects nothing but FLV bytes: no handshake and no framing of its own.

use std::io;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{Error, Result};
use crate::media::flv::{encode_header, encode_tag, FlvTagType, MAX_TAG_DATA_SIZE};

/// Connection to an ingest listener
///
/// # Example
/// ```no_run
/// use flv_relay::client::Publisher;
/// use flv_relay::media::FlvTagType;
///
/// # async fn example() -> flv_relay::error::Result<()> {
/// let mut publisher = Publisher::connect("127.0.0.1:9000").await?;
/// publisher.send_header(true, true).await?;
/// publisher.send_tag(FlvTagType::Script, 0, b"...").await?;
/// publisher.finish().await?;
/// # Ok(())
/// # }
/// ```
pub struct Publisher {
    stream: TcpStream,
    bytes_sent: u64,
}

impl Publisher {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;

        tracing::debug!(peer = %stream.peer_addr()?, "Publisher connected");

        Ok(Self {
            stream,
            bytes_sent: 0,
        })
    }

    /// Write raw bytes as-is
    pub async fn send(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_all(data).await?;
        self.bytes_sent += data.len() as u64;
        Ok(())
    }

    /// Write an FLV file header followed by PreviousTagSize0
    pub async fn send_header(&mut self, has_audio: bool, has_video: bool) -> Result<()> {
        let header = encode_header(has_audio, has_video);
        self.send(&header).await
    }

    /// Write one tag followed by its PreviousTagSize
    ///
    /// Payloads over [`MAX_TAG_DATA_SIZE`] are rejected with `InvalidInput`
    /// and nothing is written.
    pub async fn send_tag(&mut self, tag_type: FlvTagType, timestamp: u32, data: &[u8]) -> Result<()> {
        if data.len() > MAX_TAG_DATA_SIZE {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("tag payload of {} bytes does not fit in an FLV tag", data.len()),
            )));
        }
        let tag = encode_tag(tag_type, timestamp, data);
        self.send(&tag).await
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Flush and half-close, ending the ingest session
    pub async fn finish(mut self) -> Result<()> {
        self.stream.flush().await?;
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_sends_header_and_tags() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut publisher = Publisher::connect(addr).await.unwrap();
        publisher.send_header(false, true).await.unwrap();
        publisher
            .send_tag(FlvTagType::Video, 33, &[0x27, 0x01])
            .await
            .unwrap();
        assert_eq!(publisher.bytes_sent(), 13 + 17);
        publisher.finish().await.unwrap();

        let received = server.await.unwrap();
        let mut expected = encode_header(false, true).to_vec();
        expected.extend_from_slice(&encode_tag(FlvTagType::Video, 33, &[0x27, 0x01]));
        assert_eq!(received, expected);
    }

    #[tokio::test]
    async fn test_oversize_tag_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut publisher = Publisher::connect(addr).await.unwrap();
        publisher.send_header(true, false).await.unwrap();

        let err = publisher
            .send_tag(FlvTagType::Audio, 0, &vec![0; MAX_TAG_DATA_SIZE + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
        assert_eq!(publisher.bytes_sent(), 13);
        publisher.finish().await.unwrap();

        // The stream stays aligned on tag boundaries
        assert_eq!(server.await.unwrap(), encode_header(true, false).to_vec());
    }
}
