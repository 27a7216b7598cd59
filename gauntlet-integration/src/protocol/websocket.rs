use crate::error::{SocketError, WsError};
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, error::ProtocolError, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::debug;

/// A long-lived JSON message stream over one WebSocket.
///
/// Wraps the raw socket with the behaviour every Gauntlet feed needs: ping frames
/// are answered in place, pongs and raw frames never surface, close frames become
/// [`SocketError::StreamEnded`], and text/binary payloads deserialise straight into
/// the caller's message type. Consumers that see an error decide whether to skip the
/// message or drop the socket and reconnect.
#[derive(Debug)]
pub struct FeedSocket {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl FeedSocket {
    /// Connect to the provided WebSocket server.
    pub async fn connect<R>(request: R) -> Result<Self, SocketError>
    where
        R: IntoClientRequest + Unpin + Debug,
    {
        debug!(?request, "establishing WebSocket connection");
        let (inner, _) = connect_async(request).await?;
        Ok(Self { inner })
    }

    /// Send one JSON message (eg/ a subscribe frame).
    pub async fn send_json<Msg>(&mut self, message: &Msg) -> Result<(), SocketError>
    where
        Msg: Serialize,
    {
        let text = serde_json::to_string(message).map_err(SocketError::Serialise)?;
        self.inner
            .send(Message::text(text))
            .await
            .map_err(SocketError::from)
    }

    /// Yield the next deserialised feed message.
    ///
    /// Returns `None` once the transport is exhausted. Control frames are consumed
    /// internally; an undecodable payload surfaces as
    /// [`SocketError::Deserialise`] so the consumer can skip it without
    /// abandoning the socket.
    pub async fn next_message<Msg>(&mut self) -> Option<Result<Msg, SocketError>>
    where
        Msg: DeserializeOwned,
    {
        loop {
            let frame = match self.inner.next().await? {
                Ok(frame) => frame,
                Err(error) => return Some(Err(SocketError::WebSocket(error))),
            };

            match frame {
                Message::Text(text) => return Some(decode(text.as_bytes())),
                Message::Binary(binary) => return Some(decode(&binary)),
                Message::Ping(payload) => {
                    if self.inner.send(Message::Pong(payload)).await.is_err() {
                        return None;
                    }
                }
                Message::Pong(payload) => {
                    debug!(payload = ?payload, "received Pong WebSocket message");
                }
                Message::Close(frame) => {
                    let frame = format!("{frame:?}");
                    debug!(payload = %frame, "received CloseFrame WebSocket message");
                    return Some(Err(SocketError::StreamEnded(frame)));
                }
                Message::Frame(_) => {}
            }
        }
    }
}

fn decode<Msg>(payload: &[u8]) -> Result<Msg, SocketError>
where
    Msg: DeserializeOwned,
{
    serde_json::from_slice::<Msg>(payload).map_err(|error| {
        debug!(
            %error,
            payload = %String::from_utf8_lossy(payload),
            "failed to deserialize WebSocket message into feed message"
        );
        SocketError::deserialise(error, payload)
    })
}

/// Whether the error means the socket is gone and the consumer should reconnect.
pub fn is_disconnect(error: &WsError) -> bool {
    matches!(
        error,
        WsError::ConnectionClosed
            | WsError::AlreadyClosed
            | WsError::Io(_)
            | WsError::Protocol(ProtocolError::SendAfterClosing)
    )
}
