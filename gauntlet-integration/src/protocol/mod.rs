/// The signed Http [`SignedClient`](http::client::SignedClient) and the traits
/// required to configure one for a specific exchange API.
pub mod http;

/// The [`FeedSocket`](websocket::FeedSocket) JSON message stream.
pub mod websocket;
