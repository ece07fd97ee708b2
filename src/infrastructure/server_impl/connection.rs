use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use eyre::WrapErr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::timeout;

use crate::infrastructure::server_impl::response::Response;
use crate::infrastructure::server_impl::router::Router;
use crate::infrastructure::server_impl::server::parse_http;
use crate::AnyResult;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// How long a read may stay idle before the buffered bytes count as the whole request.
    pub read_timeout: Duration,
    /// Size of a single read.
    pub buffer_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(300),
            buffer_size: 1024,
        }
    }
}

/// Accepts connections forever, one task each. Only an accept failure returns.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    settings: ConnectionSettings,
) -> AnyResult<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            address = %addr,
            routes = router.table().len(),
            "Server is now listening"
        );
    }

    loop {
        let (socket, peer) = listener
            .accept()
            .await
            .wrap_err("Error accepting connection")?;
        let router = router.clone();

        tokio::spawn(async move {
            if let Err(err) = handle_connection(socket, peer, &router, settings).await {
                tracing::error!(peer = %peer, error = %err, "connection failed");
            }
        });
    }
}

/// One request/response cycle. The stream is shut down afterwards in every case
/// except a read error, which drops it without a reply.
pub async fn handle_connection<S>(
    mut socket: S,
    peer: SocketAddr,
    router: &Router,
    settings: ConnectionSettings,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let data = read_until_idle(&mut socket, settings).await?;

    if !data.is_empty() {
        let response = match parse_http(&data) {
            Ok(request) => {
                tracing::debug!(
                    peer = %peer,
                    method = request.method,
                    path = request.path,
                    "request"
                );
                router.route(request).await
            }
            Err(err) => {
                tracing::warn!(peer = %peer, error = %err, "rejecting request");
                Response::bad_request(err.to_string())
            }
        };

        socket.write_all(&response.into_http()).await?;
    } else {
        tracing::debug!(peer = %peer, "nothing read before timeout");
    }

    socket.shutdown().await
}

/// Reads until the peer closes or no bytes arrive within `read_timeout`.
async fn read_until_idle<S>(
    socket: &mut S,
    settings: ConnectionSettings,
) -> io::Result<BytesMut>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0; settings.buffer_size.max(1)];
    let mut data = BytesMut::new();

    loop {
        match timeout(settings.read_timeout, socket.read(&mut buf)).await {
            // idle
            Err(_) => break,
            // socket closed
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => data.extend_from_slice(&buf[..n]),
            Ok(Err(e)) => return Err(e),
        }
    }

    Ok(data)
}
