//! A socket that can switch from plaintext to TLS mid-life, as both the control channel (after
//! AUTH TLS) and the data channel (after PROT P) must.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::server::TlsStream;

#[derive(Debug)]
pub(crate) enum SwitchingStream<S> {
    Plain(S),
    Tls(Box<TlsStream<S>>),
}

impl<S> SwitchingStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Performs the server side of a TLS handshake on the underlying socket. Only valid while
    /// still in plaintext.
    pub async fn upgrade_to_tls(self, config: std::sync::Arc<rustls::ServerConfig>) -> io::Result<Self> {
        match self {
            SwitchingStream::Plain(socket) => {
                let acceptor = tokio_rustls::TlsAcceptor::from(config);
                let tls_stream = acceptor.accept(socket).await?;
                Ok(SwitchingStream::Tls(Box::new(tls_stream)))
            }
            SwitchingStream::Tls(_) => Err(io::Error::new(io::ErrorKind::InvalidInput, "connection is already encrypted")),
        }
    }
}

impl<S> AsyncRead for SwitchingStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SwitchingStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            SwitchingStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl<S> AsyncWrite for SwitchingStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            SwitchingStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            SwitchingStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SwitchingStream::Plain(s) => Pin::new(s).poll_flush(cx),
            SwitchingStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            SwitchingStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            SwitchingStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
