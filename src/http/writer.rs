use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Response, StatusCode};

pub const HTTP_VERSION: &str = "HTTP/1.0";

pub fn status_line(status: StatusCode) -> String {
    format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        status.as_u16(),
        status.reason_phrase()
    )
}

fn serialize_response(resp: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256 + resp.body.len());

    buf.put_slice(status_line(resp.status).as_bytes());

    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf.put_slice(&resp.body);

    buf
}

/// A response serialized up front and sent with a single write.
pub struct ResponseWriter {
    buffer: BytesMut,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub async fn write_to_stream<W>(&self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.buffer).await?;
        stream.flush().await
    }
}

/// Writes `resp` piece by piece: the status line, each header line, the
/// blank line and the body each go out in their own write.
pub async fn write_unbuffered<W>(stream: &mut W, resp: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    stream.write_all(status_line(resp.status).as_bytes()).await?;

    for (k, v) in &resp.headers {
        stream.write_all(format!("{}: {}\r\n", k, v).as_bytes()).await?;
    }
    stream.write_all(b"\r\n").await?;

    if !resp.body.is_empty() {
        stream.write_all(&resp.body).await?;
    }

    stream.flush().await
}
