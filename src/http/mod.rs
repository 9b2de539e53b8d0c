//! HTTP/1.0 protocol handling.
//!
//! # Architecture
//!
//! - **`connection`**: runs one request/response transaction per accepted socket
//! - **`parser`**: reads the request line, the recognized headers and a POST body
//! - **`request`**: request representation
//! - **`response`**: status codes and ordered response heads
//! - **`writer`**: serializes responses onto the socket
//! - **`error`**: HTML error pages for 400/403/404/501
//! - **`mime`**: content type lookup by filename suffix
//!
//! # Transaction
//!
//! ```text
//!   request line ──▶ method supported? ──no──▶ 501
//!        │ yes
//!        ▼
//!   headers (+ POST body)
//!        │
//!        ▼
//!   resolve target ──▶ missing? ──▶ 404
//!        │                permission bit missing? ──▶ 403
//!        ▼
//!   static file │ CGI program
//!        │
//!        ▼
//!   socket closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tiny_web::context::ServeContext;
//! use tiny_web::http::connection::Connection;
//! use tokio::net::TcpListener;
//!
//! async fn serve(listener: TcpListener, ctx: ServeContext) -> anyhow::Result<()> {
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         Connection::new(socket, ctx.clone()).run().await?;
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
