//! Local HTTP server for the score page.
//!
//! Connections are accepted and answered one at a time; each request is
//! handled to completion before the next is accepted.
//!
//! Endpoints:
//!   GET /             - page with selector and table (`?layout=default|transpose`)
//!   GET /table        - table fragment for the selector script
//!   GET /api/table    - rendered table as JSON
//!   GET /api/manifest - dataset manifest as JSON
//!   GET /api/health   - health check

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::data::DatasetManifest;
use crate::html::{render_page, render_table};
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::view::{LayoutMode, View};

/// Idle connections (e.g. browser preconnects) are dropped after this long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_HEADER_LINES: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub reason: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    pub fn html(body: String) -> Self {
        Self {
            status: 200,
            reason: "OK",
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status: 200,
                reason: "OK",
                content_type: "application/json",
                body,
            },
            Err(err) => Self::text(500, "Internal Server Error", err.to_string()),
        }
    }

    pub fn text(status: u16, reason: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            reason,
            content_type: "text/plain; charset=utf-8",
            body: body.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{}",
            self.status,
            self.reason,
            self.content_type,
            self.body.len(),
            self.body
        )
        .into_bytes()
    }
}

/// Splits `GET /path?query HTTP/1.1` into method and target.
pub fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") || parts.next().is_some() {
        return None;
    }
    Some((method, target))
}

fn layout_param(query: &str) -> LayoutMode {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "layout")
        .map(|(_, value)| LayoutMode::from_value(&value))
        .unwrap_or_default()
}

/// Maps one request to a response. Page and table routes move the view to
/// the requested layout before rendering.
pub fn route(view: &mut View, manifest: &DatasetManifest, method: &str, target: &str) -> Response {
    if method != "GET" {
        return Response::text(405, "Method Not Allowed", "Method Not Allowed");
    }
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    match path {
        "/" => {
            let vm = view.select(layout_param(query));
            Response::html(render_page(view.title(), &vm))
        }
        "/table" => Response::html(render_table(&view.select(layout_param(query)))),
        "/api/table" => Response::json(&view.select(layout_param(query))),
        "/api/manifest" => Response::json(manifest),
        "/api/health" => Response::json(&json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "rows": view.table().data_rows().len(),
            "columns": view.table().columns().len(),
            "layout": view.layout(),
        })),
        _ => Response::text(404, "Not Found", "Not Found"),
    }
}

async fn read_request(stream: &mut TcpStream) -> Result<Option<String>> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Ok(None);
    }
    // Headers are read and discarded; nothing here depends on them.
    for _ in 0..MAX_HEADER_LINES {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 || line == "\r\n" || line == "\n" {
            break;
        }
    }
    Ok(Some(request_line.trim_end().to_string()))
}

async fn handle_connection(
    stream: &mut TcpStream,
    view: &mut View,
    manifest: &DatasetManifest,
) -> Result<()> {
    let started = Instant::now();
    let request_line = match tokio::time::timeout(REQUEST_TIMEOUT, read_request(stream)).await {
        Ok(read) => read.context("failed to read request")?,
        Err(_) => return Ok(()),
    };
    let Some(request_line) = request_line else {
        return Ok(());
    };

    let (response, method, target) = match parse_request_line(&request_line) {
        Some((method, target)) => (route(view, manifest, method, target), method, target),
        None => (Response::text(400, "Bad Request", "Bad Request"), "", ""),
    };
    stream
        .write_all(&response.to_bytes())
        .await
        .context("failed to write response")?;
    stream.shutdown().await.ok();

    log(
        Level::Info,
        Domain::Http,
        "request",
        obj(&[
            ("method", v_str(method)),
            ("target", v_str(target)),
            ("status", json!(response.status)),
            ("bytes", json!(response.body.len())),
            ("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0)),
        ]),
    );
    Ok(())
}

/// Resolves when `signal` fires. A signal that fails to register is logged
/// and never resolves, so the server keeps running.
pub async fn until_signal<Fut>(signal: Fut)
where
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        log(
            Level::Error,
            Domain::System,
            "signal_unavailable",
            obj(&[("error", v_str(&err.to_string()))]),
        );
        std::future::pending::<()>().await;
    }
}

/// Serves requests until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, mut view: View, manifest: DatasetManifest, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log(Level::Info, Domain::System, "shutdown", obj(&[]));
                return Ok(());
            }
            accepted = listener.accept() => {
                let (mut stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        log(Level::Warn, Domain::Http, "accept_failed", obj(&[("error", v_str(&err.to_string()))]));
                        continue;
                    }
                };
                if let Err(err) = handle_connection(&mut stream, &mut view, &manifest).await {
                    log(
                        Level::Warn,
                        Domain::Http,
                        "connection_failed",
                        obj(&[
                            ("peer", v_str(&peer.to_string())),
                            ("error", v_str(&format!("{:#}", err))),
                        ]),
                    );
                }
            }
        }
    }
}
