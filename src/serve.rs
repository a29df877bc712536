//! Development server.
//!
//! A small `tiny_http` server over the destination directory:
//!
//! - Static file serving with content types guessed from the extension
//! - Automatic `index.html` resolution for directories
//! - A 404 page naming the URL and the file it looked for
//! - File watching and recompilation on a background thread
//! - Graceful shutdown on Ctrl+C
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │   Main Thread   │     │  Watcher Thread  │
//! │  (HTTP Server)  │     │   (WatchLoop)    │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//!          ▼                       ▼
//!    Serve requests         Recompile changes
//!          └──────────┬────────────┘
//!                     ▼
//!               build.dest
//! ```

use crate::{chime, config::SiteConfig, log, watch::WatchLoop};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::Cursor,
    net::{IpAddr, SocketAddr},
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// 404 page template (embedded at compile time)
const NOT_FOUND_TEMPLATE: &str = include_str!("embed/serve/not_found.html");

/// Try binding to port, retry with incremented port if in use
const MAX_PORT_RETRIES: u16 = 10;

/// Serve `config`'s destination directory until Ctrl+C.
///
/// With a `watch` loop, source changes are recompiled on a background
/// thread while requests are served.
pub fn serve_site(config: &SiteConfig, watch: Option<WatchLoop>) -> Result<()> {
    let interface: IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("invalid [serve.interface] `{}`", config.serve.interface))?;

    let (server, addr) = try_bind_port(interface, config.serve.port, MAX_PORT_RETRIES)?;
    let server = Arc::new(server);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{}", addr);

    if let Some(watch) = watch {
        std::thread::spawn(move || {
            if let Err(err) = watch.run() {
                chime!("watcher stopped: {err}");
            }
        });
    }

    let root = config.dest();
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            log!("serve"; "request error: {e}");
        }
    }

    Ok(())
}

/// Try to bind to a port, retrying with incremented port numbers if in use.
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;
    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow!(
        "Failed to bind after {} attempts (ports {}-{}): {}",
        max_retries,
        base_port,
        base_port.saturating_add(max_retries.saturating_sub(1)),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Where a request resolved to.
#[derive(Debug, PartialEq, Eq)]
enum Resolved {
    File(PathBuf),
    NotFound { looked_in: PathBuf },
}

/// Resolve a request URL against `root`.
///
/// The query string and fragment are dropped before percent-escapes are
/// decoded, so an escaped `?` stays part of the path. Directories
/// resolve to their `index.html`. URLs that try to climb out of `root`
/// never resolve.
fn resolve(root: &Path, url: &str) -> Resolved {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let decoded = urlencoding::decode(path)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_owned());
    let rel = Path::new(decoded.trim_start_matches('/'));
    let local_path = root.join(rel);

    if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
        return Resolved::NotFound { looked_in: local_path };
    }

    if local_path.is_file() {
        return Resolved::File(local_path);
    }
    if local_path.is_dir() {
        let index = local_path.join("index.html");
        if index.is_file() {
            return Resolved::File(index);
        }
        return Resolved::NotFound { looked_in: index };
    }
    Resolved::NotFound { looked_in: local_path }
}

fn handle_request(request: Request, root: &Path) -> Result<()> {
    let url = request.url().to_owned();
    match resolve(root, &url) {
        Resolved::File(path) => serve_file(request, &path),
        Resolved::NotFound { looked_in } => {
            log!("serve"; "404 {url}");
            serve_not_found(request, &url, &looked_in)
        }
    }
}

/// Serve a file with appropriate content type.
fn serve_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content).with_header(content_type(guess_content_type(path))?);
    request.respond(response)?;
    Ok(())
}

/// Serve the 404 page.
fn serve_not_found(request: Request, url: &str, looked_in: &Path) -> Result<()> {
    let body = not_found_page(url, looked_in);
    let length = body.len();
    let response = Response::new(
        StatusCode(404),
        vec![content_type("text/html; charset=utf-8")?],
        Cursor::new(body),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn not_found_page(url: &str, looked_in: &Path) -> String {
    NOT_FOUND_TEMPLATE
        .replace("{url}", &escape_html(url))
        .replace("{path}", &escape_html(&looked_in.display().to_string()))
}

fn content_type(value: &str) -> Result<Header> {
    Header::from_bytes("Content-Type", value).map_err(|()| anyhow!("invalid header value `{value}`"))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",

        _ => "application/octet-stream",
    }
}
