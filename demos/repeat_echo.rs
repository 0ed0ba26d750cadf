//! Bookmark a transaction and repeat it against a local echo service.
//!
//! Demonstrates:
//! - Building a session from a JSON configuration
//! - Bookmarking captured transactions
//! - Selecting a row, editing the request and repeating it
//! - Printing the bookmark table
//!
//! Usage:
//!   cargo run --example repeat_echo
//!   cargo run --example repeat_echo -- --debug

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use http_bookmarks::{
    BookmarkSession, BookmarksConfig, CapturingViewer, Column, HttpService, Transaction,
};

// ============================================================================
// Constants
// ============================================================================

const CONFIG: &str = r#"{
    "max_parameters": 3,
    "read_timeout_ms": 5000
}"#;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let debug = std::env::args().any(|a| a == "--debug");
    init_logging(debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== Repeat Echo ===\n");

    // ========================================================================
    // Echo Service
    // ========================================================================

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("binding echo service")?;
    let port = listener.local_addr()?.port();
    tokio::spawn(serve_echo(listener));
    println!("[Setup] Echo service on 127.0.0.1:{port}\n");

    // ========================================================================
    // Session
    // ========================================================================

    let config = BookmarksConfig::from_json_str(CONFIG)?;
    let viewer = Arc::new(CapturingViewer::new());
    let mut session = BookmarkSession::builder()
        .config(config)
        .viewer(Arc::clone(&viewer) as _)
        .build()?;
    session.subscribe(|event| println!("        [event] {event:?}"));

    // ========================================================================
    // Bookmark
    // ========================================================================

    println!("[Bookmark] Adding captured transaction...");
    let request = format!(
        "GET /search?q=rust&page=2&sort=new&lang=en HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\n\r\n"
    );
    let mut captured = [Transaction::new(HttpService::http("127.0.0.1", port), request)
        .with_response(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec())];
    session.add_bookmarks(&mut captured);
    println!(
        "        ✓ Annotated: {:?} {:?}\n",
        captured[0].highlight(),
        captured[0].comment()
    );

    // ========================================================================
    // Repeat
    // ========================================================================

    println!("[Repeat] Selecting row 0 and repeating with an edited path...");
    session.select_row(0)?;
    let edited = format!("GET /edited?via=repeat HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\n\r\n");
    session.edit_request(edited.into_bytes())?;
    session.repeat_with(true)?;

    while let Some(completion) = session.next_completion().await {
        println!("        ✓ {completion:?}");
    }
    if let Some(response) = viewer.last_response() {
        println!("        ✓ Viewer shows {} response bytes\n", response.len());
    }

    // ========================================================================
    // Table
    // ========================================================================

    println!("[{}] {} bookmarks", session.caption(), session.store().size());
    let header: Vec<&str> = Column::ALL.iter().map(|c| c.name()).collect();
    println!("        {}", header.join(" | "));
    for row in 0..session.store().size() {
        let cells = Column::ALL
            .iter()
            .map(|&column| session.value_at(row, column).map(|cell| cell.to_string()))
            .collect::<http_bookmarks::Result<Vec<_>>>()?;
        println!("        {}", cells.join(" | "));
    }

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "http_bookmarks=debug"
    } else {
        "http_bookmarks=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Answers each connection with an HTML page titled by the request line.
async fn serve_echo(listener: TcpListener) {
    while let Ok((mut stream, _)) = listener.accept().await {
        tokio::spawn(async move {
            let mut buf = vec![0u8; 8192];
            let Ok(n) = stream.read(&mut buf).await else {
                return;
            };
            let line = String::from_utf8_lossy(&buf[..n])
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            let body = format!("<html><title>{line}</title><body>echo</body></html>");
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
        });
    }
}
