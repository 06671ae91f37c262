//! The HTTP front door.
//!
//! Two endpoints: `GET /data` re-runs the render pipeline and answers with the
//! JSON payload, everything else serves the bundled viewer page.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::assemble::RenderSource;
use crate::platform::browser::open_url;
use crate::render::TemplateEngine;

/// The viewer page, compiled into the binary.
const VIEWER_HTML: &str = include_str!("../ui/index.html");

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Errors from running the HTTP server.
#[derive(Debug, Error)]
pub enum ServeError {
  #[error("failed to listen on port {port}: {source}")]
  Bind {
    port: u16,
    #[source]
    source: io::Error,
  },

  #[error("server error: {0}")]
  Serve(#[source] io::Error),
}

/// How the server should listen.
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
  /// Port to listen on; `0` picks a free one.
  pub port: u16,
  /// Open the viewer in the default browser when the port was picked automatically.
  pub open_browser: bool,
}

impl Default for ServeOptions {
  fn default() -> Self {
    Self {
      port: 0,
      open_browser: true,
    }
  }
}

#[derive(Clone)]
struct AppState {
  source: Arc<RenderSource>,
  engine: Arc<dyn TemplateEngine>,
}

/// Build the router serving `/data` and the viewer.
pub fn router(source: Arc<RenderSource>, engine: Arc<dyn TemplateEngine>) -> Router {
  Router::new()
    .route("/data", get(data))
    .fallback(viewer)
    .with_state(AppState { source, engine })
}

async fn data(State(state): State<AppState>) -> Response {
  let AppState { source, engine } = state;
  let rendered = tokio::task::spawn_blocking(move || source.render(engine.as_ref())).await;

  let response = match rendered {
    Ok(Ok(response)) => response,
    Ok(Err(e)) => return failure(e.to_string()),
    Err(e) => return failure(format!("render task failed: {}", e)),
  };

  match serde_json::to_string(&response) {
    Ok(mut body) => {
      body.push('\n');
      debug!(bytes = body.len(), files = response.preview_files.len(), "served render data");
      text(StatusCode::OK, body)
    }
    Err(e) => failure(format!("failed to encode render data: {}", e)),
  }
}

async fn viewer() -> Html<&'static str> {
  Html(VIEWER_HTML)
}

fn failure(message: String) -> Response {
  error!(error = %message, "http handler error");
  text(StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", message))
}

fn text(status: StatusCode, body: String) -> Response {
  (
    status,
    [
      (header::CONTENT_TYPE, TEXT_PLAIN),
      (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    ],
    body,
  )
    .into_response()
}

/// Bind the listener on all interfaces and return it with the viewer URL.
pub async fn bind(port: u16) -> Result<(TcpListener, String), ServeError> {
  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr)
    .await
    .map_err(|source| ServeError::Bind { port, source })?;
  let bound = listener.local_addr().map_err(|source| ServeError::Bind { port, source })?;
  Ok((listener, format!("http://127.0.0.1:{}", bound.port())))
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), ServeError>
where
  F: Future<Output = ()> + Send + 'static,
{
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(ServeError::Serve)
}

/// Serve `source` until Ctrl-C.
pub async fn serve(
  source: Arc<RenderSource>,
  engine: Arc<dyn TemplateEngine>,
  options: ServeOptions,
) -> Result<(), ServeError> {
  let (listener, url) = bind(options.port).await?;

  if options.port == 0 && options.open_browser {
    info!(url = %url, "opening browser URL");
    if let Err(e) = open_url(&url) {
      warn!(url = %url, error = %e, "failed to open browser");
    }
  } else {
    info!(url = %url, "browser URL");
  }

  serve_with_shutdown(listener, router(source, engine), shutdown_signal()).await?;
  info!("server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(error = %e, "failed to listen for ctrl-c, serving until killed");
    std::future::pending::<()>().await;
  }
}
