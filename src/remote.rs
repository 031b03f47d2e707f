use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  extract::State,
  http::StatusCode,
  routing::{get, post},
};
use tower_http::trace::{self, TraceLayer};

use crate::map::payload::MapPayload;
use crate::sync::{ClientEvent, CommandBuffer, RenderCommand, SessionState, Synchronizer};

/// One interactive session: the static payload and the synchronizer driving the client.
#[derive(Clone)]
pub struct Session {
  payload: Arc<MapPayload>,
  sync: Arc<Mutex<Synchronizer<CommandBuffer>>>,
}

impl Session {
  #[must_use]
  pub fn new(payload: MapPayload) -> Self {
    let mut sync = Synchronizer::new(&payload, CommandBuffer::default());
    // The client renders the initial state from the payload.
    sync.renderer_mut().drain();
    Self {
      payload: Arc::new(payload),
      sync: Arc::new(Mutex::new(sync)),
    }
  }

  #[must_use]
  pub fn payload(&self) -> &MapPayload {
    &self.payload
  }

  /// Applies an event and returns what the renderer has to do.
  ///
  /// # Errors
  /// If the event is rejected or the session is poisoned.
  pub fn handle_event(&self, event: ClientEvent) -> anyhow::Result<Vec<RenderCommand>> {
    let mut sync = self
      .sync
      .lock()
      .map_err(|_| anyhow::anyhow!("session state is poisoned"))?;
    sync.handle(event)?;
    Ok(sync.renderer_mut().drain())
  }

  /// # Errors
  /// If the session is poisoned.
  pub fn state(&self) -> anyhow::Result<SessionState> {
    let sync = self
      .sync
      .lock()
      .map_err(|_| anyhow::anyhow!("session state is poisoned"))?;
    Ok(sync.snapshot())
  }
}

async fn healthcheck() {}

async fn payload_handler(State(session): State<Session>) -> Json<MapPayload> {
  Json(session.payload().clone())
}

async fn state_handler(
  State(session): State<Session>,
) -> Result<Json<SessionState>, (StatusCode, String)> {
  session
    .state()
    .map(Json)
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

async fn event_handler(
  State(session): State<Session>,
  Json(event): Json<ClientEvent>,
) -> Result<Json<Vec<RenderCommand>>, (StatusCode, String)> {
  session.handle_event(event).map(Json).map_err(|e| {
    log::warn!("Rejected event: {e}");
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
  })
}

pub fn router(session: Session) -> Router {
  Router::new()
    .route("/healthcheck", get(healthcheck))
    .route("/payload", get(payload_handler))
    .route("/state", get(state_handler))
    .route("/events", post(event_handler))
    .with_state(session)
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(trace::DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_response(trace::DefaultOnResponse::new().level(tracing::Level::INFO)),
    )
}

/// Serves the session on localhost until ctrl-c.
///
/// # Errors
/// If the port cannot be bound.
pub async fn serve(session: Session, port: u16) -> anyhow::Result<()> {
  let addr = SocketAddr::from(([127, 0, 0, 1], port));
  let listener = tokio::net::TcpListener::bind(addr).await?;
  log::info!("Listening on http://{addr}");
  axum::serve(listener, router(session))
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      log::error!("Failed to install Ctrl+C handler: {e}");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut signal) => {
        signal.recv().await;
      }
      Err(e) => {
        log::error!("Failed to install signal handler: {e}");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
      () = ctrl_c => {},
      () = terminate => {},
  }
  log::info!("Shutting down");
}
