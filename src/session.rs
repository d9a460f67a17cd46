// Per-page-view filter sessions: one actor task per session, owned by a registry

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::{sleep_until, Instant};

use crate::catalog_api::CatalogClient;
use crate::engine::{FilterCommand, FilterEngine, Notification, RenderInstruction};
use crate::error::{PageError, SessionClosed};
use crate::orchestrator::{execute, Completion, RefreshTicket};
use crate::page::parse_catalog_page;
use crate::paginator::PaginationState;
use crate::url_sync::{HistorySink, HistoryUnavailable};
use crate::validation::ValidationAnnotation;

pub type SessionId = u64;

const COMMAND_BUFFER: usize = 64;
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

type SessionMap = Arc<RwLock<HashMap<SessionId, SessionHandle>>>;

/// Address bar of the page view; the last URL written wins.
#[derive(Debug, Clone)]
pub struct LocationBar {
    current: String,
}

impl LocationBar {
    pub fn new(location: impl Into<String>) -> Self {
        Self { current: location.into() }
    }

    pub fn current(&self) -> &str {
        &self.current
    }
}

impl HistorySink for LocationBar {
    fn replace_url(&mut self, url: &str) -> Result<(), HistoryUnavailable> {
        self.current = url.to_string();
        Ok(())
    }
}

type SessionEngine = FilterEngine<Vec<RenderInstruction>, LocationBar>;

/// Render instructions accumulated since the last poll.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUpdate {
    pub location: String,
    pub instructions: Vec<RenderInstruction>,
    pub pagination: PaginationState,
    pub has_errors: bool,
}

impl SessionUpdate {
    fn drain(engine: &mut SessionEngine) -> Self {
        Self {
            location: engine.history().current().to_string(),
            instructions: std::mem::take(engine.render_sink()),
            pagination: engine.pagination(),
            has_errors: engine.has_errors(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommandAck {
    /// A catalog query was sent right away.
    pub refreshing: bool,
    /// A debounced query is waiting for typing to stop.
    pub debounced: bool,
}

/// Contents of the shared message area under the filter.
#[derive(Debug, Clone)]
pub struct SessionMessages {
    pub annotations: Vec<ValidationAnnotation>,
    pub empty: bool,
    pub notification: Option<Notification>,
}

enum SessionMessage {
    Command(FilterCommand, oneshot::Sender<CommandAck>),
    Drain(oneshot::Sender<SessionUpdate>),
    Messages(oneshot::Sender<SessionMessages>),
    Close,
}

#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<SessionMessage>,
}

impl SessionHandle {
    pub async fn send(&self, command: FilterCommand) -> Result<CommandAck, SessionClosed> {
        let (reply, response) = oneshot::channel();
        self.request(SessionMessage::Command(command, reply), response).await
    }

    pub async fn drain(&self) -> Result<SessionUpdate, SessionClosed> {
        let (reply, response) = oneshot::channel();
        self.request(SessionMessage::Drain(reply), response).await
    }

    pub async fn messages(&self) -> Result<SessionMessages, SessionClosed> {
        let (reply, response) = oneshot::channel();
        self.request(SessionMessage::Messages(reply), response).await
    }

    async fn request<T>(&self, message: SessionMessage, response: oneshot::Receiver<T>) -> Result<T, SessionClosed> {
        self.tx.send(message).await.map_err(|_| SessionClosed(self.id))?;
        response.await.map_err(|_| SessionClosed(self.id))
    }
}

pub struct SessionRegistry {
    sessions: SessionMap,
    next_id: AtomicU64,
    client: Arc<dyn CatalogClient>,
    debounce: Duration,
    idle_timeout: Duration,
    default_per_page: u32,
}

impl SessionRegistry {
    pub fn new(client: Arc<dyn CatalogClient>, debounce: Duration, default_per_page: u32) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            client,
            debounce,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            default_per_page,
        }
    }

    /// A session that receives nothing for this long is dropped, as if it had been closed.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Starts a session for a freshly rendered catalog page.
    pub async fn open(&self, location: &str, html: &str) -> Result<(SessionId, SessionUpdate), PageError> {
        let page = parse_catalog_page(html, location, self.default_per_page)?;
        let history = LocationBar::new(page.location.clone());
        let mut engine = FilterEngine::new(page, self.debounce, Vec::new(), history);
        let initial = SessionUpdate::drain(&mut engine);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        self.sessions.write().await.insert(id, SessionHandle { id, tx });
        tokio::spawn(run_session(SessionActor {
            id,
            engine,
            rx,
            client: Arc::clone(&self.client),
            sessions: Arc::clone(&self.sessions),
            idle_timeout: self.idle_timeout,
        }));

        tracing::info!(session = id, %location, "Filter session opened");
        Ok((id, initial))
    }

    pub async fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn close(&self, id: SessionId) -> bool {
        let Some(handle) = self.sessions.write().await.remove(&id) else {
            return false;
        };
        // The actor may already be gone; removal is what matters
        let _ = handle.tx.send(SessionMessage::Close).await;
        let open_sessions = self.len().await;
        tracing::info!(session = id, open_sessions, "Filter session closed");
        true
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn spawn_query(
    session: SessionId,
    client: &Arc<dyn CatalogClient>,
    completions: &mpsc::UnboundedSender<Completion>,
    ticket: RefreshTicket,
) {
    let client = Arc::clone(client);
    let completions = completions.clone();
    tokio::spawn(async move {
        let completion = execute(client, ticket).await;
        if completions.send(completion).is_err() {
            tracing::debug!(session, "Session ended before its query finished");
        }
    });
}

struct SessionActor {
    id: SessionId,
    engine: SessionEngine,
    rx: mpsc::Receiver<SessionMessage>,
    client: Arc<dyn CatalogClient>,
    sessions: SessionMap,
    idle_timeout: Duration,
}

// Commands, query completions, the debounce deadline and the idle deadline are
// serialized here, so the engine is never shared.
async fn run_session(actor: SessionActor) {
    let SessionActor { id, mut engine, mut rx, client, sessions, idle_timeout } = actor;
    let (completions, mut completed) = mpsc::unbounded_channel::<Completion>();
    let mut last_seen = Instant::now();

    loop {
        let deadline = engine.debounce_deadline();
        let timer = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            message = rx.recv() => match message {
                Some(SessionMessage::Command(command, reply)) => {
                    last_seen = Instant::now();
                    let ticket = engine.apply(command, Instant::now());
                    let ack = CommandAck {
                        refreshing: ticket.is_some(),
                        debounced: engine.debounce_deadline().is_some(),
                    };
                    if let Some(ticket) = ticket {
                        spawn_query(id, &client, &completions, ticket);
                    }
                    let _ = reply.send(ack);
                }
                Some(SessionMessage::Drain(reply)) => {
                    last_seen = Instant::now();
                    let _ = reply.send(SessionUpdate::drain(&mut engine));
                }
                Some(SessionMessage::Messages(reply)) => {
                    last_seen = Instant::now();
                    let _ = reply.send(SessionMessages {
                        annotations: engine.annotations(),
                        empty: engine.is_empty(),
                        notification: engine.notification().cloned(),
                    });
                }
                Some(SessionMessage::Close) | None => break,
            },
            Some(completion) = completed.recv() => engine.on_completion(completion),
            () = timer => {
                if let Some(ticket) = engine.on_timer(Instant::now()) {
                    spawn_query(id, &client, &completions, ticket);
                }
            }
            () = sleep_until(last_seen + idle_timeout) => {
                sessions.write().await.remove(&id);
                tracing::info!(session = id, idle_secs = idle_timeout.as_secs(), "Filter session expired");
                break;
            }
        }
    }
    tracing::debug!(session = id, "Filter session actor stopped");
}
