use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{BattlefieldRole, Catalog, CatalogError};
use crate::options::{parse_wargear, RenderedOption, Selection};
use crate::roster::{EditSession, RosterError, SessionError, SessionState, Unit, UnitSummary};

pub const DEFAULT_MAX_SESSIONS: usize = 256;
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// Bounds on the session registry. Idle sessions are dropped when a new one opens;
/// at capacity the least recently used session makes room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout: DEFAULT_SESSION_IDLE,
        }
    }
}

#[derive(Debug)]
struct SessionSlot {
    session: Arc<Mutex<EditSession>>,
    last_used: Instant,
}

type Registry = HashMap<String, SessionSlot>;

/// Shared service state: the catalog plus one lock per open unit session.
#[derive(Debug)]
pub struct AppState {
    catalog: Arc<Catalog>,
    limits: SessionLimits,
    sessions: Mutex<Registry>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error("no unit session '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("session state is unavailable after a failed request")]
    Poisoned,
}

impl ApiError {
    pub fn status(&self) -> (u16, &'static str) {
        match self {
            Self::BadRequest(_) => (400, "Bad Request"),
            Self::NotFound(_) => (404, "Not Found"),
            Self::Session(SessionError::InvalidTransition { .. }) => (409, "Conflict"),
            Self::Session(SessionError::Roster(err)) | Self::Roster(err) => roster_status(err),
            Self::Encode(_) | Self::Poisoned => (500, "Internal Server Error"),
        }
    }
}

fn roster_status(err: &RosterError) -> (u16, &'static str) {
    match err {
        RosterError::Catalog(CatalogError::MissingCatalogEntry { .. }) => (404, "Not Found"),
        RosterError::Catalog(_) | RosterError::Option { .. } => (500, "Internal Server Error"),
        _ => (422, "Unprocessable Entity"),
    }
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_limits(catalog, SessionLimits::default())
    }

    pub fn with_limits(catalog: Arc<Catalog>, limits: SessionLimits) -> Self {
        Self {
            catalog,
            limits,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    fn registry(&self) -> Result<MutexGuard<'_, Registry>, ApiError> {
        self.sessions.lock().map_err(|_| ApiError::Poisoned)
    }

    pub fn open(&self, unit: Unit) -> Result<String, ApiError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.registry()?;
        let expired = prune_idle(&mut sessions, self.limits.idle_timeout);
        if expired > 0 {
            tracing::info!(expired, "idle unit sessions dropped");
        }
        while !sessions.is_empty() && sessions.len() >= self.limits.max_sessions.max(1) {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::info!(id = %oldest, "unit session evicted to make room");
        }
        sessions.insert(
            id.clone(),
            SessionSlot {
                session: Arc::new(Mutex::new(EditSession::new(unit))),
                last_used: Instant::now(),
            },
        );
        Ok(id)
    }

    /// Looks up a session and marks it used; the registry lock is released before the
    /// caller locks the unit.
    pub fn session(&self, id: &str) -> Result<Arc<Mutex<EditSession>>, ApiError> {
        let mut sessions = self.registry()?;
        let slot = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        slot.last_used = Instant::now();
        Ok(Arc::clone(&slot.session))
    }

    /// Drops sessions untouched for longer than the idle timeout; returns how many.
    pub fn expire_idle(&self) -> Result<usize, ApiError> {
        let mut sessions = self.registry()?;
        Ok(prune_idle(&mut sessions, self.limits.idle_timeout))
    }

    pub fn close(&self, id: &str) -> Result<(), ApiError> {
        self.registry()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(id.to_string()))
    }

    pub fn session_count(&self) -> usize {
        self.registry().map_or(0, |sessions| sessions.len())
    }
}

fn prune_idle(sessions: &mut Registry, idle_timeout: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, slot| slot.last_used.elapsed() < idle_timeout);
    before - sessions.len()
}

fn with_session<T>(
    state: &AppState,
    id: &str,
    f: impl FnOnce(&mut EditSession) -> Result<T, ApiError>,
) -> Result<T, ApiError> {
    let session = state.session(id)?;
    let mut guard = session.lock().map_err(|_| ApiError::Poisoned)?;
    f(&mut guard)
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|err| ApiError::BadRequest(err.to_string()))
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogUnit {
    pub role: BattlefieldRole,
    pub name: String,
    pub size: [u32; 2],
    pub base_points: u32,
    pub default_points: Option<u32>,
    pub options: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogListing {
    pub faction: String,
    pub units: Vec<CatalogUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenUnitRequest {
    pub role: String,
    pub unit: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectRequest {
    pub option: usize,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub letter: Option<char>,
    #[serde(default)]
    pub item: Option<String>,
    /// Replaces the option's picks wholesale.
    #[serde(default)]
    pub indices: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResizeRequest {
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub counts: Option<Vec<u32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub state: SessionState,
    pub unit: UnitSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionsView {
    pub id: String,
    pub state: SessionState,
    pub options: Vec<RenderedOption>,
}

fn session_view(id: &str, session: &EditSession) -> SessionView {
    SessionView {
        id: id.to_string(),
        state: session.state(),
        unit: session.summary(),
    }
}

pub fn health_payload(state: &AppState) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "armoury-api",
        "version": env!("CARGO_PKG_VERSION"),
        "faction": state.catalog.faction,
        "sessions": state.session_count(),
        "max_sessions": state.limits().max_sessions,
    }))?)
}

pub fn units_payload(state: &AppState) -> Result<String, ApiError> {
    let units = state
        .catalog
        .units()
        .map(|(role, template)| {
            let default_points = match Unit::new(&state.catalog, role, &template.name) {
                Ok(unit) => Some(unit.points()),
                Err(err) => {
                    tracing::warn!(unit = %template.name, error = %err, "unit cannot be built");
                    None
                }
            };
            CatalogUnit {
                role,
                name: template.name.clone(),
                size: template.size,
                base_points: template.base_points,
                default_points,
                options: template.options.len(),
            }
        })
        .collect();
    Ok(serde_json::to_string_pretty(&CatalogListing {
        faction: state.catalog.faction.clone(),
        units,
    })?)
}

pub fn open_unit_payload(state: &AppState, body: &str) -> Result<String, ApiError> {
    let request: OpenUnitRequest = parse_body(body)?;
    let role = request
        .role
        .parse::<BattlefieldRole>()
        .map_err(ApiError::BadRequest)?;
    let mut unit = Unit::new(&state.catalog, role, &request.unit)?;
    if let Some(name) = request.name {
        unit.rename(name);
    }
    let id = state.open(unit)?;
    tracing::info!(%id, unit = %request.unit, "unit session opened");
    with_session(state, &id, |session| Ok(serde_json::to_string_pretty(&session_view(&id, session))?))
}

pub fn unit_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    with_session(state, id, |session| Ok(serde_json::to_string_pretty(&session_view(id, session))?))
}

pub fn options_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    with_session(state, id, |session| {
        let options = session.list_options()?;
        Ok(serde_json::to_string_pretty(&OptionsView {
            id: id.to_string(),
            state: session.state(),
            options,
        })?)
    })
}

pub fn select_payload(state: &AppState, id: &str, body: &str) -> Result<String, ApiError> {
    let request: SelectRequest = parse_body(body)?;
    let armoury_item = match &request.item {
        Some(name) => Some(
            parse_wargear(state.catalog.armoury(), name)
                .map_err(|err| ApiError::BadRequest(err.to_string()))?,
        ),
        None => None,
    };
    with_session(state, id, |session| {
        if let Some(indices) = &request.indices {
            session.select_list(request.option, indices)?;
        } else {
            let choice = match (request.index, request.letter, armoury_item) {
                (Some(index), _, _) => Selection::Index(index),
                (None, Some(letter), _) => Selection::Letter(letter),
                (None, None, Some(item)) => Selection::Item(item),
                (None, None, None) => {
                    return Err(ApiError::BadRequest(
                        "one of index, letter, item or indices is required".to_string(),
                    ))
                }
            };
            session.select(request.option, choice)?;
        }
        let options = session.list_options()?;
        Ok(serde_json::to_string_pretty(&OptionsView {
            id: id.to_string(),
            state: session.state(),
            options,
        })?)
    })
}

/// Applies pending picks and returns the session to viewing.
pub fn apply_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    with_session(state, id, |session| {
        session.apply()?;
        session.finish()?;
        Ok(serde_json::to_string_pretty(&session_view(id, session))?)
    })
}

pub fn resize_payload(state: &AppState, id: &str, body: &str) -> Result<String, ApiError> {
    let request: ResizeRequest = parse_body(body)?;
    with_session(state, id, |session| {
        match (request.size, &request.counts) {
            (_, Some(counts)) => session.resize_models(counts)?,
            (Some(size), None) => session.resize(size)?,
            (None, None) => return Err(ApiError::BadRequest("size or counts is required".to_string())),
        };
        Ok(serde_json::to_string_pretty(&session_view(id, session))?)
    })
}

pub fn reset_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    with_session(state, id, |session| {
        session.reset()?;
        Ok(serde_json::to_string_pretty(&session_view(id, session))?)
    })
}

pub fn close_payload(state: &AppState, id: &str) -> Result<String, ApiError> {
    state.close(id)?;
    tracing::info!(%id, "unit session closed");
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "closed",
        "id": id,
    }))?)
}
