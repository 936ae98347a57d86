use log::info;
use rouille::{Request, Response, input::json_input};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    config::{GameDefaults, HttpConfig},
    domain::hash::TrackId,
    game::{
        ledger::Standing,
        matcher::{GuessInput, MatchResult},
        session::{Direction, EndCondition, PlayMode, Session, SessionSnapshot},
    },
    http::error::ApiError,
    library::{catalog::Catalog, error::LibraryError, fs::is_valid_music_path},
};

/// Everything behind the lock: the answer key and the one running game.
pub struct GameHost {
    catalog: Catalog,
    defaults: GameDefaults,
    session: Option<Session>,
}

impl GameHost {
    pub fn new(catalog: Catalog, defaults: GameDefaults) -> Self {
        Self {
            catalog,
            defaults,
            session: None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, ApiError> {
        self.session
            .as_mut()
            .ok_or_else(|| ApiError::Conflict("no game in progress".into()))
    }
}

pub struct HttpServer {
    host: Arc<Mutex<GameHost>>,
    pub config: HttpConfig,
}

#[derive(Deserialize)]
struct StartRequest {
    mode: Option<PlayMode>,
    end_condition: Option<EndCondition>,
    #[serde(default)]
    players: Vec<String>,
}

#[derive(Deserialize)]
struct JoinRequest {
    player: String,
}

#[derive(Deserialize)]
struct GuessRequest {
    player: String,
    #[serde(flatten)]
    guess: GuessInput,
}

#[derive(Deserialize)]
struct AdvanceRequest {
    direction: Direction,
}

#[derive(Deserialize)]
struct TickRequest {
    elapsed_seconds: f64,
}

#[derive(Serialize)]
struct GuessResponse {
    result: MatchResult,
    session: SessionSnapshot,
}

#[derive(Serialize)]
struct WinnerResponse {
    winners: Vec<Standing>,
}

impl HttpServer {
    pub fn new(catalog: Catalog, defaults: GameDefaults, config: HttpConfig) -> Self {
        Self {
            host: Arc::new(Mutex::new(GameHost::new(catalog, defaults))),
            config,
        }
    }

    pub fn run(self) {
        let addr = format!("{}:{}", self.config.bind_addr, self.config.port);
        rouille::start_server(addr, move |request| self.handle_request(request));
    }

    fn handle_request(&self, request: &Request) -> Response {
        Self::log_request(request);

        let response = rouille::router!(request,
            (GET) (/) => {
                Response::html(include_str!("../../html/game.html"))
            },
            (GET) (/tracks/{id: String}/stream) => {
                respond_with(self.get_track_stream(id))
            },
            (GET) (/session) => {
                respond(self.lock().and_then(|mut host| {
                    Ok(host.session_mut()?.snapshot())
                }))
            },
            (POST) (/session) => {
                respond(self.start_session(request))
            },
            (POST) (/session/players) => {
                respond(json_input::<JoinRequest>(request)
                    .map_err(ApiError::from)
                    .and_then(|body| self.mutate(|s| Ok(s.join(&body.player)?))))
            },
            (POST) (/session/guess) => {
                respond(self.submit_guess(request))
            },
            (POST) (/session/reveal) => {
                respond(self.mutate(|s| s.reveal().map(|_| ()).map_err(ApiError::from)))
            },
            (POST) (/session/advance) => {
                respond(json_input::<AdvanceRequest>(request)
                    .map_err(ApiError::from)
                    .and_then(|body| self.mutate(|s| Ok(s.advance(body.direction)?))))
            },
            (POST) (/session/timer) => {
                respond(self.mutate(|s| Ok(s.start_timer()?)))
            },
            (POST) (/session/tick) => {
                respond(self.tick(request))
            },
            (GET) (/session/winner) => {
                respond(self.lock().and_then(|mut host| {
                    let winners = host.session_mut()?.winner()?;
                    Ok(WinnerResponse { winners })
                }))
            },
            _ => Response::empty_404()
        );

        info!("Response: {} {}", request.method(), response.status_code);
        response
    }

    fn log_request(request: &Request) {
        info!("{} {}", request.method(), request.url());
    }

    fn lock(&self) -> Result<MutexGuard<'_, GameHost>, ApiError> {
        self.host
            .lock()
            .map_err(|e| ApiError::Internal(format!("Could not access game state under lock: {e}")))
    }

    /// Runs one engine operation, then lets the session decide whether the
    /// game is over and returns the fresh snapshot.
    fn mutate<F>(&self, op: F) -> Result<SessionSnapshot, ApiError>
    where
        F: FnOnce(&mut Session) -> Result<(), ApiError>,
    {
        let mut host = self.lock()?;
        let session = host.session_mut()?;
        op(session)?;
        session.check_end_condition();
        Ok(session.snapshot())
    }

    fn start_session(&self, request: &Request) -> Result<SessionSnapshot, ApiError> {
        let body: StartRequest = json_input(request)?;
        let mut host = self.lock()?;

        let config = host.defaults.resolve(body.mode, body.end_condition);
        let mut session = Session::start(config, host.catalog.records())?;
        for player in &body.players {
            session.join(player)?;
        }

        let snapshot = session.snapshot();
        // starting again abandons the previous game
        host.session = Some(session);
        Ok(snapshot)
    }

    fn submit_guess(&self, request: &Request) -> Result<GuessResponse, ApiError> {
        let body: GuessRequest = json_input(request)?;
        let mut host = self.lock()?;
        let session = host.session_mut()?;

        let result = session.submit_guess(&body.player, &body.guess)?;
        session.check_end_condition();

        Ok(GuessResponse {
            result,
            session: session.snapshot(),
        })
    }

    fn tick(&self, request: &Request) -> Result<SessionSnapshot, ApiError> {
        let body: TickRequest = json_input(request)?;
        let elapsed = Duration::try_from_secs_f64(body.elapsed_seconds)
            .map_err(|e| ApiError::BadRequest(format!("invalid elapsed time: {e}")))?;

        let mut host = self.lock()?;
        let session = host.session_mut()?;
        session.tick(elapsed);
        session.check_end_condition();
        Ok(session.snapshot())
    }

    /// returns Response with ok status, or ApiError
    fn get_track_stream(&self, id: String) -> Result<Response, ApiError> {
        let track_id = TrackId::from_hex(&id).map_err(|_| LibraryError::InvalidTrackId)?;

        let path = {
            let host = self.lock()?;
            host.catalog
                .path_of(&track_id)
                .map(|p| p.to_path_buf())
                .ok_or_else(|| LibraryError::TrackNotFound(track_id.clone()))?
        };

        if !is_valid_music_path(&path) {
            return Err(LibraryError::InvalidTrackFile { track: track_id }.into());
        }

        let mime = mime_for_track(&path);
        let file = std::fs::File::open(&path).map_err(LibraryError::Fs)?;
        log::debug!(
            "STREAM {} -> 200 OK, path: {}, MIME type: {}",
            id,
            path.to_string_lossy(),
            mime
        );

        Ok(Response::from_file(mime, file))
    }
}

fn respond<T: Serialize>(result: Result<T, ApiError>) -> Response {
    respond_with(result.map(|body| Response::json(&body)))
}

fn respond_with(result: Result<Response, ApiError>) -> Response {
    result.unwrap_or_else(ApiError::into_response)
}

fn mime_for_track(path: &std::path::Path) -> String {
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy())
        .map(|s| s.to_lowercase());
    let default = || {
        mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string()
    };
    ext.and_then(|ext| mime_from_ext(ext.as_str()))
        .unwrap_or_else(default)
}

/// Map file extension (without dot) to proper MIME type for browser playback.
/// Returns None if the extension is not recognized.
pub fn mime_from_ext(ext: &str) -> Option<String> {
    match ext {
        "m4a" => Some("audio/x-m4a".to_string()), // Safari iOS compatible
        "aac" => Some("audio/aac".to_string()),
        "mp3" => Some("audio/mpeg".to_string()),
        "wav" => Some("audio/wav".to_string()),
        "ogg" => Some("audio/ogg".to_string()),
        "flac" => Some("audio/flac".to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub fn parse_json_response(response: rouille::Response) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::from_reader(
        response.data.into_reader_and_size().0,
    )?)
}
