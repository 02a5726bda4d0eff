//! Grunt display names, loaded once and cached for the process lifetime.
//!
//! The first lookup starts a background fetch of `assets/grunts.json` (an
//! object of symbolic name → numeric id). Lookups made before it resolves get
//! the numeric fallback instead of waiting. A failed fetch resolves the table
//! to empty and is never retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::{info, warn};

use crate::error::NameLookupError;

/// Path of the name table relative to the asset base url
pub const GRUNTS_PATH: &str = "assets/grunts.json";

/// Where the raw name → id table comes from.
pub trait NameSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<HashMap<String, u32>, NameLookupError>;
}

/// HTTP GET of the name table from the asset server.
pub struct HttpNameSource {
    url: Url,
}

impl HttpNameSource {
    pub fn new(base_url: &str) -> Result<Self, NameLookupError> {
        let base = Url::parse(base_url).map_err(|err| NameLookupError::Url(err.to_string()))?;
        let url = base
            .join(GRUNTS_PATH)
            .map_err(|err| NameLookupError::Url(err.to_string()))?;
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl NameSource for HttpNameSource {
    fn fetch(&self) -> Result<HashMap<String, u32>, NameLookupError> {
        let response = Client::new().get(self.url.clone()).send()?;
        if !response.status().is_success() {
            return Err(NameLookupError::Status(response.status().as_u16()));
        }
        let mut bytes = response.bytes()?.to_vec();
        let table: HashMap<String, u32> = simd_json::serde::from_slice(&mut bytes)?;
        Ok(table)
    }
}

/// Source that never resolves to any names; used when no asset url is valid.
pub struct NoNames;

impl NameSource for NoNames {
    fn fetch(&self) -> Result<HashMap<String, u32>, NameLookupError> {
        Ok(HashMap::new())
    }
}

enum LookupState {
    Unrequested,
    Pending,
    Resolved(Arc<HashMap<u32, String>>),
}

/// Load-once id → display name cache.
pub struct GruntNames {
    source: Arc<dyn NameSource>,
    state: Arc<Mutex<LookupState>>,
}

static SHARED: OnceLock<Arc<GruntNames>> = OnceLock::new();

impl GruntNames {
    pub fn new(source: impl NameSource) -> Self {
        Self {
            source: Arc::new(source),
            state: Arc::new(Mutex::new(LookupState::Unrequested)),
        }
    }

    /// Process-wide instance. The first caller's asset url wins.
    pub fn shared(asset_base_url: &str) -> Arc<GruntNames> {
        SHARED
            .get_or_init(|| match HttpNameSource::new(asset_base_url) {
                Ok(source) => Arc::new(GruntNames::new(source)),
                Err(err) => {
                    warn!("grunt names disabled: {err}");
                    Arc::new(GruntNames::new(NoNames))
                }
            })
            .clone()
    }

    /// Display name for a character id; never fails.
    pub fn display_name(&self, character: u32) -> String {
        let table = self.table();
        table
            .and_then(|t| t.get(&character).cloned())
            .unwrap_or_else(|| fallback_name(character))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(*self.lock(), LookupState::Resolved(_))
    }

    /// Resolved table, or `None` while the fetch is outstanding. Starts the
    /// fetch on first use.
    fn table(&self) -> Option<Arc<HashMap<u32, String>>> {
        let mut state = self.lock();
        if let LookupState::Resolved(table) = &*state {
            return Some(table.clone());
        }
        if matches!(*state, LookupState::Pending) {
            return None;
        }
        *state = LookupState::Pending;
        drop(state);
        self.start_fetch();
        None
    }

    fn start_fetch(&self) {
        let source = self.source.clone();
        let state = self.state.clone();
        let spawned = thread::Builder::new()
            .name("grunt-names".to_string())
            .spawn(move || {
                let table = resolve(source.as_ref());
                if let Ok(mut guard) = state.lock() {
                    *guard = LookupState::Resolved(Arc::new(table));
                }
            });
        if let Err(err) = spawned {
            warn!("could not start grunt name fetch: {err}");
            *self.lock() = LookupState::Resolved(Arc::new(HashMap::new()));
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LookupState> {
        // A poisoned lock only means a fetch thread panicked mid-write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn resolve(source: &dyn NameSource) -> HashMap<u32, String> {
    match source.fetch() {
        Ok(raw) => {
            info!(names = raw.len(), "grunt names loaded");
            raw.into_iter().map(|(name, id)| (id, title_case(&name))).collect()
        }
        Err(err) => {
            warn!("grunt name fetch failed, using numeric ids: {err}");
            HashMap::new()
        }
    }
}

/// Display value used until (or instead of) a resolved name
pub fn fallback_name(character: u32) -> String {
    format!("Grunt #{character}")
}

/// `BALLOON_GRUNT_MALE` → `Balloon Grunt Male`, `EVENT_NPC_0` → `Event NPC 0`
pub fn title_case(symbol: &str) -> String {
    let words: Vec<String> = symbol
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            if lower == "npc" {
                return "NPC".to_string();
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    words.join(" ")
}
