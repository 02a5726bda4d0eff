//! Icon url resolution with a bounded fallback chain.
//!
//! Each icon is a small state machine: the form-specific file is tried
//! first, then the base-form file, then the embedded placeholder. At most two
//! load attempts are ever made per icon.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::record::EventKind;

/// 1x1 transparent PNG, shown once every load attempt failed
pub const PLACEHOLDER_ICON: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Load attempts allowed per icon
pub const MAX_ATTEMPTS: u8 = 2;

const EXTENSION: &str = ".webp";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconState {
    Loading,
    Loaded,
    RetryingBaseForm,
    Failed,
}

/// One icon and where it is in its fallback chain.
#[derive(Clone, Debug, PartialEq)]
pub struct IconResource {
    base: String,
    category_id: u32,
    form: Option<u32>,
    state: IconState,
    attempts: u8,
}

impl IconResource {
    pub fn new(base_url: &str, dir: &str, category_id: u32, form: Option<u32>) -> Self {
        Self {
            base: format!("{}/{}/", base_url.trim_end_matches('/'), dir),
            category_id,
            form,
            state: IconState::Loading,
            attempts: 1,
        }
    }

    pub fn for_kind(base_url: &str, kind: &EventKind) -> Self {
        Self::new(base_url, kind.domain().icon_dir(), kind.category_id(), kind.form())
    }

    pub fn state(&self) -> IconState {
        self.state
    }

    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Url for the current state
    pub fn url(&self) -> String {
        match (self.state, self.form) {
            (IconState::Failed, _) => PLACEHOLDER_ICON.to_string(),
            (IconState::RetryingBaseForm, _) | (_, None) => {
                format!("{}{}{}", self.base, self.category_id, EXTENSION)
            }
            (_, Some(form)) => format!("{}{}_f{}{}", self.base, self.category_id, form, EXTENSION),
        }
    }

    pub fn on_loaded(&mut self) {
        if matches!(self.state, IconState::Loading | IconState::RetryingBaseForm) {
            self.state = IconState::Loaded;
        }
    }

    pub fn on_error(&mut self) {
        self.state = match self.state {
            IconState::Loading if self.form.is_some() && self.attempts < MAX_ATTEMPTS => {
                self.attempts += 1;
                IconState::RetryingBaseForm
            }
            IconState::Loading | IconState::RetryingBaseForm => IconState::Failed,
            settled => settled,
        };
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, IconState::Loaded | IconState::Failed)
    }
}

/// Answers whether an icon url can be loaded.
pub trait IconProbe {
    fn is_available(&self, url: &str) -> bool;
}

/// Probe for hosts that never load images themselves.
pub struct AssumeAvailable;

impl IconProbe for AssumeAvailable {
    fn is_available(&self, _url: &str) -> bool {
        true
    }
}

/// HEAD request against the icon server; any non-2xx answer or transport
/// failure counts as missing.
pub struct HttpIconProbe {
    client: Client,
}

impl HttpIconProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl IconProbe for HttpIconProbe {
    fn is_available(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                debug!(url, "icon probe failed: {err}");
                false
            }
        }
    }
}

/// Runs icons through their state machine once and remembers the outcome.
pub struct IconResolver {
    base_url: String,
    probe: Box<dyn IconProbe>,
    resolved: HashMap<EventKind, String>,
}

impl IconResolver {
    pub fn new(base_url: impl Into<String>, probe: Box<dyn IconProbe>) -> Self {
        Self {
            base_url: base_url.into(),
            probe,
            resolved: HashMap::new(),
        }
    }

    pub fn url_for(&mut self, kind: &EventKind) -> String {
        let key = icon_identity(kind);
        if let Some(url) = self.resolved.get(&key) {
            return url.clone();
        }
        let mut icon = IconResource::for_kind(&self.base_url, kind);
        while !icon.is_settled() {
            if self.probe.is_available(&icon.url()) {
                icon.on_loaded();
            } else {
                icon.on_error();
            }
        }
        let url = icon.url();
        self.resolved.insert(key, url.clone());
        url
    }
}

/// Strip fields that do not affect the icon file
fn icon_identity(kind: &EventKind) -> EventKind {
    match *kind {
        EventKind::Spawn { species, form, .. } => EventKind::Spawn { species, form, iv: None },
        EventKind::Raid { species, form, .. } => EventKind::Raid { species, form, level: 0 },
        EventKind::Invasion { character, .. } => EventKind::Invasion { display_type: 0, character },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BASE: &str = "https://icons.example/";

    #[test]
    fn test_url_convention() {
        let icon = IconResource::new(BASE, "pokemon", 25, Some(598));
        assert_eq!(icon.url(), "https://icons.example/pokemon/25_f598.webp");
        let icon = IconResource::new(BASE, "invasion", 41, None);
        assert_eq!(icon.url(), "https://icons.example/invasion/41.webp");
    }

    #[test]
    fn test_form_fallback_then_placeholder() {
        let mut icon = IconResource::new(BASE, "pokemon", 25, Some(598));
        icon.on_error();
        assert_eq!(icon.state(), IconState::RetryingBaseForm);
        assert_eq!(icon.url(), "https://icons.example/pokemon/25.webp");
        icon.on_error();
        assert_eq!(icon.state(), IconState::Failed);
        assert_eq!(icon.url(), PLACEHOLDER_ICON);
        assert_eq!(icon.attempts(), MAX_ATTEMPTS);

        // settled: further events change nothing
        icon.on_error();
        icon.on_loaded();
        assert_eq!(icon.state(), IconState::Failed);
    }

    #[test]
    fn test_no_form_fails_after_one_attempt() {
        let mut icon = IconResource::new(BASE, "invasion", 41, None);
        icon.on_error();
        assert_eq!(icon.state(), IconState::Failed);
        assert_eq!(icon.attempts(), 1);
    }

    #[test]
    fn test_retry_can_succeed() {
        let mut icon = IconResource::new(BASE, "pokemon", 25, Some(598));
        icon.on_error();
        icon.on_loaded();
        assert_eq!(icon.state(), IconState::Loaded);
        assert_eq!(icon.url(), "https://icons.example/pokemon/25.webp");
    }

    struct CountingProbe {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl IconProbe for CountingProbe {
        fn is_available(&self, url: &str) -> bool {
            self.seen.borrow_mut().push(url.to_string());
            false
        }
    }

    #[test]
    fn test_resolver_caches_and_bounds_attempts() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut resolver = IconResolver::new(BASE, Box::new(CountingProbe { seen: seen.clone() }));
        let kind = EventKind::Spawn { species: 25, form: 598, iv: Some(12) };
        assert_eq!(resolver.url_for(&kind), PLACEHOLDER_ICON);
        let same_icon = EventKind::Spawn { species: 25, form: 598, iv: Some(15) };
        assert_eq!(resolver.url_for(&same_icon), PLACEHOLDER_ICON);
        assert_eq!(resolver.resolved.len(), 1);
        assert_eq!(
            *seen.borrow(),
            vec![
                "https://icons.example/pokemon/25_f598.webp".to_string(),
                "https://icons.example/pokemon/25.webp".to_string(),
            ]
        );
    }

    #[test]
    fn test_http_probe_falls_back_when_unreachable() {
        let probe = HttpIconProbe::new(Duration::from_millis(300)).unwrap();
        assert!(!probe.is_available("not a url"));

        let mut resolver = IconResolver::new("http://127.0.0.1:9", Box::new(probe));
        let kind = EventKind::Spawn { species: 25, form: 598, iv: None };
        assert_eq!(resolver.url_for(&kind), PLACEHOLDER_ICON);
    }

    #[test]
    fn test_resolver_default_probe() {
        let mut resolver = IconResolver::new(BASE, Box::new(AssumeAvailable));
        let kind = EventKind::Raid { species: 150, form: 0, level: 5 };
        assert_eq!(resolver.url_for(&kind), "https://icons.example/pokemon/150.webp");
    }
}
