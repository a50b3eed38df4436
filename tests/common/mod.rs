#![allow(dead_code)]

use std::sync::Mutex;

use applink::{Environment, NavigationError, NavigationMode, Navigator, Visibility};
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;

pub const IOS_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
pub const ANDROID_UA: &str =
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Mobile Safari/537.36";
pub const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 9, 12, 0, 0).unwrap()
}

/// In-memory host: records navigations and lets tests flip visibility.
pub struct FakeEnv {
    url: Option<String>,
    ua: Option<String>,
    lang: Option<String>,
    surface: bool,
    reports_visibility: bool,
    visibility: watch::Sender<Visibility>,
    refused_schemes: Vec<String>,
    navigations: Mutex<Vec<(String, NavigationMode)>>,
}

impl FakeEnv {
    pub fn new(ua: &str) -> Self {
        let (visibility, _) = watch::channel(Visibility::Visible);
        Self {
            url: None,
            ua: Some(ua.to_owned()),
            lang: Some("en-US".to_owned()),
            surface: true,
            reports_visibility: true,
            visibility,
            refused_schemes: Vec::new(),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn ios() -> Self {
        Self::new(IOS_UA)
    }

    pub fn android() -> Self {
        Self::new(ANDROID_UA)
    }

    pub fn desktop() -> Self {
        Self::new(DESKTOP_UA)
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(url.to_owned());
        self
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = Some(lang.to_owned());
        self
    }

    pub fn without_surface(mut self) -> Self {
        self.surface = false;
        self
    }

    pub fn without_visibility(mut self) -> Self {
        self.reports_visibility = false;
        self
    }

    /// Refuse navigations to URLs starting with `scheme`.
    pub fn refusing(mut self, scheme: &str) -> Self {
        self.refused_schemes.push(scheme.to_owned());
        self
    }

    pub fn hide(&self) {
        self.visibility.send_replace(Visibility::Hidden);
    }

    pub fn show(&self) {
        self.visibility.send_replace(Visibility::Visible);
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn modes(&self) -> Vec<NavigationMode> {
        self.navigations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, mode)| *mode)
            .collect()
    }
}

impl Navigator for FakeEnv {
    fn navigate(&self, url: &str, mode: NavigationMode) -> Result<(), NavigationError> {
        if self.refused_schemes.iter().any(|s| url.starts_with(s.as_str())) {
            return Err(NavigationError::Rejected {
                url: url.to_owned(),
                reason: "unknown scheme".to_owned(),
            });
        }
        self.navigations
            .lock()
            .unwrap()
            .push((url.to_owned(), mode));
        Ok(())
    }
}

impl Environment for FakeEnv {
    fn current_url(&self) -> Option<String> {
        self.url.clone()
    }

    fn user_agent(&self) -> Option<String> {
        self.ua.clone()
    }

    fn language(&self) -> Option<String> {
        self.lang.clone()
    }

    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }

    fn has_navigation_surface(&self) -> bool {
        self.surface
    }

    fn visibility(&self) -> Option<watch::Receiver<Visibility>> {
        self.reports_visibility.then(|| self.visibility.subscribe())
    }
}
