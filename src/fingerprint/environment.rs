use axum::http::HeaderMap;
use std::collections::BTreeMap;

/// Placeholder for a signal the runtime could not provide.
pub const UNKNOWN: &str = "unknown";

const HEADER_SIGNALS: &[(&str, &str)] = &[
    ("user-agent", "user_agent"),
    ("accept-language", "language"),
    ("sec-ch-ua", "client_hints"),
    ("sec-ch-ua-platform", "platform"),
    ("sec-ch-ua-mobile", "mobile"),
];

/// Snapshot of the signals a fingerprint is derived from.
///
/// Capturing is the only step that touches the process or a request;
/// everything downstream works on this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    signals: BTreeMap<String, String>,
}

impl Environment {
    /// Reads the signals of the running process.
    pub fn capture() -> Self {
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty());
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get().to_string())
            .ok();
        let mut environment = Self::default();
        environment.insert("os", Some(std::env::consts::OS));
        environment.insert("arch", Some(std::env::consts::ARCH));
        environment.insert("family", Some(std::env::consts::FAMILY));
        environment.insert("locale", locale.as_deref());
        environment.insert("timezone", std::env::var("TZ").ok().as_deref());
        environment.insert("cpus", cpus.as_deref());
        environment.insert("app_version", Some(env!("CARGO_PKG_VERSION")));
        environment
    }

    /// Derives signals from the headers a browser or app sends along.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut environment = Self::default();
        for (header, name) in HEADER_SIGNALS {
            let value = headers.get(*header).and_then(|it| it.to_str().ok());
            environment.insert(name, value);
        }
        environment
    }

    /// Accepts signals reported by a client. Unnamed entries are dropped.
    pub fn from_signals<I, K, V>(signals: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut environment = Self::default();
        for (name, value) in signals {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            environment.insert(name, Some(value.as_ref()));
        }
        environment
    }

    fn insert(&mut self, name: &str, value: Option<&str>) {
        let value = value
            .map(str::trim)
            .filter(|it| !it.is_empty())
            .unwrap_or(UNKNOWN);
        self.signals.insert(name.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn signals(&self) -> &BTreeMap<String, String> {
        &self.signals
    }

    pub fn into_signals(self) -> BTreeMap<String, String> {
        self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn capture_always_reports_the_full_signal_set() {
        let environment = Environment::capture();
        for name in ["os", "arch", "family", "locale", "timezone", "cpus", "app_version"] {
            assert!(environment.signals().contains_key(name), "missing {name}");
        }
        assert_eq!(environment.signals()["os"], std::env::consts::OS);
    }

    #[test]
    fn missing_headers_become_sentinels() {
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("courier-app/3.1"));
        let environment = Environment::from_headers(&headers);
        assert_eq!(environment.signals()["user_agent"], "courier-app/3.1");
        assert_eq!(environment.signals()["language"], UNKNOWN);
        assert_eq!(environment.signals().len(), HEADER_SIGNALS.len());
    }

    #[test]
    fn reported_signals_are_trimmed_and_unnamed_ones_dropped() {
        let environment = Environment::from_signals([
            (" screen ", " 390x844 "),
            ("", "ignored"),
            ("touch", ""),
        ]);
        assert_eq!(environment.signals().len(), 2);
        assert_eq!(environment.signals()["screen"], "390x844");
        assert_eq!(environment.signals()["touch"], UNKNOWN);
    }
}
