//! Pre-authenticated session state
//!
//! Reads the JSON storage-state format written by Playwright's
//! `context.storage_state(path=...)`. Only the cookies are used; origin
//! local storage entries are ignored.

use crate::browser::{BrowserError, BrowserResult};
use serde::Deserialize;
use std::path::Path;

/// Cookies captured from a logged-in browser context
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Unix seconds; `-1` marks a session cookie
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub secure: Option<bool>,
}

impl SessionCookie {
    /// Expiry in Unix seconds, or `None` for a cookie that ends with the session
    pub fn expires_at(&self) -> Option<f64> {
        self.expires.filter(|e| e.is_finite() && *e > 0.0)
    }
}

/// Parses storage-state JSON
pub fn parse_session_state(json: &str) -> BrowserResult<SessionState> {
    let state: SessionState =
        serde_json::from_str(json).map_err(|e| BrowserError::SessionState(e.to_string()))?;

    if let Some(cookie) = state.cookies.iter().find(|c| c.name.is_empty()) {
        return Err(BrowserError::SessionState(format!(
            "cookie with empty name (value '{}')",
            cookie.value
        )));
    }

    Ok(state)
}

/// Loads storage-state JSON from a file
pub fn load_session_state(path: &Path) -> BrowserResult<SessionState> {
    let json = std::fs::read_to_string(path)?;
    parse_session_state(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PLAYWRIGHT_STATE: &str = r#"{
  "cookies": [
    {
      "name": "reddit_session",
      "value": "abc123",
      "domain": ".reddit.com",
      "path": "/",
      "expires": 1767225600.5,
      "httpOnly": true,
      "secure": true,
      "sameSite": "None"
    },
    {
      "name": "csv",
      "value": "2",
      "domain": ".reddit.com",
      "path": "/",
      "expires": -1,
      "httpOnly": false,
      "secure": true,
      "sameSite": "Lax"
    }
  ],
  "origins": [
    {
      "origin": "https://www.reddit.com",
      "localStorage": [{"name": "theme", "value": "dark"}]
    }
  ]
}"#;

    #[test]
    fn test_parse_playwright_state() {
        let state = parse_session_state(PLAYWRIGHT_STATE).unwrap();
        assert_eq!(state.cookies.len(), 2);

        let session = &state.cookies[0];
        assert_eq!(session.name, "reddit_session");
        assert_eq!(session.domain.as_deref(), Some(".reddit.com"));
        assert_eq!(session.http_only, Some(true));
        assert_eq!(session.expires_at(), Some(1767225600.5));

        assert_eq!(state.cookies[1].expires_at(), None);
    }

    #[test]
    fn test_minimal_cookie() {
        let state = parse_session_state(r#"{"cookies":[{"name":"a","value":"b"}]}"#).unwrap();
        let cookie = &state.cookies[0];
        assert!(cookie.domain.is_none());
        assert!(cookie.expires_at().is_none());
    }

    #[test]
    fn test_empty_object() {
        let state = parse_session_state("{}").unwrap();
        assert!(state.cookies.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_session_state("not json"),
            Err(BrowserError::SessionState(_))
        ));
        assert!(matches!(
            parse_session_state(r#"{"cookies":[{"name":"","value":"x"}]}"#),
            Err(BrowserError::SessionState(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLAYWRIGHT_STATE.as_bytes()).unwrap();

        let state = load_session_state(file.path()).unwrap();
        assert_eq!(state.cookies.len(), 2);

        assert!(matches!(
            load_session_state(Path::new("/nonexistent/state.json")),
            Err(BrowserError::Io(_))
        ));
    }
}
