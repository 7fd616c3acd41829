//! Cross-origin admission for the WebSocket upgrade

/// Allow-list of browser origins, with a blanket override.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allow_all: bool,
    allowed: Vec<String>,
}

impl OriginPolicy {
    pub fn new<I, S>(allowed: I, allow_all: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allow_all,
            allowed: allowed
                .into_iter()
                .map(|origin| normalize(origin.as_ref()))
                .filter(|origin| !origin.is_empty())
                .collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self {
            allow_all: true,
            allowed: Vec::new(),
        }
    }

    /// A request without an `Origin` header did not come from a browser page
    /// and is not subject to the allow-list.
    pub fn permits(&self, origin: Option<&str>) -> bool {
        if self.allow_all {
            return true;
        }
        match origin {
            None => true,
            Some(origin) => {
                let origin = normalize(origin);
                self.allowed.iter().any(|allowed| *allowed == origin)
            }
        }
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
