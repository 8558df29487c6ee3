//! Which requests the agent may intercept

use crate::config::schema::RoutesConfig;
use serde::Serialize;

/// URL segment rules. An empty segment never matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRules {
    pub api_segment: String,
    pub post_segment: String,
    pub static_segment: String,
}

fn has_segment(url: &str, segment: &str) -> bool {
    !segment.is_empty() && url.contains(segment)
}

impl RouteRules {
    pub fn from_config(config: &RoutesConfig) -> Self {
        Self {
            api_segment: config.api_segment.clone(),
            post_segment: config.post_segment.clone(),
            static_segment: config.static_segment.clone(),
        }
    }

    /// Dynamic content that must always go to the network:
    /// `api || (post && !static)`
    pub fn bypasses(&self, url: &str) -> bool {
        has_segment(url, &self.api_segment)
            || (has_segment(url, &self.post_segment) && !self.is_static(url))
    }

    /// Static asset eligible for the runtime bucket
    pub fn is_static(&self, url: &str) -> bool {
        has_segment(url, &self.static_segment)
    }
}

impl Default for RouteRules {
    fn default() -> Self {
        Self::from_config(&RoutesConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:5000";

    #[test]
    fn api_always_bypasses() {
        let rules = RouteRules::default();
        assert!(rules.bypasses(&format!("{BASE}/api/posts")));
        // api wins even under /static/
        assert!(rules.bypasses(&format!("{BASE}/static/api/x.js")));
    }

    #[test]
    fn post_bypasses_unless_static() {
        let rules = RouteRules::default();
        assert!(rules.bypasses(&format!("{BASE}/post/12/like")));
        assert!(!rules.bypasses(&format!("{BASE}/static/post/cover.png")));
    }

    #[test]
    fn ordinary_pages_are_intercepted() {
        let rules = RouteRules::default();
        assert!(!rules.bypasses(&format!("{BASE}/feed")));
        assert!(!rules.bypasses(&format!("{BASE}/static/css/style.css")));
        assert!(rules.is_static(&format!("{BASE}/static/css/style.css")));
        assert!(!rules.is_static(&format!("{BASE}/login")));
    }

    #[test]
    fn empty_segments_never_match() {
        let rules = RouteRules {
            api_segment: String::new(),
            post_segment: String::new(),
            static_segment: String::new(),
        };
        assert!(!rules.bypasses(&format!("{BASE}/api/x")));
        assert!(!rules.is_static(&format!("{BASE}/static/x")));
    }
}
