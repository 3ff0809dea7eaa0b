//! Proxy auto-config (PAC) ruleset that blackholes ad traffic.
//!
//! The rendered script routes matching requests to an unreachable proxy so the
//! browser drops them at the transport layer. [`PacRules::evaluate`] applies
//! the same rules in-process.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Proxy target that no connection can reach.
pub const BLACKHOLE_PROXY: &str = "PROXY 0.0.0.0:0";
pub const DIRECT: &str = "DIRECT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacRules {
    /// Shell-expression host patterns (`*` and `?` wildcards)
    pub host_patterns: Vec<String>,
    /// Substrings of the lower-cased URL that mark a request as ad traffic
    pub path_keywords: Vec<String>,
}

impl Default for PacRules {
    fn default() -> Self {
        Self {
            host_patterns: vec![
                "*.ttvnw.net".to_string(),
                "usher.ttvnw.net".to_string(),
                "*.ttv.edge".to_string(),
            ],
            path_keywords: ["ad", "ads", "preroll", "stitched", "midroll"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyDecision {
    Direct,
    Blackhole,
}

impl ProxyDecision {
    pub fn as_pac_str(self) -> &'static str {
        match self {
            ProxyDecision::Direct => DIRECT,
            ProxyDecision::Blackhole => BLACKHOLE_PROXY,
        }
    }
}

impl PacRules {
    /// Render the rules as a `FindProxyForURL` script.
    pub fn render(&self) -> String {
        let hosts = self
            .host_patterns
            .iter()
            .map(|p| format!("shExpMatch(host, {})", js_string(p)))
            .collect::<Vec<_>>()
            .join(" || ");
        let keywords = self
            .path_keywords
            .iter()
            .map(|k| format!("u.indexOf({}) !== -1", js_string(&k.to_lowercase())))
            .collect::<Vec<_>>()
            .join(" || ");

        let mut script = String::new();
        script.push_str("function FindProxyForURL(url, host) {\n");
        if !hosts.is_empty() && !keywords.is_empty() {
            let _ = writeln!(script, "  if ({hosts}) {{");
            script.push_str("    var u = url.toLowerCase();\n");
            let _ = writeln!(script, "    if ({keywords}) {{");
            let _ = writeln!(script, "      return \"{BLACKHOLE_PROXY}\";");
            script.push_str("    }\n");
            script.push_str("  }\n");
        }
        let _ = writeln!(script, "  return \"{DIRECT}\";");
        script.push_str("}\n");
        script
    }

    /// Evaluate the rules for one request, mirroring the rendered script.
    ///
    /// For host bindings that route requests themselves instead of handing a
    /// PAC script to the platform proxy resolver.
    pub fn evaluate(&self, url: &str, host: &str) -> ProxyDecision {
        let host = host.to_lowercase();
        if !self.host_matchers().iter().any(|p| p.matches(&host)) {
            return ProxyDecision::Direct;
        }
        let lowered = url.to_lowercase();
        if self
            .path_keywords
            .iter()
            .any(|k| lowered.contains(&k.to_lowercase()))
        {
            ProxyDecision::Blackhole
        } else {
            ProxyDecision::Direct
        }
    }

    fn host_matchers(&self) -> Vec<glob::Pattern> {
        self.host_patterns
            .iter()
            .filter_map(|pattern| {
                glob::Pattern::new(&pattern.to_lowercase())
                    .map_err(|e| {
                        debug!("Skipping invalid host pattern '{}': {}", pattern, e);
                        e
                    })
                    .ok()
            })
            .collect()
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
