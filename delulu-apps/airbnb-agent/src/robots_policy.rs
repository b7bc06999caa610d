//!  Delulu Airbnb Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # Robots Policy
//!
//! Advisory robots.txt gate. The rules are fetched at most once per policy
//! instance and kept for its whole lifetime; the fetcher does not consult
//! this gate, callers do.

use crate::http_fetcher::Fetcher;
use crate::scraper_config::ScraperConfig;
use robotstxt::DefaultMatcher;
use tokio::sync::OnceCell;

pub struct RobotsPolicy {
    ignore: bool,
    robots_url: String,
    user_agent: String,
    rules: OnceCell<String>,
}

/// robots.txt groups are matched on the product token only ("ModelContextProtocol").
fn product_token(user_agent: &str) -> &str {
    let end = user_agent
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(user_agent.len());
    &user_agent[..end]
}

impl RobotsPolicy {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            ignore: config.ignore_robots_txt,
            robots_url: config.robots_url(),
            user_agent: config.user_agent.clone(),
            rules: OnceCell::new(),
        }
    }

    /// A policy whose rules are already known; nothing is ever fetched.
    pub fn with_rules(config: &ScraperConfig, rules: impl Into<String>) -> Self {
        Self {
            rules: OnceCell::new_with(Some(rules.into())),
            ..Self::new(config)
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.rules.initialized()
    }

    /// Fetches robots.txt on first use. Concurrent first callers share a
    /// single fetch. A failed fetch caches empty rules, which allow everything.
    pub async fn ensure_loaded<F: Fetcher>(&self, fetcher: &F) {
        if self.ignore {
            return;
        }
        self.rules
            .get_or_init(|| async {
                tracing::debug!("Fetching robots.txt from {}", self.robots_url);
                match fetcher.fetch(&self.robots_url).await {
                    Ok(page) if page.is_success() => {
                        tracing::info!("Loaded robots.txt ({} bytes)", page.body.len());
                        page.body
                    }
                    Ok(page) => {
                        tracing::warn!(
                            "robots.txt returned HTTP {}, treating as empty",
                            page.status
                        );
                        String::new()
                    }
                    Err(e) => {
                        tracing::error!("Error fetching robots.txt: {}", e);
                        String::new()
                    }
                }
            })
            .await;
    }

    /// Evaluates the cached rules against `url` (its path and query are what matter).
    /// Unloaded or empty rules allow everything.
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.ignore {
            return true;
        }
        let rules = match self.rules.get() {
            Some(rules) if !rules.trim().is_empty() => rules,
            _ => return true,
        };
        let mut matcher = DefaultMatcher::default();
        let allowed =
            matcher.one_agent_allowed_by_robots(rules, product_token(&self.user_agent), url);
        if !allowed {
            tracing::warn!("robots.txt disallows {} for {}", url, self.user_agent);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = "User-agent: *\nDisallow: /s/\n";

    #[test]
    fn product_token_stops_at_version() {
        assert_eq!(
            product_token("ModelContextProtocol/1.0 (Autonomous)"),
            "ModelContextProtocol"
        );
        assert_eq!(product_token("FooBot"), "FooBot");
    }

    #[test]
    fn disallowed_path_is_rejected() {
        let policy = RobotsPolicy::with_rules(&ScraperConfig::default(), RULES);
        assert!(!policy.is_allowed("https://www.airbnb.com/s/Paris/homes?adults=2"));
        assert!(policy.is_allowed("https://www.airbnb.com/rooms/12345"));
    }

    #[test]
    fn global_override_allows_everything() {
        let config = ScraperConfig::default().with_ignore_robots_txt(true);
        let policy = RobotsPolicy::with_rules(&config, RULES);
        assert!(policy.is_allowed("https://www.airbnb.com/s/Paris/homes"));
    }

    #[test]
    fn unloaded_or_empty_rules_allow_everything() {
        let config = ScraperConfig::default();
        assert!(RobotsPolicy::new(&config).is_allowed("https://www.airbnb.com/s/Paris/homes"));
        assert!(
            RobotsPolicy::with_rules(&config, "")
                .is_allowed("https://www.airbnb.com/s/Paris/homes")
        );
    }
}
