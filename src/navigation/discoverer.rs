use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::probe::DomProbe;
use crate::browser::selectors::{NAV_BUTTON, NAV_ROUTE_ATTR, NAV_TITLE_ATTR};
use crate::error::{SweepError, SweepResult};

// ============================================================================
// Targets and filters
// ============================================================================

/// A page reachable from the navigation surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationTarget {
    pub id: String,
    pub title: String,
    pub route: String,
    /// Position among the navigation buttons, including discarded ones
    pub index: u32,
}

impl NavigationTarget {
    /// Title, or the route for untitled buttons.
    pub fn display_name(&self) -> &str {
        if self.title.is_empty() {
            &self.route
        } else {
            &self.title
        }
    }
}

/// How to narrow the discovered targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavigationFilter {
    #[default]
    All,
    /// Case-insensitive title substring, ranked exact > prefix > substring
    Keyword { keyword: String, best_match_only: bool },
    /// Exact button id
    ButtonId(String),
    /// A single route, tested even if no button advertises it
    Route(String),
}

impl NavigationFilter {
    /// Build from run parameters; route wins over button id, button id over keyword.
    pub fn from_options(
        route: Option<&str>,
        button_id: Option<&str>,
        keyword: Option<&str>,
        best_match_only: bool,
    ) -> Self {
        let non_blank = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        if let Some(route) = non_blank(route) {
            NavigationFilter::Route(route)
        } else if let Some(id) = non_blank(button_id) {
            NavigationFilter::ButtonId(id)
        } else if let Some(keyword) = non_blank(keyword) {
            NavigationFilter::Keyword { keyword, best_match_only }
        } else {
            NavigationFilter::All
        }
    }
}

// ============================================================================
// Discovery
// ============================================================================

/// Reads the navigation buttons of the page currently loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationDiscoverer;

impl NavigationDiscoverer {
    pub fn new() -> Self {
        Self
    }

    /// Every navigation button with a route. Buttons without one are
    /// logged and dropped.
    pub fn discover(&self, probe: &mut dyn DomProbe) -> SweepResult<Vec<NavigationTarget>> {
        let count = probe.count(NAV_BUTTON)?;
        info!(buttons = count, "navigation buttons found");

        let mut targets = Vec::with_capacity(count as usize);
        for index in 0..count {
            let id = probe.attribute(NAV_BUTTON, index, "id")?.unwrap_or_default();
            let route = probe
                .attribute(NAV_BUTTON, index, NAV_ROUTE_ATTR)?
                .map(|r| r.trim().to_string())
                .unwrap_or_default();
            if route.is_empty() {
                warn!(button = %id, "navigation button has no route, skipping");
                continue;
            }
            let title = match probe.attribute(NAV_BUTTON, index, NAV_TITLE_ATTR)? {
                Some(t) if !t.trim().is_empty() => t.trim().to_string(),
                _ => probe.text(NAV_BUTTON, index)?.unwrap_or_default().trim().to_string(),
            };
            debug!(button = %id, title = %title, route = %route, "navigation target");
            targets.push(NavigationTarget { id, title, route, index });
        }
        Ok(targets)
    }

    /// Discover, then narrow with `filter`. An empty result is always an
    /// error: there is nothing to test.
    pub fn discover_filtered(
        &self,
        probe: &mut dyn DomProbe,
        filter: &NavigationFilter,
        surface: &str,
    ) -> SweepResult<Vec<NavigationTarget>> {
        let discovered = self.discover(probe)?;
        if discovered.is_empty() && !matches!(filter, NavigationFilter::Route(_)) {
            return Err(SweepError::NoNavigationTargets {
                surface: surface.to_string(),
            });
        }
        let selected = select(&discovered, filter)?;
        info!(
            discovered = discovered.len(),
            selected = selected.len(),
            filter = ?filter,
            "navigation targets selected"
        );
        Ok(selected)
    }
}

/// Apply `filter` to already-discovered targets.
pub fn select(targets: &[NavigationTarget], filter: &NavigationFilter) -> SweepResult<Vec<NavigationTarget>> {
    match filter {
        NavigationFilter::All => Ok(targets.to_vec()),
        NavigationFilter::ButtonId(id) => targets
            .iter()
            .find(|t| t.id == *id)
            .map(|t| vec![t.clone()])
            .ok_or_else(|| SweepError::TargetNotFound(id.clone())),
        NavigationFilter::Route(route) => {
            let wanted = route.trim_start_matches('/');
            let target = targets
                .iter()
                .find(|t| t.route.trim_start_matches('/') == wanted)
                .cloned()
                .unwrap_or_else(|| NavigationTarget {
                    id: format!("route-{}", wanted),
                    title: wanted.to_string(),
                    route: wanted.to_string(),
                    index: 0,
                });
            Ok(vec![target])
        }
        NavigationFilter::Keyword { keyword, best_match_only } => {
            let ranked = rank_by_keyword(targets, keyword);
            if ranked.is_empty() {
                return Err(SweepError::TargetNotFound(format!("title containing '{}'", keyword)));
            }
            if *best_match_only {
                Ok(ranked.into_iter().take(1).collect())
            } else {
                Ok(ranked)
            }
        }
    }
}

/// 3 for an exact (or plural) title, 2 for a prefix, 1 for any other hit,
/// 0 when the keyword does not occur.
pub fn keyword_score(title: &str, keyword: &str) -> u8 {
    let title = title.trim().to_lowercase();
    let keyword = keyword.trim().to_lowercase();
    if title == keyword || title == format!("{}s", keyword) {
        3
    } else if title.starts_with(&keyword) {
        2
    } else if title.contains(&keyword) {
        1
    } else {
        0
    }
}

/// Targets whose title contains `keyword`, best score first, ties by title.
pub fn rank_by_keyword(targets: &[NavigationTarget], keyword: &str) -> Vec<NavigationTarget> {
    let mut scored: Vec<(u8, &NavigationTarget)> = targets
        .iter()
        .map(|t| (keyword_score(&t.title, keyword), t))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| match sb.cmp(sa) {
        Ordering::Equal => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        other => other,
    });
    scored.into_iter().map(|(_, t)| t.clone()).collect()
}
