#![allow(dead_code)]

pub mod fake_app;
pub mod static_page;

use page_sweep::orchestrator::sweep_config::{SweepConfig, Waits};

/// Config pointing at the fake application, with every wait zeroed and
/// output under a per-test temp directory.
pub fn test_config(label: &str) -> SweepConfig {
    let dir = std::env::temp_dir().join(format!("page-sweep-{}-{}", label, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    SweepConfig {
        base_url: fake_app::BASE_URL.to_string(),
        navigation_route: fake_app::NAV_ROUTE.to_string(),
        screenshot_dir: dir.join("shots").display().to_string(),
        trace_path: dir.join("trace.jsonl").display().to_string(),
        waits: no_waits(),
        ..SweepConfig::default()
    }
}

pub fn no_waits() -> Waits {
    Waits {
        action_ms: 0,
        save_ms: 0,
        navigation_ms: 0,
        selector_timeout_ms: 0,
    }
}
