//! Process-lifetime app info.

use std::sync::OnceLock;

/// Application version and platform, gathered once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub version: &'static str,
    pub platform: &'static str,
    pub arch: &'static str,
}

static APP_INFO: OnceLock<AppInfo> = OnceLock::new();

impl AppInfo {
    pub fn get() -> &'static AppInfo {
        APP_INFO.get_or_init(|| AppInfo {
            version: env!("CARGO_PKG_VERSION"),
            platform: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        })
    }
}
