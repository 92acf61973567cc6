/// Token every frame destination is opened with as its input currency.
pub const FRAME_INPUT_CURRENCY: &str = "ZEUS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformEntry {
    pub id: &'static str,
    pub title: &'static str,
    pub destination_base_url: &'static str,
}

const MUSES: PlatformEntry = PlatformEntry {
    id: "muses",
    title: "Zeus Muses",
    destination_base_url: "https://muses.apollobyzeus.app",
};

const GUARDIAN: PlatformEntry = PlatformEntry {
    id: "guardian",
    title: "Zeus Guardian",
    destination_base_url: "https://app.zeusguardian.io",
};

pub const PLATFORMS: &[PlatformEntry] = &[MUSES, GUARDIAN];

/// Entry used for any id not in [`PLATFORMS`].
pub const DEFAULT_PLATFORM: &PlatformEntry = &GUARDIAN;

pub fn lookup(id: &str) -> Option<&'static PlatformEntry> {
    PLATFORMS.iter().find(|p| p.id == id)
}

/// Unknown ids resolve to [`DEFAULT_PLATFORM`] instead of failing.
pub fn resolve(id: &str) -> &'static PlatformEntry {
    match lookup(id) {
        Some(p) => p,
        None => {
            tracing::warn!(platform = id, fallback = DEFAULT_PLATFORM.id, "unrecognized platform");
            DEFAULT_PLATFORM
        }
    }
}

impl PlatformEntry {
    /// `<base>?inputCurrency=ZEUS&creator=<creator>`, creator inserted as given.
    pub fn creator_url(&self, creator: &str) -> String {
        format!(
            "{}?inputCurrency={}&creator={}",
            self.destination_base_url, FRAME_INPUT_CURRENCY, creator
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_platforms_resolve() {
        assert_eq!(resolve("muses").destination_base_url, "https://muses.apollobyzeus.app");
        assert_eq!(resolve("guardian").destination_base_url, "https://app.zeusguardian.io");
    }

    #[test]
    fn unknown_platform_falls_back_to_default() {
        assert!(lookup("foo").is_none());
        assert_eq!(resolve("foo"), DEFAULT_PLATFORM);
        assert_eq!(resolve("MUSES").id, "guardian");
    }

    #[test]
    fn creator_url_shape() {
        assert_eq!(
            resolve("muses").creator_url("abc"),
            "https://muses.apollobyzeus.app?inputCurrency=ZEUS&creator=abc"
        );
    }
}
