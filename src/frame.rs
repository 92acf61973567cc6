use serde::Serialize;

use crate::config::Settings;
use crate::error::BlinkError;
use crate::link::{GeneratedLink, LinkBuilder, LinkRequest};
use crate::platform::{self, PlatformEntry, FRAME_INPUT_CURRENCY};
use crate::redirect::REDIRECT_ROUTE;
use crate::token::RedirectToken;

/// Creator frame for one platform: the relay link plus a time-limited redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameLink {
    pub platform: &'static str,
    pub title: &'static str,
    #[serde(flatten)]
    pub link: GeneratedLink,
    pub redirect: String,
}

impl FrameLink {
    pub fn generate(
        settings: &Settings,
        platform_id: &str,
        creator: &str,
        now_millis: u64,
    ) -> Result<Self, BlinkError> {
        if creator.is_empty() {
            return Err(BlinkError::missing("creator"));
        }
        let entry: &PlatformEntry = platform::resolve(platform_id);

        let req = LinkRequest::new(
            entry.destination_base_url,
            [("inputCurrency", FRAME_INPUT_CURRENCY), ("creator", creator)],
            now_millis,
        )?;
        let link = LinkBuilder::new(settings.relay_base.clone()).build(&req);

        let token = RedirectToken::issue(now_millis, entry.id);
        let redirect = format!(
            "{}{}?t={}&p={}&c={}",
            settings.public_base,
            REDIRECT_ROUTE,
            urlencoding::encode(token.as_str()),
            urlencoding::encode(entry.id),
            urlencoding::encode(creator)
        );

        Ok(Self {
            platform: entry.id,
            title: entry.title,
            link,
            redirect,
        })
    }
}
