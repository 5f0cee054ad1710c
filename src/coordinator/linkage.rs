//! Token/User Linkage: attach the held device token to a user record.

use tracing::{error, info};

use super::registration::PushToken;
use crate::error::{PushError, PushResult};
use crate::platform::Platform;

/// A user record able to store push tokens
pub trait UserRecord {
    /// Store `token` under `platform_tag` (`"android"` or `"ios"`)
    fn add_push_token(&mut self, token: &str, platform_tag: &str);
}

/// Associate `token` with `user`, keyed by the platform tag
///
/// Without a token nothing is associated.
pub fn add_token_to_user(
    token: Option<&PushToken>,
    platform: Platform,
    user: &mut dyn UserRecord,
) -> PushResult<()> {
    let Some(token) = token else {
        info!("No push token held yet; register before adding it to a user");
        return Err(PushError::NoToken);
    };

    let Some(tag) = platform.tag() else {
        let err = PushError::UnsupportedPlatform {
            operation: "add_token_to_user",
            platform: platform.to_string(),
        };
        error!(error = %err, "Token not associated with user");
        return Err(err);
    };

    user.add_push_token(token.id(), tag);
    info!(platform = tag, "Push token added to user");
    Ok(())
}
