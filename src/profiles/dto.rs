use serde::Deserialize;

use super::repo_types::ProfileFields;
use crate::error::AppError;

pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_BIO_LEN: usize = 500;

/// Settings page payload. Omitted fields are cleared.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl TryFrom<UpdateProfileRequest> for ProfileFields {
    type Error = AppError;

    fn try_from(req: UpdateProfileRequest) -> Result<Self, Self::Error> {
        let username = non_empty(req.username);
        let bio = non_empty(req.bio);
        let avatar_url = non_empty(req.avatar_url);

        if username
            .as_deref()
            .is_some_and(|u| u.chars().count() > MAX_USERNAME_LEN)
        {
            return Err(AppError::Validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if bio.as_deref().is_some_and(|b| b.chars().count() > MAX_BIO_LEN) {
            return Err(AppError::Validation(format!(
                "Bio must be at most {MAX_BIO_LEN} characters"
            )));
        }
        if let Some(raw) = avatar_url.as_deref() {
            let ok = url::Url::parse(raw)
                .map(|u| matches!(u.scheme(), "http" | "https"))
                .unwrap_or(false);
            if !ok {
                return Err(AppError::Validation("Avatar URL must be an http(s) URL".into()));
            }
        }

        Ok(ProfileFields {
            username,
            bio,
            avatar_url,
        })
    }
}
