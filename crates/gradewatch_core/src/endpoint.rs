use std::fmt;

use url::Url;

/// Validated login URL of the portal.
///
/// The portal is fixed and site-specific; the only rules enforced here are
/// that the value parses, uses https and names a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginUrl(Url);

#[derive(Debug, PartialEq, Eq)]
pub enum LoginUrlError {
    Parse(url::ParseError),
    NotHttps,
    MissingHost,
}

impl fmt::Display for LoginUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginUrlError::Parse(err) => write!(f, "invalid url: {err}"),
            LoginUrlError::NotHttps => write!(f, "login url must use https"),
            LoginUrlError::MissingHost => write!(f, "login url has no host"),
        }
    }
}

impl std::error::Error for LoginUrlError {}

impl LoginUrl {
    pub fn parse(raw: &str) -> Result<Self, LoginUrlError> {
        let url = Url::parse(raw).map_err(LoginUrlError::Parse)?;
        if url.scheme() != "https" {
            return Err(LoginUrlError::NotHttps);
        }
        if url.host_str().is_none() {
            return Err(LoginUrlError::MissingHost);
        }
        Ok(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for LoginUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
