//! Login redirection
//!
//! The terminal client cannot navigate a browser, so the redirect is
//! recorded and logged; the presentation layer reads it back and shows the
//! login URL.

use std::sync::{Mutex, PoisonError};

use url::Url;

use shared::{component_warn, ComponentId};
use crate::traits::Navigator;
use crate::types::LoginReason;

pub struct LoginRedirector {
    login_url: Url,
    last_redirect: Mutex<Option<Url>>,
}

impl LoginRedirector {
    pub fn new(login_url: Url) -> Self {
        Self {
            login_url,
            last_redirect: Mutex::new(None),
        }
    }

    /// `<login_url>?reason=<reason>`
    pub fn redirect_url(&self, reason: LoginReason) -> Url {
        let mut url = self.login_url.clone();
        url.query_pairs_mut().clear().append_pair("reason", reason.as_str());
        url
    }

    pub fn last_redirect(&self) -> Option<Url> {
        self.last_redirect
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for LoginRedirector {
    fn redirect_to_login(&self, reason: LoginReason) {
        let url = self.redirect_url(reason);
        component_warn!(ComponentId::Auth, "🔒 Sign-in required ({}): {}", reason, url);
        *self.last_redirect.lock().unwrap_or_else(PoisonError::into_inner) = Some(url);
    }
}
