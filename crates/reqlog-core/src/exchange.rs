use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU16, Ordering};

/// Pipeline metadata carried alongside an exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Env {
    /// Routing depth of the handler that served the exchange
    pub depth: u32,
}

impl Env {
    pub fn with_depth(depth: u32) -> Self {
        Self { depth }
    }
}

/// Snapshot of one request/response exchange.
///
/// Request fields are captured when the exchange is armed. The response status is
/// filled in later by the host integration once response headers exist; `0` means
/// no status was produced.
#[derive(Debug, Default)]
pub struct Exchange {
    pub method: String,
    pub path: String,
    pub host: String,
    /// Raw request target (path and query)
    pub url: String,
    pub remote_addr: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub start: DateTime<Utc>,
    status: AtomicU16,
}

impl Exchange {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let path = url.split('?').next().unwrap_or_default().to_string();
        Self {
            method: method.into(),
            path,
            url,
            start: Utc::now(),
            ..Default::default()
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn with_status(self, status: u16) -> Self {
        self.set_status(status);
        self
    }

    pub fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::Release);
    }

    /// Response status, `None` if absent or zero.
    pub fn status(&self) -> Option<u16> {
        match self.status.load(Ordering::Acquire) {
            0 => None,
            code => Some(code),
        }
    }
}
