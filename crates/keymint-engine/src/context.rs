//! Per-request metadata threaded into audit entries.

/// Client metadata accompanying a request.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Client IP address, if known.
    pub ip_address: Option<String>,
    /// Client User-Agent, if known.
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Creates request metadata from the transport layer.
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}
