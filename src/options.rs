use std::net::SocketAddr;

/// Fully-populated resolver configuration (spec section 6). The core never
/// constructs one of these itself outside of the `from_servers`/`from_server`
/// convenience constructors; it is otherwise the external collaborator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    pub servers: Vec<SocketAddr>,
    pub default_domain: Option<String>,
    pub search_domains: Option<Vec<String>>,
    /// Accepted, not implemented (spec section 9).
    pub use_hosts_file: bool,
}

impl ResolverOptions {
    pub fn from_servers(servers: Vec<SocketAddr>) -> Self {
        Self {
            servers,
            default_domain: None,
            search_domains: None,
            use_hosts_file: false,
        }
    }

    pub fn from_server(server: SocketAddr) -> Self {
        Self::from_servers(vec![server])
    }
}
