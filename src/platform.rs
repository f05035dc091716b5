//! Platform options-discovery collaborator (spec section 6). The core never
//! calls into this module itself — callers who want the default behavior of
//! the operating system's own stub resolver opt in via
//! [`crate::Resolver::from_platform`].

use std::fs;
use std::net::{IpAddr, SocketAddr};

use crate::error::PlatformError;
use crate::options::ResolverOptions;

const DEFAULT_PORT: u16 = 53;

/// Parses `/etc/resolv.conf`, consuming `nameserver`, `search`, and `domain`
/// lines. Returns [`PlatformError::NoServersConfigured`] if no `nameserver`
/// line yields a parseable address.
#[cfg(unix)]
pub fn discover_options() -> Result<ResolverOptions, PlatformError> {
    parse_resolv_conf(&fs::read_to_string("/etc/resolv.conf")?)
}

#[cfg(not(unix))]
pub fn discover_options() -> Result<ResolverOptions, PlatformError> {
    Err(PlatformError::Unsupported)
}

fn parse_resolv_conf(contents: &str) -> Result<ResolverOptions, PlatformError> {
    let mut servers = Vec::new();
    let mut search_domains = Vec::new();
    let mut default_domain = None;

    for line in contents.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("nameserver") => {
                if let Some(addr) = fields.next().and_then(|s| s.parse::<IpAddr>().ok()) {
                    servers.push(SocketAddr::new(addr, DEFAULT_PORT));
                }
            }
            Some("search") => {
                search_domains.extend(fields.map(str::to_string));
            }
            Some("domain") => {
                default_domain = fields.next().map(str::to_string);
            }
            _ => {}
        }
    }

    if servers.is_empty() {
        return Err(PlatformError::NoServersConfigured);
    }

    Ok(ResolverOptions {
        servers,
        default_domain,
        search_domains: if search_domains.is_empty() {
            None
        } else {
            Some(search_domains)
        },
        use_hosts_file: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nameservers_search_and_domain() {
        let conf = "domain example.com\nsearch example.com corp.example.com\nnameserver 1.1.1.1\nnameserver 1.0.0.1\n";
        let options = parse_resolv_conf(conf).unwrap();
        assert_eq!(options.servers.len(), 2);
        assert_eq!(options.servers[0], "1.1.1.1:53".parse().unwrap());
        assert_eq!(options.default_domain.as_deref(), Some("example.com"));
        assert_eq!(
            options.search_domains,
            Some(vec!["example.com".to_string(), "corp.example.com".to_string()])
        );
    }

    #[test]
    fn ignores_comments_and_blank_lines() {
        let conf = "# a comment\n\nnameserver 1.1.1.1 # trailing comment\n";
        let options = parse_resolv_conf(conf).unwrap();
        assert_eq!(options.servers, vec!["1.1.1.1:53".parse().unwrap()]);
    }

    #[test]
    fn errors_when_no_nameserver_present() {
        let err = parse_resolv_conf("search example.com\n").unwrap_err();
        assert!(matches!(err, PlatformError::NoServersConfigured));
    }
}
