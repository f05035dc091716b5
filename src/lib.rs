//! Stub DNS resolver client library (spec section 1): a drop-in
//! replacement for the operating system's stub resolver. Speaks RFC
//! 1035/2782 to configured recursive servers over UDP with TCP fallback on
//! truncation, follows CNAME chains, stitches SRV additionals, and caches
//! positive and negative results per RFC 2308.
//!
//! Not recursive — every call asks a configured upstream and trusts its
//! recursion bit. Not a general DNS library — only A, AAAA, CNAME, NS, SOA,
//! SRV, and TXT are fully decoded; everything else is opaque.

mod answer;
mod cache;
mod cancel;
mod error;
mod options;
pub mod platform;
mod query;
mod resolver;
mod result;
mod transport;

use dnsstub_proto::message::RecordType;

pub use error::{PlatformError, ResolveError};
pub use options::ResolverOptions;
pub use resolver::Resolver;
pub use result::{AddressResult, ServiceResult, TxtResult};

/// Address family selector for [`Resolver::resolve_addresses`] (spec
/// section 4.4 item 1). `Unspecified` queries both A and AAAA — the
/// conventional behavior of a stub resolver's "any family" mode, not
/// specified by name in the source; recorded as an Open Question decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    V4,
    V6,
    Unspecified,
}

impl Family {
    pub(crate) fn query_types(self) -> Vec<RecordType> {
        match self {
            Self::V4 => vec![RecordType::A],
            Self::V6 => vec![RecordType::Aaaa],
            Self::Unspecified => vec![RecordType::A, RecordType::Aaaa],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_family_queries_both_record_types() {
        assert_eq!(Family::Unspecified.query_types(), vec![RecordType::A, RecordType::Aaaa]);
    }

    #[test]
    fn v4_family_queries_only_a() {
        assert_eq!(Family::V4.query_types(), vec![RecordType::A]);
    }
}
