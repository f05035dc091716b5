use std::time::Instant;

use dnsstub_proto::message::RecordType;
use moka::future::Cache;

use crate::result::{AddressResult, ServiceResult, TxtResult};

/// The payload shapes the positive cache can hold, keyed alongside
/// `(name, RecordType)` (spec section 3/4.6).
#[derive(Clone)]
enum Payload {
    Addresses(Vec<AddressResult>),
    Services(Vec<ServiceResult>),
    Texts(Vec<TxtResult>),
}

#[derive(Clone)]
struct PositiveEntry {
    expires_at: Instant,
    payload: Payload,
}

/// Positive and negative result cache (C6, spec section 4.6). Positive
/// entries key on `(name, type)`; the negative cache keys on *name only* —
/// an NXDOMAIN refutes every type. Expiry is checked lazily on read;
/// expired entries are invalidated on the read that finds them, and
/// unconditionally overwritten by the next `put`, exactly as
/// `MemoryCacheService` does it.
pub struct ResultCache {
    positive: Cache<(String, RecordType), PositiveEntry>,
    negative: Cache<String, Instant>,
}

impl ResultCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            positive: Cache::new(capacity),
            negative: Cache::new(capacity),
        }
    }

    /// `true` if `name` is currently covered by an unexpired negative entry.
    /// Per spec section 4.6, a caller finding this true should treat the
    /// name as definitively non-existent regardless of queried type.
    #[tracing::instrument(skip(self))]
    pub async fn is_negatively_cached(&self, name: &str) -> bool {
        match self.negative.get(&name.to_string()) {
            Some(expires_at) if expires_at > Instant::now() => true,
            Some(_) => {
                self.negative.invalidate(name).await;
                false
            }
            None => false,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn put_negative(&self, name: &str, expires_at: Instant) {
        self.negative.insert(name.to_string(), expires_at).await;
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_addresses(&self, name: &str, rtype: RecordType) -> Option<Vec<AddressResult>> {
        if self.is_negatively_cached(name).await {
            return Some(Vec::new());
        }
        match self.get_payload(name, rtype).await? {
            Payload::Addresses(v) => Some(v),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self, values))]
    pub async fn put_addresses(
        &self,
        name: &str,
        rtype: RecordType,
        expires_at: Instant,
        values: Vec<AddressResult>,
    ) {
        self.put_payload(name, rtype, expires_at, Payload::Addresses(values))
            .await;
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_services(&self, name: &str) -> Option<Vec<ServiceResult>> {
        if self.is_negatively_cached(name).await {
            return Some(Vec::new());
        }
        match self.get_payload(name, RecordType::Srv).await? {
            Payload::Services(v) => Some(v),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self, values))]
    pub async fn put_services(&self, name: &str, expires_at: Instant, values: Vec<ServiceResult>) {
        self.put_payload(name, RecordType::Srv, expires_at, Payload::Services(values))
            .await;
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_texts(&self, name: &str) -> Option<Vec<TxtResult>> {
        if self.is_negatively_cached(name).await {
            return Some(Vec::new());
        }
        match self.get_payload(name, RecordType::Txt).await? {
            Payload::Texts(v) => Some(v),
            _ => None,
        }
    }

    #[tracing::instrument(skip(self, values))]
    pub async fn put_texts(&self, name: &str, expires_at: Instant, values: Vec<TxtResult>) {
        self.put_payload(name, RecordType::Txt, expires_at, Payload::Texts(values))
            .await;
    }

    async fn get_payload(&self, name: &str, rtype: RecordType) -> Option<Payload> {
        let key = (name.to_string(), rtype);
        match self.positive.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                tracing::debug!("cache hit for {name} {rtype}");
                Some(entry.payload)
            }
            Some(_) => {
                tracing::debug!("cache entry for {name} {rtype} expired");
                self.positive.invalidate(&key).await;
                None
            }
            None => None,
        }
    }

    async fn put_payload(&self, name: &str, rtype: RecordType, expires_at: Instant, payload: Payload) {
        self.positive
            .insert((name.to_string(), rtype), PositiveEntry { expires_at, payload })
            .await;
    }
}
