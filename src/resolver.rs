use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use dnsstub_proto::buffer::MAX_NAME_LEN;
use dnsstub_proto::message::{Question, RecordType};
use tokio_util::sync::CancellationToken;

use crate::answer::{self, NegativeOutcome};
use crate::cache::ResultCache;
use crate::cancel::Cancellation;
use crate::error::ResolveError;
use crate::options::ResolverOptions;
use crate::query;
use crate::result::{AddressResult, ServiceResult, TxtResult};
use crate::transport::BufferPool;
use crate::Family;

const CACHE_CAPACITY: u64 = 10_000;

/// The public resolver (spec section 6). Owns immutable options, the
/// result cache, a buffer pool, and the cancellation gate that
/// `cancel_all_pending`/`dispose` act on.
pub struct Resolver {
    options: ResolverOptions,
    cache: ResultCache,
    pool: BufferPool,
    gate: Mutex<CancellationToken>,
    timeout: Mutex<Option<Duration>>,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        Self {
            options,
            cache: ResultCache::new(CACHE_CAPACITY),
            pool: BufferPool::new(),
            gate: Mutex::new(CancellationToken::new()),
            timeout: Mutex::new(None),
        }
    }

    pub fn from_servers(servers: Vec<SocketAddr>) -> Self {
        Self::new(ResolverOptions::from_servers(servers))
    }

    pub fn from_server(server: SocketAddr) -> Self {
        Self::new(ResolverOptions::from_server(server))
    }

    /// Builds a resolver from the platform options-discovery collaborator
    /// (spec section 6's `Resolver::default()`). Named explicitly rather
    /// than implementing `std::default::Default`, since discovery can fail
    /// — recorded as an Open Question decision.
    pub fn from_platform() -> Result<Self, crate::error::PlatformError> {
        crate::platform::discover_options().map(Self::new)
    }

    /// `None` means infinite (spec section 6: "duration must be positive
    /// and finite, or a sentinel infinite value"). A zero or otherwise
    /// non-positive duration is rejected rather than silently accepted,
    /// since it would make every subsequent query time out immediately.
    pub fn set_timeout(&self, timeout: Option<Duration>) -> Result<(), ResolveError> {
        if let Some(duration) = timeout {
            if duration.is_zero() {
                return Err(ResolveError::Argument("timeout must be a positive duration".into()));
            }
        }
        *self.timeout.lock().expect("timeout mutex poisoned") = timeout;
        Ok(())
    }

    /// Fires the current gate and installs a fresh one, via an atomic swap
    /// rather than read-then-write, so a cancellation racing a second call
    /// to this method is never lost (spec section 9).
    pub fn cancel_all_pending(&self) {
        let mut guard = self.gate.lock().expect("gate mutex poisoned");
        let stale = std::mem::replace(&mut *guard, CancellationToken::new());
        drop(guard);
        stale.cancel();
    }

    /// Idempotent: fires the gate once and does not replace it, so no
    /// further calls on this resolver can ever proceed (spec section 5).
    pub fn dispose(&self) {
        self.gate.lock().expect("gate mutex poisoned").cancel();
    }

    pub async fn resolve_addresses(
        &self,
        name: &str,
        family: Family,
        cancel: CancellationToken,
    ) -> Result<Vec<AddressResult>, ResolveError> {
        self.validate_name(name)?;
        let cancellation = self.link(cancel);
        if cancellation.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let mut results = Vec::new();
        for rtype in family.query_types() {
            results.extend(self.resolve_addresses_of_type(name, rtype, &cancellation).await?);
        }
        Ok(results)
    }

    pub async fn resolve_service(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<ServiceResult>, ResolveError> {
        self.validate_name(name)?;
        let cancellation = self.link(cancel);
        if cancellation.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        if let Some(cached) = self.cache.get_services(name).await {
            return Ok(cached);
        }

        let question = Question::new(name, RecordType::Srv);
        let response = query::execute(&self.pool, &self.options.servers, &question, &cancellation).await?;

        if let Some(outcome) = answer::interpret_response_code(name, RecordType::Srv, &response) {
            self.apply_negative_outcome(outcome).await;
            return Ok(Vec::new());
        }

        let services = answer::build_services(&response);
        if let Some(expires_at) = response.message_wide_expiry() {
            self.cache.put_services(name, expires_at, services.clone()).await;
        }
        Ok(services)
    }

    pub async fn resolve_text(
        &self,
        name: &str,
        cancel: CancellationToken,
    ) -> Result<Vec<TxtResult>, ResolveError> {
        self.validate_name(name)?;
        let cancellation = self.link(cancel);
        if cancellation.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        if let Some(cached) = self.cache.get_texts(name).await {
            return Ok(cached);
        }

        let question = Question::new(name, RecordType::Txt);
        let response = query::execute(&self.pool, &self.options.servers, &question, &cancellation).await?;

        if let Some(outcome) = answer::interpret_response_code(name, RecordType::Txt, &response) {
            self.apply_negative_outcome(outcome).await;
            return Ok(Vec::new());
        }

        let texts = answer::build_texts(&response);
        if let Some(expires_at) = response.message_wide_expiry() {
            self.cache.put_texts(name, expires_at, texts.clone()).await;
        }
        Ok(texts)
    }

    async fn resolve_addresses_of_type(
        &self,
        name: &str,
        rtype: RecordType,
        cancellation: &Cancellation,
    ) -> Result<Vec<AddressResult>, ResolveError> {
        if let Some(cached) = self.cache.get_addresses(name, rtype).await {
            return Ok(cached);
        }

        let question = Question::new(name, rtype);
        let response = query::execute(&self.pool, &self.options.servers, &question, cancellation).await?;

        if let Some(outcome) = answer::interpret_response_code(name, rtype, &response) {
            self.apply_negative_outcome(outcome).await;
            return Ok(Vec::new());
        }

        let addresses = answer::walk_address_chain(name, rtype, &response);
        if let Some(expires_at) = response.message_wide_expiry() {
            self.cache.put_addresses(name, rtype, expires_at, addresses.clone()).await;
        }
        Ok(addresses)
    }

    async fn apply_negative_outcome(&self, outcome: NegativeOutcome) {
        match outcome {
            NegativeOutcome::Nodata { name, rtype, expires_at } => match rtype {
                RecordType::A | RecordType::Aaaa => {
                    self.cache.put_addresses(&name, rtype, expires_at, Vec::new()).await
                }
                RecordType::Srv => self.cache.put_services(&name, expires_at, Vec::new()).await,
                RecordType::Txt => self.cache.put_texts(&name, expires_at, Vec::new()).await,
                _ => {}
            },
            NegativeOutcome::Nxdomain { name, expires_at } => {
                self.cache.put_negative(&name, expires_at).await;
            }
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), ResolveError> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(ResolveError::Argument(format!(
                "name length {} exceeds {MAX_NAME_LEN}",
                name.len()
            )));
        }
        Ok(())
    }

    /// Links the caller's handle, the resolver's gate, and the configured
    /// timeout into one source (spec section 4.4/5).
    fn link(&self, caller: CancellationToken) -> Cancellation {
        let gate = self.gate.lock().expect("gate mutex poisoned").clone();
        let timeout = *self.timeout.lock().expect("timeout mutex poisoned");
        Cancellation::new(caller, gate, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> Resolver {
        Resolver::from_server("127.0.0.1:53".parse().unwrap())
    }

    #[tokio::test]
    async fn pre_cancelled_token_fails_before_any_network_activity() {
        let resolver = resolver();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = resolver
            .resolve_addresses("example.com", Family::V4, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled));
    }

    #[tokio::test]
    async fn over_length_name_is_rejected_synchronously() {
        let resolver = resolver();
        let name = "a".repeat(300);
        let err = resolver
            .resolve_addresses(&name, Family::V4, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Argument(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let resolver = resolver();
        let err = resolver.set_timeout(Some(Duration::ZERO)).unwrap_err();
        assert!(matches!(err, ResolveError::Argument(_)));
        assert!(resolver.timeout.lock().unwrap().is_none());
    }

    #[test]
    fn cancel_all_pending_does_not_affect_later_calls() {
        let resolver = resolver();
        resolver.cancel_all_pending();
        let fresh_gate = resolver.gate.lock().unwrap().clone();
        assert!(!fresh_gate.is_cancelled());
    }

    #[test]
    fn dispose_cancels_the_gate_in_place() {
        let resolver = resolver();
        resolver.dispose();
        assert!(resolver.gate.lock().unwrap().is_cancelled());
    }
}
