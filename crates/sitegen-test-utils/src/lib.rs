//! Testing utilities for the sitegen workspace
//!
//! Scripted providers, failing backends and tenant fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use sitegen_asset::{GeneratedAsset, ImageDirective, TenantId, VersionToken};
use sitegen_cache::{AssetStore, CacheError, CacheKey, VersionedAssetCache};
use sitegen_core::{
    AssetService, ByteStream, GenerationRequest, GeneratorConfig, ImageProvider, LlmProvider, ProviderError,
    TextStream,
};
use sitegen_tenant::{InMemoryTenantStore, Tenant, TenantStore, UserId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Split `text` into chunks of at most `size` bytes on char boundaries
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.len() + c.len_utf8() > size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// One scripted provider reply
#[derive(Debug, Clone)]
pub enum Script {
    /// Stream `text` in chunks of `chunk_size` bytes
    Reply { text: String, chunk_size: usize },
    /// Fail the call before any stream is returned
    Fail(ProviderError),
    /// Stream `text`, then fail mid-stream
    BreakAfter { text: String, error: ProviderError },
}

/// Text provider replaying queued replies
///
/// When the queue is empty the last reply is repeated.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Script>>,
    last: Mutex<Option<Script>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that always answers `text` in `chunk_size` pieces
    pub fn replying(text: impl Into<String>, chunk_size: usize) -> Arc<Self> {
        let provider = Self::new();
        provider.push_reply(text, chunk_size);
        Arc::new(provider)
    }

    /// Provider that always fails with `error`
    pub fn failing(error: ProviderError) -> Arc<Self> {
        let provider = Self::new();
        provider.push(Script::Fail(error));
        Arc::new(provider)
    }

    pub fn push(&self, script: Script) {
        self.scripts.lock().push_back(script);
    }

    pub fn push_reply(&self, text: impl Into<String>, chunk_size: usize) {
        self.push(Script::Reply {
            text: text.into(),
            chunk_size,
        });
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().last().cloned()
    }

    fn next_script(&self) -> Option<Script> {
        let next = self.scripts.lock().pop_front();
        match next {
            Some(script) => {
                *self.last.lock() = Some(script.clone());
                Some(script)
            }
            None => self.last.lock().clone(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);

        let chunks: Vec<Result<String, ProviderError>> = match self.next_script() {
            None => return Err(ProviderError::Unavailable("no scripted reply".into())),
            Some(Script::Fail(error)) => return Err(error),
            Some(Script::Reply { text, chunk_size }) => chunk_text(&text, chunk_size).into_iter().map(Ok).collect(),
            Some(Script::BreakAfter { text, error }) => chunk_text(&text, 8)
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(error)))
                .collect(),
        };
        Ok(stream::iter(chunks).boxed())
    }
}

/// Image provider returning fixed bytes and recording what it was asked for
#[derive(Debug)]
pub struct ScriptedImageProvider {
    body: Bytes,
    calls: Mutex<Vec<(ImageDirective, (u32, u32))>>,
}

impl ScriptedImageProvider {
    pub fn new(body: impl Into<Bytes>) -> Arc<Self> {
        Arc::new(Self {
            body: body.into(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(ImageDirective, (u32, u32))> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageProvider for ScriptedImageProvider {
    fn name(&self) -> &str {
        "scripted-image"
    }

    async fn generate_image(&self, directive: &ImageDirective, size: (u32, u32)) -> Result<ByteStream, ProviderError> {
        self.calls.lock().push((directive.clone(), size));
        let half = self.body.len() / 2;
        let parts = vec![Ok(self.body.slice(..half)), Ok(self.body.slice(half..))];
        Ok(stream::iter(parts).boxed())
    }
}

/// Asset store whose every call fails
#[derive(Debug, Default)]
pub struct UnavailableAssetStore;

#[async_trait]
impl AssetStore for UnavailableAssetStore {
    async fn get(&self, _key: &CacheKey) -> Result<Option<GeneratedAsset>, CacheError> {
        Err(CacheError::unavailable("store offline"))
    }

    async fn put(&self, _key: CacheKey, _asset: GeneratedAsset) -> Result<(), CacheError> {
        Err(CacheError::unavailable("store offline"))
    }

    async fn remove_versions(&self, _tenant: &TenantId, _versions: &[VersionToken]) -> Result<(), CacheError> {
        Err(CacheError::unavailable("store offline"))
    }

    fn entry_count(&self) -> u64 {
        0
    }
}

pub fn tenant_id(handle: &str) -> TenantId {
    TenantId::parse(handle).unwrap()
}

/// Tenant owned by `owner-1`
pub fn tenant(handle: &str, prompt: &str) -> Tenant {
    Tenant::new(tenant_id(handle), UserId::new("owner-1"), prompt)
}

/// In-memory store holding one tenant
pub async fn store_with_tenant(handle: &str, prompt: &str) -> (Arc<InMemoryTenantStore>, Tenant) {
    let store = Arc::new(InMemoryTenantStore::new());
    let created = store.create_tenant(tenant(handle, prompt)).await.unwrap();
    (store, created)
}

/// Everything an end-to-end test needs
pub struct Harness {
    pub service: AssetService,
    pub tenants: Arc<InMemoryTenantStore>,
    pub cache: VersionedAssetCache,
    pub llm: Arc<ScriptedProvider>,
    pub images: Arc<ScriptedImageProvider>,
    pub tenant: Tenant,
}

/// Service with one tenant reachable at `{handle}.localhost`
pub async fn harness(handle: &str, prompt: &str, llm: Arc<ScriptedProvider>) -> Harness {
    harness_with(GeneratorConfig::default(), handle, prompt, llm, VersionedAssetCache::in_memory(1_000)).await
}

pub async fn harness_with(
    config: GeneratorConfig,
    handle: &str,
    prompt: &str,
    llm: Arc<ScriptedProvider>,
    cache: VersionedAssetCache,
) -> Harness {
    let (tenants, tenant) = store_with_tenant(handle, prompt).await;
    let images = ScriptedImageProvider::new(&b"\xFF\xD8\xFFfake-jpeg"[..]);
    let service = AssetService::new(
        config.with_apex_domain("localhost"),
        tenants.clone(),
        cache.clone(),
        llm.clone(),
        images.clone(),
    );
    Harness {
        service,
        tenants,
        cache,
        llm,
        images,
        tenant,
    }
}

impl Harness {
    pub fn host(&self) -> String {
        format!("{}.localhost", self.tenant.id)
    }

    /// Reload the tenant record from the store
    pub async fn refresh(&mut self) {
        self.tenant = self.tenants.get_tenant(&self.tenant.id).await.unwrap().unwrap();
    }
}
