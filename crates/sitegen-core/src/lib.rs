//! sitegen core
//!
//! Turns `(host, path)` requests into generated site assets: resolves the
//! tenant, serves the cached asset for its current version or generates it
//! through the injected providers.
//!
//! # Architecture
//!
//! ```text
//! AssetService ──stages──▶ HostResolver ─▶ TenantStore
//!      │                   VersionedAssetCache (lookup / store)
//!      ▼
//! GenerationOrchestrator ──▶ ConsistencyContextAssembler
//!      │                    PromptBuilder ─▶ LlmProvider ─▶ ResponseFilter
//!      └──────────────────▶ ImageProvider (recorded directives)
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod types;

pub use context::{ConsistencyContext, ConsistencyContextAssembler, SiblingAsset};
pub use error::GenerationError;
pub use orchestrator::{Generated, GenerationOrchestrator};
pub use phase::{allowed_transitions, validate_transition, GenerationPhase, PhaseTracker};
pub use pipeline::{AssetService, RequestContext, StageFlow, StageFn, STAGES};
pub use prompt::PromptBuilder;
pub use provider::{
    ByteStream, GenerationRequest, ImageProvider, LlmProvider, PromptImage, ProviderError, TextStream,
};
pub use types::{GeneratorConfig, ResolvedAsset};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
