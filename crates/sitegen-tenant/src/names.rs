//! Random site handle generation

use crate::error::TenantError;
use crate::store::TenantStore;
use rand::Rng;
use sitegen_asset::TenantId;

const ADJECTIVES: &[&str] = &[
    "amber", "bold", "brave", "bright", "calm", "clever", "cosmic", "crisp", "daring", "eager", "fancy", "gentle",
    "golden", "happy", "jolly", "lively", "lucky", "mellow", "misty", "nimble", "proud", "quiet", "rapid", "rustic",
    "silent", "silver", "sunny", "swift", "tidy", "vivid", "witty", "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "brook", "canyon", "cedar", "comet", "coral", "falcon", "fern", "harbor", "heron", "island",
    "lantern", "maple", "meadow", "nebula", "orchid", "otter", "panda", "pebble", "pine", "quartz", "raven", "river",
    "sparrow", "summit", "thicket", "tiger", "tulip", "valley", "willow", "zephyr",
];

/// Default number of candidates tried by [`unique_handle`]
pub const DEFAULT_HANDLE_ATTEMPTS: usize = 16;

/// Random `adjective-noun-NNNN` handle
#[must_use]
pub fn random_handle<R: Rng>(rng: &mut R) -> TenantId {
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let number: u16 = rng.random_range(0..10_000);
    // Word lists are lowercase ASCII, so the label is always valid
    TenantId::parse(&format!("{adjective}-{noun}-{number:04}"))
        .unwrap_or_else(|e| unreachable!("generated handle is a valid label: {e}"))
}

/// Random handle not yet taken in `store`
///
/// # Errors
/// Returns [`TenantError::HandlesExhausted`] if every candidate was taken,
/// or the store's error if it cannot be queried
pub async fn unique_handle(store: &dyn TenantStore, attempts: usize) -> Result<TenantId, TenantError> {
    for _ in 0..attempts {
        let candidate = random_handle(&mut rand::rng());
        if store.handle_available(&candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!("handle taken, retrying: {}", candidate);
    }
    Err(TenantError::HandlesExhausted(attempts))
}
