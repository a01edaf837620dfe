//! Offline providers for the `render` command

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use sitegen_asset::ImageDirective;
use sitegen_core::{ByteStream, GenerationRequest, ImageProvider, LlmProvider, ProviderError, TextStream};

/// 1x1 transparent GIF
const PLACEHOLDER_IMAGE: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff,
    0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00,
    0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

/// Split `text` into pieces of at most `size` bytes on char boundaries
pub(crate) fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }
        out.push(text[start..end].to_string());
        start = end;
    }
    out
}

/// Text provider that replays a recorded model response
#[derive(Debug, Clone)]
pub(crate) struct FileReplayProvider {
    response: String,
    chunk_size: usize,
}

impl FileReplayProvider {
    pub(crate) fn new(response: String, chunk_size: usize) -> Self {
        Self { response, chunk_size }
    }
}

#[async_trait]
impl LlmProvider for FileReplayProvider {
    fn name(&self) -> &str {
        "file-replay"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<TextStream, ProviderError> {
        tracing::debug!(
            "replaying {} bytes for a {} request ({} prior assets)",
            self.response.len(),
            request.content_type,
            request.prior_assets.len()
        );
        let chunks: Vec<Result<String, ProviderError>> =
            split_chunks(&self.response, self.chunk_size).into_iter().map(Ok).collect();
        Ok(stream::iter(chunks).boxed())
    }
}

/// Image provider answering every directive with a placeholder
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlaceholderImageProvider;

#[async_trait]
impl ImageProvider for PlaceholderImageProvider {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn generate_image(&self, directive: &ImageDirective, size: (u32, u32)) -> Result<ByteStream, ProviderError> {
        tracing::info!("placeholder for {} ({}x{}): {}", directive.path, size.0, size.1, directive.full_prompt());
        Ok(stream::iter(vec![Ok(Bytes::from_static(PLACEHOLDER_IMAGE))]).boxed())
    }
}
