//! `sitegen` command line
//!
//! Offline tools over the generation pipeline:
//!
//! - `render`: boot an in-memory site, replay a recorded model response and
//!   print (or write) the resulting assets
//! - `extract`: pull the first fenced block of a language out of a response
//! - `scan`: list the image directives embedded in a page as JSON

mod logging;
mod replay;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use replay::{split_chunks, FileReplayProvider, PlaceholderImageProvider};
use sitegen_asset::{AssetPath, ImageDirective};
use sitegen_core::{AssetService, GeneratorConfig};
use sitegen_stream::{DirectiveScanner, FenceExtractor, DEFAULT_MAX_TAG_LEN};
use sitegen_tenant::{first_label, InMemoryTenantStore, Tenant, TenantStore, UserId};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Input is fed to the stream filters in pieces of this size
const READ_CHUNK: usize = 4096;

#[derive(Debug, Parser)]
#[command(name = "sitegen", version, about = "Prompt-driven site generation tools")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SITEGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render paths for a site from a recorded model response
    Render {
        /// File holding the site prompt
        #[arg(long)]
        prompt_file: PathBuf,

        /// File holding the raw model response to replay
        #[arg(long)]
        response_file: PathBuf,

        /// Request path; repeat to render several paths in order
        #[arg(long = "path", required = true)]
        paths: Vec<String>,

        /// Request host
        #[arg(long, default_value = "localhost")]
        host: String,

        /// Replay chunk size in bytes
        #[arg(long, default_value_t = 64)]
        chunk_size: usize,

        /// Write assets under this directory instead of printing them
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Apex domain override; repeat or comma-separate
        #[arg(long = "apex-domain", env = "SITEGEN_APEX_DOMAINS", value_delimiter = ',')]
        apex_domains: Vec<String>,

        /// Cache capacity override
        #[arg(long, env = "SITEGEN_CACHE_CAPACITY")]
        cache_capacity: Option<u64>,
    },

    /// Print the first fenced block of a language from a response
    Extract {
        /// Fence language tag (html, css, js, ...)
        #[arg(long)]
        tag: String,

        /// Input file; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Print the image directives of an HTML page as JSON
    Scan {
        /// Input file; stdin when omitted
        file: Option<PathBuf>,

        /// Longest `img` tag considered
        #[arg(long, default_value_t = DEFAULT_MAX_TAG_LEN)]
        max_tag_len: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.log_json, cli.verbose)?;

    match cli.command {
        Command::Render {
            prompt_file,
            response_file,
            paths,
            host,
            chunk_size,
            out_dir,
            apex_domains,
            cache_capacity,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if !apex_domains.is_empty() {
                config.apex_domains = apex_domains;
            }
            if let Some(capacity) = cache_capacity {
                config.cache_capacity = capacity;
            }
            let prompt = read_file(&prompt_file)?;
            let response = read_file(&response_file)?;
            render(config, prompt.trim(), response, &host, &paths, chunk_size, out_dir.as_deref()).await
        }
        Command::Extract { tag, file } => {
            let input = read_input(file.as_deref())?;
            print!("{}", extract(&tag, &input)?);
            Ok(())
        }
        Command::Scan { file, max_tag_len } => {
            let input = read_input(file.as_deref())?;
            let directives = scan(&input, max_tag_len);
            println!("{}", serde_json::to_string_pretty(&directives)?);
            Ok(())
        }
    }
}

/// Configuration from `path`, or defaults
fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let raw = read_file(path)?;
    let config = toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!("loaded config from {}", path.display());
    Ok(config)
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => read_file(path),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("cannot read stdin")?;
            Ok(input)
        }
    }
}

fn extract(tag: &str, input: &str) -> Result<String> {
    let mut fence = FenceExtractor::new(tag);
    let mut out = String::new();
    for chunk in split_chunks(input, READ_CHUNK) {
        fence.push_into(&chunk, &mut out);
    }
    out.push_str(&fence.finish()?);
    Ok(out)
}

fn scan(input: &str, max_tag_len: usize) -> Vec<ImageDirective> {
    let mut scanner = DirectiveScanner::with_max_tag_len(max_tag_len);
    let mut directives = Vec::new();
    for chunk in split_chunks(input, READ_CHUNK) {
        scanner.push_into(&chunk, &mut directives);
    }
    scanner.finish();
    if scanner.skipped() > 0 {
        tracing::warn!("{} malformed directives skipped", scanner.skipped());
    }
    directives
}

async fn render(
    config: GeneratorConfig,
    prompt: &str,
    response: String,
    host: &str,
    paths: &[String],
    chunk_size: usize,
    out_dir: Option<&Path>,
) -> Result<()> {
    let handle = first_label(host).ok_or_else(|| anyhow!("host {host} has no usable first label"))?;
    let tenants = Arc::new(InMemoryTenantStore::new());
    tenants
        .create_tenant(Tenant::new(handle.clone(), UserId::new("cli"), prompt))
        .await?;
    tracing::info!("rendering {} paths for {}", paths.len(), handle);

    let service = AssetService::in_memory(
        config,
        tenants,
        Arc::new(FileReplayProvider::new(response, chunk_size)),
        Arc::new(PlaceholderImageProvider),
    );

    for raw in paths {
        let resolved = service
            .resolve_asset(host, raw)
            .await
            .map_err(|e| anyhow!("{raw}: {e} (status {})", e.status_code()))?;

        match out_dir {
            Some(dir) => {
                let path = AssetPath::parse(raw)?;
                let target = output_file(dir, &path);
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).with_context(|| format!("cannot create {}", parent.display()))?;
                }
                std::fs::write(&target, &resolved.body).with_context(|| format!("cannot write {}", target.display()))?;
                println!("{} {} {}", resolved.etag(), resolved.mime, target.display());
            }
            None => match resolved.text() {
                Some(text) => println!("{text}"),
                None => println!("{}: {} ({} bytes)", raw, resolved.mime, resolved.body.len()),
            },
        }
    }
    Ok(())
}

/// File under `dir` for an asset path; the root maps to `index.html`
fn output_file(dir: &Path, path: &AssetPath) -> PathBuf {
    if path.is_root() {
        dir.join("index.html")
    } else {
        dir.join(path.relative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extract_prints_block_interior() {
        let out = extract("css", "Here you go:\n```css\nbody { margin: 0 }\n```\nEnjoy").unwrap();
        assert_eq!(out, "body { margin: 0 }\n");
        assert!(extract("css", "no block").is_err());
    }

    #[test]
    fn scan_lists_directives_in_order() {
        let page = r#"<img data-gen-image="true" data-context="a cat" alt="cat" src="/cat.jpg">
<img src="/plain.png">
<img data-gen-image='true' data-context='a dog' alt='dog' src='/dog.png' data-width="300">"#;
        let directives = scan(page, DEFAULT_MAX_TAG_LEN);
        let paths: Vec<&str> = directives.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec!["/cat.jpg", "/dog.png"]);
        assert_eq!(directives[1].width, Some(300));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sitegen.toml");
        std::fs::write(&path, "cache_capacity = 12\napex_domains = [\"sitegen.dev\"]\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.cache_capacity, 12);
        assert_eq!(config.default_image_size(), (512, 512));
        assert_eq!(load_config(None).unwrap(), GeneratorConfig::default());
    }

    #[test]
    fn output_file_maps_root() {
        let dir = Path::new("/tmp/site");
        assert_eq!(output_file(dir, &AssetPath::root()), dir.join("index.html"));
        assert_eq!(
            output_file(dir, &AssetPath::parse("/css/site.css").unwrap()),
            dir.join("css/site.css")
        );
    }

    #[tokio::test]
    async fn render_writes_page_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let response =
            "```html\n<img data-gen-image=\"true\" data-context=\"hero\" alt=\"hero\" src=\"/hero.jpg\">\n```".to_string();
        let paths = vec!["/".to_string(), "/hero.jpg".to_string()];

        render(GeneratorConfig::default(), "otters", response, "localhost", &paths, 5, Some(dir.path()))
            .await
            .unwrap();

        let page = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
        assert!(page.starts_with("<img data-gen-image"));
        let image = std::fs::read(dir.path().join("hero.jpg")).unwrap();
        assert_eq!(&image[..6], b"GIF89a");
    }
}
