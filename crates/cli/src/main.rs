use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use clipguard_core::auth::access_token::{
    AccessTokenProvider, MetadataServerTokenProvider, StaticTokenProvider,
};
use clipguard_core::config::{BlurConfig, CompositorConfig, GoogleConfig};
use clipguard_core::detection::infrastructure::video_intelligence_client::VideoIntelligenceClient;
use clipguard_core::pipeline::blur_video_use_case::BlurVideoUseCase;
use clipguard_core::shared::blur_result::BlurResult;
use clipguard_core::storage::domain::output_path::derive_output_path;
use clipguard_core::storage::domain::uri_resolver::UriResolver;
use clipguard_core::storage::infrastructure::gcs_blob_store::GcsBlobStore;

/// Face anonymization for video clips stored in Google Cloud Storage.
#[derive(Parser)]
#[command(name = "clipguard")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect and redact faces in a stored clip, printing the result as JSON.
    Blur {
        /// Download URL of the source clip.
        video_url: String,

        /// Object path of the source clip inside its bucket.
        storage_path: String,

        /// Give up (and report failure) after this many seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        #[command(flatten)]
        settings: Settings,
    },
    /// Print the canonical gs:// URI for a storage URL.
    Resolve { url: String },
    /// Print where the anonymized copy of a clip is written.
    OutputPath { storage_path: String },
    /// Report which redaction mode the current configuration selects.
    Status {
        #[command(flatten)]
        settings: Settings,
    },
}

#[derive(Args)]
struct Settings {
    /// Base URL of the external blur processor. Unset means dev fallback.
    #[arg(long, env = "VIDEO_BLUR_PROCESSOR_URL")]
    processor_url: Option<String>,

    /// Bearer key for the blur processor.
    #[arg(long, env = "VIDEO_BLUR_PROCESSOR_KEY", hide_env_values = true)]
    processor_key: Option<String>,

    /// OAuth access token. Falls back to the metadata server when unset.
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Service account used to sign download URLs.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_EMAIL")]
    signer_email: Option<String>,

    /// Lifetime of the returned download URL in days (1-7).
    #[arg(long, env = "CLIPGUARD_SIGNED_URL_TTL_DAYS", default_value = "7")]
    signed_url_ttl_days: u32,

    /// Seconds between face detection status polls.
    #[arg(long, env = "CLIPGUARD_POLL_SECS", default_value = "5")]
    poll_secs: u64,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Blur {
            video_url,
            storage_path,
            timeout_secs,
            settings,
        } => {
            let signer = settings
                .signer_email
                .clone()
                .ok_or("--signer-email (or GOOGLE_SERVICE_ACCOUNT_EMAIL) is required")?;
            let use_case = build_use_case(&settings, &signer);
            if use_case.is_dev_fallback() {
                log::warn!(
                    "VIDEO_BLUR_PROCESSOR_URL is not set: clips with faces will be copied UNREDACTED"
                );
            }
            let result = run_blur(&use_case, &video_url, &storage_path, timeout_secs).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            ensure_success(&storage_path, &result)
        }
        Command::Resolve { url } => {
            let object = UriResolver::default().try_resolve(&url)?;
            println!("{}", object.gs_uri());
            Ok(())
        }
        Command::OutputPath { storage_path } => {
            println!("{}", derive_output_path(&storage_path));
            Ok(())
        }
        Command::Status { settings } => {
            let signer = settings.signer_email.clone().unwrap_or_default();
            let health = build_use_case(&settings, &signer).health();
            println!("redaction mode: {}", health.redaction_mode);
            println!("url shapes:     {}", health.url_shapes.join(", "));
            println!("signed url ttl: {} day(s)", health.signed_url_ttl_days);
            if signer.is_empty() {
                println!("signer:         (unset, blur will refuse to run)");
            } else {
                println!("signer:         {signer}");
            }
            Ok(())
        }
    }
}

async fn run_blur(
    use_case: &BlurVideoUseCase,
    video_url: &str,
    storage_path: &str,
    timeout_secs: Option<u64>,
) -> BlurResult {
    let Some(secs) = timeout_secs else {
        return use_case.blur_video(video_url, storage_path).await;
    };

    let started = Instant::now();
    match tokio::time::timeout(
        Duration::from_secs(secs),
        use_case.blur_video(video_url, storage_path),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => {
            log::error!("Blurring {storage_path} timed out after {secs}s");
            BlurResult::failed(
                format!("timed out after {secs}s"),
                started.elapsed().as_millis() as u64,
            )
        }
    }
}

fn ensure_success(
    storage_path: &str,
    result: &BlurResult,
) -> Result<(), Box<dyn std::error::Error>> {
    if result.success {
        return Ok(());
    }
    let reason = result.error.as_deref().unwrap_or("unknown error");
    Err(format!("blurring {storage_path} failed: {reason}").into())
}

fn build_use_case(settings: &Settings, signer_email: &str) -> BlurVideoUseCase {
    let client = reqwest::Client::new();
    let google = GoogleConfig {
        annotation_poll_interval: Duration::from_secs(settings.poll_secs.max(1)),
        ..GoogleConfig::new(signer_email)
    };
    let config = BlurConfig::default()
        .with_compositor(CompositorConfig::from_parts(
            settings.processor_url.clone(),
            settings.processor_key.clone(),
        ))
        .with_signed_url_ttl_days(settings.signed_url_ttl_days);

    let tokens: Arc<dyn AccessTokenProvider> = match &settings.access_token {
        Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
        None => Arc::new(MetadataServerTokenProvider::new(client.clone())),
    };

    let annotator = VideoIntelligenceClient::new(client.clone(), tokens.clone())
        .with_api_base(google.video_intelligence_api.clone())
        .with_poll_interval(google.annotation_poll_interval);
    let store = GcsBlobStore::new(client.clone(), tokens, google.signer_email.clone())
        .with_storage_api(google.storage_api.clone())
        .with_iam_api(google.iam_api.clone());

    BlurVideoUseCase::from_config(&config, client, Arc::new(annotator), Arc::new(store))
}
