use tracing_subscriber::EnvFilter;

use tiktok_downloader_lib::config;
use tiktok_downloader_lib::resolve::SnapTikResolver;
use tiktok_downloader_lib::source::TikwmSource;
use tiktok_downloader_lib::ui;

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so prompts on stdout stay clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tiktok_downloader_lib=warn")),
        )
        .init();

    let settings = config::load_settings();

    let source = match TikwmSource::new(&settings.api_base_url) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };
    let mut resolver =
        SnapTikResolver::new(&settings.webdriver_url, settings.resolve_timeout_secs);

    if let Err(e) = ui::run(&settings, &source, &mut resolver).await {
        eprintln!("✗ {}", e);
        std::process::exit(1);
    }
}
