use crate::config::MirrorConfig;
use crate::error::{MirrorError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use prerender_scanner::{CrawlResult, Crawler};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// Options for a single mirror run
pub struct MirrorOptions {
    pub config: MirrorConfig,
    pub show_progress_bars: bool,
}

/// Callback receiving the URL path of every resource as it is fetched
pub type MirrorProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Remove `dir` if it exists and recreate it empty.
///
/// The filesystem root, the current directory and its ancestors are never
/// removed.
pub fn reset_output_dir(dir: &Path) -> Result<()> {
    ensure_resettable(dir)?;

    if dir.exists() {
        info!("Removing previous output at {}", dir.display());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn ensure_resettable(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Err(MirrorError::UnsafeOutputDir(dir.to_path_buf()));
    }

    let cwd = env::current_dir()?;
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        cwd.join(dir)
    };
    let resolved = absolute.canonicalize().unwrap_or(absolute);
    let cwd = cwd.canonicalize().unwrap_or(cwd);

    if resolved.parent().is_none() || cwd.starts_with(&resolved) {
        return Err(MirrorError::UnsafeOutputDir(dir.to_path_buf()));
    }
    Ok(())
}

/// Reset the output directory and mirror the configured target into it.
pub async fn execute_mirror(
    options: MirrorOptions,
    progress_callback: Option<MirrorProgressCallback>,
) -> Result<Vec<CrawlResult>> {
    let MirrorOptions {
        config,
        show_progress_bars,
    } = options;

    config.validate()?;
    let output_dir = config.expanded_output_dir();
    reset_output_dir(&output_dir)?;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| MirrorError::Config(e.to_string()))?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting prerender...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let fetched_count = Arc::new(AtomicUsize::new(0));

    let internal_callback: prerender_scanner::ProgressCallback = {
        let pb = progress_bar.clone();
        let count = fetched_count.clone();
        Arc::new(move |path: String| {
            let n = count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!("[{}] {}", n, path));
            }
            if let Some(ref callback) = progress_callback {
                callback(path);
            }
        })
    };

    let mut crawler = Crawler::with_client_config(
        &config.target_url,
        &output_dir,
        config.timeout_secs,
        &config.user_agent,
    )?
    .with_progress_callback(internal_callback);

    let outcome = crawler.crawl(config.target_url.clone()).await;

    if let Some(ref pb) = progress_bar {
        let total = fetched_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Prerender complete! {} resources fetched", total));
    }

    Ok(outcome?)
}
