//! Foreground commands: one-off download to disk and search inspection

use std::sync::Arc;

use imagebox::config::Config;
use imagebox::registry::{JobRegistry, JobStatus};
use imagebox::search::{ImageSearch, SearchClient, SearchQuery, resolve};
use imagebox::worker::{BatchDownloadJob, ImageFetcher, SinkTarget};
use tracing::info;

use crate::cli::{DownloadArgs, SearchArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run a single job to completion with the folder sink and print a summary
pub async fn download(args: DownloadArgs, config: Config) -> Result<(), AnyError> {
    let count = args.count.unwrap_or(config.server.default_count);
    let query = SearchQuery::new(&args.query, count, config.server.max_count)?;
    let base_dir = args.dir.unwrap_or_else(|| config.output.base_dir.clone());

    let search = SearchClient::new(config.search.clone())?;
    let fetcher = ImageFetcher::new(&config.fetch)?;

    let registry = JobRegistry::new();
    let entry = registry.create(&query);
    info!(job_id = entry.id(), dir = %base_dir.display(), "Starting foreground download");

    let job = BatchDownloadJob::builder()
        .query(query)
        .search(Arc::new(search))
        .fetcher(Arc::new(fetcher))
        .target(SinkTarget::Folder { base_dir })
        .fetch_timeout(config.fetch.timeout())
        .politeness_delay(config.fetch.politeness_delay())
        .build();

    let snapshot = job.run(entry).await;

    println!("{}", snapshot.message);
    println!(
        "  downloaded: {}  failed: {}  total: {}",
        snapshot.succeeded, snapshot.failed, snapshot.total
    );
    for error in &snapshot.errors {
        println!("  #{:02} {}: {}", error.index, error.code, error.message);
    }
    if let Some(directory) = &snapshot.directory {
        println!("  saved to {}", directory.display());
    }

    match snapshot.status {
        JobStatus::Completed => Ok(()),
        _ => Err(snapshot.message.into()),
    }
}

/// Print each result's title and the URL that would be downloaded
pub async fn search(args: SearchArgs, config: Config) -> Result<(), AnyError> {
    let query = SearchQuery::new(&args.query, args.count, config.search.max_results)?;
    let client = SearchClient::new(config.search)?;

    let results = client.search(&query).await?;
    if results.is_empty() {
        println!("No images found for this query");
        return Ok(());
    }

    for (position, result) in results.iter().enumerate() {
        let title = result.title.as_deref().unwrap_or("(untitled)");
        match resolve(result) {
            Some(url) => println!("{:02}. {}\n    {}", position + 1, title, url),
            None => println!("{:02}. {}\n    (no usable URL)", position + 1, title),
        }
    }

    Ok(())
}
