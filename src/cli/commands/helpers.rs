//! Shared construction of repositories and clients for CLI commands.

use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{FileCheckpointStore, RecordRepository};
use crate::scrapers::{HackerNewsClient, HttpClient, HttpPageFetcher};

/// Open (creating if needed) the record store under the data directory.
pub fn open_records(settings: &Settings) -> anyhow::Result<Arc<RecordRepository>> {
    settings.ensure_directories()?;
    Ok(Arc::new(RecordRepository::new(&settings.database_path())?))
}

pub fn checkpoint_store(settings: &Settings) -> Arc<FileCheckpointStore> {
    Arc::new(FileCheckpointStore::new(settings.checkpoint_path()))
}

fn http_client(settings: &Settings) -> anyhow::Result<HttpClient> {
    Ok(HttpClient::with_user_agent(
        settings.request_timeout(),
        settings.user_agent.as_deref(),
    )?)
}

pub fn item_source(settings: &Settings) -> anyhow::Result<Arc<HackerNewsClient>> {
    Ok(Arc::new(HackerNewsClient::new(
        http_client(settings)?,
        &settings.api_base_url,
    )))
}

pub fn page_fetcher(settings: &Settings) -> anyhow::Result<Arc<HttpPageFetcher>> {
    Ok(Arc::new(HttpPageFetcher::new(http_client(settings)?)))
}
