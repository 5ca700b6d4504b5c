use std::path::Path;

use anyhow::Context;

use crate::db::models::User;
use crate::directory::DirectoryRepository;

/// Read a JSON array of user records.
pub fn load(path: &Path) -> anyhow::Result<Vec<User>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    let users: Vec<User> = serde_json::from_str(&content)
        .with_context(|| format!("parsing seed file {}", path.display()))?;
    Ok(users)
}

/// Load a seed file and upsert its records into the directory.
pub async fn import_file(repo: &dyn DirectoryRepository, path: &Path) -> anyhow::Result<usize> {
    let users = load(path)?;
    let written = repo.import(&users).await?;
    tracing::info!("Imported {} users from {}", written, path.display());
    Ok(written)
}

/// Repopulate the search index from the users table.
pub async fn reindex(repo: &dyn DirectoryRepository) -> anyhow::Result<usize> {
    let indexed = repo.rebuild_index().await?;
    tracing::info!("Rebuilt search index for {} users", indexed);
    Ok(indexed)
}
