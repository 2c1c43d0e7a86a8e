//! Index orchestrator: scan → diff → split → dual-store fan-out.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::chunk::epoch_millis;
use crate::error::{IndexError, Result};
use crate::fts::FtsStore;
use crate::scanner;
use crate::splitter::SplitterFactory;
use crate::state::{FileIndexState, StateStore};
use crate::vector::KnowledgeVectorStore;

/// Counters for one refresh run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub deleted: usize,
    pub errors: Vec<String>,
}

enum FileOutcome {
    Added,
    Updated,
    Skipped,
}

/// Drives index mutation end-to-end: owns the per-file diff against the
/// state store and the atomic (per file) fan-out to both stores.
pub struct KnowledgeIndexer {
    vector: Arc<KnowledgeVectorStore>,
    fts: FtsStore,
    state: StateStore,
    splitters: SplitterFactory,
}

impl KnowledgeIndexer {
    #[must_use]
    pub fn new(
        vector: Arc<KnowledgeVectorStore>,
        fts: FtsStore,
        state: StateStore,
        splitters: SplitterFactory,
    ) -> Self {
        Self {
            vector,
            fts,
            state,
            splitters,
        }
    }

    /// Reconcile on-disk state with both stores for one user.
    ///
    /// Per-file failures (unreadable file, bad UTF-8, store write error) are
    /// counted and logged without aborting the run; a state-store outage
    /// aborts.
    ///
    /// # Errors
    ///
    /// Returns an error if the state store cannot be read during the
    /// deletion sweep.
    pub async fn refresh(&self, user_id: &str, workspace_root: &Path) -> Result<RefreshReport> {
        let root = std::fs::canonicalize(workspace_root)
            .unwrap_or_else(|_| workspace_root.to_path_buf());
        tracing::info!(user_id, root = %root.display(), "index refresh started");

        let files = scanner::scan(&root);
        tracing::info!(total = files.len(), "workspace scanned");

        let mut report = RefreshReport::default();
        let mut scanned_paths: HashSet<String> = HashSet::with_capacity(files.len());

        for file in &files {
            let path = file.display().to_string();
            scanned_paths.insert(path.clone());

            match self.process_file(user_id, &path, file).await {
                Ok(FileOutcome::Added) => report.added += 1,
                Ok(FileOutcome::Updated) => report.updated += 1,
                Ok(FileOutcome::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::error!("failed to index {path}: {e:#}");
                    report.errors.push(format!("{path}: {e}"));
                }
            }
        }

        // Files present in the state store but absent from disk.
        for state in self.state.list_for_user(user_id).await? {
            if scanned_paths.contains(&state.file_path) {
                continue;
            }
            tracing::info!(file = %state.file_path, "removing deleted file from index");
            match self.remove_file(user_id, &state).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    tracing::error!("cleanup failed for {}: {e:#}", state.file_path);
                    report.errors.push(format!("{}: {e}", state.file_path));
                }
            }
        }

        tracing::info!(
            added = report.added,
            updated = report.updated,
            deleted = report.deleted,
            skipped = report.skipped,
            errors = report.errors.len(),
            "index refresh finished"
        );
        Ok(report)
    }

    async fn process_file(
        &self,
        user_id: &str,
        path: &str,
        file: &Path,
    ) -> Result<FileOutcome> {
        let bytes = tokio::fs::read(file).await?;
        let hash = format!("{:x}", md5::compute(&bytes));
        let content = String::from_utf8(bytes).map_err(|_| IndexError::Utf8 {
            path: path.to_string(),
        })?;

        match self.state.get(user_id, path).await? {
            None => {
                self.index_file(user_id, path, &content, &hash, None).await?;
                Ok(FileOutcome::Added)
            }
            Some(state) if state.content_hash == hash => Ok(FileOutcome::Skipped),
            Some(state) => {
                // Clear old chunks before writing replacements so readers
                // never observe mixed generations for one file.
                self.vector.delete_by_file_path(user_id, path).await?;
                self.fts.delete_by_file_path(user_id, path).await?;
                self.index_file(user_id, path, &content, &hash, Some(state))
                    .await?;
                Ok(FileOutcome::Updated)
            }
        }
    }

    /// Split a file and fan chunks out to both stores; the state row is
    /// written last.
    async fn index_file(
        &self,
        user_id: &str,
        path: &str,
        content: &str,
        hash: &str,
        existing: Option<FileIndexState>,
    ) -> Result<usize> {
        let mut chunks = self.splitters.split(content, path);
        for chunk in &mut chunks {
            chunk.user_id = user_id.to_string();
            chunk.content_hash = hash.to_string();
        }

        self.vector.add(user_id, &chunks).await?;
        self.fts.batch_insert(user_id, &chunks).await?;

        let file_size = i64::try_from(content.len()).unwrap_or(i64::MAX);
        match existing {
            None => {
                self.state
                    .insert(&FileIndexState {
                        id: uuid::Uuid::new_v4().to_string(),
                        user_id: user_id.to_string(),
                        file_path: path.to_string(),
                        content_hash: hash.to_string(),
                        last_modified_at: epoch_millis(),
                        file_size,
                    })
                    .await?;
            }
            Some(mut state) => {
                state.content_hash = hash.to_string();
                state.last_modified_at = epoch_millis();
                state.file_size = file_size;
                self.state.update(&state).await?;
            }
        }

        tracing::debug!(path, chunks = chunks.len(), "file indexed");
        Ok(chunks.len())
    }

    async fn remove_file(&self, user_id: &str, state: &FileIndexState) -> Result<()> {
        self.vector
            .delete_by_file_path(user_id, &state.file_path)
            .await?;
        self.fts
            .delete_by_file_path(user_id, &state.file_path)
            .await?;
        self.state.delete(&state.id).await?;
        Ok(())
    }

    /// Index a single file outside a refresh: full replacement of its
    /// chunks, returning the new chunk count. No state row is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a store write fails.
    pub async fn add_file(&self, user_id: &str, file_path: &str) -> Result<usize> {
        let path = Path::new(file_path);
        if !path.is_file() {
            tracing::warn!("not a regular file: {file_path}");
            return Ok(0);
        }

        let bytes = tokio::fs::read(path).await?;
        let hash = format!("{:x}", md5::compute(&bytes));
        let content = String::from_utf8(bytes).map_err(|_| IndexError::Utf8 {
            path: file_path.to_string(),
        })?;

        self.vector.delete_by_file_path(user_id, file_path).await?;
        self.fts.delete_by_file_path(user_id, file_path).await?;
        self.write_chunks(user_id, &content, file_path, &hash).await
    }

    /// Index ad-hoc content under a virtual path. The splitter is inferred
    /// from the path's extension; without a path a unique one is generated
    /// and the token splitter applies.
    ///
    /// # Errors
    ///
    /// Returns an error if a store write fails.
    pub async fn add_content(
        &self,
        user_id: &str,
        content: &str,
        virtual_path: Option<&str>,
    ) -> Result<usize> {
        if content.trim().is_empty() {
            return Ok(0);
        }
        let path = virtual_path.map_or_else(
            || format!("dynamic-{}", uuid::Uuid::new_v4()),
            str::to_string,
        );
        let hash = format!("{:x}", md5::compute(content.as_bytes()));
        self.write_chunks(user_id, content, &path, &hash).await
    }

    /// Remove everything indexed for a user: chunks in both stores and all
    /// state rows.
    ///
    /// # Errors
    ///
    /// Returns an error if a store operation fails.
    pub async fn delete_user_knowledge(&self, user_id: &str) -> Result<()> {
        self.vector.delete_by_user(user_id).await?;
        self.fts.delete_by_user(user_id).await?;
        for state in self.state.list_for_user(user_id).await? {
            self.state.delete(&state.id).await?;
        }
        tracing::info!(user_id, "user knowledge deleted");
        Ok(())
    }

    async fn write_chunks(
        &self,
        user_id: &str,
        content: &str,
        path: &str,
        hash: &str,
    ) -> Result<usize> {
        let mut chunks = self.splitters.split(content, path);
        for chunk in &mut chunks {
            chunk.user_id = user_id.to_string();
            chunk.content_hash = hash.to_string();
        }
        if chunks.is_empty() {
            return Ok(0);
        }
        self.vector.add(user_id, &chunks).await?;
        self.fts.batch_insert(user_id, &chunks).await?;
        tracing::info!(user_id, count = chunks.len(), "knowledge stored");
        Ok(chunks.len())
    }
}
