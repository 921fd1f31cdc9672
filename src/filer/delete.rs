use super::{Filer, FilerError};
use crate::chuck::diff::unique_file_ids;
use crate::meta::path::FullPath;
use futures::future::BoxFuture;
use tracing::{debug, info};

impl Filer {
    /// Delete the entry at `p`.
    ///
    /// A directory with children is refused unless `is_recursive`, in which
    /// case every descendant goes first, depth first. With
    /// `should_delete_chunks` the chunks of every removed file are reclaimed.
    pub async fn delete_entry_meta_and_data(
        &self,
        p: &FullPath,
        is_recursive: bool,
        should_delete_chunks: bool,
    ) -> Result<(), FilerError> {
        self.delete_recursively(p.clone(), is_recursive, should_delete_chunks)
            .await?;
        info!(path = %p, recursive = is_recursive, "entry deleted");
        Ok(())
    }

    fn delete_recursively(
        &self,
        p: FullPath,
        is_recursive: bool,
        should_delete_chunks: bool,
    ) -> BoxFuture<'_, Result<(), FilerError>> {
        Box::pin(async move {
            let entry = self.find_entry(&p).await?;

            if entry.is_directory() {
                if is_recursive {
                    self.delete_children(&p, should_delete_chunks).await?;
                } else {
                    let children = self.list_directory_entries(&p, "", false, 1).await?;
                    if !children.is_empty() {
                        return Err(FilerError::DirectoryNotEmpty(p));
                    }
                }
                self.directory_cache.delete(&p).await;
            }

            if should_delete_chunks {
                self.delete_chunks(unique_file_ids(&entry.chunks)).await;
            }

            self.store
                .delete_entry(&p)
                .await
                .map_err(|e| FilerError::from_store("delete entry", &p, e))?;
            if entry.is_directory() {
                // a concurrent walk may have cached it again meanwhile
                self.directory_cache.delete(&p).await;
            }
            debug!(path = %p, "entry removed from store");
            Ok(())
        })
    }

    async fn delete_children(
        &self,
        dir: &FullPath,
        should_delete_chunks: bool,
    ) -> Result<(), FilerError> {
        let mut start = String::new();
        loop {
            let page = self
                .list_directory_entries(dir, &start, false, self.list_page_size)
                .await?;
            let Some(last) = page.last() else {
                return Ok(());
            };
            start = last.full_path.name().to_string();
            let full_page = page.len() == self.list_page_size;

            for child in page {
                self.delete_recursively(child.full_path, true, should_delete_chunks)
                    .await?;
            }
            if !full_page {
                return Ok(());
            }
        }
    }
}
