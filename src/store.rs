//! On-disk page store.
//!
//! Pages land in a flat directory as `<page_index><extension>`. The file
//! names are the only index: downloads complete in any order, and the
//! reading side recovers page order by parsing and numerically sorting the
//! leading number of each image file name.
//!
//! ```text
//! tmp/
//!   1.jpg
//!   2.jpg
//!   3        <- unknown content type, kept on disk but never listed
//!   10.png
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::sniff::{ContentType, leading_hex, sniff};

/// Errors from reading or writing the page store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File system error.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path the operation touched.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An image file whose stem is not a page number.
    ///
    /// The store was written by something other than the downloader, or the
    /// naming invariant was broken. Callers should stop.
    #[error("malformed page file name: {path}")]
    MalformedPageName {
        /// Offending file.
        path: PathBuf,
    },

    /// Two image files claim the same page.
    #[error("page {page_index} stored twice: {first} and {second}")]
    DuplicatePageIndex {
        /// The repeated page number.
        page_index: u32,
        /// First file seen.
        first: PathBuf,
        /// Second file seen.
        second: PathBuf,
    },
}

impl StoreError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A fetched page with its detected content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffedPage {
    /// Page number.
    pub page_index: u32,
    /// Raw image bytes.
    pub payload: Vec<u8>,
    /// Advisory type from the payload's magic number.
    pub content_type: ContentType,
}

impl SniffedPage {
    /// Sniffs `payload` and pairs it with its page index.
    #[must_use]
    pub fn new(page_index: u32, payload: Vec<u8>) -> Self {
        let content_type = sniff(&payload);
        Self {
            page_index,
            payload,
            content_type,
        }
    }
}

/// A page written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    /// Page number.
    pub page_index: u32,
    /// Where the page was written.
    pub path: PathBuf,
    /// Type used to pick the extension.
    pub content_type: ContentType,
}

/// Flat directory of page image files.
#[derive(Debug, Clone)]
pub struct PageStore {
    dir: PathBuf,
}

impl PageStore {
    /// Wraps an existing directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Deletes `dir` if present and recreates it empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if removal or creation fails.
    #[instrument(skip(dir), fields(dir = %dir.display()))]
    pub async fn reset(dir: &Path) -> Result<Self, StoreError> {
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => debug!("removed previous page directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(dir, e)),
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StoreError::io(dir, e))?;
        Ok(Self::new(dir))
    }

    /// Directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a page of the given type is stored at.
    #[must_use]
    pub fn page_path(&self, page_index: u32, content_type: ContentType) -> PathBuf {
        self.dir
            .join(format!("{page_index}{}", content_type.extension()))
    }

    /// Writes a page in a single call, replacing any same-named file.
    ///
    /// Unknown content types are still written, without an extension, and a
    /// warning naming the page and its leading bytes is logged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the write fails.
    #[instrument(skip(self, page), fields(page = page.page_index, content_type = %page.content_type))]
    pub async fn write_page(&self, page: &SniffedPage) -> Result<StoredPage, StoreError> {
        if !page.content_type.is_known() {
            warn!(
                page = page.page_index,
                starting_bytes = %leading_hex(&page.payload),
                "could not determine file type"
            );
        }

        let path = self.page_path(page.page_index, page.content_type);
        tokio::fs::write(&path, &page.payload)
            .await
            .map_err(|e| StoreError::io(&path, e))?;

        debug!(path = %path.display(), bytes = page.payload.len(), "page written");
        Ok(StoredPage {
            page_index: page.page_index,
            path,
            content_type: page.content_type,
        })
    }

    /// Lists this store's image files in page order.
    ///
    /// # Errors
    ///
    /// See [`list_ordered_pages`].
    pub async fn ordered_pages(&self) -> Result<Vec<PathBuf>, StoreError> {
        list_ordered_pages(&self.dir).await
    }
}

/// Lists the image files in `directory`, ascending by page number.
///
/// Only regular files ending in `.gif`, `.png` or `.jpg` are considered;
/// anything else, including extensionless pages of unknown type and
/// subdirectories, is skipped. Missing pages are simply absent.
///
/// # Errors
///
/// - [`StoreError::Io`] if the directory cannot be read
/// - [`StoreError::MalformedPageName`] if an image file's stem is not a
///   positive decimal page number
/// - [`StoreError::DuplicatePageIndex`] if two image files share a page number
#[instrument(skip(directory), fields(dir = %directory.display()))]
pub async fn list_ordered_pages(directory: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut entries = tokio::fs::read_dir(directory)
        .await
        .map_err(|e| StoreError::io(directory, e))?;

    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StoreError::io(directory, e))?
    {
        let path = entry.path();
        if !is_page_image(&path) {
            continue;
        }
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        if !file_type.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }
        let index = page_index_of(&path)?;
        pages.push((index, path));
    }

    pages.sort_by_key(|(index, _)| *index);

    if let Some(pair) = pages.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(StoreError::DuplicatePageIndex {
            page_index: pair[0].0,
            first: pair[0].1.clone(),
            second: pair[1].1.clone(),
        });
    }

    debug!(count = pages.len(), "ordered pages listed");
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ContentType::from_extension)
        .is_some()
}

/// Page number encoded in a stem: ASCII digits only, at least 1.
fn page_index_of(path: &Path) -> Result<u32, StoreError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|stem| stem.parse::<u32>().ok())
        .filter(|index| *index >= 1)
        .ok_or_else(|| StoreError::MalformedPageName {
            path: path.to_path_buf(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"x").unwrap();
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_numeric_not_lexicographic_order() {
        let dir = TempDir::new().unwrap();
        for name in ["3.png", "1.jpg", "10.gif"] {
            touch(dir.path(), name);
        }
        let listed = list_ordered_pages(dir.path()).await.unwrap();
        assert_eq!(names(&listed), ["1.jpg", "3.png", "10.gif"]);
    }

    #[tokio::test]
    async fn test_unknown_and_foreign_files_skipped() {
        let dir = TempDir::new().unwrap();
        for name in ["2.png", "5", "notes.txt", "4.jpeg", "7.PNG", "1.gif"] {
            touch(dir.path(), name);
        }
        let listed = list_ordered_pages(dir.path()).await.unwrap();
        assert_eq!(names(&listed), ["1.gif", "2.png"]);
    }

    #[tokio::test]
    async fn test_gaps_are_permitted() {
        let dir = TempDir::new().unwrap();
        for name in ["1.jpg", "2.jpg", "6.jpg"] {
            touch(dir.path(), name);
        }
        let listed = list_ordered_pages(dir.path()).await.unwrap();
        assert_eq!(names(&listed), ["1.jpg", "2.jpg", "6.jpg"]);
    }

    #[tokio::test]
    async fn test_empty_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        assert!(list_ordered_pages(dir.path()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_name_is_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.jpg");
        touch(dir.path(), "cover.jpg");
        let result = list_ordered_pages(dir.path()).await;
        assert!(matches!(
            result,
            Err(StoreError::MalformedPageName { ref path }) if path.ends_with("cover.jpg")
        ));
    }

    #[tokio::test]
    async fn test_duplicate_index_is_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "4.jpg");
        touch(dir.path(), "4.png");
        let result = list_ordered_pages(dir.path()).await;
        assert!(matches!(
            result,
            Err(StoreError::DuplicatePageIndex { page_index: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_page_index_is_malformed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.jpg");
        touch(dir.path(), "0.jpg");
        let result = list_ordered_pages(dir.path()).await;
        assert!(matches!(
            result,
            Err(StoreError::MalformedPageName { ref path }) if path.ends_with("0.jpg")
        ));
    }

    #[tokio::test]
    async fn test_signed_stem_is_malformed() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "+2.png");
        let result = list_ordered_pages(dir.path()).await;
        assert!(matches!(
            result,
            Err(StoreError::MalformedPageName { ref path }) if path.ends_with("+2.png")
        ));
    }

    #[tokio::test]
    async fn test_directory_named_like_page_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "1.gif");
        std::fs::create_dir(dir.path().join("5.gif")).unwrap();
        let listed = list_ordered_pages(dir.path()).await.unwrap();
        assert_eq!(names(&listed), ["1.gif"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = list_ordered_pages(&dir.path().join("absent")).await;
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_page_path_naming() {
        let store = PageStore::new("/pages");
        assert_eq!(
            store.page_path(12, ContentType::Png),
            PathBuf::from("/pages/12.png")
        );
        assert_eq!(
            store.page_path(3, ContentType::Unknown),
            PathBuf::from("/pages/3")
        );
    }

    #[test]
    fn test_sniffed_page_detects_type() {
        let page = SniffedPage::new(2, b"GIF87a-rest".to_vec());
        assert_eq!(page.content_type, ContentType::Gif);
        assert_eq!(page.payload, b"GIF87a-rest");
    }

    #[tokio::test]
    async fn test_write_page_known_type() {
        let dir = TempDir::new().unwrap();
        let store = PageStore::new(dir.path());
        let stored = store
            .write_page(&SniffedPage::new(8, b"GIF89a....".to_vec()))
            .await
            .unwrap();

        assert_eq!(stored.path, dir.path().join("8.gif"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"GIF89a....");
    }

    #[tokio::test]
    async fn test_write_page_unknown_type_has_no_extension() {
        let dir = TempDir::new().unwrap();
        let store = PageStore::new(dir.path());
        let stored = store
            .write_page(&SniffedPage::new(5, b"<html>nope</html>".to_vec()))
            .await
            .unwrap();

        assert_eq!(stored.content_type, ContentType::Unknown);
        assert_eq!(stored.path, dir.path().join("5"));
        assert!(stored.path.exists());
        assert!(store.ordered_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_page_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = PageStore::new(dir.path());
        store
            .write_page(&SniffedPage::new(1, b"GIF89a-old".to_vec()))
            .await
            .unwrap();
        let stored = store
            .write_page(&SniffedPage::new(1, b"GIF89a-new".to_vec()))
            .await
            .unwrap();
        assert_eq!(std::fs::read(stored.path).unwrap(), b"GIF89a-new");
    }

    #[tokio::test]
    async fn test_reset_clears_and_recreates() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("tmp");
        std::fs::create_dir(&dir).unwrap();
        touch(&dir, "1.jpg");

        let store = PageStore::reset(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(store.dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_reset_creates_missing_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("nested").join("tmp");
        PageStore::reset(&dir).await.unwrap();
        assert!(dir.is_dir());
    }
}
