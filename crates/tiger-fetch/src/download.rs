//! Archive download and extraction.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use zip::ZipArchive;

use crate::{FetchError, Result};

/// Downloads `url` into `download_dir`, keeping the remote file name.
///
/// The body is streamed to disk chunk by chunk. An existing file of the same name is
/// overwritten.
///
/// # Errors
///
/// Returns [`FetchError::Http`] for request failures and non-success statuses, and
/// [`FetchError::Io`] if the file cannot be written.
pub async fn download_archive(client: &Client, url: &str, download_dir: &Path) -> Result<PathBuf> {
    let name = url.rsplit('/').next().unwrap_or(url);
    let path = download_dir.join(name);

    let mut response = client.get(url).send().await?.error_for_status()?;
    match response.content_length() {
        Some(size) => info!("Downloading {url} ({size} bytes)"),
        None => info!("Downloading {url}"),
    }

    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| FetchError::io(&path, e))?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(&path, e))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| FetchError::io(&path, e))?;

    debug!("Wrote {written} bytes to {}", path.display());
    Ok(path)
}

/// Directory an archive is extracted into: `extract_dir` joined with the archive stem.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tiger_fetch::download::extract_target;
///
/// let target = extract_target(Path::new("downloads/tl_2014_41_tract.zip"), Path::new("extracted_files"));
/// assert_eq!(target, Path::new("extracted_files/tl_2014_41_tract"));
/// ```
#[must_use]
pub fn extract_target(archive: &Path, extract_dir: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map_or_else(|| archive.as_os_str().to_owned(), ToOwned::to_owned);
    extract_dir.join(stem)
}

/// Extracts every entry of `archive` into its dataset directory under `extract_dir`.
///
/// # Errors
///
/// Returns [`FetchError::Io`] if the archive cannot be opened and
/// [`FetchError::Archive`] if it is not a valid zip file or an entry cannot be written.
pub fn extract_archive(archive: &Path, extract_dir: &Path) -> Result<PathBuf> {
    let target = extract_target(archive, extract_dir);
    info!("Extracting {} into {}", archive.display(), target.display());

    let file = File::open(archive).map_err(|e| FetchError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| FetchError::archive(archive, e))?;
    zip.extract(&target)
        .map_err(|e| FetchError::archive(archive, e))?;

    debug!("Extracted {} entries from {}", zip.len(), archive.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(contents).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_extract_into_dataset_directory() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tl_2014_41_tract.zip");
        write_archive(
            &archive,
            &[
                ("tl_2014_41_tract.shp", b"shp"),
                ("tl_2014_41_tract.dbf", b"dbf"),
                ("tl_2014_41_tract.prj", b"prj"),
            ],
        );

        let extract_dir = temp.path().join("extracted_files");
        let target = extract_archive(&archive, &extract_dir).unwrap();

        assert_eq!(target, extract_dir.join("tl_2014_41_tract"));
        assert_eq!(
            std::fs::read(target.join("tl_2014_41_tract.shp")).unwrap(),
            b"shp"
        );
        assert!(target.join("tl_2014_41_tract.prj").exists());
    }

    #[test]
    fn test_extract_rejects_non_zip() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("tl_2014_41_tract.zip");
        std::fs::write(&archive, b"<html>Not Found</html>").unwrap();

        let err = extract_archive(&archive, temp.path()).unwrap_err();
        assert!(matches!(err, FetchError::Archive { .. }));
    }

    #[test]
    fn test_extract_missing_archive() {
        let temp = TempDir::new().unwrap();
        let err = extract_archive(&temp.path().join("absent.zip"), temp.path()).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
