//! Dataset acquisition: download the UCI archive, extract it and copy the
//! chosen `.data` file to the configured CSV path.

use crate::errors::{DataError, Result};
use crate::table::RawTable;
use heartwise_core::DataSettings;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

const ARCHIVE_NAME: &str = "heart.zip";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Download, extract and materialize the dataset. Returns the CSV path.
pub async fn download_dataset(settings: &DataSettings) -> Result<PathBuf> {
    let dir = settings.dir.clone();
    tokio::fs::create_dir_all(&dir).await?;

    info!(url = %settings.url, "downloading dataset");
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let bytes = client
        .get(&settings.url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let archive = dir.join(ARCHIVE_NAME);
    tokio::fs::write(&archive, &bytes).await?;
    info!(path = %archive.display(), size = bytes.len(), "archive saved");

    let settings = settings.clone();
    tokio::task::spawn_blocking(move || {
        extract_archive(&archive, &dir)?;
        materialize_csv(&settings)
    })
    .await
    .map_err(|e| DataError::Task(e.to_string()))?
}

/// Extract every entry of a zip archive into `dir`
pub fn extract_archive(archive: &Path, dir: &Path) -> Result<()> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    zip.extract(dir)?;
    info!(entries = zip.len(), dir = %dir.display(), "archive extracted");
    Ok(())
}

/// Pick the preferred data file, or the first `.data` file by name
pub fn select_data_file(dir: &Path, preferred: &str) -> Result<PathBuf> {
    let target = dir.join(preferred);
    if target.is_file() {
        return Ok(target);
    }

    warn!(file = preferred, "preferred data file not found, searching for .data files");
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "data"))
        .collect();
    candidates.sort();

    let chosen = candidates
        .into_iter()
        .next()
        .ok_or_else(|| DataError::NoDataFile(dir.display().to_string()))?;
    info!(file = %chosen.display(), "using fallback data file");
    Ok(chosen)
}

/// Copy the selected raw data file to the CSV path, still headerless
pub fn materialize_csv(settings: &DataSettings) -> Result<PathBuf> {
    let dir = settings.dir.clone();
    let source = select_data_file(&dir, &settings.target_data_file)?;
    let table = RawTable::from_path(&source)?;

    let csv_path = settings.csv_path();
    table.write_csv(&csv_path)?;
    info!(rows = table.len(), path = %csv_path.display(), "dataset saved");
    Ok(csv_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_target_file_then_first_data_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.data"), "1").unwrap();
        fs::write(dir.path().join("a.data"), "1").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let chosen = select_data_file(dir.path(), "processed.cleveland.data").unwrap();
        assert_eq!(chosen.file_name().unwrap(), "a.data");

        fs::write(dir.path().join("processed.cleveland.data"), "1").unwrap();
        let chosen = select_data_file(dir.path(), "processed.cleveland.data").unwrap();
        assert_eq!(chosen.file_name().unwrap(), "processed.cleveland.data");
    }

    #[test]
    fn empty_directory_has_no_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            select_data_file(dir.path(), "processed.cleveland.data"),
            Err(DataError::NoDataFile(_))
        ));
    }
}
