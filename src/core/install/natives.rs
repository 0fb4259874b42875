// Native library extraction from classifier jars into `natives/`.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// A downloaded native classifier jar awaiting extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeArchive {
    pub path: PathBuf,
    /// Entry name prefixes to leave out, typically `META-INF/`.
    pub exclude: Vec<String>,
}

/// Extract on the blocking pool; returns the number of files written.
pub async fn extract_native(archive: NativeArchive, dest_dir: PathBuf) -> LauncherResult<usize> {
    tokio::task::spawn_blocking(move || extract_archive(&archive.path, &dest_dir, &archive.exclude))
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?
}

fn extract_archive(archive_path: &Path, dest_dir: &Path, exclude: &[String]) -> LauncherResult<usize> {
    let file = std::fs::File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if exclude.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {:?} in {:?}", name, archive_path);
            continue;
        };

        let out_path = dest_dir.join(relative);
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|e| LauncherError::io(&out_path, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| LauncherError::io(&out_path, e))?;
        written += 1;
    }

    debug!("Extracted {} files from {:?}", written, archive_path);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn native_jar(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory("META-INF/", options).unwrap();
        zip.start_file("META-INF/MANIFEST.MF", options).unwrap();
        zip.write_all(b"Manifest-Version: 1.0\n").unwrap();
        zip.start_file("liblwjgl.so", options).unwrap();
        zip.write_all(b"\x7fELF").unwrap();
        zip.add_directory("linux/", options).unwrap();
        zip.start_file("linux/libopenal.so", options).unwrap();
        zip.write_all(b"\x7fELF").unwrap();
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn extracts_files_and_honours_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("lwjgl-natives-linux.jar");
        native_jar(&jar);
        let natives = dir.path().join("natives");

        let written = extract_native(
            NativeArchive {
                path: jar,
                exclude: vec!["META-INF/".into()],
            },
            natives.clone(),
        )
        .await
        .unwrap();

        assert_eq!(written, 2);
        assert!(natives.join("liblwjgl.so").is_file());
        assert!(natives.join("linux/libopenal.so").is_file());
        assert!(!natives.join("META-INF").exists());
    }
}
