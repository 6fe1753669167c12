use crate::error::{Error, Result};
use crate::types::Tool;
use flate2::read::GzDecoder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tar::Archive;
use walkdir::WalkDir;

pub fn is_archive(path: &Path) -> bool {
    let name = path.to_string_lossy().to_lowercase();
    name.ends_with(".tar.gz")
        || name.ends_with(".tgz")
        || name.ends_with(".tar.xz")
        || name.ends_with(".zip")
}

/// Turn a downloaded artifact into an executable binary on disk.
///
/// Archives are unpacked next to the download and searched with
/// [`locate_binary`]; anything else is taken to be the binary itself.
pub fn prepare_binary(tool: &Tool, downloaded: &Path) -> Result<PathBuf> {
    let binary = if is_archive(downloaded) {
        let extract_dir = downloaded
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("extracted");
        fs::create_dir_all(&extract_dir)?;
        extract_archive(downloaded, &extract_dir)?;
        locate_binary(&extract_dir, tool)?
    } else {
        downloaded.to_path_buf()
    };

    set_executable(&binary)?;
    Ok(binary)
}

pub fn set_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

pub fn extract_archive(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    tracing::info!("Extracting {}...", archive_path.display());

    let name = archive_path.to_string_lossy().to_lowercase();
    if name.ends_with(".zip") {
        extract_zip(archive_path, extract_dir)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar_gz(archive_path, extract_dir)
    } else if name.ends_with(".tar.xz") {
        extract_tar_xz(archive_path, extract_dir)
    } else {
        Err(Error::UnsupportedArchive(archive_path.to_path_buf()))
    }
}

fn extract_zip(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        // Path traversal check
        let Some(relative) = file.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!("Skipping malicious path in zip: {}", file.name());
            continue;
        };
        let outpath = extract_dir.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&outpath)?;
            io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

fn extract_tar_gz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.unpack(extract_dir)?;
    Ok(())
}

fn extract_tar_xz(archive_path: &Path, extract_dir: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(xz2::read::XzDecoder::new(file));
    archive.unpack(extract_dir)?;
    Ok(())
}

/// File names a tool's binary may carry inside a release archive.
pub fn binary_names(tool: &Tool) -> [String; 3] {
    [
        tool.name.clone(),
        format!("{}-{}-{}", tool.name, tool.os, tool.arch),
        format!("{}_{}_{}", tool.name, tool.os, tool.arch),
    ]
}

/// Walk an extracted archive in name order and return the first regular file
/// whose name is one of [`binary_names`]. There is no fallback.
pub fn locate_binary(extract_dir: &Path, tool: &Tool) -> Result<PathBuf> {
    let names = binary_names(tool);

    for entry in WalkDir::new(extract_dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if names.iter().any(|name| *name == file_name) {
            tracing::debug!("Located binary at {}", entry.path().display());
            return Ok(entry.into_path());
        }
    }

    Err(Error::BinaryNotLocated(tool.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn tool() -> Tool {
        Tool::new("t", "linux", "amd64").with_version("0.1.0")
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_is_archive() {
        assert!(is_archive(Path::new("/tmp/k9s_Linux_x86_64.tar.gz")));
        assert!(is_archive(Path::new("/tmp/tool.tgz")));
        assert!(is_archive(Path::new("/tmp/tool.TAR.XZ")));
        assert!(is_archive(Path::new("/tmp/tool.zip")));
        assert!(!is_archive(Path::new("/tmp/kubectl")));
    }

    #[test]
    fn test_locate_binary_candidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("t-dist")).unwrap();
        fs::write(dir.path().join("README.md"), "docs").unwrap();
        fs::write(dir.path().join("t-dist/t_linux_amd64"), "bin").unwrap();

        let found = locate_binary(dir.path(), &tool()).unwrap();
        assert_eq!(found, dir.path().join("t-dist/t_linux_amd64"));
    }

    #[test]
    fn test_locate_binary_has_no_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("only-file"), "bin").unwrap();

        let err = locate_binary(dir.path(), &tool()).unwrap_err();
        assert!(matches!(err, Error::BinaryNotLocated(ref name) if name == "t"));
    }

    #[test]
    fn test_directory_named_like_binary_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("t")).unwrap();
        fs::write(dir.path().join("t/t-linux-amd64"), "bin").unwrap();

        let found = locate_binary(dir.path(), &tool()).unwrap();
        assert_eq!(found, dir.path().join("t/t-linux-amd64"));
    }

    #[test]
    fn test_prepare_binary_from_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("t_0.1.0.tar.gz");
        write_tar_gz(&archive, &[("LICENSE", b"MIT"), ("dist/t", b"#!/bin/sh\n")]);

        let binary = prepare_binary(&tool(), &archive).unwrap();
        assert_eq!(binary, dir.path().join("extracted/dist/t"));
        assert_eq!(fs::read(&binary).unwrap(), b"#!/bin/sh\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&binary).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_prepare_binary_from_tar_xz() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("t_0.1.0.tar.xz");
        let file = fs::File::create(&archive).unwrap();
        let mut builder = tar::Builder::new(xz2::write::XzEncoder::new(file, 6));
        let data: &[u8] = b"#!/bin/sh\necho xz\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "t-linux-amd64", data).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let binary = prepare_binary(&tool(), &archive).unwrap();
        assert_eq!(binary, dir.path().join("extracted/t-linux-amd64"));
        assert_eq!(fs::read(&binary).unwrap(), data);
    }

    #[test]
    fn test_prepare_binary_from_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("t.zip");
        let mut writer = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
        writer
            .start_file("t-linux-amd64", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"binary").unwrap();
        writer.finish().unwrap();

        let binary = prepare_binary(&tool(), &archive).unwrap();
        assert_eq!(binary, dir.path().join("extracted/t-linux-amd64"));
    }

    #[test]
    fn test_prepare_plain_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t");
        fs::write(&path, "#!/bin/sh\n").unwrap();

        assert_eq!(prepare_binary(&tool(), &path).unwrap(), path);
    }
}
