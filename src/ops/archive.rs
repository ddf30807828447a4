//! Archive writing.
//!
//! The bundle directory is written as an archive whose entries are relative
//! to that directory, so unpacking it yields the package at the top level.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::util::hash::sha256_file;

/// Archive format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    /// Uncompressed (stored) zip, as serverless platforms expect
    #[default]
    Zip,
    /// Gzip-compressed tarball
    TarGz,
}

impl ArchiveFormat {
    /// File extension, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::TarGz => "tar.gz",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::TarGz => write!(f, "tar-gz"),
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar-gz" | "tar.gz" | "tgz" => Ok(ArchiveFormat::TarGz),
            _ => bail!("unknown archive format `{}` (expected zip or tar-gz)", s),
        }
    }
}

/// A written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Where the archive was written
    pub path: PathBuf,
    /// Number of files in the archive
    pub files: usize,
    /// Size in bytes
    pub size: u64,
    /// SHA-256 of the archive, hex encoded
    pub sha256: String,
}

/// Write the contents of `src_dir` to an archive at `dest`.
///
/// The archive is written to a temporary file next to `dest` and moved into
/// place once complete, so a failed run never leaves a truncated archive.
pub fn write_archive(src_dir: &Path, dest: &Path, format: ArchiveFormat) -> Result<ArchiveInfo> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create directory: {}", parent.display()))?;

    let tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    let writer = BufWriter::new(
        tmp.reopen()
            .context("failed to open temporary archive file")?,
    );

    let files = match format {
        ArchiveFormat::Zip => write_zip(src_dir, writer)?,
        ArchiveFormat::TarGz => write_tar_gz(src_dir, writer)?,
    };

    tmp.persist(dest)
        .with_context(|| format!("failed to write archive: {}", dest.display()))?;

    let size = std::fs::metadata(dest)
        .with_context(|| format!("failed to stat {}", dest.display()))?
        .len();
    let sha256 = sha256_file(dest)?;

    tracing::debug!("wrote {} ({} files, {} bytes)", dest.display(), files, size);

    Ok(ArchiveInfo {
        path: dest.to_path_buf(),
        files,
        size,
        sha256,
    })
}

/// Directory entries of `src_dir` in a stable order, with their
/// `/`-separated archive names.
fn entries(src_dir: &Path) -> Result<Vec<(PathBuf, String, bool)>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", src_dir.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .with_context(|| format!("{} is outside {}", entry.path().display(), src_dir.display()))?;

        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let is_dir = entry.file_type().is_dir();
        out.push((entry.path().to_path_buf(), name, is_dir));
    }
    Ok(out)
}

fn write_zip<W: Write + io::Seek>(src_dir: &Path, writer: W) -> Result<usize> {
    let mut zip = zip::ZipWriter::new(writer);
    let options =
        zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    let mut files = 0;
    for (path, name, is_dir) in entries(src_dir)? {
        if is_dir {
            zip.add_directory(format!("{}/", name), options)
                .with_context(|| format!("failed to add {} to archive", name))?;
            continue;
        }

        zip.start_file(name.as_str(), options.unix_permissions(file_mode(&path)))
            .with_context(|| format!("failed to add {} to archive", name))?;
        let mut file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        io::copy(&mut file, &mut zip)
            .with_context(|| format!("failed to write {} to archive", name))?;
        files += 1;
    }

    let mut writer = zip.finish().context("failed to finish zip archive")?;
    writer.flush().context("failed to flush zip archive")?;
    Ok(files)
}

fn write_tar_gz<W: Write>(src_dir: &Path, writer: W) -> Result<usize> {
    let encoder = GzEncoder::new(writer, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut files = 0;
    for (path, name, is_dir) in entries(src_dir)? {
        if is_dir {
            builder
                .append_dir(&name, &path)
                .with_context(|| format!("failed to add {} to archive", name))?;
        } else {
            builder
                .append_path_with_name(&path, &name)
                .with_context(|| format!("failed to add {} to archive", name))?;
            files += 1;
        }
    }

    let encoder = builder.into_inner().context("failed to finish tar archive")?;
    let mut writer = encoder.finish().context("failed to finish gzip stream")?;
    writer.flush().context("failed to flush tar archive")?;
    Ok(files)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> u32 {
    0o644
}
