use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::ZipError;
use super::parser::ZipParser;

/// Extracts a downloaded artifact archive into a directory.
///
/// The destination is created if absent. Entries are written in archive
/// order: directory entries become nested directories, file entries are
/// inflated and written with any missing parents created, overwriting
/// whatever is already there. One progress line per entry goes to stdout.
pub struct ZipExtractor<'a> {
    parser: ZipParser<'a>,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            parser: ZipParser::new(data),
        }
    }

    /// Extract every entry of the archive under `dest`.
    pub async fn extract_all(&self, dest: &Path) -> Result<(), ZipError> {
        fs::create_dir_all(dest).await?;

        for entry in self.parser.entries()? {
            let target = dest.join(entry_relative_path(&entry.file_name)?);

            if entry.is_directory {
                println!("  creating: {}", target.display());
                fs::create_dir_all(&target).await?;
                continue;
            }

            println!("  inflating: {}", target.display());

            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await?;
                }
            }

            let data = self.parser.entry_data(&entry)?;
            let mut file = fs::File::create(&target).await?;
            file.write_all(&data).await?;
        }

        Ok(())
    }
}

/// Validate an entry name as a relative path that stays inside the
/// destination. Absolute paths, drive prefixes and `..` components are
/// rejected as malformed input.
fn entry_relative_path(name: &str) -> Result<PathBuf, ZipError> {
    let mut relative = PathBuf::new();

    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ZipError::UnsafeEntryPath(name.to_string()));
            }
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(ZipError::UnsafeEntryPath(name.to_string()));
    }

    Ok(relative)
}
