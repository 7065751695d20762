//! Profile file discovery.
//!
//! Two entry points mirror the two input layouts:
//! - `find_profiles`: every `*.csv` directly inside a directory, filtered by
//!   the config include/exclude globs (generic layout)
//! - `legacy_profiles`: `data/<op>/<DATASET>_DATASET_<op>.csv` for each
//!   requested operator and dataset size (legacy layout)
//!
//! Results are always sorted so runs are reproducible and CSV result files
//! get their rows in a stable order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use tracing::debug;

use crate::config::Config;
use crate::input::legacy_file_name;

/// One profile file of the legacy layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyProfile {
    pub operator: String,
    pub dataset: String,
    pub path: PathBuf,
}

/// Find CSV profiles directly inside `directory` (no recursion).
///
/// Hidden files are skipped; `.gitignore` is respected so scratch exports
/// kept out of version control stay out of the analysis too.
pub fn find_profiles(directory: &Path, config: &Config) -> Result<Vec<PathBuf>> {
    if directory.is_file() {
        return Ok(if is_csv(directory) {
            vec![directory.to_path_buf()]
        } else {
            vec![]
        });
    }

    if !directory.is_dir() {
        anyhow::bail!("Path does not exist: {}", directory.display());
    }

    let walker = WalkBuilder::new(directory)
        .max_depth(Some(1))
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        // Skip entries we can't read (permissions, broken symlinks, etc.)
        let Ok(entry) = entry else { continue };
        let path = entry.path();

        if !path.is_file() || !is_csv(path) {
            continue;
        }

        let rel_path = path.strip_prefix(directory).unwrap_or(path);
        if !config.should_include(rel_path) {
            debug!("excluded by config: {}", rel_path.display());
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Operator directories under the legacy `data/` root, sorted by name.
pub fn operator_dirs(data_root: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(data_root)
        .with_context(|| format!("Failed to list operator directories in {}", data_root.display()))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        dirs.push(name);
    }

    dirs.sort();
    Ok(dirs)
}

/// Existing legacy profiles for every (operator, dataset) combination.
///
/// Combinations without a file are skipped; operators rarely ship every
/// dataset size.
pub fn legacy_profiles(data_root: &Path, operators: &[String], datasets: &[String]) -> Vec<LegacyProfile> {
    let mut profiles = Vec::new();

    for operator in operators {
        for dataset in datasets {
            let path = data_root.join(operator).join(legacy_file_name(dataset, operator));
            if path.is_file() {
                profiles.push(LegacyProfile {
                    operator: operator.clone(),
                    dataset: dataset.clone(),
                    path,
                });
            } else {
                debug!("no profile at {}", path.display());
            }
        }
    }

    profiles
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_csv_extension() {
        assert!(is_csv(Path::new("a.csv")));
        assert!(is_csv(Path::new("A.CSV")));
        assert!(!is_csv(Path::new("a.csv.bak")));
        assert!(!is_csv(Path::new("csv")));
    }

    #[test]
    fn test_nonexistent_path() {
        let result = find_profiles(Path::new("/nonexistent/path/xyz"), &Config::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_find_profiles_flat_and_sorted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("b.csv"), "h\n")?;
        fs::write(dir.path().join("a.csv"), "h\n")?;
        fs::write(dir.path().join("notes.txt"), "x")?;
        fs::create_dir_all(dir.path().join("nested"))?;
        fs::write(dir.path().join("nested").join("c.csv"), "h\n")?;

        let files = find_profiles(dir.path(), &Config::default())?;
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);
        Ok(())
    }

    #[test]
    fn test_find_profiles_respects_include() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("keep.csv"), "h\n")?;
        fs::write(dir.path().join("drop.csv"), "h\n")?;

        let config = Config {
            include: vec!["keep*".to_string()],
            ..Default::default()
        };
        let files = find_profiles(dir.path(), &config)?;
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.csv"));
        Ok(())
    }

    #[test]
    fn test_single_file_input() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("one.csv");
        fs::write(&file, "h\n")?;
        assert_eq!(find_profiles(&file, &Config::default())?, vec![file]);
        Ok(())
    }

    #[test]
    fn test_legacy_layout() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let data = dir.path().join("data");
        fs::create_dir_all(data.join("adi"))?;
        fs::create_dir_all(data.join("gemm"))?;
        fs::create_dir_all(data.join(".git"))?;
        fs::write(data.join("adi").join("MINI_DATASET_adi.csv"), "h\n")?;
        fs::write(data.join("adi").join("LARGE_DATASET_adi.csv"), "h\n")?;
        fs::write(data.join("gemm").join("MINI_DATASET_gemm.csv"), "h\n")?;

        let ops = operator_dirs(&data)?;
        assert_eq!(ops, vec!["adi", "gemm"]);

        let datasets: Vec<String> = ["MINI", "SMALL", "LARGE"].iter().map(|s| s.to_string()).collect();
        let profiles = legacy_profiles(&data, &ops, &datasets);
        let found: Vec<_> = profiles
            .iter()
            .map(|p| format!("{}/{}", p.operator, p.dataset))
            .collect();
        assert_eq!(found, vec!["adi/MINI", "adi/LARGE", "gemm/MINI"]);
        Ok(())
    }
}
