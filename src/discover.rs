//! File discovery and readiness filtering.
//!
//! A recorder file is "ready" once no further writes are expected, which this
//! module approximates as "last modified strictly before the run's cutoff".
//! The reference deployment cuts off at minute 10 of the current UTC day, so
//! yesterday's files qualify while today's still-growing ones do not.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveTime, Utc};
use regex::Regex;
use tracing::{debug, warn};

/// A file eligible for upload, discovered at run start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    /// Last-modified instant, interpreted in UTC.
    pub modified: DateTime<Utc>,
}

/// Today's readiness cutoff: minute `cutoff_minute` past midnight, UTC.
pub fn daily_cutoff(cutoff_minute: u32) -> DateTime<Utc> {
    let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    midnight + Duration::minutes(i64::from(cutoff_minute))
}

/// List files in `dir` whose name matches the glob-style `pattern` and whose
/// modification time is strictly earlier than `cutoff`.
///
/// Never fails: a missing directory, unreadable entries or an empty match set
/// all yield an empty list. The order of the result is unspecified.
pub fn select_ready(dir: &Path, pattern: &str, cutoff: DateTime<Utc>) -> Vec<CandidateFile> {
    let matcher = match glob_to_regex(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(pattern, error = %e, "Invalid filename pattern, selecting nothing");
            return Vec::new();
        }
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Source directory not readable, selecting nothing");
            return Vec::new();
        }
    };

    let mut ready = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !matcher.is_match(name) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let modified = DateTime::<Utc>::from(modified);
        if modified < cutoff {
            ready.push(CandidateFile {
                path: entry.path(),
                modified,
            });
        } else {
            debug!(file = name, %modified, %cutoff, "File not ready yet, skipping");
        }
    }
    ready
}

/// Compile a glob-style filename pattern (`*` and `?` wildcards) into an
/// anchored regular expression. All other characters match literally.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            c => expr.push_str(&regex::escape(&c.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const PATTERN: &str = "*%*%*";

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "data").unwrap();
        path
    }

    fn mtime(path: &Path) -> DateTime<Utc> {
        DateTime::<Utc>::from(fs::metadata(path).unwrap().modified().unwrap())
    }

    #[test]
    fn includes_files_modified_before_cutoff() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "2021-02-10%XBTUSD%quote.dat");

        let cutoff = mtime(&path) + Duration::seconds(1);
        let ready = select_ready(dir.path(), PATTERN, cutoff);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].path, path);
    }

    #[test]
    fn excludes_files_modified_at_or_after_cutoff() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "2021-02-11%ETHUSD%quote.dat");

        // Boundary: t == cutoff is excluded by the strict comparison.
        let at_cutoff = mtime(&path);
        assert!(select_ready(dir.path(), PATTERN, at_cutoff).is_empty());

        let before = at_cutoff - Duration::seconds(1);
        assert!(select_ready(dir.path(), PATTERN, before).is_empty());
    }

    #[test]
    fn pattern_filters_out_unrelated_files() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "2021-02-10%XBTUSD%quote.dat");
        write_file(dir.path(), "notes.txt");
        write_file(dir.path(), "2021-02-10-no-markers.dat");

        let cutoff = Utc::now() + Duration::minutes(1);
        let ready = select_ready(dir.path(), PATTERN, cutoff);
        assert_eq!(ready.len(), 1);
        assert!(ready[0].path.ends_with("2021-02-10%XBTUSD%quote.dat"));
    }

    #[test]
    fn missing_directory_yields_empty_list() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        assert!(select_ready(&gone, PATTERN, Utc::now()).is_empty());
    }

    #[test]
    fn subdirectories_are_not_candidates() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("2021%dir%entry")).unwrap();

        let cutoff = Utc::now() + Duration::minutes(1);
        assert!(select_ready(dir.path(), PATTERN, cutoff).is_empty());
    }

    #[test]
    fn question_mark_matches_single_character() {
        let re = glob_to_regex("file-?.dat").unwrap();
        assert!(re.is_match("file-1.dat"));
        assert!(!re.is_match("file-10.dat"));
    }

    #[test]
    fn literal_dots_are_not_wildcards() {
        let re = glob_to_regex("*.dat").unwrap();
        assert!(re.is_match("a.dat"));
        assert!(!re.is_match("a_dat"));
    }

    #[test]
    fn daily_cutoff_lands_on_requested_minute() {
        let cutoff = daily_cutoff(10);
        assert_eq!(cutoff.date_naive(), Utc::now().date_naive());
        assert_eq!(cutoff.time(), NaiveTime::from_hms_opt(0, 10, 0).unwrap());
    }
}
