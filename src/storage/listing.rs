//! Renders directory entries in the three wire formats the server speaks: the classic `ls` long
//! format, EPLF, and the RFC 3659 machine-readable fact lines used by MLSD/MLST.

use super::storage_backend::{Fileinfo, Metadata};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::time::SystemTime;

/// The listing format a session uses for LIST output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    /// `ls -l` style long lines.
    Ls,
    /// Easily Parsed List Format.
    Ep,
    /// RFC 3659 fact lines, as also used by MLSD.
    Mlsd,
}

/// The MLST/MLSD facts this server can emit. `OPTS MLST` narrows the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MlstFact {
    Type,
    Size,
    Modify,
    Perm,
    UnixMode,
}

impl MlstFact {
    /// All facts, in the order they are advertised and rendered.
    pub fn all() -> Vec<MlstFact> {
        vec![MlstFact::Type, MlstFact::Size, MlstFact::Modify, MlstFact::Perm, MlstFact::UnixMode]
    }

    /// Case-insensitive fact name lookup, used when parsing `OPTS MLST`.
    pub fn from_name(name: &str) -> Option<MlstFact> {
        match name.to_ascii_lowercase().as_str() {
            "type" => Some(MlstFact::Type),
            "size" => Some(MlstFact::Size),
            "modify" => Some(MlstFact::Modify),
            "perm" => Some(MlstFact::Perm),
            "unix.mode" => Some(MlstFact::UnixMode),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MlstFact::Type => "Type",
            MlstFact::Size => "Size",
            MlstFact::Modify => "Modify",
            MlstFact::Perm => "Perm",
            MlstFact::UnixMode => "UNIX.mode",
        }
    }
}

// Entries younger than this render an HH:MM column, older ones a year column.
const SIX_MONTHS_SECS: i64 = 180 * 24 * 3600;

fn modified_or_epoch<M: Metadata>(metadata: &M) -> DateTime<Utc> {
    metadata.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::UNIX_EPOCH))
}

/// Renders one `ls -l` style line, without line terminator.
pub fn format_ls<P: AsRef<Path>, M: Metadata>(fi: &Fileinfo<P, M>) -> String {
    let modified = modified_or_epoch(&fi.metadata);
    let date = if (Utc::now() - modified).num_seconds() < SIX_MONTHS_SECS {
        modified.format("%b %d %H:%M")
    } else {
        modified.format("%b %d  %Y")
    };
    format!(
        "{}{} 1 1 1 {:>12} {} {}",
        if fi.metadata.is_dir() { "d" } else { "-" },
        fi.metadata.permissions(),
        fi.metadata.len(),
        date,
        fi.name(),
    )
}

/// Renders one EPLF line, without line terminator.
pub fn format_ep<P: AsRef<Path>, M: Metadata>(fi: &Fileinfo<P, M>) -> String {
    let modified = modified_or_epoch(&fi.metadata);
    format!(
        "+s{},m{},up{:o},{}\t{}",
        fi.metadata.len(),
        modified.timestamp(),
        fi.metadata.permissions().0 & 0o7777,
        if fi.metadata.is_dir() { "/" } else { "r" },
        fi.name(),
    )
}

/// Renders one RFC 3659 fact line, without line terminator. Only the given facts are emitted.
pub fn format_mlsd<P: AsRef<Path>, M: Metadata>(fi: &Fileinfo<P, M>, facts: &[MlstFact]) -> String {
    let mut line = String::new();
    let mode = fi.metadata.permissions().0;
    for fact in facts {
        match fact {
            MlstFact::Type => {
                line.push_str(if fi.metadata.is_dir() { "Type=dir;" } else { "Type=file;" });
            }
            MlstFact::Size => {
                line.push_str(&format!("Size={};", fi.metadata.len()));
            }
            MlstFact::Modify => {
                let modified = modified_or_epoch(&fi.metadata);
                line.push_str(&format!("Modify={};", modified.format("%Y%m%d%H%M%S")));
            }
            MlstFact::Perm => {
                line.push_str("Perm=");
                if fi.metadata.is_dir() {
                    line.push_str("el");
                    if mode & 0o200 > 0 {
                        line.push_str("cmdfp");
                    }
                } else {
                    if mode & 0o400 > 0 {
                        line.push('r');
                    }
                    if mode & 0o200 > 0 {
                        line.push_str("adwf");
                    }
                }
                line.push(';');
            }
            MlstFact::UnixMode => {
                line.push_str(&format!("UNIX.mode={:04o};", mode & 0o7777));
            }
        }
    }
    line.push(' ');
    line.push_str(fi.name());
    line
}

/// Renders one line in whatever format the session selected.
pub fn format_entry<P: AsRef<Path>, M: Metadata>(fi: &Fileinfo<P, M>, format: ListFormat, facts: &[MlstFact]) -> String {
    match format {
        ListFormat::Ls => format_ls(fi),
        ListFormat::Ep => format_ep(fi),
        ListFormat::Mlsd => format_mlsd(fi, facts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Result;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::time::{Duration, UNIX_EPOCH};

    struct Meta {
        dir: bool,
        size: u64,
        modified: SystemTime,
    }

    impl Metadata for Meta {
        fn len(&self) -> u64 {
            self.size
        }
        fn is_dir(&self) -> bool {
            self.dir
        }
        fn is_file(&self) -> bool {
            !self.dir
        }
        fn modified(&self) -> Result<SystemTime> {
            Ok(self.modified)
        }
    }

    fn entry(name: &str, dir: bool, size: u64) -> Fileinfo<PathBuf, Meta> {
        Fileinfo {
            path: PathBuf::from(format!("/{}", name)),
            metadata: Meta {
                dir,
                size,
                modified: UNIX_EPOCH + Duration::from_secs(1_704_164_645), // 2024-01-02T03:04:05Z
            },
        }
    }

    #[test]
    fn ls_line_for_an_old_file_shows_the_year() {
        let line = format_ls(&entry("readme.txt", false, 10));
        assert_eq!(line, "-rw-r--r-- 1 1 1           10 Jan 02  2024 readme.txt");
    }

    #[test]
    fn ls_line_marks_directories() {
        let line = format_ls(&entry("sub", true, 0));
        assert!(line.starts_with("drwxr-xr-x 1 1 1 "));
        assert!(line.ends_with(" sub"));
    }

    #[test]
    fn eplf_line_facts() {
        let line = format_ep(&entry("readme.txt", false, 10));
        assert_eq!(line, "+s10,m1704164645,up644,r\treadme.txt");
        let line = format_ep(&entry("sub", true, 0));
        assert_eq!(line, "+s0,m1704164645,up755,/\tsub");
    }

    #[test]
    fn mlsd_line_for_a_file() {
        let line = format_mlsd(&entry("readme.txt", false, 10), &MlstFact::all());
        assert_eq!(line, "Type=file;Size=10;Modify=20240102030405;Perm=radwf;UNIX.mode=0644; readme.txt");
    }

    #[test]
    fn mlsd_line_for_a_directory() {
        let line = format_mlsd(&entry("sub", true, 0), &MlstFact::all());
        assert_eq!(line, "Type=dir;Size=0;Modify=20240102030405;Perm=elcmdfp;UNIX.mode=0755; sub");
    }

    #[test]
    fn mlsd_facts_can_be_narrowed() {
        let line = format_mlsd(&entry("readme.txt", false, 10), &[MlstFact::Type, MlstFact::Size]);
        assert_eq!(line, "Type=file;Size=10; readme.txt");
    }
}
