use super::*;
use std::collections::BTreeMap;
use std::path::Path;

/// Migration version. Ordering key and uniqueness key.
pub type Version = u64;

const UP: &str = ".up.sql";
const DOWN: &str = ".down.sql";

/// One versioned schema change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    version: Version,
    name: String,
    up: String,
    down: Option<String>,
}

impl Migration {
    pub fn new(version: Version, name: &str, up: &str, down: Option<&str>) -> Self {
        Self {
            version,
            name: name.to_string(),
            up: up.to_string(),
            down: down.map(str::to_string),
        }
    }
    pub fn version(&self) -> Version {
        self.version
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn up(&self) -> &str {
        &self.up
    }
    pub fn down(&self) -> Option<&str> {
        self.down.as_deref()
    }

    /// Reads every `{version}_{name}.up.sql` / `.down.sql` pair in `dir`,
    /// sorted by version ascending. Other files are ignored.
    pub fn discover(dir: &Path) -> Result<Vec<Self>, MigrationError> {
        let unreadable = |source| MigrationError::Directory {
            path: dir.to_path_buf(),
            source,
        };
        let mut found = BTreeMap::<Version, Partial>::new();
        for entry in std::fs::read_dir(dir).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            if !entry.file_type().map_err(unreadable)?.is_file() {
                continue;
            }
            let file = entry.file_name().to_string_lossy().into_owned();
            let Some((version, name, up)) = parse(&file)? else {
                continue;
            };
            let script = std::fs::read_to_string(entry.path()).map_err(unreadable)?;
            let partial = found.entry(version).or_insert_with(|| Partial {
                name: name.to_string(),
                up: None,
                down: None,
            });
            if partial.name != name {
                return Err(MigrationError::Duplicate(version));
            }
            let slot = if up { &mut partial.up } else { &mut partial.down };
            if slot.replace(script).is_some() {
                return Err(MigrationError::Duplicate(version));
            }
        }
        found
            .into_iter()
            .map(|(version, partial)| {
                Ok(Self {
                    version,
                    name: partial.name,
                    up: partial.up.ok_or(MigrationError::MissingUp(version))?,
                    down: partial.down,
                })
            })
            .collect()
    }
}

struct Partial {
    name: String,
    up: Option<String>,
    down: Option<String>,
}

/// Splits a migration file name into (version, name, is_up).
/// Returns `None` for files that are not migration scripts.
fn parse(file: &str) -> Result<Option<(Version, &str, bool)>, MigrationError> {
    let (stem, up) = if let Some(stem) = file.strip_suffix(UP) {
        (stem, true)
    } else if let Some(stem) = file.strip_suffix(DOWN) {
        (stem, false)
    } else {
        return Ok(None);
    };
    let malformed = || MigrationError::Malformed(file.to_string());
    let (version, name) = stem.split_once('_').ok_or_else(malformed)?;
    let version = version.parse::<Version>().map_err(|_| malformed())?;
    // stored as BIGINT, and zero marks the uninitialized ledger
    if version == 0 || version > i64::MAX as Version || name.is_empty() {
        return Err(malformed());
    }
    Ok(Some((version, name, up)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, file: &str, sql: &str) {
        std::fs::write(dir.join(file), sql).unwrap();
    }

    #[test]
    fn parse_file_names() {
        assert_eq!(parse("1000_first.up.sql").unwrap(), Some((1000, "first", true)));
        assert_eq!(parse("7_add_index.down.sql").unwrap(), Some((7, "add_index", false)));
        assert_eq!(parse("README.md").unwrap(), None);
        assert!(parse("first.up.sql").is_err());
        assert!(parse("x1_first.up.sql").is_err());
        assert!(parse("0_zero.up.sql").is_err());
        assert!(parse("5_.up.sql").is_err());
    }

    #[test]
    fn discover_sorts_by_version() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "1001_second.up.sql", "B");
        write(dir.path(), "1000_first.up.sql", "A");
        write(dir.path(), "1000_first.down.sql", "a");
        write(dir.path(), "notes.txt", "ignored");
        let found = Migration::discover(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![
                Migration::new(1000, "first", "A", Some("a")),
                Migration::new(1001, "second", "B", None),
            ]
        );
    }

    #[test]
    fn discover_missing_directory() {
        let result = Migration::discover(Path::new("migrationsFolder"));
        assert!(matches!(result, Err(MigrationError::Directory { .. })));
    }

    #[test]
    fn discover_rejects_down_without_up() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "3_orphan.down.sql", "SELECT 1;");
        let result = Migration::discover(dir.path());
        assert!(matches!(result, Err(MigrationError::MissingUp(3))));
    }

    #[test]
    fn discover_rejects_conflicting_names() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "3_one.up.sql", "SELECT 1;");
        write(dir.path(), "3_two.up.sql", "SELECT 1;");
        let result = Migration::discover(dir.path());
        assert!(matches!(result, Err(MigrationError::Duplicate(3))));
    }

    #[test]
    fn discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Migration::discover(dir.path()).unwrap().is_empty());
    }
}
