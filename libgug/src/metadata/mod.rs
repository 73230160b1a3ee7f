//! Reader for the text `.gug` metadata file: one `[Header]` section followed
//! by one `[MapInfo]` section per resolution level.

pub(crate) mod error;
pub(crate) mod field;
pub(crate) mod record;
pub(crate) mod utils;

pub use error::Error;
pub use record::{HeaderRecord, LevelRecord};

use itertools::Itertools;
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, instrument, trace, warn};

use field::Section;
use utils::{parse_line, split_path_index, Line};

/// A parsed `.gug` map description
#[derive(Debug, Clone, PartialEq)]
pub struct GugFile {
    fname: PathBuf,
    header: HeaderRecord,
    levels: Vec<LevelRecord>,
    raw_data: String,
}

#[derive(Clone, Copy)]
enum Current {
    Nothing,
    Header,
    Level,
    Ignored,
}

impl GugFile {
    /// Reads and parses a `.gug` file
    ///
    /// # Errors
    ///
    /// This function errors if the file cannot be read or is not a valid `.gug`
    /// file. See [`Self::parse`]
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        debug!("read {} bytes of metadata", bytes.len());
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("metadata is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        Ok(Self::parse(&text, path)?)
    }

    /// Parses the text of a `.gug` file. `fname` is the location the text was
    /// read from; relative tile file paths are resolved against its directory.
    ///
    /// # Errors
    ///
    /// This function errors if:
    /// - a line is not blank, a comment, a `[section]` or `key=value`
    /// - a value cannot be converted to its field's type
    /// - the `[Header]` section or all `[MapInfo]` sections are missing
    /// - a level has no `Path`, a zero pixel size, or a singular rotation
    pub fn parse(text: &str, fname: impl Into<PathBuf>) -> Result<Self, Error> {
        let mut header = None;
        let mut levels = Vec::new();
        let mut current = Current::Nothing;

        for (i, raw_line) in text.lines().enumerate() {
            let line_no = i + 1;
            let (_, line) = parse_line(raw_line).map_err(|_| Error::MalformedLine {
                line: line_no,
                content: raw_line.to_owned(),
            })?;
            match line {
                Line::Blank | Line::Comment(_) => {}
                Line::Section(name) => {
                    current = match Section::from_str(name) {
                        Ok(Section::Header) => {
                            header.get_or_insert_with(HeaderRecord::default);
                            Current::Header
                        }
                        Ok(Section::MapInfo) => {
                            levels.push(LevelRecord::default());
                            Current::Level
                        }
                        Err(_) => {
                            warn!("Unrecognized section name: {name}. Skipping");
                            Current::Ignored
                        }
                    };
                }
                Line::KeyValue(key, value) => {
                    trace!("{key}={value}");
                    let known = match current {
                        Current::Nothing => return Err(Error::OutsideSection { line: line_no }),
                        Current::Ignored => true,
                        Current::Header => header
                            .get_or_insert_with(HeaderRecord::default)
                            .set_field(key, value)?,
                        Current::Level => match levels.last_mut() {
                            Some(level) => level.set_field(key, value)?,
                            None => true,
                        },
                    };
                    if !known {
                        warn!("Unrecognized field name: {key} (line {line_no}). Skipping");
                    }
                }
            }
        }

        let header = header.ok_or(Error::MissingHeader)?;
        if levels.is_empty() {
            return Err(Error::NoLevels);
        }
        for (i, level) in levels.iter_mut().enumerate() {
            level.complete_initialization();
            if level.path.is_empty() {
                return Err(Error::MissingField {
                    level: i,
                    field: field::LevelField::Path.as_str(),
                });
            }
            let det = level.determinant();
            if !det.is_finite() || det.abs() <= f64::EPSILON * level.pixel_area() {
                return Err(Error::DegenerateTransform { level: i });
            }
        }
        let gauges = header.count_gauges();
        if gauges != 0 && gauges != levels.len() {
            warn!(
                "Header announces {gauges} gauges but {} levels are present",
                levels.len()
            );
        }
        debug!("parsed header and {} levels", levels.len());

        Ok(Self {
            fname: fname.into(),
            header,
            levels,
            raw_data: text.to_owned(),
        })
    }

    /// Path the metadata was read from
    #[must_use]
    pub fn filename(&self) -> &Path {
        &self.fname
    }

    /// Returns a reference to the [`HeaderRecord`]
    #[must_use]
    pub const fn header(&self) -> &HeaderRecord {
        &self.header
    }

    /// Number of resolution levels
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the [`LevelRecord`] of level `n`
    ///
    /// # Errors
    ///
    /// Errors if `n` is not a valid level index
    pub fn level(&self, n: usize) -> Result<&LevelRecord, crate::Error> {
        self.levels.get(n).ok_or(crate::Error::LevelOutOfRange {
            index: n,
            count: self.levels.len(),
        })
    }

    /// All resolution levels, in file order
    #[must_use]
    pub fn levels(&self) -> &[LevelRecord] {
        &self.levels
    }

    /// The metadata text as read
    #[must_use]
    pub fn raw_data(&self) -> &str {
        &self.raw_data
    }

    /// Index of the most detailed level (smallest ground area per pixel).
    /// The first level wins on ties.
    #[must_use]
    pub fn best_level_index(&self) -> usize {
        self.levels
            .iter()
            .position_min_by(|a, b| a.pixel_area().total_cmp(&b.pixel_area()))
            .unwrap_or(0)
    }

    /// Location of the tiles of level `n`: the `.gup` file and the index of the
    /// image entry within it.
    ///
    /// An explicit `,N` suffix of the level's `Path` selects entry `N`. Without
    /// it, entries are assigned in order to the levels sharing the same file.
    ///
    /// # Errors
    ///
    /// Errors if `n` is not a valid level index
    pub fn gup_path(&self, n: usize) -> Result<(PathBuf, u32), crate::Error> {
        let level = self.level(n)?;
        let (name, explicit) = split_path_index(&level.path);
        let index = match explicit {
            Some(index) => index,
            None => {
                let earlier = self.levels[..n]
                    .iter()
                    .filter(|other| split_path_index(&other.path).0.eq_ignore_ascii_case(name))
                    .count();
                u32::try_from(earlier).unwrap_or(u32::MAX)
            }
        };
        Ok((self.resolve_path(name), index))
    }

    fn resolve_path(&self, name: &str) -> PathBuf {
        let name = name.replace('\\', "/");
        let candidate = Path::new(&name);
        if candidate.is_absolute() {
            return candidate.to_path_buf();
        }
        let dir = match self.fname.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let joined = dir.join(candidate);
        if joined.exists() {
            return joined;
        }

        // files written on case-insensitive file systems
        let (Some(lookup_dir), Some(file_name)) =
            (joined.parent(), candidate.file_name().and_then(|f| f.to_str()))
        else {
            return joined;
        };
        let found = fs::read_dir(lookup_dir).ok().and_then(|entries| {
            entries.flatten().map(|e| e.path()).find(|p| {
                p.file_name()
                    .and_then(|f| f.to_str())
                    .is_some_and(|f| f.eq_ignore_ascii_case(file_name))
            })
        });
        if let Some(found) = found {
            debug!("resolved {} to {}", joined.display(), found.display());
            return found;
        }
        joined
    }
}
