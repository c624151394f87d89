//src/trajectory.rs

use ahash::AHashMap;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::TrajectoryError;

/// Column holding the running score of the design simulation.
pub const SCORE_COLUMN: &str = "current_score";

/// Prefix shared by every column that holds one piece of the evolving sequence.
pub const DOMAIN_PREFIX: &str = "current_domain";

/// Tokens read as "no value" in addition to an empty field.
const MISSING_TOKENS: [&str; 5] = ["NA", "NaN", "nan", "None", "null"];

/// One `current_domain*` column. `None` marks iterations where the domain had
/// not been populated yet.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainColumn {
    pub name: String,
    pub values: Vec<Option<String>>,
}

/// A design trajectory: one row per iteration, checked once at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    /// Display name used in reports (the file stem for loaded logs).
    pub name: String,
    /// Key/value pairs from the leading `#` comment line, e.g. `initial_seq`.
    pub metadata: AHashMap<String, String>,
    scores: Vec<f64>,
    domains: Vec<DomainColumn>,
}

impl Trajectory {
    /// Builds a trajectory from columns already in memory.
    ///
    /// Every domain column must have one value per score; a mismatch is
    /// reported as a ragged row at the first iteration that lacks a value.
    pub fn new(
        name: impl Into<String>,
        scores: Vec<f64>,
        domains: Vec<DomainColumn>,
    ) -> Result<Self, TrajectoryError> {
        let name = name.into();
        for domain in &domains {
            if domain.values.len() != scores.len() {
                return Err(TrajectoryError::RaggedRow {
                    path: PathBuf::from(&name),
                    line: domain.values.len().min(scores.len()) + 1,
                    expected: scores.len(),
                    found: domain.values.len(),
                });
            }
        }
        Ok(Self {
            name,
            metadata: AHashMap::new(),
            scores,
            domains,
        })
    }

    /// Number of iterations.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Domain columns in the order they were declared.
    pub fn domains(&self) -> &[DomainColumn] {
        &self.domains
    }

    /// The starting sequence of the run, if the log recorded one.
    pub fn initial_seq(&self) -> Option<&str> {
        self.metadata.get("initial_seq").map(String::as_str)
    }
}

/// Reads a tab-separated trajectory log, transparently handling `.gz`.
///
/// ```text
/// #\tinitial_seq\tGUUUUAGAGCUA...
/// step\tcurrent_score\tcurrent_domain[nexus]\tcurrent_domain[ruler]\t...
/// 0\t-3.2\tCUAGU\tGUUAUCA\t...
/// ```
pub fn read_trajectory<P: AsRef<Path>>(path: P) -> Result<Trajectory, TrajectoryError> {
    let path = path.as_ref();
    let io_err = |source| TrajectoryError::Io {
        path: path.to_path_buf(),
        source,
    };

    let f = File::open(path).map_err(io_err)?;
    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    let trajectory = parse_trajectory(reader, path)?;
    log::info!(
        "Loaded trajectory '{}' with {} iterations and {} domain column(s)",
        trajectory.name,
        trajectory.len(),
        trajectory.domains.len()
    );
    Ok(trajectory)
}

/// Parses the log format from any buffered reader. `path` is only used for
/// error messages and the default name.
pub fn parse_trajectory<R: BufRead>(reader: R, path: &Path) -> Result<Trajectory, TrajectoryError> {
    let mut lines = reader.lines().enumerate();
    let mut metadata = AHashMap::new();
    let mut header: Option<Vec<String>> = None;

    // 1) optional metadata line, then the header
    for (_, line) in lines.by_ref() {
        let line = line.map_err(|source| TrajectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('#') {
            if metadata.is_empty() {
                metadata = parse_metadata(rest);
            }
            continue;
        }
        header = Some(parse_header(&line));
        break;
    }

    let header = header.ok_or_else(|| TrajectoryError::MissingHeader {
        path: path.to_path_buf(),
    })?;

    // 2) schema check, done once for the whole table
    let columns: AHashMap<&str, usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let score_col = *columns
        .get(SCORE_COLUMN)
        .ok_or_else(|| TrajectoryError::MissingScoreColumn {
            path: path.to_path_buf(),
        })?;
    let domain_cols: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(DOMAIN_PREFIX))
        .map(|(i, _)| i)
        .collect();

    let mut scores = Vec::new();
    let mut domains: Vec<DomainColumn> = domain_cols
        .iter()
        .map(|&i| DomainColumn {
            name: header[i].clone(),
            values: Vec::new(),
        })
        .collect();

    // 3) rows
    for (line_idx, line) in lines {
        let line = line.map_err(|source| TrajectoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = line_idx + 1;
        let fields: Vec<&str> = line.split('\t').collect();

        // Trailing tabs are common; only real values past the header are an error.
        if fields.len() > header.len() && fields[header.len()..].iter().any(|f| !f.is_empty()) {
            return Err(TrajectoryError::RaggedRow {
                path: path.to_path_buf(),
                line: line_no,
                expected: header.len(),
                found: fields.len(),
            });
        }

        let raw_score = fields.get(score_col).copied().unwrap_or("");
        let score: f64 = raw_score
            .trim()
            .parse()
            .map_err(|_| TrajectoryError::InvalidScore {
                path: path.to_path_buf(),
                line: line_no,
                value: raw_score.to_string(),
            })?;
        scores.push(score);

        for (domain, &col) in domains.iter_mut().zip(&domain_cols) {
            domain.values.push(fields.get(col).and_then(|f| field_value(f)));
        }
    }

    log::debug!(
        "Parsed {} rows from '{}' (columns: {})",
        scores.len(),
        path.display(),
        header.join(", ")
    );

    Ok(Trajectory {
        name: display_name(path),
        metadata,
        scores,
        domains,
    })
}

/// `#\tinitial_seq\tACGU\tkey\tvalue` → `{initial_seq: ACGU, key: value}`
fn parse_metadata(rest: &str) -> AHashMap<String, String> {
    let fields: Vec<&str> = rest
        .split('\t')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    fields
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0].to_string(), pair[1].to_string()))
        .collect()
}

fn parse_header(line: &str) -> Vec<String> {
    let mut header: Vec<String> = line.split('\t').map(|s| s.trim().to_string()).collect();
    while header.last().is_some_and(|s| s.is_empty()) {
        header.pop();
    }
    header
}

fn field_value(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || MISSING_TOKENS.contains(&value) {
        None
    } else {
        Some(value.to_string())
    }
}

fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let stem = file_name.strip_suffix(".gz").unwrap_or(&file_name);
    match stem.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => stem.to_string(),
    }
}
