//src/fold.rs

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::FoldError;

/// Theophylline aptamer motif passed to RNAfold: sequence, fold and the
/// ligand binding bonus in kcal/mol.
pub const THEO_MOTIF_SEQ: &str = "GAUACCAGCCGAAAGGCCCUUGGCAGC";
pub const THEO_MOTIF_FOLD: &str = "(...((.(((....)))....))...)";
pub const THEO_MOTIF_ENERGY: f64 = -9.22;

/// How to reach the folding tool.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldOptions {
    /// Executable name or path, `RNAfold` by default.
    pub program: String,
    /// Extra arguments placed ahead of the fixed flags, e.g. `-T 30`.
    pub extra_args: Vec<String>,
    /// Fold with the theophylline aptamer motif bound.
    pub theo: bool,
}

impl Default for FoldOptions {
    fn default() -> Self {
        Self {
            program: "RNAfold".to_string(),
            extra_args: Vec::new(),
            theo: false,
        }
    }
}

/// Builds `RNAfold [extra...] --noPS --MEA [--motif ...]` without running it.
pub fn rnafold_command(options: &FoldOptions, theo: bool) -> Command {
    let mut cmd = Command::new(&options.program);
    cmd.args(&options.extra_args);
    cmd.args(["--noPS", "--MEA"]);
    if theo {
        cmd.arg("--motif").arg(format!(
            "{},{},{}",
            THEO_MOTIF_SEQ, THEO_MOTIF_FOLD, THEO_MOTIF_ENERGY
        ));
    }
    cmd
}

/// Streams `seq` through the folding tool and returns its trimmed stdout.
/// The output is opaque here and is not parsed.
pub fn run_rnafold(seq: &str, theo: bool, options: &FoldOptions) -> Result<String, FoldError> {
    let program = options.program.clone();
    let mut child = rnafold_command(options, theo)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| FoldError::Spawn {
            program: program.clone(),
            source,
        })?;

    // Dropping stdin after the write closes the pipe so the tool sees EOF.
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(seq.as_bytes())
            .map_err(|source| FoldError::Io {
                program: program.clone(),
                source,
            })?;
    }

    let output = child.wait_with_output().map_err(|source| FoldError::Io {
        program: program.clone(),
        source,
    })?;

    if !output.status.success() {
        return Err(FoldError::Failed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    log::debug!("{} folded {} nt", program, seq.len());
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Runs `sh <script>` so the test never execs a file it just wrote.
    fn shell_tool(dir: &tempfile::TempDir, body: &str) -> FoldOptions {
        let script = dir.path().join("fake_rnafold.sh");
        std::fs::write(&script, body).unwrap();
        FoldOptions {
            program: "sh".to_string(),
            extra_args: vec![script.to_string_lossy().into_owned()],
            theo: false,
        }
    }

    #[test]
    fn plain_fold_has_no_motif() {
        let cmd = rnafold_command(&FoldOptions::default(), false);
        assert_eq!(cmd.get_program(), "RNAfold");
        assert_eq!(args_of(&cmd), vec!["--noPS", "--MEA"]);
    }

    #[test]
    fn theo_fold_adds_the_aptamer_motif() {
        let cmd = rnafold_command(&FoldOptions::default(), true);
        assert_eq!(
            args_of(&cmd),
            vec![
                "--noPS",
                "--MEA",
                "--motif",
                "GAUACCAGCCGAAAGGCCCUUGGCAGC,(...((.(((....)))....))...),-9.22",
            ]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let options = FoldOptions {
            program: "definitely-not-an-rnafold-binary".to_string(),
            ..FoldOptions::default()
        };
        let err = run_rnafold("ACGU", false, &options).unwrap_err();
        assert!(matches!(err, FoldError::Spawn { .. }));
    }

    #[test]
    fn extra_args_come_before_the_fixed_flags() {
        let options = FoldOptions {
            extra_args: vec!["-T".into(), "30".into()],
            ..FoldOptions::default()
        };
        let cmd = rnafold_command(&options, false);
        assert_eq!(args_of(&cmd), vec!["-T", "30", "--noPS", "--MEA"]);
    }

    #[cfg(unix)]
    #[test]
    fn sequence_is_streamed_through_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let options = shell_tool(&dir, "cat\necho ' (-1.20)'\n");
        let out = run_rnafold("GGGAAACCC\n", true, &options).unwrap();
        assert_eq!(out, "GGGAAACCC\n (-1.20)");
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_reports_its_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let options = shell_tool(&dir, "cat >/dev/null\necho 'bad input' >&2\nexit 3\n");
        match run_rnafold("ACGU", false, &options).unwrap_err() {
            FoldError::Failed { stderr, status, .. } => {
                assert_eq!(stderr, "bad input");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
