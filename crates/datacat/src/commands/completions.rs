use std::fs::File;
use std::io::{stdout, Write};
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Args;
use crate::prelude::*;

const BIN_NAME: &str = "datacat";

/// Generate completion scripts for various shells.
///
/// The script completes all subcommands and options of `datacat`,
/// including the names accepted by `datacat config`.
#[derive(Debug, clap::Parser)]
pub(crate) struct Completions {
    /// Write output to `filename` instead of `stdout`.
    #[arg(long, short, value_name = "filename")]
    output: Option<PathBuf>,

    /// Shell for which a completion script is to be generated.
    #[arg(value_name = "shell")]
    shell: Shell,
}

/// Writes the completion script for `shell` to `wtr`.
fn write_script<W: Write>(
    shell: Shell,
    mut wtr: W,
) -> DatacatResult<()> {
    let mut cmd = Args::command();
    generate(shell, &mut cmd, BIN_NAME, &mut wtr);
    wtr.flush()?;
    Ok(())
}

impl Completions {
    pub(crate) fn execute(self) -> DatacatResult<()> {
        match self.output {
            Some(path) => write_script(self.shell, File::create(path)?),
            None => write_script(self.shell, stdout().lock()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn bash_script_covers_subcommands() -> TestResult {
        let mut out = vec![];
        write_script(Shell::Bash, &mut out)?;

        let script = String::from_utf8(out)?;
        assert!(script.contains("_datacat()"));
        assert!(script.contains("duplicates"));
        Ok(())
    }

    #[test]
    fn write_to_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("datacat.fish");

        let cmd = Completions {
            output: Some(path.clone()),
            shell: Shell::Fish,
        };
        cmd.execute()?;

        let script = std::fs::read_to_string(path)?;
        assert!(script.contains("complete -c datacat"));
        Ok(())
    }
}
