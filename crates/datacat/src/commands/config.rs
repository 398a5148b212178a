use catalog::config::Config as CatalogConfig;
use clap::Parser;

use crate::prelude::*;

/// Get and set catalog config options.
#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Get the value for the given key.
    #[arg(long, conflicts_with_all = ["value", "unset", "set"])]
    get: bool,

    /// Remove the key from the config.
    #[arg(long, conflicts_with_all = ["value", "get", "set"])]
    unset: bool,

    /// Set the value for the given key.
    #[arg(
        long,
        requires = "value",
        conflicts_with_all = ["get", "unset"]
    )]
    set: bool,

    /// The name of the config option.
    #[arg(value_parser = CatalogConfig::OPTIONS.to_vec())]
    name: String,

    /// The (new) value of the config option.
    #[arg(conflicts_with_all = ["get", "unset"])]
    value: Option<String>,
}

#[inline]
fn print_option(key: &str, value: Option<String>) {
    println!("{key} = {}", value.unwrap_or("None".into()));
}

impl Config {
    /// Updates `config` (or prints the option). Returns whether the
    /// config was changed.
    fn update(
        &self,
        config: &mut CatalogConfig,
    ) -> DatacatResult<bool> {
        let name = self.name.as_str();

        if let Some(ref value) = self.value {
            config.set(name, value)?;
            Ok(true)
        } else if self.unset {
            config.unset(name)?;
            Ok(true)
        } else {
            print_option(name, config.get(name)?);
            Ok(false)
        }
    }

    pub(crate) fn execute(self) -> DatacatResult<()> {
        let datacat = Datacat::discover()?;
        let mut config = datacat.config()?;

        if self.update(&mut config)? {
            config.save()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use catalog::dedup::DeduplicationConfig;
    use clap::Parser;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn set_and_unset() -> TestResult {
        let mut config = CatalogConfig::default();

        let cmd = Config::try_parse_from([
            "config",
            "deduplication.enabled",
            "true",
        ])?;
        assert!(cmd.update(&mut config)?);
        assert!(config.deduplication.enabled);

        let cmd = Config::try_parse_from([
            "config",
            "--unset",
            "deduplication.enabled",
        ])?;
        assert!(cmd.update(&mut config)?);
        assert!(!config.deduplication.enabled);

        let cmd = Config::try_parse_from(["config", "display.dates"])?;
        assert!(!cmd.update(&mut config)?);

        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> TestResult {
        let mut config = CatalogConfig::default();

        let cmd = Config::try_parse_from([
            "config",
            "deduplication.strategy",
            "fuzzy",
        ])?;
        assert!(cmd.update(&mut config).is_err());
        assert_eq!(
            config.deduplication,
            DeduplicationConfig::default()
        );

        let args = ["config", "no.such.option"];
        assert!(Config::try_parse_from(args).is_err());
        Ok(())
    }
}
