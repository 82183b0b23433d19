use clap::{Args, Parser, Subcommand, ValueEnum};
use ffdiff::{starts_with_number_dot_number, CleanOptions};
use std::path::PathBuf;

/// CLI arguments for ff-diff
#[derive(Parser, Debug)]
#[command(name = "ff-diff")]
#[command(about = "Compare Firefox default preferences between releases and audit user.js files")]
#[command(version)]
pub struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Diff the default preferences of two Firefox releases
    Diff(DiffOptions),

    /// List the prefs of a user.js unknown to Firefox
    ///
    /// Defaults are read from the preference files of the installation.
    /// Prefs whose default is compiled into the binary are not in those
    /// files, so a listed pref may still be a real one.
    UnusedPrefsUserjs(UserJsOptions),

    /// Check the default values declared in a user.js
    DefaultPrefsUserjs {
        #[command(flatten)]
        userjs: UserJsOptions,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// List the default preferences of a Firefox build
    DefaultPrefs {
        #[command(flatten)]
        source: SourceOptions,

        /// Only list keys matching these glob patterns (e.g. "network.*")
        #[arg(short, long, num_args = 1..)]
        query: Vec<String>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Remove downloaded archives and extracted installations
    Clean(CleanArgs),
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Where the report goes
#[derive(Args, Debug, Clone, Default)]
pub struct OutputOptions {
    /// Do not output in the console
    #[arg(long)]
    pub do_not_print_in_console: bool,

    /// Save output to a file
    #[arg(long)]
    pub save_output_in_file: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DiffOptions {
    /// Old Firefox version (e.g. 139.0)
    #[arg(value_parser = parse_version)]
    pub old_version: String,

    /// New Firefox version (e.g. 140.0)
    #[arg(value_parser = parse_version)]
    pub new_version: String,

    /// Compare the diff with the annotations of a user.js
    #[arg(long, value_name = "PATH")]
    pub compare_userjs: Option<PathBuf>,

    /// Hide keys whose value changes with every release
    #[arg(long)]
    pub hide_common_changed_values: bool,

    /// Remove the archives once extracted
    #[arg(long)]
    pub clean_archives: bool,

    /// Remove the extracted installations once read
    #[arg(long)]
    pub clean_sources: bool,

    #[command(flatten)]
    pub output: OutputOptions,
}

/// Which Firefox build provides the default preferences
///
/// Without any option the system installation is used.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceOptions {
    /// Path to the Firefox installation directory or binary
    #[arg(long, value_name = "PATH", conflicts_with = "firefox_version")]
    pub firefox_path: Option<PathBuf>,

    /// Use a specific Firefox version, installed if needed
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    pub firefox_version: Option<String>,

    /// Use the installation that last ran this profile
    #[arg(long, value_name = "PATH", conflicts_with_all = ["force_default_profile", "firefox_version", "firefox_path"])]
    pub profile_path: Option<PathBuf>,

    /// Use the installation that last ran the default release profile
    #[arg(long, conflicts_with_all = ["firefox_version", "firefox_path"])]
    pub force_default_profile: bool,
}

#[derive(Args, Debug, Clone)]
pub struct UserJsOptions {
    /// Path to your user.js file
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    #[command(flatten)]
    pub source: SourceOptions,
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Major versions to keep (e.g. 139,140)
    #[arg(long, value_delimiter = ',', value_name = "VERSIONS")]
    pub keep: Vec<u32>,

    /// Keep every archive
    #[arg(long)]
    pub keep_archives: bool,

    /// Keep every extracted installation
    #[arg(long)]
    pub keep_sources: bool,
}

impl From<&CleanArgs> for CleanOptions {
    fn from(args: &CleanArgs) -> Self {
        CleanOptions {
            keep: args.keep.clone(),
            keep_archives: args.keep_archives,
            keep_sources: args.keep_sources,
        }
    }
}

/// Accept versions that start like `140.0`
fn parse_version(value: &str) -> Result<String, String> {
    if starts_with_number_dot_number(value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "'{value}' is not a valid version, expected something like 140.0"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_diff() {
        let cli = Cli::try_parse_from([
            "ff-diff",
            "diff",
            "139.0",
            "140.0b3",
            "--compare-userjs",
            "user.js",
            "--save-output-in-file",
            "--hide-common-changed-values",
        ])
        .unwrap();

        match cli.command {
            Commands::Diff(options) => {
                assert_eq!(options.old_version, "139.0");
                assert_eq!(options.new_version, "140.0b3");
                assert_eq!(options.compare_userjs, Some(PathBuf::from("user.js")));
                assert!(options.hide_common_changed_values);
                assert!(options.output.save_output_in_file);
                assert!(!options.output.do_not_print_in_console);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unused_prefs_help_mentions_compiled_defaults() {
        let mut command = Cli::command();
        let help = command
            .find_subcommand_mut("unused-prefs-userjs")
            .unwrap()
            .render_long_help()
            .to_string();
        assert!(help.contains("compiled into the binary"));
    }

    #[test]
    fn test_invalid_version_is_rejected() {
        assert!(Cli::try_parse_from(["ff-diff", "diff", "140", "141.0"]).is_err());
        assert!(Cli::try_parse_from(["ff-diff", "diff", "latest", "141.0"]).is_err());
    }

    #[test]
    fn test_profile_options_conflict() {
        let result = Cli::try_parse_from([
            "ff-diff",
            "unused-prefs-userjs",
            "user.js",
            "--profile-path",
            "/tmp/profile",
            "--force-default-profile",
        ]);
        assert!(result.is_err());

        let result = Cli::try_parse_from([
            "ff-diff",
            "default-prefs-userjs",
            "user.js",
            "--profile-path",
            "/tmp/profile",
            "--firefox-version",
            "140.0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_clean_keep_list() {
        let cli = Cli::try_parse_from(["ff-diff", "clean", "--keep", "139,140", "--keep-archives"])
            .unwrap();
        match cli.command {
            Commands::Clean(args) => {
                let options = CleanOptions::from(&args);
                assert_eq!(options.keep, vec![139, 140]);
                assert!(options.keep_archives);
                assert!(!options.keep_sources);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_default_prefs_query() {
        let cli = Cli::try_parse_from([
            "ff-diff",
            "--log-format",
            "json",
            "default-prefs",
            "--firefox-path",
            "/opt/firefox",
            "--query",
            "network.*",
            "browser.*",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::DefaultPrefs { source, query, .. } => {
                assert_eq!(source.firefox_path, Some(PathBuf::from("/opt/firefox")));
                assert_eq!(query, vec!["network.*", "browser.*"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
