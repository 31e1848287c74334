use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};

use lcov_reporter::cli::{self, Inputs, Style};
use lcov_reporter::github;
use lcov_reporter::options::{Options, RenderOptions, Thresholds, DEFAULT_SERVER_URL};

/// Compare LCOV coverage against a base report and post the result as a
/// markdown comment.
#[derive(Parser)]
#[command(name = "lcov-reporter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Path to the LCOV report for the current commit.
    #[arg(long, env = "INPUT_LCOV-FILE", default_value = "./coverage/lcov.info")]
    lcov_file: PathBuf,

    /// Path to an LCOV report to compare against.
    // A String, since clap's path parser rejects the empty value of an unset input.
    #[arg(long, env = "INPUT_LCOV-BASE")]
    lcov_base: Option<String>,
}

impl From<InputArgs> for Inputs {
    fn from(args: InputArgs) -> Self {
        Inputs {
            lcov_file: args.lcov_file,
            lcov_base: non_empty(args.lcov_base).map(PathBuf::from),
        }
    }
}

/// Action inputs are exported as empty strings when unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Args)]
struct RenderArgs {
    /// Add function, branch and uncovered-line columns to the file table.
    #[arg(long, env = "INPUT_SHOW-DETAILS", value_parser = FalseyValueParser::new())]
    details: bool,

    /// Files below this line coverage are flagged red.
    #[arg(long, default_value_t = 50.0)]
    min_coverage: f64,

    /// Files at or above this line coverage are flagged green.
    #[arg(long, default_value_t = 80.0)]
    target_coverage: f64,
}

impl RenderArgs {
    fn apply(&self, options: &Options) -> RenderOptions {
        RenderOptions {
            show_details: self.details,
            thresholds: Thresholds {
                minimum: self.min_coverage,
                target: self.target_coverage,
            },
            ..RenderOptions::from_options(options)
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Diff a report against an optional base and print the result.
    Report {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Repository as `owner/name`, used for source links.
        #[arg(long, default_value = "")]
        repository: String,

        /// Path prefix stripped from report paths (e.g. the workspace root).
        #[arg(long, default_value = "")]
        prefix: String,

        /// Commit SHA the report belongs to.
        #[arg(long, default_value = "")]
        commit: String,

        /// Head ref name.
        #[arg(long)]
        head: Option<String>,

        /// Base ref name.
        #[arg(long)]
        base: Option<String>,

        /// Server URL for source links.
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server_url: String,

        /// Output format.
        #[arg(long, value_enum, default_value = "markdown")]
        format: Style,
    },

    /// Post the coverage report as a pull request or commit comment, using
    /// the GitHub Actions environment.
    Comment {
        #[command(flatten)]
        inputs: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Update the previous coverage comment instead of adding a new one.
        #[arg(
            long,
            env = "INPUT_OVERWRITE-EXISTING-COMMENT",
            value_parser = FalseyValueParser::new()
        )]
        overwrite_existing: bool,

        /// Token for the GitHub API (default: $GITHUB_TOKEN).
        #[arg(
            long,
            env = "INPUT_GITHUB-TOKEN",
            hide_env_values = true
        )]
        github_token: Option<String>,
    },

    /// Show aggregate totals for a single report.
    Summary {
        /// Path to the LCOV report.
        #[arg(default_value = "./coverage/lcov.info")]
        lcov_file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Report {
            inputs,
            render,
            repository,
            prefix,
            commit,
            head,
            base,
            server_url,
            format,
        } => {
            let options = Options {
                repository,
                prefix,
                commit,
                head,
                base,
                server_url,
            };
            let render = render.apply(&options);
            cli::cmd_report(&inputs.into(), &options, &render, format)?
        }
        Commands::Comment {
            inputs,
            render,
            overwrite_existing,
            github_token,
        } => {
            let ctx = github::Context::from_env(non_empty(github_token))
                .context("Failed to read GitHub Actions context")?;
            let render = render.apply(&ctx.options);
            cli::cmd_comment(&ctx, &inputs.into(), &render, overwrite_existing)?
        }
        Commands::Summary { lcov_file } => cli::cmd_summary(&lcov_file)?,
    };

    print!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTION_INPUTS: [&str; 4] = [
        "INPUT_LCOV-BASE",
        "INPUT_SHOW-DETAILS",
        "INPUT_OVERWRITE-EXISTING-COMMENT",
        "INPUT_GITHUB-TOKEN",
    ];

    // Environment variables are process-wide, so every case lives in one test.
    #[test]
    fn test_action_inputs_from_env() {
        for name in ACTION_INPUTS {
            std::env::set_var(name, "");
        }

        let cli = Cli::try_parse_from(["lcov-reporter", "report", "--lcov-file", "l.info"]).unwrap();
        let Commands::Report { inputs, render, .. } = cli.command else {
            panic!("expected report command");
        };
        assert!(!render.details);
        let inputs = Inputs::from(inputs);
        assert_eq!(inputs.lcov_file, PathBuf::from("l.info"));
        assert_eq!(inputs.lcov_base, None);

        let cli = Cli::try_parse_from(["lcov-reporter", "comment"]).unwrap();
        let Commands::Comment {
            inputs,
            render,
            overwrite_existing,
            github_token,
        } = cli.command
        else {
            panic!("expected comment command");
        };
        assert!(!render.details);
        assert!(!overwrite_existing);
        assert_eq!(non_empty(github_token), None);
        assert_eq!(Inputs::from(inputs).lcov_base, None);

        std::env::set_var("INPUT_LCOV-BASE", "base/lcov.info");
        std::env::set_var("INPUT_SHOW-DETAILS", "true");
        std::env::set_var("INPUT_OVERWRITE-EXISTING-COMMENT", "false");
        std::env::set_var("INPUT_GITHUB-TOKEN", "t0ken");

        let cli = Cli::try_parse_from(["lcov-reporter", "comment"]).unwrap();
        let Commands::Comment {
            inputs,
            render,
            overwrite_existing,
            github_token,
        } = cli.command
        else {
            panic!("expected comment command");
        };
        assert!(render.details);
        assert!(!overwrite_existing);
        assert_eq!(non_empty(github_token).as_deref(), Some("t0ken"));
        assert_eq!(
            Inputs::from(inputs).lcov_base,
            Some(PathBuf::from("base/lcov.info"))
        );

        // A flag on the command line wins over a falsey input.
        let cli =
            Cli::try_parse_from(["lcov-reporter", "comment", "--overwrite-existing"]).unwrap();
        let Commands::Comment {
            overwrite_existing, ..
        } = cli.command
        else {
            panic!("expected comment command");
        };
        assert!(overwrite_existing);

        for name in ACTION_INPUTS {
            std::env::remove_var(name);
        }
    }
}
