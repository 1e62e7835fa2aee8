mod commands;

use clap::error::ErrorKind;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lessmsi::ExtractionMode;
use std::ffi::OsString;
use std::path::PathBuf;

// ========================================================================= //

const EXIT_SUCCESS: i32 = 0;
const EXIT_UNEXPECTED_ERROR: i32 = -1;
const EXIT_INVALID_OPTION: i32 = -2;
const EXIT_UNRECOGNIZED_COMMAND: i32 = -3;

const HELP: &str = "\
Usage:
lessmsi <command> [options] <msi_name> [<path_to_extract\\>] [file_names]

Commands:
  x    Extracts all or specified files from the specified msi_name.
  xo   Like x, but overwrites files with the same name instead of adding a
       .duplicateN suffix.
  xfo  Extracts all or specified files from the specified msi_name to the
       same folder while overwriting files with the same name.
  xfr  Extracts all or specified files from the specified msi_name to the
       same folder while renaming files with the same name with a count
       suffix.
  l    Lists the contents of the specified msi table as CSV to stdout. Table
       is specified with -t switch. Example: lessmsi l -t Component foo.msi
  v    Lists the value of the ProductVersion Property in the msi
       (typically this is the version of the MSI).
  i    Lists the summary information of the msi.
  o    Opens the specified msi_name in the GUI.
  h    Shows this help page.

Options:
  -v   Logs more detail to stderr (-vv for even more). RUST_LOG also works.
";

// ========================================================================= //

fn main() {
    std::process::exit(run(std::env::args_os()));
}

fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match cli().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(error) => return report_usage_error(&error),
    };
    init_logging(matches.get_count("verbose"));
    match dispatch(&matches) {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            log::debug!("{error:?}");
            show_help(Some(&format!("{error:#}")));
            EXIT_UNEXPECTED_ERROR
        }
    }
}

fn cli() -> Command {
    let extract = |name: &'static str, about: &'static str| {
        Command::new(name)
            .about(about)
            .arg(
                Arg::new("msi")
                    .required(true)
                    .value_parser(value_parser!(PathBuf)),
            )
            .arg(Arg::new("rest").num_args(0..).value_name("FILE"))
    };
    let package_arg = || {
        Arg::new("msi").required(true).value_parser(value_parser!(PathBuf))
    };
    Command::new("lessmsi")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Views and extracts the contents of Windows Installer files")
        .override_help(HELP)
        .subcommand_required(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            extract("x", "Extracts preserving directories").alias("/x"),
        )
        .subcommand(extract("xo", "Extracts overwriting duplicates"))
        .subcommand(extract("xfo", "Extracts flat, overwriting duplicates"))
        .subcommand(extract("xfr", "Extracts flat, renaming duplicates"))
        .subcommand(
            Command::new("l")
                .about("Lists a table as CSV")
                .arg(
                    Arg::new("table")
                        .short('t')
                        .required(true)
                        .value_name("TABLE"),
                )
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("v")
                .about("Prints the ProductVersion property")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("i")
                .about("Prints the summary information")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("o")
                .about("Opens the package in the GUI")
                .arg(package_arg()),
        )
        .subcommand(Command::new("h").about("Shows help"))
}

fn dispatch(matches: &ArgMatches) -> anyhow::Result<()> {
    let Some((name, submatches)) = matches.subcommand() else {
        show_help(None);
        return Ok(());
    };
    let package = || {
        submatches.get_one::<PathBuf>("msi").cloned().unwrap_or_default()
    };
    match name {
        "x" | "xo" | "xfo" | "xfr" => {
            let mode: ExtractionMode =
                name.parse().map_err(anyhow::Error::msg)?;
            let rest: Vec<String> = submatches
                .get_many::<String>("rest")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            commands::extract(&package(), &rest, mode)
        }
        "l" => {
            let table = submatches
                .get_one::<String>("table")
                .map(String::as_str)
                .unwrap_or_default();
            commands::list_table(&package(), table)
        }
        "v" => commands::show_version(&package()),
        "i" => commands::show_info(&package()),
        "o" => anyhow::bail!(
            "Cannot open {}: this build of lessmsi has no GUI",
            package().display()
        ),
        _ => {
            show_help(None);
            Ok(())
        }
    }
}

// ========================================================================= //

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level),
    )
    .format_timestamp(None)
    .try_init();
}

fn exit_code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
        ErrorKind::InvalidSubcommand
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            EXIT_UNRECOGNIZED_COMMAND
        }
        _ => EXIT_INVALID_OPTION,
    }
}

fn report_usage_error(error: &clap::Error) -> i32 {
    let code = exit_code_for(error.kind());
    match code {
        EXIT_SUCCESS => {
            let _ = error.print();
        }
        EXIT_UNRECOGNIZED_COMMAND => show_help(Some("Unrecognized command")),
        _ => show_help(Some(&first_line(error))),
    }
    code
}

fn first_line(error: &clap::Error) -> String {
    let rendered = error.to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.trim_start_matches("error: ").to_string()
}

fn show_help(error_message: Option<&str>) {
    match error_message {
        Some(message) if !message.is_empty() => {
            eprintln!("\nError: {message}\n");
            eprintln!("{HELP}");
        }
        _ => println!("{HELP}"),
    }
}

// ========================================================================= //

#[cfg(test)]
mod tests {
    use super::{
        cli, exit_code_for, run, EXIT_INVALID_OPTION, EXIT_SUCCESS,
        EXIT_UNRECOGNIZED_COMMAND,
    };
    use std::path::PathBuf;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn slash_x_is_an_alias_for_x() {
        let matches = cli()
            .try_get_matches_from(["lessmsi", "/x", "setup.msi", "out\\"])
            .unwrap();
        let (name, submatches) = matches.subcommand().unwrap();
        assert_eq!(name, "x");
        assert_eq!(
            submatches.get_one::<PathBuf>("msi"),
            Some(&PathBuf::from("setup.msi"))
        );
    }

    #[test]
    fn verbosity_counts() {
        let matches = cli()
            .try_get_matches_from(["lessmsi", "-vv", "v", "setup.msi"])
            .unwrap();
        assert_eq!(matches.get_count("verbose"), 2);
    }

    #[test]
    fn list_requires_table() {
        let error = cli()
            .try_get_matches_from(["lessmsi", "l", "setup.msi"])
            .unwrap_err();
        assert_eq!(exit_code_for(error.kind()), EXIT_INVALID_OPTION);
    }

    #[test]
    fn unknown_command_exit_code() {
        assert_eq!(run(["lessmsi", "frobnicate"]), EXIT_UNRECOGNIZED_COMMAND);
        assert_eq!(run(["lessmsi"]), EXIT_UNRECOGNIZED_COMMAND);
    }

    #[test]
    fn help_exit_code() {
        assert_eq!(run(["lessmsi", "h"]), EXIT_SUCCESS);
        assert_eq!(run(["lessmsi", "x"]), EXIT_INVALID_OPTION);
    }
}

// ========================================================================= //
