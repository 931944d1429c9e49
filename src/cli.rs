// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fleetq",
    version,
    about = "Run a shell command on many hosts at once and extract structured results",
    long_about = "fleetq runs one shell command on every target host in parallel over the system ssh client,\nthen interprets each host's output: raw lines, membership checks, key/value extraction or validation.\nHosts come from -H or from a group in the configuration file.",
    after_help = "EXAMPLES:\n  List matching packages:      fleetq -H ap01,ap02 lines --keyword glibc --startswith -- apt list\n  Check process states:        fleetq -g web contains --value running --value stopped -- cat /run/status\n  Validate key/value output:   fleetq -g web validate-kv --expect thread=enable --expect status=OK -- app-status\n  Run as root:                 fleetq -g db -u root dict -- cat /etc/os-release\n\nExit codes: 0 (all hosts succeeded and validations held), 1 (otherwise)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'H',
        long,
        value_delimiter = ',',
        help = "Comma-separated list of hosts in [user@]hostname[:port] format"
    )]
    pub hosts: Option<Vec<String>>,

    #[arg(short = 'g', long, help = "Host group name from configuration file")]
    pub group: Option<String>,

    #[arg(
        long,
        help = "Configuration file path\nConfig loading priority:\n  1. This flag's value\n  2. Current directory (./fleetq.yaml)\n  3. $XDG_CONFIG_HOME/fleetq/config.yaml\n  4. ~/.config/fleetq/config.yaml"
    )]
    pub config: Option<PathBuf>,

    #[arg(short = 'l', long, help = "Login user for hosts that do not name one")]
    pub login: Option<String>,

    #[arg(short = 'i', long, help = "SSH private key file path")]
    pub identity: Option<PathBuf>,

    #[arg(
        short = 'u',
        long,
        help = "Run the command as this user through sudo (prompts for the sudo password once)\nOverrides sudo_user from the configuration file"
    )]
    pub sudo_user: Option<String>,

    #[arg(
        long,
        conflicts_with = "sudo_user",
        help = "Run without sudo even when the configuration sets sudo_user"
    )]
    pub no_sudo: bool,

    #[arg(short = 'p', long, help = "Maximum parallel hosts [default: 10]")]
    pub parallel: Option<usize>,

    #[arg(
        long,
        help = "Per-host command timeout in seconds, 0 for unlimited [default: 300]"
    )]
    pub timeout: Option<u64>,

    #[arg(long, help = "SSH connection timeout in seconds [default: 10]")]
    pub connect_timeout: Option<u64>,

    #[arg(
        long,
        help = "Interpret output even when the command exits with a non-zero status"
    )]
    pub warn_only: bool,

    #[arg(long, help = "Show per-host progress and echo raw output")]
    pub show_output: bool,

    #[arg(long, help = "Print results as JSON")]
    pub json: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Print each host's output lines",
        long_about = "Prints each host's trimmed, non-empty output lines.\nWith --keyword/--exclude the command is piped through an egrep filter first."
    )]
    Lines {
        #[command(flatten)]
        filter: FilterArgs,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(about = "Report whether each value occurs in each host's output")]
    Contains {
        #[arg(long = "value", required = true, help = "Value to look for (repeatable)")]
        values: Vec<String>,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(
        about = "Extract values from key<delimiter>value lines",
        long_about = "Selects lines that start with KEY or contain the delimiter and prints the text after the first delimiter."
    )]
    Values {
        #[arg(long, help = "Key prefix selecting lines")]
        key: String,

        #[arg(long, default_value = ":", help = "Key/value delimiter")]
        delimiter: String,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(about = "Build a key/value map from each host's output")]
    Dict {
        #[arg(long, default_value = ":", help = "Key/value delimiter")]
        delimiter: String,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(
        about = "Check that every line matching KEY also matches VALUE",
        long_about = "KEY and VALUE are regular expressions searched anywhere in a line.\nA host with no line matching KEY passes."
    )]
    Validate {
        #[arg(long, help = "Regular expression selecting lines")]
        key: String,

        #[arg(long, help = "Regular expression every selected line must match")]
        value: String,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(
        name = "validate-kv",
        about = "Check expected values for several keys",
        long_about = "For each line naming exactly one expected key, checks that the expected value appears on that line.\nKeys that never appear are not reported."
    )]
    ValidateKv {
        #[arg(
            long = "expect",
            required = true,
            value_parser = parse_key_value,
            help = "Expected KEY=VALUE pair (repeatable)"
        )]
        expect: Vec<(String, String)>,

        #[arg(required = true, trailing_var_arg = true, help = "Command to execute")]
        command: Vec<String>,
    },

    #[command(about = "Print the egrep filter built from keywords and exclusions")]
    Egrep {
        #[command(flatten)]
        filter: FilterArgs,
    },

    #[command(about = "List host groups from the configuration file")]
    Groups,
}

/// Keyword and exclusion patterns for an egrep filter.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(short = 'k', long = "keyword", help = "Keep lines matching this pattern (repeatable)")]
    pub keywords: Vec<String>,

    #[arg(short = 'x', long = "exclude", help = "Drop lines matching this pattern (repeatable)")]
    pub excludes: Vec<String>,

    #[arg(long, help = "Anchor every pattern to the start of the line")]
    pub startswith: bool,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.excludes.is_empty()
    }
}

impl Cli {
    /// Command text from trailing arguments, joined with spaces.
    pub fn command_text(parts: &[String]) -> String {
        parts.join(" ")
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_and_subcommand() {
        let cli = Cli::try_parse_from([
            "fleetq", "-H", "ap01,ap02", "-u", "root", "-p", "4", "--json", "dict", "--",
            "cat", "/etc/os-release",
        ])
        .unwrap();

        assert_eq!(cli.hosts, Some(vec!["ap01".to_string(), "ap02".to_string()]));
        assert_eq!(cli.sudo_user.as_deref(), Some("root"));
        assert_eq!(cli.parallel, Some(4));
        assert!(cli.json);
        match cli.command {
            Commands::Dict { delimiter, command } => {
                assert_eq!(delimiter, ":");
                assert_eq!(Cli::command_text(&command), "cat /etc/os-release");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_lines_filter() {
        let cli = Cli::try_parse_from([
            "fleetq", "-g", "web", "lines", "-k", "libxml2", "-k", "nss", "-x", "python",
            "--startswith", "apt", "list",
        ])
        .unwrap();

        match cli.command {
            Commands::Lines { filter, command } => {
                assert_eq!(filter.keywords, vec!["libxml2", "nss"]);
                assert_eq!(filter.excludes, vec!["python"]);
                assert!(filter.startswith);
                assert_eq!(command, vec!["apt", "list"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_validate_kv() {
        let cli = Cli::try_parse_from([
            "fleetq", "-H", "ap01", "validate-kv", "--expect", "thread=enable", "--expect",
            "status=OK", "--", "app-status",
        ])
        .unwrap();

        match cli.command {
            Commands::ValidateKv { expect, command } => {
                assert_eq!(
                    expect,
                    vec![
                        ("thread".to_string(), "enable".to_string()),
                        ("status".to_string(), "OK".to_string())
                    ]
                );
                assert_eq!(command, vec!["app-status"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["fleetq", "-H", "ap01", "dict"]).is_err());
    }
}
