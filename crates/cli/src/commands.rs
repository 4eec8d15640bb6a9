//! Command-line surface: parsing `listing-dash <command> [args]` into a
//! typed [`Command`], plus the interactive payment-method prompt.

use std::str::FromStr;

use async_trait::async_trait;
use listing_dash_domain::{
    ConfigValueType, CorrectionDecision, CorrectionPrompt, ListingForm, ListingKind, MessageRef,
    PaymentMethodReport,
};
use serde_json::Value;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum CommandName {
    Whoami,
    LoginUrl,
    Logout,
    Dashboard,
    Listings,
    Unlist,
    Config,
    ConfigSet,
    AuthActions,
    Verify,
    SellerListings,
    SellerConfig,
    SellerList,
    SellerSync,
    Shop,
    Vouches,
    Ticket,
    ResolveBot,
}

impl CommandName {
    fn label(self) -> &'static str {
        self.into()
    }

    fn arguments(self) -> &'static str {
        match self {
            CommandName::Whoami
            | CommandName::Logout
            | CommandName::SellerListings
            | CommandName::SellerConfig
            | CommandName::SellerSync => "",
            CommandName::LoginUrl => "<redirect>",
            CommandName::Dashboard
            | CommandName::Listings
            | CommandName::Config
            | CommandName::Shop
            | CommandName::Ticket => "<bot>",
            CommandName::AuthActions => "<bot> [--all] [--type <action_type>]",
            CommandName::Unlist => "<bot> <channel_id> <message_id>",
            CommandName::ConfigSet => "<bot> <key> <type> <value>",
            CommandName::Verify => "<bot> <action_id>",
            CommandName::SellerList => {
                "<account|profile|alt> <username> <price> [--info <text>] [--profile <name>] \
                 [--hide-ign] [--no-farming] [--mining]"
            }
            CommandName::Vouches => "<bot> [seller]",
            CommandName::ResolveBot => "<host> [path]",
        }
    }
}

/// A fully parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Whoami,
    LoginUrl { redirect: String },
    Logout,
    Dashboard { bot: String },
    Listings { bot: String },
    Unlist { bot: String, message: MessageRef },
    Config { bot: String },
    ConfigSet {
        bot: String,
        key: String,
        value: Value,
    },
    AuthActions {
        bot: String,
        show_resolved: bool,
        action_type: Option<String>,
    },
    Verify { bot: String, action_id: String },
    SellerListings,
    SellerConfig,
    SellerList { form: ListingForm },
    SellerSync,
    Shop { bot: String },
    Vouches { bot: String, seller: Option<String> },
    Ticket { bot: String },
    ResolveBot { host: String, path: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("no command given")]
    MissingCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{command}` expects {arguments}")]
    MissingArgument {
        command: &'static str,
        arguments: &'static str,
    },
    #[error("unexpected argument `{0}`")]
    UnexpectedArgument(String),
    #[error("invalid {what} `{value}`")]
    InvalidValue { what: String, value: String },
    #[error("`{key}` is not an option of this bot")]
    UnknownOption { key: String },
}

/// Positional arguments left after the command name.
struct Args<'a> {
    name: CommandName,
    rest: std::slice::Iter<'a, String>,
}

impl Args<'_> {
    fn required(&mut self) -> Result<String, UsageError> {
        self.rest.next().cloned().ok_or(UsageError::MissingArgument {
            command: self.name.label(),
            arguments: self.name.arguments(),
        })
    }

    fn optional(&mut self) -> Option<String> {
        self.rest.next().cloned()
    }

    fn finish(mut self) -> Result<(), UsageError> {
        match self.rest.next() {
            Some(extra) => Err(UsageError::UnexpectedArgument(extra.clone())),
            None => Ok(()),
        }
    }
}

impl Command {
    /// Parses the arguments following the binary name.
    pub fn parse(argv: &[String]) -> Result<Self, UsageError> {
        let Some((first, rest)) = argv.split_first() else {
            return Err(UsageError::MissingCommand);
        };
        if matches!(first.as_str(), "help" | "--help" | "-h") {
            return Ok(Command::Help);
        }
        let name = CommandName::from_str(first)
            .map_err(|_| UsageError::UnknownCommand(first.clone()))?;
        let mut args = Args {
            name,
            rest: rest.iter(),
        };

        let command = match name {
            CommandName::Whoami => Command::Whoami,
            CommandName::LoginUrl => Command::LoginUrl {
                redirect: args.required()?,
            },
            CommandName::Logout => Command::Logout,
            CommandName::Dashboard => Command::Dashboard {
                bot: args.required()?,
            },
            CommandName::Listings => Command::Listings {
                bot: args.required()?,
            },
            CommandName::Unlist => Command::Unlist {
                bot: args.required()?,
                message: MessageRef {
                    channel_id: args.required()?,
                    message_id: args.required()?,
                },
            },
            CommandName::Config => Command::Config {
                bot: args.required()?,
            },
            CommandName::ConfigSet => {
                let bot = args.required()?;
                let key = args.required()?;
                let kind = args.required()?;
                let raw = args.required()?;
                let kind = ConfigValueType::from_str(&kind).map_err(|_| UsageError::InvalidValue {
                    what: "option type".into(),
                    value: kind,
                })?;
                Command::ConfigSet {
                    bot,
                    key,
                    value: parse_config_value(kind, &raw)?,
                }
            }
            CommandName::AuthActions => {
                let bot = args.required()?;
                let mut show_resolved = false;
                let mut action_type = None;
                while let Some(flag) = args.optional() {
                    match flag.as_str() {
                        "--all" => show_resolved = true,
                        "--type" => action_type = Some(args.required()?),
                        _ => return Err(UsageError::UnexpectedArgument(flag)),
                    }
                }
                Command::AuthActions {
                    bot,
                    show_resolved,
                    action_type,
                }
            }
            CommandName::Verify => Command::Verify {
                bot: args.required()?,
                action_id: args.required()?,
            },
            CommandName::SellerListings => Command::SellerListings,
            CommandName::SellerConfig => Command::SellerConfig,
            CommandName::SellerList => Command::SellerList {
                form: parse_listing_form(&mut args)?,
            },
            CommandName::SellerSync => Command::SellerSync,
            CommandName::Shop => Command::Shop {
                bot: args.required()?,
            },
            CommandName::Vouches => Command::Vouches {
                bot: args.required()?,
                seller: args.optional(),
            },
            CommandName::Ticket => Command::Ticket {
                bot: args.required()?,
            },
            CommandName::ResolveBot => Command::ResolveBot {
                host: args.required()?,
                path: args.optional().unwrap_or_else(|| "/".to_string()),
            },
        };
        args.finish()?;
        Ok(command)
    }
}

fn parse_listing_form(args: &mut Args<'_>) -> Result<ListingForm, UsageError> {
    let kind = args.required()?;
    let kind = ListingKind::from_str(&kind).map_err(|_| UsageError::InvalidValue {
        what: "listing type".into(),
        value: kind,
    })?;
    let mut form = ListingForm {
        kind,
        username: args.required()?,
        price: args.required()?,
        ..ListingForm::default()
    };
    while let Some(flag) = args.optional() {
        match flag.as_str() {
            "--info" => form.additional_information = args.required()?,
            "--profile" => form.profile = args.required()?,
            "--hide-ign" => form.show_ign = false,
            "--no-farming" => form.farming = false,
            "--mining" => form.mining = true,
            _ => return Err(UsageError::UnexpectedArgument(flag)),
        }
    }
    Ok(form)
}

/// Turns command-line text into the JSON value staged for an option.
/// `null` clears any option.
pub fn parse_config_value(kind: ConfigValueType, raw: &str) -> Result<Value, UsageError> {
    let raw = raw.trim();
    if raw == "null" {
        return Ok(Value::Null);
    }
    let invalid = || UsageError::InvalidValue {
        what: kind.as_ref().to_string(),
        value: raw.to_string(),
    };
    match kind {
        ConfigValueType::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        ConfigValueType::Int => raw.parse::<i64>().map(Value::from).map_err(|_| invalid()),
        ConfigValueType::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Value::from)
            .ok_or_else(invalid),
        ConfigValueType::TextChannel | ConfigValueType::CategoryChannel | ConfigValueType::Role => {
            if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(invalid())
            }
        }
        ConfigValueType::Str | ConfigValueType::Unknown => Ok(Value::String(raw.to_string())),
    }
}

pub fn usage() -> String {
    let mut text = String::from("usage: listing-dash <command> [args]\n\ncommands:\n");
    for name in CommandName::iter() {
        let arguments = name.arguments();
        if arguments.is_empty() {
            text.push_str(&format!("  {}\n", name.as_ref()));
        } else {
            text.push_str(&format!("  {} {}\n", name.as_ref(), arguments));
        }
    }
    text
}

/// Asks on stderr/stdin whether to replace unsupported payment methods
/// with the suggested list. Anything but an explicit "n" accepts.
pub struct StdinPrompt;

#[async_trait]
impl CorrectionPrompt for StdinPrompt {
    async fn decide(&self, report: &PaymentMethodReport) -> CorrectionDecision {
        let question = format!(
            "Unsupported payment methods: {}\nUse \"{}\" instead? [Y/n] ",
            report.invalid.join(", "),
            report.suggested_string()
        );
        ask(&question, &mut tokio::io::stderr(), BufReader::new(tokio::io::stdin())).await
    }
}

/// Writes `question` to `out` and reads one answer line. Any I/O failure
/// keeps the valid methods.
async fn ask<W, R>(question: &str, out: &mut W, input: R) -> CorrectionDecision
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
{
    let written = match out.write_all(question.as_bytes()).await {
        Ok(()) => out.flush().await,
        Err(err) => Err(err),
    };
    if let Err(err) = written {
        warn!(error = %err, "cannot show payment method prompt");
        return CorrectionDecision::KeepValid;
    }

    match input.lines().next_line().await {
        Ok(Some(answer)) => decision_for(&answer),
        _ => CorrectionDecision::KeepValid,
    }
}

fn decision_for(answer: &str) -> CorrectionDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "n" | "no" => CorrectionDecision::KeepValid,
        _ => CorrectionDecision::AcceptSuggested,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io,
        pin::Pin,
        task::{Context, Poll},
    };

    use super::*;

    /// Accepts writes but fails every flush.
    struct BrokenFlush;

    impl AsyncWrite for BrokenFlush {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed")))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn prompt_reads_the_answer() {
        let mut out = Vec::new();
        let decision = ask("Use paypal? ", &mut out, &b"y\n"[..]).await;
        assert_eq!(decision, CorrectionDecision::AcceptSuggested);
        assert_eq!(out, b"Use paypal? ");

        let decision = ask("Use paypal? ", &mut Vec::new(), &b"No\n"[..]).await;
        assert_eq!(decision, CorrectionDecision::KeepValid);
    }

    #[tokio::test]
    async fn failed_flush_keeps_valid_methods() {
        let decision = ask("Use paypal? ", &mut BrokenFlush, &b"y\n"[..]).await;
        assert_eq!(decision, CorrectionDecision::KeepValid);
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_bot_commands() {
        assert_eq!(
            Command::parse(&argv(&["unlist", "alpha", "100", "200"])).unwrap(),
            Command::Unlist {
                bot: "alpha".into(),
                message: MessageRef {
                    channel_id: "100".into(),
                    message_id: "200".into(),
                },
            }
        );
        assert_eq!(
            Command::parse(&argv(&["auth-actions", "alpha", "--all"])).unwrap(),
            Command::AuthActions {
                bot: "alpha".into(),
                show_resolved: true,
                action_type: None,
            }
        );
        assert_eq!(
            Command::parse(&argv(&["resolve-bot", "accounts.example.com"])).unwrap(),
            Command::ResolveBot {
                host: "accounts.example.com".into(),
                path: "/".into(),
            }
        );
    }

    #[test]
    fn config_values_follow_the_declared_type() {
        assert_eq!(
            Command::parse(&argv(&["config-set", "alpha", "max_listings", "int", "25"])).unwrap(),
            Command::ConfigSet {
                bot: "alpha".into(),
                key: "max_listings".into(),
                value: Value::from(25),
            }
        );
        assert_eq!(
            parse_config_value(ConfigValueType::Bool, "off").unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            parse_config_value(ConfigValueType::Role, "null").unwrap(),
            Value::Null
        );
        assert!(matches!(
            parse_config_value(ConfigValueType::TextChannel, "general"),
            Err(UsageError::InvalidValue { .. })
        ));
        assert!(parse_config_value(ConfigValueType::Float, "NaN").is_err());
    }

    #[test]
    fn seller_list_flags_fill_the_form() {
        let Command::SellerList { form } = Command::parse(&argv(&[
            "seller-list",
            "ALT",
            "Notch",
            "12",
            "--no-farming",
            "--mining",
        ]))
        .unwrap() else {
            panic!("expected seller-list");
        };
        assert_eq!(form.kind, ListingKind::Alt);
        assert_eq!(form.username, "Notch");
        assert!(!form.farming);
        assert!(form.mining);
    }

    #[test]
    fn reports_usage_problems() {
        assert_eq!(Command::parse(&[]), Err(UsageError::MissingCommand));
        assert_eq!(
            Command::parse(&argv(&["frobnicate"])),
            Err(UsageError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(
            Command::parse(&argv(&["verify", "alpha"])),
            Err(UsageError::MissingArgument {
                command: "verify",
                arguments: "<bot> <action_id>",
            })
        );
        assert_eq!(
            Command::parse(&argv(&["whoami", "extra"])),
            Err(UsageError::UnexpectedArgument("extra".into()))
        );
        assert_eq!(Command::parse(&argv(&["--help"])), Ok(Command::Help));
    }

    #[test]
    fn usage_lists_every_command() {
        let text = usage();
        for name in CommandName::iter() {
            assert!(text.contains(name.as_ref()));
        }
    }

    #[test]
    fn prompt_answers() {
        assert_eq!(decision_for(""), CorrectionDecision::AcceptSuggested);
        assert_eq!(decision_for(" N "), CorrectionDecision::KeepValid);
        assert_eq!(decision_for("yes"), CorrectionDecision::AcceptSuggested);
    }
}
