//! Admin command parsing
//!
//! Every input maps to either a typed `Command` or a `UsageHelp`; parsing
//! never fails.

use deji_messaging::channel_for_address;

use super::intent::COMMAND_MARKER;

/// Threshold used by `#lowstock` when none is given
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `#deliver all`
    DeliverAll,
    /// `#deliver <invoiceId>`
    DeliverOne(i64),
    /// `#lowstock [threshold]`
    LowStock { threshold: i32 },
    /// `#invoice <id> send <address>`
    InvoiceSend { invoice_id: i64, address: String },
    /// `#ledger balance`
    LedgerBalance,
}

/// Help returned for unknown verbs or malformed arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageHelp {
    Deliver,
    LowStock,
    Invoice,
    Ledger,
    Unknown,
}

impl UsageHelp {
    pub fn message(&self) -> &'static str {
        match self {
            UsageHelp::Deliver => "Usage: #deliver all | #deliver <invoiceId>",
            UsageHelp::LowStock => "Usage: #lowstock [threshold]",
            UsageHelp::Invoice => "Usage: #invoice <id> send <phone|email>",
            UsageHelp::Ledger => "Usage: #ledger balance",
            UsageHelp::Unknown => {
                "🤖 Unknown command. Try: #deliver all | #lowstock | #invoice <id> send <phone> | #ledger balance"
            }
        }
    }
}

impl Command {
    pub fn parse(text: &str) -> Result<Command, UsageHelp> {
        let mut tokens = text.split_whitespace();
        let verb = tokens
            .next()
            .and_then(|t| t.strip_prefix(COMMAND_MARKER))
            .map(str::to_ascii_lowercase)
            .ok_or(UsageHelp::Unknown)?;
        let args: Vec<&str> = tokens.collect();

        match verb.as_str() {
            "deliver" => match args.first() {
                Some(arg) if arg.eq_ignore_ascii_case("all") => Ok(Command::DeliverAll),
                Some(arg) => parse_id(arg)
                    .map(Command::DeliverOne)
                    .ok_or(UsageHelp::Deliver),
                None => Err(UsageHelp::Deliver),
            },
            "lowstock" => match args.first() {
                None => Ok(Command::LowStock {
                    threshold: DEFAULT_LOW_STOCK_THRESHOLD,
                }),
                Some(arg) => arg
                    .parse::<i32>()
                    .ok()
                    .filter(|t| *t >= 0)
                    .map(|threshold| Command::LowStock { threshold })
                    .ok_or(UsageHelp::LowStock),
            },
            "invoice" => match args.as_slice() {
                [id, send, address]
                    if send.eq_ignore_ascii_case("send")
                        && channel_for_address(address).is_some() =>
                {
                    parse_id(id)
                        .map(|invoice_id| Command::InvoiceSend {
                            invoice_id,
                            address: address.to_string(),
                        })
                        .ok_or(UsageHelp::Invoice)
                }
                _ => Err(UsageHelp::Invoice),
            },
            "ledger" => match args.first() {
                Some(arg) if arg.eq_ignore_ascii_case("balance") => Ok(Command::LedgerBalance),
                _ => Err(UsageHelp::Ledger),
            },
            _ => Err(UsageHelp::Unknown),
        }
    }

    /// True for commands that change stored data or send messages
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::DeliverAll | Command::DeliverOne(_) | Command::InvoiceSend { .. }
        )
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim_start_matches('#').parse::<i64>().ok().filter(|id| *id > 0)
}
