//! Text RPC protocol spoken by participants.
//!
//! Every command has the shape `aiwc.<name>("<key>"[, <payload>])`. Commands
//! arrive over a byte stream, so [`RpcFramer`] reassembles them from arbitrary
//! fragments before [`Rpc::parse`] turns each one into an [`RpcCommand`].

use crate::constants::NUMBER_OF_ROBOTS;
use log::warn;

pub const RPC_MARKER: &str = "aiwc.";

/// Upper bound on buffered bytes for a command that never closes.
pub const MAX_UNPROCESSED: usize = 64 * 1024;

/// Reassembles complete commands from a session's byte stream.
#[derive(Debug, Default)]
pub struct RpcFramer {
    unprocessed: String,
}

impl RpcFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text carried over from previous reads, marker included.
    pub fn unprocessed(&self) -> &str {
        &self.unprocessed
    }

    /// Appends `data` to the carried-over text and returns every complete
    /// command, oldest first.
    ///
    /// An incomplete trailing command (or a strict prefix of the marker) is
    /// kept for the next call. Text that does not start with the marker is
    /// logged and dropped together with the rest of the chunk.
    pub fn feed(&mut self, data: &str) -> Vec<String> {
        let mut buffer = std::mem::take(&mut self.unprocessed);
        buffer.push_str(data);

        let mut commands = Vec::new();
        let mut rest = buffer.as_str();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            if !rest.starts_with(RPC_MARKER) {
                if RPC_MARKER.starts_with(rest) {
                    self.unprocessed = rest.to_string();
                } else {
                    warn!("Dropping malformed input: {:?}", truncate(rest));
                }
                break;
            }

            match closing_paren(rest) {
                Some(end) => {
                    commands.push(rest[..=end].to_string());
                    rest = &rest[end + 1..];
                }
                None if rest.len() > MAX_UNPROCESSED => {
                    warn!("Dropping unterminated command of {} bytes", rest.len());
                    break;
                }
                None => {
                    self.unprocessed = rest.to_string();
                    break;
                }
            }
        }

        commands
    }
}

/// Byte index of the first `)` outside a quoted string.
fn closing_paren(fragment: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, c) in fragment.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ')' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(64) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcCommand {
    GetInfo,
    Ready,
    /// Left and right wheel linear speeds for every robot, in robot order.
    SetSpeeds(Vec<f64>),
    Commentate(String),
    Report(String),
    Invalid(String),
}

impl RpcCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RpcCommand::GetInfo => "get_info",
            RpcCommand::Ready => "ready",
            RpcCommand::SetSpeeds(_) => "set_speeds",
            RpcCommand::Commentate(_) => "commentate",
            RpcCommand::Report(_) => "report",
            RpcCommand::Invalid(_) => "invalid",
        }
    }
}

/// A command together with the key that authenticates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rpc {
    pub key: String,
    pub command: RpcCommand,
}

impl Rpc {
    pub fn new(key: impl Into<String>, command: RpcCommand) -> Self {
        Self {
            key: key.into(),
            command,
        }
    }

    pub fn parse(text: &str) -> Rpc {
        let invalid = |key: &str, reason: &str| Rpc::new(key, RpcCommand::Invalid(reason.to_string()));

        let Some(body) = text.trim().strip_prefix(RPC_MARKER) else {
            return invalid("", "missing marker");
        };
        let Some((name, args)) = body.split_once('(') else {
            return invalid("", "missing argument list");
        };
        let Some(args) = args.strip_suffix(')') else {
            return invalid("", "unterminated argument list");
        };
        let Some((key, payload)) = split_key(args) else {
            return invalid("", "missing key");
        };

        let command = match name.trim() {
            "get_info" => RpcCommand::GetInfo,
            "ready" => RpcCommand::Ready,
            "set_speeds" => match parse_speeds(payload) {
                Ok(speeds) => RpcCommand::SetSpeeds(speeds),
                Err(reason) => RpcCommand::Invalid(reason),
            },
            "commentate" => RpcCommand::Commentate(unquote(payload).to_string()),
            "report" => RpcCommand::Report(unquote(payload).to_string()),
            other => RpcCommand::Invalid(format!("unknown command {:?}", other)),
        };

        Rpc::new(key, command)
    }

    /// Wire form of the command; `None` for [`RpcCommand::Invalid`].
    pub fn encode(&self) -> Option<String> {
        let key = &self.key;
        let text = match &self.command {
            RpcCommand::GetInfo => format!("{RPC_MARKER}get_info(\"{key}\")"),
            RpcCommand::Ready => format!("{RPC_MARKER}ready(\"{key}\")"),
            RpcCommand::SetSpeeds(speeds) => {
                let values: Vec<String> = speeds.iter().map(|v| v.to_string()).collect();
                format!("{RPC_MARKER}set_speeds(\"{key}\", \"{}\")", values.join(","))
            }
            RpcCommand::Commentate(text) => format!("{RPC_MARKER}commentate(\"{key}\", \"{text}\")"),
            RpcCommand::Report(text) => format!("{RPC_MARKER}report(\"{key}\", \"{text}\")"),
            RpcCommand::Invalid(_) => return None,
        };
        Some(text)
    }
}

/// Splits `"key", payload` into the key and the trimmed payload.
fn split_key(args: &str) -> Option<(&str, &str)> {
    let args = args.trim_start().strip_prefix('"')?;
    let (key, rest) = args.split_once('"')?;
    let rest = rest.trim_start();
    let payload = rest.strip_prefix(',').unwrap_or(rest).trim();
    Some((key, payload))
}

fn unquote(payload: &str) -> &str {
    payload
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(payload)
}

fn parse_speeds(payload: &str) -> Result<Vec<f64>, String> {
    let speeds = unquote(payload)
        .split(',')
        .map(|v| unquote(v.trim()).trim().parse::<f64>())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|e| format!("bad wheel speed: {}", e))?;

    if speeds.len() != 2 * NUMBER_OF_ROBOTS {
        return Err(format!(
            "expected {} wheel speeds, got {}",
            2 * NUMBER_OF_ROBOTS,
            speeds.len()
        ));
    }
    if speeds.iter().any(|v| !v.is_finite()) {
        return Err("wheel speeds must be finite".to_string());
    }
    Ok(speeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speeds_command() -> &'static str {
        "aiwc.set_speeds(\"abc\", \"1,2,3,4,5,6,7,8,9,10\")"
    }

    #[test]
    fn test_single_complete_command() {
        let mut framer = RpcFramer::new();
        let commands = framer.feed("aiwc.get_info(\"abc\")");
        assert_eq!(commands, vec!["aiwc.get_info(\"abc\")".to_string()]);
        assert!(framer.unprocessed().is_empty());
    }

    #[test]
    fn test_concatenated_commands_in_order() {
        let mut framer = RpcFramer::new();
        let commands = framer.feed("aiwc.get_info(\"k\")aiwc.ready(\"k\")");
        assert_eq!(commands, vec!["aiwc.get_info(\"k\")", "aiwc.ready(\"k\")"]);
    }

    #[test]
    fn test_incomplete_command_is_carried() {
        let mut framer = RpcFramer::new();
        assert!(framer.feed("aiwc.ready(\"k\")aiwc.get_in").len() == 1);
        assert_eq!(framer.unprocessed(), "aiwc.get_in");

        let commands = framer.feed("fo(\"k\")");
        assert_eq!(commands, vec!["aiwc.get_info(\"k\")"]);
        assert!(framer.unprocessed().is_empty());
    }

    #[test]
    fn test_byte_by_byte_matches_single_read() {
        let text = format!("{}aiwc.commentate(\"abc\", \"nice :) shot\")", speeds_command());

        let mut whole = RpcFramer::new();
        let expected = whole.feed(&text);

        let mut framer = RpcFramer::new();
        let mut commands = Vec::new();
        for c in text.chars() {
            commands.extend(framer.feed(&c.to_string()));
        }

        assert_eq!(expected.len(), 2);
        assert_eq!(commands, expected);
    }

    #[test]
    fn test_malformed_chunk_is_dropped() {
        let mut framer = RpcFramer::new();
        assert!(framer.feed("hello aiwc.ready(\"k\")").is_empty());
        assert!(framer.unprocessed().is_empty());

        // The framer keeps working afterwards.
        assert_eq!(framer.feed("aiwc.ready(\"k\")").len(), 1);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Rpc::parse("aiwc.get_info(\"abc\")"), Rpc::new("abc", RpcCommand::GetInfo));
        assert_eq!(Rpc::parse("aiwc.ready(\"abc\")"), Rpc::new("abc", RpcCommand::Ready));
        assert_eq!(
            Rpc::parse("aiwc.commentate(\"abc\", \"Goal!\")"),
            Rpc::new("abc", RpcCommand::Commentate("Goal!".to_string()))
        );
        assert_eq!(
            Rpc::parse("aiwc.report(\"abc\", \"Final: 2-1\")"),
            Rpc::new("abc", RpcCommand::Report("Final: 2-1".to_string()))
        );
    }

    #[test]
    fn test_parse_speeds_quoted_and_bare() {
        let quoted = Rpc::parse(speeds_command());
        let bare = Rpc::parse("aiwc.set_speeds(\"abc\", 1, 2, 3, 4, 5, 6, 7, 8, 9, 10)");
        let expected: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(quoted.command, RpcCommand::SetSpeeds(expected.clone()));
        assert_eq!(bare.command, RpcCommand::SetSpeeds(expected));
    }

    #[test]
    fn test_parse_invalid_commands() {
        let short = Rpc::parse("aiwc.set_speeds(\"abc\", \"1,2,3\")");
        assert_eq!(short.key, "abc");
        assert!(matches!(short.command, RpcCommand::Invalid(_)));

        let unknown = Rpc::parse("aiwc.dance(\"abc\")");
        assert!(matches!(unknown.command, RpcCommand::Invalid(_)));

        let keyless = Rpc::parse("aiwc.ready()");
        assert!(keyless.key.is_empty());
        assert!(matches!(keyless.command, RpcCommand::Invalid(_)));
    }

    #[test]
    fn test_encoded_commands_parse_back() {
        let speeds = vec![0.5, -0.5, 1.25, 0.0, 2.0, 2.0, -1.0, 1.0, 0.1, 0.2];
        let rpc = Rpc::new("key", RpcCommand::SetSpeeds(speeds));
        let text = rpc.encode().unwrap();
        assert_eq!(Rpc::parse(&text), rpc);
        assert!(Rpc::new("key", RpcCommand::Invalid("x".into())).encode().is_none());
    }
}
