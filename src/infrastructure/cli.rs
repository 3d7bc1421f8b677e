use std::{fmt, str::FromStr};

use clap::Parser;

use crate::{domain::sequence_index::SequenceIndex, utils::version};

/// Replay a scripted session against an in-memory conversation
#[derive(Parser, Debug)]
#[command(author, version = version(), about)]
pub struct Cli {
    /// Number of messages the conversation starts with
    #[arg(short, long, value_name = "COUNT", default_value_t = 60)]
    pub messages: usize,

    /// Index of the oldest message; any number of digits is accepted
    #[arg(short, long, value_name = "INDEX", default_value = "1")]
    pub base_index: SequenceIndex,

    /// Last read index reported by the backend
    #[arg(short, long, value_name = "INDEX")]
    pub read_index: Option<SequenceIndex>,

    /// Size of the page the session opens with
    #[arg(long, value_name = "COUNT", default_value_t = 20)]
    pub initial_page: u32,

    /// Comma separated steps: prev, next, eager, eager!, silent, push:K,
    /// passive:INDEX, read:INDEX, fail[:N], clear
    #[arg(short, long, value_delimiter = ',', default_value = "prev,eager")]
    pub script: Vec<ScriptStep>,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,
}

/// One command of a replay script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Prev,
    Next,
    Eager,
    /// Refetch the latest page even when nothing newer is known
    EagerForce,
    Silent,
    /// Append messages to the conversation and push the new end index
    Push(usize),
    Passive(SequenceIndex),
    Read(SequenceIndex),
    /// Make the next fetches fail
    Fail(usize),
    Clear,
}

impl FromStr for ScriptStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let index = |arg: Option<&str>| {
            arg.and_then(SequenceIndex::parse)
                .ok_or_else(|| format!("{name} needs an index, e.g. {name}:42"))
        };
        let count = |arg: Option<&str>, default: Option<usize>| match arg {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| format!("invalid count {raw:?} for {name}: {e}")),
            None => default.ok_or_else(|| format!("{name} needs a count, e.g. {name}:3")),
        };

        match name {
            "prev" => Ok(ScriptStep::Prev),
            "next" => Ok(ScriptStep::Next),
            "eager" => Ok(ScriptStep::Eager),
            "eager!" => Ok(ScriptStep::EagerForce),
            "silent" => Ok(ScriptStep::Silent),
            "clear" => Ok(ScriptStep::Clear),
            "push" => count(arg, None).map(ScriptStep::Push),
            "fail" => count(arg, Some(1)).map(ScriptStep::Fail),
            "passive" => index(arg).map(ScriptStep::Passive),
            "read" => index(arg).map(ScriptStep::Read),
            _ => Err(format!("unknown step {s:?}")),
        }
    }
}

impl fmt::Display for ScriptStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStep::Prev => write!(f, "prev"),
            ScriptStep::Next => write!(f, "next"),
            ScriptStep::Eager => write!(f, "eager"),
            ScriptStep::EagerForce => write!(f, "eager!"),
            ScriptStep::Silent => write!(f, "silent"),
            ScriptStep::Push(count) => write!(f, "push:{count}"),
            ScriptStep::Passive(index) => write!(f, "passive:{index}"),
            ScriptStep::Read(index) => write!(f, "read:{index}"),
            ScriptStep::Fail(count) => write!(f, "fail:{count}"),
            ScriptStep::Clear => write!(f, "clear"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("prev", ScriptStep::Prev)]
    #[case(" next ", ScriptStep::Next)]
    #[case("eager!", ScriptStep::EagerForce)]
    #[case("push:3", ScriptStep::Push(3))]
    #[case("fail", ScriptStep::Fail(1))]
    #[case("fail:2", ScriptStep::Fail(2))]
    #[case(
        "passive:90071992547409930",
        ScriptStep::Passive(SequenceIndex::parse("90071992547409930").unwrap())
    )]
    fn test_parse_step(#[case] raw: &str, #[case] expected: ScriptStep) {
        assert_eq!(raw.parse::<ScriptStep>(), Ok(expected));
    }

    #[rstest]
    #[case("jump")]
    #[case("push")]
    #[case("push:x")]
    #[case("passive:-1")]
    fn test_reject_step(#[case] raw: &str) {
        assert!(raw.parse::<ScriptStep>().is_err());
    }

    #[test]
    fn test_parse_cli() {
        let cli = Cli::try_parse_from([
            "chatstream",
            "--messages",
            "5",
            "--base-index",
            "12345678901234567890",
            "--script",
            "prev,push:2,eager",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.messages, 5);
        assert_eq!(cli.base_index.as_str(), "12345678901234567890");
        assert_eq!(
            cli.script,
            vec![ScriptStep::Prev, ScriptStep::Push(2), ScriptStep::Eager]
        );
        assert!(cli.json);
        assert_eq!(cli.read_index, None);
    }
}
