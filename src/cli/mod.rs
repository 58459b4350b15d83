mod item;
mod message;
mod table;

mod root;
pub use root::{parse, Command, Context, DynawrapCommand, GlobalOptions};

use serde::Serialize;
use serde_json::Value;

use crate::{DynamoError, Result};

// Write value to stdout as pretty json.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|err| DynamoError::Internal(err.to_string()))?;
    println!();
    Ok(())
}

// Parse a command line argument holding a json object.
pub(crate) fn parse_object(s: &str) -> Result<crate::message::Message> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(DynamoError::invalid("expected a json object")),
        Err(err) => Err(DynamoError::invalid(format!("invalid json. {}", err))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_object_arg() {
        let object = parse_object(r#"{"school_id": "1"}"#).unwrap();
        assert_eq!(object["school_id"], "1");

        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("{").is_err());
    }

    #[test]
    fn parse_command_line() {
        let DynawrapCommand { options, command } = DynawrapCommand::try_parse_from([
            "dynawrap",
            "--table",
            "messages_staging",
            "search",
            "school_id-index",
            "123",
        ])
        .unwrap();

        assert_eq!(options.table.as_deref(), Some("messages_staging"));
        assert!(matches!(command, Command::Search(_)));

        let parsed = DynawrapCommand::try_parse_from([
            "dynawrap",
            "get-column",
            "phone",
            "--filter",
            "country=chile",
        ]);
        assert!(parsed.is_ok());

        let parsed = DynawrapCommand::try_parse_from([
            "dynawrap",
            "get-column",
            "phone",
            "--filter",
            "chile",
        ]);
        assert!(parsed.is_err());
    }
}
