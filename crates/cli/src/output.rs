use anyhow::Result;
use serde::Serialize;

/// Pretty JSON on stdout, one document per command.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
