// Record builder: collects one value per field from a `Prompter` and
// assembles a `Job` or `Poc`. Nothing here touches the data files; the
// caller supplies the record number and decides whether to store the
// result.

use crate::prompt::Prompter;
use crate::record::{check_value, Record};
use anyhow::Result;

/// Ask for every field of `R` except the record number.
///
/// A value containing `;` (or a line break) is refused and asked again.
/// An empty answer falls back to the field's default: the value in
/// `current` when editing an existing record, otherwise the value from
/// `R::default()` (today's date for the contact dates, `y` for a job's
/// `active` flag, `Null` for the rest).
pub fn build_record<R: Record>(
    prompter: &mut dyn Prompter,
    record_number: u32,
    current: Option<&R>,
) -> Result<R> {
    let fresh = R::default();
    let defaults = current.unwrap_or(&fresh).values();
    let mut values = Vec::with_capacity(R::FIELDS.len() - 1);

    for (field, default) in R::FIELDS[1..].iter().zip(defaults) {
        values.push(ask_field(prompter, field, default)?);
    }

    Ok(R::from_values(record_number, values))
}

fn ask_field(prompter: &mut dyn Prompter, field: &str, default: &str) -> Result<String> {
    loop {
        let answer = prompter.ask(field, Some(default))?;
        let answer = answer.trim();
        if let Err(e) = check_value(field, answer) {
            prompter.notify(&e.to_string());
            continue;
        }
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
        return Ok(default.to_string());
    }
}
