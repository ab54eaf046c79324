//! Interactive review of the run configuration.

use std::io::{self, BufRead, Write};

use cookbooker_core::{ConfigField, RunConfig};

/// Walks every [`ConfigField`], showing its current value and reading a
/// replacement. An empty answer keeps the value; an unparsable number is
/// reported and asked again. Stops quietly at end of input.
pub(crate) fn prompt_config<R: BufRead, W: Write>(
    config: &mut RunConfig,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    for field in ConfigField::ALL {
        loop {
            write!(
                output,
                "{:<15} {}: ",
                field.label(),
                config.display_value(field)
            )?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }

            match config.apply_input(field, &line) {
                Ok(()) => break,
                Err(e) => writeln!(output, "{e}")?,
            }
        }
    }
    Ok(())
}
