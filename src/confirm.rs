//! Interactive confirmation

use crate::error::CliError;
use std::io::{BufRead, Write};

/// Asks the user before risky operations
pub struct Confirm {
    assume_yes: bool,
}

impl Confirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }

    /// Ask `prompt` on stdin; only a literal "yes" counts
    pub fn ask(&self, prompt: &str) -> Result<bool, CliError> {
        print!("{} (yes/no): ", prompt);
        if self.assume_yes {
            println!("yes");
            return Ok(true);
        }
        std::io::stdout()
            .flush()
            .map_err(|e| CliError::io("Failed to write prompt", e))?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| CliError::io("Failed to read answer", e))?;
        Ok(is_yes(&line))
    }
}

fn is_yes(answer: &str) -> bool {
    answer.trim_end_matches(['\r', '\n']) == "yes"
}
