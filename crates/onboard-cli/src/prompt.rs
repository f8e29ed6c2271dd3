//! Interactive prompts
//!
//! Line-based input for `fill` and confirmations. Readers and writers are
//! generic so the prompts can be driven from scripted input in tests.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Line reader over any async input
pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    /// Print `prompt` and read one line
    ///
    /// Returns `None` at end of input.
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask a yes/no question; anything but `y`/`yes` is no
    pub async fn ask_yes_no(&mut self, prompt: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N] ", prompt)).await?;
        Ok(answer.is_some_and(|a| is_yes(&a)))
    }

    /// Write a line to the prompt output
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

/// Ask for confirmation on the terminal
///
/// Returns false without asking when stdin is not a terminal.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    input == "y" || input == "yes"
}
