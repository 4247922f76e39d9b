//! Line-oriented text input and transcript output

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};

use crate::Result;

/// Where typed input comes from and where the transcript goes
#[async_trait]
pub trait Console: Send {
    /// Show `prompt` and read one line; `None` at end of input
    ///
    /// # Errors
    ///
    /// Returns error if reading fails
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Print one line of transcript
    ///
    /// # Errors
    ///
    /// Returns error if writing fails
    async fn print(&mut self, line: &str) -> Result<()>;
}

/// Console on the process stdin/stdout
pub struct TerminalConsole {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalConsole {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
        }
    }
}

#[async_trait]
impl Console for TerminalConsole {
    async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.stdout.write_all(prompt.as_bytes()).await?;
        self.stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }

    async fn print(&mut self, line: &str) -> Result<()> {
        self.stdout.write_all(line.as_bytes()).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }
}
