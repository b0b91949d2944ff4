//! Where `lyc` gets secrets from.
//!
//! On a terminal, secrets are read with echo off through `rpassword`. When
//! stdin is a pipe or a file, they are read one per line, which lets scripts
//! feed them in (`printf 'pw1\npw1\n' | lyc create alice`). Prompts and
//! rejection messages go to stderr either way, so stdout stays clean for
//! results.

use std::io::{self, BufRead, Stderr, StdinLock, Write};

use lyc_ledger::{Rejection, SecretPrompt, SecretProvider};

/// Secrets for the binary: hidden terminal input, or lines from a pipe.
pub enum StdinSecrets {
    Terminal(TerminalSecrets),
    Piped(LineSecrets<StdinLock<'static>, Stderr>),
}

impl StdinSecrets {
    /// Picks the reader based on whether stdin is a terminal.
    pub fn detect() -> Self {
        Self::for_input(atty::is(atty::Stream::Stdin))
    }

    pub fn for_input(interactive: bool) -> Self {
        if interactive {
            StdinSecrets::Terminal(TerminalSecrets)
        } else {
            StdinSecrets::Piped(LineSecrets::new(io::stdin().lock(), io::stderr()))
        }
    }
}

impl SecretProvider for StdinSecrets {
    fn provide(&mut self, prompt: SecretPrompt) -> Option<String> {
        match self {
            StdinSecrets::Terminal(inner) => inner.provide(prompt),
            StdinSecrets::Piped(inner) => inner.provide(prompt),
        }
    }

    fn rejected(&mut self, reason: Rejection) {
        match self {
            StdinSecrets::Terminal(inner) => inner.rejected(reason),
            StdinSecrets::Piped(inner) => inner.rejected(reason),
        }
    }
}

/// [`SecretProvider`] reading from the controlling terminal without echo.
pub struct TerminalSecrets;

impl SecretProvider for TerminalSecrets {
    /// Ctrl-D or a terminal error means the caller gave up.
    fn provide(&mut self, prompt: SecretPrompt) -> Option<String> {
        rpassword::prompt_password(format!("{prompt}: ")).ok()
    }

    fn rejected(&mut self, reason: Rejection) {
        eprintln!("{}", reason.message());
    }
}

/// [`SecretProvider`] reading one secret per line.
pub struct LineSecrets<R, W> {
    input: R,
    prompts: W,
}

impl<R: BufRead, W: Write> LineSecrets<R, W> {
    pub fn new(input: R, prompts: W) -> Self {
        Self { input, prompts }
    }

    /// Prompt output written so far.
    #[cfg(test)]
    pub fn prompts(&self) -> &W {
        &self.prompts
    }
}

impl<R: BufRead, W: Write> SecretProvider for LineSecrets<R, W> {
    /// End of input (or a read error) means the caller gave up.
    fn provide(&mut self, prompt: SecretPrompt) -> Option<String> {
        // A prompt that can't be shown is no reason to stop reading.
        let _ = write!(self.prompts, "{prompt}: ");
        let _ = self.prompts.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(self.prompts);
                None
            }
            Ok(_) => {
                let trimmed = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed);
                Some(line)
            }
        }
    }

    fn rejected(&mut self, reason: Rejection) {
        let _ = writeln!(self.prompts, "{}", reason.message());
    }
}
