//! [`Step`] — one expect/send directive pair.
//!
//! A step is "wait for this prompt, then send this command". Rendering a step
//! produces exactly the two lines the external `expect` interpreter consumes:
//!
//! ```text
//! expect "sftp>"
//! send "ls -la .\n"
//! ```

/// Quote style used to delimit the expected prompt text.
///
/// Pick [`Quote::Single`] when the prompt itself contains double quotes. The
/// choice only changes the delimiters around the prompt, never the semantics
/// of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quote {
    #[default]
    Double,
    Single,
}

/// An immutable prompt/command pair.
///
/// The command text is passed through verbatim, shell metacharacters and all.
/// That is deliberate — callers rely on raw pass-through for globs like
/// `put results/*` — but it means untrusted input must never reach a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    prompt: String,
    command: String,
    quote: Quote,
}

impl Step {
    /// Create a step with the default double-quoted prompt delimiter.
    pub fn new(prompt: impl Into<String>, command: impl Into<String>) -> Self {
        Self::with_quote(prompt, command, Quote::Double)
    }

    /// Create a step with an explicit quote style for the prompt.
    pub fn with_quote(
        prompt: impl Into<String>,
        command: impl Into<String>,
        quote: Quote,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            command: command.into(),
            quote,
        }
    }

    /// The prompt this step blocks on.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The command this step sends, without any directive markup.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Render the two directive lines for this step.
    ///
    /// The sent command ends in `\n` (an escape interpreted by the script
    /// interpreter, not a literal line break) so the remote program receives
    /// a complete line.
    pub fn render(&self) -> String {
        let expectation = match self.quote {
            Quote::Double => format!("expect \"{}\"", self.prompt),
            // Escaped for the enclosing shell heredoc.
            Quote::Single => format!("expect \\'{}\\'", self.prompt),
        };
        format!("{}\nsend \"{}\\n\"\n", expectation, self.command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_double_quoted() {
        let step = Step::new("sftp>", "ls -la .");
        assert_eq!(step.render(), "expect \"sftp>\"\nsend \"ls -la .\\n\"\n");
    }

    #[test]
    fn test_render_single_quoted() {
        let step = Step::with_quote("alice", "pwd", Quote::Single);
        assert_eq!(step.render(), "expect \\'alice\\'\nsend \"pwd\\n\"\n");
    }

    #[test]
    fn test_accessors() {
        let step = Step::new("sftp>", "cd upload");
        assert_eq!(step.prompt(), "sftp>");
        assert_eq!(step.command(), "cd upload");
    }

    #[test]
    fn test_command_passed_through_verbatim() {
        let step = Step::new("sftp>", "put results/* $HOME");
        assert!(step.render().contains("put results/* $HOME"));
    }
}
