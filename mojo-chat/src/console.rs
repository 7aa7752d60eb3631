//! Interactive question loop.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::runtime::Handle;
use tracing::debug;

use crate::session::ChatSession;

const PROMPT: &str = "mojo> ";

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Question(&'a str),
    Blank,
    Quit,
}

/// Classify one line of user input.
pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "exit" | "quit" | ":q" => Input::Quit,
        question => Input::Question(question),
    }
}

/// Read questions until EOF, Ctrl-C, or `exit`, printing each response.
///
/// Line editing blocks, so the loop runs on a blocking thread and drives
/// each question on the runtime.
pub async fn run_console(session: Arc<ChatSession>) -> Result<()> {
    let runtime = Handle::current();
    tokio::task::spawn_blocking(move || {
        let mut editor = DefaultEditor::new()?;
        println!("Ask a question about Mojo. Type 'exit' or press Ctrl-D to leave.");

        let read_line = || -> Result<Option<String>> {
            match editor.readline(PROMPT) {
                Ok(line) => {
                    if let Input::Question(question) = parse_input(&line) {
                        let _ = editor.add_history_entry(question);
                    }
                    Ok(Some(line))
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
                Err(e) => Err(e.into()),
            }
        };
        question_loop(&session, &runtime, read_line, &mut io::stdout(), &mut io::stderr())
    })
    .await?
}

/// Answer lines from `read_line` until it returns `None` or a quit command.
///
/// Must be called off the runtime's worker threads. A failed question is
/// written to `errors` and the loop carries on.
pub fn question_loop(
    session: &ChatSession,
    runtime: &Handle,
    mut read_line: impl FnMut() -> Result<Option<String>>,
    out: &mut impl Write,
    errors: &mut impl Write,
) -> Result<()> {
    while let Some(line) = read_line()? {
        match parse_input(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::Question(question) => match runtime.block_on(session.respond(question)) {
                Ok(text) => writeln!(out, "\n{text}\n")?,
                Err(e) => {
                    debug!(error = ?e, "question failed");
                    writeln!(errors, "Error: {e}\n")?;
                }
            },
        }
    }
    Ok(())
}
