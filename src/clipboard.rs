//! Copy text to the user's clipboard through the terminal.
//!
//! Uses the OSC 52 escape sequence, which most modern terminal emulators
//! (and tmux with `set-clipboard on`) forward to the system clipboard. It
//! works over SSH and needs no platform clipboard library.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::{self, IsTerminal, Write};
use tracing::debug;

/// Which standard stream reaches the user's terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStream {
    Stdout,
    Stderr,
}

/// Pick the stream to send the clipboard sequence to.
///
/// stderr is preferred so that stdout stays clean for results (`--json`,
/// `> file`). stdout is used only when it is itself a terminal. `None` means
/// neither stream is a terminal and nothing should be written.
pub fn terminal_stream(stdout_is_tty: bool, stderr_is_tty: bool) -> Option<TerminalStream> {
    if stderr_is_tty {
        Some(TerminalStream::Stderr)
    } else if stdout_is_tty {
        Some(TerminalStream::Stdout)
    } else {
        None
    }
}

/// Build the OSC 52 sequence that sets the clipboard to `text`.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}

/// Write the clipboard sequence for `text` to `out` and flush it.
pub fn copy_to_clipboard<W: Write>(text: &str, out: &mut W) -> io::Result<()> {
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()?;
    debug!("Sent {} bytes to the clipboard", text.len());
    Ok(())
}

/// Copy `text` through whichever standard stream is attached to a terminal.
///
/// Returns `Ok(false)` when no terminal is attached.
pub fn copy_to_terminal(text: &str) -> io::Result<bool> {
    match terminal_stream(io::stdout().is_terminal(), io::stderr().is_terminal()) {
        Some(TerminalStream::Stderr) => copy_to_clipboard(text, &mut io::stderr().lock())?,
        Some(TerminalStream::Stdout) => copy_to_clipboard(text, &mut io::stdout().lock())?,
        None => return Ok(false),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_base64_payload() {
        assert_eq!(osc52_sequence("hi"), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn payload_decodes_to_original_text() {
        let text = "Résumé of \"Topic A\"\nsecond line";
        let seq = osc52_sequence(text);
        let payload = seq
            .strip_prefix("\x1b]52;c;")
            .and_then(|s| s.strip_suffix('\x07'))
            .unwrap();
        assert_eq!(STANDARD.decode(payload).unwrap(), text.as_bytes());
    }

    #[test]
    fn copy_writes_sequence() {
        let mut buf = Vec::new();
        copy_to_clipboard("summary", &mut buf).unwrap();
        assert_eq!(buf, osc52_sequence("summary").into_bytes());
    }

    #[test]
    fn piped_stdout_never_gets_the_sequence() {
        // `--json --copy | jq`: stdout is a pipe, stderr the terminal.
        assert_eq!(terminal_stream(false, true), Some(TerminalStream::Stderr));
        // `--copy > out.txt 2> err.txt`: no terminal at all.
        assert_eq!(terminal_stream(false, false), None);
    }

    #[test]
    fn stderr_preferred_when_both_are_terminals() {
        assert_eq!(terminal_stream(true, true), Some(TerminalStream::Stderr));
        assert_eq!(terminal_stream(true, false), Some(TerminalStream::Stdout));
    }

    #[test]
    fn json_output_stays_parseable_next_to_clipboard_write() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        writeln!(stdout, "{}", serde_json::json!({"summary": "text"})).unwrap();
        match terminal_stream(false, true) {
            Some(TerminalStream::Stdout) => copy_to_clipboard("text", &mut stdout).unwrap(),
            Some(TerminalStream::Stderr) => copy_to_clipboard("text", &mut stderr).unwrap(),
            None => {}
        }
        let parsed: serde_json::Value = serde_json::from_slice(&stdout).unwrap();
        assert_eq!(parsed["summary"], "text");
        assert_eq!(stderr, osc52_sequence("text").into_bytes());
    }
}
