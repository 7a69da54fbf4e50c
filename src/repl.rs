//! `docqa repl`: load a document once, then answer questions line by line.
//!
//! Lines starting with `:` are commands:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `:load <url>` | switch documents (the old one is dropped from the cache) |
//! | `:reload` | rebuild the current document's index |
//! | `:quit` | exit (EOF works too) |
//!
//! A failed question prints a notice and the loop keeps going.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::ask::render_text;
use crate::qa::DocumentQa;

pub async fn run_repl(qa: &mut DocumentQa, url: &str) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl_loop(qa, url, stdin, &mut stdout).await
}

pub async fn repl_loop<R, W>(qa: &mut DocumentQa, url: &str, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut url = url.to_string();
    load(qa, &url, out).await?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) | (":q", _) => break,
            (":load", next) if !next.trim().is_empty() => {
                qa.invalidate();
                url = next.trim().to_string();
                load(qa, &url, out).await?;
            }
            (":reload", _) => {
                qa.invalidate();
                load(qa, &url, out).await?;
            }
            (cmd, _) if cmd.starts_with(':') => {
                writeln!(out, "unknown command {cmd}; try :load <url>, :reload, or :quit")?;
            }
            _ => match qa.ask(&url, line, None).await {
                Ok(answer) => write!(out, "{}", render_text(&answer, false))?,
                Err(e) => writeln!(out, "An error occurred: {e:#}")?,
            },
        }
    }
    Ok(())
}

async fn load<W: Write>(qa: &mut DocumentQa, url: &str, out: &mut W) -> Result<()> {
    match qa.load(url).await {
        Ok(cached) => writeln!(
            out,
            "loaded {} ({} chunks)",
            cached.url, cached.chunk_count
        )?,
        Err(e) => writeln!(out, "An error occurred: {e:#}")?,
    }
    Ok(())
}
