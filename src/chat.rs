//! `docqa chat`: plain multi-turn chat, no document.

use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::session::ChatSession;

pub async fn run_chat(session: &mut ChatSession) -> Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "chatting with {} (:clear resets history, :quit exits)",
        session.model_name()
    )?;
    chat_loop(session, stdin, &mut stdout).await
}

pub async fn chat_loop<R, W>(session: &mut ChatSession, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "" => continue,
            ":quit" | ":q" => break,
            ":clear" => {
                session.clear();
                writeln!(out, "history cleared")?;
            }
            prompt => match session.send(prompt).await {
                Ok(reply) => writeln!(out, "{}", reply.trim_end())?,
                Err(e) => writeln!(out, "Error: {e}")?,
            },
        }
    }
    Ok(())
}
