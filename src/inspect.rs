//! `docqa inspect`: fetch and chunk a document without embedding it.
//!
//! Prints one row per chunk and checks that the chunks reconstruct the
//! extracted text exactly.

use anyhow::{bail, Result};
use docqa_core::chunk::reconstruct;
use docqa_core::{Chunk, Document};

use crate::qa::DocumentQa;

const PREVIEW_CHARS: usize = 60;

pub async fn run_inspect(qa: &DocumentQa, url: &str) -> Result<()> {
    let (document, chunks) = qa.chunk_only(url).await?;
    let covered = reconstruct(&chunks, qa.params().overlap()) == document.text;
    print!("{}", render(&document, &chunks, covered));
    if !covered {
        bail!("chunks do not reconstruct the document text");
    }
    Ok(())
}

fn render(document: &Document, chunks: &[Chunk], covered: bool) -> String {
    let mut out = format!(
        "source:       {}\ncontent-type: {}\nchars:        {}\nchunks:       {}\n\n",
        document.source,
        document.content_type,
        document.char_len(),
        chunks.len()
    );
    out.push_str(&format!(
        "{:>5}  {:>8}  {:>8}  {:<12}  {}\n",
        "#", "start", "end", "sha256", "preview"
    ));
    for chunk in chunks {
        out.push_str(&format!(
            "{:>5}  {:>8}  {:>8}  {:<12}  {}\n",
            chunk.index,
            chunk.start,
            chunk.end,
            &chunk.hash[..chunk.hash.len().min(12)],
            preview(&chunk.text)
        ));
    }
    let coverage = if covered { "ok" } else { "MISMATCH" };
    out.push_str(&format!("\ncoverage: {coverage}\n"));
    out
}

fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .take(PREVIEW_CHARS)
        .collect();
    if text.chars().count() > PREVIEW_CHARS {
        format!("{flat}…")
    } else {
        flat
    }
}
