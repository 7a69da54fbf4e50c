//! `docqa ask`: one question about one document.

use anyhow::{bail, Result};
use docqa_core::Answer;
use serde::Serialize;

use crate::qa::DocumentQa;

/// Output format for answers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown format: '{}'. Must be text or json.", other),
        }
    }
}

#[derive(Serialize)]
struct AskOutput<'a> {
    url: &'a str,
    question: &'a str,
    #[serde(flatten)]
    answer: &'a Answer,
}

pub async fn run_ask(
    qa: &mut DocumentQa,
    url: &str,
    question: &str,
    top_k: Option<usize>,
    format: OutputFormat,
    show_context: bool,
) -> Result<()> {
    let answer = qa.ask(url, question, top_k).await?;
    match format {
        OutputFormat::Json => {
            let out = AskOutput {
                url,
                question,
                answer: &answer,
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => print!("{}", render_text(&answer, show_context)),
    }
    Ok(())
}

/// Plain-text rendering: the answer, then optionally each retrieved chunk.
pub fn render_text(answer: &Answer, show_context: bool) -> String {
    let mut out = format!("{}\n", answer.text.trim_end());
    if show_context {
        for (rank, chunk) in answer.context.iter().enumerate() {
            out.push_str(&format!(
                "\n--- context #{} (chunk {}, chars {}..{}){}\n{}\n",
                rank + 1,
                chunk.index,
                chunk.start,
                chunk.end,
                if rank < answer.context_chunks_used {
                    ""
                } else {
                    " [not sent: context budget]"
                },
                chunk.text.trim_end()
            ));
        }
    }
    out
}
