//! Session history commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use rehearse_core::client::HistoryClient;
use rehearse_core::{HistoryReader, StoredHistory};
use serde_json::Value;

use super::{format_score, table, verdict};
use crate::config::RehearseConfig;

const NO_TOKEN: &str = "history requires a token; set REHEARSE_TOKEN or [auth] token";

#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommands,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommands {
    /// List your finished sessions, newest first
    List,
    /// Show one session's score breakdown and transcript
    Show {
        /// Session ID
        session_id: String,
    },
}

pub async fn run(args: HistoryArgs, config: &RehearseConfig) -> Result<()> {
    let credential = config.auth.credential().context(NO_TOKEN)?;
    let client = HistoryClient::with_base_url(&config.store.base_url);

    match args.command {
        HistoryCommands::List => {
            let histories = client
                .list(&credential)
                .await
                .context("failed to list history")?;
            println!("{}", render_history_list(&histories));
        }
        HistoryCommands::Show { session_id } => {
            let history = client
                .get(&credential, &session_id)
                .await
                .with_context(|| format!("failed to load session {}", session_id))?
                .with_context(|| format!("no history for session {}", session_id))?;
            println!("{}", render_history(&history));
        }
    }
    Ok(())
}

fn render_history_list(histories: &[StoredHistory]) -> String {
    if histories.is_empty() {
        return "No finished sessions yet".to_string();
    }
    let mut table = table(&["Session", "Case", "Score", "Result", "Updated"]);
    for history in histories {
        table.add_row(vec![
            Cell::new(&history.session_id),
            Cell::new(&history.case_id),
            Cell::new(format_score(history.final_score)),
            verdict(history.final_score),
            Cell::new(history.updated_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    table.to_string()
}

fn render_history(history: &StoredHistory) -> String {
    let mut out = format!(
        "Session {} ({})\nScore: {}\n",
        history.session_id,
        history.case_id,
        format_score(history.final_score)
    );
    if let Some(summary) = history.scene_summary() {
        out.push_str(&format!("Summary: {}\n", summary));
    }

    if let Some(scores) = history.event_scores() {
        let mut breakdown = table(&["Event", "Score"]);
        for (event_id, record) in scores {
            let score = record.get("score").and_then(Value::as_f64).unwrap_or(0.0);
            let score = Cell::new(format!("{:.1}", score));
            breakdown.add_row(vec![Cell::new(event_id), score]);
        }
        out.push_str(&format!("{}\n", breakdown));
    }

    for message in &history.messages {
        let speaker = message
            .get("speakerName")
            .or_else(|| message.get("sender"))
            .and_then(Value::as_str)
            .unwrap_or("?");
        let text = message.get("text").and_then(Value::as_str).unwrap_or("");
        out.push_str(&format!("{}: {}\n", speaker, text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history() -> StoredHistory {
        serde_json::from_value(json!({
            "sessionId": "s-1",
            "userId": "u-1",
            "caseId": "case-1",
            "messages": [
                {"id": "hist-0", "sender": "p-1", "text": "Bed 3 needs you.", "speakerName": "Nurse Lan"},
                {"id": "hist-1", "sender": "user", "text": "On my way."}
            ],
            "finalScore": 4.0,
            "finalState": {
                "scene_summary": "Handover complete",
                "eventScores": {"CE1": {"eventId": "CE1", "score": 4.0}, "CE2": {"eventId": "CE2", "score": 5.0}}
            },
            "createdAt": "2026-01-01T08:00:00Z",
            "updatedAt": "2026-01-01T09:30:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_render_history_list() {
        let rendered = render_history_list(&[history()]);
        assert!(rendered.contains("s-1"));
        assert!(rendered.contains("4.0/5"));
        assert!(rendered.contains("pass"));
        assert!(rendered.contains("2026-01-01 09:30"));
    }

    #[test]
    fn test_render_empty_history_list() {
        assert_eq!(render_history_list(&[]), "No finished sessions yet");
    }

    #[test]
    fn test_render_history_detail() {
        let rendered = render_history(&history());
        assert!(rendered.starts_with("Session s-1 (case-1)"));
        assert!(rendered.contains("Summary: Handover complete"));
        assert!(rendered.contains("CE2"));
        assert!(rendered.contains("5.0"));
        assert!(rendered.contains("Nurse Lan: Bed 3 needs you."));
        assert!(rendered.contains("user: On my way."));
    }
}
