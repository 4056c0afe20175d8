//! Interactive play of one case
//!
//! Trainee turns are read line by line from stdin. New transcript lines are
//! printed after every turn and a result panel closes a finished session.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::Cell;
use rehearse_core::client::{AgentClient, CaseClient, HistoryClient};
use rehearse_core::engine::RecorderPhase;
use rehearse_core::{
    ChatMessage, EventScoreRecord, Persona, Sender, SessionController, SessionResult, Skeleton,
    StartOptions, TurnOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{format_score, table, verdict};
use crate::config::RehearseConfig;

/// Typed alone on a line to leave the session
const QUIT_COMMAND: &str = "/quit";

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Case ID to play
    pub case_id: String,

    /// Do not save the session even if a token is configured
    #[arg(long)]
    pub anonymous: bool,
}

pub async fn run(args: PlayArgs, config: &RehearseConfig) -> Result<()> {
    let credential = if args.anonymous {
        None
    } else {
        config.auth.credential()
    };
    if credential.is_none() {
        println!("Playing without a token; this session will not be saved.");
    }

    let options = StartOptions {
        lazy_init: config.agent.lazy_init,
        skip_tts: config.agent.skip_tts,
        opening_action: config.agent.opening_action.clone(),
        credential,
    };

    let mut session = SessionController::start(
        &CaseClient::with_base_url(&config.store.base_url),
        Arc::new(AgentClient::with_base_url(&config.agent.base_url)),
        Arc::new(HistoryClient::with_base_url(&config.store.base_url)),
        &args.case_id,
        options,
    )
    .await
    .with_context(|| format!("failed to start case {}", args.case_id))?;

    println!("{} | type {} to leave", args.case_id, QUIT_COMMAND);
    let mut shown = print_new_lines(&session, 0);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_finished() {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input == QUIT_COMMAND {
            break;
        }

        match session.submit(input).await {
            TurnOutcome::Advanced(_) => shown = print_new_lines(&session, shown),
            TurnOutcome::Failed(reason) => println!("Error: could not send message. {}", reason),
            TurnOutcome::Unchanged => println!("(the agent sent no update)"),
            TurnOutcome::Ignored => {}
        }
    }

    if !session.is_finished() {
        println!("Left before the end; nothing was saved.");
        return Ok(());
    }

    let panel = render_result(
        &session.result(),
        session.event_scores(),
        &session.case().skeleton,
    );
    println!("{}", panel);
    match session.recorder_phase() {
        RecorderPhase::Saved => println!("Saved to your history."),
        RecorderPhase::SaveFailed => println!("Could not save this session to your history."),
        RecorderPhase::Unrecorded => println!("Not saved (no token)."),
        RecorderPhase::Running | RecorderPhase::PendingSave => {}
    }
    Ok(())
}

/// Print agent-authored lines past `shown`, returning the new count
///
/// The trainee's own lines are skipped since they were just typed.
fn print_new_lines(session: &SessionController, shown: usize) -> usize {
    let personas = session
        .state()
        .map(|s| s.active_personas.clone())
        .unwrap_or_default();
    let messages = session.messages();
    for line in format_lines(messages.get(shown..).unwrap_or_default(), &personas) {
        println!("{}", line);
    }
    messages.len()
}

fn format_lines(messages: &[ChatMessage], personas: &BTreeMap<String, Persona>) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.sender != Sender::User)
        .map(|m| format!("{}: {}", m.display_name(personas), m.text))
        .collect()
}

fn render_result(
    result: &SessionResult,
    scores: &BTreeMap<String, EventScoreRecord>,
    skeleton: &Skeleton,
) -> String {
    let mut breakdown = table(&["Event", "Title", "Score"]);
    for (event_id, record) in scores {
        let title = skeleton
            .event(event_id)
            .map(|e| e.title.as_str())
            .unwrap_or("");
        breakdown.add_row(vec![
            Cell::new(event_id),
            Cell::new(title),
            Cell::new(format!("{:.1}", record.score)),
        ]);
    }

    let mut summary = table(&["Final score", "Result", "Events scored"]);
    summary.add_row(vec![
        Cell::new(format_score(result.final_score)),
        verdict(result.final_score),
        Cell::new(result.event_count),
    ]);

    format!("Session complete\n{}\n{}", summary, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rehearse_core::CanonEvent;
    use rehearse_core::engine::compute_result;

    fn record(event_id: &str, score: f64) -> EventScoreRecord {
        EventScoreRecord {
            event_id: event_id.to_string(),
            score,
            scores: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_format_lines_skips_user_and_names_personas() {
        let mut personas = BTreeMap::new();
        personas.insert("p-1".to_string(), Persona::new("p-1", "Nurse Lan"));
        let messages = vec![
            ChatMessage::user("Check vitals"),
            ChatMessage {
                id: "hist-1".to_string(),
                sender: Sender::Persona("p-1".to_string()),
                text: "BP is 90 over 60.".to_string(),
                speaker_name: Some("Nurse Lan".to_string()),
            },
            ChatMessage::system("Error: could not send message. timeout"),
        ];

        let lines = format_lines(&messages, &personas);
        assert_eq!(
            lines,
            vec![
                "Nurse Lan: BP is 90 over 60.".to_string(),
                "System: Error: could not send message. timeout".to_string(),
            ]
        );
    }

    #[test]
    fn test_render_result_panel() {
        let mut scores = BTreeMap::new();
        scores.insert("CE1".to_string(), record("CE1", 4.0));
        scores.insert("CE2".to_string(), record("CE2", 2.0));
        let skeleton = Skeleton::new(
            "case-1",
            "Night shift",
            [CanonEvent::new("CE1"), CanonEvent::new("CE2")],
        );

        let rendered = render_result(&compute_result(&scores), &scores, &skeleton);
        assert!(rendered.starts_with("Session complete"));
        assert!(rendered.contains("3.0/5"));
        assert!(rendered.contains("pass"));
        assert!(rendered.contains("CE2"));
        assert!(rendered.contains("2.0"));
    }

    #[test]
    fn test_render_failing_result() {
        let mut scores = BTreeMap::new();
        scores.insert("CE1".to_string(), record("CE1", 2.0));
        let result = compute_result(&scores);

        let rendered = render_result(&result, &scores, &Skeleton::default());
        assert!(rendered.contains("2.0/5"));
        assert!(rendered.contains("fail"));
    }
}
