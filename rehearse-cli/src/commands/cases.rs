//! Case store browsing commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use rehearse_core::case::CanonEvent;
use rehearse_core::client::CaseClient;
use rehearse_core::{CaseBundle, CaseStore, CaseSummary};
use serde_json::Value;

use super::table;
use crate::config::RehearseConfig;

#[derive(Args, Debug)]
pub struct CasesArgs {
    #[command(subcommand)]
    pub command: CasesCommands,
}

#[derive(Subcommand, Debug)]
pub enum CasesCommands {
    /// List cases in the store
    List,
    /// Show a case's canon events and personas
    Show {
        /// Case ID
        case_id: String,
    },
}

pub async fn run(args: CasesArgs, config: &RehearseConfig) -> Result<()> {
    let client = CaseClient::with_base_url(&config.store.base_url);
    match args.command {
        CasesCommands::List => {
            let cases = client.list_cases().await.context("failed to list cases")?;
            println!("{}", render_case_list(&cases));
        }
        CasesCommands::Show { case_id } => {
            let case = client
                .get_case(&case_id)
                .await
                .with_context(|| format!("failed to load case {}", case_id))?;
            println!("{}", render_case(&case_id, &case));
        }
    }
    Ok(())
}

fn render_case_list(cases: &[CaseSummary]) -> String {
    if cases.is_empty() {
        return "No cases in the store".to_string();
    }
    let mut table = table(&["Case", "Topic"]);
    for case in cases {
        table.add_row(vec![
            Cell::new(&case.case_id),
            Cell::new(case.topic.as_deref().unwrap_or("-")),
        ]);
    }
    table.to_string()
}

fn render_case(case_id: &str, case: &CaseBundle) -> String {
    let skeleton = &case.skeleton;
    let title = if skeleton.title.is_empty() {
        case_id
    } else {
        skeleton.title.as_str()
    };

    let mut events = table(&["#", "Event", "Title", "Branches"]);
    for (index, entry) in skeleton.canon_events.iter().enumerate() {
        let Some(id) = entry.id() else { continue };
        let (title, branches) = match entry.as_event() {
            Some(event) => (event.title.as_str(), format_branches(event)),
            None => ("", String::new()),
        };
        events.add_row(vec![
            Cell::new(index + 1),
            Cell::new(id),
            Cell::new(title),
            Cell::new(branches),
        ]);
    }

    let personas = persona_names(&case.personas);
    let mut out = format!("{} ({})\n{}", title, case_id, events);
    if !personas.is_empty() {
        out.push_str(&format!("\nPersonas: {}", personas.join(", ")));
    }
    out
}

/// `5->CE2 4->CE2 1->end`, highest score first
fn format_branches(event: &CanonEvent) -> String {
    event
        .score_branches
        .keys()
        .rev()
        .map(|score| format!("{}->{}", score, event.next_event(*score).unwrap_or("end")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn persona_names(personas: &Value) -> Vec<String> {
    personas
        .get("personas")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|p| p.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_core::Skeleton;
    use serde_json::json;

    fn bundle() -> CaseBundle {
        CaseBundle {
            skeleton: Skeleton::new(
                "case-1",
                "Night shift",
                [
                    CanonEvent::new("CE1")
                        .with_branch(5, "CE2")
                        .with_branch(2, "CE1"),
                    CanonEvent::new("CE2"),
                ],
            ),
            personas: json!({"personas": [{"id": "p-1", "name": "Nurse Lan"}, {"id": "p-2"}]}),
            context: json!({}),
        }
    }

    #[test]
    fn test_branches_highest_first() {
        let event = CanonEvent::new("CE1")
            .with_branch(2, "CE1")
            .with_branch(5, "CE2")
            .with_branch(1, "");
        assert_eq!(format_branches(&event), "5->CE2 2->CE1 1->end");
    }

    #[test]
    fn test_render_case_lists_events_and_personas() {
        let rendered = render_case("case-1", &bundle());
        assert!(rendered.starts_with("Night shift (case-1)"));
        assert!(rendered.contains("CE1"));
        assert!(rendered.contains("CE2"));
        assert!(rendered.contains("Personas: Nurse Lan"));
    }

    #[test]
    fn test_render_empty_case_list() {
        assert_eq!(render_case_list(&[]), "No cases in the store");
    }

    #[test]
    fn test_render_case_list_shows_missing_topic() {
        let rendered = render_case_list(&[CaseSummary {
            case_id: "case-9".to_string(),
            topic: None,
        }]);
        assert!(rendered.contains("case-9"));
        assert!(rendered.contains('-'));
    }
}
