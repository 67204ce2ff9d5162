//! Console output formatter for predictions and history

use crate::output::sanitize::{sanitize_inline, sanitize_markup};
use colored::Colorize;
use pestwatch_application::{HistoryViewState, SubmissionOutcome};
use pestwatch_domain::{
    ChatReply, Confidence, HistoryRecord, OutputFormat, Persistence, PredictionResult, Session,
    core::text::preview_line,
};
use serde_json::json;

/// Formats results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a prediction in the requested format
    pub fn prediction(outcome: &SubmissionOutcome, text: Option<&str>, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format_prediction(outcome, text),
            OutputFormat::Label => format!("{}\n", sanitize_inline(&outcome.result.label)),
            OutputFormat::Json => Self::format_prediction_json(outcome, text),
        }
    }

    /// Format history in the requested format
    pub fn history(records: &[HistoryRecord], format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => Self::format_history(records),
            OutputFormat::Label => records
                .iter()
                .map(|r| format!("{}\t{}\n", r.id(), sanitize_inline(r.label())))
                .collect(),
            OutputFormat::Json => Self::format_history_json(records),
        }
    }

    /// Full prediction output
    pub fn format_prediction(outcome: &SubmissionOutcome, text: Option<&str>) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Prediction"));
        output.push('\n');
        output.push_str(&Self::result_body(&outcome.result, text));

        output.push('\n');
        output.push_str(&Self::persistence_line(&outcome.persistence));
        output.push('\n');
        output.push_str(&Self::footer());

        output
    }

    /// Prediction as JSON (raw values; JSON consumers do their own escaping)
    pub fn format_prediction_json(outcome: &SubmissionOutcome, text: Option<&str>) -> String {
        let value = json!({
            "label": outcome.result.label,
            "confidence": outcome.result.confidence.map(|c| c.value()),
            "explanation": outcome.result.explanation,
            "text": text,
            "persistence": outcome.persistence,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Full history listing, in the order given
    pub fn format_history(records: &[HistoryRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No predictions yet.".dimmed());
        }

        let mut output = String::new();
        output.push_str(&Self::header(&format!("History ({} records)", records.len())));
        for record in records {
            output.push('\n');
            output.push_str(&Self::record_line(record));
            if let Some(text) = record.text() {
                output.push_str(&format!(
                    "    {} {}\n",
                    "Notes:".dimmed(),
                    sanitize_inline(&preview_line(text, 80))
                ));
            }
            if let Some(explanation) = record.explanation() {
                output.push_str(&format!(
                    "    {}\n",
                    sanitize_inline(&preview_line(explanation, 80)).dimmed()
                ));
            }
        }
        output.push_str(&Self::footer());
        output
    }

    pub fn format_history_json(records: &[HistoryRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Live view frame: banner, loading indicator or listing
    pub fn format_history_view(state: &HistoryViewState) -> String {
        let mut output = String::new();
        if let Some(error) = &state.error {
            output.push_str(&format!(
                "{} {}\n",
                "History unavailable:".red().bold(),
                error
            ));
        }
        if state.loading {
            output.push_str(&format!("{}\n", "Loading history...".dimmed()));
        } else {
            output.push_str(&Self::format_history(&state.records));
        }
        output
    }

    /// Assistant reply
    pub fn format_reply(reply: &ChatReply) -> String {
        format!("{}\n\n{}\n", "Assistant:".cyan().bold(), sanitize_markup(&reply.markup))
    }

    /// Identity summary for `whoami`
    pub fn format_session(session: &Session, namespace: &str) -> String {
        match (session.identity(), session.origin()) {
            (Some(identity), Some(origin)) => format!(
                "{} {}\n{} {}\n{} {}\n",
                "Identity:".cyan().bold(),
                identity,
                "Origin:  ".cyan().bold(),
                origin.as_str(),
                "History: ".cyan().bold(),
                pestwatch_domain::collection_path(namespace, identity)
            ),
            _ => format!("{}\n", "Identity not resolved".yellow()),
        }
    }

    pub fn confidence_text(confidence: Option<Confidence>) -> String {
        match confidence {
            Some(c) => format!("{}%", c.percent()),
            None => "not reported".to_string(),
        }
    }

    fn result_body(result: &PredictionResult, text: Option<&str>) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {}\n",
            "Pest:".cyan().bold(),
            sanitize_inline(&result.label).green().bold()
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Confidence:".cyan().bold(),
            Self::confidence_text(result.confidence)
        ));
        if let Some(text) = pestwatch_domain::core::text::non_blank(text) {
            output.push_str(&format!(
                "{} {}\n",
                "Notes:".cyan().bold(),
                sanitize_inline(text)
            ));
        }
        if let Some(explanation) = &result.explanation {
            output.push_str(&format!("\n{}\n", sanitize_markup(explanation)));
        }
        output
    }

    fn record_line(record: &HistoryRecord) -> String {
        format!(
            "{}  {}  {} ({})\n",
            record.id().as_str().yellow(),
            record
                .created_at()
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string()
                .dimmed(),
            sanitize_inline(record.label()).bold(),
            Self::confidence_text(record.confidence())
        )
    }

    fn persistence_line(persistence: &Persistence) -> String {
        match persistence {
            Persistence::Saved(id) => format!("{} {}", "Saved to history as".dimmed(), id),
            Persistence::Skipped => "Not saved to history".dimmed().to_string(),
            Persistence::Pending => "Saving to history...".dimmed().to_string(),
            Persistence::Failed(reason) => {
                format!("{} {}", "Could not save to history:".yellow(), reason)
            }
        }
    }

    fn header(title: &str) -> String {
        format!("{}\n", format!("=== {} ===", title).cyan().bold())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(40).dimmed())
    }
}
