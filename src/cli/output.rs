//! Output formatting infrastructure for CLI commands.

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::models::{Message, MessagePayload};

/// Output mode for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

/// Print a list of items as a JSON array.
pub fn output_json_list<T: Serialize>(items: &[T]) {
    match serde_json::to_string_pretty(items) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to serialize to JSON: {}", e)),
    }
}

/// Print a formatted table with headers and rows.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        println!("{}", "No results found.".dimmed());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(headers);

    for row in rows {
        table.add_row(row);
    }

    println!("{table}");
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", "OK".green().bold(), msg);
}

/// Print an error message to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}

/// Print a bold section header.
pub fn print_header(title: &str) {
    println!("\n{}\n", title.bold());
}

/// One-line summary of a tool message, e.g. `[get_node {"id":4}] -> {...}`.
pub fn format_tool_call(message: &Message) -> Option<String> {
    let MessagePayload::Tool(call) = &message.payload else {
        return None;
    };
    let args = serde_json::Value::Object(call.tool_args.clone());
    let outcome = if !call.done {
        "pending".to_string()
    } else if call.is_error() {
        format!("error: {}", call.tool_error)
    } else {
        call.tool_result.clone()
    };
    Some(format!("[{} {}] -> {}", call.tool_name, args, outcome))
}

/// Print a stored message as part of a transcript.
pub fn print_message(message: &Message) {
    match &message.payload {
        MessagePayload::User { text } => println!("{} {}", "you>".cyan().bold(), text),
        MessagePayload::Agent { text } => println!("{} {}", "agent>".green().bold(), text),
        MessagePayload::Tool(_) => {
            if let Some(line) = format_tool_call(message) {
                println!("{}", line.dimmed());
            }
        }
    }
}
