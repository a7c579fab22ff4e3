use colored::*;
use crosscheck_core::tools::{ToolDefinition, ToolOutcome};
use serde::Serialize;
use serde_json::Value;

/// Output mode for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
    Quiet,
}

/// Accumulated JSON result entry.
#[derive(Debug, Serialize, Clone)]
pub struct JsonResultEntry {
    #[serde(rename = "type")]
    pub result_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonResultEntry {
    fn new(result_type: &str, message: &str) -> Self {
        Self {
            result_type: result_type.to_string(),
            message: message.to_string(),
            details: None,
            data: None,
        }
    }
}

/// Accumulated JSON output.
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub results: Vec<JsonResultEntry>,
}

/// Reporter handles all output formatting.
///
/// Only used by the one-shot commands; `serve` owns stdout for the protocol.
pub struct Reporter {
    mode: OutputMode,
    json_results: Vec<JsonResultEntry>,
}

impl Reporter {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            json_results: Vec::new(),
        }
    }

    /// Returns the current output mode.
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn error(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                eprintln!("{} {}", "ERROR:".red(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("error", message));
            }
        }
    }

    pub fn warning(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                eprintln!("{} {}", "WARNING:".yellow(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("warning", message));
            }
            OutputMode::Quiet => {}
        }
    }

    pub fn success(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", "✓".green(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("success", message));
            }
            OutputMode::Quiet => {}
        }
    }

    pub fn info(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", "INFO:".blue(), message);
            }
            OutputMode::Json => {
                self.json_results.push(JsonResultEntry::new("info", message));
            }
            OutputMode::Quiet => {}
        }
    }

    pub fn section(&mut self, title: &str) {
        if self.mode == OutputMode::Human {
            println!("{}", format!("=== {title} ===").cyan());
        }
    }

    /// Lists tool declarations. Quiet mode prints bare names.
    pub fn report_tools(&mut self, definitions: &[&ToolDefinition]) {
        match self.mode {
            OutputMode::Human => {
                self.section("Tools");
                for def in definitions {
                    println!("{}", def.name.bold());
                    println!("    {}", def.description);
                    for field in &def.fields {
                        let marker = if field.required { "required" } else { "optional" };
                        println!(
                            "    {} {} ({}) {}",
                            "-".dimmed(),
                            field.name,
                            marker,
                            field.description.dimmed()
                        );
                    }
                }
            }
            OutputMode::Json => {
                for def in definitions {
                    let mut entry = JsonResultEntry::new("tool", &def.name);
                    entry.details = Some(def.description.clone());
                    entry.data = Some(Value::Object(def.input_schema()));
                    self.json_results.push(entry);
                }
            }
            OutputMode::Quiet => {
                for def in definitions {
                    println!("{}", def.name);
                }
            }
        }
    }

    /// Prints the result of a tool call. The result body is printed even in
    /// quiet mode since it is the command's output.
    pub fn report_outcome(&mut self, tool: &str, outcome: &ToolOutcome) {
        match self.mode {
            OutputMode::Human | OutputMode::Quiet => {
                if outcome.is_error {
                    eprintln!("{} {}", "ERROR:".red(), outcome.text);
                } else {
                    println!("{}", outcome.text);
                }
            }
            OutputMode::Json => {
                let mut entry = if outcome.is_error {
                    JsonResultEntry::new("error", tool)
                } else {
                    JsonResultEntry::new("success", tool)
                };
                match serde_json::from_str::<Value>(&outcome.text) {
                    Ok(value) if !outcome.is_error => entry.data = Some(value),
                    _ => entry.details = Some(outcome.text.clone()),
                }
                self.json_results.push(entry);
            }
        }
    }

    pub fn finish(&self) {
        if self.mode == OutputMode::Json {
            let output = JsonOutput {
                results: self.json_results.clone(),
            };
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                println!("{json}");
            }
        }
    }
}
