//! Default stdin/stdout `Prompter`/`Formatter` implementations. Kept out
//! of `librarian-actions` so the executors stay unit-testable without a
//! terminal (spec §9 design note).

use std::io::{self, Write};

use librarian_actions::{Formatter, Plan, Prompter};
use librarian_core::error::LibraryError;

pub struct StdPrompter;

impl Prompter for StdPrompter {
    fn confirm(&self, prompt: &str) -> librarian_core::Result<bool> {
        print!("{prompt} [y/N] ");
        io::stdout().flush().map_err(io_err)?;
        let mut line = String::new();
        io::stdin().read_line(&mut line).map_err(io_err)?;
        Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
    }

    fn choose(&self, prompt: &str, n: usize) -> librarian_core::Result<Option<usize>> {
        println!("{prompt}");
        println!("enter a number from 1 to {n}, or press Enter to skip:");
        let mut line = String::new();
        io::stdin().read_line(&mut line).map_err(io_err)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(choice) if choice >= 1 && choice <= n => Ok(Some(choice - 1)),
            _ => Ok(None),
        }
    }
}

pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn render_plan(&self, plan: &Plan) {
        println!("plan: {} — {}", plan.action, plan.summary);
        if !plan.record_ids.is_empty() {
            println!("  records: {:?}", plan.record_ids);
        }
    }
}

fn io_err(e: io::Error) -> LibraryError {
    LibraryError::FileSystem {
        path: "<stdio>".to_string(),
        message: e.to_string(),
    }
}
