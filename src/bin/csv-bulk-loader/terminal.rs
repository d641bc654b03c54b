use std::io::{self, Write};

use secrecy::SecretString;

use csv_bulk_loader::interaction::{ColumnChoice, ColumnSample, Prompter, TimestampPreview};
use csv_bulk_loader::store::{Credentials, IndexSummary};
use csv_bulk_loader::{LoaderError, LoaderResult};

/// Prompts on stderr and reads answers from stdin.
pub struct TerminalPrompter;

/// Print `prompt` and read one trimmed line. End of input is an error.
fn read_line(prompt: &str) -> LoaderResult<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let mut buf = String::new();
    if io::stdin().read_line(&mut buf)? == 0 {
        return Err(LoaderError::Interaction {
            message: "stdin closed while waiting for an answer".to_string(),
        });
    }
    Ok(buf.trim().to_string())
}

/// Ask a yes/no question; only `y`/`yes` count as yes.
pub fn confirm(question: &str) -> LoaderResult<bool> {
    let answer = read_line(&format!("{question} [y/N] "))?.to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Let the user pick one of `indices` by number.
pub fn choose_index(indices: &[IndexSummary]) -> LoaderResult<String> {
    eprintln!("Available indices:");
    for (i, summary) in indices.iter().enumerate() {
        eprintln!(
            "  {:>3}. {} ({} docs, {})",
            i + 1,
            summary.index,
            summary
                .docs_count
                .map_or_else(|| "?".to_string(), |n| n.to_string()),
            summary.store_size.as_deref().unwrap_or("?"),
        );
    }
    loop {
        let answer = read_line("Index number: ")?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=indices.len()).contains(&n) => return Ok(indices[n - 1].index.clone()),
            _ => eprintln!("Enter a number between 1 and {}", indices.len()),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn endpoint(&mut self, current: &str, reason: &str) -> LoaderResult<String> {
        if !current.is_empty() {
            eprintln!("Cannot use {current}: {reason}");
        }
        loop {
            let url = read_line("Elasticsearch URL: ")?;
            if !url.is_empty() {
                return Ok(url);
            }
        }
    }

    fn credentials(&mut self, endpoint: &str) -> LoaderResult<Credentials> {
        eprintln!("Authentication failed for {endpoint}");
        let username = read_line("Username: ")?;
        let password = read_line("Password: ")?;
        Ok(Credentials::new(username, SecretString::from(password)))
    }

    fn timestamp_column(
        &mut self,
        columns: &[ColumnSample],
        suggested: Option<&str>,
    ) -> LoaderResult<ColumnChoice> {
        eprintln!("Columns (first row sample):");
        for column in columns {
            eprintln!("  {:>3}. {:<32} {}", column.position, column.name, column.sample);
        }
        let prompt = match suggested {
            Some(name) => format!("Timestamp column number [Enter for '{name}']: "),
            None => "Timestamp column number: ".to_string(),
        };
        loop {
            let answer = read_line(&prompt)?;
            if answer.is_empty() {
                return Ok(ColumnChoice::Suggested);
            }
            match answer.parse::<usize>() {
                Ok(position) => return Ok(ColumnChoice::Position(position)),
                Err(_) => eprintln!("Enter a column number"),
            }
        }
    }

    fn confirm_timestamp(
        &mut self,
        column: &str,
        previews: &[TimestampPreview],
    ) -> LoaderResult<bool> {
        eprintln!("Sample values of '{column}':");
        for preview in previews {
            match &preview.normalized {
                Some(instant) => eprintln!("  {} -> {instant}", preview.raw),
                None => eprintln!("  {} -> (unparseable)", preview.raw),
            }
        }
        confirm("Use this column?")
    }
}
