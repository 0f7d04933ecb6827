use anyhow::Result;
use inquire::{Confirm, MultiSelect, Select};
use namelint_core::{CaseStyle, Violation};
use similar::{ChangeTag, TextDiff};
use std::fmt;

/// One offered rename in the fix prompt.
pub struct Choice<'a> {
    pub violation: &'a Violation,
}

impl fmt::Display for Choice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suggested = self.violation.suggested_name.as_deref().unwrap_or("?");
        write!(
            f,
            "{}  ->  {}",
            self.violation.entry.display_path(),
            highlight_rename(self.violation.entry.name(), suggested)
        )
    }
}

/// Asks which of the fixable violations to rename. Everything starts selected;
/// `None` means the user pressed Esc.
pub fn select_renames(fixable: &[&Violation]) -> Result<Option<Vec<Violation>>> {
    let choices: Vec<Choice> = fixable.iter().map(|v| Choice { violation: *v }).collect();
    let all: Vec<usize> = (0..choices.len()).collect();

    let picked = MultiSelect::new("Select the renames to apply:", choices)
        .with_default(&all)
        .with_page_size(15)
        .with_help_message("space to toggle, enter to apply, esc to cancel")
        .prompt_skippable()?;

    Ok(picked.map(|choices| choices.into_iter().map(|c| c.violation.clone()).collect()))
}

pub fn select_style(message: &str, default: CaseStyle) -> Result<CaseStyle> {
    let start = CaseStyle::ALL
        .iter()
        .position(|s| *s == default)
        .unwrap_or(0);

    let style = Select::new(message, CaseStyle::ALL.to_vec())
        .with_starting_cursor(start)
        .prompt()?;

    Ok(style)
}

pub fn confirm(message: &str, default: bool) -> Result<bool> {
    let answer = Confirm::new(message).with_default(default).prompt()?;
    Ok(answer)
}

/// Renders `new` with the characters that differ from `old` coloured: removed
/// ones in red, inserted ones in green.
pub fn highlight_rename(old: &str, new: &str) -> String {
    let diff = TextDiff::from_chars(old, new);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let style = match change.tag() {
            ChangeTag::Delete => "\x1b[31m", // Red
            ChangeTag::Insert => "\x1b[32m", // Green
            ChangeTag::Equal => "",
        };
        if style.is_empty() {
            output.push_str(change.value());
        } else {
            output.push_str(style);
            output.push_str(change.value());
            output.push_str("\x1b[0m");
        }
    }

    output
}
