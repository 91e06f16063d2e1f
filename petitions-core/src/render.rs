//! Plain text rendering of the list and detail screens
use std::fmt::{self, Display, Write};

use crate::{model::Petition, store::LoadState};

/// Width rows are wrapped to
pub const ROW_WIDTH: usize = 72;
/// Lines of body text shown in a list row
pub const SNIPPET_LINES: usize = 2;

/// Shrink `text` to at most `max_lines` lines of `width` characters.
///
/// Whitespace is collapsed, words are wrapped greedily and an ellipsis marks
/// truncated text. A single word longer than `width` is cut and ends in an
/// ellipsis as well.
pub fn snippet(text: &str, max_lines: usize, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut truncated = false;

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if lines.len() == max_lines {
            truncated = true;
            break;
        }
        if word.chars().count() > width {
            current = word.chars().take(width.saturating_sub(3)).collect();
            current.push_str("...");
        } else {
            current = word.to_string();
        }
    }
    if !truncated && !current.is_empty() {
        if lines.len() == max_lines {
            truncated = true;
        } else {
            lines.push(current);
        }
    }

    if truncated {
        if let Some(last) = lines.last_mut() {
            while last.chars().count() + 3 > width && last.pop().is_some() {}
            last.push_str("...");
        }
    }
    lines
}

/// One row of the list screen: title, a short body snippet and the link
pub struct PetitionRow<'a>(pub &'a Petition);

impl Display for PetitionRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let petition = self.0;
        writeln!(f, "{}", petition.title)?;
        for line in snippet(&petition.body, SNIPPET_LINES, ROW_WIDTH) {
            writeln!(f, "    {line}")?;
        }
        let url = snippet(&petition.url, 1, ROW_WIDTH);
        write!(f, "    {}", url.first().map(String::as_str).unwrap_or_default())
    }
}

/// The detail screen of a single petition
pub struct PetitionDetail<'a> {
    /// Petition to show
    pub petition: &'a Petition,
    /// Whether a confirmation prompt is shown below the details
    pub show_confirmation: bool,
}

impl Display for PetitionDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.petition.title)?;
        writeln!(f)?;
        writeln!(f, "{}", self.petition.body)?;
        writeln!(f)?;
        write!(f, "Signature Count: {}", self.petition.signature_count)?;
        if self.show_confirmation {
            writeln!(f)?;
            write!(f, "Sign this petition at {}? [y/N]", self.petition.url)?;
        }
        Ok(())
    }
}

/// The list screen. Shows a loading placeholder until the store received
/// its first list.
pub struct ListView<'a> {
    /// Whether the store has published yet
    pub state: LoadState,
    /// Current list, in server order
    pub petitions: &'a [Petition],
}

impl Display for ListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            LoadState::Loading => f.write_str("Loading petitions..."),
            LoadState::Loaded { .. } if self.petitions.is_empty() => {
                f.write_str("No petitions")
            }
            LoadState::Loaded { .. } => {
                let mut out = String::from("Petitions\n");
                for petition in self.petitions {
                    out.push('\n');
                    writeln!(out, "{}", PetitionRow(petition))?;
                }
                f.write_str(out.trim_end())
            }
        }
    }
}
