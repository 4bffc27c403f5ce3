//! Plain-text rendering for the terminal front-end.

use crate::config::TextMode;
use once_cell::sync::Lazy;
use recitation_core::{
    BookmarkRequest, CorpusIndex, Document, Footnote, PlaybackState, Section, StateChange, Verse,
};
use regex::Regex;
use std::fmt::Write as _;

static RE_FOOTNOTE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d+)\]").unwrap());

/// Render `n` with Arabic-Indic digits, the way verse ends are marked in the
/// printed text.
pub fn arabic_digits(n: u32) -> String {
    n.to_string()
        .chars()
        .map(|ch| match ch.to_digit(10) {
            Some(digit) => char::from_u32(0x0660 + digit).unwrap_or(ch),
            None => ch,
        })
        .collect()
}

/// Replace `[n]` markers with superscript numbers and collect the notes they
/// point at. Markers without a matching footnote are dropped.
pub fn resolve_footnotes(translation: &str, footnotes: &[Footnote]) -> (String, Vec<String>) {
    let mut notes = Vec::new();
    let text = RE_FOOTNOTE_MARKER.replace_all(translation, |caps: &regex::Captures<'_>| {
        let id: u32 = caps[1].parse().unwrap_or(0);
        match footnotes.iter().find(|note| note.id == id) {
            Some(note) => {
                notes.push(format!("{} {}", superscript(id), note.note.trim()));
                superscript(id)
            }
            None => String::new(),
        }
    });
    (text.trim().to_string(), notes)
}

fn superscript(n: u32) -> String {
    const DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];
    n.to_string()
        .chars()
        .filter_map(|ch| ch.to_digit(10).map(|d| DIGITS[d as usize]))
        .collect()
}

pub fn format_verse(section: &Section, verse: &Verse, mode: TextMode) -> String {
    let mut out = format!("{}:{}", section.number(), verse.number);
    if mode != TextMode::Translation {
        let _ = write!(
            out,
            " {} \u{FD3F}{}\u{FD3E}",
            verse.text.trim(),
            arabic_digits(u32::from(verse.number))
        );
    }
    if mode == TextMode::Arabic {
        return out;
    }
    let (translation, notes) = resolve_footnotes(&verse.translation, &verse.footnotes);
    if !translation.is_empty() {
        let separator = if mode == TextMode::Both { "\n    " } else { " " };
        let _ = write!(out, "{separator}{translation}");
    }
    for note in notes {
        let _ = write!(out, "\n      {note}");
    }
    out
}

/// One-line summary of an opened view.
pub fn format_document(document: &Document) -> String {
    if document.is_empty() {
        return format!("{}: nothing to recite", document.mode());
    }
    let names = document
        .sections()
        .iter()
        .map(|section| section.info.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{}: {} verses from {}",
        document.mode(),
        document.verse_count(),
        names
    )
}

pub fn format_state(change: &StateChange, document: &Document, mode: TextMode) -> String {
    match (change.state, change.position) {
        (PlaybackState::PreambleActive, _) => {
            let section = change
                .preamble_section
                .and_then(|id| document.section(id))
                .map(|section| section.info.name.clone())
                .unwrap_or_default();
            format!("▶ preamble {section}").trim_end().to_string()
        }
        (PlaybackState::VersePlaying, Some(position)) => {
            match document
                .section(position.section)
                .zip(document.verse(position))
            {
                Some((section, verse)) => format!("▶ {}", format_verse(section, verse, mode)),
                None => format!("▶ {position}"),
            }
        }
        (PlaybackState::Paused, Some(position)) => format!("⏸ paused at {position}"),
        _ => "■ idle".to_string(),
    }
}

pub fn format_sections(index: &CorpusIndex) -> String {
    index
        .sections
        .iter()
        .map(|info| {
            format!(
                "{:>3}. {} {} ({} verses)",
                info.number, info.name, info.native_name, info.verse_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_parts(index: &CorpusIndex) -> String {
    index
        .parts
        .iter()
        .map(|part| {
            let pages = index
                .part_page_range(part.number)
                .map(|range| format!("pages {}-{}", range.start, range.end.saturating_sub(1)))
                .unwrap_or_default();
            format!("{:>2}. {} {pages}", part.number, part.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_bookmarks(bookmarks: &[BookmarkRequest]) -> String {
    if bookmarks.is_empty() {
        return "no bookmarks".to_string();
    }
    bookmarks
        .iter()
        .enumerate()
        .map(|(idx, bookmark)| format!("{:>2}. {}", idx + 1, bookmark.label))
        .collect::<Vec<_>>()
        .join("\n")
}
