use crate::model::{Document, Position, ViewMode};

/// Where playback goes after the verse at a position completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Next verse in the document. `entered_section` is set when it lies in
    /// a different section than the one just finished.
    Verse {
        position: Position,
        entered_section: bool,
    },
    /// End of a page view that is not the last page: continue on `page`.
    NextPage(u32),
    Finished,
}

/// Compute the successor of `from` without touching any playback state.
pub fn advance(document: &Document, from: Position, max_page: u32) -> Advance {
    let sections = document.sections();
    let Some(section_idx) = sections
        .iter()
        .position(|section| section.number() == from.section)
    else {
        return Advance::Finished;
    };
    let section = &sections[section_idx];
    let Some(verse_idx) = section
        .verses
        .iter()
        .position(|verse| verse.number == from.verse)
    else {
        return Advance::Finished;
    };

    if let Some(next) = section.verses.get(verse_idx + 1) {
        return Advance::Verse {
            position: Position::new(from.section, next.number),
            entered_section: false,
        };
    }
    if let Some(position) = sections[section_idx + 1..]
        .iter()
        .find_map(|section| section.first_position())
    {
        return Advance::Verse {
            position,
            entered_section: true,
        };
    }
    match document.mode() {
        ViewMode::SinglePage(page) if page < max_page => Advance::NextPage(page + 1),
        _ => Advance::Finished,
    }
}
