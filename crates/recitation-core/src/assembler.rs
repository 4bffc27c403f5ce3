//! Document assembly.
//!
//! Turns a [`ViewMode`] into a [`Document`]. Assembly fails partially: a
//! section that cannot be resolved is logged and left out, the remaining
//! sections still make it into the document in ordinal order. A window in
//! which nothing qualifies yields an empty document, which the controller
//! treats as "nothing to play".

use crate::content::ContentSource;
use crate::model::{Document, Section, SectionId, ViewMode};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Assemble the document for `mode`. Never fails; unresolvable sections are
/// skipped.
pub fn assemble<S: ContentSource + ?Sized>(source: &S, mode: ViewMode) -> Document {
    let sections = match mode {
        ViewMode::WholeSection(id) => match source.resolve_section(id) {
            Ok(section) => vec![section],
            Err(err) => {
                warn!(section = id, "Failed to resolve section: {err:#}");
                Vec::new()
            }
        },
        ViewMode::WholePart(number) => match source.index().part_page_range(number) {
            Some(pages) => collect_window(source, pages),
            None => {
                warn!(part = number, "Unknown part requested");
                Vec::new()
            }
        },
        ViewMode::SinglePage(page) => collect_window(source, page..page.saturating_add(1)),
    };
    let document = Document::new(mode, sections);
    info!(
        %mode,
        sections = document.sections().len(),
        verses = document.verse_count(),
        "Assembled document"
    );
    document
}

/// Every section's verses printed on `pages`, in section order.
fn collect_window<S: ContentSource + ?Sized>(source: &S, pages: Range<u32>) -> Vec<Section> {
    let ids: Vec<SectionId> = source.index().section_ids().collect();
    let mut sections = Vec::new();
    for id in ids {
        let section = match source.resolve_section(id) {
            Ok(section) => section,
            Err(err) => {
                warn!(section = id, "Skipping section that failed to load: {err:#}");
                continue;
            }
        };
        if let Some(window) = section.restricted(|page| pages.contains(&page)) {
            debug!(section = id, verses = window.verses.len(), "Section in window");
            sections.push(window);
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticCorpus;
    use crate::model::Position;
    use crate::testing::{part, section};

    fn corpus() -> StaticCorpus {
        StaticCorpus::new(
            vec![
                section(1, &[1, 1, 1, 1, 1, 1, 1]),
                section(2, &[2, 2, 3, 3, 4]),
                section(3, &[4, 5]),
                section(4, &[5, 6]),
                section(5, &[6, 6]),
                section(6, &[6, 7]),
            ],
            vec![part(1, 1), part(2, 4)],
            7,
        )
    }

    fn section_ids(doc: &Document) -> Vec<SectionId> {
        doc.sections().iter().map(Section::number).collect()
    }

    #[test]
    fn whole_section_holds_every_verse() {
        let doc = assemble(&corpus(), ViewMode::WholeSection(2));
        assert_eq!(section_ids(&doc), vec![2]);
        assert_eq!(doc.verse_count(), 5);
    }

    #[test]
    fn whole_part_filters_to_page_range() {
        let doc = assemble(&corpus(), ViewMode::WholePart(1));
        assert_eq!(section_ids(&doc), vec![1, 2]);
        assert_eq!(doc.verse_count(), 11);
        assert!(!doc.contains(Position::new(2, 5)));
    }

    #[test]
    fn last_part_reaches_final_page() {
        let doc = assemble(&corpus(), ViewMode::WholePart(2));
        assert_eq!(section_ids(&doc), vec![2, 3, 4, 5, 6]);
        assert!(doc.contains(Position::new(6, 2)));
    }

    #[test]
    fn failing_section_is_omitted_from_part() {
        let doc = assemble(&corpus().fail_section(5), ViewMode::WholePart(2));
        assert_eq!(section_ids(&doc), vec![2, 3, 4, 6]);
    }

    #[test]
    fn single_page_spans_sections() {
        let doc = assemble(&corpus(), ViewMode::SinglePage(6));
        assert_eq!(section_ids(&doc), vec![4, 5, 6]);
        assert_eq!(doc.first_position(), Some(Position::new(4, 2)));
    }

    #[test]
    fn empty_window_yields_empty_document() {
        assert!(assemble(&corpus(), ViewMode::SinglePage(99)).is_empty());
        assert!(assemble(&corpus(), ViewMode::WholePart(9)).is_empty());
        assert!(assemble(&corpus().fail_section(3), ViewMode::WholeSection(3)).is_empty());
    }
}
