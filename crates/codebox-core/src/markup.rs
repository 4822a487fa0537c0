//! Range-level style and folding-marker markup.

use crate::error::EditResult;
use crate::range::Range;
use crate::search::SearchOptions;
use crate::source::TextSource;
use crate::style::{Style, StyleMask};
use std::sync::Arc;

impl Range {
    /// OR `mask` into every character of the range.
    ///
    /// Fails with [`EditError::UnknownStyleSlot`](crate::EditError::UnknownStyleSlot) if
    /// the mask names an unpopulated slot.
    pub fn set_style_mask(&self, source: &mut TextSource, mask: StyleMask) -> EditResult<()> {
        source.styles().validate(mask)?;
        for (y, from, to) in self.char_spans(source)? {
            let line = source.line_mut(y)?;
            for x in from..to {
                if let Some(cell) = line.get_mut(x) {
                    cell.style |= mask;
                }
            }
        }
        Ok(())
    }

    /// Register `style` (if needed) and apply it to the range. Returns the style's mask.
    pub fn set_style(&self, source: &mut TextSource, style: &Arc<Style>) -> EditResult<StyleMask> {
        let slot = source.add_style(Arc::clone(style))?;
        let mask = StyleMask::from_slot(slot);
        self.set_style_mask(source, mask)?;
        Ok(mask)
    }

    /// Apply `style` to every match of `pattern` inside the range.
    pub fn set_style_by_pattern(
        &self,
        source: &mut TextSource,
        style: &Arc<Style>,
        pattern: &str,
        options: SearchOptions,
    ) -> EditResult<StyleMask> {
        let slot = source.add_style(Arc::clone(style))?;
        let mask = StyleMask::from_slot(slot);
        for found in self.get_ranges(source, pattern, options)? {
            found.set_style_mask(source, mask)?;
        }
        Ok(mask)
    }

    /// Remove the bits of `mask` from every character of the range.
    pub fn clear_style(&self, source: &mut TextSource, mask: StyleMask) -> EditResult<()> {
        for (y, from, to) in self.char_spans(source)? {
            let line = source.line_mut(y)?;
            for x in from..to {
                if let Some(cell) = line.get_mut(x) {
                    cell.style = cell.style & !mask;
                }
            }
        }
        Ok(())
    }

    /// Mark lines of the range matching `start_pattern` / `end_pattern` as folding block
    /// boundaries.
    ///
    /// Both markers store `start_pattern`, so an end marker pairs with the start marker
    /// of the same pattern.
    pub fn set_folding_markers(
        &self,
        source: &mut TextSource,
        start_pattern: &str,
        end_pattern: &str,
        options: SearchOptions,
    ) -> EditResult<()> {
        let starts = self.get_ranges(source, start_pattern, options)?;
        let ends = self.get_ranges(source, end_pattern, options)?;
        for found in starts {
            source.line_mut(found.start().line)?.folding_start_marker =
                Some(start_pattern.to_string());
        }
        for found in ends {
            source.line_mut(found.start().line)?.folding_end_marker =
                Some(start_pattern.to_string());
        }
        Ok(())
    }

    /// Remove folding markers from every line of the range.
    pub fn clear_folding_markers(&self, source: &mut TextSource) -> EditResult<()> {
        for y in self.from_line()..=self.to_line() {
            let line = source.line_mut(y)?;
            line.folding_start_marker = None;
            line.folding_end_marker = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folding::FoldingState;
    use crate::place::Place;
    use crate::EditError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_and_clear_style() {
        let mut source = TextSource::from_text("hello world");
        let keyword = Arc::new(Style::named("keyword"));
        let r = Range::new(Place::new(0, 0), Place::new(0, 5));
        let mask = r.set_style(&mut source, &keyword).unwrap();

        let line = source.line(0).unwrap();
        assert!(line.cells()[..5].iter().all(|c| c.style == mask));
        assert!(line.cells()[5..].iter().all(|c| c.style.is_empty()));

        r.clear_style(&mut source, mask).unwrap();
        assert!(source.line(0).unwrap().cells().iter().all(|c| c.style.is_empty()));
    }

    #[test]
    fn test_unpopulated_mask_is_rejected() {
        let mut source = TextSource::from_text("abc");
        let r = Range::new(Place::new(0, 0), Place::new(0, 3));
        assert!(matches!(
            r.set_style_mask(&mut source, StyleMask::from_slot(3)),
            Err(EditError::UnknownStyleSlot(3))
        ));
    }

    #[test]
    fn test_set_style_by_pattern() {
        let mut source = TextSource::from_text("fn a() {}\nfn b() {}");
        let keyword = Arc::new(Style::named("keyword"));
        let all = Range::all(&source).unwrap();
        let mask = all
            .set_style_by_pattern(&mut source, &keyword, r"\bfn\b", SearchOptions::default())
            .unwrap();
        for y in 0..2 {
            let line = source.line(y).unwrap();
            assert_eq!(line.cells()[0].style, mask);
            assert_eq!(line.cells()[1].style, mask);
            assert!(line.cells()[2].style.is_empty());
        }
    }

    #[test]
    fn test_folding_markers_pair_up() {
        let mut source = TextSource::from_text("a {\n  b\n}\nc");
        let all = Range::all(&source).unwrap();
        all.set_folding_markers(&mut source, r"\{", r"\}", SearchOptions::default())
            .unwrap();
        assert_eq!(
            source.line(0).unwrap().folding_start_marker.as_deref(),
            Some(r"\{")
        );
        assert_eq!(
            source.line(2).unwrap().folding_end_marker.as_deref(),
            Some(r"\{")
        );
        let pairs = FoldingState::folding_pairs(&source, 0..source.line_count()).unwrap();
        assert_eq!(pairs.get(&0), Some(&2));

        all.clear_folding_markers(&mut source).unwrap();
        assert!(source.line(0).unwrap().folding_start_marker.is_none());
        assert!(source.line(2).unwrap().folding_end_marker.is_none());
    }
}
