//! Regex search over ranges, fragments and bracket matching.
//!
//! Searching flattens a range into a `String` (lines joined with `'\n'`) together with the
//! [`Place`] and byte offset of every character, so a regex match maps straight back to
//! document places. The flattened text is memoized on the [`TextSource`] for the current
//! text version.
//!
//! When a pattern has a capture group named `range`, that group is reported instead of
//! the whole match.

use crate::error::EditResult;
use crate::place::Place;
use crate::range::Range;
use crate::source::TextSource;
use crate::style::StyleMask;
use regex::{Regex, RegexBuilder};
use std::rc::Rc;

/// Steps taken in each direction by [`Range::brackets_range`] before giving up.
pub const MAX_BRACKET_SEARCH_ITERATIONS: usize = 1000;

/// Name of the capture group reported instead of the whole match.
pub const RANGE_GROUP: &str = "range";

/// Options that control how search is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// If `true`, performs a case-sensitive search.
    pub case_sensitive: bool,
    /// If `true`, matches only whole words (alphanumeric and `_`).
    pub whole_word: bool,
    /// If `true`, treats the pattern as a regex; otherwise it is matched literally.
    pub regex: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            whole_word: false,
            regex: true,
        }
    }
}

impl SearchOptions {
    /// Options for a literal (non-regex) search.
    pub fn literal() -> Self {
        Self {
            regex: false,
            ..Self::default()
        }
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set whole-word matching.
    pub fn with_whole_word(mut self, whole_word: bool) -> Self {
        self.whole_word = whole_word;
        self
    }

    /// Set regex interpretation of the pattern.
    pub fn with_regex(mut self, regex: bool) -> Self {
        self.regex = regex;
        self
    }

    /// Compile `pattern` under these options. `^` and `$` match at line boundaries.
    pub fn build_regex(&self, pattern: &str) -> EditResult<Regex> {
        let literal;
        let pattern = if self.regex {
            pattern
        } else {
            literal = regex::escape(pattern);
            literal.as_str()
        };
        Ok(RegexBuilder::new(pattern)
            .case_insensitive(!self.case_sensitive)
            .multi_line(true)
            .build()?)
    }
}

/// A range flattened to text, with the place of every character.
#[derive(Debug)]
pub struct FlatText {
    /// Lines joined with `'\n'`.
    pub text: String,
    /// Place of each character of `text`, plus one trailing entry for the range end.
    pub places: Vec<Place>,
    /// Byte offset in `text` of each entry of `places`.
    offsets: Vec<usize>,
}

impl FlatText {
    fn build(source: &TextSource, from: Place, to: Place) -> EditResult<Self> {
        let mut flat = Self {
            text: String::new(),
            places: Vec::new(),
            offsets: Vec::new(),
        };
        for y in from.line..=to.line {
            let line = source.line(y)?;
            let len = line.len();
            let from_x = if y == from.line { from.ch.min(len) } else { 0 };
            let to_x = if y == to.line { to.ch.min(len) } else { len };
            for x in from_x..to_x.max(from_x) {
                flat.push(line.cells()[x].ch, Place::new(y, x));
            }
            if y != to.line {
                flat.push('\n', Place::new(y, len));
            }
        }
        flat.places.push(to);
        flat.offsets.push(flat.text.len());
        Ok(flat)
    }

    fn push(&mut self, ch: char, place: Place) {
        self.offsets.push(self.text.len());
        self.places.push(place);
        self.text.push(ch);
    }

    /// Place of the character starting at byte `offset` of `text`.
    fn place_at(&self, offset: usize) -> Place {
        let i = self.offsets.partition_point(|&o| o < offset);
        self.places[i.min(self.places.len() - 1)]
    }
}

fn is_word_char(ch: char) -> bool {
    ch == '_' || ch.is_alphanumeric()
}

/// Neither neighbour of the byte span `start..end` continues the word. Line breaks count as
/// separators.
fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    !text[..start].chars().next_back().is_some_and(is_word_char)
        && !text[end..].chars().next().is_some_and(is_word_char)
}

impl Range {
    /// Flattened text of the range (linear interpretation), memoized per text version.
    pub fn flat_text(&self, source: &TextSource) -> EditResult<Rc<FlatText>> {
        let from = self.start().min(self.end());
        let to = self.start().max(self.end());
        if let Some(flat) = source.cached_flat(from, to) {
            return Ok(flat);
        }
        let flat = Rc::new(FlatText::build(source, from, to)?);
        source.store_flat(from, to, Rc::clone(&flat));
        Ok(flat)
    }

    fn ranges_matching(
        &self,
        source: &TextSource,
        re: &Regex,
        whole_word: bool,
    ) -> EditResult<Vec<Range>> {
        let flat = self.flat_text(source)?;
        let mut ranges = Vec::new();
        for caps in re.captures_iter(&flat.text) {
            let Some(m) = caps.name(RANGE_GROUP).or_else(|| caps.get(0)) else {
                continue;
            };
            if m.is_empty() {
                continue;
            }
            if whole_word && !is_whole_word(&flat.text, m.start(), m.end()) {
                continue;
            }
            ranges.push(Range::new(flat.place_at(m.start()), flat.place_at(m.end())));
        }
        Ok(ranges)
    }

    /// Every match of `pattern` inside the range, in document order.
    ///
    /// Empty matches are skipped.
    pub fn get_ranges(
        &self,
        source: &TextSource,
        pattern: &str,
        options: SearchOptions,
    ) -> EditResult<Vec<Range>> {
        let re = options.build_regex(pattern)?;
        self.ranges_matching(source, &re, options.whole_word)
    }

    /// Like [`get_ranges`](Self::get_ranges) but line by line, so matches never span lines.
    ///
    /// Lines of a file-backed document that were not loaded before are unloaded again after
    /// they are searched.
    pub fn get_ranges_by_lines(
        &self,
        source: &mut TextSource,
        pattern: &str,
        options: SearchOptions,
    ) -> EditResult<Vec<Range>> {
        let re = options.build_regex(pattern)?;
        let whole = self.normalized();
        let mut ranges = Vec::new();
        for y in whole.from_line()..=whole.to_line() {
            let was_loaded = source.is_line_loaded(y);
            let line_range = Range::lines(source, y, y)?.intersection_with(&whole);
            ranges.extend(line_range.ranges_matching(source, &re, options.whole_word)?);
            if !was_loaded {
                source.unload_line(y);
            }
        }
        Ok(ranges)
    }

    /// The run of characters around the caret whose every character matches `pattern`.
    ///
    /// Walks through folded lines.
    pub fn fragment(&self, source: &TextSource, pattern: &str) -> EditResult<Range> {
        let re = SearchOptions::default().build_regex(pattern)?;
        let matches = |c: char| {
            let mut buf = [0u8; 4];
            re.is_match(c.encode_utf8(&mut buf))
        };

        let mut r = Range::at(self.start());
        while r.go_left_through_folded(source)? {
            if !matches(r.char_after_start(source)?) {
                r.go_right_through_folded(source)?;
                break;
            }
        }
        let start = r.start();

        let mut r = Range::at(self.start());
        loop {
            if !matches(r.char_after_start(source)?) || !r.go_right_through_folded(source)? {
                break;
            }
        }
        Ok(Range::new(start, r.start()))
    }

    /// The run of characters around the caret carrying any style of `mask`.
    ///
    /// With `allow_line_breaks == false` the run stops at line boundaries.
    pub fn fragment_by_style(
        &self,
        source: &TextSource,
        mask: StyleMask,
        allow_line_breaks: bool,
    ) -> EditResult<Range> {
        let styled = |p: Place| -> EditResult<Option<bool>> {
            let line = source.line(p.line)?;
            Ok(line.get(p.ch).map(|cell| cell.style.intersects(mask)))
        };

        let mut r = Range::at(self.start());
        while r.go_left_through_folded(source)? {
            if !allow_line_breaks && r.char_after_start(source)? == '\n' {
                r.go_right_through_folded(source)?;
                break;
            }
            if styled(r.start())? == Some(false) {
                r.go_right_through_folded(source)?;
                break;
            }
        }
        let start = r.start();

        let mut r = Range::at(self.start());
        loop {
            if !allow_line_breaks && r.char_after_start(source)? == '\n' {
                break;
            }
            if styled(r.start())? == Some(false) {
                break;
            }
            if !r.go_right_through_folded(source)? {
                break;
            }
        }
        Ok(Range::new(start, r.start()))
    }

    /// Range between the brackets enclosing `place`, walking through folded lines.
    ///
    /// Gives up after [`MAX_BRACKET_SEARCH_ITERATIONS`] steps in either direction and returns
    /// `None` when the brackets are unbalanced.
    pub fn brackets_range(
        source: &TextSource,
        place: Place,
        left: char,
        right: char,
        include_brackets: bool,
    ) -> EditResult<Option<Range>> {
        let mut r = Range::at(place);
        let mut counter = 0i32;
        let mut budget = MAX_BRACKET_SEARCH_ITERATIONS;
        let mut open = None;
        while r.go_left_through_folded(source)? {
            let c = r.char_after_start(source)?;
            if c == left {
                counter += 1;
            }
            if c == right {
                counter -= 1;
            }
            if counter == 1 {
                let skip = usize::from(!include_brackets);
                open = Some(Place::new(r.start().line, r.start().ch + skip));
                break;
            }
            budget -= 1;
            if budget == 0 {
                break;
            }
        }

        let mut r = Range::at(place);
        let mut counter = 0i32;
        let mut budget = MAX_BRACKET_SEARCH_ITERATIONS;
        let mut close = None;
        loop {
            let c = r.char_after_start(source)?;
            if c == left {
                counter += 1;
            }
            if c == right {
                counter -= 1;
            }
            if counter == -1 {
                let keep = usize::from(include_brackets);
                close = Some(Place::new(r.start().line, r.start().ch + keep));
                break;
            }
            budget -= 1;
            if budget == 0 || !r.go_right_through_folded(source)? {
                break;
            }
        }

        Ok(match (open, close) {
            (Some(open), Some(close)) => Some(Range::new(open, close)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn p(line: usize, ch: usize) -> Place {
        Place::new(line, ch)
    }

    #[test]
    fn test_get_ranges_reports_places() {
        let source = TextSource::from_text("foo bar\nbaz foo");
        let all = Range::all(&source).unwrap();
        let ranges = all.get_ranges(&source, "foo", SearchOptions::default()).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(p(0, 0), p(0, 3)), Range::new(p(1, 4), p(1, 7))]
        );
    }

    #[test]
    fn test_range_group_is_preferred() {
        let source = TextSource::from_text("let x = 1;\nlet yy = 2;");
        let all = Range::all(&source).unwrap();
        let ranges = all
            .get_ranges(&source, r"let (?P<range>\w+)", SearchOptions::default())
            .unwrap();
        let texts: Vec<_> = ranges.iter().map(|r| r.text(&source).unwrap()).collect();
        assert_eq!(texts, vec!["x", "yy"]);
    }

    #[test]
    fn test_match_across_lines_and_non_ascii() {
        let source = TextSource::from_text("héllo\nwörld");
        let all = Range::all(&source).unwrap();
        let ranges = all.get_ranges(&source, "o\nw", SearchOptions::default()).unwrap();
        assert_eq!(ranges, vec![Range::new(p(0, 4), p(1, 1))]);
        assert_eq!(ranges[0].text(&source).unwrap(), "o\r\nw");
    }

    #[test]
    fn test_literal_whole_word_case_insensitive() {
        let source = TextSource::from_text("Foo food foo.bar");
        let all = Range::all(&source).unwrap();
        let options = SearchOptions::literal()
            .with_whole_word(true)
            .with_case_sensitive(false);
        let ranges = all.get_ranges(&source, "foo", options).unwrap();
        assert_eq!(
            ranges,
            vec![Range::new(p(0, 0), p(0, 3)), Range::new(p(0, 9), p(0, 12))]
        );
    }

    #[test]
    fn test_build_regex_escapes_literal_patterns() {
        let re = SearchOptions::literal().build_regex("a.b").unwrap();
        assert!(re.is_match("xa.b"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn test_invalid_regex() {
        let source = TextSource::from_text("x");
        let all = Range::all(&source).unwrap();
        assert!(matches!(
            all.get_ranges(&source, "(", SearchOptions::default()),
            Err(crate::EditError::InvalidRegex(_))
        ));
    }

    #[test]
    fn test_get_ranges_by_lines() {
        let mut source = TextSource::from_text("ab\nab\nab");
        let all = Range::all(&source).unwrap();
        let ranges = all
            .get_ranges_by_lines(&mut source, "b\na", SearchOptions::default())
            .unwrap();
        assert!(ranges.is_empty());
        let ranges = all
            .get_ranges_by_lines(&mut source, "a", SearchOptions::default())
            .unwrap();
        assert_eq!(ranges.len(), 3);
    }

    #[test]
    fn test_fragment() {
        let source = TextSource::from_text("foo bar_baz qux");
        let caret = Range::at(p(0, 6));
        let fragment = caret.fragment(&source, r"\w").unwrap();
        assert_eq!(fragment, Range::new(p(0, 4), p(0, 11)));
    }

    #[test]
    fn test_brackets_range() {
        let source = TextSource::from_text("f(a, (b)\n  c)");
        let inner = Range::brackets_range(&source, p(0, 3), '(', ')', false)
            .unwrap()
            .unwrap();
        assert_eq!(inner.text(&source).unwrap(), "a, (b)\r\n  c");

        let outer = Range::brackets_range(&source, p(0, 3), '(', ')', true)
            .unwrap()
            .unwrap();
        assert_eq!(outer.text(&source).unwrap(), "(a, (b)\r\n  c)");

        let unbalanced = TextSource::from_text("(abc");
        assert_eq!(
            Range::brackets_range(&unbalanced, p(0, 2), '(', ')', false).unwrap(),
            None
        );
    }

    #[test]
    fn test_flat_text_is_memoized_per_version() {
        let mut source = TextSource::from_text("abc");
        let all = Range::all(&source).unwrap();
        let first = all.flat_text(&source).unwrap();
        let second = all.flat_text(&source).unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        source.line_mut(0).unwrap().set_text("xyz");
        source.text_changed(0, 0);
        assert_eq!(all.flat_text(&source).unwrap().text, "xyz");
    }
}
