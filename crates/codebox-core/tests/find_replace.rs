use codebox_core::{
    Command, Document, EditError, LineEnding, Place, Range, SearchOptions, Style, TextSource,
    View,
};
use pretty_assertions::assert_eq;
use regex::Regex;
use std::sync::Arc;

fn p(line: usize, ch: usize) -> Place {
    Place::new(line, ch)
}

#[test]
fn test_range_text_across_lines() {
    let mut source = TextSource::from_text("abc\ndef");
    let r = Range::new(p(0, 1), p(1, 1));
    assert_eq!(r.text(&source).unwrap(), "bc\r\nd");
    assert_eq!(Range::new(p(1, 1), p(0, 1)).text(&source).unwrap(), "bc\r\nd");

    source.set_text_line_ending(LineEnding::Lf);
    assert_eq!(r.text(&source).unwrap(), "bc\nd");
}

#[test]
fn test_crlf_range_text_still_searches_on_line_feeds() {
    let source = TextSource::from_text("abc\ndef");
    let all = Range::all(&source).unwrap();
    let found = all.get_ranges(&source, "c\nd", SearchOptions::literal()).unwrap();
    assert_eq!(found, vec![Range::new(p(0, 2), p(1, 1))]);
    assert_eq!(found[0].text(&source).unwrap(), "c\r\nd");
}

#[test]
fn test_range_group_matches_regex_captures() {
    let text = "a1 bé22\nxyz3 ñ\nq4 é5é6";
    let pattern = r"(?P<range>[a-zé]+)\d";
    let source = TextSource::from_text(text);

    let expected: Vec<String> = Regex::new(pattern)
        .unwrap()
        .captures_iter(text)
        .map(|caps| caps["range"].to_string())
        .collect();
    let found: Vec<String> = Range::all(&source)
        .unwrap()
        .get_ranges(&source, pattern, SearchOptions::default())
        .unwrap()
        .iter()
        .map(|r| r.text(&source).unwrap())
        .collect();

    assert_eq!(found, expected);
    assert_eq!(found, vec!["a", "bé", "xyz", "q", "é", "é"]);
}

#[test]
fn test_search_inside_sub_range() {
    let source = TextSource::from_text("foo foo\nfoo foo");
    let r = Range::new(p(0, 2), p(1, 5));
    let found = r.get_ranges(&source, "foo", SearchOptions::literal()).unwrap();
    assert_eq!(
        found,
        vec![Range::new(p(0, 4), p(0, 7)), Range::new(p(1, 0), p(1, 3))]
    );
}

#[test]
fn test_case_insensitive_whole_word() {
    let source = TextSource::from_text("Error errors ERROR");
    let all = Range::all(&source).unwrap();
    let options = SearchOptions::default()
        .with_case_sensitive(false)
        .with_whole_word(true);
    let found = all.get_ranges(&source, "error", options).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[1].text(&source).unwrap(), "ERROR");
}

#[test]
fn test_invalid_pattern_is_an_error() {
    let source = TextSource::from_text("abc");
    let all = Range::all(&source).unwrap();
    assert!(matches!(
        all.get_ranges(&source, "[a-", SearchOptions::default()),
        Err(EditError::InvalidRegex(_))
    ));
}

#[test]
fn test_replace_all_matches_in_one_step() {
    let mut doc = Document::from_text("foo = foo + 1;\nbar(foo);");
    let mut view = View::default();
    let all = Range::all(doc.source()).unwrap();
    let ranges = all
        .get_ranges(doc.source(), "foo", SearchOptions::literal().with_whole_word(true))
        .unwrap();
    assert_eq!(ranges.len(), 3);

    doc.replace_ranges(&mut view, ranges, "total").unwrap();
    assert_eq!(doc.source().text(), "total = total + 1;\nbar(total);");
    assert_eq!(doc.undo_depth(), 1);

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "foo = foo + 1;\nbar(foo);");
    doc.redo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "total = total + 1;\nbar(total);");
}

#[test]
fn test_replace_multiple_with_line_breaks() {
    let mut doc = Document::from_text("a,b\nc,d");
    let mut view = View::default();
    let edits = vec![
        (Range::new(p(0, 1), p(0, 2)), "\n".to_string()),
        (Range::new(p(0, 3), p(1, 0)), String::new()),
        (Range::new(p(1, 1), p(1, 2)), ";".to_string()),
    ];

    doc.execute(&mut view, Command::replace_multiple(edits)).unwrap();
    assert_eq!(doc.source().text(), "a\nbc;d");

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "a,b\nc,d");
}

#[test]
fn test_fragment_and_brackets() {
    let source = TextSource::from_text("call(first, second_arg)");
    let word = Range::at(p(0, 14)).fragment(&source, r"[\w]").unwrap();
    assert_eq!(word.text(&source).unwrap(), "second_arg");

    let args = Range::brackets_range(&source, p(0, 8), '(', ')', false)
        .unwrap()
        .unwrap();
    assert_eq!(args.text(&source).unwrap(), "first, second_arg");
}

#[test]
fn test_fragment_by_style() {
    let mut source = TextSource::from_text("say \"hi there\" now");
    let string = Arc::new(Style::named("string"));
    let mask = Range::new(p(0, 4), p(0, 14)).set_style(&mut source, &string).unwrap();

    let fragment = Range::at(p(0, 8)).fragment_by_style(&source, mask, false).unwrap();
    assert_eq!(fragment.text(&source).unwrap(), "\"hi there\"");
}

#[test]
fn test_search_by_lines_never_spans_lines() {
    let mut source = TextSource::from_text("end\nstart end\nstart");
    let all = Range::all(&source).unwrap();
    let spanning = all
        .get_ranges(&source, r"end\nstart", SearchOptions::default())
        .unwrap();
    assert_eq!(spanning.len(), 2);

    let by_lines = all
        .get_ranges_by_lines(&mut source, r"end\nstart", SearchOptions::default())
        .unwrap();
    assert!(by_lines.is_empty());
}

#[test]
fn test_stale_places_are_rejected() {
    let mut doc = Document::from_text("abc");
    let mut view = View::default();

    let stale = Range::new(p(0, 50), p(0, 60));
    assert!(matches!(
        doc.replace_ranges(&mut view, vec![stale], "Z"),
        Err(EditError::IndexOutOfRange { index: 50, len: 3 })
    ));
    assert!(matches!(
        doc.replace_ranges(&mut view, vec![Range::at(p(4, 0))], "Z"),
        Err(EditError::IndexOutOfRange { index: 4, len: 1 })
    ));

    view.set_selection(Range::new(p(0, 1), p(0, 9)));
    assert!(matches!(
        doc.delete_selection(&mut view),
        Err(EditError::IndexOutOfRange { index: 9, len: 3 })
    ));

    assert_eq!(doc.source().text(), "abc");
    assert!(!doc.can_undo());
}
