use codebox_core::{BACKSPACE, Command, Document, HistoryConfig, Place, Range, Style, View};
use std::sync::Arc;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_place(doc: &Document, rng: &mut StdRng) -> Place {
    let source = doc.source();
    let line = rng.gen_range(0..source.line_count());
    let ch = rng.gen_range(0..=source.line_len(line).unwrap());
    Place::new(line, ch)
}

fn random_command(doc: &Document, view: &mut View, rng: &mut StdRng) -> Command {
    match rng.gen_range(0..6) {
        0 => {
            view.set_caret(random_place(doc, rng));
            let ch = ['a', 'z', ' ', '\t', '\n', BACKSPACE][rng.gen_range(0..6)];
            Command::insert_char(ch)
        }
        1 | 2 => {
            view.set_caret(random_place(doc, rng));
            let text = ["x", "hello", "a\nb", "\tc", "\n\n", "ßü"][rng.gen_range(0..6)];
            Command::insert_text(text)
        }
        3 | 4 => {
            let a = random_place(doc, rng);
            let b = random_place(doc, rng);
            view.set_selection(Range::new(a, b));
            Command::clear_selected()
        }
        _ => {
            view.set_caret(Place::new(0, 0));
            let count = doc.source().line_count();
            let first = rng.gen_range(0..count);
            let second = rng.gen_range(0..count);
            Command::remove_lines([first, second])
        }
    }
}

fn whole_text(doc: &Document) -> String {
    let source = doc.source();
    Range::all(source).unwrap().text(source).unwrap()
}

#[test]
fn test_undo_redo_basic() {
    let mut doc = Document::from_text("hello");
    let mut view = View::default();
    view.set_caret(Place::new(0, 5));

    doc.insert_text(&mut view, " world").unwrap();
    assert_eq!(doc.source().text(), "hello world");
    assert!(doc.can_undo());
    assert!(!doc.can_redo());

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "hello");
    assert_eq!(view.caret(), Place::new(0, 5));
    assert!(doc.can_redo());

    doc.redo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "hello world");
    assert_eq!(view.caret(), Place::new(0, 11));
}

#[test]
fn test_undo_redo_on_empty_history() {
    let mut doc = Document::from_text("abc");
    let mut view = View::default();
    assert!(!doc.undo(&mut view).unwrap());
    assert!(!doc.redo(&mut view).unwrap());
    assert_eq!(doc.source().text(), "abc");
}

#[test]
fn test_undo_redo_tab_expansion() {
    let mut doc = Document::from_text("ab");
    let mut view = View::default();
    view.set_caret(Place::new(0, 2));

    doc.insert_char(&mut view, '\t').unwrap();
    assert_eq!(doc.source().line_text(0).unwrap(), "ab  ");
    assert_eq!(view.caret(), Place::new(0, 4));

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().line_text(0).unwrap(), "ab");
    assert_eq!(view.caret(), Place::new(0, 2));
}

#[test]
fn test_undo_redo_remove_lines_out_of_order() {
    let mut doc = Document::from_text("zero\none\ntwo");
    let mut view = View::default();

    doc.remove_lines(&mut view, &[2, 0]).unwrap();
    assert_eq!(doc.source().text(), "one");

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "zero\none\ntwo");

    doc.redo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "one");
}

#[test]
fn test_undo_redo_remove_every_line() {
    let mut doc = Document::from_text("a\nb");
    let mut view = View::default();

    doc.remove_lines(&mut view, &[0, 1]).unwrap();
    assert_eq!(doc.source().line_count(), 1);
    assert_eq!(doc.source().text(), "");

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "a\nb");
}

#[test]
fn test_undo_redo_auto_undo_group() {
    let mut doc = Document::from_text("");
    let mut view = View::default();

    doc.begin_auto_undo();
    for ch in "let".chars() {
        doc.insert_char(&mut view, ch).unwrap();
    }
    doc.end_auto_undo();
    doc.insert_char(&mut view, ' ').unwrap();
    assert_eq!(doc.undo_depth(), 4);

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "let");
    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "");
    assert_eq!(doc.redo_depth(), 4);

    doc.redo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "let");
    assert_eq!(view.caret(), Place::new(0, 3));
}

#[test]
fn test_undo_redo_new_edit_clears_redo() {
    let mut doc = Document::from_text("");
    let mut view = View::default();
    doc.insert_char(&mut view, 'a').unwrap();
    doc.undo(&mut view).unwrap();
    assert!(doc.can_redo());

    doc.insert_char(&mut view, 'b').unwrap();
    assert!(!doc.can_redo());
    assert_eq!(doc.source().text(), "b");
}

#[test]
fn test_undo_redo_history_limit() {
    let mut doc = Document::from_text("").with_history(HistoryConfig::default().with_max_undo(5));
    let mut view = View::default();
    for _ in 0..12 {
        doc.insert_char(&mut view, 'x').unwrap();
    }
    assert_eq!(doc.undo_depth(), 5);

    while doc.undo(&mut view).unwrap() {}
    assert_eq!(doc.source().text(), "x".repeat(7));
}

#[test]
fn test_undo_redo_clean_state() {
    let mut doc = Document::from_text("");
    let mut view = View::default();
    assert!(doc.is_clean());

    doc.insert_char(&mut view, 'a').unwrap();
    doc.mark_clean();
    doc.insert_char(&mut view, 'b').unwrap();
    assert!(!doc.is_clean());

    doc.undo(&mut view).unwrap();
    assert!(doc.is_clean());
    doc.undo(&mut view).unwrap();
    assert!(!doc.is_clean());
    doc.redo(&mut view).unwrap();
    assert!(doc.is_clean());
}

#[test]
fn test_undo_redo_random_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut doc = Document::from_text("fn main() {\n    let x = 1;\n}\n");
    let mut view = View::default();

    let mut before = Vec::new();
    let mut after = Vec::new();
    for _ in 0..150 {
        let cmd = random_command(&doc, &mut view, &mut rng);
        let state = (doc.source().text(), *view.selection());
        let version = doc.source().text_version();
        if doc.execute(&mut view, cmd).unwrap() {
            assert_eq!(doc.source().text_version(), version + 1);
            before.push(state);
            after.push((doc.source().text(), *view.selection()));
        } else {
            assert_eq!(doc.source().text_version(), version);
        }
    }
    assert!(!before.is_empty());
    assert_eq!(doc.undo_depth(), before.len());

    for (text, selection) in before.iter().rev() {
        let version = doc.source().text_version();
        assert!(doc.undo(&mut view).unwrap());
        assert_eq!(doc.source().text_version(), version + 1);
        assert_eq!(&doc.source().text(), text);
        assert_eq!(&whole_text(&doc), &text.replace('\n', "\r\n"));
        assert_eq!(view.selection(), selection);
    }
    assert!(!doc.can_undo());

    for (text, selection) in &after {
        let version = doc.source().text_version();
        assert!(doc.redo(&mut view).unwrap());
        assert_eq!(doc.source().text_version(), version + 1);
        assert_eq!(&doc.source().text(), text);
        assert_eq!(&whole_text(&doc), &text.replace('\n', "\r\n"));
        assert_eq!(view.selection(), selection);
    }
    assert!(!doc.can_redo());
}

#[test]
fn test_undo_redo_group_is_one_text_version() {
    let mut doc = Document::from_text("");
    let mut view = View::default();

    doc.begin_auto_undo();
    for ch in "abc".chars() {
        doc.insert_char(&mut view, ch).unwrap();
    }
    assert_eq!(doc.source().text_version(), 0);
    doc.end_auto_undo();
    assert_eq!(doc.source().text_version(), 1);

    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "");
    assert_eq!(doc.source().text_version(), 2);
    doc.redo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "abc");
    assert_eq!(doc.source().text_version(), 3);
}

fn lock_prefix(doc: &mut Document, len: usize) {
    let locked = Arc::new(Style::read_only("locked"));
    Range::new(Place::new(0, 0), Place::new(0, len))
        .set_style(doc.source_mut(), &locked)
        .unwrap();
}

#[test]
fn test_replace_skips_read_only_text() {
    let mut doc = Document::from_text("locked text");
    lock_prefix(&mut doc, 6);
    let mut view = View::default();

    let locked = Range::new(Place::new(0, 0), Place::new(0, 6));
    assert!(!doc.replace_ranges(&mut view, vec![locked], "X").unwrap());
    assert_eq!(doc.source().text(), "locked text");
    assert!(!doc.can_undo());

    let free = Range::new(Place::new(0, 7), Place::new(0, 11));
    assert!(doc.replace_ranges(&mut view, vec![free], "X").unwrap());
    assert_eq!(doc.source().text(), "locked X");
}

#[test]
fn test_remove_lines_skips_read_only_lines() {
    let mut doc = Document::from_text("locked text\nfree");
    lock_prefix(&mut doc, 6);
    let mut view = View::default();

    assert!(!doc.remove_lines(&mut view, &[0]).unwrap());
    assert!(!doc.remove_lines(&mut view, &[1, 0]).unwrap());
    assert_eq!(doc.source().text(), "locked text\nfree");
    assert!(!doc.can_undo());

    assert!(doc.remove_lines(&mut view, &[1]).unwrap());
    assert_eq!(doc.source().text(), "locked text");
}
