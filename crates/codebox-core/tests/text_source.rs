use codebox_core::{
    Document, DocumentEvent, EditError, MaskWidth, Place, Range, Style, StyleMask, TextSource,
    View,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn record_events(source: &mut TextSource) -> Rc<RefCell<Vec<DocumentEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    source.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    events
}

#[test]
fn test_from_text_accepts_any_line_ending() {
    for text in ["a\nb\nc", "a\r\nb\r\nc", "a\rb\rc"] {
        let source = TextSource::from_text(text);
        assert_eq!(source.line_count(), 3);
        assert_eq!(source.text(), "a\nb\nc");
    }
}

#[test]
fn test_empty_source_has_one_line() {
    let source = TextSource::new();
    assert_eq!(source.line_count(), 1);
    assert_eq!(source.line_len(0).unwrap(), 0);
    assert!(matches!(
        source.line(1),
        Err(EditError::IndexOutOfRange { index: 1, len: 1 })
    ));
}

#[test]
fn test_line_ids_are_stable_and_unique() {
    let mut doc = Document::from_text("a\nb\nc");
    let mut view = View::default();
    let ids: Vec<_> = (0..3).map(|i| doc.source().line_id(i).unwrap()).collect();

    view.set_caret(Place::new(0, 0));
    doc.insert_text(&mut view, "new\n").unwrap();
    assert_eq!(doc.source().line_id(0).unwrap(), ids[0]);
    assert_eq!(doc.source().line_id(2).unwrap(), ids[1]);
    assert_eq!(doc.source().find_line(ids[2]), Some(3));

    let split = doc.source().line_id(1).unwrap();
    assert!(!ids.contains(&split));
}

#[test]
fn test_edit_emits_one_change_per_command() {
    let mut doc = Document::from_text("one\ntwo\nthree");
    let events = record_events(doc.source_mut());
    let mut view = View::default();
    view.set_selection(Range::new(Place::new(0, 1), Place::new(2, 2)));

    doc.delete_selection(&mut view).unwrap();
    assert_eq!(doc.source().text(), "oree");

    let events = events.borrow();
    let changed: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, DocumentEvent::TextChanged { .. }))
        .collect();
    assert_eq!(
        changed,
        vec![&DocumentEvent::TextChanged { from_line: 0, to_line: 0 }]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        DocumentEvent::LineRemoved { index: 1, count: 2, removed_ids } if removed_ids.len() == 2
    )));
    assert!(events.iter().any(|e| matches!(e, DocumentEvent::RecalcNeeded { .. })));
}

#[test]
fn test_text_changing_can_veto() {
    let mut doc = Document::from_text("");
    doc.source_mut().on_text_changing(|args| {
        if args.text().contains("secret") {
            args.cancel();
        }
    });
    let mut view = View::default();

    assert!(!doc.insert_text(&mut view, "my secret").unwrap());
    assert_eq!(doc.source().text(), "");
    assert!(!doc.can_undo());

    assert!(doc.insert_text(&mut view, "public").unwrap());
    assert_eq!(doc.source().text(), "public");
}

#[test]
fn test_text_changing_can_rewrite_inserted_text() {
    let mut doc = Document::from_text("");
    doc.source_mut().on_text_changing(|args| {
        let upper = args.text().to_uppercase();
        *args.text_mut() = upper;
    });
    let mut view = View::default();

    doc.insert_text(&mut view, "shout").unwrap();
    assert_eq!(doc.source().text(), "SHOUT");
    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "");
}

#[test]
fn test_style_table_capacity() {
    let mut source = TextSource::with_mask_width(MaskWidth::Sixteen);
    for i in 0..16 {
        assert_eq!(source.add_style(Arc::new(Style::named(format!("s{i}")))).unwrap(), i);
    }
    assert!(matches!(
        source.add_style(Arc::new(Style::named("overflow"))),
        Err(EditError::CapacityExceeded { capacity: 16 })
    ));

    let removed = source.styles_mut().remove(3);
    assert!(removed.is_some());
    assert_eq!(source.add_style(Arc::new(Style::named("reuse"))).unwrap(), 3);
}

#[test]
fn test_style_mask_must_reference_populated_slots() {
    let mut source = TextSource::from_text("text");
    let r = Range::new(Place::new(0, 0), Place::new(0, 4));
    let keyword = Arc::new(Style::named("keyword"));
    let mask = r.set_style(&mut source, &keyword).unwrap();

    assert!(matches!(
        r.set_style_mask(&mut source, mask | StyleMask::from_slot(5)),
        Err(EditError::UnknownStyleSlot(5))
    ));
    assert!(source.line(0).unwrap().cells().iter().all(|c| c.style == mask));
}

#[test]
fn test_read_only_style_blocks_typing_inside() {
    let mut doc = Document::from_text("prompt> input");
    let locked = Arc::new(Style::read_only("prompt"));
    Range::new(Place::new(0, 0), Place::new(0, 8))
        .set_style(doc.source_mut(), &locked)
        .unwrap();
    let mut view = View::default();

    view.set_caret(Place::new(0, 3));
    assert!(!doc.insert_char(&mut view, 'x').unwrap());

    view.set_caret(Place::new(0, 13));
    assert!(doc.insert_char(&mut view, '!').unwrap());
    assert_eq!(doc.source().text(), "prompt> input!");
}

#[test]
fn test_column_edit_is_one_text_version() {
    let mut doc = Document::from_text("aaa\nbbb\nccc");
    let events = record_events(doc.source_mut());
    let mut view = View::default();
    view.set_selection(Range::column(Place::new(0, 1), Place::new(2, 1)));

    doc.insert_char(&mut view, 'x').unwrap();
    assert_eq!(doc.source().text(), "axaa\nbxbb\ncxcc");
    assert_eq!(doc.source().text_version(), 1);

    let events = events.borrow();
    let changed: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                DocumentEvent::TextChanged { .. } | DocumentEvent::RecalcWordWrap { .. }
            )
        })
        .collect();
    assert_eq!(
        changed,
        vec![
            &DocumentEvent::RecalcWordWrap { from_line: 0, to_line: 2 },
            &DocumentEvent::TextChanged { from_line: 0, to_line: 2 },
        ]
    );
}

#[test]
fn test_batch_without_changes_keeps_text_version() {
    let mut source = TextSource::from_text("a");
    source.begin_update();
    source.need_recalc(0, 0);
    source.end_update();
    assert_eq!(source.text_version(), 0);

    source.text_changed(0, 0);
    assert_eq!(source.text_version(), 1);
}
