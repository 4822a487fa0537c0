use codebox_core::{Document, Place, Range, SearchOptions, View};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut doc = Document::from_text("fn main() {\n}");
    let mut view = View::default();

    // Typing: each keystroke is one undo step unless grouped.
    view.set_caret(Place::new(0, 11));
    doc.begin_auto_undo();
    doc.insert_char(&mut view, '\n').unwrap();
    doc.insert_char(&mut view, '\t').unwrap();
    doc.insert_text(&mut view, "let total = 0;\n").unwrap();
    doc.end_auto_undo();
    assert_eq!(doc.source().text(), "fn main() {\n    let total = 0;\n}");

    // Rename every whole-word occurrence as one step.
    let all = Range::all(doc.source()).unwrap();
    let hits = all
        .get_ranges(doc.source(), "total", SearchOptions::literal().with_whole_word(true))
        .unwrap();
    doc.replace_ranges(&mut view, hits, "sum").unwrap();
    assert_eq!(doc.source().line_text(1).unwrap(), "    let sum = 0;");

    doc.undo(&mut view).unwrap();
    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "fn main() {\n}");

    doc.redo(&mut view).unwrap();
    println!("{}", doc.source().text());
}
