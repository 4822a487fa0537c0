use codebox_core::{Document, Place, Range, View};

fn main() {
    let mut doc = Document::from_text("alpha = 1\nbeta = 2\n\ngamma = 3");
    let mut view = View::default();

    // Comment out every line in one edit.
    view.set_selection(Range::column(Place::new(0, 0), Place::new(3, 0)));
    doc.insert_text(&mut view, "# ").unwrap();
    assert_eq!(doc.source().text(), "# alpha = 1\n# beta = 2\n# \n# gamma = 3");

    // Paste a multi-line clipboard into a column: lines are dealt out in turn.
    view.set_selection(Range::column(Place::new(0, 2), Place::new(1, 2)));
    doc.insert_text(&mut view, "A \nB ").unwrap();
    assert_eq!(doc.source().line_text(0).unwrap(), "# A alpha = 1");
    assert_eq!(doc.source().line_text(1).unwrap(), "# B beta = 2");

    // The whole column edit undoes in one step.
    doc.undo(&mut view).unwrap();
    doc.undo(&mut view).unwrap();
    assert_eq!(doc.source().text(), "alpha = 1\nbeta = 2\n\ngamma = 3");

    // Past the end of short lines, text is padded; blank lines are skipped.
    view.set_selection(Range::column(Place::new(0, 12), Place::new(3, 12)));
    doc.insert_text(&mut view, "// set").unwrap();
    assert_eq!(doc.source().line_text(1).unwrap(), "beta = 2    // set");
    assert_eq!(doc.source().line_text(2).unwrap(), "");
}
