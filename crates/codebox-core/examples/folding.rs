use codebox_core::{Document, Place, Range, SearchOptions, View, VisibleState};

fn main() {
    let mut doc = Document::from_text("// demo\nfn a() {\n    1\n}\n\nfn b() {\n    2\n}");
    Range::all(doc.source())
        .unwrap()
        .set_folding_markers(doc.source_mut(), r"\{", r"\}", SearchOptions::default())
        .unwrap();

    let mut view = View::default();
    let folded = view.folding_mut().collapse_all_folding_blocks(doc.source()).unwrap();
    assert_eq!(folded, 2);

    // Editing above a fold keeps it collapsed: folds are keyed by line identity.
    view.set_caret(Place::new(0, 0));
    doc.insert_text(&mut view, "use std::fmt;\n\n").unwrap();
    let state = view.folding().visible_state_at(doc.source(), 7).unwrap();
    assert_eq!(state, VisibleState::StartOfHiddenBlock);

    // Navigation skips hidden lines.
    view.set_caret(Place::new(3, 0));
    view.navigate(doc.source(), |sel, vp| sel.go_down(vp, false)).unwrap();
    assert_eq!(view.caret().line, 6);

    for i in 0..doc.source().line_count() {
        let state = view.folding().visible_state_at(doc.source(), i).unwrap();
        if state != VisibleState::Hidden {
            println!("{i:>3} {}", doc.source().line_text(i).unwrap());
        }
    }
}
