use codebox_core::{
    Document, FileOptions, Place, Range, SearchOptions, TextSource, View, VisibleState,
};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (codebox benchmark line)\n"
        ));
    }
    // Remove the final '\n' to avoid creating an extra trailing empty line.
    out.pop();
    out
}

fn bench_large_file_open(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("large.txt");
    std::fs::write(&path, large_text(50_000)).unwrap();

    c.bench_function("large_file_open/50k_lines", |b| {
        b.iter(|| {
            let source = TextSource::open_file(black_box(&path), &FileOptions::default()).unwrap();
            black_box(source.line_count());
        })
    });
}

fn bench_typing_in_middle(c: &mut Criterion) {
    let text = large_text(50_000);
    c.bench_function("typing_middle/100_inserts", |b| {
        b.iter_batched(
            || {
                let doc = Document::from_text(&text);
                let mut view = View::default();
                view.set_caret(Place::new(25_000, 10));
                (doc, view)
            },
            |(mut doc, mut view)| {
                for _ in 0..100 {
                    doc.insert_char(&mut view, 'x').unwrap();
                }
                black_box(doc.undo_depth());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_column_edit(c: &mut Criterion) {
    let text = large_text(2_000);
    c.bench_function("column_edit/2k_lines", |b| {
        b.iter_batched(
            || {
                let doc = Document::from_text(&text);
                let mut view = View::default();
                view.set_selection(Range::column(Place::new(0, 7), Place::new(1_999, 7)));
                (doc, view)
            },
            |(mut doc, mut view)| {
                doc.insert_text(&mut view, "// ").unwrap();
                black_box(doc.source().line_len(0).unwrap());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_regex_search(c: &mut Criterion) {
    let source = TextSource::from_text(&large_text(10_000));
    let all = Range::all(&source).unwrap();
    c.bench_function("regex_search/10k_lines", |b| {
        b.iter(|| {
            let found = all
                .get_ranges(&source, r"(?P<range>\d{3}7) the", SearchOptions::default())
                .unwrap();
            black_box(found.len());
        })
    });
}

fn bench_folded_navigation(c: &mut Criterion) {
    let source = TextSource::from_text(&large_text(10_000));
    let mut view = View::default();
    for block in (0..10_000).step_by(10) {
        view.collapse_block(&source, block, block + 8).unwrap();
    }
    assert_eq!(
        view.folding().visible_state_at(&source, 1).unwrap(),
        VisibleState::Hidden
    );

    c.bench_function("folded_navigation/1k_page_downs", |b| {
        b.iter(|| {
            view.set_caret(Place::origin());
            for _ in 0..1_000 {
                view.navigate(&source, |sel, vp| sel.go_page_down(vp, false))
                    .unwrap();
            }
            black_box(view.caret());
        })
    });
}

criterion_group!(
    benches,
    bench_large_file_open,
    bench_typing_in_middle,
    bench_column_edit,
    bench_regex_search,
    bench_folded_navigation
);
criterion_main!(benches);
