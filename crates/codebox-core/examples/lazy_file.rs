use codebox_core::{Document, FileOptions, Place, View};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("large.log");
    let body: Vec<String> = (0..100_000).map(|i| format!("{i:06} INFO request served")).collect();
    std::fs::write(&path, body.join("\r\n"))?;

    let options = FileOptions {
        unload_margin: 200,
        ..FileOptions::default()
    };
    let mut doc = Document::open_file(&path, &options)?;
    println!("{} lines indexed", doc.source().line_count());

    // Only the lines that are looked at get decoded.
    let mut view = View::default();
    view.set_visible_lines(50_000..50_040);
    for i in view.visible_lines() {
        doc.source().line(i)?;
    }
    view.set_caret(Place::new(50_010, 7));
    doc.insert_text(&mut view, "WARN ")?;

    let loaded = doc.source().file_lines().map_or(0, |f| f.loaded_count());
    println!("{loaded} lines loaded");

    let unloaded = doc.source_mut().unload_far_lines(0..10);
    println!("{unloaded} lines unloaded, edited line kept");

    let copy = dir.path().join("large-edited.log");
    doc.save(&copy)?;
    println!("saved with {:?} line endings", doc.source().save_line_ending());
    Ok(())
}
