//! Frame performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kryon_layout::*;

fn wide_document(context: &UiContext, rows: usize, columns: usize) -> UiDocument {
    let builder = context.builder().unwrap();
    let mut doc = UiDocument::new(
        builder
            .build("VBox", &[("spacing", "2px"), ("padding", "4px")])
            .unwrap(),
    );
    for row in 0..rows {
        let hbox = doc
            .add_child(
                UiDocument::ROOT,
                builder
                    .build("HBox", &[("spacing", "1px"), ("alignment", "center")])
                    .unwrap(),
            )
            .unwrap();
        for column in 0..columns {
            let node = if column % 2 == 0 {
                builder
                    .build("Box", &[("min-width", "10%"), ("min-height", "12px")])
                    .unwrap()
            } else {
                let text = format!("r{}c{}", row, column);
                builder.build("Text", &[("text", text.as_str())]).unwrap()
            };
            doc.add_child(hbox, node).unwrap();
        }
    }
    doc
}

fn bench_single_frame(c: &mut Criterion) {
    let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
    let mut doc = wide_document(&context, 50, 20);
    let settings = FrameSettings::default();

    c.bench_function("frame_1000_nodes", |b| {
        b.iter(|| context.process_document(black_box(&mut doc), &settings).unwrap())
    });
}

fn bench_layout_only(c: &mut Criterion) {
    let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
    let mut doc = wide_document(&context, 50, 20);
    let settings = FrameSettings::default();

    c.bench_function("layout_1000_nodes", |b| {
        b.iter(|| context.layout_document(black_box(&mut doc), &settings).unwrap())
    });
}

fn bench_parallel_frame(c: &mut Criterion) {
    let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
    let mut docs: Vec<UiDocument> = (0..8).map(|_| wide_document(&context, 20, 20)).collect();
    let settings = FrameSettings {
        worker_threads: 4,
        ..FrameSettings::default()
    };

    c.bench_function("frame_8_documents_4_workers", |b| {
        b.iter(|| context.process_frame(black_box(&mut docs), &settings).unwrap())
    });
}

fn bench_buffer_building(c: &mut Criterion) {
    let context = UiContext::with_builtins(FontLibrary::with_default_face()).unwrap();
    let builder = context.builder().unwrap();

    c.bench_function("build_hbox_config", |b| {
        b.iter(|| {
            builder
                .build(
                    black_box("HBox"),
                    &[("spacing", "4px"), ("padding", "1px 2px 3px"), ("background-color", "#abc")],
                )
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_single_frame,
    bench_layout_only,
    bench_parallel_frame,
    bench_buffer_building
);
criterion_main!(benches);
