//! Benchmarks for the extraction and rendering stages.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use onenote_md::extract::Extractor;
use onenote_md::markdown::{AssetNames, MarkdownConfig, render_page};
use onenote_md::raw::{ObjectKind, PropertyId, PropertyValue, RawObject, RawObjectGraph};

const PAGES: u64 = 50;
const PARAGRAPHS_PER_PAGE: u64 = 40;

fn utf16(text: &str) -> PropertyValue {
    PropertyValue::Bytes(text.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

/// A section of `PAGES` pages, each with a flat outline of paragraphs.
fn sample_graph() -> RawObjectGraph {
    let mut graph = RawObjectGraph::new();
    let mut next_id = 1;
    let mut id = || {
        next_id += 1;
        next_id
    };

    for page in 0..PAGES {
        let page_id = id();
        let outline_id = id();
        graph.push_root(page_id);

        let mut elements = Vec::new();
        for para in 0..PARAGRAPHS_PER_PAGE {
            let element_id = id();
            let text_id = id();
            elements.push(element_id);
            graph.insert(RawObject::new(element_id, ObjectKind::OutlineElement).with_content(&[text_id]));
            graph.insert(
                RawObject::new(text_id, ObjectKind::RichText).with(
                    PropertyId::RichEditTextUnicode,
                    utf16(&format!(
                        "Paragraph {para} on page {page}: the quick brown fox jumps over the lazy dog"
                    )),
                ),
            );
        }

        graph.insert(
            RawObject::new(page_id, ObjectKind::PageNode)
                .with(
                    PropertyId::CachedTitleString,
                    PropertyValue::Text(format!("Page {page}")),
                )
                .with_children(&[outline_id]),
        );
        graph.insert(RawObject::new(outline_id, ObjectKind::OutlineNode).with_children(&elements));
    }

    graph
}

// ============================================================================
// Pipeline stages
// ============================================================================

fn bench_extract(c: &mut Criterion) {
    let graph = sample_graph();
    let extractor = Extractor::new();

    c.bench_function("extract_section", |b| {
        b.iter(|| extractor.extract(black_box(&graph)));
    });
}

fn bench_render(c: &mut Criterion) {
    let extraction = Extractor::new().extract(&sample_graph());
    let config = MarkdownConfig::default();

    c.bench_function("render_section", |b| {
        b.iter(|| {
            let mut names = AssetNames::new();
            for page in &extraction.pages {
                black_box(render_page(page, &config, &mut names));
            }
        });
    });
}

criterion_group!(benches, bench_extract, bench_render);
criterion_main!(benches);
