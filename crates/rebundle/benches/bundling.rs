use std::{fmt::Write as _, fs, hint::black_box, path::Path};

use criterion::{Criterion, criterion_group, criterion_main};
use rebundle::{BundleOptions, bundle};
use tempfile::TempDir;

const MODULE_COUNT: usize = 50;

/// A chain of modules that each declare a colliding `helper`, import the
/// next module's exports and re-export through a namespace
fn generate_project(root: &Path) {
    for index in 0..MODULE_COUNT {
        let mut source = String::new();
        if index + 1 < MODULE_COUNT {
            let next = index + 1;
            writeln!(source, "import * as next from './module{next}.js';").expect("write");
            writeln!(source, "import {{ value as nextValue }} from './module{next}.js';")
                .expect("write");
        } else {
            source.push_str("const next = {};\nconst nextValue = 0;\n");
        }
        source.push_str("import { debounce } from 'lodash-es';\n");
        writeln!(source, "const helper = (x) => x + {index};").expect("write");
        source.push_str("export const value = helper(nextValue);\n");
        source.push_str("export const unused = debounce(() => next, 10);\n");
        source.push_str("export default function () { return value; }\n");
        fs::write(root.join(format!("module{index}.js")), source).expect("write module");
    }
    fs::write(
        root.join("index.js"),
        "import run, { value } from './module0.js';\nconsole.log(run(), value);\n",
    )
    .expect("write entry");
}

fn bench_bundling(c: &mut Criterion) {
    let dir = TempDir::new().expect("failed to create temp dir");
    generate_project(dir.path());
    let entry = dir.path().join("index.js");

    let mut group = c.benchmark_group("bundle");
    group.bench_function("treeshake", |b| {
        b.iter(|| bundle(black_box(&entry), None, &BundleOptions::default()).expect("bundle"));
    });
    group.bench_function("no_treeshake", |b| {
        let options = BundleOptions {
            treeshake: false,
            ..BundleOptions::default()
        };
        b.iter(|| bundle(black_box(&entry), None, &options).expect("bundle"));
    });
    group.bench_function("minify", |b| {
        let options = BundleOptions {
            minify: true,
            ..BundleOptions::default()
        };
        b.iter(|| bundle(black_box(&entry), None, &options).expect("bundle"));
    });
    group.finish();
}

criterion_group!(benches, bench_bundling);
criterion_main!(benches);
