//! End-to-end runs of the generator against temp directory trees.

use config_gen::config::GeneratorConfig;
use config_gen::generate::{self, GenerateError};
use config_gen::scan::to_slash;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for (path, content) in files {
        let path = tmp.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }
    tmp
}

fn config_for(root: &Path) -> GeneratorConfig {
    GeneratorConfig {
        filters_base_path: root.join("filters"),
        templates_base_path: root.join("templates"),
        output_base_path: root.join("out"),
        ..Default::default()
    }
}

fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = to_slash(e.path().strip_prefix(root).unwrap());
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn single_filter_single_template() {
    let tmp = write_tree(&[
        ("filters/dev.properties", "host=localhost\n"),
        ("templates/app.conf", "server=${host}"),
    ]);
    let summary = generate::run(&config_for(tmp.path())).unwrap();

    assert!(summary.missing.is_empty());
    assert_eq!(
        read_tree(&tmp.path().join("out")).into_keys().collect::<Vec<_>>(),
        vec!["dev/app.conf"]
    );
    assert_eq!(read(&tmp.path().join("out/dev/app.conf")), "server=localhost");
}

#[test]
fn output_paths_follow_filter_then_template_layout() {
    let tmp = write_tree(&[
        ("filters/dev.properties", "p=d\n"),
        ("filters/eu/west/prod.properties", "p=p\n"),
        ("templates/app.conf", "${p}"),
        ("templates/bin/start.sh", "${p}"),
    ]);
    generate::run(&config_for(tmp.path())).unwrap();

    let files: Vec<String> = read_tree(&tmp.path().join("out")).into_keys().collect();
    assert_eq!(
        files,
        vec![
            "dev/app.conf",
            "dev/bin/start.sh",
            "eu/west/prod/app.conf",
            "eu/west/prod/bin/start.sh",
        ]
    );
}

#[test]
fn repeated_runs_are_byte_identical() {
    let tmp = write_tree(&[
        ("filters/dev.properties", "a=1\nb=2\n"),
        ("filters/prod.properties", "a=10\nb=20\n"),
        ("templates/x.conf", "${a}-${b}\n"),
        ("templates/nested/y.conf", "${b}${a}${filter.source}\n"),
    ]);
    let config = config_for(tmp.path());

    generate::run(&config).unwrap();
    let first = read_tree(&config.output_base_path);
    generate::run(&config).unwrap();
    let second = read_tree(&config.output_base_path);

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[test]
fn primary_filter_overrides_external_overlay() {
    let tmp = write_tree(&[
        ("filters/env.properties", "a=1\n"),
        ("common/env.properties", "a=2\nb=3\n"),
        ("templates/t.txt", "${a},${b}"),
    ]);
    let mut config = config_for(tmp.path());
    config.external_filter_base_paths = vec![tmp.path().join("common")];

    let summary = generate::run(&config).unwrap();
    assert!(summary.missing.is_empty());
    assert_eq!(read(&tmp.path().join("out/env/t.txt")), "1,3");
}

#[test]
fn source_property_lists_overlays() {
    let tmp = write_tree(&[
        ("filters/env.properties", "a=1\n"),
        ("common/env.properties", "b=3\n"),
        ("templates/t.txt", "${filter.source}"),
    ]);
    let mut config = config_for(tmp.path());
    config.external_filter_base_paths = vec![tmp.path().join("common")];

    generate::run(&config).unwrap();
    let text = read(&tmp.path().join("out/env/t.txt"));
    let overlay = to_slash(&tmp.path().join("common").join("env.properties"));
    assert_eq!(text, format!("[env.properties, {overlay}]"));
}

#[test]
fn ignored_directories_excluded_but_prefix_siblings_kept() {
    let tmp = write_tree(&[
        ("filters/dev.properties", "a=1\n"),
        ("filters/old/legacy.properties", "a=0\n"),
        ("templates/common/skip.conf", "${a}"),
        ("templates/common-extra/keep.conf", "${a}"),
    ]);
    let mut config = config_for(tmp.path());
    config.templates_to_ignore = vec![tmp.path().join("templates/common")];
    config.filters_to_ignore = vec![tmp.path().join("filters/old")];

    let summary = generate::run(&config).unwrap();
    assert_eq!(summary.filters.len(), 1);
    let files: Vec<String> = read_tree(&tmp.path().join("out")).into_keys().collect();
    assert_eq!(files, vec!["dev/common-extra/keep.conf"]);
}

#[test]
fn missing_properties_reported_per_filter() {
    let tmp = write_tree(&[
        ("filters/A.properties", "x=1\n"),
        ("filters/B.properties", "y=2\n"),
        ("templates/t.conf", "${x}${y}"),
    ]);
    let mut config = config_for(tmp.path());
    config.fail_on_missing_property = false;

    let summary = generate::run(&config).unwrap();
    let a = to_slash(&summary.filters[0].path);
    let b = to_slash(&summary.filters[1].path);
    assert!(a.ends_with("A.properties"));

    let report: Vec<(&str, Vec<&str>)> = summary
        .missing
        .iter()
        .map(|(f, keys)| (f, keys.iter().map(String::as_str).collect()))
        .collect();
    assert_eq!(report, vec![(a.as_str(), vec!["y"]), (b.as_str(), vec!["x"])]);
}

#[test]
fn fail_policy_returns_full_report() {
    let tmp = write_tree(&[
        ("filters/a.properties", "x=1\n"),
        ("filters/b.properties", "y=2\n"),
        ("filters/c.properties", "x=1\ny=2\n"),
        ("templates/t.conf", "${x}${y}"),
    ]);
    let err = generate::run(&config_for(tmp.path())).unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("Missing properties identified:"));
    let GenerateError::MissingProperties(report) = err else {
        panic!("unexpected error");
    };
    assert_eq!(report.filter_count(), 2);
    // complete filters are still generated
    assert_eq!(read(&tmp.path().join("out/c/t.conf")), "12");
}

#[test]
fn custom_placeholder_syntax() {
    let tmp = write_tree(&[
        ("filters/dev.properties", "host=localhost\n"),
        ("templates/app.conf", "server=@host@ raw=${host}"),
    ]);
    let mut config = config_for(tmp.path());
    config.property_prefix = "@".into();
    config.property_suffix = "@".into();

    generate::run(&config).unwrap();
    assert_eq!(
        read(&tmp.path().join("out/dev/app.conf")),
        "server=localhost raw=${host}"
    );
}

#[test]
fn missing_inputs_are_not_fatal() {
    let tmp = write_tree(&[("templates/app.conf", "x")]);
    let summary = generate::run(&config_for(tmp.path())).unwrap();
    assert!(summary.filters.is_empty());
    assert!(summary.generated.is_empty());
}
