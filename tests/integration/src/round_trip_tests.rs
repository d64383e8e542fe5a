//! End-to-end round trips: capture a destination tree into a source
//! directory, load it back, and apply it somewhere else.

use std::collections::BTreeMap;
use std::fs;

use dotstate_core::{Capture, ConcreteValue, PatternIgnore, TargetState};
use dotstate_fs::{DryRunMutator, FsMutator, MutatorOp, RealFs};
use dotstate_test_utils::{RecordingMutator, ScriptedPrompter, TestTree};
use pretty_assertions::assert_eq;

/// A small home directory: shell config, editor config and a cache that
/// should never be captured.
fn populate_home(tree: &TestTree) {
    tree.write_dest(".bashrc", "export EDITOR=vi\nexport MAIL=me@example.com\n");
    tree.write_dest(".config/nvim/init.lua", "vim.o.number = true\n");
    tree.write_dest(".cache/thumbnails/a.png", "png");
    tree.write_source(".dotstateignore", "# caches\n.cache\n");
}

fn capture_home(tree: &TestTree, state: &mut TargetState) {
    let capture = Capture {
        recursive: true,
        prompt: true,
        ..Capture::default()
    };
    // Answer "all" once; nothing else may be asked.
    let mut prompter = ScriptedPrompter::new(['a']);
    let report = capture.run(state, &RealFs, &FsMutator, &mut prompter, &[tree.dest_dir()]);

    assert!(report.is_success(), "failures: {:?}", report.failures);
    assert!(!report.cancelled);
    assert_eq!(report.warnings.len(), 1, "only .cache is ignored");
    assert_eq!(prompter.messages.len(), 1);
}

#[test]
fn test_capture_then_apply_elsewhere() {
    let home = TestTree::new();
    populate_home(&home);
    let mut state = TargetState::new(home.source_dir(), home.dest_dir());
    state.read(&RealFs).unwrap();
    capture_home(&home, &mut state);

    assert_eq!(
        home.list_source(""),
        vec![".dotstateignore", "dot_bashrc", "dot_config"]
    );

    let elsewhere = TestTree::new();
    let mut fresh = TargetState::new(home.source_dir(), elsewhere.dest_dir());
    fresh.read(&RealFs).unwrap();
    let mutator = RecordingMutator::new();
    fresh.apply_all(&RealFs, &mutator).unwrap();

    assert_eq!(elsewhere.read_dest(".bashrc"), home.read_dest(".bashrc"));
    assert_eq!(
        elsewhere.read_dest(".config/nvim/init.lua"),
        "vim.o.number = true\n"
    );
    elsewhere.assert_dest_missing(".cache");

    let mkdirs = mutator
        .ops()
        .iter()
        .filter(|op| matches!(op, MutatorOp::Mkdir { .. }))
        .count();
    assert_eq!(mkdirs, 2, ".config and .config/nvim");

    let second = DryRunMutator::new();
    fresh.apply_all(&RealFs, &second).unwrap();
    assert!(second.is_empty(), "not idempotent: {:?}", second.ops());
}

#[test]
fn test_auto_template_round_trip_with_other_data() {
    let home = TestTree::new();
    populate_home(&home);
    let data = BTreeMap::from([("email".to_string(), "me@example.com".to_string())]);
    let mut state = TargetState::new(home.source_dir(), home.dest_dir()).with_data(data);
    state.read(&RealFs).unwrap();

    let capture = Capture {
        recursive: true,
        options: dotstate_core::AddOptions {
            auto_template: true,
            ..Default::default()
        },
        ..Capture::default()
    };
    let report = capture.run(
        &mut state,
        &RealFs,
        &FsMutator,
        &mut ScriptedPrompter::default(),
        &[home.dest(".bashrc")],
    );
    assert!(report.is_success());
    assert_eq!(
        home.read_source("dot_bashrc.tmpl"),
        "export EDITOR=vi\nexport MAIL={{ .email }}\n"
    );

    let work = TestTree::new();
    let work_data = BTreeMap::from([("email".to_string(), "me@work.example".to_string())]);
    let mut fresh = TargetState::new(home.source_dir(), work.dest_dir()).with_data(work_data);
    fresh.read(&RealFs).unwrap();
    fresh.apply_all(&RealFs, &FsMutator).unwrap();

    assert_eq!(
        work.read_dest(".bashrc"),
        "export EDITOR=vi\nexport MAIL=me@work.example\n"
    );
}

#[test]
fn test_dump_matches_captured_tree() {
    let home = TestTree::new();
    populate_home(&home);
    let mut state = TargetState::new(home.source_dir(), home.dest_dir())
        .with_ignore(PatternIgnore::parse(".cache").unwrap());
    capture_home(&home, &mut state);

    let mut reread = TargetState::new(home.source_dir(), home.dest_dir());
    reread.read(&RealFs).unwrap();

    let captured = serde_json::to_value(state.concrete_values(true).unwrap()).unwrap();
    let loaded = serde_json::to_value(reread.concrete_values(true).unwrap()).unwrap();
    assert_eq!(captured, loaded);

    let roots = reread.concrete_values(true).unwrap();
    let paths: Vec<_> = roots.iter().map(ConcreteValue::target_path).cloned().collect();
    assert_eq!(paths, vec![home.dest(".bashrc"), home.dest(".config")]);
}

#[test]
fn test_quit_leaves_consistent_source_state() {
    let home = TestTree::new();
    populate_home(&home);
    let mut state = TargetState::new(home.source_dir(), home.dest_dir());
    state.read(&RealFs).unwrap();
    let capture = Capture {
        recursive: true,
        prompt: true,
        ..Capture::default()
    };
    // .bashrc: y, .cache: ignored, .config: y, .config/nvim: q
    let mut prompter = ScriptedPrompter::new(['y', 'y', 'q']);

    let report = capture.run(&mut state, &RealFs, &FsMutator, &mut prompter, &[home.dest_dir()]);

    assert!(report.is_success());
    assert!(report.cancelled);
    assert_eq!(report.added, vec![home.dest(".bashrc"), home.dest(".config")]);

    // Whatever was written so far loads back cleanly
    let mut reread = TargetState::new(home.source_dir(), home.dest_dir());
    reread.read(&RealFs).unwrap();
    reread.evaluate_all().unwrap();
    let names: Vec<&str> = reread.entries().map(|entry| entry.target_name()).collect();
    assert_eq!(names, vec![".bashrc", ".config"]);
}

#[test]
fn test_archive_of_captured_tree() {
    let home = TestTree::new();
    populate_home(&home);
    let mut state = TargetState::new(home.source_dir(), home.dest_dir());
    state.read(&RealFs).unwrap();
    capture_home(&home, &mut state);

    let bytes = state.archive(Vec::new()).unwrap();
    let mut archive = tar::Archive::new(bytes.as_slice());
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let entry = entry.unwrap();
        names.push(
            entry
                .path()
                .unwrap()
                .to_string_lossy()
                .trim_end_matches('/')
                .to_string(),
        );
    }

    assert_eq!(
        names,
        vec![".bashrc", ".config", ".config/nvim", ".config/nvim/init.lua"]
    );
    assert!(!fs::read_dir(home.source_dir()).unwrap().any(|e| {
        e.unwrap().file_name().to_string_lossy().contains("cache")
    }));
}
