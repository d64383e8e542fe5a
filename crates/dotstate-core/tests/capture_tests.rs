//! Tests for the capture workflow: prompting, ignore filtering, traversal
//! order and cancellation.

use std::path::PathBuf;

use dotstate_core::{AddOptions, Capture, Error, PatternIgnore, TargetState};
use dotstate_fs::{FsMutator, RealFs};
use dotstate_test_utils::{ScriptedPrompter, TestTree};
use pretty_assertions::assert_eq;

fn state_for(tree: &TestTree) -> TargetState {
    TargetState::new(tree.source_dir(), tree.dest_dir())
}

fn prompting(recursive: bool) -> Capture {
    Capture {
        recursive,
        prompt: true,
        ..Capture::default()
    }
}

fn messages_for(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| format!("add {}", p.display())).collect()
}

mod prompt_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_yes_no_quit_stops_remaining_inputs() {
        let tree = TestTree::new();
        let paths: Vec<PathBuf> = ["a", "b", "c", "d"]
            .iter()
            .map(|name| tree.write_dest(name, name))
            .collect();
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['y', 'n', 'q', 'a']);

        let report = prompting(false).run(&mut state, &RealFs, &FsMutator, &mut prompter, &paths);

        assert!(report.is_success(), "quitting is not a failure");
        assert!(report.cancelled);
        assert_eq!(report.added, vec![paths[0].clone()]);
        assert_eq!(report.skipped, vec![paths[1].clone()]);
        assert_eq!(prompter.messages, messages_for(&paths[..3]));
        assert_eq!(prompter.remaining(), 1, "the fourth path is never offered");

        assert_eq!(tree.list_source(""), vec!["a"]);
        assert!(state.get("a").is_some());
        assert!(state.get("b").is_none());
        assert!(state.get("d").is_none());
    }

    #[test]
    fn test_all_disables_further_prompts() {
        let tree = TestTree::new();
        let paths: Vec<PathBuf> = ["a", "b", "c"]
            .iter()
            .map(|name| tree.write_dest(name, name))
            .collect();
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['a', 'y']);

        let report = prompting(false).run(&mut state, &RealFs, &FsMutator, &mut prompter, &paths);

        assert!(report.is_success());
        assert!(!report.cancelled);
        assert_eq!(report.added, paths);
        assert_eq!(prompter.messages.len(), 1);
        assert_eq!(prompter.remaining(), 1);
        assert_eq!(tree.list_source(""), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_all_carries_across_recursive_inputs() {
        let tree = TestTree::new();
        tree.write_dest("one/x", "x");
        tree.write_dest("two/y", "y");
        let paths = vec![tree.dest("one"), tree.dest("two")];
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['a']);

        let report = prompting(true).run(&mut state, &RealFs, &FsMutator, &mut prompter, &paths);

        assert!(report.is_success());
        assert_eq!(report.added.len(), 4);
        assert_eq!(prompter.messages.len(), 1);
    }

    #[test]
    fn test_unexpected_answer_fails_that_input() {
        let tree = TestTree::new();
        let path = tree.write_dest("a", "a");
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::default();

        let report = prompting(false).run(&mut state, &RealFs, &FsMutator, &mut prompter, &[path]);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, Error::Prompt { .. }));
    }
}

mod ignore_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ignored_path_is_never_added_and_warns_once() {
        let tree = TestTree::new();
        tree.write_source(".dotstateignore", "# editor droppings\n*.swp\n");
        let keep = tree.write_dest("notes", "keep");
        let swap = tree.write_dest("notes.swp", "junk");
        let mut state = state_for(&tree);
        state.read(&RealFs).unwrap();
        let mut prompter = ScriptedPrompter::new(['y']);

        let report = prompting(false).run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut prompter,
            &[keep.clone(), swap.clone()],
        );

        assert!(report.is_success());
        assert_eq!(report.added, vec![keep]);
        assert_eq!(report.ignored, vec![swap.clone()]);
        assert_eq!(
            report.warnings,
            vec![format!(
                "skipping file ignored by .dotstateignore: {}",
                swap.display()
            )]
        );
        assert_eq!(prompter.messages.len(), 1, "ignored paths are not prompted");
        assert!(state.get("notes.swp").is_none());
        assert_eq!(tree.list_source(""), vec![".dotstateignore", "notes"]);
    }

    #[test]
    fn test_ignored_directory_skips_subtree() {
        let tree = TestTree::new();
        tree.write_dest(".cache/big/blob", "blob");
        tree.write_dest(".profile", "export A=1\n");
        let mut state =
            state_for(&tree).with_ignore(PatternIgnore::parse(".cache").unwrap());
        let capture = Capture {
            recursive: true,
            ..Capture::default()
        };

        let report = capture.run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut ScriptedPrompter::default(),
            &[tree.dest_dir()],
        );

        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.added, vec![tree.dest(".profile")]);
        assert_eq!(tree.list_source(""), vec!["dot_profile"]);
    }
}

mod traversal_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_recursive_visits_in_pre_order() {
        let tree = TestTree::new();
        tree.write_dest("d/b", "b");
        tree.write_dest("d/a", "a");
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['y', 'y', 'y']);

        let report = prompting(true).run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut prompter,
            &[tree.dest("d")],
        );

        let expected = vec![tree.dest("d"), tree.dest("d/a"), tree.dest("d/b")];
        assert!(report.is_success());
        assert_eq!(prompter.messages, messages_for(&expected));
        assert_eq!(report.added, expected);
        assert_eq!(tree.list_source("d"), vec!["a", "b"]);
    }

    #[test]
    fn test_declined_directory_still_offers_children() {
        let tree = TestTree::new();
        tree.write_dest("d/a", "a");
        tree.write_dest("e", "e");
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['n', 'y', 'y']);

        let report = prompting(true).run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut prompter,
            &[tree.dest("d"), tree.dest("e")],
        );

        assert!(report.is_success());
        assert_eq!(
            prompter.messages,
            messages_for(&[tree.dest("d"), tree.dest("d/a"), tree.dest("e")])
        );
        assert_eq!(report.skipped, vec![tree.dest("d")]);
        assert_eq!(report.added, vec![tree.dest("d/a"), tree.dest("e")]);
        assert_eq!(prompter.remaining(), 0);
        assert_eq!(tree.list_source("d"), vec!["a"]);
    }

    #[test]
    fn test_declining_every_node_adds_nothing() {
        let tree = TestTree::new();
        tree.write_dest("d/a", "a");
        let mut state = state_for(&tree);
        let mut prompter = ScriptedPrompter::new(['n', 'n']);

        let report = prompting(true).run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut prompter,
            &[tree.dest("d")],
        );

        assert!(report.is_success());
        assert!(report.added.is_empty());
        assert_eq!(report.skipped, vec![tree.dest("d"), tree.dest("d/a")]);
        assert!(state.is_empty());
    }

    #[test]
    fn test_destination_root_is_not_an_entry() {
        let tree = TestTree::new();
        tree.write_dest(".bashrc", "set -o vi\n");
        let mut state = state_for(&tree);
        let capture = Capture {
            recursive: true,
            ..Capture::default()
        };

        let report = capture.run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut ScriptedPrompter::default(),
            &[tree.dest_dir()],
        );

        assert!(report.is_success());
        assert_eq!(report.added, vec![tree.dest(".bashrc")]);
        assert_eq!(state.len(), 1);
    }
}

mod cancellation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quit_ends_only_the_active_walk() {
        let tree = TestTree::new();
        tree.write_dest("one/x", "x");
        tree.write_dest("one/y", "y");
        tree.write_dest("two/z", "z");
        let mut state = state_for(&tree);
        // one: y, one/x: q, two: y, two/z: y
        let mut prompter = ScriptedPrompter::new(['y', 'q', 'y', 'y']);

        let report = prompting(true).run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut prompter,
            &[tree.dest("one"), tree.dest("two")],
        );

        assert!(report.is_success());
        assert!(report.cancelled);
        assert_eq!(
            report.added,
            vec![tree.dest("one"), tree.dest("two"), tree.dest("two/z")]
        );
        assert!(state.get("one/x").is_none());
        assert!(state.get("one/y").is_none());
        assert!(state.get("two/z").is_some());
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_failed_input_does_not_stop_later_inputs() {
        let tree = TestTree::new();
        let outside = tree.root().join("elsewhere");
        std::fs::write(&outside, "x").unwrap();
        let inside = tree.write_dest("inside", "y");
        let mut state = state_for(&tree);

        let report = Capture::default().run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut ScriptedPrompter::default(),
            &[outside.clone(), inside.clone()],
        );

        assert!(!report.is_success());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, outside);
        assert!(matches!(
            report.failures[0].error,
            Error::NotInDestDir { .. }
        ));
        assert_eq!(report.added, vec![inside]);
    }

    #[test]
    fn test_missing_input_is_a_failure() {
        let tree = TestTree::new();
        let mut state = state_for(&tree);

        let report = Capture {
            options: AddOptions::default(),
            ..Capture::default()
        }
        .run(
            &mut state,
            &RealFs,
            &FsMutator,
            &mut ScriptedPrompter::default(),
            &[tree.dest("missing")],
        );

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].error.is_not_found());
    }
}
