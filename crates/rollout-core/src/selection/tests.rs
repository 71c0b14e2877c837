//! Tests for selection policies and the shared gates.

use super::*;
use crate::registry::Service;

fn rev(id: &str) -> Revision {
    Revision::parse(id).unwrap()
}

fn changes(paths: &[&str]) -> ChangeSet {
    paths.iter().copied().collect()
}

fn pattern_registry() -> ServiceRegistry {
    ServiceRegistry::new(vec![
        Service::with_prefixes("svcX", ["app/"]),
        Service::with_prefixes("svcY", ["api/"]),
    ])
    .unwrap()
}

fn decide(
    selector: &Selector,
    previous: Option<&Revision>,
    current: &Revision,
    changes: &ChangeSet,
    flags: &Flags,
    registry: &ServiceRegistry,
) -> Decision {
    selector.decide(&SelectionInput {
        previous,
        current,
        changes,
        flags,
        registry,
    })
}

fn act(decision: Decision) -> Selection {
    match decision {
        Decision::Act(selection) => selection,
        Decision::Skip => panic!("expected an act decision, got skip"),
    }
}

mod skip_gate {
    use super::*;

    #[test]
    fn same_revision_without_force_skips_in_both_modes() {
        let registry = pattern_registry();
        let a = rev("aaa");
        for mode in [SelectionMode::Explicit, SelectionMode::Pattern] {
            let selector = Selector::for_mode(mode, "requirements.txt", true);
            let decision = decide(
                &selector,
                Some(&a),
                &a,
                &ChangeSet::empty(),
                &Flags::new(),
                &registry,
            );
            assert_eq!(decision, Decision::Skip, "mode {mode}");
        }
    }

    #[test]
    fn named_services_do_not_bypass_the_gate() {
        let registry = pattern_registry();
        let a = rev("aaa");
        let selector = Selector::for_mode(SelectionMode::Explicit, "requirements.txt", true);
        let flags = Flags::new().with_services(["svcY"]);
        let decision = decide(&selector, Some(&a), &a, &ChangeSet::empty(), &flags, &registry);
        assert_eq!(decision, Decision::Skip);
    }

    #[test]
    fn unknown_previous_never_skips() {
        let registry = pattern_registry();
        let a = rev("aaa");
        let selector = Selector::for_mode(SelectionMode::Explicit, "requirements.txt", true);
        let decision = decide(&selector, None, &a, &ChangeSet::empty(), &Flags::new(), &registry);
        assert!(matches!(decision, Decision::Act(_)));
    }

    #[test]
    fn force_dependency_reinstall_bypasses_gate_without_restarts_in_pattern_mode() {
        let registry = pattern_registry();
        let a = rev("aaa");
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", false);
        let flags = Flags::new().with_force_dependency_reinstall(true);
        let selection = act(decide(
            &selector,
            Some(&a),
            &a,
            &ChangeSet::empty(),
            &flags,
            &registry,
        ));
        assert!(selection.reinstall_deps);
        assert!(selection.restart.is_empty());
    }
}

mod explicit_mode {
    use super::*;

    #[test]
    fn no_names_selects_whole_registry_in_order() {
        let registry = ServiceRegistry::new(vec![
            Service::explicit("main_app"),
            Service::with_prefixes("admin_app", ["admin_app/"]),
            Service::explicit("youtube_app"),
        ])
        .unwrap();
        let selector = Selector::for_mode(SelectionMode::Explicit, "requirements.txt", true);
        let selection = act(decide(
            &selector,
            Some(&rev("a")),
            &rev("b"),
            &changes(&["README.md"]),
            &Flags::new(),
            &registry,
        ));
        assert_eq!(selection.restart, vec!["main_app", "admin_app", "youtube_app"]);
        assert!(!selection.reinstall_deps);
    }

    #[test]
    fn named_services_are_exactly_the_restart_set_in_registry_order() {
        let registry = ServiceRegistry::new(vec![
            Service::explicit("a"),
            Service::explicit("b"),
            Service::explicit("c"),
        ])
        .unwrap();
        let selector = Selector::for_mode(SelectionMode::Explicit, "requirements.txt", true);
        let flags = Flags::new().with_services(["c", "a"]);
        let selection = act(decide(
            &selector,
            Some(&rev("a1")),
            &rev("b2"),
            &changes(&["requirements.txt"]),
            &flags,
            &registry,
        ));
        assert_eq!(selection.restart, vec!["a", "c"]);
        assert!(selection.reinstall_deps);
    }

    #[test]
    fn force_restart_with_same_revision_restarts_named_service_only() {
        let registry = pattern_registry();
        let a = rev("aaa");
        let selector = Selector::for_mode(SelectionMode::Explicit, "requirements.txt", true);
        let flags = Flags::new().with_force_restart(true).with_services(["svcY"]);
        let selection = act(decide(
            &selector,
            Some(&a),
            &a,
            &ChangeSet::empty(),
            &flags,
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcY"]);
        assert!(!selection.reinstall_deps);
    }
}

mod pattern_mode {
    use super::*;

    #[test]
    fn only_matching_services_restart() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let selection = act(decide(
            &selector,
            Some(&rev("a")),
            &rev("b"),
            &changes(&["api/routes.py", "docs/index.md"]),
            &Flags::new(),
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcY"]);
        assert!(!selection.reinstall_deps);
    }

    #[test]
    fn unrelated_paths_select_nothing() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let selection = act(decide(
            &selector,
            Some(&rev("a")),
            &rev("b"),
            &changes(&["README.md", "Dockerfile"]),
            &Flags::new(),
            &registry,
        ));
        assert!(selection.is_noop());
    }

    #[test]
    fn manifest_change_restarts_every_pattern_service_by_default() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let selection = act(decide(
            &selector,
            Some(&rev("A")),
            &rev("B"),
            &changes(&["requirements.txt"]),
            &Flags::new(),
            &registry,
        ));
        assert!(selection.reinstall_deps);
        assert_eq!(selection.restart, vec!["svcX", "svcY"]);
    }

    #[test]
    fn manifest_change_alone_restarts_nothing_when_policy_disabled() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", false);
        let selection = act(decide(
            &selector,
            Some(&rev("A")),
            &rev("B"),
            &changes(&["requirements.txt"]),
            &Flags::new(),
            &registry,
        ));
        assert!(selection.reinstall_deps);
        assert!(selection.restart.is_empty());
    }

    #[test]
    fn manifest_rule_skips_explicit_only_services() {
        let registry = ServiceRegistry::new(vec![
            Service::with_prefixes("svcX", ["app/"]),
            Service::explicit("batch"),
        ])
        .unwrap();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let selection = act(decide(
            &selector,
            Some(&rev("A")),
            &rev("B"),
            &changes(&["requirements.txt"]),
            &Flags::new(),
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcX"]);
    }

    #[test]
    fn first_deploy_matches_every_tracked_prefix() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", false);
        let selection = act(decide(
            &selector,
            None,
            &rev("B"),
            &changes(&["app/main.py", "api/server.py", "README.md"]),
            &Flags::new(),
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcX", "svcY"]);
    }

    #[test]
    fn named_services_override_inference() {
        let registry = pattern_registry();
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let flags = Flags::new().with_services(["svcX"]);
        let selection = act(decide(
            &selector,
            Some(&rev("A")),
            &rev("B"),
            &changes(&["api/routes.py"]),
            &flags,
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcX"]);
    }

    #[test]
    fn force_restart_without_names_restarts_everything() {
        let registry = pattern_registry();
        let a = rev("A");
        let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
        let flags = Flags::new().with_force_restart(true);
        let selection = act(decide(
            &selector,
            Some(&a),
            &a,
            &ChangeSet::empty(),
            &flags,
            &registry,
        ));
        assert_eq!(selection.restart, vec!["svcX", "svcY"]);
    }
}

mod dependency_trigger {
    use super::*;

    #[test]
    fn manifest_in_change_set_requires_reinstall_regardless_of_flags() {
        let set = changes(&["app/main.py", "requirements.txt"]);
        assert!(dependency_reinstall_required(&set, &Flags::new(), "requirements.txt"));
        let forced = Flags::new().with_force_restart(true);
        assert!(dependency_reinstall_required(&set, &forced, "requirements.txt"));
    }

    #[test]
    fn manifest_match_is_literal() {
        let set = changes(&["app/requirements.txt", "requirements.txt.bak"]);
        assert!(!dependency_reinstall_required(&set, &Flags::new(), "requirements.txt"));
    }

    #[test]
    fn force_flag_requires_reinstall() {
        let flags = Flags::new().with_force_dependency_reinstall(true);
        assert!(dependency_reinstall_required(&ChangeSet::empty(), &flags, "requirements.txt"));
    }
}

#[test]
fn selection_is_deterministic_for_identical_inputs() {
    let registry = pattern_registry();
    let selector = Selector::for_mode(SelectionMode::Pattern, "requirements.txt", true);
    let forward = changes(&["api/a.py", "app/b.py", "requirements.txt"]);
    let reversed = changes(&["requirements.txt", "app/b.py", "api/a.py"]);
    let first = decide(&selector, Some(&rev("A")), &rev("B"), &forward, &Flags::new(), &registry);
    let second = decide(&selector, Some(&rev("A")), &rev("B"), &reversed, &Flags::new(), &registry);
    assert_eq!(first, second);
}

#[test]
fn mode_parses_case_insensitively() {
    assert_eq!("Pattern".parse::<SelectionMode>().unwrap(), SelectionMode::Pattern);
    assert_eq!("explicit".parse::<SelectionMode>().unwrap(), SelectionMode::Explicit);
    assert!("auto".parse::<SelectionMode>().is_err());
}
