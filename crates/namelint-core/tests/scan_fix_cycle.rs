use std::fs;
use std::path::Path;

use namelint_core::{
    execute, plan, scan_and_evaluate, CaseStyle, LocalFs, NamingRules, ScanOptions, ViolationKind,
};
use tempfile::tempdir;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, rel).unwrap();
}

#[test]
fn test_component_folder_is_fixed_end_to_end() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "MyComponents/loginButton.js");
    touch(dir.path(), "MyComponents/LogOut.js");
    touch(dir.path(), "node_modules/someLib/index.js");

    let rules = NamingRules::new(CaseStyle::Kebab, CaseStyle::Pascal);
    let diagnosis = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap();

    let suggestions: Vec<(String, Option<String>)> = diagnosis
        .violations
        .iter()
        .map(|v| (v.entry.display_path(), v.suggested_name.clone()))
        .collect();
    assert_eq!(
        suggestions,
        vec![
            ("MyComponents/LogOut.js".to_string(), Some("log-out.js".to_string())),
            (
                "MyComponents/loginButton.js".to_string(),
                Some("login-button.js".to_string())
            ),
        ]
    );

    let outcome = plan(dir.path(), &diagnosis.violations, &LocalFs::new());
    assert!(outcome.rejected.is_empty());
    let report = execute(&outcome.plan, &LocalFs::new());
    assert!(report.is_complete());

    assert_eq!(
        fs::read_to_string(dir.path().join("MyComponents/login-button.js")).unwrap(),
        "MyComponents/loginButton.js"
    );
    assert!(dir.path().join("MyComponents/log-out.js").is_file());

    let rescan = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap();
    assert!(rescan.violations.is_empty());
}

#[test]
fn test_case_conflicts_are_never_planned() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "UserCard.js");
    if dir.path().join("usercard.js").exists() {
        // Case-insensitive filesystem: the pair cannot coexist.
        return;
    }
    touch(dir.path(), "usercard.js");

    let rules = NamingRules::new(CaseStyle::Kebab, CaseStyle::Kebab);
    let diagnosis = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap();

    assert_eq!(diagnosis.violations.len(), 2);
    assert!(diagnosis
        .violations
        .iter()
        .all(|v| v.kind == ViolationKind::CaseConflict));
    assert_eq!(diagnosis.fixable().count(), 0);

    let outcome = plan(dir.path(), &diagnosis.violations, &LocalFs::new());
    assert!(outcome.plan.is_empty());
    assert_eq!(outcome.rejected.len(), 2);
}

#[test]
fn test_case_only_folder_rename_reports_final_name() {
    let dir = tempdir().unwrap();
    touch(dir.path(), "oldName/Readme.md");

    let rules = NamingRules::new(CaseStyle::Pascal, CaseStyle::Pascal);
    let diagnosis = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap();
    assert_eq!(diagnosis.violations.len(), 1);
    assert_eq!(
        diagnosis.violations[0].suggested_name.as_deref(),
        Some("OldName")
    );

    let outcome = plan(dir.path(), &diagnosis.violations, &LocalFs::new());
    let op = &outcome.plan.operations()[0];
    assert_eq!(op.intermediate, Some(dir.path().join("OldName__tmp")));

    let report = execute(&outcome.plan, &LocalFs::new());
    assert!(report.is_complete());
    assert_eq!(report.succeeded[0].final_path, dir.path().join("OldName"));

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["OldName".to_string()]);
    assert!(dir.path().join("OldName/Readme.md").is_file());
}

#[test]
fn test_nested_renames_preserve_structure() {
    let dir = tempdir().unwrap();
    let files = [
        "SrcFiles/UiKit/BigButton.tsx",
        "SrcFiles/UiKit/small-icon.tsx",
        "SrcFiles/dataLayer/userStore.ts",
        "SrcFiles/index.ts",
        "docs/gettingStarted.md",
    ];
    for f in files {
        touch(dir.path(), f);
    }

    let rules = NamingRules::new(CaseStyle::Kebab, CaseStyle::Kebab);
    let diagnosis = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap();
    let outcome = plan(dir.path(), &diagnosis.violations, &LocalFs::new());
    assert!(outcome.rejected.is_empty());

    let report = execute(&outcome.plan, &LocalFs::new());
    assert!(report.is_complete());
    assert_eq!(report.succeeded.len(), outcome.plan.len());

    for renamed in &report.succeeded {
        assert!(!renamed.op.from.exists(), "{:?} still exists", renamed.op.from);
        assert!(renamed.final_path.exists(), "{:?} missing", renamed.final_path);
    }

    let expected = [
        ("src-files/ui-kit/big-button.tsx", "SrcFiles/UiKit/BigButton.tsx"),
        ("src-files/ui-kit/small-icon.tsx", "SrcFiles/UiKit/small-icon.tsx"),
        ("src-files/data-layer/user-store.ts", "SrcFiles/dataLayer/userStore.ts"),
        ("src-files/index.ts", "SrcFiles/index.ts"),
        ("docs/getting-started.md", "docs/gettingStarted.md"),
    ];
    for (path, content) in expected {
        assert_eq!(fs::read_to_string(dir.path().join(path)).unwrap(), content);
    }
}

#[test]
fn test_invalid_config_aborts_before_scanning() {
    let dir = tempdir().unwrap();
    let mut rules = NamingRules::default();
    rules.ignore.push(String::new());

    let err = scan_and_evaluate(dir.path(), &rules, &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, namelint_core::NamingError::ConfigInvalid { .. }));
}
