use remarks_core::hook::{install_post_rewrite_hook, HookInstall};
use std::fs;

#[test]
fn fresh_install_writes_executable_hook() {
    let git_dir = tempfile::tempdir().expect("temp dir should be created");

    let result = install_post_rewrite_hook(git_dir.path()).expect("hook install should succeed");
    let hook_path = git_dir.path().join("hooks").join("post-rewrite");
    assert_eq!(result, HookInstall::Installed(hook_path.clone()));

    let script = fs::read_to_string(&hook_path).expect("file should be readable");
    assert!(script.starts_with("#!/bin/sh"));
    assert!(script.contains("git-remarks migrate-rewrites \"$rewrite_type\""));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(&hook_path)
            .expect("hook metadata should be readable")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn second_install_is_a_no_op() {
    let git_dir = tempfile::tempdir().expect("temp dir should be created");
    install_post_rewrite_hook(git_dir.path()).expect("hook install should succeed");
    let hook_path = git_dir.path().join("hooks").join("post-rewrite");
    let before = fs::read_to_string(&hook_path).expect("file should be readable");

    let result = install_post_rewrite_hook(git_dir.path()).expect("hook install should succeed");
    assert_eq!(result, HookInstall::AlreadyInstalled(hook_path.clone()));
    assert_eq!(fs::read_to_string(&hook_path).expect("file should be readable"), before);
}

#[test]
fn foreign_hook_gets_call_appended_once() {
    let git_dir = tempfile::tempdir().expect("temp dir should be created");
    let hooks = git_dir.path().join("hooks");
    fs::create_dir_all(&hooks).expect("hooks dir should be created");
    let hook_path = hooks.join("post-rewrite");
    fs::write(&hook_path, "#!/bin/sh\necho rewritten\n").expect("fixture file should be written");

    let result = install_post_rewrite_hook(git_dir.path()).expect("hook install should succeed");
    assert_eq!(result, HookInstall::Appended(hook_path.clone()));
    let script = fs::read_to_string(&hook_path).expect("file should be readable");
    assert!(script.starts_with("#!/bin/sh\necho rewritten\n"));
    assert!(script.contains("git-remarks migrate-rewrites \"$1\""));

    assert_eq!(
        install_post_rewrite_hook(git_dir.path()).expect("hook install should succeed"),
        HookInstall::AlreadyInstalled(hook_path.clone())
    );
    assert_eq!(script.matches("migrate-rewrites").count(), 1);
}
