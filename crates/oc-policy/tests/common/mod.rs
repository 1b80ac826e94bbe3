use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;

#[allow(dead_code)]
pub fn setup_command(path: &Path) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("oc-policy");

    cmd.current_dir(path)
        .env_remove("OC_POLICY_LOG_LEVEL")
        .env_remove("OC_POLICY_LOG_FMT")
        .env_remove("OC_POLICY_MASTER_NAMESPACE")
        .env("NO_COLOR", "true");

    cmd
}

#[allow(dead_code)]
pub fn test_data(path: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(path)
        .to_string_lossy()
        .to_string()
}
