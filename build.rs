use std::process::Command;

fn main() {
    // CI builds export GITHUB_SHA; local builds ask git directly
    let commit = short_sha_from_env()
        .or_else(short_sha_from_git)
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=GIT_COMMIT={}", commit);
    println!("cargo:rustc-env=BUILD_DATE={}", build_date);

    if std::path::Path::new(".git/HEAD").exists() {
        println!("cargo:rerun-if-changed=.git/HEAD");
    }
}

fn short_sha_from_env() -> Option<String> {
    std::env::var("GITHUB_SHA")
        .ok()
        .filter(|sha| sha.len() >= 7)
        .map(|sha| sha[..7].to_string())
}

fn short_sha_from_git() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}
