use std::process::Command;

fn main() {
    // Embed a UTC build timestamp for the startup banner. Builds on
    // hosts without a usable `date` just report "unknown".
    let stamp = Command::new("date")
        .args(["-u", "+%Y-%m-%dT%H:%M:%SZ"])
        .output()
        .ok()
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=CATCON_BUILD_TIME={stamp}");
}
