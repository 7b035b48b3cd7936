// Dashboard Edge - Build Task Runner
// Unified build system using cargo xtask pattern

use anyhow::{Context, Result};
use xshell::{cmd, Shell};

const BINARY: &str = "dashboard-edge";

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("build") => {
            let release = args.contains(&"--release".to_string());
            build(&sh, release)
        }
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        }
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        Some("dist") => dist(&sh),
        _ => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!("Dashboard Edge - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the edge binary");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Build and run the edge");
    println!("  clean               Clean build artifacts");
    println!("  ci                  Run all CI checks (format + clippy + build + test)");
    println!("  dist                Create distribution package (tar.gz)");
}

/// Build the backend, running clippy first for release builds
fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🔨 Building Dashboard Edge...");

    if release {
        println!("🔍 Running clippy checks...");
        clippy(sh)?;
    }

    let _dir = sh.push_dir(project_root().join("backend"));
    if release {
        cmd!(sh, "cargo build --release")
            .run()
            .context("Failed to build backend in release mode")?;
        create_distribution(sh)?;
    } else {
        cmd!(sh, "cargo build").run().context("Failed to build backend")?;
    }

    println!("✅ Build complete!");
    Ok(())
}

/// Create distribution package structure
fn create_distribution(sh: &Shell) -> Result<()> {
    let project = project_root();
    let dist_dir = project.join("build/dist");

    cmd!(sh, "mkdir -p {dist_dir}/bin").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/conf").run()?;
    cmd!(sh, "mkdir -p {dist_dir}/logs").run()?;

    let binary_src = project.join("target/release").join(BINARY);
    let binary_dst = dist_dir.join("bin").join(BINARY);
    cmd!(sh, "cp {binary_src} {binary_dst}").run()?;

    create_config_file(&dist_dir)
}

/// Create default config file
fn create_config_file(dist_dir: &std::path::Path) -> Result<()> {
    let config_path = dist_dir.join("conf/config.toml");
    let config_content = r#"[server]
host = "0.0.0.0"
port = 8080

[upstream]
url = "http://127.0.0.1:3001"
timeout_secs = "30s"

[logging]
level = "info,dashboard_edge=debug"
file = "logs/dashboard-edge.log"

[i18n]
locales = ["en"]
default_locale = "en"
url_mapping_strategy = "rewrite"
locale_cookie = "locale"

[auth]
jwt_secret = "dev-secret-key-change-in-production"
access_token_cookie = "edge-access-token"
session_ttl_secs = "1h"
refresh_window_secs = "5m"
cookie_secure = true

[gate]
login_path = "/login"
mfa_verify_path = "/mfa/verify"
public_paths = ["/login"]
public_segments = ["i/", "verify", "all-done", "desktop/search"]
team_paths = ["/teams/create", "/teams"]
invite_prefix = "/teams/invite/"
excluded_prefixes = ["/_next/static", "/_next/image", "/favicon.ico", "/api", "/health"]
"#;

    std::fs::write(config_path, config_content).context("Failed to create config file")?;
    Ok(())
}

/// Run all tests
fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    let _dir = sh.push_dir(project_root());
    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;
    println!("✅ All tests passed!");
    Ok(())
}

/// Format code
fn format(sh: &Shell, check: bool) -> Result<()> {
    println!("🎨 Formatting code...");
    let _dir = sh.push_dir(project_root());

    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }
    Ok(())
}

/// Run clippy checks
fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root().join("backend"));
    cmd!(sh, "cargo clippy --release --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;
    Ok(())
}

/// Build and run the edge
fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 Building and running Dashboard Edge...");
    let _dir = sh.push_dir(project_root().join("backend"));

    let mut cmd = cmd!(sh, "cargo run --");
    for arg in args {
        cmd = cmd.arg(arg);
    }
    cmd.run().context("Failed to run application")?;
    Ok(())
}

/// Clean build artifacts
fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning build artifacts...");
    let project = project_root();

    let _dir = sh.push_dir(&project);
    cmd!(sh, "cargo clean").run()?;

    let build_dir = project.join("build");
    if build_dir.exists() {
        cmd!(sh, "rm -rf {build_dir}").run()?;
    }

    println!("✅ Clean complete!");
    Ok(())
}

/// Run all CI checks (format + clippy + build + test)
fn ci(sh: &Shell) -> Result<()> {
    println!("🔄 Running CI pipeline...");

    println!("📝 [1/4] Checking code format...");
    format(sh, true)?;

    println!("🔍 [2/4] Running clippy checks...");
    clippy(sh)?;

    println!("🔨 [3/4] Building project...");
    build(sh, false)?;

    println!("🧪 [4/4] Running tests...");
    test(sh)?;

    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

/// Create distribution package (tar.gz)
fn dist(sh: &Shell) -> Result<()> {
    println!("📦 Creating distribution package...");
    build(sh, true)?;

    let dist_dir = project_root().join("build/dist");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let package_name = format!("{}-{}.tar.gz", BINARY, timestamp);

    let _dir = sh.push_dir(&dist_dir);
    cmd!(sh, "tar czf {package_name} bin conf logs")
        .run()
        .context("Failed to create tarball")?;

    println!("✅ Distribution package created: {}", dist_dir.join(&package_name).display());
    Ok(())
}

/// Get project root directory
fn project_root() -> std::path::PathBuf {
    std::path::Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}
