//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# cancel-lint configuration

[options]
# Generate `CancellationToken` with a `using System.Threading;` directive
# instead of the fully qualified `System.Threading.CancellationToken`.
"cancel_lint.prefer_short_type_names" = false

# Hide CA2016 where a cancel-lint rule already reports the same call.
# "cancel_lint.suppress_ca2016" = true

# Rule configurations, keyed by code or name.
# Each rule can be enabled/disabled and have its severity overridden

[rules.CT003]
enabled = true
# severity = "warning"

[rules.add-cancellation-token-to-call]
enabled = true

# [rules.missing-token-on-fire-and-forget]
# enabled = false
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_config(Path::new("cancel-lint.toml"), force)?;

    println!("Created cancel-lint.toml");
    println!("\nNext steps:");
    println!("  1. Edit cancel-lint.toml to configure rules");
    println!("  2. Run: cancel-lint check <compilation.json>");

    Ok(())
}

fn write_config(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}
