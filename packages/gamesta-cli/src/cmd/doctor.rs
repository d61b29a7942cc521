//! Connection and schema checks

use anyhow::Result;
use colored::Colorize;
use gamesta_core::domains::diagnostics;

use crate::context::AppContext;

pub async fn run(ctx: &AppContext) -> Result<()> {
    ctx.print_header("Backend");
    println!("  URL: {}", ctx.deps().config.supabase_url);

    let report = diagnostics::check_connection(ctx.deps()).await;
    if report.connected {
        println!(
            "  {} Connected ({} ms)",
            "✓".bright_green(),
            report.elapsed.as_millis()
        );
    } else {
        println!(
            "  {} Connection failed: {}",
            "✗".bright_red(),
            report.error.as_deref().unwrap_or("unknown error")
        );
    }

    ctx.print_header("Tables");
    let statuses = diagnostics::check_required_tables(ctx.deps()).await;
    for status in &statuses {
        if status.exists {
            println!("  {} {}", "✓".bright_green(), status.table);
        } else {
            println!(
                "  {} {} {}",
                "✗".bright_red(),
                status.table,
                status.error.as_deref().unwrap_or_default().dimmed()
            );
        }
    }

    let missing = statuses.iter().filter(|s| !s.exists).count();
    println!();
    if missing == 0 && report.connected {
        ctx.print_success("All checks passed.");
    } else {
        ctx.print_warning(&format!("{} table check(s) failed.", missing));
    }
    Ok(())
}
