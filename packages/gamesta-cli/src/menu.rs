//! Interactive menu

use anyhow::Result;
use colored::Colorize;
use console::Term;
use dialoguer::Select;

use crate::cmd;
use crate::context::AppContext;

/// Actions offered by the menu. Which ones show depends on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    // Board
    Browse,
    Search,
    Submit,
    Live,
    // Account
    Login,
    Register,
    Verify,
    Notifications,
    Profile,
    Logout,
    // Utilities
    Doctor,
    Exit,
}

impl MenuAction {
    fn label(&self) -> &'static str {
        match self {
            MenuAction::Browse => "📋 Browse ideas",
            MenuAction::Search => "🔍 Search ideas",
            MenuAction::Submit => "💡 Submit an idea",
            MenuAction::Live => "📡 Watch the board live",
            MenuAction::Login => "🔑 Log in",
            MenuAction::Register => "📝 Register",
            MenuAction::Verify => "✉️  I confirmed my email",
            MenuAction::Notifications => "🔔 Notifications",
            MenuAction::Profile => "👤 Profile",
            MenuAction::Logout => "🚪 Log out",
            MenuAction::Doctor => "🩺 Check backend",
            MenuAction::Exit => "🛑 Exit",
        }
    }
}

fn actions(signed_in: bool) -> Vec<MenuAction> {
    let mut actions = vec![MenuAction::Browse, MenuAction::Search];
    if signed_in {
        actions.extend([
            MenuAction::Submit,
            MenuAction::Notifications,
            MenuAction::Profile,
            MenuAction::Live,
            MenuAction::Logout,
        ]);
    } else {
        actions.extend([
            MenuAction::Live,
            MenuAction::Login,
            MenuAction::Register,
            MenuAction::Verify,
        ]);
    }
    actions.extend([MenuAction::Doctor, MenuAction::Exit]);
    actions
}

pub async fn run(ctx: &AppContext) -> Result<()> {
    let term = Term::stdout();
    print_banner(&term)?;

    loop {
        println!();
        let user = ctx.reconciler.current_user();
        match &user {
            Some(profile) => println!("Signed in as {}", profile.username.bright_cyan()),
            None => println!("{}", "Not signed in".dimmed()),
        }

        let actions = actions(user.is_some());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let selection = Select::with_theme(&ctx.theme())
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_on(&term)?;

        ctx.reconciler.touch_activity();
        match actions[selection] {
            MenuAction::Browse => cmd::ideas::browse(ctx).await?,
            MenuAction::Search => cmd::ideas::search(ctx).await?,
            MenuAction::Submit => cmd::ideas::submit(ctx).await?,
            MenuAction::Live => cmd::ideas::live(ctx).await?,
            MenuAction::Login => cmd::account::login(ctx).await?,
            MenuAction::Register => cmd::account::register(ctx).await?,
            MenuAction::Verify => cmd::account::verify(ctx).await?,
            MenuAction::Notifications => cmd::ideas::show_notifications(ctx).await?,
            MenuAction::Profile => cmd::account::edit_profile(ctx).await?,
            MenuAction::Logout => cmd::account::logout(ctx).await?,
            MenuAction::Doctor => cmd::doctor::run(ctx).await?,
            MenuAction::Exit => {
                println!("{}", "👋 Goodbye!".bright_blue());
                break;
            }
        }
    }

    Ok(())
}

fn print_banner(term: &Term) -> Result<()> {
    term.clear_screen()?;
    println!("{}", "╔════════════════════════════════════════╗".bright_cyan());
    println!("{}", "║        Gamesta - Idea Board            ║".bright_cyan());
    println!("{}", "╚════════════════════════════════════════╝".bright_cyan());
    Ok(())
}
