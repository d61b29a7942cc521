//! Application context with shared state and utilities

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use gamesta_core::domains::auth::AuthReconciler;
use gamesta_core::kernel::GamestaDeps;
use tokio::task::JoinHandle;

/// Application context passed to all commands
pub struct AppContext {
    pub reconciler: AuthReconciler,
    pub quiet: bool,
    listener: JoinHandle<()>,
}

impl AppContext {
    pub fn new(deps: GamestaDeps, quiet: bool) -> Self {
        let reconciler = AuthReconciler::new(deps);
        let listener = reconciler.spawn_listener();
        Self {
            reconciler,
            quiet,
            listener,
        }
    }

    pub fn deps(&self) -> &GamestaDeps {
        self.reconciler.deps()
    }

    /// Id of the signed-in user, if the profile is loaded.
    pub fn viewer(&self) -> Option<uuid::Uuid> {
        self.reconciler.current_user_id()
    }

    pub fn theme(&self) -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.quiet {
            return Ok(default);
        }
        Ok(Confirm::with_theme(&self.theme())
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    pub fn input(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme())
            .with_prompt(prompt)
            .interact_text()?)
    }

    /// Required text with a pre-filled value.
    pub fn input_with_default(&self, prompt: &str, default: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&self.theme())
            .with_prompt(prompt)
            .with_initial_text(default)
            .interact_text()?)
    }

    /// Free text that may be left blank.
    pub fn optional_input(&self, prompt: &str) -> Result<Option<String>> {
        let value = Input::<String>::with_theme(&self.theme())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(Some(value).filter(|v| !v.trim().is_empty()))
    }

    pub fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&self.theme())
            .with_prompt(prompt)
            .interact()?)
    }

    pub fn print_header(&self, msg: &str) {
        if !self.quiet {
            println!();
            println!("{}", style(msg).bold());
        }
    }

    pub fn print_success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).green());
        }
    }

    pub fn print_warning(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).yellow());
        }
    }

    pub fn print_info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", style(msg).cyan());
        }
    }

    pub fn print_error(&self, msg: &str) {
        eprintln!("{}", style(msg).red());
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
