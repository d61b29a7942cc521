//! Idea board commands: list, browse, vote, comment, submit, search

use anyhow::Result;
use colored::Colorize;
use console::style;
use dialoguer::Select;
use gamesta_core::domains::categories::{self, Category};
use gamesta_core::domains::comments;
use gamesta_core::domains::ideas::{self, Idea, IdeaQuery, IdeaSort, IdeaSubmission};
use gamesta_core::domains::notifications::{self, DEFAULT_NOTIFICATION_LIMIT};
use gamesta_core::domains::votes::{self, VoteType};
use gamesta_core::storage::DraftIdea;
use uuid::Uuid;

use crate::cmd::report;
use crate::context::AppContext;

/// One-shot listing.
pub async fn list(
    ctx: &AppContext,
    category: Option<Uuid>,
    sort: IdeaSort,
    limit: usize,
) -> Result<()> {
    let query = IdeaQuery {
        category_id: category,
        sort_by: sort,
        limit,
        ..IdeaQuery::default()
    };
    let ideas = ideas::list_ideas(ctx.deps(), ctx.viewer(), &query).await?;

    if ideas.is_empty() {
        ctx.print_info("No ideas yet.");
        return Ok(());
    }
    for idea in &ideas {
        print_idea_line(idea);
    }
    Ok(())
}

/// Pick an idea from the default listing and act on it.
pub async fn browse(ctx: &AppContext) -> Result<()> {
    let ideas = match ideas::list_ideas(ctx.deps(), ctx.viewer(), &IdeaQuery::default()).await {
        Ok(ideas) => ideas,
        Err(e) => {
            report(ctx, &e);
            match ideas::cached_ideas(ctx.deps()) {
                Some(cached) => {
                    ctx.print_warning("Showing the last list fetched.");
                    cached
                }
                None => return Ok(()),
            }
        }
    };
    pick_and_open(ctx, ideas).await
}

pub async fn search(ctx: &AppContext) -> Result<()> {
    let history = ctx.deps().cache.search_history();
    if !history.is_empty() {
        ctx.print_info(&format!("Recent: {}", history.join(", ")));
    }
    let term = ctx.input("Search")?;

    match ideas::search_ideas(ctx.deps(), &term, &[]).await {
        Ok(found) if found.is_empty() => ctx.print_info("Nothing matched."),
        Ok(found) => pick_and_open(ctx, found).await?,
        Err(e) => report(ctx, &e),
    }
    Ok(())
}

pub async fn submit(ctx: &AppContext) -> Result<()> {
    if ctx.viewer().is_none() {
        ctx.print_warning("Log in to submit ideas.");
        return Ok(());
    }
    let cats = match categories::list_categories(ctx.deps()).await {
        Ok(cats) => cats,
        Err(e) => {
            report(ctx, &e);
            Vec::new()
        }
    };

    let draft = pick_draft(ctx)?;
    ctx.print_header("New idea");
    let title = match &draft {
        Some(d) => {
            println!("  Title: {}", d.title);
            d.title.clone()
        }
        None => ctx.input("Title")?,
    };
    let description = match &draft {
        Some(d) => {
            println!("  Description: {}", d.description);
            d.description.clone()
        }
        None => ctx.input("Description")?,
    };
    let category = pick_category(ctx, &cats)?;

    let submission = IdeaSubmission {
        title: title.clone(),
        description: description.clone(),
        category_id: category.map(|c| c.id),
    };

    match ideas::submit_idea(ctx.deps(), ctx.viewer(), submission).await {
        Ok(idea) => {
            if let Some(id) = draft.and_then(|d| d.id) {
                ctx.deps().cache.delete_draft(&id);
            }
            ctx.print_success(&format!("Submitted \"{}\".", idea.title));
        }
        Err(e) => {
            report(ctx, &e);
            let mut saved = draft.unwrap_or_else(|| DraftIdea::new("", "", ""));
            saved.title = title;
            saved.description = description;
            saved.category = category.map(|c| c.name.clone()).unwrap_or_default();
            ctx.deps().cache.save_draft(saved);
            ctx.print_info("Saved as a draft.");
        }
    }
    Ok(())
}

pub async fn show_notifications(ctx: &AppContext) -> Result<()> {
    let list = match notifications::list_notifications(
        ctx.deps(),
        ctx.viewer(),
        DEFAULT_NOTIFICATION_LIMIT,
    )
    .await
    {
        Ok(list) => list,
        Err(e) => {
            report(ctx, &e);
            return Ok(());
        }
    };

    ctx.print_header("Notifications");
    if list.is_empty() {
        ctx.print_info("Nothing new.");
    }
    for n in &list {
        let marker = if n.read { " ".normal() } else { "•".bright_yellow() };
        println!(
            "{} {} {}  {}",
            marker,
            n.created_at.format("%b %d %H:%M").to_string().dimmed(),
            n.title.bold(),
            n.message
        );
    }

    for n in list.iter().filter(|n| !n.read) {
        if let Err(e) = notifications::mark_notification_read(ctx.deps(), ctx.viewer(), n.id).await {
            report(ctx, &e);
            break;
        }
    }
    Ok(())
}

/// Print the idea board whenever it changes, until Ctrl+C.
pub async fn live(ctx: &AppContext) -> Result<()> {
    let deps = ctx.deps();
    let mut updates = deps.change_feed.watch_ideas(deps.store.clone()).await;
    ctx.print_info("Watching for new ideas. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            update = updates.recv() => {
                let Ok(snapshot) = update else { break };
                let Ok(list) = serde_json::from_value::<Vec<Idea>>(snapshot) else { continue };
                println!();
                println!("{}", style(format!("{} ideas", list.len())).bold());
                for idea in list.iter().take(10) {
                    print_idea_line(idea);
                }
            }
        }
    }
    Ok(())
}

async fn pick_and_open(ctx: &AppContext, ideas: Vec<Idea>) -> Result<()> {
    if ideas.is_empty() {
        ctx.print_info("No ideas yet.");
        return Ok(());
    }
    let mut items: Vec<String> = ideas.iter().map(idea_label).collect();
    items.push("← Back".to_string());

    let selection = Select::with_theme(&ctx.theme())
        .with_prompt("Pick an idea")
        .items(&items)
        .default(0)
        .interact()?;

    match ideas.get(selection) {
        Some(idea) => open(ctx, idea.id).await,
        None => Ok(()),
    }
}

async fn open(ctx: &AppContext, idea_id: Uuid) -> Result<()> {
    loop {
        let idea = match ideas::get_idea(ctx.deps(), ctx.viewer(), idea_id).await {
            Ok(Some(idea)) => idea,
            Ok(None) => {
                ctx.print_warning("That idea no longer exists.");
                return Ok(());
            }
            Err(e) => {
                report(ctx, &e);
                return Ok(());
            }
        };
        print_idea_detail(&idea);

        let options = [
            "👍 Upvote",
            "👎 Downvote",
            "💬 Comments",
            "✏️  Add comment",
            "← Back",
        ];
        let choice = Select::with_theme(&ctx.theme())
            .items(&options)
            .default(0)
            .interact()?;

        let result = match choice {
            0 => votes::cast_vote(ctx.deps(), ctx.viewer(), idea_id, VoteType::Upvote)
                .await
                .map(|_| ()),
            1 => votes::cast_vote(ctx.deps(), ctx.viewer(), idea_id, VoteType::Downvote)
                .await
                .map(|_| ()),
            2 => show_comments(ctx, idea_id).await,
            3 => {
                let text = ctx.input("Comment")?;
                comments::add_comment(ctx.deps(), ctx.viewer(), idea_id, &text, None)
                    .await
                    .map(|_| ())
            }
            _ => return Ok(()),
        };
        if let Err(e) = result {
            report(ctx, &e);
        }
    }
}

async fn show_comments(
    ctx: &AppContext,
    idea_id: Uuid,
) -> gamesta_core::common::ServiceResult<()> {
    let list = comments::list_comments(ctx.deps(), idea_id).await?;
    if list.is_empty() {
        ctx.print_info("No comments yet.");
    }
    for c in &list {
        let author = c
            .author
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("someone");
        let indent = if c.parent_id.is_some() { "    " } else { "  " };
        println!("{}{} {}", indent, format!("{}:", author).bright_cyan(), c.content);
    }
    Ok(())
}

fn pick_draft(ctx: &AppContext) -> Result<Option<DraftIdea>> {
    let drafts = ctx.deps().cache.drafts();
    if drafts.is_empty() {
        return Ok(None);
    }
    let mut items: Vec<String> = drafts
        .iter()
        .map(|d| format!("Draft: {}", if d.title.is_empty() { "(untitled)" } else { &d.title }))
        .collect();
    items.insert(0, "Start fresh".to_string());

    let selection = Select::with_theme(&ctx.theme())
        .with_prompt("Continue a draft?")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(selection.checked_sub(1).and_then(|i| drafts.get(i).cloned()))
}

fn pick_category<'a>(ctx: &AppContext, cats: &'a [Category]) -> Result<Option<&'a Category>> {
    if cats.is_empty() {
        return Ok(None);
    }
    let mut items: Vec<&str> = cats.iter().map(|c| c.name.as_str()).collect();
    items.push("No category");

    let selection = Select::with_theme(&ctx.theme())
        .with_prompt("Category")
        .items(&items)
        .default(0)
        .interact()?;
    Ok(cats.get(selection))
}

fn idea_label(idea: &Idea) -> String {
    let vote = match idea.user_vote {
        Some(VoteType::Upvote) => " ▲",
        Some(VoteType::Downvote) => " ▼",
        None => "",
    };
    format!("[{:+}] {}{}", idea.net_votes, idea.title, vote)
}

fn print_idea_line(idea: &Idea) {
    let author = idea
        .author
        .as_ref()
        .map(|a| a.username.as_str())
        .unwrap_or("unknown");
    println!(
        "{:>5}  {}  {}",
        format!("{:+}", idea.net_votes).bright_yellow(),
        idea.title.bold(),
        format!("by {}", author).dimmed()
    );
}

fn print_idea_detail(idea: &Idea) {
    println!();
    println!("{}", style(&idea.title).bold().underlined());
    if let Some(category) = &idea.category {
        println!("{}", category.name.bright_magenta());
    }
    println!("{}", idea.description);
    println!(
        "▲ {}  ▼ {}  net {}  status {}",
        idea.upvotes, idea.downvotes, idea.net_votes, idea.status
    );
    if let Some(vote) = idea.user_vote {
        println!("{}", format!("You voted: {}", vote).dimmed());
    }
    println!();
}
