// Interactive prompt flow and batch driver
//
// Menu loop: pick a subject kind, a sort, a fetch window (only for the
// sorts that need one) and a count, then fetch -> select -> download
// each record in turn. A single task's failure is reported and the
// batch moves on; 'b' backs out of any prompt.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::config::Settings;
use crate::download;
use crate::errors::DownloadError;
use crate::models::{format_count, DownloadOutcome, FetchWindow, SortSpec, Subject};
use crate::naming;
use crate::resolve::LinkResolver;
use crate::select::select_top;
use crate::source::VideoSource;

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn is_back(input: &str) -> bool {
    matches!(input.to_lowercase().as_str(), "b" | "back")
}

fn report(err: &DownloadError) {
    println!("✗ {}", err);
    if let Some(hint) = err.hint() {
        println!("   Hint: {}", hint);
    }
}

/// None means the user backed out
fn prompt_sort(default: SortSpec) -> io::Result<Option<SortSpec>> {
    let input = prompt(
        "\nDownload which videos:\n\
         \x20 [1] Most recent\n\
         \x20 [2] Most viewed\n\
         \x20 [3] Oldest\n\
         \x20 [4] Original order\n\
         \x20 [b] Back\n\n\
         Choice: ",
    )?;
    if is_back(&input) {
        return Ok(None);
    }
    Ok(Some(match input.as_str() {
        "2" => SortSpec::MostViewed,
        "3" => SortSpec::Oldest,
        "4" => SortSpec::OriginalOrder,
        "1" => SortSpec::Recent,
        _ => default,
    }))
}

fn prompt_window(sort: SortSpec, default: usize) -> io::Result<Option<FetchWindow>> {
    let input = prompt(&format!(
        "\nFetch window for {}:\n\
         \x20 [1] Recent 50 videos (fast)\n\
         \x20 [2] Recent 200 videos (medium)\n\
         \x20 [3] Recent 500 videos (slow)\n\
         \x20 [4] ALL videos (very slow)\n\
         \x20 [b] Back\n\n\
         Choice: ",
        sort
    ))?;
    if is_back(&input) {
        return Ok(None);
    }
    Ok(Some(match input.as_str() {
        "1" => FetchWindow::Limited(50),
        "2" => FetchWindow::Limited(200),
        "3" => FetchWindow::Limited(500),
        "4" => FetchWindow::All,
        _ => FetchWindow::Limited(default),
    }))
}

fn prompt_count(default: usize) -> io::Result<Option<usize>> {
    let input = prompt(&format!(
        "\n📊 Number of videos to download (default {}, or 'b' to go back): ",
        default
    ))?;
    if is_back(&input) {
        return Ok(None);
    }
    Ok(Some(input.parse::<usize>().ok().filter(|n| *n > 0).unwrap_or(default)))
}

fn print_profile(subject: &Subject, profile: &crate::models::ProfileInfo) {
    println!("\n📊 User info: {}", subject);
    println!("{}", "─".repeat(40));
    println!("  Videos:    {}", format_count(profile.video_count));
    println!("  Followers: {}", format_count(profile.follower_count));
    println!("  Following: {}", format_count(profile.following_count));
    println!("  Likes:     {}", format_count(profile.heart_count));
    println!("{}", "─".repeat(40));
}

pub async fn run(
    settings: &Settings,
    source: &dyn VideoSource,
    resolver: &mut dyn LinkResolver,
) -> io::Result<()> {
    println!("\n{}", "=".repeat(60));
    println!("  TikTok Downloader");
    println!("{}", "=".repeat(60));

    loop {
        let choice = prompt(
            "\nDownload by:\n\
             \x20 [1] Username\n\
             \x20 [2] Hashtag\n\
             \x20 [q] Quit\n\n\
             Choice: ",
        )?
        .to_lowercase();

        match choice.as_str() {
            "1" => handle_subject(settings, source, resolver, true).await?,
            "2" => handle_subject(settings, source, resolver, false).await?,
            "q" | "quit" | "exit" => break,
            _ => println!("⚠ Invalid choice. Please enter 1, 2, or q"),
        }
    }

    resolver.shutdown().await;
    println!("\n{}", "=".repeat(60));
    println!("  Goodbye!");
    println!("{}", "=".repeat(60));
    Ok(())
}

async fn handle_subject(
    settings: &Settings,
    source: &dyn VideoSource,
    resolver: &mut dyn LinkResolver,
    is_user: bool,
) -> io::Result<()> {
    let label = if is_user {
        "\n👤 TikTok username (or 'b' to go back): @"
    } else {
        "\n🏷 Hashtag (or 'b' to go back): #"
    };
    let raw = prompt(label)?;
    if raw.is_empty() || is_back(&raw) {
        return Ok(());
    }

    let parsed = if is_user {
        Subject::user(&raw)
    } else {
        Subject::hashtag(&raw)
    };
    let subject = match parsed {
        Ok(s) => s,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };

    if is_user {
        println!("\n🔍 Fetching user info for {}...", subject);
        match source.profile(&subject).await {
            Ok(Some(profile)) => print_profile(&subject, &profile),
            Ok(None) => {}
            Err(e) => {
                report(&e);
                let retry = prompt("\nContinue anyway? [y/n]: ")?.to_lowercase();
                if !matches!(retry.as_str(), "y" | "yes") {
                    return Ok(());
                }
            }
        }
    }

    let Some(sort) = prompt_sort(settings.default_sort)? else {
        return Ok(());
    };

    let window = if sort.needs_window() {
        match prompt_window(sort, settings.default_window)? {
            Some(w) => Some(w),
            None => return Ok(()),
        }
    } else {
        None
    };

    let Some(count) = prompt_count(settings.default_count)? else {
        return Ok(());
    };

    // Sorts that keep the source order only ever need `count` records
    let window = window.unwrap_or(FetchWindow::Limited(count));

    println!(
        "\n🔍 Fetching {} {} video(s) of {} (window: {})...",
        count, sort, subject, window
    );

    let records = match source.fetch(&subject, window).await {
        Ok(records) => records,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };
    if records.is_empty() {
        println!("⚠ No videos found or source refused the request");
        return Ok(());
    }
    debug!(fetched = records.len(), "window fetched");

    let selection = select_top(records, sort, count);
    if let Some(missing) = selection.shortfall() {
        report(&DownloadError::WindowTooSmall {
            requested: selection.requested,
            available: selection.picked.len(),
        });
        debug!(missing, "continuing with a short batch");
    }

    println!("✓ Found {} video(s)\n", selection.picked.len());
    download_batch(settings, resolver, &subject, sort, selection.picked).await
}

async fn download_batch(
    settings: &Settings,
    resolver: &mut dyn LinkResolver,
    subject: &Subject,
    sort: SortSpec,
    records: Vec<crate::models::VideoRecord>,
) -> io::Result<()> {
    let http = match download::transfer_client() {
        Ok(client) => client,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };

    let dest_dir = PathBuf::from(&settings.base_folder).join(subject.dir_label());
    let total = records.len();
    let mut completed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    for (rank, record) in records.iter().enumerate() {
        println!(
            "[{}/{}] {}  {} views  {}",
            rank + 1,
            total,
            record.id,
            format_count(record.view_count),
            record.publish_date()
        );

        let dest = dest_dir.join(naming::task_filename(rank, total, sort, record));
        match download::run_task(&http, resolver, record, dest).await {
            DownloadOutcome::Completed(path) => {
                completed += 1;
                println!("    ✓ {}", path.display());
            }
            DownloadOutcome::Skipped(path) => {
                skipped += 1;
                println!("    ⊘ exists: {}", path.display());
            }
            DownloadOutcome::Failed(e) => {
                failed += 1;
                println!("    ✗ {}", e);
                if let Some(hint) = e.hint() {
                    println!("      Hint: {}", hint);
                }
            }
        }
    }

    println!(
        "\n✓ {}/{} completed, {} failed, {} skipped",
        completed, total, failed, skipped
    );
    Ok(())
}
