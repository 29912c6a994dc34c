use artcart::runner::{Options, Runner};
use indicatif::ProgressBar;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(Options {
        fetch_rate: 5,
        timeout_seconds: 5,
        ..Options::default()
    })?;

    let view = runner.view(1).await?;
    println!(
        "page {} holds {} of {} records",
        view.page.number,
        view.page.records.len(),
        view.page.total
    );

    let outcome = runner.pick(24, ProgressBar::hidden()).await?;
    println!(
        "collected {} of {} (exhausted: {})",
        outcome.collected, outcome.requested, outcome.exhausted
    );

    for record in runner.selection().iter().take(5) {
        println!("{} {}", record.id, record.title.as_deref().unwrap_or("N/A"));
    }

    Ok(())
}
