use anyhow::Result;
use clap::Parser;

/// Browse a month of events in the terminal.
#[derive(Parser, Debug)]
#[command(name = "evcal", version)]
struct Args {
    /// Month name ("January") or number ("01"); defaults to this month.
    month: Option<String>,
    /// Four digit year; defaults to this year.
    year: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    evcal::tui::run(args.month, args.year).await
}
