//! `smsfwd preview`: show what a captured feed would be forwarded as.

use std::path::Path;

use smsfwd_core::modem::ModemClient;
use smsfwd_modem::FeedFile;
use smsfwd_pipeline::{parse_feed, reassemble_detailed};

pub async fn run(feed_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = FeedFile::new(feed_path);
    let feed = source.fetch_feed().await?;
    let parts = parse_feed(&feed)?;
    let assembled = reassemble_detailed(&parts);

    println!(
        "🔍 {}: {} part(s), {} message(s)\n",
        source.port(),
        parts.len(),
        assembled.messages.len()
    );

    for (n, message) in assembled.messages.iter().enumerate() {
        println!(
            "  #{} from {} at {} (indices {:?})",
            n + 1,
            message.sender,
            message.formatted_time(),
            message.source_indices
        );
        for line in message.content.lines() {
            println!("     {line}");
        }
        println!();
    }

    for group in &assembled.incomplete {
        println!(
            "  ⏳ incomplete: {} has {} of {} part(s)",
            group.key, group.found, group.key.total
        );
    }

    Ok(())
}
