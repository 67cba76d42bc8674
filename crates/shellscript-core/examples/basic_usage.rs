//! Basic usage example - rotate old log files into a dated archive directory

use shellscript::prelude::*;
use shellscript::Result;

fn main() -> Result<()> {
    // Get log directory from args or use current directory
    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let stamp = to_yyyy_mm_dd(&now(), "-");
    let archive = std::path::Path::new(&dir).join(format!("archive-{}", stamp));

    let logs = FileFilter::new()
        .files_only(true)
        .empty(false)
        .apply(find(&dir, "*.log", false)?);

    if logs.is_empty() {
        println!("No logs to archive in {}", dir);
        return Ok(());
    }

    mkdir(&archive, true)?;
    for log in &logs {
        let moved = mv(log, &archive)?;
        println!("  - {}", moved.display());
    }
    let archived = total_size(find(&archive, "*", false)?)?;
    println!("Archived {} files ({})", logs.len(), format_bytes(archived, false));

    let disk = disk_usage(&archive)?;
    println!("Disk holding the archive is {}% full", disk.percent);
    Ok(())
}
