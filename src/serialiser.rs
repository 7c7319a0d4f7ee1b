use crate::caption::{Caption, TimePoint};

use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Writes the captions to `output`, replacing whatever was there.
///
/// The captions go to a temporary file next to `output` first, so a failed
/// write leaves any existing `output` untouched.
pub fn serialise<P: AsRef<Path>>(subs: &[Caption], output: P) -> Result<()> {
    let output = output.as_ref();
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).context("Failed to create file!")?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        write_subs(&mut writer, subs).context("Failed to write to output file.")?;
        writer.flush().context("Failed to write to output file.")?;
    }
    tmp.persist(output)
        .context("Failed to move output file into place.")?;
    Ok(())
}

pub fn write_subs<W: Write>(buf: &mut W, subs: &[Caption]) -> Result<()> {
    for (idx, sub) in subs.iter().enumerate() {
        write_sub(buf, idx + 1, sub)?;
    }
    Ok(())
}

fn write_sub<W: Write>(buf: &mut W, sequence_number: usize, sub: &Caption) -> Result<()> {
    writeln!(buf, "{}", sequence_number)?;
    write_ts(buf, sub.start)?;
    write!(buf, " --> ")?;
    write_ts(buf, sub.end)?;
    writeln!(buf)?;
    writeln!(buf, "{}", sub.text)?;
    writeln!(buf)?;
    Ok(())
}

// Transcripts carry no milliseconds.
fn write_ts<W: Write>(buf: &mut W, timestamp: TimePoint) -> Result<()> {
    write!(buf, "{},000", timestamp)?;
    Ok(())
}
