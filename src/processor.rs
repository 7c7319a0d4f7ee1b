use crate::error::ConvertError;
use crate::parser::{Parser, ReaderOpts};
use crate::serialiser;

use std::ffi::{OsStr, OsString};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwritePolicy {
    Ask,
    Always,
    Never,
}

pub struct ProcessOpts {
    pub reader: ReaderOpts,
    pub overwrite: OverwritePolicy,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Written(PathBuf),
    Missing,
    Malformed,
    Kept(PathBuf),
}

/// `dir/talk.en.txt` becomes `dir/talk.srt`.
pub fn destination_path(source: &Path) -> PathBuf {
    let mut name = source
        .file_name()
        .map(stem_before_first_dot)
        .unwrap_or_default();
    name.push(".srt");
    source.with_file_name(name)
}

// Works on the OS string so names that are not valid UTF-8 survive.
fn stem_before_first_dot(name: &OsStr) -> OsString {
    if name.as_encoded_bytes().starts_with(b".") {
        return OsString::new();
    }
    let mut stem = Path::new(name);
    while let Some(shorter) = stem.file_stem() {
        if shorter == stem.as_os_str() {
            break;
        }
        stem = Path::new(shorter);
    }
    stem.as_os_str().to_owned()
}

/// Converts a single transcript. `confirm` is only consulted when the
/// destination exists and the policy is [`OverwritePolicy::Ask`].
pub fn convert<F>(source: &Path, opts: &ProcessOpts, mut confirm: F) -> Result<Outcome>
where
    F: FnMut(&Path) -> Result<bool>,
{
    if !source.is_file() {
        warn!("{} is not a file, skipping", source.display());
        return Ok(Outcome::Missing);
    }

    let subs = match Parser::new(opts.reader).read_transcript(source) {
        Ok(subs) => subs,
        Err(err) => {
            if let Some(malformed) = err.downcast_ref::<ConvertError>() {
                error!("Bad subtitles source file error: {}", source.display());
                debug!("{}", malformed);
                return Ok(Outcome::Malformed);
            }
            return Err(err);
        }
    };
    debug!("{}: {} captions", source.display(), subs.len());

    let dst = destination_path(source);
    if dst.exists() {
        let proceed = match opts.overwrite {
            OverwritePolicy::Always => true,
            OverwritePolicy::Never => false,
            OverwritePolicy::Ask => confirm(&dst)?,
        };
        if !proceed {
            info!("{} was kept unchanged", dst.display());
            return Ok(Outcome::Kept(dst));
        }
    }

    serialiser::serialise(&subs, &dst)
        .with_context(|| format!("Failed to write SRT file: '{}'", dst.display()))?;
    info!("{} ok", dst.display());
    Ok(Outcome::Written(dst))
}

/// Asks on the terminal whether `dst` may be overwritten.
pub fn ask_overwrite(dst: &Path) -> Result<bool> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt_overwrite(dst, &mut stdin.lock(), &mut stdout)
}

fn prompt_overwrite<R: BufRead, W: Write>(
    dst: &Path,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    writeln!(output, "The destination file {} already exists.", dst.display())?;
    write!(output, "Do you want to proceed?(y/n)")?;
    output.flush()?;

    let mut response = String::new();
    input
        .read_line(&mut response)
        .context("Failed to read from stdin")?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TRANSCRIPT: &str = "0:00\nHello world\n0:05\nNext line\n";
    const EXPECTED: &str = "1\n00:00:00,000 --> 00:00:05,000\nHello world\n\n\
                            2\n00:00:05,000 --> 00:00:10,000\nNext line\n\n";

    fn opts(overwrite: OverwritePolicy) -> ProcessOpts {
        ProcessOpts {
            reader: ReaderOpts::default(),
            overwrite,
        }
    }

    fn never_asked(_: &Path) -> Result<bool> {
        panic!("confirmation should not be requested");
    }

    #[test]
    fn test_destination_path() {
        assert_eq!(destination_path(Path::new("talk.en.txt")), PathBuf::from("talk.srt"));
        assert_eq!(destination_path(Path::new("talk")), PathBuf::from("talk.srt"));
        assert_eq!(
            destination_path(Path::new("some.dir/talk.en.txt")),
            PathBuf::from("some.dir/talk.srt")
        );
    }

    #[test]
    fn test_destination_path_dots() {
        assert_eq!(destination_path(Path::new("a..b.txt")), PathBuf::from("a.srt"));
        assert_eq!(destination_path(Path::new("talk.")), PathBuf::from("talk.srt"));
        assert_eq!(destination_path(Path::new(".hidden.txt")), PathBuf::from(".srt"));
    }

    #[cfg(unix)]
    #[test]
    fn test_destination_path_keeps_non_utf8_bytes() {
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"dir/t\xffk.en.txt"));
        let expected = Path::new(OsStr::from_bytes(b"dir/t\xffk.srt"));

        assert_eq!(destination_path(source), expected);
    }

    #[test]
    fn test_convert_writes_srt() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("talk.en.txt");
        std::fs::write(&src, TRANSCRIPT).unwrap();

        let outcome = convert(&src, &opts(OverwritePolicy::Ask), never_asked).unwrap();

        let dst = dir.path().join("talk.srt");
        assert_eq!(outcome, Outcome::Written(dst.clone()));
        assert_eq!(std::fs::read_to_string(dst).unwrap(), EXPECTED);
    }

    #[test]
    fn test_convert_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("absent.txt");

        let outcome = convert(&src, &opts(OverwritePolicy::Always), never_asked).unwrap();

        assert_eq!(outcome, Outcome::Missing);
        assert!(!dir.path().join("absent.srt").exists());
    }

    #[test]
    fn test_convert_directory_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = convert(dir.path(), &opts(OverwritePolicy::Always), never_asked).unwrap();
        assert_eq!(outcome, Outcome::Missing);
    }

    #[test]
    fn test_convert_malformed_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bad.txt");
        std::fs::write(&src, "0:00\nfine\n60:00\nbroken\n").unwrap();

        let outcome = convert(&src, &opts(OverwritePolicy::Always), never_asked).unwrap();

        assert_eq!(outcome, Outcome::Malformed);
        assert!(!dir.path().join("bad.srt").exists());
    }

    #[test]
    fn test_convert_declined_keeps_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("talk.txt");
        let dst = dir.path().join("talk.srt");
        std::fs::write(&src, TRANSCRIPT).unwrap();
        std::fs::write(&dst, "original").unwrap();

        let mut asked = Vec::new();
        let outcome = convert(&src, &opts(OverwritePolicy::Ask), |p: &Path| {
            asked.push(p.to_path_buf());
            Ok(false)
        })
        .unwrap();

        assert_eq!(outcome, Outcome::Kept(dst.clone()));
        assert_eq!(asked, vec![dst.clone()]);
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "original");
    }

    #[test]
    fn test_convert_confirmed_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("talk.txt");
        let dst = dir.path().join("talk.srt");
        std::fs::write(&src, TRANSCRIPT).unwrap();
        std::fs::write(&dst, "original").unwrap();

        let outcome = convert(&src, &opts(OverwritePolicy::Ask), |_: &Path| Ok(true)).unwrap();

        assert_eq!(outcome, Outcome::Written(dst.clone()));
        assert_eq!(std::fs::read_to_string(dst).unwrap(), EXPECTED);
    }

    #[test]
    fn test_convert_policies_skip_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("talk.txt");
        let dst = dir.path().join("talk.srt");
        std::fs::write(&src, TRANSCRIPT).unwrap();
        std::fs::write(&dst, "original").unwrap();

        let outcome = convert(&src, &opts(OverwritePolicy::Never), never_asked).unwrap();
        assert_eq!(outcome, Outcome::Kept(dst.clone()));

        let outcome = convert(&src, &opts(OverwritePolicy::Always), never_asked).unwrap();
        assert_eq!(outcome, Outcome::Written(dst.clone()));
        assert_eq!(std::fs::read_to_string(dst).unwrap(), EXPECTED);
    }

    #[test]
    fn test_convert_empty_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty.txt");
        std::fs::write(&src, "").unwrap();

        let outcome = convert(&src, &opts(OverwritePolicy::Ask), never_asked).unwrap();

        let dst = dir.path().join("empty.srt");
        assert_eq!(outcome, Outcome::Written(dst.clone()));
        assert_eq!(std::fs::read_to_string(dst).unwrap(), "");
    }

    macro_rules! test_prompt {
        ($($name:ident: $value:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (answer, expected) = $value;

                let mut input = Cursor::new(answer);
                let mut output = Vec::new();
                let proceed =
                    prompt_overwrite(Path::new("talk.srt"), &mut input, &mut output).unwrap();

                assert_eq!(proceed, expected);
                assert_eq!(
                    String::from_utf8(output).unwrap(),
                    "The destination file talk.srt already exists.\nDo you want to proceed?(y/n)"
                );
            }
        )*
        }
    }

    test_prompt! {
        test_prompt_yes: ("y\n", true),
        test_prompt_upper: (" Y \n", true),
        test_prompt_no: ("n\n", false),
        test_prompt_yes_word: ("yes\n", false),
        test_prompt_eof: ("", false),
    }
}
