use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extension given to binary listings.
pub const BINARY_EXTENSION: &str = "hack";

/// Destination for a source file: same path with the extension replaced.
pub fn binary_path(source: &Path) -> PathBuf {
    source.with_extension(BINARY_EXTENSION)
}

/// Write each line followed by `\n`. The lines land in a sibling temporary file that is
/// renamed over `dest` once complete, so `dest` is never left half written.
pub fn write_lines<I, S>(dest: &Path, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tmp = temp_path(dest);
    let res = write_all(&tmp, lines).and_then(|()| fs::rename(&tmp, dest));
    if res.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    res
}

fn write_all<I, S>(path: &Path, lines: I) -> io::Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut file = BufWriter::new(File::create(path)?);
    for line in lines {
        file.write_all(line.as_ref().as_bytes())?;
        file.write_all(b"\n")?;
    }
    file.into_inner().map_err(|e| e.into_error())?.sync_all()
}

fn temp_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or(dest.as_os_str()));
    name.push(".tmp");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{binary_path, write_lines};

    #[test]
    fn derives_binary_path() {
        assert_eq!(binary_path(Path::new("dir/Prog.asm")), Path::new("dir/Prog.hack"));
        assert_eq!(binary_path(Path::new("Prog")), Path::new("Prog.hack"));
    }

    #[test]
    fn writes_lines_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.hack");
        write_lines(&dest, ["0000000000000010", "1110110000010000"]).unwrap();
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "0000000000000010\n1110110000010000\n"
        );
        // Only the destination remains
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.hack");
        fs::write(&dest, "stale\nstale\nstale\n").unwrap();
        write_lines(&dest, ["1"]).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "1\n");
    }

    #[test]
    fn unwritable_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.hack");
        assert!(write_lines(&dest, ["1"]).is_err());
        assert!(!dest.exists());
    }
}
