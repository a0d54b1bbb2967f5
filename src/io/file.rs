use std::fs;
use std::io;
use std::path::Path;

/// Reads a whole file into a string.
pub fn read_from_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    fs::read_to_string(path)
}

/// Replaces the contents of `path` with `contents`, creating the file if
/// it does not exist.
pub fn write_to_file<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let path = std::env::temp_dir().join(format!("coriolis-file-{}.txt", std::process::id()));

        write_to_file(&path, "first\nsecond\n").expect("write");
        assert_eq!(read_from_file(&path).expect("read"), "first\nsecond\n");

        write_to_file(&path, "replaced").expect("overwrite");
        assert_eq!(read_from_file(&path).expect("reread"), "replaced");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = std::env::temp_dir().join("coriolis-file-does-not-exist.txt");
        assert!(read_from_file(path).is_err());
    }
}
