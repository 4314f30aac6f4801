
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Opens a text file for buffered reading, decompressing it if the extension is `.gz`.
/// # Arguments
/// * `filename` - the file path to open
/// # Errors
/// * if the file does not open properly
pub fn open_text_reader(filename: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let fp = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    let reader: Box<dyn Read> = if filename.extension().unwrap_or_default() == "gz" {
        Box::new(flate2::read::MultiGzDecoder::new(fp))
    } else {
        Box::new(fp)
    };
    Ok(Box::new(BufReader::new(reader)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_plain_and_gz() {
        let tmp_dir = tempfile::tempdir().unwrap();

        let plain_fn = tmp_dir.path().join("plain.txt");
        std::fs::write(&plain_fn, "line1\nline2\n").unwrap();
        let lines: Vec<String> = open_text_reader(&plain_fn).unwrap()
            .lines().collect::<std::io::Result<_>>().unwrap();
        assert_eq!(lines, vec!["line1", "line2"]);

        let gz_fn = tmp_dir.path().join("compressed.txt.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            File::create(&gz_fn).unwrap(), flate2::Compression::default()
        );
        encoder.write_all(b"line1\nline2\n").unwrap();
        encoder.finish().unwrap();
        let lines: Vec<String> = open_text_reader(&gz_fn).unwrap()
            .lines().collect::<std::io::Result<_>>().unwrap();
        assert_eq!(lines, vec!["line1", "line2"]);
    }

    #[test]
    fn test_missing_file() {
        let tmp_dir = tempfile::tempdir().unwrap();
        assert!(open_text_reader(&tmp_dir.path().join("missing.txt")).is_err());
    }
}
