//! FASTA ingestion.
//!
//! Reads records with `needletail`, truncates headers at the first
//! whitespace, and decodes sequences straight into 2-bit code arrays. Name
//! registration (and the duplicate-name check for references) is the
//! caller's job via the pipeline's `NameTable`.

use std::path::Path;

use needletail::parse_fastx_file;
use velella_core::{Result, VelellaError};

use crate::alphabet::decode_dna;

/// One input sequence, already decoded to 2-bit codes.
#[derive(Debug, Clone)]
pub struct DecodedSequence {
    pub name: String,
    pub codes: Vec<u8>,
}

/// Read every record of a FASTA/FASTQ file.
pub fn read_fasta(path: impl AsRef<Path>) -> Result<Vec<DecodedSequence>> {
    let path = path.as_ref();
    let mut reader = parse_fastx_file(path).map_err(|e| VelellaError::Parse(e.to_string()))?;

    let mut sequences = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| VelellaError::Parse(e.to_string()))?;
        let header = String::from_utf8_lossy(record.id());
        let name = header
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        sequences.push(DecodedSequence {
            name,
            codes: decode_dna(&record.seq()),
        });
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_and_decodes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, ">seq1 some description").unwrap();
        writeln!(file, "ACGT").unwrap();
        writeln!(file, ">seq2").unwrap();
        writeln!(file, "TTNNAA").unwrap();
        file.flush().unwrap();

        let seqs = read_fasta(file.path()).unwrap();
        assert_eq!(seqs.len(), 2);
        assert_eq!(seqs[0].name, "seq1");
        assert_eq!(seqs[0].codes, vec![0, 1, 2, 3]);
        // Ns are skipped, not encoded.
        assert_eq!(seqs[1].name, "seq2");
        assert_eq!(seqs[1].codes, vec![3, 3, 0, 0]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_fasta("/nonexistent/reads.fasta").is_err());
    }
}
