use crate::error::{CliError, Result};
use qfold::core::models::conformation::{Conformation, DihedralPair};
use qfold::workflows::DiscoveryExport;
use qfold::workflows::discover::AttemptSummary;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads sequences from plain text (one per line) or FASTA. Blank lines and `#` comments are
/// skipped; FASTA records may wrap across lines.
pub fn read_sequences(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_sequences(&content))
}

fn parse_sequences(content: &str) -> Vec<String> {
    let mut sequences = Vec::new();
    let mut fasta_record: Option<String> = None;

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('>') {
            if let Some(record) = fasta_record.take().filter(|r| !r.is_empty()) {
                sequences.push(record);
            }
            fasta_record = Some(String::new());
            continue;
        }
        match fasta_record.as_mut() {
            Some(record) => record.push_str(line),
            None => sequences.push(line.to_string()),
        }
    }
    if let Some(record) = fasta_record.filter(|r| !r.is_empty()) {
        sequences.push(record);
    }
    sequences
}

#[derive(Debug, Deserialize)]
struct DihedralRow {
    phi: f64,
    psi: f64,
}

/// Reads a `phi,psi` CSV (with header) into a conformation. Range checks are left to the scorer.
pub fn read_dihedrals(path: &Path) -> Result<Conformation> {
    let parse_error = |e: csv::Error| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(parse_error)?;

    let angles = reader
        .deserialize::<DihedralRow>()
        .map(|row| row.map(|r| DihedralPair::new(r.phi, r.psi)))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(parse_error)?;
    debug!(path = %path.display(), residues = angles.len(), "Read dihedral angles.");
    Ok(Conformation::new(angles))
}

/// Writes one discovery as `<dir>/<id>.toml` and returns the path.
pub fn write_discovery(dir: &Path, export: &DiscoveryExport) -> Result<PathBuf> {
    let path = dir.join(format!("{}.toml", export.id));
    write_toml(&path, export)?;
    Ok(path)
}

pub fn write_toml<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = toml::to_string_pretty(value).map_err(|e| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    fs::write(path, content)?;
    Ok(())
}

pub fn write_summary(path: &Path, rows: &[AttemptSummary]) -> Result<()> {
    let write_error = |e: csv::Error| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    };
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for row in rows {
        writer.serialize(row).map_err(write_error)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn plain_and_fasta_sequences_are_parsed() {
        let content = "\
# candidates
AGPLAWATAFSAVAIK

>first
AGPLAWATAF
SAVAIK
>second
KKLLEELLKKAAEE
";
        assert_eq!(
            parse_sequences(content),
            vec![
                "AGPLAWATAFSAVAIK".to_string(),
                "AGPLAWATAFSAVAIK".to_string(),
                "KKLLEELLKKAAEE".to_string(),
            ]
        );
    }

    #[test]
    fn dihedral_csv_is_read_in_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("angles.csv");
        fs::write(&path, "phi, psi\n-63.0, -43.0\n# loop\n-120.0, 130.0\n").unwrap();

        let conformation = read_dihedrals(&path).unwrap();
        assert_eq!(conformation.len(), 2);
        assert_eq!(conformation.angles()[1], DihedralPair::new(-120.0, 130.0));
    }

    #[test]
    fn malformed_dihedral_csv_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("angles.csv");
        fs::write(&path, "phi,psi\n-63.0,helix\n").unwrap();

        assert!(matches!(
            read_dihedrals(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn summary_rows_are_written_with_a_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let rows = vec![AttemptSummary {
            sequence: "AGPLAWATAFSAVAIK".to_string(),
            outcome: "rejected".to_string(),
            id: None,
            seed: Some(42),
            rigor_score: Some(0.55),
            total_energy: Some(-12.5),
            detail: "failed gates: reality".to_string(),
        }];
        write_summary(&path, &rows).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("sequence,outcome,id,seed,rigor_score,total_energy,detail")
        );
        assert_eq!(
            lines.next(),
            Some("AGPLAWATAFSAVAIK,rejected,,42,0.55,-12.5,failed gates: reality")
        );
    }
}
