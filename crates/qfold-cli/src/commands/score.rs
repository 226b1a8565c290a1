use crate::cli::ScoreArgs;
use crate::config::PartialDiscoveryConfig;
use crate::error::Result;
use crate::utils::io;
use qfold::core::energy::evaluator::EnergyReport;
use qfold::core::models::sequence::Sequence;
use qfold::engine::error::EngineError;
use qfold::workflows::score_conformation;
use tracing::info;

pub fn run(args: ScoreArgs) -> Result<()> {
    let partial_config = PartialDiscoveryConfig::from_optional_file(args.config.as_deref())?;
    let tables = partial_config.load_tables()?;
    let params = partial_config.energy_params();

    let sequence: Sequence = args.sequence.trim().parse().map_err(EngineError::from)?;
    info!("Loading dihedral angles from {:?}", &args.dihedrals);
    let conformation = io::read_dihedrals(&args.dihedrals)?;

    let report = score_conformation(&sequence, &conformation, &tables, &params)?;
    print!("{}", render_report(&sequence, &report));

    if let Some(path) = &args.output {
        io::write_toml(path, &report)?;
        println!("Energy report written to: {}", path.display());
    }
    Ok(())
}

fn render_report(sequence: &Sequence, report: &EnergyReport) -> String {
    let t = &report.terms;
    let d = &report.descriptors;
    let f = &report.fractions;
    format!(
        "\
Sequence            {sequence}
Secondary structure {ss}
Helix/Sheet/Coil    {h:.3} / {s:.3} / {c:.3}

Total energy        {total:>10.4} kcal/mol
Per residue         {per:>10.4} kcal/mol
  backbone          {bb:>10.4}
  steric            {st:>10.4}
  hydrophobic       {hy:>10.4}
  electrostatic     {el:>10.4}
  special           {sp:>10.4}
  solvation         {sv:>10.4}

Molecular weight    {mw:>10.2} Da
Net charge (pH 7.4) {nc:>10.3}
GRAVY               {gravy:>10.3}
Instability index   {ii:>10.2}
Isoelectric point   {pi:>10.2}
Aromaticity         {ar:>10.3}
Aliphatic index     {ai:>10.2}
",
        ss = report.secondary_structure_string(),
        h = f.helix,
        s = f.sheet,
        c = f.coil,
        total = report.total_energy,
        per = report.per_residue_energy,
        bb = t.backbone,
        st = t.steric,
        hy = t.hydrophobic,
        el = t.electrostatic,
        sp = t.special,
        sv = t.solvation,
        mw = d.molecular_weight,
        nc = d.net_charge,
        gravy = d.gravy,
        ii = d.instability_index,
        pi = d.isoelectric_point,
        ar = d.aromaticity,
        ai = d.aliphatic_index,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::error::CliError;
    use clap::Parser;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn score_args(sequence: &str, dihedrals: &Path, output: Option<&Path>) -> ScoreArgs {
        let mut args = vec![
            "qfold".to_string(),
            "score".to_string(),
            "-s".to_string(),
            sequence.to_string(),
            "-d".to_string(),
            dihedrals.to_str().unwrap().to_string(),
        ];
        if let Some(output) = output {
            args.push("-o".to_string());
            args.push(output.to_str().unwrap().to_string());
        }
        match Cli::parse_from(args).command {
            Commands::Score(args) => args,
            _ => panic!("Expected 'score' subcommand"),
        }
    }

    fn helix_csv(dir: &Path, residues: usize) -> std::path::PathBuf {
        let path = dir.join("helix.csv");
        let mut content = String::from("phi,psi\n");
        for _ in 0..residues {
            content.push_str("-63.0,-43.0\n");
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn report_is_written_and_matches_direct_scoring() {
        let dir = tempdir().unwrap();
        let csv = helix_csv(dir.path(), 16);
        let output = dir.path().join("report.toml");

        run(score_args("AGPLAWATAFSAVAIK", &csv, Some(&output))).unwrap();

        let written: EnergyReport =
            toml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let expected = score_conformation(
            &"AGPLAWATAFSAVAIK".parse().unwrap(),
            &io::read_dihedrals(&csv).unwrap(),
            &qfold::core::tables::ReferenceTables::builtin(),
            &Default::default(),
        )
        .unwrap();
        assert_eq!(written.secondary_structure, expected.secondary_structure);
        assert!((written.total_energy - expected.total_energy).abs() < 1e-9);
    }

    #[test]
    fn length_mismatch_is_a_core_error() {
        let dir = tempdir().unwrap();
        let csv = helix_csv(dir.path(), 10);
        let result = run(score_args("AGPLAWATAFSAVAIK", &csv, None));
        assert!(matches!(
            result,
            Err(CliError::Core(EngineError::ConformationMismatch {
                expected: 16,
                found: 10
            }))
        ));
    }

    #[test]
    fn rendered_report_names_every_term() {
        let sequence: Sequence = "AGPLAWATAFSAVAIK".parse().unwrap();
        let dir = tempdir().unwrap();
        let report = score_conformation(
            &sequence,
            &io::read_dihedrals(&helix_csv(dir.path(), 16)).unwrap(),
            &qfold::core::tables::ReferenceTables::builtin(),
            &Default::default(),
        )
        .unwrap();
        let text = render_report(&sequence, &report);
        for label in [
            "backbone",
            "steric",
            "hydrophobic",
            "electrostatic",
            "special",
            "solvation",
        ] {
            assert!(text.contains(label));
        }
        assert!(text.contains("HHHHHHHHHHHHHHHH"));
    }
}
