//! Terminal rendering of pipeline results

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use potency_pipeline::{MoleculeRecord, PredictionReport};

/// Ranked report as a table, highest pIC50 first
pub fn format_report(report: &PredictionReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Rank", "Compound_ID", "pIC50"]);

    for (rank, result) in report.results().iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            result.compound_id.clone(),
            format!("{:.3}", result.score),
        ]);
    }

    table.to_string()
}

/// Normalized input records
pub fn format_molecules(molecules: &[MoleculeRecord]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["SMILES", "Compound_ID"]);

    for molecule in molecules {
        table.add_row(vec![molecule.smiles(), molecule.compound_id()]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_rows_in_rank_order() {
        let records = vec![
            MoleculeRecord::new("CCO", "mol1"),
            MoleculeRecord::new("CCN", "mol2"),
        ];
        let report = PredictionReport::assemble(&records, &[4.0, 6.0]).unwrap();
        let rendered = format_report(&report);

        let mol1 = rendered.find("mol1").unwrap();
        let mol2 = rendered.find("mol2").unwrap();
        assert!(mol2 < mol1);
        assert!(rendered.contains("6.000"));
    }

    #[test]
    fn test_molecule_table() {
        let rendered = format_molecules(&[MoleculeRecord::new("c1ccccc1", "benzene")]);
        assert!(rendered.contains("c1ccccc1"));
        assert!(rendered.contains("benzene"));
    }
}
