//! Integration tests for a complete staging run.
//!
//! These tests load the fixture catalog and Manabox export, resolve them with
//! a scripted operator and check the staged upload that ends up on disk.

use std::path::PathBuf;
use tcg_staging::io::{read_inventory, write_given_up, write_records, write_report, RunReport, OUTPUT_HEADERS};
use tcg_staging::{
    Catalog, Choice, GiveUpReason, ResolverConfig, ScriptedPrompter, StagingError, StagingOutput,
    StagingSession,
};

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_catalog() -> Catalog {
    Catalog::load(fixtures_path().join("reference.csv")).unwrap()
}

/// Runs the fixture export: confirms the Angel // Demon token, gives up on
/// the Sol Ring with an unknown collector number
fn run_fixture(catalog: &Catalog) -> (StagingOutput, usize) {
    let rows = read_inventory(fixtures_path().join("manabox_export.csv")).unwrap();
    let prompter = ScriptedPrompter::new([Choice::Select(0), Choice::GiveUp]);

    let mut session = StagingSession::new(catalog, ResolverConfig::default(), prompter);
    session.process_rows(rows).unwrap();
    let prompts = session.prompter().asked.len();
    (session.finish(), prompts)
}

// ==================== Catalog Loading ====================

mod catalog_loading {
    use super::*;

    #[test]
    fn indexes_fixture_catalog() {
        let catalog = load_catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.stats().rows_read, 6);
        assert_eq!(catalog.stats().prerelease_excluded, 1);
    }

    #[test]
    fn missing_reference_is_fatal() {
        let err = Catalog::load(fixtures_path().join("does_not_exist.csv")).unwrap_err();
        assert!(matches!(err, StagingError::ReferenceUnavailable { .. }));
    }
}

// ==================== Full Run ====================

mod full_run {
    use super::*;

    #[test]
    fn stages_merged_line_items() {
        let catalog = load_catalog();
        let (output, prompts) = run_fixture(&catalog);

        assert_eq!(prompts, 2);
        let ids: Vec<Option<&str>> = output
            .records
            .iter()
            .map(|r| r.tcgplayer_id.as_deref())
            .collect();
        assert_eq!(
            ids,
            vec![Some("12345"), Some("12346"), Some("55555"), Some("33333"), None]
        );

        let bolt = &output.records[0];
        assert_eq!(bolt.product_name, "Lightning Bolt (Showcase)");
        assert_eq!(bolt.quantity, 5);
        assert_eq!(bolt.condition, "Near Mint");
        assert_eq!(bolt.marketplace_price, 1.25);

        let foil = &output.records[1];
        assert_eq!(foil.condition, "Near Mint Foil");
        assert_eq!(foil.marketplace_price, 3.10);

        let brainstorm = &output.records[2];
        assert_eq!(brainstorm.product_line, "Magic: The Gathering");
        assert_eq!(brainstorm.number, "MH2-45");
    }

    #[test]
    fn unmatched_token_keeps_a_line_item() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);

        let zombie = output.records.last().unwrap();
        assert_eq!(zombie.tcgplayer_id, None);
        assert_eq!(zombie.product_name, "Zombie Army");
        assert_eq!(zombie.rarity, "Token");
        assert_eq!(zombie.quantity, 2);
        assert_eq!(zombie.marketplace_price, 0.25);
    }

    #[test]
    fn abandoned_rows_go_to_given_up_list_only() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);

        assert_eq!(output.given_up.len(), 1);
        let sol_ring = &output.given_up[0];
        assert_eq!(sol_ring.name, "Sol Ring");
        assert_eq!(sol_ring.number, "999");
        assert_eq!(sol_ring.reason, GiveUpReason::OperatorGaveUp);
        assert_eq!(sol_ring.purchase_price, Some(2.0));

        assert!(output.records.iter().all(|r| r.product_name != "Sol Ring"));
    }

    #[test]
    fn summary_counts_every_row() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);
        let summary = &output.summary;

        assert_eq!(summary.rows_read, 9);
        assert_eq!(summary.exact, 3);
        assert_eq!(summary.cached, 1);
        assert_eq!(summary.operator_confirmed, 1);
        assert_eq!(summary.token_fallbacks, 1);
        assert_eq!(summary.skipped_prerelease, 1);
        assert_eq!(summary.skipped_missing_identity, 1);
        assert_eq!(summary.given_up, 1);
        assert_eq!(summary.staged_lines, 5);
        assert_eq!(summary.staged_quantity, 10);
    }

    #[test]
    fn abort_leaves_nothing_staged() {
        let catalog = load_catalog();
        let rows = read_inventory(fixtures_path().join("manabox_export.csv")).unwrap();
        let mut session = StagingSession::new(
            &catalog,
            ResolverConfig::default(),
            ScriptedPrompter::new([Choice::Abort]),
        );

        let err = session.process_rows(rows).unwrap_err();
        assert!(matches!(err, StagingError::Cancelled));
    }
}

// ==================== Output Files ====================

mod output_files {
    use super::*;

    #[test]
    fn writes_staging_csv() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tcgplayer_staged.csv");

        write_records(&path, &output.records).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], OUTPUT_HEADERS.join(","));
        assert_eq!(
            lines[1],
            "12345,Magic: The Gathering,Commander Masters,Lightning Bolt (Showcase),123,C,Near Mint,5,1.25"
        );
        assert_eq!(
            lines[5],
            ",Magic: The Gathering,March of the Machine Tokens,Zombie Army,9,Token,Near Mint,2,0.25"
        );
    }

    #[test]
    fn replaces_previous_output_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tcgplayer_staged.csv");
        std::fs::write(&path, "previous run\n").unwrap();

        write_records(&path, &[]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("previous run"));
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("out.csv");

        let err = write_records(&path, &[]).unwrap_err();
        assert!(matches!(err, StagingError::Io(_)));
        assert!(!path.exists());
    }

    #[test]
    fn given_up_csv_uses_sentinel_identifier() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("given_up.csv");

        write_given_up(&path, &output.given_up).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Not Found,Magic: The Gathering,Commander Masters,Sol Ring,999,"));
    }

    #[test]
    fn writes_json_report() {
        let catalog = load_catalog();
        let (output, _) = run_fixture(&catalog);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let report = RunReport::new(
            &fixtures_path().join("manabox_export.csv"),
            &fixtures_path().join("reference.csv"),
            catalog.stats(),
            &output,
        );
        write_report(&path, &report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["rows_read"], 9);
        assert_eq!(json["catalog"]["prerelease_excluded"], 1);
        assert_eq!(json["given_up"][0]["reason"], "operator_gave_up");
        assert!(json["generated_at"].as_str().unwrap().contains('T'));
    }
}
