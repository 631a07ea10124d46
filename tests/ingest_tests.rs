#[cfg(test)]
mod tests{
    use crm_lens::{
        errors::IngestError,
        load_csv_bytes,
        load_csv_file,
        parse_csv,
        FilterField,
        IngestOptions,
        RecordField,
    };
    use std::io::Write;

    const CSV: &str = "\
ContactID,AgeGroup,Region,Gender,PreferredLanguage,ProductCategory,PurchaseAmount,PurchaseDate,PreferredChannel,SegmentID,City
CID00001,18-25,North,Male,Hindi,Electronics,500,2024-03-01,Online,S1,Delhi
CID00002,26-35,South,Female,Tamil,Apparel,50000,02/03/2024,In-Store,S2,Chennai
CID00003,36-50,East,Other,Bengali,Groceries,abc,,Mobile App,S1,Kolkata
";

    #[test]
    fn test_parse_csv_typed_fields() {
        let (records, report) = parse_csv(CSV.as_bytes(), &IngestOptions::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(report.records, 3);
        assert_eq!(report.bytes, CSV.len() as u64);
        assert_eq!(report.unknown_columns, vec!["City".to_string()]);
        assert_eq!(report.invalid_amounts, 1);
        assert!(!report.oversized);

        assert_eq!(records[0].get(RecordField::ContactId), "CID00001");
        assert_eq!(records[1].value(FilterField::Channel), "In-Store");
        assert_eq!(records[1].amount(), Some(50000.0));
        assert_eq!(records[1].purchase_date(), chrono::NaiveDate::from_ymd_opt(2024, 3, 2));
        assert_eq!(records[2].amount(), None);
        assert_eq!(records[2].field("City"), "Kolkata");
    }

    #[test]
    fn test_short_rows_leave_fields_absent() {
        let csv = "Region,Gender,PurchaseAmount\nNorth,Male\nSouth,Female,10,extra\n";
        let (records, _) = parse_csv(csv.as_bytes(), &IngestOptions::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert!(!records[0].has(RecordField::PurchaseAmount));
        assert_eq!(records[1].amount(), Some(10.0));
    }

    #[test]
    fn test_header_only_is_empty_store() {
        let (store, report) = load_csv_bytes(b"Region,Gender\n", &IngestOptions::default()).unwrap();
        assert!(store.is_empty());
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_bom_is_stripped() {
        let csv = b"\xEF\xBB\xBFRegion,PurchaseAmount\nNorth,1\n";
        let (records, report) = parse_csv(csv, &IngestOptions::default()).unwrap();
        assert_eq!(records[0].value(FilterField::Region), "North");
        assert!(report.unknown_columns.is_empty());
    }

    #[test]
    fn test_rejects_empty_and_binary() {
        let options = IngestOptions::default();
        assert!(matches!(parse_csv(b"", &options), Err(IngestError::Empty)));
        assert!(matches!(parse_csv(b"  \n\n", &options), Err(IngestError::Empty)));
        assert!(matches!(
            parse_csv(b"Region\n\x00\x01\x02", &options),
            Err(IngestError::NotCsv { .. })
        ));
        assert!(matches!(
            parse_csv(b"Region\n\xFF\xFE", &options),
            Err(IngestError::NotCsv { .. })
        ));
    }

    #[test]
    fn test_oversized_is_advisory() {
        let options = IngestOptions { max_bytes: 16 };
        let (records, report) = parse_csv(CSV.as_bytes(), &options).unwrap();
        assert_eq!(records.len(), 3);
        assert!(report.oversized);
    }

    #[test]
    fn test_load_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let (store, report) = load_csv_file(file.path(), &IngestOptions::default()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(report.to_string(), format!("3 records from {} bytes (1 without a usable amount)", CSV.len()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_csv_file(dir.path().join("absent.csv"), &IngestOptions::default());
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
