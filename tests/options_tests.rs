#[cfg(test)]
mod tests{
    use crm_lens::{
        derive_options,
        load_csv_bytes,
        Dashboard,
        FilterField,
        IngestOptions,
        Record,
        RecordStore,
    };

    fn records() -> Vec<Record> {
        vec![
            Record::from_pairs([("Region", "North"), ("Gender", "Male"), ("AgeGroup", "18-25")]),
            Record::from_pairs([("Region", "South"), ("Gender", ""), ("AgeGroup", "26-35")]),
            Record::from_pairs([("Region", "North"), ("Gender", "Female")]),
        ]
    }

    #[test]
    fn test_derive_options_distinct_and_sorted() {
        let options = derive_options(&records());
        assert_eq!(options.values(FilterField::Region).collect::<Vec<_>>(), vec!["North", "South"]);
        assert_eq!(options.values(FilterField::Gender).collect::<Vec<_>>(), vec!["Female", "Male"]);
        assert_eq!(options.len(FilterField::AgeGroup), 2);
    }

    #[test]
    fn test_options_never_contain_empty_string() {
        let options = derive_options(&records());
        for field in FilterField::ALL {
            assert!(!options.contains(field, ""), "{field} offers an empty value");
        }
        assert!(options.domain(FilterField::Channel).is_some_and(|values| values.is_empty()));
    }

    #[test]
    fn test_store_options_agree_with_derived() {
        let records = records();
        let store = RecordStore::from_records(records.clone()).unwrap();
        assert_eq!(store.options().as_ref(), &derive_options(&records));
    }

    #[test]
    fn test_empty_dataset_has_empty_options() {
        let options = derive_options::<Record>(&[]);
        assert!(options.is_empty());
        assert!(RecordStore::empty().options().is_empty());
    }

    #[test]
    fn test_new_dataset_discards_stale_options() {
        let dashboard = Dashboard::default();
        let first = RecordStore::from_records(records()).unwrap();
        dashboard.load_dataset(first);
        assert!(dashboard.snapshot().options().contains(FilterField::Region, "North"));

        let csv = b"Region,Gender,PurchaseAmount\nEast,Other,10\nWest,Other,20\n";
        let (second, _) = load_csv_bytes(csv, &IngestOptions::default()).unwrap();
        let snapshot = dashboard.load_dataset(second);
        let regions: Vec<&str> = snapshot.options().values(FilterField::Region).collect();
        assert_eq!(regions, vec!["East", "West"]);
        assert!(!snapshot.options().contains(FilterField::Gender, "Male"));
        assert_eq!(snapshot.options().len(FilterField::AgeGroup), 0);
    }
}
