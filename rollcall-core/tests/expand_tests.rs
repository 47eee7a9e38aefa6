// Tests for turning input rows into query records

use rollcall_core::QueryRecord;
use rollcall_core::dates::{ExpansionMode, MAX_OFFSET_COUNT};
use rollcall_core::expand::{ExpansionConfig, Expander, is_submittable};
use rollcall_core::input::{RawInputRecord, parse_input};
use rollcall_core::resolver::Resolver;
use rollcall_core::tables::{JurisdictionTable, PostalIndex};

fn tables() -> (JurisdictionTable, PostalIndex) {
    let mut table = JurisdictionTable::new();
    table.insert("Gettysburg Borough", "Adams");
    table.insert("York City", "York");
    let postal = PostalIndex::parse("ZIP Code 17403\tYork\tYork\n");
    (table, postal)
}

fn row(line: &str) -> RawInputRecord {
    parse_input(line).remove(0)
}

#[test]
fn test_five_field_row_uses_day_wrap_by_default() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());

    let records = expander.expand(&row("Gettysburg,,Jane,Doe,2/28/2023"));
    assert_eq!(records.len(), 28);
    assert!(records.iter().all(|r| r.jurisdiction == "ADAMS"));
    assert_eq!(records[0].date_of_birth, "02/28/2023");
}

#[test]
fn test_row_count_uses_offset_mode() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());

    let records = expander.expand(&row("York,17403,John,Smith,10/01/1990,3"));
    let dates: Vec<&str> = records.iter().map(|r| r.date_of_birth.as_str()).collect();
    assert_eq!(dates, vec!["10/01/1990", "10/02/1990", "10/03/1990"]);
    assert!(records.iter().all(|r| r.jurisdiction == "YORK"));
}

#[test]
fn test_row_increment_overrides_config() {
    let (table, postal) = tables();
    let options = ExpansionConfig {
        default_mode: ExpansionMode::DayWrap,
        day_increment: 2,
    };
    let expander = Expander::new(Resolver::new(&table, &postal), options);

    let with_default = expander.expand(&row("York,,A,B,1/1/2000,2"));
    assert_eq!(with_default[1].date_of_birth, "01/03/2000");

    let with_row = expander.expand(&row("York,,A,B,1/1/2000,2,10"));
    assert_eq!(with_row[1].date_of_birth, "01/11/2000");
}

#[test]
fn test_zero_increment_is_deduplicated() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());
    let records = expander.expand(&row("York,,A,B,1/1/2000,4,0"));
    assert_eq!(records.len(), 1);
}

#[test]
fn test_single_mode() {
    let (table, postal) = tables();
    let options = ExpansionConfig {
        default_mode: ExpansionMode::Single,
        day_increment: 1,
    };
    let expander = Expander::new(Resolver::new(&table, &postal), options);

    let records = expander.expand(&row("Gettysburg,,Jane,Doe,5/14/1961"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date_of_birth, "05/14/1961");
}

#[test]
fn test_offset_default_without_count_is_single() {
    let (table, postal) = tables();
    let options = ExpansionConfig {
        default_mode: ExpansionMode::Offset,
        day_increment: 1,
    };
    let expander = Expander::new(Resolver::new(&table, &postal), options);
    assert_eq!(expander.expand(&row("Gettysburg,,Jane,Doe,5/14/1961")).len(), 1);
}

#[test]
fn test_expand_all_keeps_input_order() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());
    let rows = parse_input("York,,A,One,1/1/2000,2\nAtlantis,,B,Two,1/1/2000,1\n");

    let records = expander.expand_all(&rows);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].last_name, "One");
    assert_eq!(records[2].last_name, "Two");
    assert_eq!(records[2].jurisdiction, "ATLANTIS");
}

#[test]
fn test_every_expanded_record_is_submittable() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());
    let rows = parse_input(
        "Gettysburg,,A,B,2/29/2024\nYork,17403,C,D,12/25/1999,10,3\nNowhere Township,,E,F,6/30/1970\n",
    );
    let records = expander.expand_all(&rows);
    assert!(!records.is_empty());
    assert!(records.iter().all(is_submittable));
}

#[test]
fn test_is_submittable_rejects_bad_records() {
    let good = QueryRecord {
        jurisdiction: "ADAMS".to_string(),
        postal_code: String::new(),
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        date_of_birth: "02/29/2024".to_string(),
    };
    assert!(is_submittable(&good));

    let blank = QueryRecord {
        jurisdiction: " ".to_string(),
        ..good.clone()
    };
    assert!(!is_submittable(&blank));

    let unpadded = QueryRecord {
        date_of_birth: "2/29/2024".to_string(),
        ..good.clone()
    };
    assert!(!is_submittable(&unpadded));

    let impossible = QueryRecord {
        date_of_birth: "02/29/2023".to_string(),
        ..good
    };
    assert!(!is_submittable(&impossible));
}

#[test]
fn test_garbage_row_count_never_reaches_expansion() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());
    let rows = parse_input(
        "Erie,16501,Jane,Doe,1/1/1990,18446744073709551615
York,,A,B,1/1/2000,2
",
    );
    assert_eq!(rows.len(), 1);

    let records = expander.expand_all(&rows);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].last_name, "B");
}

#[test]
fn test_large_row_count_stays_bounded() {
    let (table, postal) = tables();
    let expander = Expander::new(Resolver::new(&table, &postal), ExpansionConfig::default());
    let mut raw = row("York,,A,B,1/1/2000,1");
    raw.row_count = Some(usize::MAX);
    assert_eq!(expander.expand(&raw).len(), MAX_OFFSET_COUNT);
}
