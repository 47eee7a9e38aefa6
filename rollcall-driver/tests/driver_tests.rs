// Tests for the scripted driver and form descriptions

use rollcall_driver::{
    DriverError, FormDriver, FormSpec, QueryRecord, ScriptStep, ScriptedDriver, Submission,
};

fn record() -> QueryRecord {
    QueryRecord {
        jurisdiction: "YORK".to_string(),
        postal_code: "17401".to_string(),
        first_name: "John".to_string(),
        last_name: "Smith".to_string(),
        date_of_birth: "10/01/1990".to_string(),
    }
}

// ============================================================================
// Scripted Driver Tests
// ============================================================================

#[tokio::test]
async fn test_scripted_replays_in_order_then_falls_back() {
    let mut driver = ScriptedDriver::new()
        .with_script([
            ScriptStep::Text("Status: ACTIVE".to_string()),
            ScriptStep::Fail("timeout".to_string()),
        ])
        .with_fallback(ScriptStep::NotFound);

    let mut session = driver.open().await.unwrap();
    assert_eq!(
        driver.submit(&mut session, &record()).await.unwrap(),
        Submission::Text("Status: ACTIVE".to_string())
    );
    assert!(matches!(
        driver.submit(&mut session, &record()).await,
        Err(DriverError::MissingElement(_))
    ));
    assert_eq!(
        driver.submit(&mut session, &record()).await.unwrap(),
        Submission::NotFound
    );

    driver.refresh(&mut session).await.unwrap();
    driver.close(session).await;

    assert_eq!(driver.submissions(), 3);
    assert_eq!(driver.refreshes, 1);
    assert_eq!(driver.live_sessions(), 0);
    assert_eq!(driver.submitted[0], record());
}

#[tokio::test]
async fn test_scripted_max_opens() {
    let mut driver = ScriptedDriver::new().with_max_opens(1);
    let first = driver.open().await.unwrap();
    assert_eq!(first.id, 1);
    assert!(matches!(driver.open().await, Err(DriverError::Other(_))));
    assert_eq!(driver.opens, 1);
}

#[tokio::test]
async fn test_scripted_page_dump_has_screenshot() {
    let mut driver = ScriptedDriver::new();
    let mut session = driver.open().await.unwrap();
    let dump = driver.capture_page_dump(&mut session).await.unwrap();
    assert!(dump.html.contains("scripted session 1"));
    assert!(dump.screenshot.is_some());
}

// ============================================================================
// Form Description Tests
// ============================================================================

#[test]
fn test_form_spec_from_json_with_defaults() {
    let form: FormSpec = serde_json::from_str(
        r##"{
            "url": "https://example.org/lookup",
            "fields": {
                "jurisdiction": "ctl00$County",
                "postal_code": "ctl00$Zip",
                "first_name": "ctl00$First",
                "last_name": "ctl00$Last",
                "date_of_birth": "ctl00$Dob"
            },
            "result_selector": "#results"
        }"##,
    )
    .unwrap();

    assert_eq!(form.timeout_secs, 10);
    assert!(form.extra_fields.is_empty());
    assert!(form.not_found_selector.is_none());
    assert_eq!(form.fields.first_name, "ctl00$First");
}

#[test]
fn test_submission_text() {
    assert_eq!(Submission::Text("x".to_string()).text(), Some("x"));
    assert_eq!(Submission::NotFound.text(), None);
}

#[test]
fn test_record_display() {
    assert_eq!(
        record().to_string(),
        "John Smith (10/01/1990, 17401, YORK)"
    );
}
