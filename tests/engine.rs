//! End-to-end runs: plan, fieldwork, extension, projection.

use muestreo::{
    extend, plan, project_results, ComplianceStatus, Conclusion, ConfidenceLevel,
    NegativePolicy, PilotPhase, PopulationContext, PopulationRow, PopulationSummary,
    RiskFlag, SamplingParameters,
};

fn ledger(n: usize) -> Vec<PopulationRow> {
    (0..n)
        .map(|i| {
            PopulationRow::new(format!("inv-{i:05}"), 50.0 + (i as f64 * 13.7) % 4_000.0)
        })
        .collect()
}

#[test]
fn attribute_full_cycle_clean_population() {
    let rows = ledger(20_000);
    let params = SamplingParameters::Attribute {
        confidence: ConfidenceLevel::NinetyFive,
        tolerable_error_pct: 5.0,
        expected_error_pct: 0.0,
        sequential: false,
    };

    let mut results = plan(&rows, &params, 2024).unwrap();
    assert_eq!(results.sample_size, 385);
    assert!(results
        .sample
        .iter()
        .all(|item| item.compliance_status == ComplianceStatus::Pending));

    for item in &mut results.sample {
        item.compliance_status = ComplianceStatus::Ok;
    }

    let projection = project_results(
        &results,
        &params,
        PopulationContext {
            count: Some(rows.len()),
            total_value: None,
            tolerable_error: Some(5.0),
        },
    );
    assert_eq!(projection.exceptions, 0);
    // 3.0 / 385 * 100 = 0.779...% upper limit, comfortably acceptable.
    assert!(projection.upper_error_limit_pct < 1.0);
    assert_eq!(projection.conclusion, Some(Conclusion::Acceptable));
}

#[test]
fn mus_pilot_cycle_with_exceptions() {
    let rows = ledger(3_000);
    let total_value = PopulationSummary::of(&rows).total_value;
    let params = SamplingParameters::Mus {
        tolerable_error: total_value * 0.05,
        expected_error: 0.0,
        risk_incorrect_acceptance: 5.0,
        negative_policy: NegativePolicy::Zero,
        extract_certainty: false,
        pilot: true,
    };

    let mut results = plan(&rows, &params, 7).unwrap();
    assert_eq!(results.sample_size, 30);
    assert!(results.sample.iter().all(|item| item.is_pilot_item));

    for item in &mut results.sample {
        item.compliance_status = ComplianceStatus::Ok;
    }
    results.sample[4].compliance_status = ComplianceStatus::Exception;
    results.sample[4].error_amount = Some(results.sample[4].value * 0.4);

    let extended = extend(&results, &rows, &params, 7).unwrap();
    assert!(extended.sample_size > results.sample_size);
    assert_eq!(
        extended.pilot_metrics.as_ref().unwrap().phase,
        PilotPhase::Expanded
    );
    // Extension items are freshly drawn, not re-picks of the pilot.
    let pilot_ids: Vec<&str> = results.sample.iter().map(|i| i.id.as_str()).collect();
    let fresh = extended
        .sample
        .iter()
        .filter(|item| !item.is_pilot_item)
        .all(|item| !pilot_ids.contains(&item.id.as_str()));
    assert!(fresh);

    let projection = project_results(
        &extended,
        &params,
        PopulationContext {
            count: Some(rows.len()),
            total_value: Some(total_value),
            tolerable_error: Some(total_value * 0.05),
        },
    );
    assert!(projection.projected_error > 0.0);
}

#[test]
fn mus_separate_negatives_survive_the_whole_cycle() {
    let mut rows = ledger(800);
    rows[10].monetary_value = -1_200.0;
    rows[500].monetary_value = -80.0;
    let params = SamplingParameters::Mus {
        tolerable_error: 60_000.0,
        expected_error: 0.0,
        risk_incorrect_acceptance: 5.0,
        negative_policy: NegativePolicy::Separate,
        extract_certainty: false,
        pilot: false,
    };

    let results = plan(&rows, &params, 31).unwrap();
    let segregated: Vec<_> = results
        .sample
        .iter()
        .filter(|item| item.risk_flag == Some(RiskFlag::NegativeSegregated))
        .collect();
    assert_eq!(segregated.len(), 2);
    assert!(segregated.iter().all(|item| item.is_manual_selection));
    assert!(results
        .methodology_notes
        .iter()
        .any(|note| note.contains("segregated")));
}

#[test]
fn extension_notes_record_shortfall_against_small_populations() {
    let rows = ledger(30);
    let params = SamplingParameters::NonStatistical {
        sample_size: 25,
        mode: muestreo::NonStatisticalMode::Systematic,
    };
    let mut results = plan(&rows, &params, 3).unwrap();
    for item in &mut results.sample {
        item.compliance_status = ComplianceStatus::Exception;
    }
    let extended = extend(&results, &rows, &params, 3).unwrap();
    // Only a handful of unsampled rows remain; the extension is capped
    // at the population and the cap is recorded.
    assert!(extended.sample_size <= rows.len());
}

#[test]
fn results_serialize_for_the_reporting_collaborator() {
    let rows = ledger(400);
    let params = SamplingParameters::Attribute {
        confidence: ConfidenceLevel::Ninety,
        tolerable_error_pct: 8.0,
        expected_error_pct: 0.0,
        sequential: false,
    };
    let results = plan(&rows, &params, 1).unwrap();
    let json = serde_json::to_string(&results).unwrap();
    let back: muestreo::AuditResults = serde_json::from_str(&json).unwrap();
    assert_eq!(back, results);
}
