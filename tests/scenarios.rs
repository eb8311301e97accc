//! End-to-end dispatch scenarios

use std::sync::Arc;

use aeos::analysis::FixedAnalyzer;
use aeos::rules::{self, KeywordGroup, Trigger};
use aeos::tools::{self, FixedRandom, FnTool, SeededRandom};
use aeos::{
    AeosError, Analysis, Cost, Dispatcher, Division, DivisionId, DivisionRegistry, EngineConfig,
    Request, RuleTable, Sentiment, ToolError, ToolRegistry,
};

fn dispatcher() -> Dispatcher {
    Dispatcher::from_config(&EngineConfig::default(), Arc::new(FixedRandom(0.5)))
}

fn tool_names(response: &aeos::AgentResponse) -> Vec<&str> {
    response.tool_usage.iter().map(|t| t.tool.as_str()).collect()
}

#[tokio::test]
async fn weather_goes_to_earth_division() {
    let response = dispatcher()
        .handle(&Request::new("what's the weather forecast", "u-1"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "eid");
    assert!(response.response.contains("Analyzing atmospheric conditions"));
    assert_eq!(response.cost_incurred, DivisionId::Earth.cost());
    assert!(response.collaboration_log.is_empty());
    assert_eq!(tool_names(&response), vec![tools::SATELLITE_ANALYSIS]);
}

#[tokio::test]
async fn flood_funding_runs_disaster_relief() {
    let response = dispatcher()
        .handle(&Request::new("flood disaster, please release emergency funds", "u-1"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "eid+dtad");
    assert_eq!(
        response.cost_incurred,
        DivisionId::Earth.cost() + DivisionId::Defi.cost()
    );
    assert_eq!(
        tool_names(&response),
        vec![tools::RISK_PREDICTION, tools::DRONE_SURVEY, tools::EMERGENCY_RELEASE]
    );
    assert!(response.response.starts_with("CRITICAL WARNING: Flood risk"));
    assert!(response.response.contains(" → Emergency funds released"));
    assert_eq!(
        response.collaboration_log.first().map(String::as_str),
        Some("Step 1/2: EID - Earth Intelligence engaged")
    );
    assert!(response
        .collaboration_log
        .last()
        .unwrap()
        .starts_with("Collaboration complete: EID → DTAD"));
}

#[tokio::test]
async fn disaster_relief_verifies_hazard_despite_forecast_wording() {
    let response = dispatcher()
        .handle(&Request::new("flood forecast for the delta, release relief funds", "u-1"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "eid+dtad");
    assert_eq!(
        tool_names(&response),
        vec![tools::RISK_PREDICTION, tools::DRONE_SURVEY, tools::EMERGENCY_RELEASE]
    );
    assert!(response.response.starts_with("CRITICAL WARNING: Flood risk"));
}

#[tokio::test]
async fn kyc_then_pay_runs_verified_payment() {
    let response = dispatcher()
        .handle(&Request::new("please check kyc status and then pay the vendor", "u-9"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "enid+dtad");
    assert_eq!(response.cost_incurred, Cost::from_units(0.045));
    assert_eq!(
        tool_names(&response),
        vec![tools::IDENTITY_VERIFY, tools::SMART_CONTRACT]
    );
    assert_eq!(response.tool_usage[0].input, "did:masumi:user:u-9");
    assert_eq!(response.tool_usage[1].input, "100 ADA -> addr1...");
    assert_eq!(
        response.collaboration_log,
        vec![
            "Step 1/2: ENID - Enterprise Intelligence engaged".to_string(),
            "Compliance Agent notifying DeFi Division.".to_string(),
            "Step 2/2: DTAD - DeFi & Transactions engaged".to_string(),
            "Broadcasting transaction to Cardano mainnet.".to_string(),
            "Collaboration complete: ENID → DTAD (2 steps, 2 tool calls, 0.045 ADA)".to_string(),
        ]
    );
}

#[tokio::test]
async fn verified_payment_settles_even_when_text_says_emergency() {
    let response = dispatcher()
        .handle(&Request::new("check kyc then pay the emergency plumber 40 ada", "u-9"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "enid+dtad");
    assert_eq!(
        tool_names(&response),
        vec![tools::IDENTITY_VERIFY, tools::SMART_CONTRACT]
    );
    assert_eq!(response.tool_usage[1].input, "40 ADA -> addr1...");
}

#[tokio::test]
async fn collaboration_keywords_alone_reach_their_step_division() {
    let groups = [
        (rules::HAZARD, DivisionId::Earth),
        (rules::FUNDING, DivisionId::Defi),
        (rules::COMPLIANCE, DivisionId::Enterprise),
        (rules::PAYMENT, DivisionId::Defi),
    ];

    let d = dispatcher();
    for (group, expected) in groups {
        for keyword in group.keywords {
            let response = d.handle(&Request::new(*keyword, "u-5")).await.unwrap();
            assert_eq!(response.division_used, expected.as_str(), "{keyword}");
        }
    }
}

#[tokio::test]
async fn earthquake_goes_to_earth_division() {
    let response = dispatcher()
        .handle(&Request::new("earthquake near the coast", "u-1"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "eid");
    assert!(response.response.starts_with("CRITICAL WARNING: Disaster risk"));
}

#[tokio::test]
async fn frustrated_request_without_help_keyword_escalates() {
    let response = dispatcher()
        .handle(&Request::new("this is terrible, nothing works", "u-3"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "hid");
    assert_eq!(response.sentiment, Sentiment::Negative);
    assert!(response.response.contains("frustrated"));
}

#[tokio::test]
async fn frustrated_help_request_escalates() {
    let response = dispatcher()
        .handle(&Request::new("I need help, nothing works", "u-3"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "hid");
    assert_eq!(response.sentiment, Sentiment::Negative);
    assert!(response.response.contains("frustrated"));
    assert_eq!(
        response.collaboration_log,
        vec!["Escalating priority due to user sentiment.".to_string()]
    );
}

#[tokio::test]
async fn help_template_depends_on_sentiment() {
    let build = |sentiment| {
        Dispatcher::new(
            &EngineConfig::default(),
            DivisionRegistry::default(),
            RuleTable::canonical(),
            ToolRegistry::simulated(Arc::new(FixedRandom(0.5))),
            Arc::new(FixedAnalyzer(Analysis::new(sentiment, vec![]))),
        )
    };
    let request = Request::new("I need help, nothing works", "u-3");

    let negative = build(Sentiment::Negative).handle(&request).await.unwrap();
    let neutral = build(Sentiment::Neutral).handle(&request).await.unwrap();

    assert_eq!(negative.division_used, "hid");
    assert_eq!(neutral.division_used, "hid");
    assert_ne!(negative.response, neutral.response);
    assert_eq!(neutral.sentiment, Sentiment::Neutral);
}

#[tokio::test]
async fn gibberish_falls_back_to_default() {
    let response = dispatcher()
        .handle(&Request::new("xyz random gibberish", "u-4"))
        .await
        .unwrap();

    assert_eq!(response.division_used, "hid");
    assert_eq!(response.cost_incurred, Cost::from_units(0.005));
    assert!(response.tool_usage.is_empty());
}

#[tokio::test]
async fn single_match_cost_is_exact() {
    let cases = [
        ("run a marketing campaign", DivisionId::Enterprise),
        ("check my wallet", DivisionId::Defi),
        ("satellite view of the crops", DivisionId::Earth),
        ("open a support ticket", DivisionId::Human),
    ];

    let d = dispatcher();
    for (text, expected) in cases {
        let response = d.handle(&Request::new(text, "u-5")).await.unwrap();
        assert_eq!(response.division_used, expected.as_str(), "{text}");
        assert_eq!(response.cost_incurred, expected.cost(), "{text}");
    }
}

#[tokio::test]
async fn repeated_requests_are_identical() {
    let request = Request::new("please check kyc status and then pay the vendor", "u-6");
    let d = dispatcher();

    let first = d.handle(&request).await.unwrap();
    let second = d.handle(&request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn seeded_randomness_is_reproducible() {
    let request = Request::new("predict the ada price", "u-6");
    let a = Dispatcher::from_config(&EngineConfig::default(), Arc::new(SeededRandom::new(11)));
    let b = Dispatcher::from_config(&EngineConfig::default(), Arc::new(SeededRandom::new(11)));

    for _ in 0..3 {
        let x = a.handle(&request).await.unwrap();
        let y = b.handle(&request).await.unwrap();
        assert_eq!(x, y);
    }
}

#[tokio::test]
async fn earlier_registry_entry_wins() {
    const VENDOR: KeywordGroup = KeywordGroup::new("vendor", &["vendor"]);
    let registry = DivisionRegistry::new(
        vec![
            Division::new(DivisionId::Human).with_trigger(Trigger::AnyOf(VENDOR)),
            Division::new(DivisionId::Defi).with_trigger(Trigger::AnyOf(VENDOR)),
        ],
        DivisionId::Human,
    )
    .unwrap();
    let d = Dispatcher::new(
        &EngineConfig::default(),
        registry,
        RuleTable::default(),
        ToolRegistry::simulated(Arc::new(FixedRandom(0.5))),
        Arc::new(FixedAnalyzer::default()),
    );

    let response = d.handle(&Request::new("onboard the vendor", "u-7")).await.unwrap();
    assert_eq!(response.division_used, "hid");
}

#[tokio::test]
async fn failing_step_fails_whole_request() {
    let mut tools = ToolRegistry::simulated(Arc::new(FixedRandom(0.5)));
    tools.register(FnTool::new(tools::EMERGENCY_RELEASE, |_| {
        Err(ToolError::Failed {
            tool: tools::EMERGENCY_RELEASE.into(),
            reason: "treasury locked".into(),
        })
    }));
    let d = Dispatcher::new(
        &EngineConfig::default(),
        DivisionRegistry::default(),
        RuleTable::canonical(),
        tools,
        Arc::new(FixedAnalyzer::default()),
    );

    let err = d
        .handle(&Request::new("flood disaster, please release emergency funds", "u-8"))
        .await
        .unwrap_err();
    assert!(!err.is_client_error());
    assert!(matches!(err, AeosError::StepFailed { step: 2, .. }));
    assert!(err.to_string().contains("treasury locked"));
}

#[tokio::test]
async fn context_is_passed_through_untouched() {
    let mut context = serde_json::Map::new();
    context.insert("mood".into(), serde_json::json!("negative"));
    let plain = Request::new("what's the weather forecast", "u-1");
    let with_context = plain.clone().with_context(context);

    let d = dispatcher();
    let a = d.handle(&plain).await.unwrap();
    let b = d.handle(&with_context).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let d = Arc::new(dispatcher());
    let mut handles = Vec::new();
    for i in 0..16 {
        let d = Arc::clone(&d);
        handles.push(tokio::spawn(async move {
            let text = if i % 2 == 0 {
                "what's the weather forecast"
            } else {
                "flood disaster, please release emergency funds"
            };
            d.handle(&Request::new(text, format!("u-{i}"))).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap().unwrap();
        let expected = if i % 2 == 0 { "eid" } else { "eid+dtad" };
        assert_eq!(response.division_used, expected);
    }
}
