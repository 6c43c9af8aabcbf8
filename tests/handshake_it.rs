mod common;

// std
use std::collections::BTreeMap;
// self
use common::{StubShim, build_broker, denial_callback, grant_callback, user};
use shim_broker::{error::Error, flows::CompletionOutcome, shim::CallbackPayload};

fn no_options() -> BTreeMap<String, String> {
	BTreeMap::new()
}

#[tokio::test]
async fn redirect_scenario_resolves_credential_and_rejects_replay() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let alice = user("alice");
	let params = broker
		.authorize(&alice, "fitbit", Some("https://app.example/done"), &no_options())
		.await
		.expect("Handshake initiation should succeed.");

	assert!(store.contains_correlation(params.state_key.as_str()));
	assert!(
		params.request_fields.contains_key("authorization_url"),
		"Shim-drafted fields should survive initiation."
	);

	let outcome = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect("Grant callback should resolve the handshake.");

	assert_eq!(
		outcome.redirect_target().map(|url| url.as_str()),
		Some("https://app.example/done"),
		"A recorded redirect target must signal a redirect, not a body."
	);
	assert!(outcome.resolution().is_none());
	assert_eq!(store.credential_count(&alice, &params.shim_key), 1);
	assert!(
		!store.contains_correlation(params.state_key.as_str()),
		"Resolved records are discarded after the credential lands."
	);

	let replay = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect_err("A second callback with the same state key must be rejected.");

	assert!(matches!(replay, Error::UnknownCorrelation { .. }));
	assert_eq!(store.credential_count(&alice, &params.shim_key), 1);
	assert_eq!(broker.handshake_metrics.resolved(), 1);
}

#[tokio::test]
async fn completion_without_redirect_target_returns_resolution_body() {
	let (broker, _) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let params = broker
		.authorize(&user("alice"), "fitbit", None, &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let outcome = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect("Grant callback should resolve the handshake.");
	let resolution = match outcome {
		CompletionOutcome::Resolved(resolution) => resolution,
		CompletionOutcome::Redirect(url) => panic!("Unexpected redirect to {url}."),
	};

	assert_eq!(
		resolution.payload.secret("access_token").map(|secret| secret.expose()),
		Some("token-for-abc123")
	);
}

#[tokio::test]
async fn empty_redirect_target_is_treated_as_absent() {
	let (broker, _) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let params = broker
		.authorize(&user("alice"), "fitbit", Some(""), &no_options())
		.await
		.expect("Handshake initiation should succeed.");

	assert_eq!(params.client_redirect_url, None);

	let outcome = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect("Grant callback should resolve the handshake.");

	assert!(outcome.resolution().is_some());
}

#[tokio::test]
async fn denial_discards_record_and_writes_no_credential() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let alice = user("alice");
	let params = broker
		.authorize(&alice, "fitbit", Some("https://app.example/done"), &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let err = broker
		.complete_callback("fitbit", &denial_callback(params.state_key.as_str()))
		.await
		.expect_err("A denial callback must fail the handshake.");

	assert!(matches!(err, Error::AuthorizationDenied { reason } if reason == "access_denied"));
	assert_eq!(store.credential_count(&alice, &params.shim_key), 0);
	assert!(!store.contains_correlation(params.state_key.as_str()));
	assert_eq!(broker.handshake_metrics.denied(), 1);

	let replay = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect_err("Failed handshakes must not be resumable.");

	assert!(matches!(replay, Error::UnknownCorrelation { .. }));
}

#[tokio::test]
async fn unknown_and_missing_state_keys_are_rejected_before_shim_processing() {
	let (broker, _) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let err = broker
		.complete_callback("fitbit", &grant_callback("never-issued"))
		.await
		.expect_err("A never-issued state key must be rejected.");

	assert!(matches!(err, Error::UnknownCorrelation { state_key } if state_key == "never-issued"));

	let malformed = CallbackPayload::new([("code".to_owned(), "abc123".to_owned())]);
	let err = broker
		.complete_callback("fitbit", &malformed)
		.await
		.expect_err("A callback without a state parameter must be rejected.");

	assert!(matches!(err, Error::ShimProtocol { .. }));
}

#[tokio::test]
async fn callbacks_routed_through_the_wrong_shim_are_rejected() {
	let (broker, _) = build_broker(vec![
		StubShim::new("fitbit").into_arc(),
		StubShim::new("jawbone").into_arc(),
	]);
	let params = broker
		.authorize(&user("alice"), "fitbit", None, &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let err = broker
		.complete_callback("jawbone", &grant_callback(params.state_key.as_str()))
		.await
		.expect_err("A state key paired with the wrong shim route must be rejected.");

	assert!(matches!(err, Error::UnknownCorrelation { .. }));
}

#[tokio::test]
async fn state_keys_are_unique_across_live_handshakes() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let first = broker
		.authorize(&user("alice"), "fitbit", None, &no_options())
		.await
		.expect("First initiation should succeed.");
	let second = broker
		.authorize(&user("bob"), "fitbit", None, &no_options())
		.await
		.expect("Second initiation should succeed.");

	assert_ne!(first.state_key, second.state_key);
	assert!(store.contains_correlation(first.state_key.as_str()));
	assert!(store.contains_correlation(second.state_key.as_str()));
	assert_eq!(broker.handshake_metrics.started(), 2);
}

#[tokio::test]
async fn concurrent_callbacks_on_one_state_key_have_a_single_winner() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let alice = user("alice");
	let params = broker
		.authorize(&alice, "fitbit", None, &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let state_key = params.state_key.as_str().to_owned();
	let broker_a = broker.clone();
	let broker_b = broker.clone();
	let key_a = state_key.clone();
	let key_b = state_key;
	let task_a = tokio::spawn(async move {
		broker_a.complete_callback("fitbit", &grant_callback(&key_a)).await
	});
	let task_b = tokio::spawn(async move {
		broker_b.complete_callback("fitbit", &grant_callback(&key_b)).await
	});
	let (outcome_a, outcome_b) = tokio::join!(task_a, task_b);
	let outcome_a = outcome_a.expect("Callback task A should not panic.");
	let outcome_b = outcome_b.expect("Callback task B should not panic.");
	let winners = [&outcome_a, &outcome_b].iter().filter(|result| result.is_ok()).count();

	assert_eq!(winners, 1, "exactly one callback wins the race");

	let loser = if outcome_a.is_err() { outcome_a } else { outcome_b };

	assert!(matches!(
		loser.expect_err("The losing callback should fail."),
		Error::UnknownCorrelation { .. }
	));
	assert_eq!(store.credential_count(&alice, &params.shim_key), 1);
}

#[tokio::test]
async fn unknown_shim_fails_initiation() {
	let (broker, _) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let err = broker
		.authorize(&user("alice"), "nope", None, &no_options())
		.await
		.expect_err("Unknown shim keys must be rejected.");

	assert!(matches!(err, Error::UnknownShim { shim_key } if shim_key == "nope"));
}

#[tokio::test]
async fn misconfigured_shim_fails_initiation() {
	let (broker, _) = build_broker(vec![StubShim::new("fitbit").misconfigured().into_arc()]);
	let err = broker
		.authorize(&user("alice"), "fitbit", None, &no_options())
		.await
		.expect_err("Misconfigured shims must be rejected.");

	assert!(matches!(err, Error::ShimConfiguration { .. }));
	assert_eq!(broker.handshake_metrics.started(), 0);
}

#[tokio::test]
async fn malformed_redirect_target_fails_after_credential_persistence() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let alice = user("alice");
	let params = broker
		.authorize(&alice, "fitbit", Some("not a url"), &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let err = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect_err("An unparseable redirect target should surface a redirect error.");

	assert!(matches!(err, Error::RedirectTarget { target, .. } if target == "not a url"));
	assert_eq!(
		store.credential_count(&alice, &params.shim_key),
		1,
		"The credential must survive a failed redirect."
	);
}

#[tokio::test]
async fn swept_handshakes_fail_with_unknown_correlation() {
	let (broker, store) = build_broker(vec![StubShim::new("fitbit").into_arc()]);
	let broker = broker.with_correlation_ttl(time::Duration::ZERO);
	let params = broker
		.authorize(&user("alice"), "fitbit", None, &no_options())
		.await
		.expect("Handshake initiation should succeed.");
	let swept = broker
		.sweep_expired_correlations()
		.await
		.expect("Sweeping expired records should succeed.");

	assert_eq!(swept, 1);
	assert!(!store.contains_correlation(params.state_key.as_str()));

	let err = broker
		.complete_callback("fitbit", &grant_callback(params.state_key.as_str()))
		.await
		.expect_err("Abandoned handshakes must not be completable after the TTL.");

	assert!(matches!(err, Error::UnknownCorrelation { .. }));
}
