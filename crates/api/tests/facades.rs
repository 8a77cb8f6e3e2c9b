use duos_access::{testing::Harness, Body, Channel, Error, Method, RawResponse};
use duos_api::{dac, dataset, ontology, support, tdr};

use serde_json::json;
use tracing_test::traced_test;

#[tokio::test]
async fn dac_list_with_users() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Get,
		"https://api.example.org/api/dac?withUsers=true",
		200,
		&json!([{ "dacId": 1, "name": "DAC 01" }]),
	);

	let dacs = dac::list(&harness.client, Some(true)).await.unwrap();

	assert_eq!(dacs.len(), 1);
	assert_eq!(dacs[0]["name"], "DAC 01");
	assert_eq!(
		harness.transport.requests()[0].authorization.as_deref(),
		Some("Bearer token")
	);
}

#[tokio::test]
async fn dac_update_sends_the_committee() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Put,
		"https://api.example.org/api/dac",
		200,
		&json!({ "dacId": 7 }),
	);

	dac::update(&harness.client, 7, "DAC 07", "Genomics", "dac@example.org")
		.await
		.unwrap();

	let requests = harness.transport.requests();
	let Body::Json(body) = &requests[0].body else {
		panic!("expected a JSON body");
	};
	assert_eq!(
		body,
		&json!({
			"dacId": 7,
			"name": "DAC 07",
			"description": "Genomics",
			"email": "dac@example.org",
		})
	);
}

#[tokio::test]
async fn dac_membership_returns_the_status() {
	let harness = Harness::new();
	harness
		.transport
		.reply_status(Method::Post, "https://api.example.org/api/dac/3/member/42", 200)
		.reply_status(Method::Delete, "https://api.example.org/api/dac/3/chair/42", 200);

	assert_eq!(dac::add_member(&harness.client, 3, 42).await.unwrap(), 200);
	assert_eq!(dac::remove_chair(&harness.client, 3, 42).await.unwrap(), 200);
}

#[tokio::test]
async fn dac_membership_conflict_is_rejected() {
	let harness = Harness::new();
	harness
		.transport
		.reply_status(Method::Post, "https://api.example.org/api/dac/3/chair/42", 409);

	let err = dac::add_chair(&harness.client, 3, 42).await.unwrap_err();
	assert_eq!(err.status(), Some(409));
}

#[tokio::test]
async fn datasets_by_ids_repeat_the_query_key() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Get,
		"https://api.example.org/api/dataset/batch?ids=1&ids=2&ids=3",
		200,
		&json!([{ "dataSetId": 1 }, { "dataSetId": 2 }, { "dataSetId": 3 }]),
	);

	let datasets = dataset::get_by_ids(&harness.client, &[1, 2, 3]).await.unwrap();
	assert_eq!(datasets.len(), 3);
}

#[tokio::test]
async fn validate_name_treats_404_as_unused() {
	let harness = Harness::new();
	let url = "https://api.example.org/api/dataset/validate?name=cohort";
	harness
		.transport
		.reply_status(Method::Get, url, 404)
		.reply_json(Method::Get, url, 200, &json!(12));

	assert_eq!(dataset::validate_name(&harness.client, "cohort").await.unwrap(), None);
	assert_eq!(
		dataset::validate_name(&harness.client, "cohort").await.unwrap(),
		Some(12)
	);

	// 404 is expected here and never reported
	harness.settle().await;
	assert!(harness.sink.messages().is_empty());
}

#[tokio::test]
#[traced_test]
async fn validate_name_survives_transport_failure() {
	let harness = Harness::new();
	harness.transport.fail(
		Method::Get,
		"https://api.example.org/api/dataset/validate?name=cohort",
		"connection reset",
	);

	assert_eq!(dataset::validate_name(&harness.client, "cohort").await.unwrap(), None);
	assert!(logs_contain("treating 'cohort' as unused"));
}

#[tokio::test]
async fn register_goes_over_the_binary_channel() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Post,
		"https://api.example.org/api/dataset/v3",
		201,
		&json!([{ "dataSetId": 9 }]),
	);

	dataset::register(
		&harness.client,
		&json!({ "studyName": "Cohort" }),
		vec![dataset::register::Attachment {
			field: "alternativeDataSharingPlan".to_string(),
			file_name: "plan.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			data: b"%PDF".to_vec(),
		}],
	)
	.await
	.unwrap();

	let requests = harness.transport.requests();
	let request = &requests[0];
	assert_eq!(request.channel, Channel::Binary);
	let Body::Multipart(parts) = &request.body else {
		panic!("expected a multipart body");
	};
	assert_eq!(parts.len(), 2);
	assert_eq!(parts[0].name, "dataset");
	assert_eq!(parts[1].file_name.as_deref(), Some("plan.pdf"));
}

#[tokio::test]
async fn download_names_the_file_from_the_response() {
	let harness = Harness::new();
	let url = "https://api.example.org/api/dataset/download";
	harness
		.transport
		.reply(
			Method::Post,
			url,
			RawResponse::new(200, url)
				.with_header("Content-Disposition", "attachment; filename=\"datasets.tsv\"")
				.with_json(&json!({ "datasets": "id\tname\n1\tCohort\n" })),
		)
		.reply(
			Method::Post,
			url,
			RawResponse::new(200, url).with_json(&json!({ "datasets": "id\n" })),
		);

	let download = dataset::download(&harness.client, &[1], None).await.unwrap();
	assert_eq!(download.file_name, "datasets.tsv");
	assert_eq!(download.content, b"id\tname\n1\tCohort\n");

	let download = dataset::download(&harness.client, &[1], Some("mine.tsv".to_string()))
		.await
		.unwrap();
	assert_eq!(download.file_name, "mine.tsv");

	assert!(harness
		.transport
		.requests()
		.iter()
		.all(|req| req.channel == Channel::Binary));
}

#[test]
fn ticket_payload() {
	let ticket = support::create_ticket(support::TicketForm {
		name: "Ada".to_string(),
		kind: "question".to_string(),
		email: "ada@example.org".to_string(),
		subject: "Access".to_string(),
		description: "How do I request access?".to_string(),
		attachments: vec!["tok-1".to_string()],
		url: "https://duos.example.org/dataset_catalog".to_string(),
	});

	let value = serde_json::to_value(&ticket).unwrap();
	assert_eq!(value["request"]["ticket_form_id"], 360_000_669_472_u64);
	assert_eq!(value["request"]["requester"]["email"], "ada@example.org");
	assert_eq!(value["request"]["custom_fields"].as_array().unwrap().len(), 5);
	assert_eq!(value["request"]["custom_fields"][0]["value"], "question");
	assert_eq!(
		value["request"]["comment"]["body"],
		"How do I request access?\n\n------------------\nSubmitted from: https://duos.example.org/dataset_catalog"
	);
	assert_eq!(value["request"]["comment"]["uploads"], json!(["tok-1"]));
}

#[tokio::test]
async fn support_requests_skip_the_credential() {
	let harness = Harness::new();
	harness
		.transport
		.reply_status(Method::Post, "https://support.example.org/api/v2/requests.json", 422)
		.reply_json(
			Method::Post,
			"https://support.example.org/api/v2/uploads?filename=Attachment",
			201,
			&json!({ "upload": { "token": "tok-1" } }),
		);

	let ticket = support::create_ticket(support::TicketForm::default());
	let res = support::create_support_request(&harness.client, &ticket)
		.await
		.unwrap();
	assert_eq!(res.status(), 422);

	let upload = support::upload_attachment(&harness.client, b"log".to_vec())
		.await
		.unwrap();
	assert_eq!(upload["token"], "tok-1");

	assert!(harness
		.transport
		.requests()
		.iter()
		.all(|req| req.authorization.is_none()));
}

#[tokio::test]
async fn translate_uses_the_ontology_service() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Post,
		"https://ontology.example.org/translate/paragraph",
		200,
		&json!({ "paragraph": "Use is limited to cancer research." }),
	);

	let translated = ontology::translate(&harness.client, &json!({ "hmb": true }))
		.await
		.unwrap();
	assert_eq!(translated["paragraph"], "Use is limited to cancer research.");
}

#[tokio::test]
async fn snapshots_by_dataset_identifiers() {
	let harness = Harness::new();
	harness.transport.reply_json(
		Method::Get,
		"https://data.example.org/api/repository/v1/snapshots?duosDatasetIds=DUOS-000001&duosDatasetIds=DUOS-000002",
		200,
		&json!({ "total": 0, "items": [] }),
	);

	let snapshots =
		tdr::list_snapshots_by_dataset_ids(&harness.client, &["DUOS-000001", "DUOS-000002"])
			.await
			.unwrap();
	assert_eq!(snapshots["total"], 0);
}

#[tokio::test(start_paused = true)]
async fn export_then_wait_for_the_job() {
	let harness = Harness::new();
	let job_url = "https://data.example.org/api/repository/v1/jobs/job-9";
	harness
		.transport
		.reply_json(
			Method::Get,
			"https://data.example.org/api/repository/v1/snapshots/s1/export",
			202,
			&json!({ "id": "job-9", "job_status": "running" }),
		)
		.reply_json(Method::Get, job_url, 200, &json!({ "job_status": "running" }))
		.reply_json(Method::Get, job_url, 200, &json!({ "job_status": "succeeded" }))
		.reply_json(
			Method::Get,
			format!("{job_url}/result"),
			200,
			&json!({
				"snapshot": { "id": "s1", "name": "cohort_snapshot" },
				"format": { "parquet": { "manifest": "https://storage.example.org/m.json" } },
			}),
		);

	let job = tdr::prepare_export(&harness.client, "s1").await.unwrap();
	let result = tdr::wait_for_job(&harness.client, job["id"].as_str().unwrap())
		.await
		.unwrap();

	assert!(result
		.terra_import_link
		.unwrap()
		.contains("tdrmanifest=https%3A%2F%2Fstorage.example.org%2Fm.json"));
}

#[tokio::test]
async fn expired_session_redirects_once_across_facades() {
	let harness = Harness::new();
	harness
		.transport
		.reply_status(Method::Get, "https://api.example.org/api/dataset/v2", 401)
		.reply_status(Method::Get, "https://api.example.org/api/dac/1", 401);

	let (datasets, dac) = tokio::join!(
		dataset::get_datasets(&harness.client),
		dac::get(&harness.client, 1)
	);

	assert!(matches!(datasets, Err(Error::Status { status: 401, .. })));
	assert!(matches!(dac, Err(Error::Status { status: 401, .. })));
	assert_eq!(
		harness.navigator.navigations(),
		vec!["/home?redirectTo=/dataset_catalog".to_string()]
	);
}

#[tokio::test]
async fn html_error_pages_do_not_reject_status_only_calls() {
	let harness = Harness::new();
	let html = |status: u16, url: &str| {
		RawResponse::new(status, url)
			.with_header("Content-Type", "application/json")
			.with_body("<html>Service Unavailable</html>")
	};
	let requests_url = "https://support.example.org/api/v2/requests.json";
	let dac_url = "https://api.example.org/api/dac/5";
	harness
		.transport
		.reply(Method::Post, requests_url, html(503, requests_url))
		.reply(Method::Delete, dac_url, html(200, dac_url));

	let ticket = support::create_ticket(support::TicketForm::default());
	let res = support::create_support_request(&harness.client, &ticket)
		.await
		.unwrap();
	assert_eq!(res.status(), 503);

	assert_eq!(dac::delete(&harness.client, 5).await.unwrap(), 200);
}
