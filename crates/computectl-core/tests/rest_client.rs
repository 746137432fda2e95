//! REST transport and resource adapters against a mock compute endpoint

use std::sync::Arc;
use std::time::Duration;

use computectl_core::{
    Alpha, ApiVersion, BackoffPolicy, Beta, Compute, ComputeClientBuilder, ErrorKind,
    OperationReference, Orchestrator, RecordingSleeper, ResourceKind, Scope, StatusMethod, V1,
};
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn compute<V: ApiVersion>(server: &MockServer, status_method: StatusMethod) -> Compute<V> {
    let client = Arc::new(
        ComputeClientBuilder::default()
            .endpoint(server.uri())
            .status_method(status_method)
            .build::<V>()
            .unwrap(),
    );
    let orchestrator = Orchestrator::builder(client.clone())
        .retry_policy(
            BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(5))
                .with_max_attempts(4),
        )
        .poll_policy(BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .sleeper(Arc::new(RecordingSleeper::new()))
        .build();
    Compute::from_parts(client, orchestrator)
}

fn operation(name: &str, status: &str) -> Value {
    json!({
        "kind": "compute#operation",
        "name": name,
        "status": status,
    })
}

#[tokio::test]
async fn create_disk_inserts_waits_and_reads_back() {
    let server = MockServer::start().await;
    let zone = "us-central1-a";

    Mock::given(method("POST"))
        .and(path(format!("/compute/v1/projects/my-project/zones/{zone}/disks")))
        .and(body_json(json!({"name": "data-1", "sizeGb": "10"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-insert-1",
            "status": "RUNNING",
            "zone": format!("https://compute.googleapis.com/compute/v1/projects/my-project/zones/{zone}"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!(
            "/compute/v1/projects/my-project/zones/{zone}/operations/operation-insert-1/wait"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Status": "DONE"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/compute/v1/projects/my-project/zones/{zone}/disks/data-1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "data-1", "sizeGb": "10", "status": "READY"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let disk = compute::<V1>(&server, StatusMethod::Wait)
        .create(
            ResourceKind::Disk,
            "my-project",
            &Scope::Zonal(zone.into()),
            &json!({"name": "data-1", "sizeGb": "10"}),
        )
        .await
        .unwrap();

    assert_eq!(disk["status"], "READY");
}

#[tokio::test]
async fn throttled_insert_is_retried() {
    let server = MockServer::start().await;
    let collection = "/compute/v1/projects/p/global/networks";

    Mock::given(method("POST"))
        .and(path(collection))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Rate Limit Exceeded"}
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(collection))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-net", "PENDING")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/global/operations/op-net/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-net", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/p/global/networks/net-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "net-1"})))
        .mount(&server)
        .await;

    let network = compute::<V1>(&server, StatusMethod::Wait)
        .create(
            ResourceKind::Network,
            "p",
            &Scope::Global,
            &json!({"name": "net-1", "autoCreateSubnetworks": false}),
        )
        .await
        .unwrap();

    assert_eq!(network["name"], "net-1");
}

#[tokio::test]
async fn not_found_is_parsed_from_error_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/compute/v1/projects/p/zones/z/instances/ghost"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "The resource 'projects/p/zones/z/instances/ghost' was not found",
                "errors": [{"reason": "notFound"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = compute::<V1>(&server, StatusMethod::Wait)
        .delete(ResourceKind::Instance, "p", &Scope::Zonal("z".into()), "ghost")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.kind(), ErrorKind::ClientRejected);
    assert!(err.to_string().contains("was not found"));
}

#[tokio::test]
async fn regional_insert_on_beta_polls_region_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/beta/projects/p/regions/us-east1/subnetworks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "op-sub",
            "status": "RUNNING",
            "region": "https://compute.googleapis.com/compute/beta/projects/p/regions/us-east1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/beta/projects/p/regions/us-east1/operations/op-sub/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-sub", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/compute/beta/projects/p/regions/us-east1/subnetworks/sub-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "sub-1"})))
        .expect(1)
        .mount(&server)
        .await;

    compute::<Beta>(&server, StatusMethod::Wait)
        .create(
            ResourceKind::Subnetwork,
            "p",
            &Scope::Regional("us-east1".into()),
            &json!({"name": "sub-1", "ipCidrRange": "10.0.0.0/24"}),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn get_status_method_polls_until_done() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/instances/vm-1/stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-stop", "PENDING")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/p/zones/z/operations/op-stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-stop", "RUNNING")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/p/zones/z/operations/op-stop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-stop", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    let status = compute::<V1>(&server, StatusMethod::Get)
        .stop_instance("p", "z", "vm-1")
        .await
        .unwrap();

    assert!(status.is_done());
}

#[tokio::test]
async fn detach_disk_sends_device_name() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/instances/vm-1/detachDisk"))
        .and(query_param("deviceName", "data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-detach", "RUNNING")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/operations/op-detach/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-detach", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    compute::<V1>(&server, StatusMethod::Wait)
        .detach_disk("p", "z", "vm-1", "data")
        .await
        .unwrap();
}

#[tokio::test]
async fn deprecate_image_on_alpha() {
    let server = MockServer::start().await;
    let deprecation = json!({"state": "DEPRECATED", "replacement": "projects/p/global/images/img-2"});

    Mock::given(method("POST"))
        .and(path("/compute/alpha/projects/p/global/images/img-1/deprecate"))
        .and(body_json(deprecation.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-dep", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/alpha/projects/p/global/operations/op-dep/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-dep", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    compute::<Alpha>(&server, StatusMethod::Wait)
        .deprecate_image("p", "img-1", &deprecation)
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_operation_surfaces_error_details() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/disks/data-1/resize"))
        .and(body_json(json!({"sizeGb": "5"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-resize", "RUNNING")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/operations/op-resize/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "op-resize",
            "status": "DONE",
            "httpErrorStatusCode": 400,
            "error": {"errors": [{
                "code": "INVALID_FIELD_VALUE",
                "message": "Requested disk size cannot be smaller than the current size"
            }]}
        })))
        .mount(&server)
        .await;

    let err = compute::<V1>(&server, StatusMethod::Wait)
        .resize_disk("p", &Scope::Zonal("z".into()), "data-1", 5)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperationFailed);
    assert!(err.to_string().contains("INVALID_FIELD_VALUE"));
}

#[tokio::test]
async fn submission_without_operation_name_is_invalid_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/zones/z/instances/vm-1/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "RUNNING"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = compute::<V1>(&server, StatusMethod::Wait)
        .start_instance("p", "z", "vm-1")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn location_mismatch_sends_nothing() {
    let server = MockServer::start().await;

    let err = compute::<V1>(&server, StatusMethod::Wait)
        .delete(ResourceKind::Firewall, "p", &Scope::Regional("us-west1".into()), "fw-1")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn wait_operation_resolves_external_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/regions/r/operations/op-ext/wait"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/regions/r/operations/op-ext/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-ext", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    let status = compute::<V1>(&server, StatusMethod::Wait)
        .wait_operation(OperationReference::new(
            "op-ext",
            "p",
            Scope::Regional("r".into()),
        ))
        .await
        .unwrap();

    assert_eq!(status.name, "op-ext");
}

#[tokio::test]
async fn operation_snapshot_uses_plain_get_even_in_wait_mode() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/compute/v1/projects/p/zones/z/operations/op-snap"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "op-snap",
            "status": "RUNNING",
            "progress": 30,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let status = compute::<V1>(&server, StatusMethod::Wait)
        .operation(&OperationReference::new(
            "op-snap",
            "p",
            Scope::Zonal("z".into()),
        ))
        .await
        .unwrap();

    assert!(!status.is_done());
    assert_eq!(status.progress, Some(30));
}

#[tokio::test]
async fn held_wait_outlasts_the_request_timeout() {
    let server = MockServer::start().await;
    let wait_path = "/compute/v1/projects/p/zones/z/operations/op-slow/wait";

    Mock::given(method("POST"))
        .and(path(wait_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(operation("op-slow", "RUNNING"))
                .set_delay(Duration::from_millis(1500)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(wait_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-slow", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(
        ComputeClientBuilder::default()
            .endpoint(server.uri())
            .timeout(Duration::from_millis(500))
            .wait_timeout(Duration::from_secs(5))
            .build::<V1>()
            .unwrap(),
    );
    let orchestrator = Orchestrator::builder(client.clone())
        .retry_policy(
            BackoffPolicy::new(Duration::from_millis(1), Duration::from_millis(5))
                .with_max_attempts(3),
        )
        .poll_policy(BackoffPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
        ))
        .sleeper(Arc::new(RecordingSleeper::new()))
        .build();

    let status = Compute::from_parts(client, orchestrator)
        .wait_operation(OperationReference::new(
            "op-slow",
            "p",
            Scope::Zonal("z".into()),
        ))
        .await
        .unwrap();

    assert!(status.is_done());
}

#[tokio::test]
async fn regional_disk_resize_polls_region_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/regions/us-east1/disks/shared-1/resize"))
        .and(body_json(json!({"sizeGb": "200"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "op-rresize",
            "status": "RUNNING",
            "region": "https://compute.googleapis.com/compute/v1/projects/p/regions/us-east1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/compute/v1/projects/p/regions/us-east1/operations/op-rresize/wait"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operation("op-rresize", "DONE")))
        .expect(1)
        .mount(&server)
        .await;

    let status = compute::<V1>(&server, StatusMethod::Wait)
        .resize_disk("p", &Scope::Regional("us-east1".into()), "shared-1", 200)
        .await
        .unwrap();

    assert!(status.is_done());
}

#[tokio::test]
async fn global_disk_resize_is_rejected_locally() {
    let server = MockServer::start().await;

    let err = compute::<V1>(&server, StatusMethod::Wait)
        .resize_disk("p", &Scope::Global, "data-1", 20)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
