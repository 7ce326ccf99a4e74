mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use httpmock::prelude::*;
use parworks::{ArResponse, ArSite, ErrorKind, NewSite, listener};
use serde_json::json;

use common::{API_KEY, sites_for};

#[tokio::test]
async fn get_existing_async_exposes_the_raw_response() {
    let server = MockServer::start_async().await;
    let sites = sites_for(&server);
    let creds = sites.credentials().clone();

    let info = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/ar/site/info")
                .query_param("site", "abc")
                .header("apikey", API_KEY)
                .header("salt", creds.timestamp())
                .header("signature", creds.signature());
            then.status(200)
                .json_body(json!({ "success": true, "site": { "id": "abc" } }));
        })
        .await;

    let response = sites.get_existing_async("abc").await.unwrap();

    info.assert_async().await;
    assert!(
        response
            .raw_response()
            .url()
            .as_str()
            .ends_with("/ar/site/info?&site=abc")
    );
    assert_eq!(response.raw_response().status(), 200);
    assert_eq!(response.decoded().unwrap().id(), "abc");
}

#[tokio::test]
async fn domain_failures_surface_on_decode() {
    let server = MockServer::start_async().await;
    let sites = sites_for(&server);

    server
        .mock_async(|when, then| {
            when.path("/ar/site/info");
            then.status(200).json_body(json!({ "success": false }));
        })
        .await;

    let response = sites.get_existing_async("abc").await.unwrap();
    let err = response.decoded().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Domain);
    assert!(response.decoded().is_err());
}

#[tokio::test]
async fn status_failures_surface_on_await() {
    let server = MockServer::start_async().await;
    let sites = sites_for(&server);

    server
        .mock_async(|when, then| {
            when.path("/ar/site/nearby");
            then.status(401);
        })
        .await;

    let err = sites.near_async(37.0, -122.0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn create_async_does_not_refetch() {
    let server = MockServer::start_async().await;
    let sites = sites_for(&server);

    let add = server
        .mock_async(|when, then| {
            when.method(POST).path("/ar/site/add").query_param("id", "abc");
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;
    let info = server
        .mock_async(|when, then| {
            when.path("/ar/site/info");
            then.status(200).json_body(json!({ "success": true }));
        })
        .await;

    let site = NewSite {
        id: "abc".into(),
        name: "n".into(),
        lon: 0.0,
        lat: 0.0,
        description: "d".into(),
        feature: "f".into(),
        channel: "c".into(),
    };
    let response = sites.create_async(&site).await.unwrap();
    let created = response.into_decoded().unwrap();

    assert_eq!(created.id(), "abc");
    assert!(created.cached_info().is_none());
    assert_eq!(add.hits_async().await, 1);
    assert_eq!(info.hits_async().await, 0);
}

#[tokio::test]
async fn empty_identifiers_fail_without_io() {
    let server = MockServer::start_async().await;
    let sites = sites_for(&server);

    let err = sites.get_existing_async("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = sites.site("").overlays_async().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn listener_runs_once_on_a_worker_thread() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    server.mock(|when, then| {
        when.path("/ar/site/info").query_param("site", "abc");
        then.status(200)
            .json_body(json!({ "success": true, "site": { "id": "abc" } }));
    });

    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();
    sites.get_existing_with_listener(
        "abc",
        listener(
            move |response: ArResponse<ArSite>| {
                let id = response.decoded().map(|site| site.id().to_string());
                tx.send((thread::current().id(), id.map_err(|e| e.kind())))
                    .unwrap();
            },
            move |error| {
                error_tx
                    .send((thread::current().id(), Err(error.kind())))
                    .unwrap();
            },
        ),
    );

    let (thread_id, outcome) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_ne!(thread_id, thread::current().id());
    assert_eq!(outcome, Ok("abc".to_string()));
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}

#[test]
fn create_with_listener_reports_success_once() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    let add = server.mock(|when, then| {
        when.method(POST).path("/ar/site/add").query_param("id", "abc");
        then.status(200).json_body(json!({ "success": true }));
    });

    let site = NewSite {
        id: "abc".into(),
        name: "n".into(),
        lon: 1.5,
        lat: 2.5,
        description: "d".into(),
        feature: "f".into(),
        channel: "c".into(),
    };
    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();
    sites.create_with_listener(
        &site,
        listener(
            move |response: ArResponse<ArSite>| {
                let id = response.into_decoded().map(|site| site.id().to_string());
                tx.send(id.map_err(|e| e.kind())).unwrap();
            },
            move |error| error_tx.send(Err(error.kind())).unwrap(),
        ),
    );

    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        Ok("abc".to_string())
    );
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(add.hits(), 1);
}

#[test]
fn listener_receives_status_errors() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    server.mock(|when, then| {
        when.path("/ar/site/nearby");
        then.status(404);
    });

    let (tx, rx) = mpsc::channel();
    let response_tx = tx.clone();
    sites.near_with_listener(
        37.0,
        -122.0,
        listener(
            move |_: ArResponse<Vec<ArSite>>| response_tx.send(None).unwrap(),
            move |error| tx.send(Some(error.kind())).unwrap(),
        ),
    );

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, Some(ErrorKind::PathNotFound));
}

#[test]
fn near_within_with_listener_sends_bounds() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    let nearby = server.mock(|when, then| {
        when.path("/ar/site/nearby")
            .query_param("max", "3")
            .query_param("radius", "1.5");
        then.status(200)
            .json_body(json!({ "success": true, "sites": [{ "id": "a" }] }));
    });

    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();
    sites.near_within_with_listener(
        37.0,
        -122.0,
        3,
        1.5,
        listener(
            move |response: ArResponse<Vec<ArSite>>| {
                let ids = response.into_decoded().map(|found| {
                    found
                        .iter()
                        .map(|site| site.id().to_string())
                        .collect::<Vec<_>>()
                });
                tx.send(ids.map_err(|e| e.kind())).unwrap();
            },
            move |error| error_tx.send(Err(error.kind())).unwrap(),
        ),
    );

    let outcome: Result<Vec<String>, ErrorKind> =
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, Ok(vec!["a".to_string()]));
    nearby.assert();
}

#[test]
fn listener_may_make_blocking_calls() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    let info = server.mock(|when, then| {
        when.path("/ar/site/info").query_param("site", "abc");
        then.status(200).json_body(json!({
            "success": true,
            "site": { "id": "abc", "name": "Ferry Building" }
        }));
    });

    let (tx, rx) = mpsc::channel();
    let error_tx = tx.clone();
    sites.get_existing_with_listener(
        "abc",
        listener(
            move |response: ArResponse<ArSite>| {
                let refreshed = response
                    .into_decoded()
                    .and_then(|site| site.info())
                    .map(|info| info.name);
                tx.send(refreshed.map_err(|e| e.kind())).unwrap();
            },
            move |error| error_tx.send(Err(error.kind())).unwrap(),
        ),
    );

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(outcome, Ok(Some("Ferry Building".to_string())));
    assert_eq!(info.hits(), 2);
}

#[test]
fn pending_call_can_be_waited_on_from_plain_threads() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    server.mock(|when, then| {
        when.path("/ar/site/process/state").query_param("site", "abc");
        then.status(200)
            .json_body(json!({ "success": true, "state": "PROCESSED" }));
    });

    let pending = sites.site("abc").base_image_state_async();
    let state = thread::spawn(move || pending.wait().unwrap().into_decoded().unwrap())
        .join()
        .unwrap();
    assert_eq!(state, "PROCESSED");
}

#[test]
fn dropped_pending_call_still_completes() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    let ping = server.mock(|when, then| {
        when.path("/ar/ping");
        then.status(200);
    });

    drop(sites.ping_async());

    for _ in 0..50 {
        if ping.hits() == 1 {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("detached call never reached the server");
}

#[test]
fn concurrent_calls_share_one_handle() {
    let server = MockServer::start();
    let sites = sites_for(&server);

    let ping = server.mock(|when, then| {
        when.path("/ar/ping");
        then.status(200);
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sites = sites.clone();
            thread::spawn(move || sites.ping())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(ping.hits(), 8);
}
